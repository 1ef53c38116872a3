use crate::{settings::ExampleSettings, vulkan::surface_extension_names};
use ash::{
    extensions::{ext::DebugUtils, khr::Surface},
    version::{EntryV1_0, InstanceV1_0},
    vk, Entry,
};
use log::{info, warn};
use snafu::{ResultExt, Snafu};
use std::{
    ffi::{CStr, CString},
    os::raw::c_char,
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to load the vulkan library: {}", source))]
    LoadEntry { source: ash::LoadingError },

    #[snafu(display("Failed to create a CString from '{}': {}", name, source))]
    CreateName {
        name: String,
        source: std::ffi::NulError,
    },

    #[snafu(display("Failed to enumerate instance properties: {}", source))]
    EnumerateProperties { source: ash::vk::Result },

    #[snafu(display("Required instance extension is not available: {}", name))]
    MissingExtension { name: String },

    #[snafu(display("Failed to create instance: {}", source))]
    CreateInstance { source: ash::InstanceError },
}

pub const VALIDATION_LAYER_NAME: &str = "VK_LAYER_KHRONOS_validation";

pub struct Instance {
    entry: Entry,
    instance: ash::Instance,
    layer_names: Vec<CString>,
}

impl Instance {
    pub fn new(settings: &ExampleSettings) -> Result<Self> {
        let entry = Entry::new().context(LoadEntry)?;

        let application_name = CString::new(settings.name.as_str()).context(CreateName {
            name: settings.name.clone(),
        })?;
        let application_info = vk::ApplicationInfo::builder()
            .application_name(&application_name)
            .application_version(vk::make_version(1, 0, 0))
            .engine_name(&application_name)
            .engine_version(vk::make_version(1, 0, 0))
            .api_version(vk::make_version(1, 0, 0));

        let extension_names = Self::extension_names(&entry, settings.validation)?;
        let extension_name_pointers = extension_names
            .iter()
            .map(|name| name.as_ptr())
            .collect::<Vec<_>>();

        let layer_names = if settings.validation {
            Self::validation_layer_names(&entry)?
        } else {
            Vec::new()
        };
        let layer_name_pointers = layer_names
            .iter()
            .map(|name| name.as_ptr())
            .collect::<Vec<*const c_char>>();

        let instance_create_info = vk::InstanceCreateInfo::builder()
            .application_info(&application_info)
            .enabled_extension_names(&extension_name_pointers)
            .enabled_layer_names(&layer_name_pointers);

        let instance = unsafe { entry.create_instance(&instance_create_info, None) }
            .context(CreateInstance)?;

        Ok(Self {
            entry,
            instance,
            layer_names,
        })
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// Layers enabled on the instance, reused for the logical device
    pub fn layer_names(&self) -> &[CString] {
        &self.layer_names
    }

    fn extension_names(entry: &Entry, validation: bool) -> Result<Vec<&'static CStr>> {
        let available = entry
            .enumerate_instance_extension_properties()
            .context(EnumerateProperties)?
            .iter()
            .map(|properties| unsafe { CStr::from_ptr(properties.extension_name.as_ptr()) }.to_owned())
            .collect::<Vec<_>>();
        let is_available = |name: &CStr| available.iter().any(|candidate| candidate.as_c_str() == name);

        let mut required = vec![Surface::name()];
        if validation {
            required.push(DebugUtils::name());
        }
        if let Some(missing) = required.iter().find(|name| !is_available(**name)) {
            return MissingExtension {
                name: missing.to_string_lossy().into_owned(),
            }
            .fail();
        }

        let platform_names = surface_extension_names()
            .into_iter()
            .filter(|name| is_available(*name))
            .collect::<Vec<_>>();
        if platform_names.is_empty() {
            return MissingExtension {
                name: "platform surface extension".to_string(),
            }
            .fail();
        }

        required.extend(platform_names);
        required
            .iter()
            .for_each(|name| info!("Enabling instance extension: {:?}", name));
        Ok(required)
    }

    fn validation_layer_names(entry: &Entry) -> Result<Vec<CString>> {
        let layer_name = CString::new(VALIDATION_LAYER_NAME).context(CreateName {
            name: VALIDATION_LAYER_NAME,
        })?;

        let available = entry
            .enumerate_instance_layer_properties()
            .context(EnumerateProperties)?;
        let found = available
            .iter()
            .any(|properties| unsafe { CStr::from_ptr(properties.layer_name.as_ptr()) } == layer_name.as_c_str());

        if found {
            Ok(vec![layer_name])
        } else {
            warn!(
                "Validation layer '{}' is not available, have you installed the Vulkan SDK?",
                VALIDATION_LAYER_NAME
            );
            Ok(Vec::new())
        }
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        unsafe {
            self.instance.destroy_instance(None);
        }
    }
}
