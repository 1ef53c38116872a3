use ash::{extensions::ext::DebugUtils, vk, Entry};
use log::{debug, error, info, warn};
use snafu::{ResultExt, Snafu};
use std::{ffi::CStr, os::raw::c_void};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to create debug utils messenger: {}", source))]
    CreateMessenger { source: ash::vk::Result },
}

pub struct DebugLayer {
    debug_utils: DebugUtils,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl DebugLayer {
    pub fn new(entry: &Entry, instance: &ash::Instance) -> Result<Self> {
        let mut severity = vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING;
        if log::max_level() >= log::LevelFilter::Debug {
            severity |= vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE;
        }

        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(severity)
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(vulkan_debug_callback));

        let debug_utils = DebugUtils::new(entry, instance);
        let messenger = unsafe { debug_utils.create_debug_utils_messenger(&create_info, None) }
            .context(CreateMessenger)?;

        Ok(Self {
            debug_utils,
            messenger,
        })
    }
}

impl Drop for DebugLayer {
    fn drop(&mut self) {
        unsafe {
            self.debug_utils
                .destroy_debug_utils_messenger(self.messenger, None);
        }
    }
}

unsafe extern "system" fn vulkan_debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _: *mut c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    match severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => error!("{:?} - {}", message_type, message),
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => warn!("{:?} - {}", message_type, message),
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => info!("{:?} - {}", message_type, message),
        _ => debug!("{:?} - {}", message_type, message),
    }

    // Returning true would abort the call that triggered the message
    vk::FALSE
}
