use crate::vulkan::{Instance, PhysicalDevice};
use ash::{
    extensions::{ext::DebugMarker, khr::Swapchain},
    version::{DeviceV1_0, InstanceV1_0},
    vk,
};
use log::{error, info};
use snafu::{ResultExt, Snafu};
use std::os::raw::c_char;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to create logical device: {}", source))]
    CreateLogicalDevice { source: ash::vk::Result },
}

pub struct LogicalDevice {
    logical_device: ash::Device,
    debug_markers_enabled: bool,
}

impl LogicalDevice {
    pub fn new(
        instance: &Instance,
        physical_device: &PhysicalDevice,
        enabled_features: vk::PhysicalDeviceFeatures,
        enable_debug_markers: bool,
    ) -> Result<Self> {
        let queue_priorities = [1.0];
        let queue_create_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(physical_device.graphics_queue_family_index())
            .queue_priorities(&queue_priorities)
            .build();
        let queue_create_infos = [queue_create_info];

        let debug_markers_enabled =
            debug_markers_enabled(enable_debug_markers, physical_device.debug_marker_supported());
        let mut extension_names = vec![Swapchain::name()];
        if debug_markers_enabled {
            extension_names.push(DebugMarker::name());
        }
        extension_names
            .iter()
            .for_each(|name| info!("Enabling device extension: {:?}", name));
        let extension_name_pointers = extension_names
            .iter()
            .map(|name| name.as_ptr())
            .collect::<Vec<*const c_char>>();

        let layer_name_pointers = instance
            .layer_names()
            .iter()
            .map(|name| name.as_ptr())
            .collect::<Vec<*const c_char>>();

        let enabled_features = [enabled_features];
        let device_create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_name_pointers)
            .enabled_layer_names(&layer_name_pointers)
            .enabled_features(&enabled_features[0]);

        let logical_device = unsafe {
            instance.instance().create_device(
                physical_device.physical_device(),
                &device_create_info,
                None,
            )
        }
        .context(CreateLogicalDevice)?;

        Ok(Self {
            logical_device,
            debug_markers_enabled,
        })
    }

    pub fn logical_device(&self) -> &ash::Device {
        &self.logical_device
    }

    pub fn debug_markers_enabled(&self) -> bool {
        self.debug_markers_enabled
    }

    pub fn queue(&self, queue_family_index: u32) -> vk::Queue {
        unsafe { self.logical_device.get_device_queue(queue_family_index, 0) }
    }

    pub fn wait_idle(&self) {
        if let Err(error) = unsafe { self.logical_device.device_wait_idle() } {
            error!("Failed to wait for the logical device to be idle: {}", error);
        }
    }
}

/// The extension is only enabled when it was requested and the device offers it.
pub fn debug_markers_enabled(requested: bool, supported: bool) -> bool {
    requested && supported
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            self.logical_device.destroy_device(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_markers_need_a_request_and_device_support() {
        assert!(debug_markers_enabled(true, true));
        assert!(!debug_markers_enabled(false, true));
        assert!(!debug_markers_enabled(true, false));
    }
}
