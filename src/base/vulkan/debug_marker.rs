use ash::{
    extensions::ext,
    version::{DeviceV1_0, InstanceV1_0},
    vk,
};
use log::warn;
use std::{
    ffi::{CStr, CString},
    mem,
};

/// Object naming, tagging and command buffer regions through `VK_EXT_debug_marker`.
///
/// Only created when the device supports the extension, the annotations show up
/// in debugging tools such as RenderDoc.
pub struct DebugMarker {
    device: vk::Device,
    debug_marker: ext::DebugMarker,
    debug_marker_fn: vk::ExtDebugMarkerFn,
}

impl DebugMarker {
    pub fn new(instance: &ash::Instance, device: &ash::Device) -> Self {
        let debug_marker = ext::DebugMarker::new(instance, device);
        let debug_marker_fn = vk::ExtDebugMarkerFn::load(|name| unsafe {
            mem::transmute(
                instance
                    .fp_v1_0()
                    .get_device_proc_addr(device.handle(), name.as_ptr()),
            )
        });
        Self {
            device: device.handle(),
            debug_marker,
            debug_marker_fn,
        }
    }

    pub fn name() -> &'static CStr {
        ext::DebugMarker::name()
    }

    pub fn set_object_name<H: vk::Handle>(
        &self,
        object: H,
        object_type: vk::DebugReportObjectTypeEXT,
        name: &str,
    ) {
        let name = match marker_name(name) {
            Some(name) => name,
            None => return,
        };
        let name_info = vk::DebugMarkerObjectNameInfoEXT::builder()
            .object_type(object_type)
            .object(object.as_raw())
            .object_name(&name);
        let result = unsafe {
            self.debug_marker
                .debug_marker_set_object_name(self.device, &name_info)
        };
        if let Err(error) = result {
            warn!("Failed to name object {:?}: {}", name, error);
        }
    }

    pub fn set_object_tag<H: vk::Handle>(
        &self,
        object: H,
        object_type: vk::DebugReportObjectTypeEXT,
        tag_name: u64,
        tag: &[u8],
    ) {
        let tag_info = vk::DebugMarkerObjectTagInfoEXT::builder()
            .object_type(object_type)
            .object(object.as_raw())
            .tag_name(tag_name)
            .tag(tag);
        let result = unsafe {
            self.debug_marker_fn
                .debug_marker_set_object_tag_ext(self.device, &*tag_info)
        };
        if result != vk::Result::SUCCESS {
            warn!("Failed to tag object: {}", result);
        }
    }

    pub fn begin_region(&self, command_buffer: vk::CommandBuffer, name: &str, color: [f32; 4]) {
        if let Some(name) = marker_name(name) {
            let marker_info = vk::DebugMarkerMarkerInfoEXT::builder()
                .marker_name(&name)
                .color(color);
            unsafe {
                self.debug_marker
                    .cmd_debug_marker_begin(command_buffer, &marker_info);
            }
        }
    }

    pub fn insert(&self, command_buffer: vk::CommandBuffer, name: &str, color: [f32; 4]) {
        if let Some(name) = marker_name(name) {
            let marker_info = vk::DebugMarkerMarkerInfoEXT::builder()
                .marker_name(&name)
                .color(color);
            unsafe {
                self.debug_marker
                    .cmd_debug_marker_insert(command_buffer, &marker_info);
            }
        }
    }

    pub fn end_region(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.debug_marker.cmd_debug_marker_end(command_buffer);
        }
    }
}

fn marker_name(name: &str) -> Option<CString> {
    match CString::new(name) {
        Ok(name) => Some(name),
        Err(error) => {
            warn!("Invalid debug marker name '{}': {}", name, error);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_names_reject_interior_nul() {
        assert_eq!(
            marker_name("Toon shading draw"),
            CString::new("Toon shading draw").ok()
        );
        assert_eq!(marker_name("bad\0name"), None);
    }
}
