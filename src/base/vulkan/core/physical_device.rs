use crate::vulkan::Surface;
use ash::{extensions::ext::DebugMarker, version::InstanceV1_0, vk};
use log::info;
use snafu::{ResultExt, Snafu};
use std::ffi::CStr;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to enumerate physical devices: {}", source))]
    EnumeratePhysicalDevices { source: ash::vk::Result },

    #[snafu(display("Failed to query device extension properties: {}", source))]
    EnumerateExtensions { source: ash::vk::Result },

    #[snafu(display("Failed to query surface support: {}", source))]
    QuerySurfaceSupport { source: ash::vk::Result },

    #[snafu(display("No physical device supports graphics and presentation to the surface"))]
    NoSuitableDevice,

    #[snafu(display("No supported depth format was found"))]
    NoDepthFormat,
}

/// Candidates in order of preference
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 5] = [
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D32_SFLOAT,
    vk::Format::D24_UNORM_S8_UINT,
    vk::Format::D16_UNORM_S8_UINT,
    vk::Format::D16_UNORM,
];

pub struct PhysicalDevice {
    physical_device: vk::PhysicalDevice,
    properties: vk::PhysicalDeviceProperties,
    features: vk::PhysicalDeviceFeatures,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    graphics_queue_family_index: u32,
    debug_marker_supported: bool,
}

impl PhysicalDevice {
    pub fn new(instance: &ash::Instance, surface: &Surface) -> Result<Self> {
        let devices =
            unsafe { instance.enumerate_physical_devices() }.context(EnumeratePhysicalDevices)?;

        let mut candidates = Vec::new();
        for device in devices {
            if let Some(index) = Self::graphics_queue_family(instance, surface, device)? {
                candidates.push((device, index));
            }
        }

        let (physical_device, graphics_queue_family_index) = candidates
            .iter()
            .find(|(device, _)| {
                let properties = unsafe { instance.get_physical_device_properties(*device) };
                properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU
            })
            .or_else(|| candidates.first())
            .copied()
            .ok_or(Error::NoSuitableDevice)?;

        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let features = unsafe { instance.get_physical_device_features(physical_device) };
        let memory_properties =
            unsafe { instance.get_physical_device_memory_properties(physical_device) };

        let extensions = unsafe { instance.enumerate_device_extension_properties(physical_device) }
            .context(EnumerateExtensions)?;
        let debug_marker_supported = extension_supported(&extensions, DebugMarker::name());

        let physical_device = Self {
            physical_device,
            properties,
            features,
            memory_properties,
            graphics_queue_family_index,
            debug_marker_supported,
        };
        info!("Selected physical device: {}", physical_device.device_name());

        Ok(physical_device)
    }

    fn graphics_queue_family(
        instance: &ash::Instance,
        surface: &Surface,
        device: vk::PhysicalDevice,
    ) -> Result<Option<u32>> {
        let families = unsafe { instance.get_physical_device_queue_family_properties(device) };
        for (index, family) in families.iter().enumerate() {
            let index = index as u32;
            if family.queue_count == 0
                || !family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
            {
                continue;
            }
            if surface
                .supports_presentation(device, index)
                .context(QuerySurfaceSupport)?
            {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.properties
    }

    pub fn features(&self) -> &vk::PhysicalDeviceFeatures {
        &self.features
    }

    pub fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.memory_properties
    }

    pub fn graphics_queue_family_index(&self) -> u32 {
        self.graphics_queue_family_index
    }

    pub fn debug_marker_supported(&self) -> bool {
        self.debug_marker_supported
    }

    pub fn device_name(&self) -> String {
        unsafe { CStr::from_ptr(self.properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    pub fn memory_type_index(
        &self,
        type_bits: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> Option<u32> {
        find_memory_type(&self.memory_properties, type_bits, properties)
    }

    pub fn supported_depth_format(&self, instance: &ash::Instance) -> Result<vk::Format> {
        let format = select_depth_format(&DEPTH_FORMAT_CANDIDATES, |format| {
            let properties = unsafe {
                instance.get_physical_device_format_properties(self.physical_device, format)
            };
            properties
                .optimal_tiling_features
                .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
        })
        .ok_or(Error::NoDepthFormat)?;
        info!("Using depth format: {:?}", format);
        Ok(format)
    }
}

pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    properties: vk::MemoryPropertyFlags,
) -> Option<u32> {
    memory_properties.memory_types[..memory_properties.memory_type_count as usize]
        .iter()
        .enumerate()
        .find(|(index, memory_type)| {
            type_bits & (1 << index) != 0 && memory_type.property_flags.contains(properties)
        })
        .map(|(index, _)| index as u32)
}

pub fn extension_supported(extensions: &[vk::ExtensionProperties], name: &CStr) -> bool {
    extensions.iter().any(|extension| {
        let extension_name = unsafe { CStr::from_ptr(extension.extension_name.as_ptr()) };
        extension_name == name
    })
}

pub fn select_depth_format(
    candidates: &[vk::Format],
    supports: impl Fn(vk::Format) -> bool,
) -> Option<vk::Format> {
    candidates.iter().copied().find(|format| supports(*format))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_properties(flags: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut properties = vk::PhysicalDeviceMemoryProperties::default();
        properties.memory_type_count = flags.len() as u32;
        for (index, flags) in flags.iter().enumerate() {
            properties.memory_types[index] = vk::MemoryType {
                property_flags: *flags,
                heap_index: 0,
            };
        }
        properties
    }

    #[test]
    fn memory_type_respects_type_bits_and_flags() {
        let properties = memory_properties(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::MemoryPropertyFlags::HOST_VISIBLE,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        ]);
        let host = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;

        assert_eq!(find_memory_type(&properties, 0b111, host), Some(2));
        assert_eq!(
            find_memory_type(&properties, 0b111, vk::MemoryPropertyFlags::HOST_VISIBLE),
            Some(1)
        );
        assert_eq!(
            find_memory_type(&properties, 0b001, vk::MemoryPropertyFlags::HOST_VISIBLE),
            None
        );
    }

    #[test]
    fn memory_types_past_the_count_are_ignored() {
        let mut properties = memory_properties(&[vk::MemoryPropertyFlags::DEVICE_LOCAL]);
        properties.memory_types[1].property_flags = vk::MemoryPropertyFlags::HOST_VISIBLE;
        assert_eq!(
            find_memory_type(&properties, !0, vk::MemoryPropertyFlags::HOST_VISIBLE),
            None
        );
    }

    fn extension(name: &CStr) -> vk::ExtensionProperties {
        let mut properties = vk::ExtensionProperties::default();
        name.to_bytes()
            .iter()
            .zip(properties.extension_name.iter_mut())
            .for_each(|(byte, slot)| *slot = *byte as _);
        properties
    }

    #[test]
    fn debug_marker_support_is_read_from_the_extension_list() {
        let swapchain = extension(ash::extensions::khr::Swapchain::name());
        let debug_marker = extension(DebugMarker::name());

        assert!(extension_supported(
            &[swapchain, debug_marker],
            DebugMarker::name()
        ));
        assert!(!extension_supported(&[swapchain], DebugMarker::name()));
        assert!(!extension_supported(&[], DebugMarker::name()));
    }

    #[test]
    fn depth_format_follows_candidate_order() {
        let format = select_depth_format(&DEPTH_FORMAT_CANDIDATES, |format| {
            format == vk::Format::D16_UNORM || format == vk::Format::D24_UNORM_S8_UINT
        });
        assert_eq!(format, Some(vk::Format::D24_UNORM_S8_UINT));
        assert_eq!(select_depth_format(&DEPTH_FORMAT_CANDIDATES, |_| false), None);
    }
}
