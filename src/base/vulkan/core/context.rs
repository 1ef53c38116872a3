use crate::{
    settings::ExampleSettings,
    vulkan::{
        core::{debug_layer, instance, logical_device, physical_device, surface},
        DebugLayer, DebugMarker, Instance, LogicalDevice, PhysicalDevice, Surface,
    },
};
use ash::vk;
use log::{info, warn};
use snafu::{ResultExt, Snafu};
use winit::window::Window;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to create instance: {}", source))]
    InstanceCreation { source: instance::Error },

    #[snafu(display("Failed to create debug layer: {}", source))]
    DebugLayerCreation { source: debug_layer::Error },

    #[snafu(display("Failed to create surface: {}", source))]
    SurfaceCreation { source: surface::Error },

    #[snafu(display("Failed to select physical device: {}", source))]
    PhysicalDeviceCreation { source: physical_device::Error },

    #[snafu(display("Failed to create logical device: {}", source))]
    LogicalDeviceCreation { source: logical_device::Error },
}

// Fields are dropped in declaration order
pub struct VulkanContext {
    debug_marker: Option<DebugMarker>,
    graphics_queue: vk::Queue,
    logical_device: LogicalDevice,
    physical_device: PhysicalDevice,
    surface: Surface,
    _debug_layer: Option<DebugLayer>,
    instance: Instance,
}

impl VulkanContext {
    pub fn new(
        window: &Window,
        settings: &ExampleSettings,
        enabled_features: impl FnOnce(&vk::PhysicalDeviceFeatures) -> vk::PhysicalDeviceFeatures,
    ) -> Result<Self> {
        let instance = Instance::new(settings).context(InstanceCreation)?;

        let debug_layer = if settings.validation {
            Some(DebugLayer::new(instance.entry(), instance.instance()).context(DebugLayerCreation)?)
        } else {
            None
        };

        let surface = Surface::new(instance.entry(), instance.instance(), window)
            .context(SurfaceCreation)?;

        let physical_device =
            PhysicalDevice::new(instance.instance(), &surface).context(PhysicalDeviceCreation)?;

        let features = enabled_features(physical_device.features());
        let logical_device = LogicalDevice::new(
            &instance,
            &physical_device,
            features,
            settings.enable_debug_markers,
        )
        .context(LogicalDeviceCreation)?;

        let graphics_queue = logical_device.queue(physical_device.graphics_queue_family_index());

        let debug_marker = if logical_device.debug_markers_enabled() {
            info!("{:?} is available, debug markers enabled", DebugMarker::name());
            Some(DebugMarker::new(
                instance.instance(),
                logical_device.logical_device(),
            ))
        } else if settings.enable_debug_markers {
            warn!(
                "{:?} is not available, debug markers disabled",
                DebugMarker::name()
            );
            None
        } else {
            None
        };

        Ok(Self {
            debug_marker,
            graphics_queue,
            logical_device,
            physical_device,
            surface,
            _debug_layer: debug_layer,
            instance,
        })
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn physical_device(&self) -> &PhysicalDevice {
        &self.physical_device
    }

    pub fn logical_device(&self) -> &LogicalDevice {
        &self.logical_device
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub fn debug_marker(&self) -> Option<&DebugMarker> {
        self.debug_marker.as_ref()
    }

    pub fn debug_markers_enabled(&self) -> bool {
        self.debug_marker.is_some()
    }

    pub fn memory_type_index(
        &self,
        type_bits: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> Option<u32> {
        self.physical_device.memory_type_index(type_bits, properties)
    }

    pub fn set_object_name<H: vk::Handle>(
        &self,
        object: H,
        object_type: vk::DebugReportObjectTypeEXT,
        name: &str,
    ) {
        if let Some(debug_marker) = self.debug_marker() {
            debug_marker.set_object_name(object, object_type, name);
        }
    }

    pub fn set_object_tag<H: vk::Handle>(
        &self,
        object: H,
        object_type: vk::DebugReportObjectTypeEXT,
        tag_name: u64,
        tag: &[u8],
    ) {
        if let Some(debug_marker) = self.debug_marker() {
            debug_marker.set_object_tag(object, object_type, tag_name, tag);
        }
    }

    pub fn begin_region(&self, command_buffer: vk::CommandBuffer, name: &str, color: [f32; 4]) {
        if let Some(debug_marker) = self.debug_marker() {
            debug_marker.begin_region(command_buffer, name, color);
        }
    }

    pub fn insert_marker(&self, command_buffer: vk::CommandBuffer, name: &str, color: [f32; 4]) {
        if let Some(debug_marker) = self.debug_marker() {
            debug_marker.insert(command_buffer, name, color);
        }
    }

    pub fn end_region(&self, command_buffer: vk::CommandBuffer) {
        if let Some(debug_marker) = self.debug_marker() {
            debug_marker.end_region(command_buffer);
        }
    }
}
