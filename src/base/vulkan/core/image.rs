use crate::vulkan::VulkanContext;
use ash::{version::DeviceV1_0, vk};
use snafu::{ResultExt, Snafu};
use std::sync::Arc;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to create image: {}", source))]
    CreateImage { source: ash::vk::Result },

    #[snafu(display("No memory type matches {:?} for the image", properties))]
    NoMemoryType { properties: vk::MemoryPropertyFlags },

    #[snafu(display("Failed to allocate image memory: {}", source))]
    AllocateMemory { source: ash::vk::Result },

    #[snafu(display("Failed to bind image memory: {}", source))]
    BindMemory { source: ash::vk::Result },
}

/// An image with its own dedicated memory allocation.
pub struct Image {
    image: vk::Image,
    memory: vk::DeviceMemory,
    context: Arc<VulkanContext>,
}

impl Image {
    pub fn new(
        context: Arc<VulkanContext>,
        create_info: &vk::ImageCreateInfo,
        properties: vk::MemoryPropertyFlags,
    ) -> Result<Self> {
        let device = context.logical_device().logical_device();
        let image = unsafe { device.create_image(create_info, None) }.context(CreateImage)?;

        // From here on dropping `image` releases whatever has been created
        let mut image = Self {
            image,
            memory: vk::DeviceMemory::null(),
            context: context.clone(),
        };

        let requirements = unsafe { device.get_image_memory_requirements(image.image) };
        let memory_type_index = context
            .memory_type_index(requirements.memory_type_bits, properties)
            .ok_or(Error::NoMemoryType { properties })?;
        let allocate_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);
        image.memory =
            unsafe { device.allocate_memory(&allocate_info, None) }.context(AllocateMemory)?;

        unsafe { device.bind_image_memory(image.image, image.memory, 0) }.context(BindMemory)?;

        Ok(image)
    }

    pub fn image(&self) -> vk::Image {
        self.image
    }

    pub fn memory(&self) -> vk::DeviceMemory {
        self.memory
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        let device = self.context.logical_device().logical_device();
        unsafe {
            device.destroy_image(self.image, None);
            if self.memory != vk::DeviceMemory::null() {
                device.free_memory(self.memory, None);
            }
        }
    }
}
