use crate::vulkan::VulkanContext;
use ash::{version::DeviceV1_0, vk};
use snafu::{ResultExt, Snafu};
use std::sync::Arc;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to create descriptor set layout: {}", source))]
    CreateDescriptorSetLayout { source: ash::vk::Result },

    #[snafu(display("Failed to create descriptor pool: {}", source))]
    CreateDescriptorPool { source: ash::vk::Result },

    #[snafu(display("Failed to allocate descriptor sets: {}", source))]
    AllocateDescriptorSets { source: ash::vk::Result },
}

pub struct DescriptorSetLayout {
    layout: vk::DescriptorSetLayout,
    context: Arc<VulkanContext>,
}

impl DescriptorSetLayout {
    pub fn new(
        context: Arc<VulkanContext>,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> Result<Self> {
        let create_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(bindings);
        let layout = unsafe {
            context
                .logical_device()
                .logical_device()
                .create_descriptor_set_layout(&create_info, None)
        }
        .context(CreateDescriptorSetLayout)?;

        Ok(Self { layout, context })
    }

    pub fn layout(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.context
                .logical_device()
                .logical_device()
                .destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Sets allocated from the pool are freed along with it.
pub struct DescriptorPool {
    pool: vk::DescriptorPool,
    context: Arc<VulkanContext>,
}

impl DescriptorPool {
    pub fn new(
        context: Arc<VulkanContext>,
        pool_sizes: &[vk::DescriptorPoolSize],
        max_sets: u32,
    ) -> Result<Self> {
        let create_info = vk::DescriptorPoolCreateInfo::builder()
            .pool_sizes(pool_sizes)
            .max_sets(max_sets);
        let pool = unsafe {
            context
                .logical_device()
                .logical_device()
                .create_descriptor_pool(&create_info, None)
        }
        .context(CreateDescriptorPool)?;

        Ok(Self { pool, context })
    }

    pub fn pool(&self) -> vk::DescriptorPool {
        self.pool
    }

    pub fn allocate_descriptor_sets(
        &self,
        layout: vk::DescriptorSetLayout,
        count: usize,
    ) -> Result<Vec<vk::DescriptorSet>> {
        let layouts = vec![layout; count];
        let allocate_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.pool)
            .set_layouts(&layouts);
        unsafe {
            self.context
                .logical_device()
                .logical_device()
                .allocate_descriptor_sets(&allocate_info)
        }
        .context(AllocateDescriptorSets)
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.context
                .logical_device()
                .logical_device()
                .destroy_descriptor_pool(self.pool, None);
        }
    }
}
