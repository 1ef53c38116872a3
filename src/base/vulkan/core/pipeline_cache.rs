use crate::vulkan::VulkanContext;
use ash::{version::DeviceV1_0, vk};
use snafu::{ResultExt, Snafu};
use std::sync::Arc;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to create pipeline cache: {}", source))]
    CreatePipelineCache { source: ash::vk::Result },
}

pub struct PipelineCache {
    pipeline_cache: vk::PipelineCache,
    context: Arc<VulkanContext>,
}

impl PipelineCache {
    pub fn new(context: Arc<VulkanContext>) -> Result<Self> {
        let create_info = vk::PipelineCacheCreateInfo::builder();
        let pipeline_cache = unsafe {
            context
                .logical_device()
                .logical_device()
                .create_pipeline_cache(&create_info, None)
        }
        .context(CreatePipelineCache)?;

        Ok(Self {
            pipeline_cache,
            context,
        })
    }

    pub fn pipeline_cache(&self) -> vk::PipelineCache {
        self.pipeline_cache
    }
}

impl Drop for PipelineCache {
    fn drop(&mut self) {
        unsafe {
            self.context
                .logical_device()
                .logical_device()
                .destroy_pipeline_cache(self.pipeline_cache, None);
        }
    }
}
