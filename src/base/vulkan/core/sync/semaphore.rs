use crate::vulkan::VulkanContext;
use ash::{version::DeviceV1_0, vk};
use snafu::{ResultExt, Snafu};
use std::sync::Arc;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to create semaphore: {}", source))]
    CreateSemaphore { source: ash::vk::Result },
}

pub struct Semaphore {
    semaphore: vk::Semaphore,
    context: Arc<VulkanContext>,
}

impl Semaphore {
    pub fn new(context: Arc<VulkanContext>) -> Result<Self> {
        let create_info = vk::SemaphoreCreateInfo::builder();
        let semaphore = unsafe {
            context
                .logical_device()
                .logical_device()
                .create_semaphore(&create_info, None)
        }
        .context(CreateSemaphore)?;

        Ok(Self { semaphore, context })
    }

    pub fn semaphore(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.context
                .logical_device()
                .logical_device()
                .destroy_semaphore(self.semaphore, None);
        }
    }
}
