use crate::vulkan::VulkanContext;
use ash::{version::DeviceV1_0, vk};
use snafu::{ResultExt, Snafu};
use std::sync::Arc;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to create fence: {}", source))]
    CreateFence { source: ash::vk::Result },

    #[snafu(display("Failed to wait for fence: {}", source))]
    WaitForFence { source: ash::vk::Result },
}

pub struct Fence {
    fence: vk::Fence,
    context: Arc<VulkanContext>,
}

impl Fence {
    pub fn new(context: Arc<VulkanContext>, flags: vk::FenceCreateFlags) -> Result<Self> {
        let create_info = vk::FenceCreateInfo::builder().flags(flags);
        let fence = unsafe {
            context
                .logical_device()
                .logical_device()
                .create_fence(&create_info, None)
        }
        .context(CreateFence)?;

        Ok(Self { fence, context })
    }

    pub fn fence(&self) -> vk::Fence {
        self.fence
    }

    pub fn wait(&self) -> Result<()> {
        unsafe {
            self.context
                .logical_device()
                .logical_device()
                .wait_for_fences(&[self.fence], true, std::u64::MAX)
        }
        .context(WaitForFence)
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.context
                .logical_device()
                .logical_device()
                .destroy_fence(self.fence, None);
        }
    }
}
