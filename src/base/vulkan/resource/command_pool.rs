use crate::vulkan::{core::sync::fence, Fence, VulkanContext};
use ash::{version::DeviceV1_0, vk};
use snafu::{OptionExt, ResultExt, Snafu};
use std::sync::Arc;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to create command pool: {}", source))]
    CreateCommandPool { source: ash::vk::Result },

    #[snafu(display("Failed to allocate command buffers: {}", source))]
    AllocateCommandBuffers { source: ash::vk::Result },

    #[snafu(display("Command buffer allocation returned no command buffer"))]
    NoCommandBuffer,

    #[snafu(display("Failed to begin command buffer: {}", source))]
    BeginCommandBuffer { source: ash::vk::Result },

    #[snafu(display("Failed to end command buffer: {}", source))]
    EndCommandBuffer { source: ash::vk::Result },

    #[snafu(display("Failed to create fence for command buffer submission: {}", source))]
    CreateFence { source: fence::Error },

    #[snafu(display("Failed to submit command buffer: {}", source))]
    SubmitCommandBuffer { source: ash::vk::Result },

    #[snafu(display("Failed to wait for command buffer submission: {}", source))]
    WaitForSubmission { source: fence::Error },
}

pub struct CommandPool {
    pool: vk::CommandPool,
    context: Arc<VulkanContext>,
}

impl CommandPool {
    pub fn new(context: Arc<VulkanContext>, flags: vk::CommandPoolCreateFlags) -> Result<Self> {
        let create_info = vk::CommandPoolCreateInfo::builder()
            .queue_family_index(context.physical_device().graphics_queue_family_index())
            .flags(flags);

        let pool = unsafe {
            context
                .logical_device()
                .logical_device()
                .create_command_pool(&create_info, None)
        }
        .context(CreateCommandPool)?;

        Ok(Self { pool, context })
    }

    pub fn pool(&self) -> vk::CommandPool {
        self.pool
    }

    pub fn allocate_command_buffers(
        &self,
        count: u32,
        level: vk::CommandBufferLevel,
    ) -> Result<Vec<vk::CommandBuffer>> {
        let allocate_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(self.pool)
            .level(level)
            .command_buffer_count(count);

        unsafe {
            self.context
                .logical_device()
                .logical_device()
                .allocate_command_buffers(&allocate_info)
        }
        .context(AllocateCommandBuffers)
    }

    pub fn free_command_buffers(&self, command_buffers: &[vk::CommandBuffer]) {
        if command_buffers.is_empty() {
            return;
        }
        unsafe {
            self.context
                .logical_device()
                .logical_device()
                .free_command_buffers(self.pool, command_buffers);
        }
    }

    /// Allocates a single command buffer, optionally starting its recording.
    pub fn create_command_buffer(
        &self,
        level: vk::CommandBufferLevel,
        begin: bool,
    ) -> Result<vk::CommandBuffer> {
        let command_buffer = single_command_buffer(self.allocate_command_buffers(1, level)?)?;

        if begin {
            let begin_info = vk::CommandBufferBeginInfo::builder();
            unsafe {
                self.context
                    .logical_device()
                    .logical_device()
                    .begin_command_buffer(command_buffer, &begin_info)
            }
            .context(BeginCommandBuffer)?;
        }

        Ok(command_buffer)
    }

    /// Ends, submits and waits for a command buffer created with `create_command_buffer`.
    pub fn flush_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        queue: vk::Queue,
        free: bool,
    ) -> Result<()> {
        if command_buffer == vk::CommandBuffer::null() {
            return Ok(());
        }

        release_after(
            || self.submit_and_wait(command_buffer, queue),
            || {
                if free {
                    self.free_command_buffers(&[command_buffer]);
                }
            },
        )
    }

    fn submit_and_wait(&self, command_buffer: vk::CommandBuffer, queue: vk::Queue) -> Result<()> {
        let device = self.context.logical_device().logical_device();
        unsafe { device.end_command_buffer(command_buffer) }.context(EndCommandBuffer)?;

        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::builder()
            .command_buffers(&command_buffers)
            .build();

        let fence = Fence::new(self.context.clone(), vk::FenceCreateFlags::empty())
            .context(CreateFence)?;
        unsafe { device.queue_submit(queue, &[submit_info], fence.fence()) }
            .context(SubmitCommandBuffer)?;
        fence.wait().context(WaitForSubmission)
    }

    /// Records and flushes a one time command buffer.
    pub fn execute_once(
        &self,
        queue: vk::Queue,
        executor: impl FnOnce(vk::CommandBuffer),
    ) -> Result<()> {
        let command_buffer = self.create_command_buffer(vk::CommandBufferLevel::PRIMARY, true)?;
        executor(command_buffer);
        self.flush_command_buffer(command_buffer, queue, true)
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.context
                .logical_device()
                .logical_device()
                .destroy_command_pool(self.pool, None);
        }
    }
}

pub fn single_command_buffer(command_buffers: Vec<vk::CommandBuffer>) -> Result<vk::CommandBuffer> {
    command_buffers
        .into_iter()
        .next()
        .filter(|command_buffer| *command_buffer != vk::CommandBuffer::null())
        .context(NoCommandBuffer)
}

/// Runs `release` whether or not `work` succeeded.
fn release_after<T>(work: impl FnOnce() -> Result<T>, release: impl FnOnce()) -> Result<T> {
    let result = work();
    release();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;
    use std::cell::Cell;

    #[test]
    fn an_empty_allocation_is_an_error() {
        assert!(matches!(
            single_command_buffer(Vec::new()),
            Err(Error::NoCommandBuffer)
        ));
        assert!(matches!(
            single_command_buffer(vec![vk::CommandBuffer::null()]),
            Err(Error::NoCommandBuffer)
        ));

        let command_buffer = vk::CommandBuffer::from_raw(7);
        assert_eq!(
            single_command_buffer(vec![command_buffer]).ok(),
            Some(command_buffer)
        );
    }

    #[test]
    fn command_buffers_are_released_when_submission_fails() {
        let released = Cell::new(false);
        let result: Result<()> = release_after(
            || Err(Error::SubmitCommandBuffer {
                source: vk::Result::ERROR_DEVICE_LOST,
            }),
            || released.set(true),
        );
        assert!(result.is_err());
        assert!(released.get());

        released.set(false);
        assert!(release_after(|| Ok(()), || released.set(true)).is_ok());
        assert!(released.get());
    }
}
