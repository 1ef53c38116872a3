use crate::{
    settings::ExampleSettings,
    vulkan::{
        core::{depth_stencil, framebuffer, physical_device, pipeline_cache, renderpass, swapchain},
        core::sync::semaphore,
        resource::{buffer, command_pool, shader},
        Buffer, CommandPool, DepthStencil, Framebuffer, PipelineCache, RenderPass, Semaphore,
        ShaderCache, Swapchain, VulkanContext,
    },
};
use ash::{prelude::VkResult, version::DeviceV1_0, vk};
use log::{debug, info};
use snafu::{ResultExt, Snafu};
use std::{path::Path, sync::Arc};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to find a supported depth format: {}", source))]
    DepthFormat { source: physical_device::Error },

    #[snafu(display("Failed to create swapchain: {}", source))]
    CreateSwapchain { source: swapchain::Error },

    #[snafu(display("Failed to create command pool: {}", source))]
    CreateCommandPool { source: command_pool::Error },

    #[snafu(display("Failed to create command buffers: {}", source))]
    CreateCommandBuffers { source: command_pool::Error },

    #[snafu(display("Failed to flush command buffer: {}", source))]
    FlushCommandBuffer { source: command_pool::Error },

    #[snafu(display("Failed to create depth stencil: {}", source))]
    CreateDepthStencil { source: depth_stencil::Error },

    #[snafu(display("Failed to create render pass: {}", source))]
    CreateRenderPass { source: renderpass::Error },

    #[snafu(display("Failed to create pipeline cache: {}", source))]
    CreatePipelineCache { source: pipeline_cache::Error },

    #[snafu(display("Failed to create framebuffer: {}", source))]
    CreateFramebuffer { source: framebuffer::Error },

    #[snafu(display("Failed to create semaphore: {}", source))]
    CreateSemaphore { source: semaphore::Error },

    #[snafu(display("Failed to create buffer: {}", source))]
    CreateBuffer { source: buffer::Error },

    #[snafu(display("Failed to load shader: {}", source))]
    LoadShader { source: shader::Error },

    #[snafu(display("Failed to begin command buffer: {}", source))]
    BeginCommandBuffer { source: ash::vk::Result },

    #[snafu(display("Failed to end command buffer: {}", source))]
    EndCommandBuffer { source: ash::vk::Result },

    #[snafu(display("Failed to acquire next swapchain image: {}", source))]
    AcquireImage { source: ash::vk::Result },

    #[snafu(display("Failed to submit command buffers: {}", source))]
    SubmitCommandBuffers { source: ash::vk::Result },

    #[snafu(display("Failed to present swapchain image: {}", source))]
    PresentImage { source: ash::vk::Result },

    #[snafu(display("Failed to wait for the graphics queue: {}", source))]
    WaitForQueue { source: ash::vk::Result },
}

/// Commands recorded inside the default render pass of every draw command buffer.
pub trait Command {
    fn issue_commands(&mut self, _: &ash::Device, _: vk::CommandBuffer) {}
}

/// Clears the framebuffer and draws nothing.
pub struct ClearOnly;

impl Command for ClearOnly {}

// Fields are dropped in declaration order
pub struct Renderer {
    shaders: ShaderCache,
    pipeline_cache: PipelineCache,
    framebuffers: Vec<Framebuffer>,
    render_pass: RenderPass,
    depth_stencil: DepthStencil,
    draw_command_buffers: Vec<vk::CommandBuffer>,
    command_pool: CommandPool,
    swapchain: Swapchain,
    present_complete: Semaphore,
    render_complete: Semaphore,
    text_overlay_complete: Semaphore,
    overlay_command_buffers: Vec<vk::CommandBuffer>,
    submit_pipeline_stages: vk::PipelineStageFlags,
    current_buffer: u32,
    depth_format: vk::Format,
    clear_color: [f32; 4],
    vsync: bool,
    resize_requested: bool,
    context: Arc<VulkanContext>,
}

impl Renderer {
    pub fn new(
        context: Arc<VulkanContext>,
        dimensions: [u32; 2],
        settings: &ExampleSettings,
    ) -> Result<Self> {
        let depth_format = context
            .physical_device()
            .supported_depth_format(context.instance().instance())
            .context(DepthFormat)?;

        let present_complete = Semaphore::new(context.clone()).context(CreateSemaphore)?;
        let render_complete = Semaphore::new(context.clone()).context(CreateSemaphore)?;
        let text_overlay_complete = Semaphore::new(context.clone()).context(CreateSemaphore)?;

        let swapchain = Swapchain::new(context.clone(), dimensions, settings.vsync, None)
            .context(CreateSwapchain)?;

        let command_pool = CommandPool::new(
            context.clone(),
            vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
        )
        .context(CreateCommandPool)?;

        let draw_command_buffers = command_pool
            .allocate_command_buffers(
                swapchain.image_count() as _,
                vk::CommandBufferLevel::PRIMARY,
            )
            .context(CreateCommandBuffers)?;

        let extent = swapchain.properties().extent;
        let depth_stencil =
            DepthStencil::new(context.clone(), depth_format, extent).context(CreateDepthStencil)?;

        let render_pass = RenderPass::default_for(
            context.clone(),
            swapchain.properties().surface_format.format,
            depth_format,
        )
        .context(CreateRenderPass)?;

        let pipeline_cache = PipelineCache::new(context.clone()).context(CreatePipelineCache)?;

        let framebuffers =
            create_framebuffers(context.clone(), &render_pass, &swapchain, &depth_stencil)?;

        Ok(Self {
            shaders: ShaderCache::new(context.clone()),
            pipeline_cache,
            framebuffers,
            render_pass,
            depth_stencil,
            draw_command_buffers,
            command_pool,
            swapchain,
            present_complete,
            render_complete,
            text_overlay_complete,
            overlay_command_buffers: Vec::new(),
            submit_pipeline_stages: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            current_buffer: 0,
            depth_format,
            clear_color: settings.clear_color,
            vsync: settings.vsync,
            resize_requested: false,
            context,
        })
    }

    pub fn context(&self) -> &Arc<VulkanContext> {
        &self.context
    }

    pub fn device(&self) -> &ash::Device {
        self.context.logical_device().logical_device()
    }

    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.properties().extent
    }

    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass.render_pass()
    }

    pub fn framebuffers(&self) -> &[Framebuffer] {
        &self.framebuffers
    }

    pub fn depth_stencil(&self) -> &DepthStencil {
        &self.depth_stencil
    }

    pub fn depth_format(&self) -> vk::Format {
        self.depth_format
    }

    pub fn pipeline_cache(&self) -> vk::PipelineCache {
        self.pipeline_cache.pipeline_cache()
    }

    pub fn command_pool(&self) -> &CommandPool {
        &self.command_pool
    }

    pub fn draw_command_buffers(&self) -> &[vk::CommandBuffer] {
        &self.draw_command_buffers
    }

    pub fn current_buffer(&self) -> u32 {
        self.current_buffer
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, clear_color: [f32; 4]) {
        self.clear_color = clear_color;
    }

    pub fn submit_pipeline_stages(&self) -> vk::PipelineStageFlags {
        self.submit_pipeline_stages
    }

    /// Set when presentation reported an out of date or suboptimal swapchain.
    pub fn resize_requested(&self) -> bool {
        self.resize_requested
    }

    /// Command buffers, one per swapchain image, submitted after the frame's
    /// work and before presentation.
    pub fn set_overlay_command_buffers(&mut self, command_buffers: &[vk::CommandBuffer]) {
        self.overlay_command_buffers = command_buffers.to_vec();
    }

    pub fn clear_overlay_command_buffers(&mut self) {
        self.overlay_command_buffers.clear();
    }

    pub fn create_command_buffers(&mut self) -> Result<()> {
        self.draw_command_buffers = self
            .command_pool
            .allocate_command_buffers(
                self.swapchain.image_count() as _,
                vk::CommandBufferLevel::PRIMARY,
            )
            .context(CreateCommandBuffers)?;
        Ok(())
    }

    pub fn destroy_command_buffers(&mut self) {
        self.command_pool
            .free_command_buffers(&self.draw_command_buffers);
        self.draw_command_buffers.clear();
    }

    pub fn command_buffers_valid(&self) -> bool {
        !self.draw_command_buffers.is_empty()
            && self
                .draw_command_buffers
                .iter()
                .all(|command_buffer| *command_buffer != vk::CommandBuffer::null())
    }

    pub fn viewport(&self) -> vk::Viewport {
        full_viewport(self.extent())
    }

    pub fn scissor(&self) -> vk::Rect2D {
        full_scissor(self.extent())
    }

    /// Begins the default render pass on the framebuffer of `image_index`.
    pub fn begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        image_index: usize,
        clear_values: &[vk::ClearValue],
    ) {
        let render_pass_begin_info = vk::RenderPassBeginInfo::builder()
            .render_pass(self.render_pass.render_pass())
            .framebuffer(self.framebuffers[image_index].framebuffer())
            .render_area(self.scissor())
            .clear_values(clear_values);

        unsafe {
            self.device().cmd_begin_render_pass(
                command_buffer,
                &render_pass_begin_info,
                vk::SubpassContents::INLINE,
            );
        }
    }

    pub fn update_viewport(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.device()
                .cmd_set_viewport(command_buffer, 0, &[self.viewport()]);
            self.device()
                .cmd_set_scissor(command_buffer, 0, &[self.scissor()]);
        }
    }

    pub fn record_all_command_buffers(&self, command: &mut dyn Command) -> Result<()> {
        // One render pass per swapchain image
        for (index, command_buffer) in self.draw_command_buffers.iter().enumerate() {
            self.record_single_command_buffer(index, *command_buffer, command)?;
        }
        Ok(())
    }

    fn record_single_command_buffer(
        &self,
        index: usize,
        command_buffer: vk::CommandBuffer,
        command: &mut dyn Command,
    ) -> Result<()> {
        let device = self.device();

        let command_buffer_begin_info = vk::CommandBufferBeginInfo::builder();
        unsafe { device.begin_command_buffer(command_buffer, &command_buffer_begin_info) }
            .context(BeginCommandBuffer)?;

        let clear_values = clear_values(self.clear_color);
        self.begin_render_pass(command_buffer, index, &clear_values);
        self.update_viewport(command_buffer);

        command.issue_commands(device, command_buffer);

        unsafe {
            device.cmd_end_render_pass(command_buffer);
            device.end_command_buffer(command_buffer)
        }
        .context(EndCommandBuffer)
    }

    /// Acquires the next swapchain image. Returns `false` when the swapchain
    /// is out of date and has to be recreated first.
    pub fn prepare_frame(&mut self) -> Result<bool> {
        let result = self
            .swapchain
            .acquire_next_image(self.present_complete.semaphore());
        match acquired_image(result).context(AcquireImage)? {
            Some(image_index) => {
                self.current_buffer = image_index;
                Ok(true)
            }
            None => {
                debug!("Swapchain is out of date, skipping frame");
                self.resize_requested = true;
                Ok(false)
            }
        }
    }

    /// Submits command buffers waiting for the acquired image and signalling
    /// the end of rendering.
    pub fn submit(&self, command_buffers: &[vk::CommandBuffer]) -> Result<()> {
        let wait_semaphores = [self.present_complete.semaphore()];
        let signal_semaphores = [self.render_complete.semaphore()];
        let wait_stages = [self.submit_pipeline_stages];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        unsafe {
            self.device()
                .queue_submit(self.context.graphics_queue(), &[submit_info], vk::Fence::null())
        }
        .context(SubmitCommandBuffers)
    }

    /// Submits the overlay if there is one, presents the current image and
    /// drains the queue.
    pub fn submit_frame(&mut self) -> Result<()> {
        let mut wait_semaphore = self.render_complete.semaphore();
        if let Some(command_buffer) =
            overlay_command_buffer(&self.overlay_command_buffers, self.current_buffer)
        {
            let wait_semaphores = [wait_semaphore];
            let signal_semaphores = [self.text_overlay_complete.semaphore()];
            let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::builder()
                .wait_semaphores(&wait_semaphores)
                .wait_dst_stage_mask(&wait_stages)
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores)
                .build();
            unsafe {
                self.device().queue_submit(
                    self.context.graphics_queue(),
                    &[submit_info],
                    vk::Fence::null(),
                )
            }
            .context(SubmitCommandBuffers)?;
            wait_semaphore = self.text_overlay_complete.semaphore();
        }

        let result = self.swapchain.queue_present(
            self.context.graphics_queue(),
            self.current_buffer,
            wait_semaphore,
        );
        if presentation_outdated(result).context(PresentImage)? {
            debug!("Swapchain is out of date or suboptimal after present");
            self.resize_requested = true;
        }

        unsafe { self.device().queue_wait_idle(self.context.graphics_queue()) }
            .context(WaitForQueue)
    }

    /// Renders one frame, submitting `extra` before the current draw command buffer.
    /// Returns `false` if the frame was skipped.
    pub fn draw_frame(&mut self, extra: &[vk::CommandBuffer]) -> Result<bool> {
        if !self.prepare_frame()? {
            return Ok(false);
        }

        let command_buffers = extra
            .iter()
            .copied()
            .chain(std::iter::once(
                self.draw_command_buffers[self.current_buffer as usize],
            ))
            .collect::<Vec<_>>();
        self.submit(&command_buffers)?;
        self.submit_frame()?;
        Ok(true)
    }

    /// Recreates every size dependent object. The draw command buffers are left
    /// empty and have to be recorded again.
    pub fn resize(&mut self, dimensions: [u32; 2]) -> Result<()> {
        self.context.logical_device().wait_idle();

        let swapchain = Swapchain::new(
            self.context.clone(),
            dimensions,
            self.vsync,
            Some(&self.swapchain),
        )
        .context(CreateSwapchain)?;
        self.framebuffers.clear();
        self.swapchain = swapchain;

        let extent = self.extent();
        info!("Resized to {}x{}", extent.width, extent.height);

        self.depth_stencil = DepthStencil::new(self.context.clone(), self.depth_format, extent)
            .context(CreateDepthStencil)?;

        self.framebuffers = create_framebuffers(
            self.context.clone(),
            &self.render_pass,
            &self.swapchain,
            &self.depth_stencil,
        )?;

        self.destroy_command_buffers();
        self.create_command_buffers()?;

        self.context.logical_device().wait_idle();
        self.resize_requested = false;
        Ok(())
    }

    pub fn load_shader(
        &mut self,
        path: impl AsRef<Path>,
        stage: vk::ShaderStageFlags,
    ) -> Result<vk::PipelineShaderStageCreateInfo> {
        self.shaders.load(path, stage).context(LoadShader)
    }

    pub fn shaders(&self) -> &ShaderCache {
        &self.shaders
    }

    pub fn create_command_buffer(
        &self,
        level: vk::CommandBufferLevel,
        begin: bool,
    ) -> Result<vk::CommandBuffer> {
        self.command_pool
            .create_command_buffer(level, begin)
            .context(CreateCommandBuffers)
    }

    pub fn flush_command_buffer(&self, command_buffer: vk::CommandBuffer, free: bool) -> Result<()> {
        self.command_pool
            .flush_command_buffer(command_buffer, self.context.graphics_queue(), free)
            .context(FlushCommandBuffer)
    }

    pub fn create_buffer(
        &self,
        usage: vk::BufferUsageFlags,
        memory_properties: vk::MemoryPropertyFlags,
        size: vk::DeviceSize,
        data: Option<&[u8]>,
    ) -> Result<Buffer> {
        Buffer::new(self.context.clone(), usage, memory_properties, size, data)
            .context(CreateBuffer)
    }

    pub fn memory_type_index(
        &self,
        type_bits: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> Option<u32> {
        self.context.memory_type_index(type_bits, properties)
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.context.logical_device().wait_idle();
    }
}

fn create_framebuffers(
    context: Arc<VulkanContext>,
    render_pass: &RenderPass,
    swapchain: &Swapchain,
    depth_stencil: &DepthStencil,
) -> Result<Vec<Framebuffer>> {
    let extent = swapchain.properties().extent;
    swapchain
        .image_views()
        .iter()
        .map(|view| {
            let attachments = [view.view(), depth_stencil.view()];
            Framebuffer::new(
                context.clone(),
                render_pass.render_pass(),
                &attachments,
                extent,
            )
            .context(CreateFramebuffer)
        })
        .collect()
}

pub fn clear_values(clear_color: [f32; 4]) -> [vk::ClearValue; 2] {
    [
        vk::ClearValue {
            color: vk::ClearColorValue {
                float32: clear_color,
            },
        },
        vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue {
                depth: 1.0,
                stencil: 0,
            },
        },
    ]
}

pub fn full_viewport(extent: vk::Extent2D) -> vk::Viewport {
    vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as _,
        height: extent.height as _,
        min_depth: 0.0,
        max_depth: 1.0,
    }
}

pub fn full_scissor(extent: vk::Extent2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent,
    }
}

/// The overlay recorded for `image_index`, if any.
pub fn overlay_command_buffer(
    command_buffers: &[vk::CommandBuffer],
    image_index: u32,
) -> Option<vk::CommandBuffer> {
    command_buffers
        .get(image_index as usize)
        .copied()
        .filter(|command_buffer| *command_buffer != vk::CommandBuffer::null())
}

/// `None` when the swapchain is out of date. A suboptimal image is still used.
pub fn acquired_image(result: VkResult<(u32, bool)>) -> VkResult<Option<u32>> {
    match result {
        Ok((image_index, _)) => Ok(Some(image_index)),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(None),
        Err(error) => Err(error),
    }
}

/// Whether a present result asks for the swapchain to be recreated.
pub fn presentation_outdated(result: VkResult<bool>) -> VkResult<bool> {
    match result {
        Ok(suboptimal) => Ok(suboptimal),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(true),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_date_acquire_skips_the_frame() {
        assert_eq!(acquired_image(Ok((2, false))), Ok(Some(2)));
        assert_eq!(acquired_image(Ok((1, true))), Ok(Some(1)));
        assert_eq!(
            acquired_image(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)),
            Ok(None)
        );
        assert_eq!(
            acquired_image(Err(vk::Result::ERROR_DEVICE_LOST)),
            Err(vk::Result::ERROR_DEVICE_LOST)
        );
    }

    #[test]
    fn suboptimal_or_out_of_date_present_requests_a_resize() {
        assert_eq!(presentation_outdated(Ok(false)), Ok(false));
        assert_eq!(presentation_outdated(Ok(true)), Ok(true));
        assert_eq!(
            presentation_outdated(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)),
            Ok(true)
        );
        assert_eq!(
            presentation_outdated(Err(vk::Result::ERROR_SURFACE_LOST_KHR)),
            Err(vk::Result::ERROR_SURFACE_LOST_KHR)
        );
    }

    #[test]
    fn viewport_and_scissor_cover_the_extent() {
        let extent = vk::Extent2D {
            width: 1280,
            height: 720,
        };
        let viewport = full_viewport(extent);
        assert_eq!((viewport.x, viewport.y), (0.0, 0.0));
        assert_eq!((viewport.width, viewport.height), (1280.0, 720.0));
        assert_eq!((viewport.min_depth, viewport.max_depth), (0.0, 1.0));

        let scissor = full_scissor(extent);
        assert_eq!((scissor.offset.x, scissor.offset.y), (0, 0));
        assert_eq!(scissor.extent, extent);
    }

    #[test]
    fn overlay_is_picked_per_swapchain_image() {
        use ash::vk::Handle;

        let command_buffers = [
            vk::CommandBuffer::from_raw(1),
            vk::CommandBuffer::from_raw(2),
            vk::CommandBuffer::null(),
        ];
        assert_eq!(
            overlay_command_buffer(&command_buffers, 1),
            Some(vk::CommandBuffer::from_raw(2))
        );
        assert_eq!(overlay_command_buffer(&command_buffers, 2), None);
        assert_eq!(overlay_command_buffer(&command_buffers, 3), None);
        assert_eq!(overlay_command_buffer(&[], 0), None);
    }

    #[test]
    fn clear_values_hold_color_and_far_depth() {
        let values = clear_values([0.025, 0.025, 0.025, 1.0]);
        unsafe {
            assert_eq!(values[0].color.float32, [0.025, 0.025, 0.025, 1.0]);
            assert_eq!(values[1].depth_stencil.depth, 1.0);
            assert_eq!(values[1].depth_stencil.stencil, 0);
        }
    }
}
