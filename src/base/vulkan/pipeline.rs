use crate::vulkan::VulkanContext;
use ash::{version::DeviceV1_0, vk};
use derive_builder::Builder;
use snafu::{ResultExt, Snafu};
use std::sync::Arc;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to create pipeline layout: {}", source))]
    CreatePipelineLayout { source: ash::vk::Result },

    #[snafu(display("Failed to create graphics pipeline: {}", source))]
    CreateGraphicsPipeline { source: ash::vk::Result },
}

pub struct PipelineLayout {
    layout: vk::PipelineLayout,
    context: Arc<VulkanContext>,
}

impl PipelineLayout {
    pub fn new(
        context: Arc<VulkanContext>,
        descriptor_set_layouts: &[vk::DescriptorSetLayout],
    ) -> Result<Self> {
        let create_info =
            vk::PipelineLayoutCreateInfo::builder().set_layouts(descriptor_set_layouts);
        let layout = unsafe {
            context
                .logical_device()
                .logical_device()
                .create_pipeline_layout(&create_info, None)
        }
        .context(CreatePipelineLayout)?;

        Ok(Self { layout, context })
    }

    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.context
                .logical_device()
                .logical_device()
                .destroy_pipeline_layout(self.layout, None);
        }
    }
}

/// Fixed function state of a graphics pipeline with dynamic viewport and scissor.
#[derive(Builder, Clone)]
#[builder(default)]
pub struct GraphicsPipelineSettings {
    pub render_pass: vk::RenderPass,
    pub layout: vk::PipelineLayout,
    pub shader_stages: Vec<vk::PipelineShaderStageCreateInfo>,
    pub vertex_bindings: Vec<vk::VertexInputBindingDescription>,
    pub vertex_attributes: Vec<vk::VertexInputAttributeDescription>,
    pub topology: vk::PrimitiveTopology,
    pub polygon_mode: vk::PolygonMode,
    pub line_width: f32,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare_op: vk::CompareOp,
    pub blend_attachment: vk::PipelineColorBlendAttachmentState,
}

impl Default for GraphicsPipelineSettings {
    fn default() -> Self {
        Self {
            render_pass: vk::RenderPass::null(),
            layout: vk::PipelineLayout::null(),
            shader_stages: Vec::new(),
            vertex_bindings: Vec::new(),
            vertex_attributes: Vec::new(),
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            line_width: 1.0,
            cull_mode: vk::CullModeFlags::BACK,
            front_face: vk::FrontFace::CLOCKWISE,
            depth_test: true,
            depth_write: true,
            depth_compare_op: vk::CompareOp::LESS_OR_EQUAL,
            blend_attachment: opaque_blend_attachment(),
        }
    }
}

pub fn opaque_blend_attachment() -> vk::PipelineColorBlendAttachmentState {
    vk::PipelineColorBlendAttachmentState::builder()
        .color_write_mask(vk::ColorComponentFlags::all())
        .blend_enable(false)
        .build()
}

/// Adds the fragment color on top of what is already in the attachment.
pub fn additive_blend_attachment() -> vk::PipelineColorBlendAttachmentState {
    vk::PipelineColorBlendAttachmentState::builder()
        .color_write_mask(vk::ColorComponentFlags::all())
        .blend_enable(true)
        .src_color_blend_factor(vk::BlendFactor::ONE)
        .dst_color_blend_factor(vk::BlendFactor::ONE)
        .color_blend_op(vk::BlendOp::ADD)
        .src_alpha_blend_factor(vk::BlendFactor::SRC_ALPHA)
        .dst_alpha_blend_factor(vk::BlendFactor::DST_ALPHA)
        .alpha_blend_op(vk::BlendOp::ADD)
        .build()
}

/// Blends by the fragment alpha, used for coverage masks such as rasterized text.
pub fn alpha_blend_attachment() -> vk::PipelineColorBlendAttachmentState {
    vk::PipelineColorBlendAttachmentState::builder()
        .color_write_mask(vk::ColorComponentFlags::all())
        .blend_enable(true)
        .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
        .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
        .color_blend_op(vk::BlendOp::ADD)
        .src_alpha_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
        .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
        .alpha_blend_op(vk::BlendOp::ADD)
        .build()
}

pub struct GraphicsPipeline {
    pipeline: vk::Pipeline,
    context: Arc<VulkanContext>,
}

impl GraphicsPipeline {
    pub fn new(
        context: Arc<VulkanContext>,
        pipeline_cache: vk::PipelineCache,
        settings: &GraphicsPipelineSettings,
    ) -> Result<Self> {
        let vertex_input_info = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&settings.vertex_bindings)
            .vertex_attribute_descriptions(&settings.vertex_attributes);

        let input_assembly_info = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(settings.topology)
            .primitive_restart_enable(false);

        let rasterizer_info = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(settings.polygon_mode)
            .line_width(settings.line_width)
            .cull_mode(settings.cull_mode)
            .front_face(settings.front_face)
            .depth_bias_enable(false);

        let multisampling_info = vk::PipelineMultisampleStateCreateInfo::builder()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil_info = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(settings.depth_test)
            .depth_write_enable(settings.depth_write)
            .depth_compare_op(settings.depth_compare_op)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false)
            .back(vk::StencilOpState {
                compare_op: vk::CompareOp::ALWAYS,
                ..Default::default()
            });

        let color_blend_attachments = [settings.blend_attachment];
        let color_blending_info = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let viewport_info = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state_info =
            vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

        let pipeline_create_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&settings.shader_stages)
            .vertex_input_state(&vertex_input_info)
            .input_assembly_state(&input_assembly_info)
            .rasterization_state(&rasterizer_info)
            .multisample_state(&multisampling_info)
            .depth_stencil_state(&depth_stencil_info)
            .color_blend_state(&color_blending_info)
            .viewport_state(&viewport_info)
            .dynamic_state(&dynamic_state_info)
            .layout(settings.layout)
            .render_pass(settings.render_pass)
            .subpass(0)
            .build();

        let pipeline = unsafe {
            context
                .logical_device()
                .logical_device()
                .create_graphics_pipelines(pipeline_cache, &[pipeline_create_info], None)
        }
        .map_err(|(_, error)| error)
        .context(CreateGraphicsPipeline)?
        .into_iter()
        .next()
        .unwrap_or_else(vk::Pipeline::null);

        Ok(Self { pipeline, context })
    }

    pub fn pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub fn bind(&self, device: &ash::Device, command_buffer: vk::CommandBuffer) {
        unsafe {
            device.cmd_bind_pipeline(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline,
            );
        }
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.context
                .logical_device()
                .logical_device()
                .destroy_pipeline(self.pipeline, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_state_falls_back_to_opaque_back_face_culled_triangles() {
        let settings = GraphicsPipelineSettingsBuilder::default()
            .polygon_mode(vk::PolygonMode::LINE)
            .build()
            .unwrap();

        assert_eq!(settings.polygon_mode, vk::PolygonMode::LINE);
        assert_eq!(settings.topology, vk::PrimitiveTopology::TRIANGLE_LIST);
        assert_eq!(settings.cull_mode, vk::CullModeFlags::BACK);
        assert_eq!(settings.front_face, vk::FrontFace::CLOCKWISE);
        assert_eq!(settings.depth_compare_op, vk::CompareOp::LESS_OR_EQUAL);
        assert!(settings.depth_test && settings.depth_write);
        assert_eq!(settings.blend_attachment.blend_enable, vk::FALSE);
        assert_eq!(settings.line_width, 1.0);
    }

    #[test]
    fn additive_blending_adds_color_and_weights_alpha() {
        let blend = additive_blend_attachment();
        assert_eq!(blend.blend_enable, vk::TRUE);
        assert_eq!(blend.src_color_blend_factor, vk::BlendFactor::ONE);
        assert_eq!(blend.dst_color_blend_factor, vk::BlendFactor::ONE);
        assert_eq!(blend.src_alpha_blend_factor, vk::BlendFactor::SRC_ALPHA);
        assert_eq!(blend.dst_alpha_blend_factor, vk::BlendFactor::DST_ALPHA);
        assert_eq!(blend.color_write_mask, vk::ColorComponentFlags::all());
    }

    #[test]
    fn alpha_blending_keeps_the_background_where_coverage_is_zero() {
        let blend = alpha_blend_attachment();
        assert_eq!(blend.blend_enable, vk::TRUE);
        assert_eq!(blend.src_color_blend_factor, vk::BlendFactor::SRC_ALPHA);
        assert_eq!(
            blend.dst_color_blend_factor,
            vk::BlendFactor::ONE_MINUS_SRC_ALPHA
        );
        assert_eq!(blend.color_blend_op, vk::BlendOp::ADD);
    }
}
