use base::{
    app::{run_example, Example, ExampleBase, HookResult},
    ash::{version::DeviceV1_0, vk},
    glm, logger,
    overlay::{TextAlign, TextOverlay},
    settings::ExampleSettingsBuilder,
    view::perspective,
    vulkan::{
        additive_blend_attachment, load_mesh, name_unnamed_parts,
        renderer::{clear_values, full_scissor, full_viewport},
        set_image_layout, vertex_attributes, vertex_stride, Buffer, Command, CommandPool,
        DepthStencil, DescriptorPool, DescriptorSetLayout, Framebuffer, GraphicsPipeline,
        GraphicsPipelineSettings, GraphicsPipelineSettingsBuilder, Image, ImageView, MeshBuffer,
        MeshCreateInfo, PipelineLayout, RenderPass, Texture, VertexComponent, VulkanContext,
    },
    winit::event::VirtualKeyCode,
};
use log::info;
use std::{error::Error, mem, path::Path, sync::Arc};

const OFFSCREEN_DIMENSION: u32 = 256;
const OFFSCREEN_COLOR_FORMAT: vk::Format = vk::Format::R8G8B8A8_UNORM;
const VERTEX_BUFFER_BIND_ID: u32 = 0;

const VERTEX_LAYOUT: [VertexComponent; 4] = [
    VertexComponent::Position,
    VertexComponent::Normal,
    VertexComponent::Uv,
    VertexComponent::Color,
];

// The scene objects in draw order, used when the model file leaves them unnamed
const PART_NAMES: [&str; 10] = [
    "hill",
    "rocks",
    "cave",
    "tree",
    "mushroom stems",
    "blue mushroom caps",
    "red mushroom caps",
    "grass blades",
    "chest box",
    "chest fittings",
];

const SCENE_REGION_COLOR: [f32; 4] = [0.5, 0.76, 0.34, 1.0];
const TOON_REGION_COLOR: [f32; 4] = [0.78, 0.74, 0.9, 1.0];
const WIREFRAME_REGION_COLOR: [f32; 4] = [0.53, 0.78, 0.91, 1.0];
const POSTPROCESS_REGION_COLOR: [f32; 4] = [0.93, 0.89, 0.69, 1.0];
const OFFSCREEN_REGION_COLOR: [f32; 4] = [1.0, 0.78, 0.05, 1.0];

const UNIFORM_BUFFER_TAG: &[u8] = b"debug marker tag\0";

fn main() {
    let settings = match ExampleSettingsBuilder::default()
        .title("Vulkan Example - VK_EXT_debug_marker")
        .enable_debug_markers(true)
        .enable_text_overlay(true)
        .zoom(-8.5)
        .zoom_speed(2.5)
        .rotation_speed(0.5)
        .rotation(glm::vec3(-4.35, 16.25, 0.0))
        .camera_position(glm::vec3(0.1, 1.1, 0.0))
        .build()
    {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("Invalid example settings: {}", error);
            return;
        }
    };

    logger::init(settings.log_level);

    if let Err(error) = run_example(DebugMarkerExample::default(), settings) {
        log::error!("{}", error);
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
struct UniformBufferObject {
    projection: glm::Mat4,
    model: glm::Mat4,
    light_position: glm::Vec4,
}

fn marker_status(active: bool) -> &'static str {
    if active {
        "VK_EXT_debug_marker active"
    } else {
        "VK_EXT_debug_marker not present"
    }
}

/// Left and right halves of the framebuffer, for the toon and wireframe views.
fn split_scissors(extent: vk::Extent2D) -> (vk::Rect2D, vk::Rect2D) {
    let half_width = extent.width / 2;
    let left = vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent: vk::Extent2D {
            width: half_width,
            height: extent.height,
        },
    };
    let right = vk::Rect2D {
        offset: vk::Offset2D {
            x: half_width as i32,
            y: 0,
        },
        extent: vk::Extent2D {
            width: extent.width - half_width,
            height: extent.height,
        },
    };
    (left, right)
}

// Fields are dropped in declaration order
struct Offscreen {
    framebuffer: Framebuffer,
    render_pass: RenderPass,
    _depth: DepthStencil,
    _color_view: ImageView,
    color: Image,
    texture_target: Texture,
    command_buffer: vk::CommandBuffer,
}

impl Offscreen {
    fn new(
        context: Arc<VulkanContext>,
        command_pool: &CommandPool,
        depth_format: vk::Format,
    ) -> Result<Self, Box<dyn Error>> {
        let extent = vk::Extent2D {
            width: OFFSCREEN_DIMENSION,
            height: OFFSCREEN_DIMENSION,
        };

        let image_create_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .format(OFFSCREEN_COLOR_FORMAT)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_SRC)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);
        let color = Image::new(
            context.clone(),
            &image_create_info,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;

        let view_create_info = vk::ImageViewCreateInfo::builder()
            .image(color.image())
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(OFFSCREEN_COLOR_FORMAT)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        let color_view = ImageView::new(context.clone(), &view_create_info)?;

        let depth = DepthStencil::new(context.clone(), depth_format, extent)?;
        let render_pass = Self::create_render_pass(context.clone(), depth_format)?;
        let framebuffer = Framebuffer::new(
            context.clone(),
            render_pass.render_pass(),
            &[color_view.view(), depth.view()],
            extent,
        )?;

        let texture_target =
            Texture::render_target(context.clone(), command_pool, OFFSCREEN_COLOR_FORMAT, extent)?;

        let command_buffer =
            command_pool.create_command_buffer(vk::CommandBufferLevel::PRIMARY, false)?;

        context.set_object_name(
            color.image(),
            vk::DebugReportObjectTypeEXT::IMAGE,
            "Off-screen color framebuffer",
        );
        context.set_object_name(
            depth.image(),
            vk::DebugReportObjectTypeEXT::IMAGE,
            "Off-screen depth framebuffer",
        );
        context.set_object_name(
            texture_target.image(),
            vk::DebugReportObjectTypeEXT::IMAGE,
            "Off-screen texture target image",
        );
        context.set_object_name(
            texture_target.sampler(),
            vk::DebugReportObjectTypeEXT::SAMPLER,
            "Off-screen texture target sampler",
        );

        Ok(Self {
            framebuffer,
            render_pass,
            _depth: depth,
            _color_view: color_view,
            color,
            texture_target,
            command_buffer,
        })
    }

    // The color attachment ends up as the source of the blit into the texture target
    fn create_render_pass(
        context: Arc<VulkanContext>,
        depth_format: vk::Format,
    ) -> Result<RenderPass, Box<dyn Error>> {
        let attachment_descriptions = [
            vk::AttachmentDescription::builder()
                .format(OFFSCREEN_COLOR_FORMAT)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::TRANSFER_SRC_OPTIMAL)
                .build(),
            vk::AttachmentDescription::builder()
                .format(depth_format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                .build(),
        ];

        let color_attachment_references = [vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let depth_attachment_reference = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };

        let subpass_descriptions = [vk::SubpassDescription::builder()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_attachment_references)
            .depth_stencil_attachment(&depth_attachment_reference)
            .build()];

        let subpass_dependencies = [
            vk::SubpassDependency::builder()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(vk::PipelineStageFlags::BOTTOM_OF_PIPE)
                .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .src_access_mask(vk::AccessFlags::MEMORY_READ)
                .dst_access_mask(
                    vk::AccessFlags::COLOR_ATTACHMENT_READ
                        | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                )
                .dependency_flags(vk::DependencyFlags::BY_REGION)
                .build(),
            vk::SubpassDependency::builder()
                .src_subpass(0)
                .dst_subpass(vk::SUBPASS_EXTERNAL)
                .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .dst_stage_mask(vk::PipelineStageFlags::TRANSFER)
                .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
                .dst_access_mask(vk::AccessFlags::TRANSFER_READ)
                .dependency_flags(vk::DependencyFlags::BY_REGION)
                .build(),
        ];

        let create_info = vk::RenderPassCreateInfo::builder()
            .attachments(&attachment_descriptions)
            .subpasses(&subpass_descriptions)
            .dependencies(&subpass_dependencies);

        Ok(RenderPass::new(context, &create_info)?)
    }

    fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: OFFSCREEN_DIMENSION,
            height: OFFSCREEN_DIMENSION,
        }
    }
}

// Fields are dropped in declaration order
struct Pipelines {
    toon: GraphicsPipeline,
    color: GraphicsPipeline,
    wireframe: Option<GraphicsPipeline>,
    postprocess: GraphicsPipeline,
}

// Fields are dropped in declaration order
struct Resources {
    pipelines: Pipelines,
    pipeline_layout: PipelineLayout,
    descriptor_set: vk::DescriptorSet,
    _descriptor_pool: DescriptorPool,
    descriptor_set_layout: DescriptorSetLayout,
    offscreen: Offscreen,
    uniform_buffer: Buffer,
    scene: MeshBuffer,
    scene_glow: MeshBuffer,
}

impl Resources {
    fn bind_descriptor_set(&self, device: &ash::Device, command_buffer: vk::CommandBuffer) {
        unsafe {
            device.cmd_bind_descriptor_sets(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline_layout.layout(),
                0,
                &[self.descriptor_set],
                &[],
            );
        }
    }

    /// Renders the glowing parts of the scene and blits them into the texture target.
    fn record_offscreen(&self, context: &VulkanContext) -> HookResult {
        let device = context.logical_device().logical_device();
        let offscreen = &self.offscreen;
        let command_buffer = offscreen.command_buffer;
        let extent = offscreen.extent();

        let begin_info = vk::CommandBufferBeginInfo::builder();
        unsafe { device.begin_command_buffer(command_buffer, &begin_info) }?;

        context.begin_region(
            command_buffer,
            "Off-screen scene rendering",
            OFFSCREEN_REGION_COLOR,
        );

        let clear_values = clear_values([0.0, 0.0, 0.0, 0.0]);
        let render_pass_begin_info = vk::RenderPassBeginInfo::builder()
            .render_pass(offscreen.render_pass.render_pass())
            .framebuffer(offscreen.framebuffer.framebuffer())
            .render_area(full_scissor(extent))
            .clear_values(&clear_values);

        unsafe {
            device.cmd_begin_render_pass(
                command_buffer,
                &render_pass_begin_info,
                vk::SubpassContents::INLINE,
            );
            device.cmd_set_viewport(command_buffer, 0, &[full_viewport(extent)]);
            device.cmd_set_scissor(command_buffer, 0, &[full_scissor(extent)]);
        }

        self.bind_descriptor_set(device, command_buffer);
        self.pipelines.color.bind(device, command_buffer);
        self.scene_glow
            .draw_parts(context, command_buffer, VERTEX_BUFFER_BIND_ID);

        unsafe { device.cmd_end_render_pass(command_buffer) };

        let target = offscreen.texture_target.image();
        set_image_layout(
            device,
            command_buffer,
            target,
            vk::ImageAspectFlags::COLOR,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );

        let subresource = vk::ImageSubresourceLayers {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
        };
        let corners = [
            vk::Offset3D { x: 0, y: 0, z: 0 },
            vk::Offset3D {
                x: extent.width as i32,
                y: extent.height as i32,
                z: 1,
            },
        ];
        let blit = vk::ImageBlit {
            src_subresource: subresource,
            src_offsets: corners,
            dst_subresource: subresource,
            dst_offsets: corners,
        };
        unsafe {
            device.cmd_blit_image(
                command_buffer,
                offscreen.color.image(),
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                target,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[blit],
                vk::Filter::LINEAR,
            );
        }

        set_image_layout(
            device,
            command_buffer,
            target,
            vk::ImageAspectFlags::COLOR,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );

        context.end_region(command_buffer);

        unsafe { device.end_command_buffer(command_buffer) }?;
        Ok(())
    }
}

/// Records the on-screen scene into each draw command buffer.
struct SceneCommands<'a> {
    context: &'a VulkanContext,
    resources: &'a Resources,
    extent: vk::Extent2D,
    wireframe: bool,
    glow: bool,
}

impl<'a> Command for SceneCommands<'a> {
    fn issue_commands(&mut self, device: &ash::Device, command_buffer: vk::CommandBuffer) {
        let context = self.context;
        let resources = self.resources;
        let wireframe = if self.wireframe {
            resources.pipelines.wireframe.as_ref()
        } else {
            None
        };
        let (left, right) = split_scissors(self.extent);

        context.begin_region(command_buffer, "Render scene", SCENE_REGION_COLOR);

        if wireframe.is_some() {
            unsafe { device.cmd_set_scissor(command_buffer, 0, &[left]) };
        }

        resources.bind_descriptor_set(device, command_buffer);

        context.begin_region(command_buffer, "Toon shading draw", TOON_REGION_COLOR);
        resources.pipelines.toon.bind(device, command_buffer);
        resources
            .scene
            .draw_parts(context, command_buffer, VERTEX_BUFFER_BIND_ID);
        context.end_region(command_buffer);

        if let Some(pipeline) = wireframe {
            context.begin_region(command_buffer, "Wireframe draw", WIREFRAME_REGION_COLOR);
            unsafe { device.cmd_set_scissor(command_buffer, 0, &[right]) };
            pipeline.bind(device, command_buffer);
            resources
                .scene
                .draw_parts(context, command_buffer, VERTEX_BUFFER_BIND_ID);
            context.end_region(command_buffer);

            unsafe { device.cmd_set_scissor(command_buffer, 0, &[full_scissor(self.extent)]) };
        }

        if self.glow {
            context.begin_region(
                command_buffer,
                "Apply post processing",
                POSTPROCESS_REGION_COLOR,
            );
            resources.pipelines.postprocess.bind(device, command_buffer);
            // Fullscreen triangle generated in the vertex shader
            unsafe { device.cmd_draw(command_buffer, 4, 1, 0, 0) };
            context.end_region(command_buffer);
        }

        context.end_region(command_buffer);
    }
}

struct DebugMarkerExample {
    wireframe: bool,
    glow: bool,
    resources: Option<Resources>,
}

impl Default for DebugMarkerExample {
    fn default() -> Self {
        Self {
            wireframe: true,
            glow: true,
            resources: None,
        }
    }
}

impl DebugMarkerExample {
    fn resources(&self) -> Result<&Resources, Box<dyn Error>> {
        self.resources
            .as_ref()
            .ok_or_else(|| "The example has not been prepared".into())
    }

    fn load_scene(base: &ExampleBase, file_name: &str) -> Result<MeshBuffer, Box<dyn Error>> {
        let path = base.asset(&format!("models/{}", file_name));
        if !path.exists() {
            return Err(missing_model(&path).into());
        }
        let mut mesh = load_mesh(
            base.context().clone(),
            base.renderer.command_pool(),
            path,
            &VERTEX_LAYOUT,
            &MeshCreateInfo::default(),
        )?;
        name_unnamed_parts(&mut mesh.parts, &PART_NAMES);
        Ok(mesh)
    }

    fn create_descriptor_set_layout(
        context: Arc<VulkanContext>,
    ) -> Result<DescriptorSetLayout, Box<dyn Error>> {
        let bindings = [
            vk::DescriptorSetLayoutBinding::builder()
                .binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::VERTEX)
                .build(),
            vk::DescriptorSetLayoutBinding::builder()
                .binding(1)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::FRAGMENT)
                .build(),
        ];
        Ok(DescriptorSetLayout::new(context, &bindings)?)
    }

    fn create_descriptor_pool(context: Arc<VulkanContext>) -> Result<DescriptorPool, Box<dyn Error>> {
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: 1,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: 1,
            },
        ];
        Ok(DescriptorPool::new(context, &pool_sizes, 1)?)
    }

    fn update_descriptor_set(
        device: &ash::Device,
        descriptor_set: vk::DescriptorSet,
        uniform_buffer: &Buffer,
        texture: &Texture,
    ) {
        let buffer_infos = [uniform_buffer.descriptor()];
        let image_infos = [texture.descriptor()];

        let descriptor_writes = [
            vk::WriteDescriptorSet::builder()
                .dst_set(descriptor_set)
                .dst_binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&buffer_infos)
                .build(),
            vk::WriteDescriptorSet::builder()
                .dst_set(descriptor_set)
                .dst_binding(1)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .image_info(&image_infos)
                .build(),
        ];

        unsafe { device.update_descriptor_sets(&descriptor_writes, &[]) }
    }

    fn load_shader_pair(
        base: &mut ExampleBase,
        name: &str,
        labels: (&str, &str),
    ) -> Result<Vec<vk::PipelineShaderStageCreateInfo>, Box<dyn Error>> {
        let vertex_path = base.asset(&format!("shaders/debugmarker/{}.vert.spv", name));
        let fragment_path = base.asset(&format!("shaders/debugmarker/{}.frag.spv", name));
        let vertex = base
            .renderer
            .load_shader(vertex_path, vk::ShaderStageFlags::VERTEX)?;
        let fragment = base
            .renderer
            .load_shader(fragment_path, vk::ShaderStageFlags::FRAGMENT)?;

        let context = base.context();
        context.set_object_name(
            vertex.module,
            vk::DebugReportObjectTypeEXT::SHADER_MODULE,
            labels.0,
        );
        context.set_object_name(
            fragment.module,
            vk::DebugReportObjectTypeEXT::SHADER_MODULE,
            labels.1,
        );

        Ok(vec![vertex, fragment])
    }

    fn create_pipelines(
        base: &mut ExampleBase,
        layout: vk::PipelineLayout,
        offscreen_render_pass: vk::RenderPass,
    ) -> Result<Pipelines, Box<dyn Error>> {
        let vertex_bindings = vec![vk::VertexInputBindingDescription {
            binding: VERTEX_BUFFER_BIND_ID,
            stride: vertex_stride(&VERTEX_LAYOUT),
            input_rate: vk::VertexInputRate::VERTEX,
        }];
        let vertex_attributes = vertex_attributes(VERTEX_BUFFER_BIND_ID, &VERTEX_LAYOUT);

        let toon_stages = Self::load_shader_pair(
            base,
            "toon",
            ("Toon shading vertex shader", "Toon shading fragment shader"),
        )?;
        let color_stages = Self::load_shader_pair(
            base,
            "colorpass",
            ("Color-only vertex shader", "Color-only fragment shader"),
        )?;
        let postprocess_stages = Self::load_shader_pair(
            base,
            "postprocess",
            ("Postprocess vertex shader", "Postprocess fragment shader"),
        )?;

        let context = base.context().clone();
        let pipeline_cache = base.renderer.pipeline_cache();

        let scene_settings = GraphicsPipelineSettings {
            render_pass: base.renderer.render_pass(),
            layout,
            vertex_bindings,
            vertex_attributes,
            ..GraphicsPipelineSettings::default()
        };

        let toon_settings = GraphicsPipelineSettings {
            shader_stages: toon_stages.clone(),
            ..scene_settings.clone()
        };
        let toon = GraphicsPipeline::new(context.clone(), pipeline_cache, &toon_settings)?;

        let color_settings = GraphicsPipelineSettings {
            render_pass: offscreen_render_pass,
            shader_stages: color_stages,
            ..scene_settings.clone()
        };
        let color = GraphicsPipeline::new(context.clone(), pipeline_cache, &color_settings)?;

        let wireframe = if context
            .physical_device()
            .features()
            .fill_mode_non_solid
            == vk::TRUE
        {
            let wireframe_settings = GraphicsPipelineSettings {
                shader_stages: toon_stages,
                polygon_mode: vk::PolygonMode::LINE,
                ..scene_settings.clone()
            };
            Some(GraphicsPipeline::new(
                context.clone(),
                pipeline_cache,
                &wireframe_settings,
            )?)
        } else {
            info!("Non solid fill modes are not supported, wireframe view disabled");
            None
        };

        let postprocess_settings = GraphicsPipelineSettingsBuilder::default()
            .render_pass(base.renderer.render_pass())
            .layout(layout)
            .shader_stages(postprocess_stages)
            .cull_mode(vk::CullModeFlags::NONE)
            .depth_test(false)
            .depth_write(false)
            .blend_attachment(additive_blend_attachment())
            .build()?;
        let postprocess = GraphicsPipeline::new(context.clone(), pipeline_cache, &postprocess_settings)?;

        context.set_object_name(
            toon.pipeline(),
            vk::DebugReportObjectTypeEXT::PIPELINE,
            "Toon shading pipeline",
        );
        context.set_object_name(
            color.pipeline(),
            vk::DebugReportObjectTypeEXT::PIPELINE,
            "Color only pipeline",
        );
        if let Some(wireframe) = wireframe.as_ref() {
            context.set_object_name(
                wireframe.pipeline(),
                vk::DebugReportObjectTypeEXT::PIPELINE,
                "Wireframe rendering pipeline",
            );
        }
        context.set_object_name(
            postprocess.pipeline(),
            vk::DebugReportObjectTypeEXT::PIPELINE,
            "Post processing pipeline",
        );

        Ok(Pipelines {
            toon,
            color,
            wireframe,
            postprocess,
        })
    }

    fn name_objects(context: &VulkanContext, resources: &Resources) {
        let names = [
            (resources.scene.vertex_buffer(), "Scene vertex buffer"),
            (resources.scene.index_buffer(), "Scene index buffer"),
            (resources.scene_glow.vertex_buffer(), "Glow vertex buffer"),
            (resources.scene_glow.index_buffer(), "Glow index buffer"),
            (
                resources.uniform_buffer.buffer(),
                "Scene uniform buffer block",
            ),
        ];
        for (buffer, name) in names.iter() {
            context.set_object_name(*buffer, vk::DebugReportObjectTypeEXT::BUFFER, name);
        }

        context.set_object_tag(
            resources.uniform_buffer.buffer(),
            vk::DebugReportObjectTypeEXT::BUFFER,
            0,
            UNIFORM_BUFFER_TAG,
        );

        context.set_object_name(
            resources.pipeline_layout.layout(),
            vk::DebugReportObjectTypeEXT::PIPELINE_LAYOUT,
            "Shared pipeline layout",
        );
        context.set_object_name(
            resources.descriptor_set_layout.layout(),
            vk::DebugReportObjectTypeEXT::DESCRIPTOR_SET_LAYOUT,
            "Shared descriptor set layout",
        );
    }

    fn update_uniform_buffers(&self, base: &ExampleBase) -> HookResult {
        let resources = self.resources()?;
        let aspect_ratio = base.renderer.swapchain().properties().aspect_ratio();
        let ubo = UniformBufferObject {
            projection: perspective(60.0, aspect_ratio, 0.1, 256.0),
            model: base.view.model_matrix(),
            light_position: glm::vec4(0.0, 5.0, 15.0, 1.0),
        };
        resources.uniform_buffer.upload(&[ubo], 0)?;
        Ok(())
    }
}

impl Example for DebugMarkerExample {
    fn enabled_features(&self, available: &vk::PhysicalDeviceFeatures) -> vk::PhysicalDeviceFeatures {
        vk::PhysicalDeviceFeatures {
            fill_mode_non_solid: available.fill_mode_non_solid,
            wide_lines: available.wide_lines,
            ..Default::default()
        }
    }

    fn prepare(&mut self, base: &mut ExampleBase) -> HookResult {
        let context = base.context().clone();

        let scene = Self::load_scene(base, "treasure_smooth.obj")?;
        let scene_glow = Self::load_scene(base, "treasure_glow.obj")?;

        let uniform_buffer = Buffer::new_host_visible(
            context.clone(),
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            mem::size_of::<UniformBufferObject>() as _,
            None,
        )?;

        let offscreen = Offscreen::new(
            context.clone(),
            base.renderer.command_pool(),
            base.renderer.depth_format(),
        )?;

        let descriptor_set_layout = Self::create_descriptor_set_layout(context.clone())?;
        let pipeline_layout =
            PipelineLayout::new(context.clone(), &[descriptor_set_layout.layout()])?;
        let descriptor_pool = Self::create_descriptor_pool(context.clone())?;
        let descriptor_set = descriptor_pool
            .allocate_descriptor_sets(descriptor_set_layout.layout(), 1)?
            .into_iter()
            .next()
            .ok_or("No descriptor set was allocated")?;
        Self::update_descriptor_set(
            context.logical_device().logical_device(),
            descriptor_set,
            &uniform_buffer,
            &offscreen.texture_target,
        );

        let pipelines = Self::create_pipelines(
            base,
            pipeline_layout.layout(),
            offscreen.render_pass.render_pass(),
        )?;

        let resources = Resources {
            pipelines,
            pipeline_layout,
            descriptor_set,
            _descriptor_pool: descriptor_pool,
            descriptor_set_layout,
            offscreen,
            uniform_buffer,
            scene,
            scene_glow,
        };
        Self::name_objects(&context, &resources);
        resources.record_offscreen(&context)?;
        self.resources = Some(resources);

        self.update_uniform_buffers(base)
    }

    fn build_command_buffers(&mut self, base: &mut ExampleBase) -> HookResult {
        let resources = self.resources()?;
        let mut commands = SceneCommands {
            context: base.context(),
            resources,
            extent: base.renderer.extent(),
            wireframe: self.wireframe,
            glow: self.glow,
        };
        base.renderer.record_all_command_buffers(&mut commands)?;
        Ok(())
    }

    fn render(&mut self, base: &mut ExampleBase) -> HookResult {
        let offscreen = if self.glow {
            vec![self.resources()?.offscreen.command_buffer]
        } else {
            Vec::new()
        };
        base.renderer.draw_frame(&offscreen)?;
        Ok(())
    }

    fn view_changed(&mut self, base: &mut ExampleBase) -> HookResult {
        self.update_uniform_buffers(base)
    }

    fn key_pressed(&mut self, base: &mut ExampleBase, key: VirtualKeyCode) -> HookResult {
        match key {
            VirtualKeyCode::W => self.wireframe = !self.wireframe,
            VirtualKeyCode::G => self.glow = !self.glow,
            _ => return Ok(()),
        }
        base.rebuild_command_buffers(self)
    }

    fn overlay_text(&self, base: &ExampleBase, overlay: &mut TextOverlay) {
        overlay.add_text(
            marker_status(base.context().debug_markers_enabled()),
            5.0,
            85.0,
            TextAlign::Left,
        );
    }
}

fn missing_model(path: &Path) -> String {
    format!(
        "Model '{}' not found, see assets/models/README.md for where to get it",
        path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scissors_split_the_framebuffer_in_halves() {
        let (left, right) = split_scissors(vk::Extent2D {
            width: 1281,
            height: 720,
        });
        assert_eq!(left.offset.x, 0);
        assert_eq!(left.extent.width, 640);
        assert_eq!(right.offset.x, 640);
        assert_eq!(right.extent.width, 641);
        assert_eq!(right.extent.height, 720);
    }

    #[test]
    fn uniform_block_matches_the_shader_layout() {
        assert_eq!(mem::size_of::<UniformBufferObject>(), 2 * 64 + 16);
    }

    #[test]
    fn overlay_reports_the_extension_state() {
        assert_eq!(marker_status(true), "VK_EXT_debug_marker active");
        assert_eq!(marker_status(false), "VK_EXT_debug_marker not present");
    }

    #[test]
    fn tag_is_nul_terminated() {
        assert_eq!(UNIFORM_BUFFER_TAG.len(), 17);
        assert_eq!(UNIFORM_BUFFER_TAG.last(), Some(&0));
    }

    #[test]
    fn missing_models_point_to_the_asset_readme() {
        let message = missing_model(Path::new("assets/models/treasure_glow.obj"));
        assert!(message.contains("assets/models/treasure_glow.obj"));
        assert!(message.contains("assets/models/README.md"));
    }

    #[test]
    fn example_starts_with_wireframe_and_glow() {
        let example = DebugMarkerExample::default();
        assert!(example.wireframe && example.glow);
        assert!(example.resources().is_err());
    }
}
