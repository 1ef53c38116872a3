use crate::{
    overlay::{OverlayLine, TextAlign},
    vulkan::{
        core::{descriptor, renderpass},
        pipeline,
        renderer,
        resource::{buffer, command_pool, texture},
        Buffer, CommandPool, DescriptorPool, DescriptorSetLayout, GraphicsPipeline,
        GraphicsPipelineSettingsBuilder, PipelineLayout, RenderPass, Renderer, Texture,
        VulkanContext,
    },
};
use ash::{version::DeviceV1_0, vk};
use fontdue::{Font, FontSettings};
use log::info;
use snafu::{ResultExt, Snafu};
use std::{collections::HashMap, fs, mem, path::Path, sync::Arc};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to read font '{}': {}", path, source))]
    ReadFont {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("Failed to parse font '{}': {}", path, reason))]
    ParseFont { path: String, reason: &'static str },

    #[snafu(display("Failed to upload the font atlas: {}", source))]
    CreateFontTexture { source: texture::Error },

    #[snafu(display("Failed to create the overlay vertex buffer: {}", source))]
    CreateVertexBuffer { source: renderer::Error },

    #[snafu(display("Failed to upload overlay vertices: {}", source))]
    UploadVertices { source: buffer::Error },

    #[snafu(display("Failed to create overlay descriptors: {}", source))]
    CreateDescriptors { source: descriptor::Error },

    #[snafu(display("Failed to create overlay render pass: {}", source))]
    CreateRenderPass { source: renderpass::Error },

    #[snafu(display("Failed to load overlay shader: {}", source))]
    LoadShader { source: renderer::Error },

    #[snafu(display("Failed to create overlay pipeline layout: {}", source))]
    CreatePipelineLayout { source: pipeline::Error },

    #[snafu(display("Failed to create overlay pipeline: {}", source))]
    CreatePipeline { source: pipeline::Error },

    #[snafu(display("Invalid overlay pipeline settings: {}", message))]
    PipelineSettings { message: String },

    #[snafu(display("Failed to allocate overlay command buffers: {}", source))]
    AllocateCommandBuffers { source: command_pool::Error },

    #[snafu(display("Failed to record overlay command buffer: {}", source))]
    RecordCommandBuffer { source: ash::vk::Result },
}

pub const FONT_SIZE: f32 = 20.0;
pub const MAX_CHARACTERS: usize = 2048;

const FIRST_CHARACTER: char = ' ';
const LAST_CHARACTER: char = '~';
const ATLAS_WIDTH: usize = 512;
const GLYPH_PADDING: usize = 1;
const VERTICES_PER_GLYPH: usize = 6;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct OverlayVertex {
    /// Normalized device coordinates
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub uv_min: [f32; 2],
    pub uv_max: [f32; 2],
    pub size: [f32; 2],
    /// Offset of the bitmap's left edge from the pen and its bottom edge above the baseline
    pub bearing: [f32; 2],
    pub advance: f32,
}

/// Printable ASCII rasterized into a single channel atlas.
pub struct FontAtlas {
    glyphs: HashMap<char, Glyph>,
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    ascent: f32,
}

impl FontAtlas {
    pub fn from_file(path: impl AsRef<Path>, size: f32) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).context(ReadFont {
            path: path.display().to_string(),
        })?;
        Self::from_bytes(&bytes, size).map_err(|reason| Error::ParseFont {
            path: path.display().to_string(),
            reason,
        })
    }

    pub fn from_bytes(bytes: &[u8], size: f32) -> std::result::Result<Self, &'static str> {
        let font = Font::from_bytes(bytes, FontSettings::default())?;
        let ascent = font
            .horizontal_line_metrics(size)
            .map(|metrics| metrics.ascent)
            .unwrap_or(size);

        let rasterized = (FIRST_CHARACTER..=LAST_CHARACTER)
            .map(|character| (character, font.rasterize(character, size)))
            .collect::<Vec<_>>();

        // Rows are filled left to right, a glyph that does not fit starts a new row
        let mut placements = Vec::with_capacity(rasterized.len());
        let (mut x, mut y, mut row_height) = (0, 0, 0);
        for (_, (metrics, _)) in rasterized.iter() {
            if x + metrics.width + GLYPH_PADDING > ATLAS_WIDTH {
                x = 0;
                y += row_height + GLYPH_PADDING;
                row_height = 0;
            }
            placements.push((x, y));
            x += metrics.width + GLYPH_PADDING;
            row_height = row_height.max(metrics.height);
        }
        let height = (y + row_height).max(1).next_power_of_two();

        let mut pixels = vec![0; ATLAS_WIDTH * height];
        let mut glyphs = HashMap::with_capacity(rasterized.len());
        for ((character, (metrics, bitmap)), (x, y)) in rasterized.iter().zip(placements) {
            for row in 0..metrics.height {
                let source = &bitmap[row * metrics.width..(row + 1) * metrics.width];
                let start = (y + row) * ATLAS_WIDTH + x;
                pixels[start..start + metrics.width].copy_from_slice(source);
            }

            glyphs.insert(
                *character,
                Glyph {
                    uv_min: [
                        x as f32 / ATLAS_WIDTH as f32,
                        y as f32 / height as f32,
                    ],
                    uv_max: [
                        (x + metrics.width) as f32 / ATLAS_WIDTH as f32,
                        (y + metrics.height) as f32 / height as f32,
                    ],
                    size: [metrics.width as f32, metrics.height as f32],
                    bearing: [metrics.xmin as f32, metrics.ymin as f32],
                    advance: metrics.advance_width,
                },
            );
        }

        Ok(Self {
            glyphs,
            pixels,
            width: ATLAS_WIDTH as u32,
            height: height as u32,
            ascent,
        })
    }

    /// Characters outside the atlas are drawn as `?`.
    pub fn glyph(&self, character: char) -> Option<&Glyph> {
        self.glyphs
            .get(&character)
            .or_else(|| self.glyphs.get(&'?'))
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.width,
            height: self.height,
        }
    }

    pub fn ascent(&self) -> f32 {
        self.ascent
    }

    pub fn text_width(&self, text: &str) -> f32 {
        text.chars()
            .filter_map(|character| self.glyph(character))
            .map(|glyph| glyph.advance)
            .sum()
    }
}

/// Builds two triangles per visible glyph. `x` and `y` of each line are the
/// pixel position of the top of the text, the alignment picks which side of
/// the text `x` refers to. Output stops at `MAX_CHARACTERS` glyphs.
pub fn layout_text(
    atlas: &FontAtlas,
    lines: &[OverlayLine],
    extent: vk::Extent2D,
) -> Vec<OverlayVertex> {
    let to_ndc = |x: f32, y: f32| {
        [
            x / extent.width as f32 * 2.0 - 1.0,
            y / extent.height as f32 * 2.0 - 1.0,
        ]
    };

    let mut vertices = Vec::new();
    for line in lines {
        let mut pen = match line.align {
            TextAlign::Left => line.x,
            TextAlign::Center => line.x - atlas.text_width(&line.text) / 2.0,
            TextAlign::Right => line.x - atlas.text_width(&line.text),
        };
        let baseline = line.y + atlas.ascent();

        for glyph in line.text.chars().filter_map(|character| atlas.glyph(character)) {
            if vertices.len() + VERTICES_PER_GLYPH > MAX_CHARACTERS * VERTICES_PER_GLYPH {
                return vertices;
            }

            if glyph.size[0] > 0.0 && glyph.size[1] > 0.0 {
                let left = pen + glyph.bearing[0];
                let right = left + glyph.size[0];
                let bottom = baseline - glyph.bearing[1];
                let top = bottom - glyph.size[1];

                let top_left = OverlayVertex {
                    position: to_ndc(left, top),
                    uv: glyph.uv_min,
                };
                let top_right = OverlayVertex {
                    position: to_ndc(right, top),
                    uv: [glyph.uv_max[0], glyph.uv_min[1]],
                };
                let bottom_left = OverlayVertex {
                    position: to_ndc(left, bottom),
                    uv: [glyph.uv_min[0], glyph.uv_max[1]],
                };
                let bottom_right = OverlayVertex {
                    position: to_ndc(right, bottom),
                    uv: glyph.uv_max,
                };
                vertices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }

            pen += glyph.advance;
        }
    }
    vertices
}

/// Draws overlay text on top of the presented image in its own render pass.
pub struct TextOverlayRenderer {
    command_buffers: Vec<vk::CommandBuffer>,
    command_pool: CommandPool,
    pipeline: GraphicsPipeline,
    pipeline_layout: PipelineLayout,
    descriptor_set: vk::DescriptorSet,
    _descriptor_pool: DescriptorPool,
    _descriptor_set_layout: DescriptorSetLayout,
    render_pass: RenderPass,
    vertex_buffer: Buffer,
    vertex_count: u32,
    _font_texture: Texture,
    atlas: FontAtlas,
    context: Arc<VulkanContext>,
}

impl TextOverlayRenderer {
    pub fn new(
        renderer: &mut Renderer,
        font_path: impl AsRef<Path>,
        vertex_shader_path: impl AsRef<Path>,
        fragment_shader_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let context = renderer.context().clone();

        let atlas = FontAtlas::from_file(font_path, FONT_SIZE)?;
        let font_texture = Texture::from_pixels(
            context.clone(),
            renderer.command_pool(),
            atlas.pixels(),
            atlas.extent(),
            vk::Format::R8_UNORM,
            vk::SamplerAddressMode::CLAMP_TO_EDGE,
        )
        .context(CreateFontTexture)?;
        info!(
            "Created font atlas ({}x{})",
            atlas.extent().width,
            atlas.extent().height
        );

        let vertex_buffer = renderer
            .create_buffer(
                vk::BufferUsageFlags::VERTEX_BUFFER,
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
                (MAX_CHARACTERS * VERTICES_PER_GLYPH * mem::size_of::<OverlayVertex>()) as _,
                None,
            )
            .context(CreateVertexBuffer)?;

        let bindings = [vk::DescriptorSetLayoutBinding::builder()
            .binding(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count(1)
            .stage_flags(vk::ShaderStageFlags::FRAGMENT)
            .build()];
        let descriptor_set_layout =
            DescriptorSetLayout::new(context.clone(), &bindings).context(CreateDescriptors)?;

        let pool_sizes = [vk::DescriptorPoolSize {
            ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            descriptor_count: 1,
        }];
        let descriptor_pool =
            DescriptorPool::new(context.clone(), &pool_sizes, 1).context(CreateDescriptors)?;
        let descriptor_set = descriptor_pool
            .allocate_descriptor_sets(descriptor_set_layout.layout(), 1)
            .context(CreateDescriptors)?[0];

        let image_infos = [font_texture.descriptor()];
        let descriptor_writes = [vk::WriteDescriptorSet::builder()
            .dst_set(descriptor_set)
            .dst_binding(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&image_infos)
            .build()];
        unsafe {
            context
                .logical_device()
                .logical_device()
                .update_descriptor_sets(&descriptor_writes, &[])
        }

        let render_pass = Self::create_render_pass(context.clone(), renderer)?;

        let pipeline_layout = PipelineLayout::new(context.clone(), &[descriptor_set_layout.layout()])
            .context(CreatePipelineLayout)?;

        let shader_stages = vec![
            renderer
                .load_shader(vertex_shader_path, vk::ShaderStageFlags::VERTEX)
                .context(LoadShader)?,
            renderer
                .load_shader(fragment_shader_path, vk::ShaderStageFlags::FRAGMENT)
                .context(LoadShader)?,
        ];

        let settings = GraphicsPipelineSettingsBuilder::default()
            .render_pass(render_pass.render_pass())
            .layout(pipeline_layout.layout())
            .shader_stages(shader_stages)
            .vertex_bindings(vec![vk::VertexInputBindingDescription {
                binding: 0,
                stride: mem::size_of::<OverlayVertex>() as _,
                input_rate: vk::VertexInputRate::VERTEX,
            }])
            .vertex_attributes(vec![
                vk::VertexInputAttributeDescription {
                    location: 0,
                    binding: 0,
                    format: vk::Format::R32G32_SFLOAT,
                    offset: 0,
                },
                vk::VertexInputAttributeDescription {
                    location: 1,
                    binding: 0,
                    format: vk::Format::R32G32_SFLOAT,
                    offset: (2 * mem::size_of::<f32>()) as _,
                },
            ])
            .cull_mode(vk::CullModeFlags::NONE)
            .depth_test(false)
            .depth_write(false)
            .blend_attachment(pipeline::alpha_blend_attachment())
            .build()
            .or_else(|message| PipelineSettings { message }.fail())?;
        let pipeline = GraphicsPipeline::new(context.clone(), renderer.pipeline_cache(), &settings)
            .context(CreatePipeline)?;

        let command_pool = CommandPool::new(
            context.clone(),
            vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
        )
        .context(AllocateCommandBuffers)?;

        context.set_object_name(
            font_texture.image(),
            vk::DebugReportObjectTypeEXT::IMAGE,
            "Text overlay font atlas",
        );
        context.set_object_name(
            pipeline.pipeline(),
            vk::DebugReportObjectTypeEXT::PIPELINE,
            "Text overlay pipeline",
        );

        Ok(Self {
            command_buffers: Vec::new(),
            command_pool,
            pipeline,
            pipeline_layout,
            descriptor_set,
            _descriptor_pool: descriptor_pool,
            _descriptor_set_layout: descriptor_set_layout,
            render_pass,
            vertex_buffer,
            vertex_count: 0,
            _font_texture: font_texture,
            atlas,
            context,
        })
    }

    // Loads what the scene rendered and leaves the image ready for presentation.
    // Compatible with the renderer's framebuffers.
    fn create_render_pass(context: Arc<VulkanContext>, renderer: &Renderer) -> Result<RenderPass> {
        let attachment_descriptions = [
            vk::AttachmentDescription::builder()
                .format(renderer.swapchain().properties().surface_format.format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::LOAD)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::PRESENT_SRC_KHR)
                .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
                .build(),
            vk::AttachmentDescription::builder()
                .format(renderer.depth_format())
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::DONT_CARE)
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
                .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
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
                .dst_stage_mask(vk::PipelineStageFlags::BOTTOM_OF_PIPE)
                .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
                .dst_access_mask(vk::AccessFlags::MEMORY_READ)
                .dependency_flags(vk::DependencyFlags::BY_REGION)
                .build(),
        ];

        let create_info = vk::RenderPassCreateInfo::builder()
            .attachments(&attachment_descriptions)
            .subpasses(&subpass_descriptions)
            .dependencies(&subpass_dependencies);

        RenderPass::new(context, &create_info).context(CreateRenderPass)
    }

    /// One command buffer per swapchain image, valid after `update`.
    pub fn command_buffers(&self) -> &[vk::CommandBuffer] {
        &self.command_buffers
    }

    /// Lays out `lines` and records the overlay for every framebuffer of the
    /// renderer. Must not be called while the overlay is in flight.
    pub fn update(&mut self, renderer: &Renderer, lines: &[OverlayLine]) -> Result<()> {
        let vertices = layout_text(&self.atlas, lines, renderer.extent());
        self.vertex_buffer
            .upload(&vertices, 0)
            .context(UploadVertices)?;
        self.vertex_count = vertices.len() as u32;

        let image_count = renderer.framebuffers().len();
        if self.command_buffers.len() != image_count {
            self.command_pool
                .free_command_buffers(&self.command_buffers);
            self.command_buffers = self
                .command_pool
                .allocate_command_buffers(image_count as _, vk::CommandBufferLevel::PRIMARY)
                .context(AllocateCommandBuffers)?;
        }

        for (command_buffer, framebuffer) in
            self.command_buffers.iter().zip(renderer.framebuffers())
        {
            self.record(renderer, *command_buffer, framebuffer.framebuffer())?;
        }
        Ok(())
    }

    fn record(
        &self,
        renderer: &Renderer,
        command_buffer: vk::CommandBuffer,
        framebuffer: vk::Framebuffer,
    ) -> Result<()> {
        let device = self.context.logical_device().logical_device();

        let begin_info = vk::CommandBufferBeginInfo::builder();
        unsafe { device.begin_command_buffer(command_buffer, &begin_info) }
            .context(RecordCommandBuffer)?;

        let render_pass_begin_info = vk::RenderPassBeginInfo::builder()
            .render_pass(self.render_pass.render_pass())
            .framebuffer(framebuffer)
            .render_area(renderer.scissor());

        self.context
            .begin_region(command_buffer, "Text overlay", [1.0, 1.0, 1.0, 1.0]);
        unsafe {
            device.cmd_begin_render_pass(
                command_buffer,
                &render_pass_begin_info,
                vk::SubpassContents::INLINE,
            );
        }
        renderer.update_viewport(command_buffer);

        if self.vertex_count > 0 {
            self.pipeline.bind(device, command_buffer);
            unsafe {
                device.cmd_bind_descriptor_sets(
                    command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    self.pipeline_layout.layout(),
                    0,
                    &[self.descriptor_set],
                    &[],
                );
                device.cmd_bind_vertex_buffers(
                    command_buffer,
                    0,
                    &[self.vertex_buffer.buffer()],
                    &[0],
                );
                device.cmd_draw(command_buffer, self.vertex_count, 1, 0, 0);
            }
        }

        unsafe { device.cmd_end_render_pass(command_buffer) };
        self.context.end_region(command_buffer);

        unsafe { device.end_command_buffer(command_buffer) }.context(RecordCommandBuffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::path::PathBuf;

    fn atlas() -> FontAtlas {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts/DejaVuSansMono.ttf");
        FontAtlas::from_file(path, FONT_SIZE).unwrap()
    }

    fn line(text: &str, x: f32, y: f32, align: TextAlign) -> OverlayLine {
        OverlayLine {
            text: text.to_string(),
            x,
            y,
            align,
        }
    }

    const EXTENT: vk::Extent2D = vk::Extent2D {
        width: 1280,
        height: 720,
    };

    #[test]
    fn atlas_holds_printable_ascii_inside_its_bounds() {
        let atlas = atlas();
        let extent = atlas.extent();
        assert_eq!(extent.width, ATLAS_WIDTH as u32);
        assert!(extent.height.is_power_of_two());
        assert_eq!(
            atlas.pixels().len(),
            (extent.width * extent.height) as usize
        );

        for character in FIRST_CHARACTER..=LAST_CHARACTER {
            let glyph = atlas.glyph(character).unwrap();
            assert!(glyph.uv_min[0] <= glyph.uv_max[0] && glyph.uv_max[0] <= 1.0);
            assert!(glyph.uv_min[1] <= glyph.uv_max[1] && glyph.uv_max[1] <= 1.0);
            assert!(glyph.advance > 0.0);
        }
        assert!(atlas.pixels().iter().any(|pixel| *pixel > 0));
    }

    #[test]
    fn unknown_characters_fall_back_to_a_question_mark() {
        let atlas = atlas();
        assert_eq!(atlas.glyph('é'), atlas.glyph('?'));
    }

    #[test]
    fn each_visible_glyph_becomes_two_triangles() {
        let atlas = atlas();
        let vertices = layout_text(&atlas, &[line("A B", 5.0, 5.0, TextAlign::Left)], EXTENT);
        assert_eq!(vertices.len(), 2 * VERTICES_PER_GLYPH);
    }

    #[test]
    fn text_is_placed_below_its_top_left_pixel_position() {
        let atlas = atlas();
        let vertices = layout_text(&atlas, &[line("H", 5.0, 85.0, TextAlign::Left)], EXTENT);
        let glyph = atlas.glyph('H').unwrap();

        let top_left = vertices[0].position;
        let expected_left = (5.0 + glyph.bearing[0]) / 1280.0 * 2.0 - 1.0;
        assert_relative_eq!(top_left[0], expected_left, epsilon = 1e-5);
        assert!(top_left[1] >= 85.0 / 720.0 * 2.0 - 1.0);
        assert!(top_left[1] < (85.0 + FONT_SIZE) / 720.0 * 2.0 - 1.0);
        assert_eq!(vertices[0].uv, glyph.uv_min);
        assert_eq!(vertices[5].uv, glyph.uv_max);
    }

    #[test]
    fn alignment_moves_the_text_relative_to_x() {
        let atlas = atlas();
        let width = atlas.text_width("fps");
        let left_edge = |align| {
            layout_text(&atlas, &[line("fps", 640.0, 10.0, align)], EXTENT)[0].position[0]
        };

        let left = left_edge(TextAlign::Left);
        let center = left_edge(TextAlign::Center);
        let right = left_edge(TextAlign::Right);
        let pixels = 2.0 / 1280.0;
        assert_relative_eq!(left - center, width / 2.0 * pixels, epsilon = 1e-4);
        assert_relative_eq!(left - right, width * pixels, epsilon = 1e-4);
    }

    #[test]
    fn layout_stops_at_the_character_limit() {
        let atlas = atlas();
        let text = "x".repeat(MAX_CHARACTERS + 10);
        let vertices = layout_text(&atlas, &[line(&text, 0.0, 0.0, TextAlign::Left)], EXTENT);
        assert_eq!(vertices.len(), MAX_CHARACTERS * VERTICES_PER_GLYPH);
    }

    #[test]
    fn missing_font_files_are_reported() {
        assert!(matches!(
            FontAtlas::from_file("fonts/missing.ttf", FONT_SIZE),
            Err(Error::ReadFont { .. })
        ));
    }
}
