use crate::vulkan::{
    core::{image, image_view, sampler},
    resource::{buffer, command_pool},
    Buffer, CommandPool, Image, ImageView, Sampler, VulkanContext,
};
use ash::{
    version::{DeviceV1_0, InstanceV1_0},
    vk,
};
use snafu::{ensure, ResultExt, Snafu};
use std::sync::Arc;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to create staging buffer for texture: {}", source))]
    CreateStagingBuffer { source: buffer::Error },

    #[snafu(display("Failed to create texture image: {}", source))]
    CreateImage { source: image::Error },

    #[snafu(display("Failed to create texture view: {}", source))]
    CreateView { source: image_view::Error },

    #[snafu(display("Failed to create texture sampler: {}", source))]
    CreateSampler { source: sampler::Error },

    #[snafu(display("Failed to upload texture: {}", source))]
    Upload { source: command_pool::Error },

    #[snafu(display("Format {:?} can not be used as a blit destination", format))]
    BlitUnsupported { format: vk::Format },
}

/// Access masks for a layout transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageLayoutTransition {
    pub old_layout: vk::ImageLayout,
    pub new_layout: vk::ImageLayout,
    pub src_access_mask: vk::AccessFlags,
    pub dst_access_mask: vk::AccessFlags,
}

impl ImageLayoutTransition {
    pub fn between(old_layout: vk::ImageLayout, new_layout: vk::ImageLayout) -> Self {
        let mut src_access_mask = match old_layout {
            vk::ImageLayout::PREINITIALIZED => {
                vk::AccessFlags::HOST_WRITE | vk::AccessFlags::TRANSFER_WRITE
            }
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => {
                vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
            }
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL => vk::AccessFlags::TRANSFER_READ,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL => vk::AccessFlags::TRANSFER_WRITE,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => vk::AccessFlags::SHADER_READ,
            _ => vk::AccessFlags::empty(),
        };

        let dst_access_mask = match new_layout {
            vk::ImageLayout::TRANSFER_DST_OPTIMAL => vk::AccessFlags::TRANSFER_WRITE,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL => vk::AccessFlags::TRANSFER_READ,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => {
                vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
            }
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => {
                if src_access_mask.is_empty() {
                    src_access_mask = vk::AccessFlags::HOST_WRITE | vk::AccessFlags::TRANSFER_WRITE;
                }
                vk::AccessFlags::SHADER_READ
            }
            _ => vk::AccessFlags::empty(),
        };

        Self {
            old_layout,
            new_layout,
            src_access_mask,
            dst_access_mask,
        }
    }
}

/// Records a pipeline barrier moving `image` from `old_layout` to `new_layout`.
pub fn set_image_layout(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    image: vk::Image,
    aspect_mask: vk::ImageAspectFlags,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) {
    let subresource_range = vk::ImageSubresourceRange {
        aspect_mask,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    };
    set_image_layout_range(
        device,
        command_buffer,
        image,
        subresource_range,
        old_layout,
        new_layout,
    );
}

pub fn set_image_layout_range(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    image: vk::Image,
    subresource_range: vk::ImageSubresourceRange,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) {
    let transition = ImageLayoutTransition::between(old_layout, new_layout);
    let barrier = vk::ImageMemoryBarrier::builder()
        .image(image)
        .old_layout(transition.old_layout)
        .new_layout(transition.new_layout)
        .src_access_mask(transition.src_access_mask)
        .dst_access_mask(transition.dst_access_mask)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .subresource_range(subresource_range)
        .build();

    unsafe {
        device.cmd_pipeline_barrier(
            command_buffer,
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier],
        );
    }
}

pub struct Texture {
    sampler: Sampler,
    view: ImageView,
    image: Image,
    layout: vk::ImageLayout,
    width: u32,
    height: u32,
}

impl Texture {
    /// Uploads tightly packed pixels through a staging buffer.
    pub fn from_pixels(
        context: Arc<VulkanContext>,
        command_pool: &CommandPool,
        pixels: &[u8],
        extent: vk::Extent2D,
        format: vk::Format,
        address_mode: vk::SamplerAddressMode,
    ) -> Result<Self> {
        let vk::Extent2D { width, height } = extent;
        let staging_buffer = Buffer::new_host_visible(
            context.clone(),
            vk::BufferUsageFlags::TRANSFER_SRC,
            pixels.len() as vk::DeviceSize,
            Some(pixels),
        )
        .context(CreateStagingBuffer)?;

        let image = Self::create_image(context.clone(), format, width, height)?;

        let device = context.logical_device().logical_device();
        command_pool
            .execute_once(context.graphics_queue(), |command_buffer| {
                set_image_layout(
                    device,
                    command_buffer,
                    image.image(),
                    vk::ImageAspectFlags::COLOR,
                    vk::ImageLayout::UNDEFINED,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                );

                let region = vk::BufferImageCopy::builder()
                    .buffer_offset(0)
                    .image_subresource(vk::ImageSubresourceLayers {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        mip_level: 0,
                        base_array_layer: 0,
                        layer_count: 1,
                    })
                    .image_extent(vk::Extent3D {
                        width,
                        height,
                        depth: 1,
                    })
                    .build();
                unsafe {
                    device.cmd_copy_buffer_to_image(
                        command_buffer,
                        staging_buffer.buffer(),
                        image.image(),
                        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                        &[region],
                    )
                };

                set_image_layout(
                    device,
                    command_buffer,
                    image.image(),
                    vk::ImageAspectFlags::COLOR,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                );
            })
            .context(Upload)?;

        Self::finish(context, image, format, width, height, address_mode)
    }

    /// Creates a sampled texture that is filled by blitting into it.
    pub fn render_target(
        context: Arc<VulkanContext>,
        command_pool: &CommandPool,
        format: vk::Format,
        extent: vk::Extent2D,
    ) -> Result<Self> {
        let format_properties = unsafe {
            context
                .instance()
                .instance()
                .get_physical_device_format_properties(
                    context.physical_device().physical_device(),
                    format,
                )
        };
        ensure!(
            supports_blit_destination(&format_properties),
            BlitUnsupported { format }
        );

        let image = Self::create_image(context.clone(), format, extent.width, extent.height)?;

        let device = context.logical_device().logical_device();
        command_pool
            .execute_once(context.graphics_queue(), |command_buffer| {
                set_image_layout(
                    device,
                    command_buffer,
                    image.image(),
                    vk::ImageAspectFlags::COLOR,
                    vk::ImageLayout::UNDEFINED,
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                );
            })
            .context(Upload)?;

        Self::finish(
            context,
            image,
            format,
            extent.width,
            extent.height,
            vk::SamplerAddressMode::CLAMP_TO_EDGE,
        )
    }

    fn create_image(
        context: Arc<VulkanContext>,
        format: vk::Format,
        width: u32,
        height: u32,
    ) -> Result<Image> {
        let create_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);
        Image::new(context, &create_info, vk::MemoryPropertyFlags::DEVICE_LOCAL)
            .context(CreateImage)
    }

    fn finish(
        context: Arc<VulkanContext>,
        image: Image,
        format: vk::Format,
        width: u32,
        height: u32,
        address_mode: vk::SamplerAddressMode,
    ) -> Result<Self> {
        let view_create_info = vk::ImageViewCreateInfo::builder()
            .image(image.image())
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::R,
                g: vk::ComponentSwizzle::G,
                b: vk::ComponentSwizzle::B,
                a: vk::ComponentSwizzle::A,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        let view = ImageView::new(context.clone(), &view_create_info).context(CreateView)?;

        let sampler_create_info = vk::SamplerCreateInfo::builder()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .address_mode_u(address_mode)
            .address_mode_v(address_mode)
            .address_mode_w(address_mode)
            .mip_lod_bias(0.0)
            .max_anisotropy(1.0)
            .compare_op(vk::CompareOp::NEVER)
            .min_lod(0.0)
            .max_lod(0.0)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_WHITE);
        let sampler = Sampler::new(context, &sampler_create_info).context(CreateSampler)?;

        Ok(Self {
            sampler,
            view,
            image,
            layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            width,
            height,
        })
    }

    pub fn image(&self) -> vk::Image {
        self.image.image()
    }

    pub fn view(&self) -> vk::ImageView {
        self.view.view()
    }

    pub fn sampler(&self) -> vk::Sampler {
        self.sampler.sampler()
    }

    pub fn layout(&self) -> vk::ImageLayout {
        self.layout
    }

    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.width,
            height: self.height,
        }
    }

    pub fn descriptor(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo::builder()
            .sampler(self.sampler())
            .image_view(self.view())
            .image_layout(self.layout)
            .build()
    }
}

/// Blits are only done into optimally tiled images.
pub fn supports_blit_destination(properties: &vk::FormatProperties) -> bool {
    properties
        .optimal_tiling_features
        .contains(vk::FormatFeatureFlags::BLIT_DST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blit_destination_requires_optimal_tiling_support() {
        let linear_only = vk::FormatProperties {
            linear_tiling_features: vk::FormatFeatureFlags::BLIT_DST,
            ..Default::default()
        };
        assert!(!supports_blit_destination(&linear_only));

        let optimal = vk::FormatProperties {
            optimal_tiling_features: vk::FormatFeatureFlags::BLIT_DST
                | vk::FormatFeatureFlags::SAMPLED_IMAGE,
            ..Default::default()
        };
        assert!(supports_blit_destination(&optimal));
    }

    #[test]
    fn upload_transitions_use_transfer_access() {
        let transition = ImageLayoutTransition::between(
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );
        assert!(transition.src_access_mask.is_empty());
        assert_eq!(transition.dst_access_mask, vk::AccessFlags::TRANSFER_WRITE);

        let transition = ImageLayoutTransition::between(
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );
        assert_eq!(transition.src_access_mask, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(transition.dst_access_mask, vk::AccessFlags::SHADER_READ);
    }

    #[test]
    fn shader_read_from_undefined_waits_for_host_and_transfer_writes() {
        let transition = ImageLayoutTransition::between(
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );
        assert_eq!(
            transition.src_access_mask,
            vk::AccessFlags::HOST_WRITE | vk::AccessFlags::TRANSFER_WRITE
        );
    }

    #[test]
    fn blit_source_transition_waits_for_color_writes() {
        let transition = ImageLayoutTransition::between(
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        );
        assert_eq!(
            transition.src_access_mask,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE
        );
        assert_eq!(transition.dst_access_mask, vk::AccessFlags::TRANSFER_READ);
    }
}
