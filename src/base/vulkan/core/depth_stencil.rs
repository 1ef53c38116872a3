use crate::vulkan::{
    core::{image, image_view},
    Image, ImageView, VulkanContext,
};
use ash::vk;
use snafu::{ResultExt, Snafu};
use std::sync::Arc;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to create depth stencil image: {}", source))]
    CreateImage { source: image::Error },

    #[snafu(display("Failed to create depth stencil view: {}", source))]
    CreateView { source: image_view::Error },
}

pub struct DepthStencil {
    view: ImageView,
    image: Image,
    format: vk::Format,
}

impl DepthStencil {
    pub fn new(
        context: Arc<VulkanContext>,
        format: vk::Format,
        extent: vk::Extent2D,
    ) -> Result<Self> {
        let image_create_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);
        let image = Image::new(
            context.clone(),
            &image_create_info,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )
        .context(CreateImage)?;

        let view_create_info = vk::ImageViewCreateInfo::builder()
            .image(image.image())
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect_mask(format),
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        let view = ImageView::new(context, &view_create_info).context(CreateView)?;

        Ok(Self {
            view,
            image,
            format,
        })
    }

    pub fn image(&self) -> vk::Image {
        self.image.image()
    }

    pub fn view(&self) -> vk::ImageView {
        self.view.view()
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }
}

/// Pure depth formats have no stencil aspect
pub fn aspect_mask(format: vk::Format) -> vk::ImageAspectFlags {
    match format {
        vk::Format::D16_UNORM | vk::Format::D32_SFLOAT | vk::Format::X8_D24_UNORM_PACK32 => {
            vk::ImageAspectFlags::DEPTH
        }
        _ => vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stencil_aspect_only_for_stencil_formats() {
        assert_eq!(aspect_mask(vk::Format::D32_SFLOAT), vk::ImageAspectFlags::DEPTH);
        assert_eq!(
            aspect_mask(vk::Format::D24_UNORM_S8_UINT),
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
    }
}
