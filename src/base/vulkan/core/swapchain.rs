use crate::vulkan::{core::image_view, ImageView, VulkanContext};
use ash::{extensions::khr, prelude::VkResult, vk};
use log::info;
use snafu::{ResultExt, Snafu};
use std::sync::Arc;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to query surface properties: {}", source))]
    QuerySurface { source: ash::vk::Result },

    #[snafu(display("Failed to create swapchain: {}", source))]
    CreateSwapchain { source: ash::vk::Result },

    #[snafu(display("Failed to get swapchain images: {}", source))]
    GetSwapchainImages { source: ash::vk::Result },

    #[snafu(display("Failed to create swapchain image view: {}", source))]
    CreateSwapchainImageView { source: image_view::Error },
}

#[derive(Debug, Clone, Copy)]
pub struct SwapchainProperties {
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
}

impl SwapchainProperties {
    pub fn aspect_ratio(&self) -> f32 {
        let height = if self.extent.height == 0 {
            1
        } else {
            self.extent.height
        };
        self.extent.width as f32 / height as f32
    }
}

pub struct Swapchain {
    swapchain: khr::Swapchain,
    swapchain_khr: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<ImageView>,
    properties: SwapchainProperties,
    _context: Arc<VulkanContext>,
}

impl Swapchain {
    pub fn new(
        context: Arc<VulkanContext>,
        dimensions: [u32; 2],
        vsync: bool,
        old_swapchain: Option<&Swapchain>,
    ) -> Result<Self> {
        let physical_device = context.physical_device().physical_device();
        let surface = context.surface();

        let capabilities = surface
            .capabilities(physical_device)
            .context(QuerySurface)?;
        let formats = surface.formats(physical_device).context(QuerySurface)?;
        let present_modes = surface
            .present_modes(physical_device)
            .context(QuerySurface)?;

        let properties = SwapchainProperties {
            surface_format: choose_surface_format(&formats),
            present_mode: choose_present_mode(&present_modes, vsync),
            extent: choose_extent(&capabilities, dimensions),
        };

        let pre_transform = if capabilities
            .supported_transforms
            .contains(vk::SurfaceTransformFlagsKHR::IDENTITY)
        {
            vk::SurfaceTransformFlagsKHR::IDENTITY
        } else {
            capabilities.current_transform
        };

        let composite_alpha = [
            vk::CompositeAlphaFlagsKHR::OPAQUE,
            vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED,
            vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED,
            vk::CompositeAlphaFlagsKHR::INHERIT,
        ]
        .iter()
        .copied()
        .find(|flag| capabilities.supported_composite_alpha.contains(*flag))
        .unwrap_or(vk::CompositeAlphaFlagsKHR::OPAQUE);

        let mut image_usage = vk::ImageUsageFlags::COLOR_ATTACHMENT;
        if capabilities
            .supported_usage_flags
            .contains(vk::ImageUsageFlags::TRANSFER_SRC)
        {
            image_usage |= vk::ImageUsageFlags::TRANSFER_SRC;
        }

        let swapchain_create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.surface_khr())
            .min_image_count(choose_image_count(&capabilities))
            .image_format(properties.surface_format.format)
            .image_color_space(properties.surface_format.color_space)
            .image_extent(properties.extent)
            .image_array_layers(1)
            .image_usage(image_usage)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(pre_transform)
            .composite_alpha(composite_alpha)
            .present_mode(properties.present_mode)
            .clipped(true)
            .old_swapchain(
                old_swapchain
                    .map(|swapchain| swapchain.swapchain_khr)
                    .unwrap_or_else(vk::SwapchainKHR::null),
            );

        let swapchain = khr::Swapchain::new(
            context.instance().instance(),
            context.logical_device().logical_device(),
        );
        let swapchain_khr = unsafe { swapchain.create_swapchain(&swapchain_create_info, None) }
            .context(CreateSwapchain)?;

        let images =
            unsafe { swapchain.get_swapchain_images(swapchain_khr) }.context(GetSwapchainImages)?;

        let image_views = images
            .iter()
            .map(|image| {
                let create_info = vk::ImageViewCreateInfo::builder()
                    .image(*image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(properties.surface_format.format)
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
                ImageView::new(context.clone(), &create_info)
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .context(CreateSwapchainImageView)?;

        info!(
            "Created swapchain: {} images, {}x{}, {:?}",
            images.len(),
            properties.extent.width,
            properties.extent.height,
            properties.present_mode
        );

        Ok(Self {
            swapchain,
            swapchain_khr,
            images,
            image_views,
            properties,
            _context: context,
        })
    }

    pub fn swapchain_khr(&self) -> vk::SwapchainKHR {
        self.swapchain_khr
    }

    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    pub fn image_views(&self) -> &[ImageView] {
        &self.image_views
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn properties(&self) -> &SwapchainProperties {
        &self.properties
    }

    /// Returns the image index and whether the swapchain is suboptimal.
    pub fn acquire_next_image(&self, semaphore: vk::Semaphore) -> VkResult<(u32, bool)> {
        unsafe {
            self.swapchain.acquire_next_image(
                self.swapchain_khr,
                std::u64::MAX,
                semaphore,
                vk::Fence::null(),
            )
        }
    }

    /// Returns whether the swapchain is suboptimal.
    pub fn queue_present(
        &self,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> VkResult<bool> {
        let wait_semaphores = [wait_semaphore];
        let swapchains = [self.swapchain_khr];
        let image_indices = [image_index];
        let mut present_info = vk::PresentInfoKHR::builder()
            .swapchains(&swapchains)
            .image_indices(&image_indices);
        if wait_semaphore != vk::Semaphore::null() {
            present_info = present_info.wait_semaphores(&wait_semaphores);
        }
        unsafe { self.swapchain.queue_present(queue, &present_info) }
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.image_views.clear();
        unsafe {
            self.swapchain.destroy_swapchain(self.swapchain_khr, None);
        }
    }
}

pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    let preferred = vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_UNORM,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    };

    match formats {
        [] => preferred,
        [only] if only.format == vk::Format::UNDEFINED => vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_UNORM,
            color_space: only.color_space,
        },
        _ => formats
            .iter()
            .find(|format| format.format == preferred.format)
            .copied()
            .unwrap_or(formats[0]),
    }
}

pub fn choose_present_mode(
    present_modes: &[vk::PresentModeKHR],
    vsync: bool,
) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }
    [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE]
        .iter()
        .copied()
        .find(|mode| present_modes.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    dimensions: [u32; 2],
) -> vk::Extent2D {
    if capabilities.current_extent.width != std::u32::MAX {
        return capabilities.current_extent;
    }

    let min = capabilities.min_image_extent;
    let max = capabilities.max_image_extent;
    vk::Extent2D {
        width: dimensions[0].max(min.width).min(max.width),
        height: dimensions[1].max(min.height).min(max.height),
    }
}

pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 && image_count > capabilities.max_image_count {
        capabilities.max_image_count
    } else {
        image_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_format(format: vk::Format) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    #[test]
    fn undefined_surface_format_means_any() {
        let chosen = choose_surface_format(&[surface_format(vk::Format::UNDEFINED)]);
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_UNORM);
    }

    #[test]
    fn bgra_unorm_is_preferred_over_the_first_format() {
        let formats = [
            surface_format(vk::Format::R8G8B8A8_SRGB),
            surface_format(vk::Format::B8G8R8A8_UNORM),
        ];
        assert_eq!(choose_surface_format(&formats).format, vk::Format::B8G8R8A8_UNORM);

        let formats = [
            surface_format(vk::Format::R8G8B8A8_SRGB),
            surface_format(vk::Format::B8G8R8A8_SRGB),
        ];
        assert_eq!(choose_surface_format(&formats).format, vk::Format::R8G8B8A8_SRGB);
    }

    #[test]
    fn present_mode_prefers_mailbox_then_immediate() {
        let all = [
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::IMMEDIATE,
            vk::PresentModeKHR::MAILBOX,
        ];
        assert_eq!(choose_present_mode(&all, false), vk::PresentModeKHR::MAILBOX);
        assert_eq!(choose_present_mode(&all, true), vk::PresentModeKHR::FIFO);
        assert_eq!(
            choose_present_mode(&[vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE], false),
            vk::PresentModeKHR::IMMEDIATE
        );
        assert_eq!(
            choose_present_mode(&[vk::PresentModeKHR::FIFO], false),
            vk::PresentModeKHR::FIFO
        );
    }

    #[test]
    fn extent_is_clamped_only_when_surface_leaves_it_open() {
        let mut capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 800,
                height: 600,
            },
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            ..Default::default()
        };
        assert_eq!(
            choose_extent(&capabilities, [1280, 720]),
            vk::Extent2D {
                width: 800,
                height: 600
            }
        );

        capabilities.current_extent.width = std::u32::MAX;
        assert_eq!(
            choose_extent(&capabilities, [4000, 720]),
            vk::Extent2D {
                width: 1920,
                height: 720
            }
        );
    }

    #[test]
    fn image_count_is_one_above_minimum_within_maximum() {
        let mut capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&capabilities), 3);
        capabilities.max_image_count = 2;
        assert_eq!(choose_image_count(&capabilities), 2);
    }

    #[test]
    fn aspect_ratio_guards_against_zero_height() {
        let mut properties = SwapchainProperties {
            surface_format: surface_format(vk::Format::B8G8R8A8_UNORM),
            present_mode: vk::PresentModeKHR::FIFO,
            extent: vk::Extent2D {
                width: 1280,
                height: 720,
            },
        };
        assert!((properties.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
        properties.extent.height = 0;
        assert_eq!(properties.aspect_ratio(), 1280.0);
    }
}
