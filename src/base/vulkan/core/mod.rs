pub use self::{
    context::VulkanContext,
    debug_layer::DebugLayer,
    depth_stencil::DepthStencil,
    descriptor::{DescriptorPool, DescriptorSetLayout},
    framebuffer::Framebuffer,
    image::Image,
    image_view::ImageView,
    instance::Instance,
    logical_device::LogicalDevice,
    physical_device::{find_memory_type, select_depth_format, PhysicalDevice, DEPTH_FORMAT_CANDIDATES},
    pipeline_cache::PipelineCache,
    renderpass::RenderPass,
    sampler::Sampler,
    surface::{surface_extension_names, Surface},
    swapchain::{
        choose_extent, choose_image_count, choose_present_mode, choose_surface_format, Swapchain,
        SwapchainProperties,
    },
    sync::{fence::Fence, semaphore::Semaphore},
};

pub mod context;
pub mod debug_layer;
pub mod depth_stencil;
pub mod descriptor;
pub mod framebuffer;
pub mod image;
pub mod image_view;
pub mod instance;
pub mod logical_device;
pub mod physical_device;
pub mod pipeline_cache;
pub mod renderpass;
pub mod sampler;
pub mod surface;
pub mod swapchain;
pub mod sync;
