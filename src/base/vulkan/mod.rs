pub use self::{
    core::*,
    debug_marker::DebugMarker,
    pipeline::{
        additive_blend_attachment, alpha_blend_attachment, opaque_blend_attachment,
        GraphicsPipeline, GraphicsPipelineSettings, GraphicsPipelineSettingsBuilder,
        PipelineLayout,
    },
    renderer::{ClearOnly, Command, Renderer},
    resource::*,
    text_overlay::{FontAtlas, Glyph, OverlayVertex, TextOverlayRenderer},
};

pub mod core;
pub mod debug_marker;
pub mod pipeline;
pub mod renderer;
pub mod resource;
pub mod text_overlay;

/// # Safety
///
/// This method will convert any slice to a byte slice.
/// Use with slices of number primitives.
pub unsafe fn byte_slice_from<T: Sized>(data: &[T]) -> &[u8] {
    let data_ptr = data.as_ptr() as *const u8;
    std::slice::from_raw_parts(data_ptr, std::mem::size_of::<T>() * data.len())
}
