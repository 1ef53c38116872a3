pub use self::{
    buffer::Buffer,
    command_pool::CommandPool,
    mesh::{
        load_mesh, name_unnamed_parts, part_marker_name, vertex_attributes, vertex_stride,
        MeshBuffer, MeshCreateInfo, MeshData, MeshDimensions, MeshPart, SourceGeometry,
        VertexComponent,
    },
    shader::{shader_entry_point_name, Shader, ShaderCache},
    texture::{set_image_layout, set_image_layout_range, ImageLayoutTransition, Texture},
};

pub mod buffer;
pub mod command_pool;
pub mod mesh;
pub mod shader;
pub mod texture;
