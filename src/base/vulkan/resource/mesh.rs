use crate::vulkan::{resource::buffer, Buffer, CommandPool, VulkanContext};
use ash::{version::DeviceV1_0, vk};
use log::info;
use nalgebra_glm as glm;
use snafu::{ensure, ResultExt, Snafu};
use std::{mem, path::Path, sync::Arc};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to load mesh '{}': {}", path, source))]
    LoadObj {
        path: String,
        source: tobj::LoadError,
    },

    #[snafu(display("Mesh '{}' contains no geometry", path))]
    EmptyMesh { path: String },

    #[snafu(display("Failed to create mesh buffer: {}", source))]
    CreateMeshBuffer { source: buffer::Error },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VertexComponent {
    Position,
    Normal,
    Color,
    Uv,
    Tangent,
    Bitangent,
    DummyFloat,
    DummyVec4,
}

impl VertexComponent {
    pub fn float_count(self) -> usize {
        match self {
            VertexComponent::Uv => 2,
            VertexComponent::DummyFloat => 1,
            VertexComponent::DummyVec4 => 4,
            _ => 3,
        }
    }

    /// Size in bytes
    pub fn size(self) -> u32 {
        (self.float_count() * mem::size_of::<f32>()) as u32
    }

    pub fn format(self) -> vk::Format {
        match self.float_count() {
            1 => vk::Format::R32_SFLOAT,
            2 => vk::Format::R32G32_SFLOAT,
            4 => vk::Format::R32G32B32A32_SFLOAT,
            _ => vk::Format::R32G32B32_SFLOAT,
        }
    }
}

pub fn vertex_stride(layout: &[VertexComponent]) -> u32 {
    layout.iter().map(|component| component.size()).sum()
}

/// One attribute per component, locations in layout order.
pub fn vertex_attributes(
    binding: u32,
    layout: &[VertexComponent],
) -> Vec<vk::VertexInputAttributeDescription> {
    let mut offset = 0;
    layout
        .iter()
        .enumerate()
        .map(|(location, component)| {
            let description = vk::VertexInputAttributeDescription::builder()
                .binding(binding)
                .location(location as u32)
                .format(component.format())
                .offset(offset)
                .build();
            offset += component.size();
            description
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct MeshCreateInfo {
    pub center: glm::Vec3,
    pub scale: glm::Vec3,
    pub uv_scale: glm::Vec2,
}

impl Default for MeshCreateInfo {
    fn default() -> Self {
        Self {
            center: glm::vec3(0.0, 0.0, 0.0),
            scale: glm::vec3(1.0, 1.0, 1.0),
            uv_scale: glm::vec2(1.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshPart {
    pub name: String,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshDimensions {
    pub min: glm::Vec3,
    pub max: glm::Vec3,
}

impl MeshDimensions {
    pub fn size(&self) -> glm::Vec3 {
        self.max - self.min
    }
}

/// Geometry of one object as read from a model file.
#[derive(Debug, Default, Clone)]
pub struct SourceGeometry<'a> {
    pub name: &'a str,
    pub positions: &'a [f32],
    pub normals: &'a [f32],
    pub texcoords: &'a [f32],
    pub indices: &'a [u32],
    pub color: [f32; 3],
}

/// Interleaved vertices and indices of all parts of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub parts: Vec<MeshPart>,
    pub dimensions: MeshDimensions,
}

impl MeshData {
    pub fn new(
        sources: &[SourceGeometry],
        layout: &[VertexComponent],
        create_info: &MeshCreateInfo,
    ) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        let mut parts = Vec::with_capacity(sources.len());
        let mut min = glm::vec3(std::f32::MAX, std::f32::MAX, std::f32::MAX);
        let mut max = glm::vec3(std::f32::MIN, std::f32::MIN, std::f32::MIN);
        let mut vertex_base = 0u32;

        for source in sources {
            let vertex_count = source.positions.len() / 3;
            for index in 0..vertex_count {
                let position = glm::vec3(
                    source.positions[3 * index],
                    source.positions[3 * index + 1],
                    source.positions[3 * index + 2],
                )
                .component_mul(&create_info.scale)
                    + create_info.center;
                min = glm::min2(&min, &position);
                max = glm::max2(&max, &position);

                for component in layout {
                    match component {
                        VertexComponent::Position => {
                            vertices.extend_from_slice(&[position.x, position.y, position.z])
                        }
                        VertexComponent::Normal => {
                            vertices.extend_from_slice(&attribute::<3>(source.normals, index))
                        }
                        VertexComponent::Uv => {
                            let uv = attribute::<2>(source.texcoords, index);
                            vertices.extend_from_slice(&[
                                uv[0] * create_info.uv_scale.x,
                                uv[1] * create_info.uv_scale.y,
                            ]);
                        }
                        VertexComponent::Color => vertices.extend_from_slice(&source.color),
                        other => vertices
                            .extend(std::iter::repeat(0.0).take(other.float_count())),
                    }
                }
            }

            parts.push(MeshPart {
                name: source.name.to_string(),
                index_start: indices.len() as u32,
                index_count: source.indices.len() as u32,
            });
            indices.extend(source.indices.iter().map(|index| index + vertex_base));
            vertex_base += vertex_count as u32;
        }

        if vertex_base == 0 {
            min = glm::vec3(0.0, 0.0, 0.0);
            max = min;
        }

        Self {
            vertices,
            indices,
            parts,
            dimensions: MeshDimensions { min, max },
        }
    }
}

// Missing attributes are zero filled
fn attribute<const N: usize>(values: &[f32], index: usize) -> [f32; N] {
    let mut attribute = [0.0; N];
    if let Some(slice) = values.get(N * index..N * index + N) {
        attribute.copy_from_slice(slice);
    }
    attribute
}

/// Gives unnamed parts the name at their position in `names`.
pub fn name_unnamed_parts(parts: &mut [MeshPart], names: &[&str]) {
    parts
        .iter_mut()
        .zip(names.iter())
        .filter(|(part, _)| part.name.is_empty())
        .for_each(|(part, name)| part.name = name.to_string());
}

pub fn part_marker_name(part: &MeshPart) -> String {
    format!("Draw \"{}\"", part.name)
}

pub struct MeshBuffer {
    vertices: Buffer,
    indices: Buffer,
    pub parts: Vec<MeshPart>,
    pub dimensions: MeshDimensions,
}

impl MeshBuffer {
    pub fn new(
        context: Arc<VulkanContext>,
        command_pool: &CommandPool,
        data: &MeshData,
    ) -> Result<Self> {
        let vertices = Buffer::device_local_with_data(
            context.clone(),
            command_pool,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            &data.vertices,
        )
        .context(CreateMeshBuffer)?;

        let indices = Buffer::device_local_with_data(
            context,
            command_pool,
            vk::BufferUsageFlags::INDEX_BUFFER,
            &data.indices,
        )
        .context(CreateMeshBuffer)?;

        Ok(Self {
            vertices,
            indices,
            parts: data.parts.clone(),
            dimensions: data.dimensions,
        })
    }

    pub fn vertex_buffer(&self) -> vk::Buffer {
        self.vertices.buffer()
    }

    pub fn index_buffer(&self) -> vk::Buffer {
        self.indices.buffer()
    }

    pub fn bind(&self, device: &ash::Device, command_buffer: vk::CommandBuffer, binding: u32) {
        unsafe {
            device.cmd_bind_vertex_buffers(command_buffer, binding, &[self.vertex_buffer()], &[0]);
            device.cmd_bind_index_buffer(
                command_buffer,
                self.index_buffer(),
                0,
                vk::IndexType::UINT32,
            );
        }
    }

    /// Draws part by part, inserting a debug marker named after each part.
    pub fn draw_parts(
        &self,
        context: &VulkanContext,
        command_buffer: vk::CommandBuffer,
        binding: u32,
    ) {
        let device = context.logical_device().logical_device();
        self.bind(device, command_buffer, binding);
        for part in self.parts.iter() {
            context.insert_marker(command_buffer, &part_marker_name(part), [0.0; 4]);
            unsafe {
                device.cmd_draw_indexed(
                    command_buffer,
                    part.index_count,
                    1,
                    part.index_start,
                    0,
                    0,
                );
            }
        }
    }
}

/// Loads a triangulated OBJ file into device local vertex and index buffers.
pub fn load_mesh(
    context: Arc<VulkanContext>,
    command_pool: &CommandPool,
    path: impl AsRef<Path>,
    layout: &[VertexComponent],
    create_info: &MeshCreateInfo,
) -> Result<MeshBuffer> {
    let path = path.as_ref();
    let path_name = path.display().to_string();
    let (models, materials) = tobj::load_obj(path, true).context(LoadObj {
        path: path_name.clone(),
    })?;

    let sources = models
        .iter()
        .map(|model| SourceGeometry {
            name: &model.name,
            positions: &model.mesh.positions,
            normals: &model.mesh.normals,
            texcoords: &model.mesh.texcoords,
            indices: &model.mesh.indices,
            color: model
                .mesh
                .material_id
                .and_then(|id| materials.get(id))
                .map(|material| material.diffuse)
                .unwrap_or([1.0, 1.0, 1.0]),
        })
        .collect::<Vec<_>>();

    let data = MeshData::new(&sources, layout, create_info);
    ensure!(!data.indices.is_empty(), EmptyMesh { path: path_name });

    info!(
        "Loaded mesh '{}': {} parts, {} vertices, {} indices",
        path.display(),
        data.parts.len(),
        data.vertices.len() / (vertex_stride(layout) as usize / mem::size_of::<f32>()).max(1),
        data.indices.len()
    );

    MeshBuffer::new(context, command_pool, &data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: [VertexComponent; 4] = [
        VertexComponent::Position,
        VertexComponent::Normal,
        VertexComponent::Uv,
        VertexComponent::Color,
    ];

    #[test]
    fn stride_and_attribute_offsets_follow_the_layout() {
        assert_eq!(vertex_stride(&LAYOUT), 44);

        let attributes = vertex_attributes(0, &LAYOUT);
        let offsets = attributes.iter().map(|a| a.offset).collect::<Vec<_>>();
        assert_eq!(offsets, [0, 12, 24, 32]);
        assert_eq!(attributes[2].format, vk::Format::R32G32_SFLOAT);
        assert_eq!(attributes[3].location, 3);
        assert_eq!(
            vertex_stride(&[VertexComponent::DummyFloat, VertexComponent::DummyVec4]),
            20
        );
    }

    #[test]
    fn parts_are_concatenated_with_rebased_indices() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let sources = [
            SourceGeometry {
                name: "hill",
                positions: &positions,
                indices: &[0, 1, 2],
                color: [0.5, 0.5, 0.5],
                ..Default::default()
            },
            SourceGeometry {
                name: "rocks",
                positions: &positions,
                indices: &[2, 1, 0],
                color: [1.0, 0.0, 0.0],
                ..Default::default()
            },
        ];

        let data = MeshData::new(&sources, &LAYOUT, &MeshCreateInfo::default());
        assert_eq!(data.indices, [0, 1, 2, 5, 4, 3]);
        assert_eq!(
            data.parts[1],
            MeshPart {
                name: "rocks".to_string(),
                index_start: 3,
                index_count: 3,
            }
        );
        assert_eq!(data.vertices.len(), 6 * 11);
    }

    #[test]
    fn missing_attributes_are_zero_and_color_comes_from_material() {
        let sources = [SourceGeometry {
            positions: &[1.0, 2.0, 3.0],
            texcoords: &[0.25, 0.5],
            indices: &[0],
            color: [0.1, 0.2, 0.3],
            ..Default::default()
        }];
        let create_info = MeshCreateInfo {
            center: glm::vec3(1.0, 0.0, 0.0),
            scale: glm::vec3(2.0, 2.0, 2.0),
            uv_scale: glm::vec2(2.0, 1.0),
        };

        let data = MeshData::new(&sources, &LAYOUT, &create_info);
        assert_eq!(
            data.vertices,
            [3.0, 4.0, 6.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.1, 0.2, 0.3]
        );
        assert_eq!(data.dimensions.min, glm::vec3(3.0, 4.0, 6.0));
        assert_eq!(data.dimensions.size(), glm::vec3(0.0, 0.0, 0.0));
    }

    #[test]
    fn unnamed_parts_take_fallback_names() {
        let mut parts = vec![
            MeshPart {
                name: String::new(),
                index_start: 0,
                index_count: 3,
            },
            MeshPart {
                name: "rocks".to_string(),
                index_start: 3,
                index_count: 3,
            },
            MeshPart {
                name: String::new(),
                index_start: 6,
                index_count: 3,
            },
        ];
        name_unnamed_parts(&mut parts, &["hill", "ignored"]);
        assert_eq!(parts[0].name, "hill");
        assert_eq!(parts[1].name, "rocks");
        assert_eq!(parts[2].name, "");
        assert_eq!(part_marker_name(&parts[0]), "Draw \"hill\"");
    }
}
