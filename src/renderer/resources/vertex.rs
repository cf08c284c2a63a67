use ash::vk;
use std::mem::offset_of;
use crate::renderer::config::GeometryVariant;
use crate::renderer::shader_data::{ColorOnlyVertex, ColorVertex, PackedColorVertex, PositionVertex};

pub const POSITION_LOCATION: u32 = 0;
pub const COLOR_LOCATION: u32 = 1;

/// Vertex buffer bindings and attributes handed to the pipeline
#[derive(Debug, Clone, Default)]
pub struct VertexInputDescription {
    pub bindings: Vec<vk::VertexInputBindingDescription>,
    pub attributes: Vec<vk::VertexInputAttributeDescription>,
    pub flags: vk::PipelineVertexInputStateCreateFlags,
}

impl VertexInputDescription {
    pub fn for_variant(variant: GeometryVariant) -> Self {
        match variant {
            GeometryVariant::Interleaved => Self::interleaved_color(),
            GeometryVariant::PackedColor => Self::packed_color(),
            GeometryVariant::Split
            | GeometryVariant::Pyramid
            | GeometryVariant::Combined => Self::split_color(),
        }
    }

    /// One binding holding position and a float4 color
    pub fn interleaved_color() -> Self {
        Self {
            bindings: vec![per_vertex_binding(0, size_of::<ColorVertex>())],
            attributes: vec![
                attribute(
                    POSITION_LOCATION,
                    0,
                    vk::Format::R32G32B32_SFLOAT,
                    offset_of!(ColorVertex, position),
                ),
                attribute(
                    COLOR_LOCATION,
                    0,
                    vk::Format::R32G32B32A32_SFLOAT,
                    offset_of!(ColorVertex, color),
                ),
            ],
            flags: vk::PipelineVertexInputStateCreateFlags::empty(),
        }
    }

    /// One binding holding position and a packed ARGB color
    pub fn packed_color() -> Self {
        Self {
            bindings: vec![per_vertex_binding(0, size_of::<PackedColorVertex>())],
            attributes: vec![
                attribute(
                    POSITION_LOCATION,
                    0,
                    vk::Format::R32G32B32_SFLOAT,
                    offset_of!(PackedColorVertex, position),
                ),
                // Little-endian ARGB is B,G,R,A in memory
                attribute(
                    COLOR_LOCATION,
                    0,
                    vk::Format::B8G8R8A8_UNORM,
                    offset_of!(PackedColorVertex, color),
                ),
            ],
            flags: vk::PipelineVertexInputStateCreateFlags::empty(),
        }
    }

    /// Position in binding 0, color in binding 1
    pub fn split_color() -> Self {
        Self {
            bindings: vec![
                per_vertex_binding(0, size_of::<PositionVertex>()),
                per_vertex_binding(1, size_of::<ColorOnlyVertex>()),
            ],
            attributes: vec![
                attribute(
                    POSITION_LOCATION,
                    0,
                    vk::Format::R32G32B32_SFLOAT,
                    offset_of!(PositionVertex, position),
                ),
                attribute(
                    COLOR_LOCATION,
                    1,
                    vk::Format::R32G32B32A32_SFLOAT,
                    offset_of!(ColorOnlyVertex, color),
                ),
            ],
            flags: vk::PipelineVertexInputStateCreateFlags::empty(),
        }
    }
}

fn per_vertex_binding(binding: u32, stride: usize) -> vk::VertexInputBindingDescription {
    vk::VertexInputBindingDescription::default()
        .binding(binding)
        .stride(stride as u32)
        .input_rate(vk::VertexInputRate::VERTEX)
}

fn attribute(
    location: u32,
    binding: u32,
    format: vk::Format,
    offset: usize,
) -> vk::VertexInputAttributeDescription {
    vk::VertexInputAttributeDescription::default()
        .location(location)
        .binding(binding)
        .format(format)
        .offset(offset as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::resources::geometry::build_geometry;

    #[test]
    fn interleaved_layout() {
        let desc = VertexInputDescription::interleaved_color();
        assert_eq!(desc.bindings.len(), 1);
        assert_eq!(desc.bindings[0].stride, 28);
        assert_eq!(desc.attributes[0].offset, 0);
        assert_eq!(desc.attributes[1].offset, 12);
        assert_eq!(desc.attributes[1].format, vk::Format::R32G32B32A32_SFLOAT);
    }

    #[test]
    fn packed_layout_reads_bgra() {
        let desc = VertexInputDescription::packed_color();
        assert_eq!(desc.bindings[0].stride, 16);
        assert_eq!(desc.attributes[1].format, vk::Format::B8G8R8A8_UNORM);
        assert_eq!(desc.attributes[1].offset, 12);
    }

    #[test]
    fn split_layout_uses_two_bindings() {
        let desc = VertexInputDescription::split_color();
        let strides: Vec<u32> = desc.bindings.iter().map(|b| b.stride).collect();
        assert_eq!(strides, [12, 16]);
        assert_eq!(desc.attributes[0].binding, 0);
        assert_eq!(desc.attributes[1].binding, 1);
        assert_eq!(desc.attributes[1].offset, 0);
    }

    #[test]
    fn layouts_match_geometry_streams() {
        let variants = [
            GeometryVariant::Interleaved,
            GeometryVariant::Split,
            GeometryVariant::Pyramid,
            GeometryVariant::Combined,
            GeometryVariant::PackedColor,
        ];
        for variant in variants {
            let desc = VertexInputDescription::for_variant(variant);
            let geo = build_geometry(variant);
            assert_eq!(desc.bindings.len(), geo.streams.len(), "{variant:?}");
            for (binding, stream) in desc.bindings.iter().zip(&geo.streams) {
                assert_eq!(binding.stride, stream.stride, "{variant:?}");
            }
        }
    }
}
