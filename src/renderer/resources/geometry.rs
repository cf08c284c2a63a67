use std::collections::BTreeMap;
use bytemuck::Pod;
use glam::Vec4;
use crate::renderer::config::GeometryVariant;
use crate::renderer::shader_data::{ColorOnlyVertex, ColorVertex, PackedColorVertex, PositionVertex};
use crate::renderer::util::pack_argb;

/// Named colors used by the sample meshes, linear RGBA
pub mod colors {
    use glam::Vec4;

    pub const BLACK: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);
    pub const RED: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Vec4 = Vec4::new(0.0, 0.501_960_8, 0.0, 1.0);
    pub const BLUE: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);
    pub const YELLOW: Vec4 = Vec4::new(1.0, 1.0, 0.0, 1.0);
    pub const CYAN: Vec4 = Vec4::new(0.0, 1.0, 1.0, 1.0);
    pub const MAGENTA: Vec4 = Vec4::new(1.0, 0.0, 1.0, 1.0);
    pub const BROWN: Vec4 = Vec4::new(0.647_058_8, 0.164_705_9, 0.164_705_9, 1.0);
    pub const ORANGE: Vec4 = Vec4::new(1.0, 0.647_058_8, 0.0, 1.0);
    pub const PURPLE: Vec4 = Vec4::new(0.501_960_8, 0.0, 0.501_960_8, 1.0);
    pub const LIGHT_STEEL_BLUE: Vec4 = Vec4::new(0.690_196_1, 0.768_627_5, 0.870_588_3, 1.0);
}

const BOX_POSITIONS: [[f32; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, -1.0, 1.0],
];

// Clockwise when seen from outside
const BOX_INDICES: [u16; 36] = [
    // front
    0, 1, 2,
    0, 2, 3,
    // back
    4, 6, 5,
    4, 7, 6,
    // left
    4, 5, 1,
    4, 1, 0,
    // right
    3, 2, 6,
    3, 6, 7,
    // top
    1, 5, 6,
    1, 6, 2,
    // bottom
    4, 0, 3,
    4, 3, 7,
];

const PYRAMID_POSITIONS: [[f32; 3]; 5] = [
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, -1.0, 1.0],
    // apex
    [0.0, 0.0, 3.0],
];

const PYRAMID_INDICES: [u16; 18] = [
    // base
    0, 1, 3,
    3, 1, 2,
    // sides
    4, 1, 0,
    4, 2, 1,
    4, 3, 2,
    4, 0, 3,
];

const INTERLEAVED_BOX_COLORS: [Vec4; 8] = [
    colors::BROWN,
    colors::BLACK,
    colors::RED,
    colors::GREEN,
    colors::BLUE,
    colors::YELLOW,
    colors::CYAN,
    colors::MAGENTA,
];

const SPLIT_BOX_COLORS: [Vec4; 8] = [
    colors::GREEN,
    colors::BLUE,
    colors::RED,
    colors::YELLOW,
    colors::CYAN,
    colors::MAGENTA,
    colors::ORANGE,
    colors::PURPLE,
];

const PYRAMID_COLORS: [Vec4; 5] = [
    colors::GREEN,
    colors::BLUE,
    colors::YELLOW,
    colors::PURPLE,
    colors::RED,
];

/// Sub-range of a shared index buffer that forms one drawable object
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrawRange {
    pub index_count: u32,
    pub first_index: u32,
    /// Added to every index before fetching vertices
    pub vertex_offset: i32,
}

/// Raw bytes for a single vertex buffer binding
#[derive(Debug, Clone)]
pub struct VertexStream {
    pub bytes: Vec<u8>,
    pub stride: u32,
    pub count: u32,
}

impl VertexStream {
    pub fn from_slice<T: Pod>(data: &[T]) -> Self {
        Self {
            bytes: bytemuck::cast_slice(data).to_vec(),
            stride: size_of::<T>() as u32,
            count: data.len() as u32,
        }
    }

    /// Read element `index` back as `T`. `T` must not be larger than the stride.
    #[cfg(test)]
    pub fn read<T: Pod>(&self, index: usize) -> T {
        let start = index * self.stride as usize;
        bytemuck::pod_read_unaligned(&self.bytes[start..start + size_of::<T>()])
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Host-side copy of a mesh before it is uploaded to the GPU
#[derive(Debug, Clone)]
pub struct HostGeometry {
    pub name: String,
    /// One stream when attributes are interleaved, two (position, color) when split
    pub streams: Vec<VertexStream>,
    pub indices: Vec<u16>,
    pub draw_ranges: BTreeMap<String, DrawRange>,
}

impl HostGeometry {
    pub fn vertex_count(&self) -> u32 {
        self.streams.first().map_or(0, |stream| stream.count)
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Position of vertex `index`. Every layout starts its first stream with the position.
    #[cfg(test)]
    pub fn position(&self, index: usize) -> glam::Vec3 {
        let position: [f32; 3] = self.streams[0].read(index);
        glam::Vec3::from(position)
    }

    #[cfg(test)]
    pub fn draw_range(&self, name: &str) -> Option<DrawRange> {
        self.draw_ranges.get(name).copied()
    }
}

/// Build the host geometry for the chosen variant
pub fn build_geometry(variant: GeometryVariant) -> HostGeometry {
    match variant {
        GeometryVariant::Interleaved => build_interleaved_box(),
        GeometryVariant::Split => build_split_box(),
        GeometryVariant::Pyramid => build_pyramid(),
        GeometryVariant::Combined => build_combined(),
        GeometryVariant::PackedColor => build_packed_color_box(),
    }
}

fn whole_range(index_count: usize) -> DrawRange {
    DrawRange {
        index_count: index_count as u32,
        first_index: 0,
        vertex_offset: 0,
    }
}

fn single_range(name: &str, index_count: usize) -> BTreeMap<String, DrawRange> {
    BTreeMap::from([(name.to_string(), whole_range(index_count))])
}

fn position_stream(positions: &[[f32; 3]]) -> VertexStream {
    let vertices: Vec<PositionVertex> = positions
        .iter()
        .map(|&position| PositionVertex { position })
        .collect();
    VertexStream::from_slice(&vertices)
}

fn color_stream(colors: &[Vec4]) -> VertexStream {
    let vertices: Vec<ColorOnlyVertex> = colors
        .iter()
        .map(|color| ColorOnlyVertex { color: color.to_array() })
        .collect();
    VertexStream::from_slice(&vertices)
}

pub fn build_interleaved_box() -> HostGeometry {
    let vertices: Vec<ColorVertex> = BOX_POSITIONS
        .iter()
        .zip(INTERLEAVED_BOX_COLORS.iter())
        .map(|(&position, color)| ColorVertex {
            position,
            color: color.to_array(),
        })
        .collect();

    HostGeometry {
        name: "boxGeo".into(),
        streams: vec![VertexStream::from_slice(&vertices)],
        indices: BOX_INDICES.to_vec(),
        draw_ranges: single_range("box", BOX_INDICES.len()),
    }
}

pub fn build_split_box() -> HostGeometry {
    HostGeometry {
        name: "boxGeo".into(),
        streams: vec![
            position_stream(&BOX_POSITIONS),
            color_stream(&SPLIT_BOX_COLORS),
        ],
        indices: BOX_INDICES.to_vec(),
        draw_ranges: single_range("box", BOX_INDICES.len()),
    }
}

pub fn build_pyramid() -> HostGeometry {
    HostGeometry {
        name: "pyramidGeo".into(),
        streams: vec![
            position_stream(&PYRAMID_POSITIONS),
            color_stream(&PYRAMID_COLORS),
        ],
        indices: PYRAMID_INDICES.to_vec(),
        draw_ranges: single_range("pyramid", PYRAMID_INDICES.len()),
    }
}

/// Box and pyramid in one vertex/index buffer pair. The pyramid keeps its local
/// indices and is shifted by `vertex_offset` at draw time.
pub fn build_combined() -> HostGeometry {
    let positions: Vec<[f32; 3]> = BOX_POSITIONS
        .iter()
        .chain(PYRAMID_POSITIONS.iter())
        .copied()
        .collect();

    let box_colors = (0..BOX_POSITIONS.len())
        .map(|i| if i % 2 == 0 { colors::GREEN } else { colors::BLUE });
    let colors: Vec<Vec4> = box_colors
        .chain(PYRAMID_COLORS.iter().copied())
        .collect();

    let indices: Vec<u16> = BOX_INDICES
        .iter()
        .chain(PYRAMID_INDICES.iter())
        .copied()
        .collect();

    let draw_ranges = BTreeMap::from([
        ("box".to_string(), whole_range(BOX_INDICES.len())),
        ("pyramid".to_string(), DrawRange {
            index_count: PYRAMID_INDICES.len() as u32,
            first_index: BOX_INDICES.len() as u32,
            vertex_offset: BOX_POSITIONS.len() as i32,
        }),
    ]);

    HostGeometry {
        name: "shapeGeo".into(),
        streams: vec![position_stream(&positions), color_stream(&colors)],
        indices,
        draw_ranges,
    }
}

pub fn build_packed_color_box() -> HostGeometry {
    let vertices: Vec<PackedColorVertex> = BOX_POSITIONS
        .iter()
        .zip(INTERLEAVED_BOX_COLORS.iter())
        .map(|(&position, &color)| PackedColorVertex {
            position,
            color: pack_argb(color),
        })
        .collect();

    HostGeometry {
        name: "boxGeo".into(),
        streams: vec![VertexStream::from_slice(&vertices)],
        indices: BOX_INDICES.to_vec(),
        draw_ranges: single_range("box", BOX_INDICES.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const ALL_VARIANTS: [GeometryVariant; 5] = [
        GeometryVariant::Interleaved,
        GeometryVariant::Split,
        GeometryVariant::Pyramid,
        GeometryVariant::Combined,
        GeometryVariant::PackedColor,
    ];

    /// Every triangle of `range` must face away from the centroid of the vertices it uses
    fn assert_outward_winding(geo: &HostGeometry, range: DrawRange) {
        let first = range.first_index as usize;
        let indices = &geo.indices[first..first + range.index_count as usize];
        let vertex = |i: u16| geo.position((i as i32 + range.vertex_offset) as usize);

        let mut used: Vec<u16> = indices.to_vec();
        used.sort_unstable();
        used.dedup();
        let centroid = used.iter().map(|&i| vertex(i)).sum::<Vec3>() / used.len() as f32;

        for tri in indices.chunks_exact(3) {
            let (a, b, c) = (vertex(tri[0]), vertex(tri[1]), vertex(tri[2]));
            let normal = (b - a).cross(c - a);
            let face_center = (a + b + c) / 3.0;
            assert!(
                normal.dot(face_center - centroid) > 0.0,
                "triangle {tri:?} of {} faces inward",
                geo.name,
            );
        }
    }

    #[test]
    fn box_variants_have_36_indices() {
        for variant in [GeometryVariant::Interleaved, GeometryVariant::Split, GeometryVariant::PackedColor] {
            let geo = build_geometry(variant);
            assert_eq!(geo.index_count(), 36);
            assert_eq!(geo.vertex_count(), 8);
            assert_eq!(geo.draw_range("box"), Some(whole_range(36)));
        }
    }

    #[test]
    fn indices_stay_inside_vertex_range() {
        for variant in ALL_VARIANTS {
            let geo = build_geometry(variant);
            for range in geo.draw_ranges.values() {
                let first = range.first_index as usize;
                for &i in &geo.indices[first..first + range.index_count as usize] {
                    let fetched = i as i64 + range.vertex_offset as i64;
                    assert!(fetched >= 0 && fetched < geo.vertex_count() as i64, "{variant:?}");
                }
            }
        }
    }

    #[test]
    fn streams_agree_on_vertex_count() {
        for variant in ALL_VARIANTS {
            let geo = build_geometry(variant);
            for stream in &geo.streams {
                assert_eq!(stream.count, geo.vertex_count());
                assert_eq!(stream.size_in_bytes(), (stream.count * stream.stride) as u64);
            }
        }
    }

    #[test]
    fn combined_ranges() {
        let geo = build_combined();
        assert_eq!(geo.vertex_count(), 13);
        assert_eq!(geo.index_count(), 54);
        assert_eq!(geo.draw_range("box"), Some(DrawRange { index_count: 36, first_index: 0, vertex_offset: 0 }));
        assert_eq!(geo.draw_range("pyramid"), Some(DrawRange { index_count: 18, first_index: 36, vertex_offset: 8 }));
    }

    #[test]
    fn combined_box_colors_alternate() {
        let geo = build_combined();
        let stream = &geo.streams[1];
        for i in 0..8 {
            let expected = if i % 2 == 0 { colors::GREEN } else { colors::BLUE };
            assert_eq!(stream.read::<ColorOnlyVertex>(i).color, expected.to_array());
        }
        assert_eq!(stream.read::<ColorOnlyVertex>(12).color, colors::RED.to_array());
    }

    #[test]
    fn box_faces_point_outward() {
        let geo = build_split_box();
        assert_outward_winding(&geo, geo.draw_range("box").unwrap());
    }

    #[test]
    fn pyramid_faces_point_outward() {
        let geo = build_pyramid();
        assert_outward_winding(&geo, geo.draw_range("pyramid").unwrap());

        let combined = build_combined();
        for range in combined.draw_ranges.values() {
            assert_outward_winding(&combined, *range);
        }
    }

    #[test]
    fn split_and_interleaved_use_their_own_palettes() {
        let interleaved = build_interleaved_box();
        assert_eq!(interleaved.streams[0].read::<ColorVertex>(0).color, colors::BROWN.to_array());

        let split = build_split_box();
        assert_eq!(split.streams.len(), 2);
        assert_eq!(split.streams[1].read::<ColorOnlyVertex>(7).color, colors::PURPLE.to_array());
    }

    #[test]
    fn packed_box_matches_interleaved_colors() {
        let packed = build_packed_color_box();
        let red = packed.streams[0].read::<PackedColorVertex>(2);
        assert_eq!(red.color.to_le_bytes(), [0, 0, 255, 255]);
        assert_eq!(red.position, [1.0, 1.0, -1.0]);
    }
}
