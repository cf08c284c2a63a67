use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Data unique to each frame passed into the uniform buffer
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameTransform {
    pub world_view_proj: Mat4,
    pub time: f32,
    _padding: [f32; 3],
}

impl FrameTransform {
    pub fn new(world_view_proj: Mat4, time: f32) -> Self {
        Self {
            world_view_proj,
            time,
            _padding: [0.0; 3],
        }
    }
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, 0.0)
    }
}

/// Position and float color in one interleaved stream
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Position and a packed ARGB color, read by the GPU as B8G8R8A8_UNORM
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PackedColorVertex {
    pub position: [f32; 3],
    pub color: u32,
}

/// Position-only stream of a split layout
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

/// Color-only stream of a split layout
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ColorOnlyVertex {
    pub color: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn frame_transform_matches_std140_block() {
        assert_eq!(size_of::<FrameTransform>(), 80);
        assert_eq!(offset_of!(FrameTransform, time), 64);
    }

    #[test]
    fn vertex_strides() {
        assert_eq!(size_of::<ColorVertex>(), 28);
        assert_eq!(size_of::<PackedColorVertex>(), 16);
        assert_eq!(size_of::<PositionVertex>(), 12);
        assert_eq!(size_of::<ColorOnlyVertex>(), 16);
        assert_eq!(offset_of!(ColorVertex, color), 12);
        assert_eq!(offset_of!(PackedColorVertex, color), 12);
    }
}
