use glam::{Vec3, Vec4};

/// Convert orbit coordinates to a Cartesian position around the origin.
/// `theta` is the azimuth in the XZ plane, `phi` the polar angle from +Y.
pub fn spherical_to_cartesian(radius: f32, theta: f32, phi: f32) -> Vec3 {
    Vec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Round `size` up to the next multiple of `alignment` (a power of two, or zero for no alignment)
pub fn align_up(size: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return size;
    }
    debug_assert!(alignment.is_power_of_two());
    (size + alignment - 1) & !(alignment - 1)
}

/// Pack a linear RGBA color into a 32-bit ARGB value.
/// In little-endian memory the bytes read B, G, R, A.
pub fn pack_argb(color: Vec4) -> u32 {
    let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
    (to_byte(color.w) << 24)
        | (to_byte(color.x) << 16)
        | (to_byte(color.y) << 8)
        | to_byte(color.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn spherical_on_positive_x() {
        let p = spherical_to_cartesian(5.0, 0.0, FRAC_PI_2);
        assert!((p - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5, "{p:?}");
    }

    #[test]
    fn spherical_keeps_radius() {
        let p = spherical_to_cartesian(7.5, 1.5 * PI, 0.3);
        assert!((p.length() - 7.5).abs() < 1e-4);
        // phi = 0 looks straight down the +Y axis
        let top = spherical_to_cartesian(3.0, 1.0, 0.0);
        assert!((top - Vec3::new(0.0, 3.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn align_up_rounds_to_multiple() {
        assert_eq!(align_up(80, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
        assert_eq!(align_up(80, 0), 80);
        assert_eq!(align_up(0, 64), 0);
    }

    #[test]
    fn packed_color_bytes_are_bgra() {
        let packed = pack_argb(Vec4::new(1.0, 0.5, 0.0, 1.0));
        assert_eq!(packed.to_le_bytes(), [0, 128, 255, 255]);
    }
}
