use std::f32::consts::PI;
use glam::{Mat4, Vec3};
use crate::renderer::shader_data::FrameTransform;

/// Left-handed perspective camera that always looks at a target point
pub struct Camera {
    position: Vec3,
    target: Vec3,
    world_up: Vec3,
    fov_y: f32,
    near: f32,
    far: f32,
}

impl Camera {
    pub const DEFAULT_FOV_Y: f32 = 0.25 * PI;
    pub const DEFAULT_NEAR: f32 = 1.0;
    pub const DEFAULT_FAR: f32 = 1000.0;

    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            target: Vec3::ZERO,
            world_up: Vec3::Y,
            fov_y: Self::DEFAULT_FOV_Y,
            near: Self::DEFAULT_NEAR,
            far: Self::DEFAULT_FAR,
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn get_view_mat(&self) -> Mat4 {
        Mat4::look_at_lh(self.position, self.target, self.world_up)
    }

    pub fn get_proj_mat(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_lh(self.fov_y, aspect_ratio, self.near, self.far)
    }

    pub fn get_position(&self) -> Vec3 {
        self.position
    }

}

/// Build the per-frame uniform block.
///
/// The shader multiplies column vectors, so the stored matrix is
/// `proj * view * world`, which is the transpose of the row-vector
/// product `world * view * proj`.
pub fn compute_frame_transform(
    camera: &Camera,
    aspect_ratio: f32,
    world: Mat4,
    time: f32,
) -> FrameTransform {
    let view = camera.get_view_mat();
    let proj = camera.get_proj_mat(aspect_ratio);
    FrameTransform::new(proj * view * world, time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::util::spherical_to_cartesian;
    use glam::Vec4;

    fn default_eye() -> Vec3 {
        spherical_to_cartesian(5.0, 1.5 * PI, 0.25 * PI)
    }

    fn assert_mat_close(a: Mat4, b: Mat4) {
        let (a, b) = (a.to_cols_array(), b.to_cols_array());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-4, "{a:?} != {b:?}");
        }
    }

    /// Row-vector convention: v' = v * M
    fn row_major_look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let z = (target - eye).normalize();
        let x = up.cross(z).normalize();
        let y = z.cross(x);
        Mat4::from_cols(
            Vec4::new(x.x, y.x, z.x, 0.0),
            Vec4::new(x.y, y.y, z.y, 0.0),
            Vec4::new(x.z, y.z, z.z, 0.0),
            Vec4::new(-x.dot(eye), -y.dot(eye), -z.dot(eye), 1.0),
        )
        .transpose()
    }

    fn row_major_perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let h = 1.0 / (0.5 * fov_y).tan();
        let w = h / aspect;
        let r = far / (far - near);
        Mat4::from_cols_array(&[
            w, 0.0, 0.0, 0.0,
            0.0, h, 0.0, 0.0,
            0.0, 0.0, r, 1.0,
            0.0, 0.0, -r * near, 0.0,
        ])
        .transpose()
    }

    #[test]
    fn stored_matrix_is_transposed_row_product() {
        let camera = Camera::new(default_eye());
        let world = Mat4::from_translation(Vec3::new(0.5, -1.0, 2.0));
        let aspect = 16.0 / 9.0;

        let block = compute_frame_transform(&camera, aspect, world, 0.0);

        // Independent row-vector reference, written out as the shader's matrix
        let world_row = world.transpose();
        let view_row = row_major_look_at(camera.get_position(), Vec3::ZERO, Vec3::Y);
        let proj_row = row_major_perspective(0.25 * PI, aspect, 1.0, 1000.0);
        let expected = (world_row * view_row * proj_row).transpose();

        assert_mat_close(block.world_view_proj, expected);
    }

    #[test]
    fn identical_inputs_give_identical_bytes() {
        let camera = Camera::new(default_eye());
        let a = compute_frame_transform(&camera, 1.5, Mat4::IDENTITY, 3.25);
        let b = compute_frame_transform(&camera, 1.5, Mat4::IDENTITY, 3.25);
        assert_eq!(bytemuck::bytes_of(&a), bytemuck::bytes_of(&b));
        assert_eq!(a.time, 3.25);
    }

    #[test]
    fn projection_uses_viewport_aspect_and_quarter_pi_fov() {
        let camera = Camera::new(default_eye());
        let (width, height) = (1600.0_f32, 900.0_f32);
        let proj = camera.get_proj_mat(width / height);

        let y_scale = proj.y_axis.y;
        let x_scale = proj.x_axis.x;
        let fov_y = 2.0 * (1.0 / y_scale).atan();
        assert!((fov_y - 0.25 * PI).abs() < 1e-5);
        assert!((y_scale / x_scale - width / height).abs() < 1e-4);
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = Camera::new(default_eye());
        let block = compute_frame_transform(&camera, 16.0 / 9.0, Mat4::IDENTITY, 0.0);
        let clip = block.world_view_proj * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
