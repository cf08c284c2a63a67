/// "Resources" are GPU objects owned by the contexts: buffers, images, meshes and shaders.
/// Geometry and vertex layouts are plain host data and can be built without a device.

pub mod buffer;
pub mod geometry;
pub mod image;
pub mod mesh;
pub mod shader;
pub mod upload_buffer;
pub mod vertex;
