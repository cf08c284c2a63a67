use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use crate::renderer::error::VkResultExt;

const SHADERS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders-built");

/// Vertex and fragment modules compiled from `<name>.vert` and `<name>.frag`
pub struct GraphicsShader {
    pub vert_mod: vk::ShaderModule,
    pub frag_mod: vk::ShaderModule,
    device: Arc<ash::Device>,
}

impl GraphicsShader {
    pub fn new(shader_name: &str, device: Arc<ash::Device>) -> Result<Self> {
        let vert_mod = create_shader_module(&shader_path(shader_name, "vert"), &device)?;
        let frag_mod = match create_shader_module(&shader_path(shader_name, "frag"), &device) {
            Ok(module) => module,
            Err(err) => {
                unsafe { device.destroy_shader_module(vert_mod, None) };
                return Err(err);
            }
        };
        Ok(Self { vert_mod, frag_mod, device })
    }
}

impl Drop for GraphicsShader {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.vert_mod, None);
            self.device.destroy_shader_module(self.frag_mod, None);
        }
    }
}

fn shader_path(shader_name: &str, stage: &str) -> PathBuf {
    Path::new(SHADERS_DIR).join(format!("{shader_name}.{stage}.spv"))
}

fn create_shader_module(filepath: &Path, device: &ash::Device) -> Result<vk::ShaderModule> {
    let bytes = std::fs::read(filepath)
        .wrap_err_with(|| format!("Failed to read shader {}", filepath.display()))?;
    // Copies into a u32-aligned buffer
    let code = ash::util::read_spv(&mut Cursor::new(bytes))
        .wrap_err_with(|| format!("Invalid SPIR-V in {}", filepath.display()))?;

    let shader_module_info = vk::ShaderModuleCreateInfo::default()
        .code(&code);

    let shader_module = unsafe {
        device
            .create_shader_module(&shader_module_info, None)
            .call("vkCreateShaderModule")?
    };

    log::debug!("Loaded shader module {}", filepath.display());

    Ok(shader_module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_point_into_build_output() {
        let path = shader_path("color", "vert");
        assert!(path.ends_with("shaders-built/color.vert.spv"));
    }
}
