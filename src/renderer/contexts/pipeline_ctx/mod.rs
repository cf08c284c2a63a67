pub mod builder;

use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use crate::renderer::config::{RenderConfig, Topology};
use crate::renderer::contexts::device_ctx::RenderDeviceContext;
use crate::renderer::contexts::pipeline_ctx::builder::{create_pipeline_layout, GraphicsPipelineBuilder};
use crate::renderer::contexts::resource_ctx::RenderResourceContext;
use crate::renderer::resources::shader::GraphicsShader;
use crate::renderer::resources::vertex::VertexInputDescription;

const COLOR_SHADER: &str = "color";

/// Responsibilities:
/// - Own the root signature equivalent: one uniform buffer visible to the vertex stage
/// - Build the single graphics pipeline used to draw the geometry
pub struct RenderPipelineContext {
    pipeline: vk::Pipeline,
    pipeline_layout: vk::PipelineLayout,
    device: Arc<ash::Device>,
}

impl RenderPipelineContext {
    pub fn new(
        dev_ctx: &RenderDeviceContext,
        res_ctx: &RenderResourceContext,
        config: &RenderConfig,
    ) -> Result<Self> {
        let device = dev_ctx.device.logical.clone();

        let pipeline_layout = create_pipeline_layout(
            &[res_ctx.get_descriptor_set_layout()],
            &device,
        )?;

        let pipeline = match build_pipeline(dev_ctx, config, pipeline_layout) {
            Ok(pipeline) => pipeline,
            Err(err) => {
                unsafe { device.destroy_pipeline_layout(pipeline_layout, None) };
                return Err(err);
            }
        };

        Ok(Self {
            pipeline,
            pipeline_layout,
            device,
        })
    }

    pub fn get_pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub fn get_pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }
}

impl Drop for RenderPipelineContext {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}

fn build_pipeline(
    dev_ctx: &RenderDeviceContext,
    config: &RenderConfig,
    pipeline_layout: vk::PipelineLayout,
) -> Result<vk::Pipeline> {
    let device = &dev_ctx.device;
    let target = &dev_ctx.target;

    // Modules are only needed while the pipeline is created
    let shader = GraphicsShader::new(COLOR_SHADER, device.logical.clone())
        .wrap_err("Failed to load the color shaders")?;

    let polygon_mode = if config.wireframe && device.supports_fill_mode_non_solid() {
        vk::PolygonMode::LINE
    } else {
        if config.wireframe {
            log::warn!("fillModeNonSolid is not supported, drawing solid triangles");
        }
        vk::PolygonMode::FILL
    };
    let cull_mode = if config.cull_back {
        vk::CullModeFlags::BACK
    } else {
        vk::CullModeFlags::NONE
    };

    let pipeline = GraphicsPipelineBuilder::new()
        .with_vertex_input(VertexInputDescription::for_variant(config.geometry))
        .with_input_topology(primitive_topology(config.topology))
        .with_polygon_mode(polygon_mode)
        .with_cull_mode(cull_mode, vk::FrontFace::CLOCKWISE)
        .with_samples(target.samples)
        .with_blending_disabled()
        .with_depth_test(true, Some(vk::CompareOp::LESS))
        .with_color_attachment_format(target.get_color_format())
        .with_depth_attachment_format(target.get_depth_format())
        .build(&shader, pipeline_layout, &device.logical)?;

    log::info!(
        "Pipeline built: {:?} geometry, {:?}, {:?}, cull {:?}, {:?}",
        config.geometry,
        config.topology,
        polygon_mode,
        cull_mode,
        target.samples,
    );

    Ok(pipeline)
}

fn primitive_topology(topology: Topology) -> vk::PrimitiveTopology {
    match topology {
        Topology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        Topology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        Topology::LineList => vk::PrimitiveTopology::LINE_LIST,
        Topology::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_draws_triangle_lists() {
        let config = RenderConfig::default();
        assert_eq!(primitive_topology(config.topology), vk::PrimitiveTopology::TRIANGLE_LIST);
    }

    #[test]
    fn line_topologies_map_to_vulkan() {
        assert_eq!(primitive_topology(Topology::LineList), vk::PrimitiveTopology::LINE_LIST);
        assert_eq!(primitive_topology(Topology::LineStrip), vk::PrimitiveTopology::LINE_STRIP);
        assert_eq!(primitive_topology(Topology::TriangleStrip), vk::PrimitiveTopology::TRIANGLE_STRIP);
    }
}
