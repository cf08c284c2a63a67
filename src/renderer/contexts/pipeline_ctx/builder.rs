use ash::vk;
use color_eyre::eyre::OptionExt;
use color_eyre::Result;
use crate::renderer::error::{GpuCallError, VkResultExt};
use crate::renderer::resources::shader::GraphicsShader;
use crate::renderer::resources::vertex::VertexInputDescription;

/// Collects the fixed-function state of a graphics pipeline that renders with
/// dynamic rendering. Viewport and scissor are always dynamic.
pub struct GraphicsPipelineBuilder {
    vertex_input: VertexInputDescription,
    topology: vk::PrimitiveTopology,
    polygon_mode: vk::PolygonMode,
    cull_mode: vk::CullModeFlags,
    front_face: vk::FrontFace,
    samples: vk::SampleCountFlags,
    color_blend_attachment: vk::PipelineColorBlendAttachmentState,
    depth_test: bool,
    depth_compare_op: vk::CompareOp,
    color_attachment_format: vk::Format,
    depth_attachment_format: vk::Format,
    stencil_attachment_format: vk::Format,
}

impl Default for GraphicsPipelineBuilder {
    fn default() -> Self {
        Self {
            vertex_input: VertexInputDescription::default(),
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::BACK,
            front_face: vk::FrontFace::CLOCKWISE,
            samples: vk::SampleCountFlags::TYPE_1,
            color_blend_attachment: vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(false),
            depth_test: true,
            depth_compare_op: vk::CompareOp::LESS,
            color_attachment_format: vk::Format::UNDEFINED,
            depth_attachment_format: vk::Format::UNDEFINED,
            stencil_attachment_format: vk::Format::UNDEFINED,
        }
    }
}

impl GraphicsPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vertex_input(mut self, description: VertexInputDescription) -> Self {
        self.vertex_input = description;
        self
    }

    pub fn with_input_topology(mut self, topology: vk::PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_polygon_mode(mut self, mode: vk::PolygonMode) -> Self {
        self.polygon_mode = mode;
        self
    }

    pub fn with_cull_mode(
        mut self,
        cull_mode: vk::CullModeFlags,
        front_face: vk::FrontFace,
    ) -> Self {
        self.cull_mode = cull_mode;
        self.front_face = front_face;
        self
    }

    pub fn with_samples(mut self, samples: vk::SampleCountFlags) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_blending_disabled(mut self) -> Self {
        self.color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false);
        self
    }

    pub fn with_depth_test(
        mut self,
        enable: bool,
        compare: Option<vk::CompareOp>,
    ) -> Self {
        self.depth_test = enable;
        self.depth_compare_op = if enable {
            compare.unwrap_or(vk::CompareOp::LESS)
        } else {
            vk::CompareOp::ALWAYS
        };
        self
    }

    pub fn with_color_attachment_format(mut self, format: vk::Format) -> Self {
        self.color_attachment_format = format;
        self
    }

    /// Also sets the stencil format when `format` carries a stencil aspect
    pub fn with_depth_attachment_format(mut self, format: vk::Format) -> Self {
        self.depth_attachment_format = format;
        self.stencil_attachment_format = if has_stencil(format) {
            format
        } else {
            vk::Format::UNDEFINED
        };
        self
    }

    pub fn input_assembly_state(&self) -> vk::PipelineInputAssemblyStateCreateInfo<'static> {
        vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(self.topology)
            .primitive_restart_enable(false)
    }

    pub fn rasterization_state(&self) -> vk::PipelineRasterizationStateCreateInfo<'static> {
        vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(self.polygon_mode)
            .line_width(1.0)
            .cull_mode(self.cull_mode)
            .front_face(self.front_face)
            .depth_bias_enable(false)
    }

    pub fn depth_stencil_state(&self) -> vk::PipelineDepthStencilStateCreateInfo<'static> {
        vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(self.depth_test)
            .depth_write_enable(self.depth_test)
            .depth_compare_op(self.depth_compare_op)
            .depth_bounds_test_enable(false)
            .min_depth_bounds(0.0)
            .max_depth_bounds(1.0)
            .stencil_test_enable(false)
    }

    pub fn build(
        self,
        shader: &GraphicsShader,
        pipeline_layout: vk::PipelineLayout,
        device: &ash::Device,
    ) -> Result<vk::Pipeline> {
        let entry_point = c"main";
        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(shader.vert_mod)
                .name(entry_point),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(shader.frag_mod)
                .name(entry_point),
        ];

        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&self.vertex_input.bindings)
            .vertex_attribute_descriptions(&self.vertex_input.attributes)
            .flags(self.vertex_input.flags);

        let input_assembly = self.input_assembly_state();

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization = self.rasterization_state();

        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(self.samples)
            .sample_shading_enable(false)
            .min_sample_shading(1.0)
            .alpha_to_coverage_enable(false)
            .alpha_to_one_enable(false);

        let depth_stencil = self.depth_stencil_state();

        let color_blend_attachments = [self.color_blend_attachment];
        let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .logic_op(vk::LogicOp::COPY)
            .attachments(&color_blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_info = vk::PipelineDynamicStateCreateInfo::default()
            .dynamic_states(&dynamic_states);

        let color_attachment_formats = [self.color_attachment_format];
        let mut rendering_info = vk::PipelineRenderingCreateInfo::default()
            .color_attachment_formats(&color_attachment_formats)
            .depth_attachment_format(self.depth_attachment_format)
            .stencil_attachment_format(self.stencil_attachment_format);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .push_next(&mut rendering_info)
            .stages(&shader_stages)
            .layout(pipeline_layout)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .color_blend_state(&color_blend)
            .depth_stencil_state(&depth_stencil)
            .dynamic_state(&dynamic_info);

        let pipelines = unsafe {
            device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
                .map_err(|(_, code)| GpuCallError::new("vkCreateGraphicsPipelines", code))?
        };

        pipelines
            .into_iter()
            .next()
            .ok_or_eyre("vkCreateGraphicsPipelines returned no pipeline")
    }
}

fn has_stencil(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::S8_UINT
            | vk::Format::D16_UNORM_S8_UINT
            | vk::Format::D24_UNORM_S8_UINT
            | vk::Format::D32_SFLOAT_S8_UINT
    )
}

/// Pipeline layout with the given descriptor set layouts and no push constants
pub fn create_pipeline_layout(
    set_layouts: &[vk::DescriptorSetLayout],
    device: &ash::Device,
) -> Result<vk::PipelineLayout> {
    let pipeline_layout_create_info = vk::PipelineLayoutCreateInfo::default()
        .set_layouts(set_layouts);

    let pipeline_layout = unsafe {
        device
            .create_pipeline_layout(&pipeline_layout_create_info, None)
            .call("vkCreatePipelineLayout")?
    };

    Ok(pipeline_layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_solid_back_culled_depth_tested() {
        let builder = GraphicsPipelineBuilder::new();
        let raster = builder.rasterization_state();
        assert_eq!(raster.polygon_mode, vk::PolygonMode::FILL);
        assert_eq!(raster.cull_mode, vk::CullModeFlags::BACK);
        assert_eq!(raster.front_face, vk::FrontFace::CLOCKWISE);
        assert_eq!(builder.input_assembly_state().topology, vk::PrimitiveTopology::TRIANGLE_LIST);

        let depth = builder.depth_stencil_state();
        assert_eq!(depth.depth_test_enable, vk::TRUE);
        assert_eq!(depth.depth_write_enable, vk::TRUE);
        assert_eq!(depth.depth_compare_op, vk::CompareOp::LESS);
        assert_eq!(depth.stencil_test_enable, vk::FALSE);
    }

    #[test]
    fn wireframe_without_culling() {
        let builder = GraphicsPipelineBuilder::new()
            .with_polygon_mode(vk::PolygonMode::LINE)
            .with_cull_mode(vk::CullModeFlags::NONE, vk::FrontFace::CLOCKWISE);
        let raster = builder.rasterization_state();
        assert_eq!(raster.polygon_mode, vk::PolygonMode::LINE);
        assert_eq!(raster.cull_mode, vk::CullModeFlags::NONE);
    }

    #[test]
    fn strip_topology_keeps_restart_off() {
        let assembly = GraphicsPipelineBuilder::new()
            .with_input_topology(vk::PrimitiveTopology::LINE_STRIP)
            .input_assembly_state();
        assert_eq!(assembly.topology, vk::PrimitiveTopology::LINE_STRIP);
        assert_eq!(assembly.primitive_restart_enable, vk::FALSE);
    }

    #[test]
    fn disabled_depth_test_always_passes() {
        let depth = GraphicsPipelineBuilder::new()
            .with_depth_test(false, None)
            .depth_stencil_state();
        assert_eq!(depth.depth_test_enable, vk::FALSE);
        assert_eq!(depth.depth_compare_op, vk::CompareOp::ALWAYS);
    }

    #[test]
    fn stencil_format_follows_depth_format() {
        let builder = GraphicsPipelineBuilder::new()
            .with_depth_attachment_format(vk::Format::D24_UNORM_S8_UINT);
        assert_eq!(builder.stencil_attachment_format, vk::Format::D24_UNORM_S8_UINT);

        let builder = builder.with_depth_attachment_format(vk::Format::D32_SFLOAT);
        assert_eq!(builder.stencil_attachment_format, vk::Format::UNDEFINED);
    }
}
