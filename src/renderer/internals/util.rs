use ash::vk;

/// Pipeline stages and accesses that touch an image while it sits in `layout`
pub fn layout_scope(layout: vk::ImageLayout) -> (vk::PipelineStageFlags2, vk::AccessFlags2) {
    match layout {
        vk::ImageLayout::UNDEFINED => (
            vk::PipelineStageFlags2::TOP_OF_PIPE,
            vk::AccessFlags2::NONE,
        ),
        // Ordering against the presentation engine comes from the acquire/present semaphores
        vk::ImageLayout::PRESENT_SRC_KHR => (
            vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags2::NONE,
        ),
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => (
            vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags2::COLOR_ATTACHMENT_READ
                | vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
        ),
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => (
            vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS
                | vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS,
            vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ
                | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
        ),
        _ => (
            vk::PipelineStageFlags2::ALL_COMMANDS,
            vk::AccessFlags2::MEMORY_READ | vk::AccessFlags2::MEMORY_WRITE,
        ),
    }
}

/// Layout transition whose first sync scope covers how the image was last used.
/// `old_layout` is what the image actually holds, `previous_use` picks the stages to wait on.
/// Passing UNDEFINED as `old_layout` discards the contents.
pub fn layout_barrier(
    image: vk::Image,
    image_aspect: vk::ImageAspectFlags,
    previous_use: vk::ImageLayout,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) -> vk::ImageMemoryBarrier2<'static> {
    let (src_stage_mask, src_access_mask) = layout_scope(previous_use);
    let (dst_stage_mask, dst_access_mask) = layout_scope(new_layout);

    vk::ImageMemoryBarrier2::default()
        .src_stage_mask(src_stage_mask)
        .src_access_mask(src_access_mask)
        .dst_stage_mask(dst_stage_mask)
        .dst_access_mask(dst_access_mask)
        .old_layout(old_layout)
        .new_layout(new_layout)
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: image_aspect,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        })
        .image(image)
}

/// Throw away the contents of an image that was last used in `previous_use`.
/// For a swap-chain image `previous_use` is PRESENT_SRC_KHR, which chains the
/// transition to the acquire semaphore wait at COLOR_ATTACHMENT_OUTPUT.
pub fn discard_barrier(
    image: vk::Image,
    image_aspect: vk::ImageAspectFlags,
    previous_use: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) -> vk::ImageMemoryBarrier2<'static> {
    layout_barrier(image, image_aspect, previous_use, vk::ImageLayout::UNDEFINED, new_layout)
}

pub fn record_image_barriers(
    cmd: vk::CommandBuffer,
    barriers: &[vk::ImageMemoryBarrier2],
    device: &ash::Device,
) {
    if barriers.is_empty() {
        return;
    }

    let dep_info = vk::DependencyInfo::default()
        .image_memory_barriers(barriers);

    unsafe {
        device.cmd_pipeline_barrier2(cmd, &dep_info);
    }
}

pub fn transition_image_layout(
    cmd: vk::CommandBuffer,
    image: vk::Image,
    image_aspect: vk::ImageAspectFlags,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
    device: &ash::Device,
) {
    if old_layout == new_layout {
        return;
    }

    let barrier = layout_barrier(image, image_aspect, old_layout, old_layout, new_layout);
    record_image_barriers(cmd, &[barrier], device);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_layouts_sync_on_their_stages() {
        let (stage, access) = layout_scope(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
        assert_eq!(stage, vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT);
        assert!(access.contains(vk::AccessFlags2::COLOR_ATTACHMENT_WRITE));

        let (stage, access) = layout_scope(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
        assert!(stage.contains(vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS));
        assert!(access.contains(vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE));
    }

    #[test]
    fn present_and_undefined_carry_no_access() {
        assert_eq!(layout_scope(vk::ImageLayout::PRESENT_SRC_KHR).1, vk::AccessFlags2::NONE);
        assert_eq!(layout_scope(vk::ImageLayout::UNDEFINED).1, vk::AccessFlags2::NONE);
    }

    #[test]
    fn acquired_image_waits_on_color_output() {
        let barrier = discard_barrier(
            vk::Image::null(),
            vk::ImageAspectFlags::COLOR,
            vk::ImageLayout::PRESENT_SRC_KHR,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        );
        // Must match the stage the acquire semaphore is waited on
        assert_eq!(barrier.src_stage_mask, vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT);
        assert_eq!(barrier.src_access_mask, vk::AccessFlags2::NONE);
        assert_eq!(barrier.old_layout, vk::ImageLayout::UNDEFINED);
        assert_eq!(barrier.new_layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
        assert_eq!(barrier.dst_stage_mask, vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT);
    }

    #[test]
    fn reused_depth_waits_on_previous_tests() {
        let barrier = discard_barrier(
            vk::Image::null(),
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        );
        assert!(barrier.src_stage_mask.contains(vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS));
        assert!(barrier.src_access_mask.contains(vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE));
        assert_eq!(barrier.old_layout, vk::ImageLayout::UNDEFINED);
        assert_eq!(barrier.subresource_range.aspect_mask, vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL);
    }

    #[test]
    fn plain_transition_syncs_on_old_layout() {
        let barrier = layout_barrier(
            vk::Image::null(),
            vk::ImageAspectFlags::COLOR,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::ImageLayout::PRESENT_SRC_KHR,
        );
        assert!(barrier.src_access_mask.contains(vk::AccessFlags2::COLOR_ATTACHMENT_WRITE));
        assert_eq!(barrier.dst_access_mask, vk::AccessFlags2::NONE);
    }
}
