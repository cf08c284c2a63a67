use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::OptionExt;
use color_eyre::Result;
use winit::window::Window;
use crate::renderer::config::RenderConfig;
use crate::renderer::contexts::device_ctx::device::RenderDevice;
use crate::renderer::contexts::device_ctx::instance::RenderInstance;
use crate::renderer::error::VkResultExt;
use crate::renderer::internals::swapchain::{choose_present_mode, choose_surface_format, Swapchain};
use crate::renderer::resources::image::Image;

/// Presentation target of the renderer: window, surface, swap chain and the
/// depth/stencil (and optional multisampled color) images sized to match it
pub struct RenderTarget {
    pub window: Arc<Window>,

    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub samples: vk::SampleCountFlags,

    pub swapchain: Swapchain,
    pub depth_image: Image,
    pub msaa_color_image: Option<Image>,

    // Declared last so it drops after the swap chain
    surface: Surface,
}

impl RenderTarget {
    pub fn new(
        window: Arc<Window>,
        surface: (vk::SurfaceKHR, ash::khr::surface::Instance),
        config: &RenderConfig,
        ins: &RenderInstance,
        dev: &RenderDevice,
    ) -> Result<Self> {
        let (handle, loader) = surface;
        let surface = Surface { handle, loader };

        let surface_formats = unsafe {
            surface.loader
                .get_physical_device_surface_formats(dev.physical, surface.handle)
                .call("vkGetPhysicalDeviceSurfaceFormatsKHR")?
        };
        let surface_present_modes = unsafe {
            surface.loader
                .get_physical_device_surface_present_modes(dev.physical, surface.handle)
                .call("vkGetPhysicalDeviceSurfacePresentModesKHR")?
        };

        let surface_format = choose_surface_format(&surface_formats)
            .ok_or_eyre("Surface reports no formats")?;
        let present_mode = choose_present_mode(&surface_present_modes, config.vsync);
        let samples = dev.get_sample_count(config.msaa_4x);

        let swapchain = Swapchain::new(
            surface.handle,
            &surface.loader,
            surface_format,
            present_mode,
            window.inner_size().into(),
            vk::SwapchainKHR::null(),
            ins,
            dev,
        )?;
        let (depth_image, msaa_color_image) =
            create_attachments(&swapchain, samples, dev)?;

        Ok(Self {
            window,
            surface_format,
            present_mode,
            samples,
            swapchain,
            depth_image,
            msaa_color_image,
            surface,
        })
    }

    /// Recreate the swap chain and the attachments at the current window size
    pub fn resize(
        &mut self,
        ins: &RenderInstance,
        dev: &RenderDevice,
    ) -> Result<()> {
        dev.wait_idle()?;

        let swapchain = Swapchain::new(
            self.surface.handle,
            &self.surface.loader,
            self.surface_format,
            self.present_mode,
            self.window.inner_size().into(),
            self.swapchain.swapchain,
            ins,
            dev,
        )?;
        // The old swap chain is retired once replaced
        self.swapchain = swapchain;

        let (depth_image, msaa_color_image) =
            create_attachments(&self.swapchain, self.samples, dev)?;
        self.depth_image = depth_image;
        self.msaa_color_image = msaa_color_image;

        Ok(())
    }

    pub fn get_extent(&self) -> vk::Extent2D {
        self.swapchain.swapchain_image_extent
    }

    pub fn get_aspect_ratio(&self) -> f32 {
        let extent = self.get_extent();
        extent.width as f32 / extent.height.max(1) as f32
    }

    pub fn get_color_format(&self) -> vk::Format {
        self.swapchain.swapchain_image_format
    }

    pub fn get_depth_format(&self) -> vk::Format {
        self.depth_image.format
    }
}

/// Destroyed after every swap chain that was created from it
struct Surface {
    handle: vk::SurfaceKHR,
    loader: ash::khr::surface::Instance,
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.handle, None);
        }
    }
}

fn create_attachments(
    swapchain: &Swapchain,
    samples: vk::SampleCountFlags,
    dev: &RenderDevice,
) -> Result<(Image, Option<Image>)> {
    let extent = swapchain.swapchain_image_extent;

    let depth_image = Image::new_depth_stencil_image(
        extent.width,
        extent.height,
        dev.get_depth_stencil_format(),
        samples,
        dev.get_memory_allocator(),
        dev.logical.clone(),
    )?;

    let msaa_color_image = if samples != vk::SampleCountFlags::TYPE_1 {
        Some(Image::new_msaa_color_image(
            extent.width,
            extent.height,
            swapchain.swapchain_image_format,
            samples,
            dev.get_memory_allocator(),
            dev.logical.clone(),
        )?)
    } else {
        None
    };

    Ok((depth_image, msaa_color_image))
}
