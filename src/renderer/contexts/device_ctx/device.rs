use std::ffi::{c_char, CStr};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};
use ash::vk;
use color_eyre::eyre::{eyre, OptionExt};
use color_eyre::Result;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use crate::renderer::contexts::device_ctx::instance::RenderInstance;
use crate::renderer::contexts::device_ctx::queue::{find_graphics_present_family, Queue, QueueFamily};
use crate::renderer::contexts::device_ctx::transfer_ctx::TransferContext;
use crate::renderer::error::VkResultExt;

/// Depth formats with a stencil aspect, in order of preference
const DEPTH_STENCIL_CANDIDATES: [vk::Format; 2] = [
    vk::Format::D24_UNORM_S8_UINT,
    vk::Format::D32_SFLOAT_S8_UINT,
];

/// Logical device, its single graphics/present queue and the memory allocator
pub struct RenderDevice {
    pub logical: Arc<ash::Device>,
    pub physical: vk::PhysicalDevice,
    pub properties: vk::PhysicalDeviceProperties,

    // The graphics queue is required to support presentation
    pub graphics_queue: Arc<Queue>,

    fill_mode_non_solid: bool,
    depth_stencil_format: vk::Format,

    memory_allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,
    transfer_context: ManuallyDrop<TransferContext>,
}

impl RenderDevice {
    pub fn new(
        instance: &RenderInstance,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> Result<Self> {
        let (physical_device, graphics_queue_family) = Self::select_physical_device(
            &instance.instance,
            surface,
            surface_loader,
        )?;

        let properties = unsafe {
            instance.instance.get_physical_device_properties(physical_device)
        };
        let supported_features = unsafe {
            instance.instance.get_physical_device_features(physical_device)
        };
        let fill_mode_non_solid = supported_features.fill_mode_non_solid == vk::TRUE;

        let depth_stencil_format = pick_first_supported(&DEPTH_STENCIL_CANDIDATES, |format| {
            let props = unsafe {
                instance.instance.get_physical_device_format_properties(physical_device, format)
            };
            props.optimal_tiling_features
                .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
        })
        .ok_or_eyre("No supported depth/stencil format")?;

        let (logical_device, graphics_queue) = Self::create_logical_device(
            &instance.instance,
            physical_device,
            graphics_queue_family,
            fill_mode_non_solid,
        )?;

        let memory_allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.instance.clone(),
            device: logical_device.clone(),
            physical_device,
            debug_settings: gpu_allocator::AllocatorDebugSettings {
                log_memory_information: cfg!(debug_assertions),
                log_leaks_on_shutdown: true,
                store_stack_traces: false,
                log_allocations: false,
                log_frees: false,
                log_stack_traces: false,
            },
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })?;

        let logical_device = Arc::new(logical_device);
        let graphics_queue = Arc::new(graphics_queue);

        let transfer_context = TransferContext::new(
            graphics_queue.clone(),
            logical_device.clone(),
        )?;

        let device_name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "<unknown>".into());
        log::info!(
            "Using {device_name} ({:?}), queue family {}, depth format {depth_stencil_format:?}",
            properties.device_type,
            graphics_queue.family.index,
        );

        Ok(Self {
            logical: logical_device,
            physical: physical_device,
            properties,

            graphics_queue,

            fill_mode_non_solid,
            depth_stencil_format,

            memory_allocator: ManuallyDrop::new(Arc::new(Mutex::new(memory_allocator))),
            transfer_context: ManuallyDrop::new(transfer_context),
        })
    }

    /// Record commands and block until the GPU has executed them
    pub fn immediate_submit<F, R>(
        &self,
        func: F,
    ) -> Result<R>
    where
        F: FnOnce(vk::CommandBuffer, &ash::Device) -> Result<R>,
    {
        self.transfer_context.immediate_submit(func)
    }

    pub fn get_memory_allocator(&self) -> Arc<Mutex<Allocator>> {
        Arc::clone(&self.memory_allocator)
    }

    pub fn get_min_uniform_buffer_offset_alignment(&self) -> u64 {
        self.properties.limits.min_uniform_buffer_offset_alignment
    }

    pub fn get_depth_stencil_format(&self) -> vk::Format {
        self.depth_stencil_format
    }

    pub fn supports_fill_mode_non_solid(&self) -> bool {
        self.fill_mode_non_solid
    }

    /// 4 samples when requested and usable for both color and depth, otherwise 1
    pub fn get_sample_count(&self, msaa_4x: bool) -> vk::SampleCountFlags {
        let limits = &self.properties.limits;
        select_sample_count(
            msaa_4x,
            limits.framebuffer_color_sample_counts,
            limits.framebuffer_depth_sample_counts,
        )
    }

    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.logical.device_wait_idle().call("vkDeviceWaitIdle")?;
        }
        Ok(())
    }

    fn select_physical_device(
        instance: &ash::Instance,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> Result<(vk::PhysicalDevice, QueueFamily)> {
        let devices = unsafe {
            instance
                .enumerate_physical_devices()
                .call("vkEnumeratePhysicalDevices")?
        };

        devices
            .into_iter()
            .filter(|device| {
                let props = unsafe { instance.get_physical_device_properties(*device) };
                let api_ok = props.api_version >= vk::API_VERSION_1_3;
                if !api_ok {
                    log::debug!("Skipping device without Vulkan 1.3 support");
                }
                api_ok
            })
            // Filter out devices that do not contain the required device extensions
            .filter(|device| {
                let supported_extensions = unsafe {
                    instance
                        .enumerate_device_extension_properties(*device)
                        .unwrap_or_default()
                };
                Self::get_required_device_extensions().iter().all(|req_ext| {
                    let supported = supported_extensions
                        .iter()
                        .any(|ext| ext.extension_name_as_c_str() == Ok(*req_ext));
                    if !supported {
                        log::debug!("Device extension not supported: {:?}", req_ext);
                    }
                    supported
                })
            })
            // Filter out devices that cannot draw and present from one queue
            .filter_map(|device| {
                let families = unsafe {
                    instance.get_physical_device_queue_family_properties(device)
                };
                let family = find_graphics_present_family(&families, |index| unsafe {
                    surface_loader
                        .get_physical_device_surface_support(device, index, surface)
                        .unwrap_or(false)
                })?;
                Some((device, family))
            })
            .min_by_key(|(device, _)| {
                let props = unsafe { instance.get_physical_device_properties(*device) };
                device_type_rank(props.device_type)
            })
            .ok_or_else(|| eyre!("No suitable physical device found"))
    }

    fn create_logical_device(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        graphics_queue_family: QueueFamily,
        fill_mode_non_solid: bool,
    ) -> Result<(ash::Device, Queue)> {
        let queue_priorities = [1.0];
        let queue_create_infos = [
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_queue_family.index)
                .queue_priorities(&queue_priorities),
        ];

        let device = {
            let enabled_extension_names = Self::get_required_device_extensions()
                .iter()
                .map(|ext| ext.as_ptr())
                .collect::<Vec<*const c_char>>();

            let features = vk::PhysicalDeviceFeatures::default()
                .fill_mode_non_solid(fill_mode_non_solid);
            let mut vulkan_13_features = vk::PhysicalDeviceVulkan13Features::default()
                .dynamic_rendering(true)
                .synchronization2(true);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&enabled_extension_names)
                .enabled_features(&features)
                .push_next(&mut vulkan_13_features);

            unsafe {
                instance
                    .create_device(physical_device, &device_create_info, None)
                    .call("vkCreateDevice")?
            }
        };

        let graphics_queue = unsafe {
            let queue = device.get_device_queue(graphics_queue_family.index, 0);
            Queue::new(graphics_queue_family, queue)
        };

        Ok((device, graphics_queue))
    }

    fn get_required_device_extensions() -> Vec<&'static CStr> {
        vec![
            ash::khr::swapchain::NAME,

            #[cfg(target_os = "macos")]
            ash::khr::portability_subset::NAME,
        ]
    }
}

impl Drop for RenderDevice {
    fn drop(&mut self) {
        unsafe {
            if let Err(err) = self.logical.device_wait_idle() {
                log::error!("vkDeviceWaitIdle failed during teardown: {err}");
            }
            ManuallyDrop::drop(&mut self.transfer_context);
            if Arc::strong_count(&self.memory_allocator) > 1 {
                log::warn!("GPU resources still alive while the device is destroyed");
            }
            ManuallyDrop::drop(&mut self.memory_allocator);
            self.logical.destroy_device(None);
        }
    }
}

fn device_type_rank(device_type: vk::PhysicalDeviceType) -> u32 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 0,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 1,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 2,
        vk::PhysicalDeviceType::CPU => 3,
        vk::PhysicalDeviceType::OTHER => 4,
        _ => 5,
    }
}

/// First candidate accepted by `is_supported`
pub fn pick_first_supported(
    candidates: &[vk::Format],
    is_supported: impl Fn(vk::Format) -> bool,
) -> Option<vk::Format> {
    candidates.iter().copied().find(|format| is_supported(*format))
}

pub fn select_sample_count(
    msaa_4x: bool,
    color_counts: vk::SampleCountFlags,
    depth_counts: vk::SampleCountFlags,
) -> vk::SampleCountFlags {
    if !msaa_4x {
        return vk::SampleCountFlags::TYPE_1;
    }
    let usable = color_counts & depth_counts;
    if usable.contains(vk::SampleCountFlags::TYPE_4) {
        vk::SampleCountFlags::TYPE_4
    } else {
        log::warn!("4x MSAA is not supported by this device, rendering without it");
        vk::SampleCountFlags::TYPE_1
    }
}
