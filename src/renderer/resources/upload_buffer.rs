use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use ash::vk;
use bytemuck::Pod;
use color_eyre::eyre::{eyre, Result};
use gpu_allocator::vulkan::Allocator;
use gpu_allocator::MemoryLocation;
use crate::renderer::resources::buffer::Buffer;
use crate::renderer::util::align_up;

/// Host-visible buffer holding `count` records of `T`, each padded to `record_alignment`.
/// The CPU writes records in place; the GPU reads them through a uniform or vertex binding.
pub struct UploadBuffer<T: Pod> {
    buffer: Buffer,
    record_size: u64,
    count: u32,
    _marker: PhantomData<T>,
}

impl<T: Pod> UploadBuffer<T> {
    pub fn new(
        count: u32,
        usage: vk::BufferUsageFlags,
        record_alignment: u64,
        name: &str,
        memory_allocator: Arc<Mutex<Allocator>>,
        device: Arc<ash::Device>,
    ) -> Result<Self> {
        let record_size = Self::record_size(record_alignment);
        let buffer = Buffer::new(
            record_size * count as u64,
            usage,
            name,
            MemoryLocation::CpuToGpu,
            memory_allocator,
            device,
        )?;

        Ok(Self {
            buffer,
            record_size,
            count,
            _marker: PhantomData,
        })
    }

    /// Size of one record, rounded up to the device alignment
    pub fn record_size(record_alignment: u64) -> u64 {
        align_up(size_of::<T>() as u64, record_alignment)
    }

    pub fn copy_record(&mut self, index: u32, data: &T) -> Result<()> {
        if index >= self.count {
            return Err(eyre!(
                "Record {index} out of range, buffer holds {} records",
                self.count,
            ));
        }
        let offset = index as u64 * self.record_size;
        self.buffer.write(std::slice::from_ref(data), offset as usize)?;
        Ok(())
    }

    /// Descriptor info covering record `index`
    pub fn descriptor_info(&self, index: u32) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo::default()
            .buffer(self.buffer.buffer)
            .offset(index as u64 * self.record_size)
            .range(size_of::<T>() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::shader_data::FrameTransform;

    #[test]
    fn records_round_up_to_alignment() {
        assert_eq!(UploadBuffer::<FrameTransform>::record_size(256), 256);
        assert_eq!(UploadBuffer::<FrameTransform>::record_size(64), 128);
        assert_eq!(UploadBuffer::<FrameTransform>::record_size(16), 80);
        assert_eq!(UploadBuffer::<[u8; 96]>::record_size(64), 128);
    }

    #[test]
    fn no_alignment_keeps_size() {
        assert_eq!(UploadBuffer::<u32>::record_size(0), 4);
        assert_eq!(UploadBuffer::<u32>::record_size(1), 4);
    }
}
