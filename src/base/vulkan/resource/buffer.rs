use crate::vulkan::{byte_slice_from, resource::command_pool, CommandPool, VulkanContext};
use ash::{version::DeviceV1_0, vk};
use snafu::{ensure, ResultExt, Snafu};
use std::{mem, ptr, sync::Arc};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to create buffer: {}", source))]
    CreateBuffer { source: ash::vk::Result },

    #[snafu(display("No memory type matches {:?} for the buffer", properties))]
    NoMemoryType { properties: vk::MemoryPropertyFlags },

    #[snafu(display("Failed to allocate buffer memory: {}", source))]
    AllocateMemory { source: ash::vk::Result },

    #[snafu(display("Failed to bind buffer memory: {}", source))]
    BindMemory { source: ash::vk::Result },

    #[snafu(display("Failed to map buffer memory: {}", source))]
    MapMemory { source: ash::vk::Result },

    #[snafu(display("Failed to flush buffer memory: {}", source))]
    FlushMemory { source: ash::vk::Result },

    #[snafu(display("Buffer memory is not host visible"))]
    NotHostVisible,

    #[snafu(display(
        "Upload of {} bytes at offset {} exceeds the buffer size of {} bytes",
        length,
        offset,
        size
    ))]
    UploadOutOfBounds {
        length: vk::DeviceSize,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    },

    #[snafu(display("Failed to copy from the staging buffer: {}", source))]
    StagingCopy { source: command_pool::Error },
}

pub struct Buffer {
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
    memory_properties: vk::MemoryPropertyFlags,
    context: Arc<VulkanContext>,
}

impl Buffer {
    pub fn new(
        context: Arc<VulkanContext>,
        usage: vk::BufferUsageFlags,
        memory_properties: vk::MemoryPropertyFlags,
        size: vk::DeviceSize,
        data: Option<&[u8]>,
    ) -> Result<Self> {
        let device = context.logical_device().logical_device();

        let buffer_create_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let buffer =
            unsafe { device.create_buffer(&buffer_create_info, None) }.context(CreateBuffer)?;

        let mut buffer = Self {
            buffer,
            memory: vk::DeviceMemory::null(),
            size,
            memory_properties,
            context: context.clone(),
        };

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer.buffer) };
        let memory_type_index = context
            .memory_type_index(requirements.memory_type_bits, memory_properties)
            .ok_or(Error::NoMemoryType {
                properties: memory_properties,
            })?;
        let allocate_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);
        buffer.memory =
            unsafe { device.allocate_memory(&allocate_info, None) }.context(AllocateMemory)?;

        if let Some(data) = data {
            buffer.upload(data, 0)?;
        }

        unsafe { device.bind_buffer_memory(buffer.buffer, buffer.memory, 0) }
            .context(BindMemory)?;

        Ok(buffer)
    }

    pub fn new_host_visible(
        context: Arc<VulkanContext>,
        usage: vk::BufferUsageFlags,
        size: vk::DeviceSize,
        data: Option<&[u8]>,
    ) -> Result<Self> {
        Self::new(
            context,
            usage,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            size,
            data,
        )
    }

    /// Uploads `data` through a host visible staging buffer into device local memory.
    pub fn device_local_with_data<T: Copy>(
        context: Arc<VulkanContext>,
        command_pool: &CommandPool,
        usage: vk::BufferUsageFlags,
        data: &[T],
    ) -> Result<Self> {
        let bytes = unsafe { byte_slice_from(data) };
        let size = bytes.len() as vk::DeviceSize;

        let staging_buffer = Self::new_host_visible(
            context.clone(),
            vk::BufferUsageFlags::TRANSFER_SRC,
            size,
            Some(bytes),
        )?;

        let buffer = Self::new(
            context.clone(),
            usage | vk::BufferUsageFlags::TRANSFER_DST,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            size,
            None,
        )?;

        let device = context.logical_device().logical_device();
        command_pool
            .execute_once(context.graphics_queue(), |command_buffer| {
                let region = vk::BufferCopy::builder().size(size).build();
                unsafe {
                    device.cmd_copy_buffer(
                        command_buffer,
                        staging_buffer.buffer(),
                        buffer.buffer(),
                        &[region],
                    )
                };
            })
            .context(StagingCopy)?;

        Ok(buffer)
    }

    pub fn buffer(&self) -> vk::Buffer {
        self.buffer
    }

    pub fn memory(&self) -> vk::DeviceMemory {
        self.memory
    }

    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    pub fn descriptor(&self) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo::builder()
            .buffer(self.buffer)
            .offset(0)
            .range(vk::WHOLE_SIZE)
            .build()
    }

    pub fn upload<T: Copy>(&self, data: &[T], offset: vk::DeviceSize) -> Result<()> {
        ensure!(
            self.memory_properties
                .contains(vk::MemoryPropertyFlags::HOST_VISIBLE),
            NotHostVisible
        );

        let length = (data.len() * mem::size_of::<T>()) as vk::DeviceSize;
        ensure!(
            offset + length <= self.size,
            UploadOutOfBounds {
                length,
                offset,
                size: self.size
            }
        );
        if length == 0 {
            return Ok(());
        }

        let device = self.context.logical_device().logical_device();
        unsafe {
            let mapped = device
                .map_memory(self.memory, offset, length, vk::MemoryMapFlags::empty())
                .context(MapMemory)?;
            ptr::copy_nonoverlapping(data.as_ptr() as *const u8, mapped as *mut u8, length as usize);

            if !self
                .memory_properties
                .contains(vk::MemoryPropertyFlags::HOST_COHERENT)
            {
                let range = vk::MappedMemoryRange::builder()
                    .memory(self.memory)
                    .offset(offset)
                    .size(vk::WHOLE_SIZE)
                    .build();
                if let Err(error) = device.flush_mapped_memory_ranges(&[range]) {
                    device.unmap_memory(self.memory);
                    return Err(error).context(FlushMemory);
                }
            }

            device.unmap_memory(self.memory);
        }

        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        let device = self.context.logical_device().logical_device();
        unsafe {
            device.destroy_buffer(self.buffer, None);
            if self.memory != vk::DeviceMemory::null() {
                device.free_memory(self.memory, None);
            }
        }
    }
}
