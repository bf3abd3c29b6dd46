use ash::vk;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use crate::desc::{PipelineDesc, RhiBufferDesc, RhiTextureDesc, ShaderDesc};
use crate::device::RhiDevice;
use crate::error::{RhiError, RhiResult};
use crate::resource::{RhiBuffer, RhiPipeline, RhiPipelineId, RhiShader, RhiShaderId, RhiTexture};

#[derive(Debug)]
pub struct HeadlessTexture {
    name: String,
    desc: RhiTextureDesc,
    serial: u64,
}

impl HeadlessTexture {
    /// 设备内的创建序号，用来判断两次获取的是否为同一个物理资源
    #[inline]
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl RhiTexture for HeadlessTexture {
    fn name(&self) -> &str {
        &self.name
    }

    fn desc(&self) -> &RhiTextureDesc {
        &self.desc
    }
}

#[derive(Debug)]
pub struct HeadlessBuffer {
    name: String,
    desc: RhiBufferDesc,
}

impl RhiBuffer for HeadlessBuffer {
    fn name(&self) -> &str {
        &self.name
    }

    fn desc(&self) -> &RhiBufferDesc {
        &self.desc
    }
}

#[derive(Debug)]
pub struct HeadlessShader {
    id: RhiShaderId,
    desc: ShaderDesc,
}

impl HeadlessShader {
    #[inline]
    pub fn desc(&self) -> &ShaderDesc {
        &self.desc
    }
}

impl RhiShader for HeadlessShader {
    fn id(&self) -> RhiShaderId {
        self.id
    }

    fn stage(&self) -> vk::ShaderStageFlags {
        self.desc.stage
    }
}

#[derive(Debug)]
pub struct HeadlessPipeline {
    id: RhiPipelineId,
    desc: PipelineDesc,
}

impl HeadlessPipeline {
    #[inline]
    pub fn desc(&self) -> &PipelineDesc {
        &self.desc
    }
}

impl RhiPipeline for HeadlessPipeline {
    fn id(&self) -> RhiPipelineId {
        self.id
    }

    fn bind_point(&self) -> vk::PipelineBindPoint {
        if self.desc.is_compute() { vk::PipelineBindPoint::COMPUTE } else { vk::PipelineBindPoint::GRAPHICS }
    }
}

/// 只做记账的设备
///
/// 每一类对象都有独立的创建计数，测试通过这些计数确认缓存是否命中。
#[derive(Debug)]
pub struct HeadlessDevice {
    swapchain_extent: vk::Extent2D,
    next_id: AtomicU64,
    texture_count: AtomicUsize,
    buffer_count: AtomicUsize,
    shader_count: AtomicUsize,
    pipeline_count: AtomicUsize,
    out_of_memory: AtomicBool,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new(vk::Extent2D {
            width: 1280,
            height: 720,
        })
    }
}

// new & init
impl HeadlessDevice {
    pub fn new(swapchain_extent: vk::Extent2D) -> Self {
        Self {
            swapchain_extent,
            next_id: AtomicU64::new(1),
            texture_count: AtomicUsize::new(0),
            buffer_count: AtomicUsize::new(0),
            shader_count: AtomicUsize::new(0),
            pipeline_count: AtomicUsize::new(0),
            out_of_memory: AtomicBool::new(false),
        }
    }

    /// 之后的所有资源创建都返回 `RhiError::OutOfMemory`
    pub fn set_out_of_memory(&self, out_of_memory: bool) {
        self.out_of_memory.store(out_of_memory, Ordering::Relaxed);
    }
}

// getters
impl HeadlessDevice {
    #[inline]
    pub fn texture_count(&self) -> usize {
        self.texture_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn buffer_count(&self) -> usize {
        self.buffer_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn shader_count(&self) -> usize {
        self.shader_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn pipeline_count(&self) -> usize {
        self.pipeline_count.load(Ordering::Relaxed)
    }
}

// tools
impl HeadlessDevice {
    fn alloc_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn check_memory(&self) -> RhiResult<()> {
        if self.out_of_memory.load(Ordering::Relaxed) {
            return Err(RhiError::OutOfMemory);
        }
        Ok(())
    }
}

impl RhiDevice for HeadlessDevice {
    fn create_texture(&self, name: &str, desc: &RhiTextureDesc) -> RhiResult<Arc<dyn RhiTexture>> {
        self.check_memory()?;
        if desc.width == 0 || desc.height == 0 {
            return Err(RhiError::TextureCreationFailed(name.to_string(), "zero sized extent".to_string()));
        }
        self.texture_count.fetch_add(1, Ordering::Relaxed);
        log::debug!("headless: create texture '{}' {}x{} {:?}", name, desc.width, desc.height, desc.format);
        Ok(Arc::new(HeadlessTexture {
            name: name.to_string(),
            desc: desc.clone(),
            serial: self.alloc_id(),
        }))
    }

    fn create_buffer(&self, name: &str, desc: &RhiBufferDesc) -> RhiResult<Arc<dyn RhiBuffer>> {
        self.check_memory()?;
        if desc.size == 0 {
            return Err(RhiError::BufferCreationFailed(name.to_string(), "zero sized buffer".to_string()));
        }
        self.buffer_count.fetch_add(1, Ordering::Relaxed);
        log::debug!("headless: create buffer '{}' {} bytes", name, desc.size);
        Ok(Arc::new(HeadlessBuffer {
            name: name.to_string(),
            desc: desc.clone(),
        }))
    }

    fn create_shader(&self, desc: &ShaderDesc) -> RhiResult<Arc<dyn RhiShader>> {
        if desc.path.is_empty() {
            return Err(RhiError::ShaderCreationFailed(desc.path.clone(), "empty path".to_string()));
        }
        self.shader_count.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(HeadlessShader {
            id: RhiShaderId(self.alloc_id()),
            desc: desc.clone(),
        }))
    }

    fn create_pipeline(&self, desc: &PipelineDesc) -> RhiResult<Arc<dyn RhiPipeline>> {
        let has_graphics = desc.vertex_shader.is_some();
        if desc.is_compute() == has_graphics {
            return Err(RhiError::PipelineCreationFailed(
                "pipeline needs either a compute shader or a vertex shader".to_string(),
            ));
        }
        self.pipeline_count.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(HeadlessPipeline {
            id: RhiPipelineId(self.alloc_id()),
            desc: desc.clone(),
        }))
    }

    fn swapchain_extent(&self) -> vk::Extent2D {
        self.swapchain_extent
    }
}
