//! 物理资源接口
//!
//! 具体的 Vulkan / D3D12 / headless 对象都通过这些 trait 暴露给 render graph。
//! 资源通过 `Arc` 共享，最终销毁时机由引用计数决定。

use ash::vk;
use std::fmt;

use crate::desc::{RhiBufferDesc, RhiTextureDesc};

/// 物理图像
pub trait RhiTexture: fmt::Debug {
    fn name(&self) -> &str;

    fn desc(&self) -> &RhiTextureDesc;

    #[inline]
    fn width(&self) -> u32 {
        self.desc().width
    }

    #[inline]
    fn height(&self) -> u32 {
        self.desc().height
    }

    #[inline]
    fn format(&self) -> vk::Format {
        self.desc().format
    }

    /// 原生 vk::Image；非 Vulkan 后端返回 null
    #[inline]
    fn vk_image(&self) -> vk::Image {
        vk::Image::null()
    }
}

/// 物理缓冲区
pub trait RhiBuffer: fmt::Debug {
    fn name(&self) -> &str;

    fn desc(&self) -> &RhiBufferDesc;

    #[inline]
    fn size(&self) -> vk::DeviceSize {
        self.desc().size
    }

    #[inline]
    fn vk_buffer(&self) -> vk::Buffer {
        vk::Buffer::null()
    }
}

/// 着色器 ID，在同一个 device 内唯一
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RhiShaderId(pub u64);

/// 管线 ID，在同一个 device 内唯一
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RhiPipelineId(pub u64);

pub trait RhiShader: fmt::Debug {
    fn id(&self) -> RhiShaderId;
    fn stage(&self) -> vk::ShaderStageFlags;
}

pub trait RhiPipeline: fmt::Debug {
    fn id(&self) -> RhiPipelineId;
    fn bind_point(&self) -> vk::PipelineBindPoint;
}

/// barrier 作用的物理资源
#[derive(Clone, Copy, Debug)]
pub enum RhiResourceRef<'a> {
    Texture(&'a dyn RhiTexture),
    Buffer(&'a dyn RhiBuffer),
}

impl RhiResourceRef<'_> {
    pub fn name(&self) -> &str {
        match self {
            RhiResourceRef::Texture(texture) => texture.name(),
            RhiResourceRef::Buffer(buffer) => buffer.name(),
        }
    }
}
