//! 资源与管线的描述符
//!
//! 所有描述符都实现 `Eq + Hash`，并且覆盖每一个字段，
//! 以便作为跨帧缓存的 key。

use ash::vk;

use crate::resource::RhiShaderId;
use crate::resource_state::RhiResourceState;

/// 图像资源描述
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RhiTextureDesc {
    /// 图像宽度
    pub width: u32,
    /// 图像高度
    pub height: u32,
    /// 图像深度（3D 纹理）
    pub depth: u32,
    /// Mip 级别数
    pub mip_levels: u32,
    /// 数组层数
    pub array_layers: u32,
    /// 图像格式
    pub format: vk::Format,
    /// 图像用途
    pub usage: vk::ImageUsageFlags,
    /// 采样数
    pub samples: vk::SampleCountFlags,
    /// 进入 graph 时的状态
    pub initial_state: RhiResourceState,
}

impl Default for RhiTextureDesc {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            depth: 1,
            mip_levels: 1,
            array_layers: 1,
            format: vk::Format::R8G8B8A8_UNORM,
            usage: vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::COLOR_ATTACHMENT,
            samples: vk::SampleCountFlags::TYPE_1,
            initial_state: RhiResourceState::Undefined,
        }
    }
}

// new & builder
impl RhiTextureDesc {
    /// 创建 2D 图像描述，usage 根据 format 推断
    pub fn new_2d(width: u32, height: u32, format: vk::Format) -> Self {
        let attachment_usage = if crate::format::is_depth_format(format) {
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
        } else {
            vk::ImageUsageFlags::COLOR_ATTACHMENT
        };
        Self {
            width,
            height,
            format,
            usage: attachment_usage | vk::ImageUsageFlags::SAMPLED,
            ..Default::default()
        }
    }

    #[inline]
    pub fn with_usage(mut self, usage: vk::ImageUsageFlags) -> Self {
        self.usage = usage;
        self
    }

    #[inline]
    pub fn with_initial_state(mut self, state: RhiResourceState) -> Self {
        self.initial_state = state;
        self
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.width,
            height: self.height,
        }
    }
}

/// 缓冲区资源描述
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RhiBufferDesc {
    /// 缓冲区大小（字节）
    pub size: vk::DeviceSize,
    /// 缓冲区用途
    pub usage: vk::BufferUsageFlags,
    /// 进入 graph 时的状态
    pub initial_state: RhiResourceState,
}

impl Default for RhiBufferDesc {
    fn default() -> Self {
        Self {
            size: 0,
            usage: vk::BufferUsageFlags::STORAGE_BUFFER,
            initial_state: RhiResourceState::Undefined,
        }
    }
}

impl RhiBufferDesc {
    #[inline]
    pub fn new(size: vk::DeviceSize, usage: vk::BufferUsageFlags) -> Self {
        Self {
            size,
            usage,
            ..Default::default()
        }
    }

    #[inline]
    pub fn with_initial_state(mut self, state: RhiResourceState) -> Self {
        self.initial_state = state;
        self
    }
}

/// 着色器描述：源文件 + stage
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShaderDesc {
    pub path: String,
    pub stage: vk::ShaderStageFlags,
    pub entry_point: String,
}

impl ShaderDesc {
    pub fn new(path: impl Into<String>, stage: vk::ShaderStageFlags) -> Self {
        let entry_point = match stage {
            vk::ShaderStageFlags::VERTEX => "vs_main",
            vk::ShaderStageFlags::FRAGMENT => "ps_main",
            vk::ShaderStageFlags::COMPUTE => "cs_main",
            _ => "main",
        };
        Self {
            path: path.into(),
            stage,
            entry_point: entry_point.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    #[default]
    Back,
    Front,
}

/// 光栅化状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RasterizerState {
    pub cull_mode: CullMode,
    pub polygon_mode: vk::PolygonMode,
    pub front_face: vk::FrontFace,
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            polygon_mode: vk::PolygonMode::FILL,
            front_face: vk::FrontFace::COUNTER_CLOCKWISE,
        }
    }
}

/// 管线描述
///
/// `color_formats` 与 `depth_format` 一般不需要手动填写，
/// render graph 的 builder 会根据当前 pass 的 write 声明自动补全。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PipelineDesc {
    pub vertex_shader: Option<RhiShaderId>,
    pub fragment_shader: Option<RhiShaderId>,
    pub compute_shader: Option<RhiShaderId>,
    pub rasterizer: RasterizerState,
    pub depth_test: bool,
    pub depth_write: bool,
    pub topology: vk::PrimitiveTopology,
    pub color_formats: Vec<vk::Format>,
    pub depth_format: vk::Format,
}

impl Default for PipelineDesc {
    fn default() -> Self {
        Self {
            vertex_shader: None,
            fragment_shader: None,
            compute_shader: None,
            rasterizer: RasterizerState::default(),
            depth_test: true,
            depth_write: true,
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            color_formats: Vec::new(),
            depth_format: vk::Format::UNDEFINED,
        }
    }
}

impl PipelineDesc {
    #[inline]
    pub fn is_compute(&self) -> bool {
        self.compute_shader.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_2d_usage() {
        let color = RhiTextureDesc::new_2d(64, 64, vk::Format::R16G16B16A16_SFLOAT);
        assert!(color.usage.contains(vk::ImageUsageFlags::COLOR_ATTACHMENT));

        let depth = RhiTextureDesc::new_2d(64, 64, vk::Format::D32_SFLOAT);
        assert!(depth.usage.contains(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT));
        assert!(!depth.usage.contains(vk::ImageUsageFlags::COLOR_ATTACHMENT));
    }

    #[test]
    fn test_desc_hash_covers_fields() {
        let a = RhiTextureDesc::new_2d(64, 64, vk::Format::R8G8B8A8_UNORM);
        let b = a.clone().with_usage(vk::ImageUsageFlags::STORAGE);
        let c = a.clone().with_initial_state(RhiResourceState::ShaderResource);

        let set: HashSet<_> = [a.clone(), b, c, a].into_iter().collect();
        assert_eq!(set.len(), 3);
    }
}
