//! 资源状态定义
//!
//! render graph 在编译阶段只跟踪抽象的 `RhiResourceState`，
//! 真正录制 barrier 时再映射为 Vulkan 的 stage / access / layout。

use ash::vk;
use std::fmt;

/// GPU 资源当前的使用方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RhiResourceState {
    /// 初始状态，或者内容可以丢弃
    #[default]
    Undefined,
    /// 顶点缓冲区 / uniform 缓冲区
    VertexAndConstantBuffer,
    /// 索引缓冲区
    IndexBuffer,
    /// 颜色附件写入
    RenderTarget,
    /// 计算着色器读写（storage image / storage buffer）
    UnorderedAccess,
    /// 深度模板附件读写
    DepthStencilWrite,
    /// 深度模板只读
    DepthStencilRead,
    /// 着色器只读采样
    ShaderResource,
    /// 拷贝源
    CopySource,
    /// 拷贝目标
    CopyDest,
    /// 交给 swapchain 呈现
    Present,
}

impl RhiResourceState {
    /// 是否为只读状态
    #[inline]
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            Self::VertexAndConstantBuffer
                | Self::IndexBuffer
                | Self::DepthStencilRead
                | Self::ShaderResource
                | Self::CopySource
                | Self::Present
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Undefined => "Undefined",
            Self::VertexAndConstantBuffer => "VertexAndConstantBuffer",
            Self::IndexBuffer => "IndexBuffer",
            Self::RenderTarget => "RenderTarget",
            Self::UnorderedAccess => "UnorderedAccess",
            Self::DepthStencilWrite => "DepthStencilWrite",
            Self::DepthStencilRead => "DepthStencilRead",
            Self::ShaderResource => "ShaderResource",
            Self::CopySource => "CopySource",
            Self::CopyDest => "CopyDest",
            Self::Present => "Present",
        }
    }
}

impl fmt::Display for RhiResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 某个状态对应的 Vulkan 同步信息
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VkStateInfo {
    pub stage: vk::PipelineStageFlags2,
    pub access: vk::AccessFlags2,
    pub layout: vk::ImageLayout,
}

impl VkStateInfo {
    #[inline]
    const fn new(stage: vk::PipelineStageFlags2, access: vk::AccessFlags2, layout: vk::ImageLayout) -> Self {
        Self { stage, access, layout }
    }
}

// vulkan 映射
impl RhiResourceState {
    const FRAGMENT_TESTS: vk::PipelineStageFlags2 = vk::PipelineStageFlags2::from_raw(
        vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS.as_raw() | vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS.as_raw(),
    );

    const SHADER_STAGES: vk::PipelineStageFlags2 = vk::PipelineStageFlags2::from_raw(
        vk::PipelineStageFlags2::FRAGMENT_SHADER.as_raw() | vk::PipelineStageFlags2::COMPUTE_SHADER.as_raw(),
    );

    /// 映射为 Vulkan 的 stage / access / layout
    pub fn vk_info(self) -> VkStateInfo {
        match self {
            Self::Undefined => VkStateInfo::new(
                vk::PipelineStageFlags2::TOP_OF_PIPE,
                vk::AccessFlags2::NONE,
                vk::ImageLayout::UNDEFINED,
            ),
            Self::VertexAndConstantBuffer => VkStateInfo::new(
                vk::PipelineStageFlags2::from_raw(
                    vk::PipelineStageFlags2::VERTEX_INPUT.as_raw() | Self::SHADER_STAGES.as_raw(),
                ),
                vk::AccessFlags2::from_raw(
                    vk::AccessFlags2::VERTEX_ATTRIBUTE_READ.as_raw() | vk::AccessFlags2::UNIFORM_READ.as_raw(),
                ),
                vk::ImageLayout::UNDEFINED,
            ),
            Self::IndexBuffer => VkStateInfo::new(
                vk::PipelineStageFlags2::INDEX_INPUT,
                vk::AccessFlags2::INDEX_READ,
                vk::ImageLayout::UNDEFINED,
            ),
            Self::RenderTarget => VkStateInfo::new(
                vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                vk::AccessFlags2::from_raw(
                    vk::AccessFlags2::COLOR_ATTACHMENT_READ.as_raw() | vk::AccessFlags2::COLOR_ATTACHMENT_WRITE.as_raw(),
                ),
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            ),
            Self::UnorderedAccess => VkStateInfo::new(
                vk::PipelineStageFlags2::COMPUTE_SHADER,
                vk::AccessFlags2::from_raw(
                    vk::AccessFlags2::SHADER_STORAGE_READ.as_raw() | vk::AccessFlags2::SHADER_STORAGE_WRITE.as_raw(),
                ),
                vk::ImageLayout::GENERAL,
            ),
            Self::DepthStencilWrite => VkStateInfo::new(
                Self::FRAGMENT_TESTS,
                vk::AccessFlags2::from_raw(
                    vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ.as_raw()
                        | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE.as_raw(),
                ),
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            ),
            Self::DepthStencilRead => VkStateInfo::new(
                Self::FRAGMENT_TESTS,
                vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ,
                vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
            ),
            Self::ShaderResource => VkStateInfo::new(
                Self::SHADER_STAGES,
                vk::AccessFlags2::SHADER_SAMPLED_READ,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            ),
            Self::CopySource => VkStateInfo::new(
                vk::PipelineStageFlags2::TRANSFER,
                vk::AccessFlags2::TRANSFER_READ,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            ),
            Self::CopyDest => VkStateInfo::new(
                vk::PipelineStageFlags2::TRANSFER,
                vk::AccessFlags2::TRANSFER_WRITE,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            ),
            Self::Present => VkStateInfo::new(
                vk::PipelineStageFlags2::BOTTOM_OF_PIPE,
                vk::AccessFlags2::NONE,
                vk::ImageLayout::PRESENT_SRC_KHR,
            ),
        }
    }

    /// 用于 barrier src 的 access（去掉读操作，读操作不需要 make available）
    #[inline]
    pub fn src_access(self) -> vk::AccessFlags2 {
        self.vk_info().access
            & !(vk::AccessFlags2::SHADER_SAMPLED_READ
                | vk::AccessFlags2::SHADER_STORAGE_READ
                | vk::AccessFlags2::TRANSFER_READ
                | vk::AccessFlags2::COLOR_ATTACHMENT_READ
                | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ
                | vk::AccessFlags2::VERTEX_ATTRIBUTE_READ
                | vk::AccessFlags2::UNIFORM_READ
                | vk::AccessFlags2::INDEX_READ)
    }
}
