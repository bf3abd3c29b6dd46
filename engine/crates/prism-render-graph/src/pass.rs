//! Pass 节点与执行上下文
//!
//! pass 的执行回调不捕获任何东西：它是一个普通函数指针，
//! 加上 arena 中的一份 pass 数据句柄。

use ash::vk;
use prism_rhi::{RhiBuffer, RhiCommandList, RhiTexture};
use std::any::Any;
use std::sync::Arc;

use crate::barrier::RgBarrier;
use crate::error::RgError;
use crate::handle::{RgPassDataHandle, RgResourceHandle};
use crate::registry::RgRegistry;

/// 写入声明：句柄 + load/store 操作 + 清除值
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RgAttachmentInfo {
    pub handle: RgResourceHandle,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub clear_color: glam::Vec4,
    pub clear_depth: f32,
    pub clear_stencil: u32,
}

impl RgAttachmentInfo {
    /// 默认清除为 0（深度清除为 1.0）并保存结果
    pub fn new(handle: RgResourceHandle) -> Self {
        Self {
            handle,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
            clear_color: glam::Vec4::ZERO,
            clear_depth: 1.0,
            clear_stencil: 0,
        }
    }

    /// builder
    #[inline]
    pub fn clear(mut self, color: glam::Vec4) -> Self {
        self.load_op = vk::AttachmentLoadOp::CLEAR;
        self.clear_color = color;
        self
    }

    /// builder：保留之前的内容
    #[inline]
    pub fn load(mut self) -> Self {
        self.load_op = vk::AttachmentLoadOp::LOAD;
        self
    }

    /// builder：不关心之前的内容
    #[inline]
    pub fn dont_care(mut self) -> Self {
        self.load_op = vk::AttachmentLoadOp::DONT_CARE;
        self
    }

    /// builder
    #[inline]
    pub fn clear_depth(mut self, depth: f32) -> Self {
        self.load_op = vk::AttachmentLoadOp::CLEAR;
        self.clear_depth = depth;
        self
    }

    /// builder
    #[inline]
    pub fn clear_stencil(mut self, stencil: u32) -> Self {
        self.clear_stencil = stencil;
        self
    }

    /// builder
    #[inline]
    pub fn store_op(mut self, store_op: vk::AttachmentStoreOp) -> Self {
        self.store_op = store_op;
        self
    }
}

impl From<RgResourceHandle> for RgAttachmentInfo {
    fn from(handle: RgResourceHandle) -> Self {
        Self::new(handle)
    }
}

/// Pass 执行时的上下文
///
/// 提供命令录制器以及 handle → 物理资源 的查询。
pub struct RgPassContext<'a> {
    /// 命令录制器
    pub cmd: &'a mut dyn RhiCommandList,

    /// 本 pass 的 render area；没有写入纹理时为 swapchain 尺寸
    pub render_area: vk::Extent2D,

    pub(crate) registry: &'a RgRegistry,
    pub(crate) pass_name: &'a str,
}

impl<'a> RgPassContext<'a> {
    /// 获取纹理的物理资源
    #[inline]
    pub fn texture(&self, handle: RgResourceHandle) -> Option<&'a Arc<dyn RhiTexture>> {
        self.registry.texture(handle)
    }

    /// 获取缓冲区的物理资源
    #[inline]
    pub fn buffer(&self, handle: RgResourceHandle) -> Option<&'a Arc<dyn RhiBuffer>> {
        self.registry.buffer(handle)
    }

    #[inline]
    pub fn pass_name(&self) -> &str {
        self.pass_name
    }
}

/// 用户提供的执行函数
///
/// 不捕获环境的闭包可以直接转换为该类型。
pub type RgExecuteFn<T> = fn(&mut RgPassContext<'_>, &T);

/// arena 中实际保存的内容：pass 数据与它的执行函数
pub(crate) struct RgPassSlot<T> {
    pub data: T,
    pub execute: RgExecuteFn<T>,
}

/// 类型擦除后的执行入口
#[derive(Clone, Copy)]
pub(crate) struct RgPassExecutor {
    pub data: RgPassDataHandle,
    pub invoke: fn(&mut RgPassContext<'_>, &(dyn Any + 'static)),
}

impl RgPassExecutor {
    pub fn new<T: 'static>(data: RgPassDataHandle) -> Self {
        Self {
            data,
            invoke: invoke_slot::<T>,
        }
    }
}

fn invoke_slot<T: 'static>(ctx: &mut RgPassContext<'_>, slot: &(dyn Any + 'static)) {
    match slot.downcast_ref::<RgPassSlot<T>>() {
        Some(slot) => (slot.execute)(ctx, &slot.data),
        None => log::error!("RenderGraph: pass '{}' has mismatched pass data", ctx.pass_name),
    }
}

/// Pass 节点
pub struct RgPassNode {
    /// Pass 名称
    pub name: String,

    /// 读取列表（按声明顺序）
    pub reads: Vec<RgResourceHandle>,
    /// 写入列表（按声明顺序）
    pub writes: Vec<RgAttachmentInfo>,

    /// 编译后计算出的 barrier，每个资源至多一个
    pub barriers: Vec<RgBarrier>,

    /// setup 阶段遇到的查找错误
    pub diagnostics: Vec<RgError>,

    pub(crate) executor: RgPassExecutor,
}

impl RgPassNode {
    #[inline]
    pub fn has_writes(&self) -> bool {
        !self.writes.is_empty()
    }

    #[inline]
    pub fn reads_resource(&self, handle: RgResourceHandle) -> bool {
        self.reads.contains(&handle)
    }

    #[inline]
    pub fn writes_resource(&self, handle: RgResourceHandle) -> bool {
        self.writes.iter().any(|w| w.handle == handle)
    }

    /// 读写过的所有资源，读在前写在后，可能重复
    pub fn touched_resources(&self) -> impl Iterator<Item = RgResourceHandle> + '_ {
        self.reads.iter().copied().chain(self.writes.iter().map(|w| w.handle))
    }
}
