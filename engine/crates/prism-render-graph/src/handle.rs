//! RenderGraph 句柄定义
//!
//! 这些句柄是 graph 内部的虚拟引用，只在产生它们的那一代 graph 中有效，
//! `RenderGraph::clear()` 之后全部失效。

use std::fmt;

/// Graph 内部的资源句柄
///
/// 数值等于资源节点在 graph 中的下标，只增不减，同一代内不会复用。
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgResourceHandle {
    pub(crate) id: u16,
}

impl RgResourceHandle {
    /// 无效句柄
    pub const INVALID: Self = Self { id: u16::MAX };

    #[inline]
    pub(crate) fn new(id: u16) -> Self {
        Self { id }
    }

    /// 获取资源 ID
    #[inline]
    pub fn id(&self) -> u16 {
        self.id
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.id as usize
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.id != u16::MAX
    }
}

impl Default for RgResourceHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for RgResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() { write!(f, "RgRes({})", self.id) } else { write!(f, "RgRes(invalid)") }
    }
}

/// Pass 句柄，等于 pass 的声明顺序
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RgPassHandle {
    pub(crate) id: u32,
}

impl RgPassHandle {
    #[inline]
    pub(crate) fn new(id: u32) -> Self {
        Self { id }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.id as usize
    }
}

impl fmt::Debug for RgPassHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RgPass({})", self.id)
    }
}

slotmap::new_key_type! {
    /// pass 私有数据在 `RgPassArena` 中的句柄，带有代际标记
    pub struct RgPassDataHandle;
}
