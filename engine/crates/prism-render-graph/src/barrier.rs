//! Barrier 描述
//!
//! 编译阶段只记录抽象状态的转换，录制时由后端映射为具体的 stage / access / layout。

use prism_rhi::RhiResourceState;

use crate::handle::RgResourceHandle;

/// 资源状态转换
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RgBarrier {
    /// 资源句柄
    pub resource: RgResourceHandle,
    /// 源状态
    pub before: RhiResourceState,
    /// 目标状态
    pub after: RhiResourceState,
}

impl RgBarrier {
    pub fn new(resource: RgResourceHandle, before: RhiResourceState, after: RhiResourceState) -> Self {
        Self {
            resource,
            before,
            after,
        }
    }

    /// 写入到写入之间也需要 barrier 保证可见性，这里只判断状态是否变化
    #[inline]
    pub fn is_transition(&self) -> bool {
        self.before != self.after
    }
}

/// 资源被 pass 读取时的目标状态
pub const READ_STATE: RhiResourceState = RhiResourceState::ShaderResource;
