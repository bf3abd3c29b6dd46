use prism_rhi::RhiError;
use thiserror::Error;

use crate::handle::RgResourceHandle;

/// Render graph 错误
///
/// - 查找类错误：`InvalidHandle`、`ResourceNotFound`
/// - 结构性错误：`CyclicDependency`、`MultipleWriters`，编译失败，本帧不能执行
/// - 溢出错误：`ArenaExhausted`，需要调大 `pass_arena_bytes`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RgError {
    #[error("Invalid resource handle: {0:?}")]
    InvalidHandle(RgResourceHandle),
    #[error("Resource not found: '{0}'")]
    ResourceNotFound(String),
    #[error("Cycle detected involving passes: {passes:?}")]
    CyclicDependency { passes: Vec<String> },
    #[error("Resource '{resource}' is written by both '{first}' and '{second}'")]
    MultipleWriters {
        resource: String,
        first: String,
        second: String,
    },
    #[error("Pass arena exhausted: requested {requested} bytes, {used}/{capacity} bytes in use")]
    ArenaExhausted {
        requested: usize,
        used: usize,
        capacity: usize,
    },
    #[error("Render graph is not compiled")]
    NotCompiled,
    #[error("Resource '{0}' has no physical resource")]
    UnrealizedResource(String),
    #[error("Pass '{0}' was added without pipeline / shader services")]
    NoServices(String),
    #[error(transparent)]
    Rhi(#[from] RhiError),
}

pub type RgResult<T> = Result<T, RgError>;
