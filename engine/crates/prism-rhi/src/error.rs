use thiserror::Error;

/// 后端错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RhiError {
    #[error("Failed to create texture '{0}': {1}")]
    TextureCreationFailed(String, String),
    #[error("Failed to create buffer '{0}': {1}")]
    BufferCreationFailed(String, String),
    #[error("Failed to create shader '{0}': {1}")]
    ShaderCreationFailed(String, String),
    #[error("Failed to create pipeline: {0}")]
    PipelineCreationFailed(String),
    #[error("Out of memory")]
    OutOfMemory,
}

pub type RhiResult<T> = Result<T, RhiError>;
