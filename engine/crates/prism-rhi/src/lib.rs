//! Render graph 与后端之间的边界
//!
//! 这里只定义 render graph 需要的协作者接口：
//!
//! - **RhiDevice**: 设备工厂，创建 texture / buffer / shader / pipeline
//! - **RhiCommandList**: 命令录制器，barrier、dynamic rendering、draw / dispatch
//! - **RhiResourceState**: 资源状态，render graph 依据它自动生成 barrier
//! - **描述符**: `RhiTextureDesc`、`RhiBufferDesc`、`PipelineDesc`、`ShaderDesc`
//!
//! `headless` 模块提供不依赖 GPU 的实现，会把所有命令记录下来，
//! 用于测试以及无窗口运行。

pub mod barrier;
pub mod command_list;
pub mod desc;
pub mod device;
pub mod error;
pub mod format;
pub mod headless;
pub mod resource;
pub mod resource_state;

pub use command_list::{RenderingAttachment, RenderingInfo, RhiCommandList};
pub use desc::{CullMode, PipelineDesc, RasterizerState, RhiBufferDesc, RhiTextureDesc, ShaderDesc};
pub use device::RhiDevice;
pub use error::{RhiError, RhiResult};
pub use resource::{RhiBuffer, RhiPipeline, RhiPipelineId, RhiResourceRef, RhiShader, RhiShaderId, RhiTexture};
pub use resource_state::RhiResourceState;
