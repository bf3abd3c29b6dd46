use ash::vk;
use std::sync::Arc;

use crate::desc::{PipelineDesc, RhiBufferDesc, RhiTextureDesc, ShaderDesc};
use crate::error::RhiResult;
use crate::resource::{RhiBuffer, RhiPipeline, RhiShader, RhiTexture};

/// 设备工厂
///
/// render graph 只通过这个接口创建物理资源，从不直接接触原生 API。
pub trait RhiDevice {
    fn create_texture(&self, name: &str, desc: &RhiTextureDesc) -> RhiResult<Arc<dyn RhiTexture>>;

    fn create_buffer(&self, name: &str, desc: &RhiBufferDesc) -> RhiResult<Arc<dyn RhiBuffer>>;

    fn create_shader(&self, desc: &ShaderDesc) -> RhiResult<Arc<dyn RhiShader>>;

    fn create_pipeline(&self, desc: &PipelineDesc) -> RhiResult<Arc<dyn RhiPipeline>>;

    /// 当前 swapchain 的尺寸，pass 没有 attachment 时作为 render area
    fn swapchain_extent(&self) -> vk::Extent2D;
}
