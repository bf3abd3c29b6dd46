use ash::vk;
use std::sync::Arc;

use crate::resource::{RhiPipeline, RhiResourceRef, RhiTexture};
use crate::resource_state::RhiResourceState;

/// dynamic rendering 的单个附件
#[derive(Clone, Debug)]
pub struct RenderingAttachment {
    pub texture: Arc<dyn RhiTexture>,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub clear_color: glam::Vec4,
    pub clear_depth: f32,
    pub clear_stencil: u32,
}

/// `begin_rendering` 的参数
#[derive(Clone, Debug, Default)]
pub struct RenderingInfo {
    pub render_area: vk::Extent2D,
    pub color_attachments: Vec<RenderingAttachment>,
    pub depth_attachment: Option<RenderingAttachment>,
}

impl RenderingInfo {
    #[inline]
    pub fn has_attachments(&self) -> bool {
        !self.color_attachments.is_empty() || self.depth_attachment.is_some()
    }
}

/// 命令录制器
///
/// 具体的录制格式由后端决定，render graph 只依赖下面这些操作。
pub trait RhiCommandList {
    fn pipeline_barrier(&mut self, resource: RhiResourceRef<'_>, before: RhiResourceState, after: RhiResourceState);

    fn begin_rendering(&mut self, info: &RenderingInfo);

    fn end_rendering(&mut self);

    fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32);

    fn set_scissor(&mut self, x: i32, y: i32, width: u32, height: u32);

    fn bind_pipeline(&mut self, pipeline: &dyn RhiPipeline);

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32);

    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32);

    fn begin_label(&mut self, label: &str, color: glam::Vec4);

    fn end_label(&mut self);
}
