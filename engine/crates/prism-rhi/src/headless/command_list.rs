use ash::vk;

use crate::barrier::RhiImageBarrier;
use crate::command_list::{RenderingInfo, RhiCommandList};
use crate::resource::{RhiPipeline, RhiPipelineId, RhiResourceRef};
use crate::resource_state::RhiResourceState;

/// 被记录下来的一条命令
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedCommand {
    Barrier {
        resource: String,
        before: RhiResourceState,
        after: RhiResourceState,
        /// 只有 image barrier 才有 layout 转换
        layouts: Option<(vk::ImageLayout, vk::ImageLayout)>,
    },
    BeginRendering {
        render_area: vk::Extent2D,
        color_attachments: Vec<String>,
        depth_attachment: Option<String>,
    },
    EndRendering,
    SetViewport {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    SetScissor {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    BindPipeline(RhiPipelineId),
    Draw {
        vertex_count: u32,
        instance_count: u32,
    },
    Dispatch {
        x: u32,
        y: u32,
        z: u32,
    },
    BeginLabel(String),
    EndLabel,
}

/// 把命令记录到内存里的 command list
#[derive(Debug, Default)]
pub struct RecordingCommandList {
    commands: Vec<RecordedCommand>,
}

impl RecordingCommandList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// 取出所有命令，并清空记录
    pub fn take_commands(&mut self) -> Vec<RecordedCommand> {
        std::mem::take(&mut self.commands)
    }

    /// 只保留 barrier 命令，形式为 (资源名, before, after)
    pub fn barriers(&self) -> Vec<(&str, RhiResourceState, RhiResourceState)> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                RecordedCommand::Barrier {
                    resource,
                    before,
                    after,
                    ..
                } => Some((resource.as_str(), *before, *after)),
                _ => None,
            })
            .collect()
    }

    /// 所有 debug label 的名称，按录制顺序
    pub fn labels(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                RecordedCommand::BeginLabel(label) => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RhiCommandList for RecordingCommandList {
    fn pipeline_barrier(&mut self, resource: RhiResourceRef<'_>, before: RhiResourceState, after: RhiResourceState) {
        let layouts = match resource {
            RhiResourceRef::Texture(texture) => {
                let barrier = RhiImageBarrier::transition(before, after, texture.format()).image(texture.vk_image());
                Some((barrier.inner().old_layout, barrier.inner().new_layout))
            }
            RhiResourceRef::Buffer(_) => None,
        };
        self.commands.push(RecordedCommand::Barrier {
            resource: resource.name().to_string(),
            before,
            after,
            layouts,
        });
    }

    fn begin_rendering(&mut self, info: &RenderingInfo) {
        self.commands.push(RecordedCommand::BeginRendering {
            render_area: info.render_area,
            color_attachments: info.color_attachments.iter().map(|a| a.texture.name().to_string()).collect(),
            depth_attachment: info.depth_attachment.as_ref().map(|a| a.texture.name().to_string()),
        });
    }

    fn end_rendering(&mut self) {
        self.commands.push(RecordedCommand::EndRendering);
    }

    fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.commands.push(RecordedCommand::SetViewport { x, y, width, height });
    }

    fn set_scissor(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.commands.push(RecordedCommand::SetScissor { x, y, width, height });
    }

    fn bind_pipeline(&mut self, pipeline: &dyn RhiPipeline) {
        self.commands.push(RecordedCommand::BindPipeline(pipeline.id()));
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, _first_vertex: u32, _first_instance: u32) {
        self.commands.push(RecordedCommand::Draw {
            vertex_count,
            instance_count,
        });
    }

    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
        self.commands.push(RecordedCommand::Dispatch {
            x: group_count_x,
            y: group_count_y,
            z: group_count_z,
        });
    }

    fn begin_label(&mut self, label: &str, _color: glam::Vec4) {
        self.commands.push(RecordedCommand::BeginLabel(label.to_string()));
    }

    fn end_label(&mut self) {
        self.commands.push(RecordedCommand::EndLabel);
    }
}
