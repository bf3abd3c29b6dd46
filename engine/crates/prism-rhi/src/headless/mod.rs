//! 不依赖 GPU 的后端
//!
//! `HeadlessDevice` 只分配描述符和 ID，`RecordingCommandList` 把所有命令按顺序记录下来，
//! 可以在测试中直接断言 render graph 录制出来的命令流。

mod command_list;
mod device;

pub use command_list::{RecordedCommand, RecordingCommandList};
pub use device::{HeadlessBuffer, HeadlessDevice, HeadlessPipeline, HeadlessShader, HeadlessTexture};
