//! 帧驱动
//!
//! 每帧：clear → 声明 pass → compile → execute。
//! 编译失败的帧直接跳过，不会执行过期或不完整的调度。

use anyhow::Context;
use ash::vk;
use prism_render_graph::{RenderGraph, RgPassServices, RgPipelineCache, RgShaderLibrary};
use prism_rhi::headless::{HeadlessDevice, RecordingCommandList};
use prism_rhi::{RhiDevice, RhiTexture, RhiTextureDesc};
use std::sync::Arc;

use crate::config::PrismConfig;
use crate::passes::build_deferred_frame;

/// 单帧的统计信息
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub passes: usize,
    pub barriers: usize,
    pub commands: usize,
}

pub struct HeadlessApp {
    config: PrismConfig,

    device: HeadlessDevice,
    backbuffer: Arc<dyn RhiTexture>,

    graph: RenderGraph,
    pipelines: RgPipelineCache,
    shaders: RgShaderLibrary,

    frame_index: u64,
}

// new & init
impl HeadlessApp {
    pub fn new(config: PrismConfig) -> anyhow::Result<Self> {
        let extent = vk::Extent2D {
            width: config.app.width,
            height: config.app.height,
        };
        let device = HeadlessDevice::new(extent);
        let backbuffer = device
            .create_texture("Swapchain", &RhiTextureDesc::new_2d(extent.width, extent.height, vk::Format::B8G8R8A8_UNORM))
            .context("failed to create swapchain image")?;

        Ok(Self {
            graph: RenderGraph::new(config.graph.clone()),
            config,
            device,
            backbuffer,
            pipelines: RgPipelineCache::default(),
            shaders: RgShaderLibrary::default(),
            frame_index: 0,
        })
    }
}

// getters
impl HeadlessApp {
    #[inline]
    pub fn device(&self) -> &HeadlessDevice {
        &self.device
    }

    #[inline]
    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }
}

// 帧循环
impl HeadlessApp {
    /// 渲染配置中指定的帧数，返回每帧的统计；编译失败的帧为 None
    pub fn run(&mut self) -> anyhow::Result<Vec<Option<FrameStats>>> {
        let frames = self.config.app.frames;
        log::info!("start rendering {} frames ({}x{})", frames, self.config.app.width, self.config.app.height);

        let mut stats = Vec::with_capacity(frames as usize);
        for _ in 0..frames {
            stats.push(self.render_frame()?);
        }

        log::info!(
            "end run. textures: {}, buffers: {}, pipelines: {}, shaders: {}",
            self.device.texture_count(),
            self.device.buffer_count(),
            self.pipelines.len(),
            self.shaders.len()
        );
        Ok(stats)
    }

    pub fn render_frame(&mut self) -> anyhow::Result<Option<FrameStats>> {
        let frame_index = self.frame_index;
        self.frame_index += 1;

        self.graph.clear();
        let mut services = RgPassServices {
            device: &self.device,
            pipelines: &mut self.pipelines,
            shaders: &mut self.shaders,
        };
        build_deferred_frame(&mut self.graph, &mut services, self.backbuffer.clone(), 16)
            .with_context(|| format!("failed to build frame {}", frame_index))?;

        if let Err(err) = self.graph.compile() {
            log::error!("frame {}: compile failed, skip rendering: {}", frame_index, err);
            return Ok(None);
        }

        let mut cmd = RecordingCommandList::new();
        self.graph
            .execute(&mut cmd, &self.device)
            .with_context(|| format!("failed to execute frame {}", frame_index))?;

        let stats = FrameStats {
            passes: self.graph.pass_count(),
            barriers: cmd.barriers().len(),
            commands: cmd.commands().len(),
        };
        log::info!(
            "frame {}: [{}] {} barriers, {} commands",
            frame_index,
            self.graph.sorted_pass_names().join(" → "),
            stats.barriers,
            stats.commands
        );
        Ok(Some(stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_reuse_resources() {
        prism_crate_tools::init_log::init_test_log();
        let mut config = PrismConfig::default();
        config.app.frames = 3;
        config.app.width = 256;
        config.app.height = 128;

        let mut app = HeadlessApp::new(config).unwrap();
        let stats = app.run().unwrap();

        assert_eq!(stats.len(), 3);
        assert!(stats.iter().all(|s| *s == stats[0]));
        let first = stats[0].unwrap();
        assert_eq!(first.passes, 5);
        assert!(first.barriers > 0);

        // swapchain + albedo / normal / depth / hdr，只在第一帧创建
        assert_eq!(app.device().texture_count(), 5);
        assert_eq!(app.device().buffer_count(), 1);
        assert!(app.graph().is_compiled());
    }
}
