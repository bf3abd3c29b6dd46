//! 延迟渲染帧的 pass 定义
//!
//! GBuffer → Lighting → Luminance（compute）→ Tonemap → UI

use ash::vk;
use prism_render_graph::{
    RenderGraph, RgAttachmentInfo, RgPassBuilder, RgPassContext, RgPassServices, RgResourceHandle, RgResult,
};
use prism_rhi::{PipelineDesc, RhiBufferDesc, RhiPipeline, RhiResourceState, RhiShader, RhiTexture, RhiTextureDesc};
use std::sync::Arc;

pub const ALBEDO: &str = "GBuffer.Albedo";
pub const NORMAL: &str = "GBuffer.Normal";
pub const DEPTH: &str = "GBuffer.Depth";
pub const HDR: &str = "Lighting.HDR";
pub const HISTOGRAM: &str = "Luminance.Histogram";

const HISTOGRAM_BINS: u64 = 256;

/// 在 setup 中加载 shader 并创建 pipeline；失败时记录日志，pass 执行时跳过绘制
fn graphics_pipeline(builder: &mut RgPassBuilder<'_>, path: &str, depth_test: bool) -> Option<Arc<dyn RhiPipeline>> {
    let pipeline = (|| -> RgResult<Arc<dyn RhiPipeline>> {
        let vs = builder.load_shader(path, vk::ShaderStageFlags::VERTEX)?;
        let ps = builder.load_shader(path, vk::ShaderStageFlags::FRAGMENT)?;
        builder.create_pipeline(PipelineDesc {
            vertex_shader: Some(vs.id()),
            fragment_shader: Some(ps.id()),
            depth_test,
            depth_write: depth_test,
            ..Default::default()
        })
    })();

    pipeline
        .inspect_err(|err| log::error!("pass '{}': failed to create pipeline: {}", builder.pass_name(), err))
        .ok()
}

fn compute_pipeline(builder: &mut RgPassBuilder<'_>, path: &str) -> Option<Arc<dyn RhiPipeline>> {
    let pipeline = (|| -> RgResult<Arc<dyn RhiPipeline>> {
        let cs = builder.load_shader(path, vk::ShaderStageFlags::COMPUTE)?;
        builder.create_pipeline(PipelineDesc {
            compute_shader: Some(cs.id()),
            ..Default::default()
        })
    })();

    pipeline
        .inspect_err(|err| log::error!("pass '{}': failed to create pipeline: {}", builder.pass_name(), err))
        .ok()
}

fn bind(ctx: &mut RgPassContext<'_>, pipeline: &Option<Arc<dyn RhiPipeline>>) -> bool {
    match pipeline {
        Some(pipeline) => {
            ctx.cmd.bind_pipeline(pipeline.as_ref());
            true
        }
        None => false,
    }
}

#[derive(Default)]
struct GBufferData {
    pipeline: Option<Arc<dyn RhiPipeline>>,
    instance_count: u32,
}

#[derive(Default)]
struct FullscreenData {
    pipeline: Option<Arc<dyn RhiPipeline>>,
}

#[derive(Default)]
struct LuminanceData {
    pipeline: Option<Arc<dyn RhiPipeline>>,
    hdr: RgResourceHandle,
}

/// 构建一帧
///
/// 返回导入的 backbuffer 句柄。
pub fn build_deferred_frame(
    graph: &mut RenderGraph,
    services: &mut RgPassServices<'_>,
    backbuffer: Arc<dyn RhiTexture>,
    instance_count: u32,
) -> RgResult<RgResourceHandle> {
    let extent = vk::Extent2D {
        width: backbuffer.width(),
        height: backbuffer.height(),
    };
    let output = graph.import_texture("Backbuffer", backbuffer, RhiResourceState::Undefined);
    let texture_desc = |format: vk::Format| RhiTextureDesc::new_2d(extent.width, extent.height, format);

    graph.add_pass_with_services(
        "GBuffer",
        services,
        |b, data: &mut GBufferData| {
            let albedo = b.create_texture(ALBEDO, texture_desc(vk::Format::R8G8B8A8_SRGB));
            let normal = b.create_texture(NORMAL, texture_desc(vk::Format::R16G16B16A16_SFLOAT));
            let depth = b.create_texture(DEPTH, texture_desc(vk::Format::D32_SFLOAT));
            b.write_attachment(RgAttachmentInfo::new(albedo).clear(glam::Vec4::new(0.0, 0.0, 0.0, 1.0)));
            b.write_attachment(RgAttachmentInfo::new(normal).dont_care());
            b.write_attachment(RgAttachmentInfo::new(depth).clear_depth(1.0));

            data.pipeline = graphics_pipeline(b, "shader/gbuffer.slang", true);
            data.instance_count = instance_count;
        },
        |ctx, data| {
            if bind(ctx, &data.pipeline) {
                ctx.cmd.draw(36, data.instance_count, 0, 0);
            }
        },
    )?;

    graph.add_pass_with_services(
        "Lighting",
        services,
        |b, data: &mut FullscreenData| {
            for name in [ALBEDO, NORMAL, DEPTH] {
                if let Ok(handle) = b.get_resource(name) {
                    b.read(handle);
                }
            }
            let hdr = b.create_texture(HDR, texture_desc(vk::Format::R16G16B16A16_SFLOAT));
            b.write(hdr);
            data.pipeline = graphics_pipeline(b, "shader/lighting.slang", false);
        },
        |ctx, data| {
            if bind(ctx, &data.pipeline) {
                ctx.cmd.draw(3, 1, 0, 0);
            }
        },
    )?;

    graph.add_pass_with_services(
        "Luminance",
        services,
        |b, data: &mut LuminanceData| {
            if let Ok(hdr) = b.get_resource(HDR) {
                data.hdr = b.read(hdr);
            }
            let histogram = b.create_buffer(
                HISTOGRAM,
                RhiBufferDesc::new(HISTOGRAM_BINS * 4, vk::BufferUsageFlags::STORAGE_BUFFER),
            );
            b.write(histogram);
            data.pipeline = compute_pipeline(b, "shader/luminance.slang");
        },
        |ctx, data| {
            let Some(hdr) = ctx.texture(data.hdr) else {
                return;
            };
            let groups_x = hdr.width().div_ceil(16);
            let groups_y = hdr.height().div_ceil(16);
            if bind(ctx, &data.pipeline) {
                ctx.cmd.dispatch(groups_x, groups_y, 1);
            }
        },
    )?;

    graph.add_pass_with_services(
        "Tonemap",
        services,
        |b, data: &mut FullscreenData| {
            for name in [HDR, HISTOGRAM] {
                if let Ok(handle) = b.get_resource(name) {
                    b.read(handle);
                }
            }
            b.write_attachment(RgAttachmentInfo::new(output).dont_care());
            data.pipeline = graphics_pipeline(b, "shader/tonemap.slang", false);
        },
        |ctx, data| {
            if bind(ctx, &data.pipeline) {
                ctx.cmd.draw(3, 1, 0, 0);
            }
        },
    )?;

    // UI 叠加在 tonemap 的结果上，必须在 tonemap 之后声明
    graph.add_pass_with_services(
        "UI",
        services,
        |b, data: &mut FullscreenData| {
            b.read_write(output);
            data.pipeline = graphics_pipeline(b, "shader/ui.slang", false);
        },
        |ctx, data| {
            if bind(ctx, &data.pipeline) {
                ctx.cmd.draw(6, 4, 0, 0);
            }
        },
    )?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_render_graph::{RgPipelineCache, RgShaderLibrary};
    use prism_rhi::RhiDevice;
    use prism_rhi::headless::{HeadlessDevice, RecordingCommandList};

    #[test]
    fn test_deferred_frame_order() {
        let device = HeadlessDevice::default();
        let mut pipelines = RgPipelineCache::default();
        let mut shaders = RgShaderLibrary::default();
        let mut graph = RenderGraph::default();
        let backbuffer = device
            .create_texture("Swapchain", &RhiTextureDesc::new_2d(320, 240, vk::Format::B8G8R8A8_UNORM))
            .unwrap();

        let mut services = RgPassServices {
            device: &device,
            pipelines: &mut pipelines,
            shaders: &mut shaders,
        };
        build_deferred_frame(&mut graph, &mut services, backbuffer, 4).unwrap();
        graph.compile().unwrap();

        assert_eq!(graph.sorted_pass_names(), vec!["GBuffer", "Lighting", "Luminance", "Tonemap", "UI"]);

        let mut cmd = RecordingCommandList::new();
        graph.execute(&mut cmd, &device).unwrap();
        assert_eq!(cmd.labels(), vec!["GBuffer", "Lighting", "Luminance", "Tonemap", "UI"]);
        // tonemap 之后 backbuffer 已经是 RenderTarget，UI 不需要 barrier
        let swapchain = cmd.barriers().into_iter().filter(|(name, _, _)| *name == "Swapchain").collect::<Vec<_>>();
        assert_eq!(swapchain, vec![("Swapchain", RhiResourceState::Undefined, RhiResourceState::RenderTarget)]);
        // gbuffer / lighting / tonemap / ui 共享 vs+ps，luminance 只有 cs
        assert_eq!(pipelines.len(), 5);
        assert_eq!(shaders.len(), 9);
    }
}
