//! RenderGraph 执行
//!
//! 按排序后的顺序：创建临时资源 → 录制 barrier → 打开 rendering scope → 调用 pass。

use ash::vk;
use prism_rhi::format::is_depth_format;
use prism_rhi::{RenderingAttachment, RenderingInfo, RhiCommandList, RhiDevice};

use crate::error::{RgError, RgResult};
use crate::graph::RenderGraph;
use crate::pass::{RgPassContext, RgPassNode};
use crate::resource::{RgPhysicalResource, RgResourceDesc};

/// pass debug label 的颜色
const PASS_LABEL_COLOR: glam::Vec4 = glam::Vec4::new(0.30, 0.60, 0.90, 1.0);

impl RenderGraph {
    /// 执行渲染图
    ///
    /// # 参数
    /// - `cmd`: 命令录制器（已经 begin）
    /// - `device`: 设备工厂，用于创建尚未缓存的临时资源
    ///
    /// 未编译（或编译失败）的 graph 返回 `RgError::NotCompiled`。
    pub fn execute(&mut self, cmd: &mut dyn RhiCommandList, device: &dyn RhiDevice) -> RgResult<()> {
        profile_scope!("RenderGraph::execute");
        if !self.compiled {
            return Err(RgError::NotCompiled);
        }

        self.realize_resources(device)?;

        for pass_handle in &self.execution_order {
            let pass = &self.passes[pass_handle.index()];

            cmd.begin_label(&pass.name, PASS_LABEL_COLOR);
            let result = self.execute_pass(cmd, device, pass);
            cmd.end_label();
            result?;
        }
        Ok(())
    }

    /// 把所有资源登记到 registry：导入的资源直接登记，被使用的临时资源从 cache 获取
    fn realize_resources(&mut self, device: &dyn RhiDevice) -> RgResult<()> {
        self.registry.clear();

        for node in self.resources.iter() {
            match (&node.imported, &node.desc) {
                (Some(RgPhysicalResource::Texture(texture)), _) => {
                    self.registry.import_texture(node.handle, texture.clone());
                }
                (Some(RgPhysicalResource::Buffer(buffer)), _) => {
                    self.registry.import_buffer(node.handle, buffer.clone());
                }
                (None, _) if !node.lifetime.is_touched() => {
                    log::debug!("RenderGraph: resource '{}' is never used, skip creation", node.name);
                }
                (None, RgResourceDesc::Texture(desc)) => {
                    let texture = self.cache.get_or_create_texture(device, &node.name, desc)?;
                    self.registry.register_texture(node.handle, texture);
                }
                (None, RgResourceDesc::Buffer(desc)) => {
                    let buffer = self.cache.get_or_create_buffer(device, &node.name, desc)?;
                    self.registry.register_buffer(node.handle, buffer);
                }
            }
        }
        Ok(())
    }

    fn execute_pass(&self, cmd: &mut dyn RhiCommandList, device: &dyn RhiDevice, pass: &RgPassNode) -> RgResult<()> {
        for barrier in &pass.barriers {
            let resource = self
                .registry
                .resource(barrier.resource)
                .ok_or_else(|| RgError::UnrealizedResource(self.resources.name_of(barrier.resource).to_string()))?;
            cmd.pipeline_barrier(resource, barrier.before, barrier.after);
        }

        let rendering = self.rendering_info(pass, device);
        if rendering.has_attachments() {
            let extent = rendering.render_area;
            cmd.begin_rendering(&rendering);
            cmd.set_viewport(0.0, 0.0, extent.width as f32, extent.height as f32);
            cmd.set_scissor(0, 0, extent.width, extent.height);
            self.invoke_pass(cmd, pass, extent);
            cmd.end_rendering();
        } else {
            self.invoke_pass(cmd, pass, rendering.render_area);
        }
        Ok(())
    }

    /// 根据写入声明构建 rendering info
    ///
    /// render area 取第一个写入的纹理的尺寸，没有写入纹理时取 swapchain 尺寸；
    /// 深度格式的纹理作为深度附件，其余作为颜色附件，缓冲区写入不产生附件。
    fn rendering_info(&self, pass: &RgPassNode, device: &dyn RhiDevice) -> RenderingInfo {
        let mut info = RenderingInfo {
            render_area: device.swapchain_extent(),
            ..Default::default()
        };

        let mut area_found = false;
        for write in &pass.writes {
            let Some(texture) = self.registry.texture(write.handle) else {
                continue;
            };
            if !area_found {
                info.render_area = vk::Extent2D {
                    width: texture.width(),
                    height: texture.height(),
                };
                area_found = true;
            }

            let attachment = RenderingAttachment {
                texture: texture.clone(),
                load_op: write.load_op,
                store_op: write.store_op,
                clear_color: write.clear_color,
                clear_depth: write.clear_depth,
                clear_stencil: write.clear_stencil,
            };
            if is_depth_format(texture.format()) {
                if info.depth_attachment.is_some() {
                    log::warn!("RenderGraph: pass '{}' has more than one depth attachment", pass.name);
                }
                info.depth_attachment = Some(attachment);
            } else {
                info.color_attachments.push(attachment);
            }
        }
        info
    }

    fn invoke_pass(&self, cmd: &mut dyn RhiCommandList, pass: &RgPassNode, render_area: vk::Extent2D) {
        let Some(data) = self.arena.get_any(pass.executor.data) else {
            log::error!("RenderGraph: pass '{}' lost its pass data", pass.name);
            return;
        };

        let mut ctx = RgPassContext {
            cmd,
            render_area,
            registry: &self.registry,
            pass_name: &pass.name,
        };
        (pass.executor.invoke)(&mut ctx, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RgPassServices;
    use crate::handle::RgResourceHandle;
    use crate::pass::RgAttachmentInfo;
    use crate::pipeline_cache::{RgPipelineCache, RgShaderLibrary};
    use prism_rhi::headless::{HeadlessDevice, RecordedCommand, RecordingCommandList};
    use prism_rhi::{PipelineDesc, RhiBufferDesc, RhiPipeline, RhiResourceState, RhiShader, RhiTexture, RhiTextureDesc};
    use std::sync::Arc;

    fn color_desc() -> RhiTextureDesc {
        RhiTextureDesc::new_2d(64, 32, vk::Format::R8G8B8A8_UNORM)
    }

    fn draw_triangle(ctx: &mut RgPassContext<'_>, _: &()) {
        ctx.cmd.draw(3, 1, 0, 0);
    }

    fn label_range<'a>(commands: &'a [RecordedCommand], label: &str) -> &'a [RecordedCommand] {
        let begin = commands
            .iter()
            .position(|c| *c == RecordedCommand::BeginLabel(label.to_string()))
            .unwrap();
        let end = begin + commands[begin..].iter().position(|c| *c == RecordedCommand::EndLabel).unwrap();
        &commands[begin + 1..end]
    }

    #[test]
    fn test_execute_requires_compile() {
        let device = HeadlessDevice::default();
        let mut cmd = RecordingCommandList::new();
        let mut graph = RenderGraph::default();

        assert_eq!(graph.execute(&mut cmd, &device), Err(RgError::NotCompiled));
        assert!(cmd.commands().is_empty());
    }

    #[test]
    fn test_execute_scenario_a() {
        prism_crate_tools::init_log::init_test_log();
        let device = HeadlessDevice::default();
        let mut cmd = RecordingCommandList::new();
        let mut graph = RenderGraph::default();

        let r1 = graph.create_texture("R1", color_desc());
        let r2 = graph.create_texture("R2", color_desc());
        graph
            .add_pass(
                "A",
                |b, _: &mut ()| {
                    b.write(r1);
                },
                draw_triangle,
            )
            .unwrap();
        graph
            .add_pass(
                "B",
                |b, _: &mut ()| {
                    b.read(r1);
                    b.write(r2);
                },
                draw_triangle,
            )
            .unwrap();
        graph
            .add_pass(
                "C",
                |b, _: &mut ()| {
                    b.read(r2);
                },
                |ctx, _| ctx.cmd.dispatch(8, 8, 1),
            )
            .unwrap();

        graph.compile().unwrap();
        graph.execute(&mut cmd, &device).unwrap();

        assert_eq!(cmd.labels(), vec!["A", "B", "C"]);
        assert_eq!(
            cmd.barriers(),
            vec![
                ("R1", RhiResourceState::Undefined, RhiResourceState::RenderTarget),
                ("R1", RhiResourceState::RenderTarget, RhiResourceState::ShaderResource),
                ("R2", RhiResourceState::Undefined, RhiResourceState::RenderTarget),
                ("R2", RhiResourceState::RenderTarget, RhiResourceState::ShaderResource),
            ]
        );

        let b = label_range(cmd.commands(), "B");
        assert!(matches!(b[0], RecordedCommand::Barrier { .. }));
        assert!(matches!(b[1], RecordedCommand::Barrier { .. }));
        assert_eq!(
            b[2],
            RecordedCommand::BeginRendering {
                render_area: vk::Extent2D { width: 64, height: 32 },
                color_attachments: vec!["R2".to_string()],
                depth_attachment: None,
            }
        );
        assert_eq!(
            b[3],
            RecordedCommand::SetViewport {
                x: 0.0,
                y: 0.0,
                width: 64.0,
                height: 32.0
            }
        );
        assert_eq!(
            b[4],
            RecordedCommand::SetScissor {
                x: 0,
                y: 0,
                width: 64,
                height: 32
            }
        );
        assert_eq!(
            b[5],
            RecordedCommand::Draw {
                vertex_count: 3,
                instance_count: 1
            }
        );
        assert_eq!(b[6], RecordedCommand::EndRendering);
        assert_eq!(b.len(), 7);

        // 没有写入的 pass 不打开 rendering scope
        let c = label_range(cmd.commands(), "C");
        assert_eq!(c.len(), 2);
        assert_eq!(c[1], RecordedCommand::Dispatch { x: 8, y: 8, z: 1 });
    }

    #[test]
    fn test_color_and_depth_split() {
        let device = HeadlessDevice::default();
        let mut cmd = RecordingCommandList::new();
        let mut graph = RenderGraph::default();

        let depth = graph.create_texture("Depth", RhiTextureDesc::new_2d(128, 128, vk::Format::D32_SFLOAT));
        let albedo = graph.create_texture("Albedo", RhiTextureDesc::new_2d(128, 128, vk::Format::R8G8B8A8_SRGB));
        let normal = graph.create_texture("Normal", RhiTextureDesc::new_2d(128, 128, vk::Format::A2B10G10R10_UNORM_PACK32));
        graph
            .add_pass(
                "GBuffer",
                |b, _: &mut ()| {
                    b.write_attachment(RgAttachmentInfo::new(depth).clear_depth(0.0));
                    b.write(albedo);
                    b.write(normal);
                },
                draw_triangle,
            )
            .unwrap();

        graph.compile().unwrap();
        graph.execute(&mut cmd, &device).unwrap();

        let begin = cmd.commands().iter().find(|c| matches!(c, RecordedCommand::BeginRendering { .. })).unwrap();
        assert_eq!(
            *begin,
            RecordedCommand::BeginRendering {
                render_area: vk::Extent2D { width: 128, height: 128 },
                color_attachments: vec!["Albedo".to_string(), "Normal".to_string()],
                depth_attachment: Some("Depth".to_string()),
            }
        );
        assert!(cmd.barriers().contains(&("Depth", RhiResourceState::Undefined, RhiResourceState::DepthStencilWrite)));
    }

    #[test]
    fn test_buffer_only_pass_has_no_scope() {
        let device = HeadlessDevice::new(vk::Extent2D { width: 800, height: 600 });
        let mut cmd = RecordingCommandList::new();
        let mut graph = RenderGraph::default();

        let particles = graph.create_buffer("Particles", RhiBufferDesc::new(4096, vk::BufferUsageFlags::STORAGE_BUFFER));
        graph
            .add_pass(
                "Simulate",
                |b, _: &mut ()| {
                    b.write(particles);
                },
                |ctx, _: &()| {
                    assert_eq!(ctx.render_area, vk::Extent2D { width: 800, height: 600 });
                    ctx.cmd.dispatch(64, 1, 1);
                },
            )
            .unwrap();

        graph.compile().unwrap();
        graph.execute(&mut cmd, &device).unwrap();

        assert!(!cmd.commands().iter().any(|c| matches!(c, RecordedCommand::BeginRendering { .. })));
        assert_eq!(
            cmd.commands()[1],
            RecordedCommand::Barrier {
                resource: "Particles".to_string(),
                before: RhiResourceState::Undefined,
                after: RhiResourceState::UnorderedAccess,
                layouts: None,
            }
        );
    }

    #[test]
    fn test_pass_context_lookups() {
        #[derive(Default)]
        struct CompositeData {
            scene: RgResourceHandle,
            output: RgResourceHandle,
        }

        let device = HeadlessDevice::default();
        let mut cmd = RecordingCommandList::new();
        let mut graph = RenderGraph::default();

        let backbuffer = device.create_texture("Swapchain", &color_desc()).unwrap();
        let output = graph.import_texture("Backbuffer", backbuffer, RhiResourceState::Present);
        let scene = graph.create_texture("Scene", color_desc());
        graph
            .add_pass(
                "Scene",
                |b, _: &mut ()| {
                    b.write(scene);
                },
                draw_triangle,
            )
            .unwrap();
        graph
            .add_pass(
                "Composite",
                |b, data: &mut CompositeData| {
                    data.scene = b.read(scene);
                    data.output = b.write(output);
                },
                |ctx, data| {
                    assert_eq!(ctx.pass_name(), "Composite");
                    assert_eq!(ctx.texture(data.scene).unwrap().name(), "Scene");
                    assert_eq!(ctx.texture(data.output).unwrap().name(), "Swapchain");
                    assert!(ctx.buffer(data.scene).is_none());
                    ctx.cmd.draw(3, 1, 0, 0);
                },
            )
            .unwrap();

        graph.compile().unwrap();
        graph.execute(&mut cmd, &device).unwrap();

        assert!(cmd.barriers().contains(&("Swapchain", RhiResourceState::Present, RhiResourceState::RenderTarget)));
        // 导入的资源不会通过 device 创建
        assert_eq!(device.texture_count(), 2);
    }

    #[test]
    fn test_transients_reused_across_frames() {
        let device = HeadlessDevice::default();
        let mut graph = RenderGraph::default();

        for _ in 0..3 {
            graph.clear();
            let hdr = graph.create_texture("HDR", color_desc());
            let unused = graph.create_texture("Unused", color_desc());
            graph
                .add_pass(
                    "Lighting",
                    |b, _: &mut ()| {
                        b.write(hdr);
                    },
                    draw_triangle,
                )
                .unwrap();
            graph
                .add_pass(
                    "Tonemap",
                    |b, _: &mut ()| {
                        b.read(hdr);
                    },
                    draw_triangle,
                )
                .unwrap();

            graph.compile().unwrap();
            let mut cmd = RecordingCommandList::new();
            graph.execute(&mut cmd, &device).unwrap();

            assert!(graph.registry().texture(hdr).is_some());
            assert!(graph.registry().texture(unused).is_none());
        }

        assert_eq!(device.texture_count(), 1);
        assert_eq!(graph.resource_cache().texture_count(), 1);

        graph.clear_cache();
        assert_eq!(graph.resource_cache().texture_count(), 0);
    }

    #[test]
    fn test_device_error_propagates() {
        let device = HeadlessDevice::default();
        device.set_out_of_memory(true);
        let mut cmd = RecordingCommandList::new();
        let mut graph = RenderGraph::default();

        let hdr = graph.create_texture("HDR", color_desc());
        graph
            .add_pass(
                "Lighting",
                |b, _: &mut ()| {
                    b.write(hdr);
                },
                draw_triangle,
            )
            .unwrap();
        graph.compile().unwrap();

        assert_eq!(
            graph.execute(&mut cmd, &device),
            Err(RgError::Rhi(prism_rhi::RhiError::OutOfMemory))
        );
        assert!(cmd.commands().is_empty());
    }

    #[test]
    fn test_pipeline_from_pass_data() {
        #[derive(Default)]
        struct ForwardData {
            pipeline: Option<Arc<dyn RhiPipeline>>,
        }

        let device = HeadlessDevice::default();
        let mut pipelines = RgPipelineCache::default();
        let mut shaders = RgShaderLibrary::default();
        let mut cmd = RecordingCommandList::new();
        let mut graph = RenderGraph::default();

        let hdr = graph.create_texture("HDR", color_desc());
        let mut services = RgPassServices {
            device: &device,
            pipelines: &mut pipelines,
            shaders: &mut shaders,
        };
        graph
            .add_pass_with_services(
                "Forward",
                &mut services,
                |b, data: &mut ForwardData| {
                    b.write(hdr);
                    let vs = b.load_shader("forward.hlsl", vk::ShaderStageFlags::VERTEX).unwrap();
                    let desc = PipelineDesc {
                        vertex_shader: Some(vs.id()),
                        ..Default::default()
                    };
                    data.pipeline = Some(b.create_pipeline(desc).unwrap());
                },
                |ctx, data| {
                    if let Some(pipeline) = &data.pipeline {
                        ctx.cmd.bind_pipeline(pipeline.as_ref());
                    }
                    ctx.cmd.draw(3, 1, 0, 0);
                },
            )
            .unwrap();

        graph.compile().unwrap();
        graph.execute(&mut cmd, &device).unwrap();

        assert_eq!(pipelines.len(), 1);
        assert!(cmd.commands().iter().any(|c| matches!(c, RecordedCommand::BindPipeline(_))));
    }

    #[test]
    fn test_imported_texture_keeps_identity() {
        let device = HeadlessDevice::default();
        let mut cmd = RecordingCommandList::new();
        let mut graph = RenderGraph::default();

        let external: Arc<dyn RhiTexture> = device.create_texture("External", &color_desc()).unwrap();
        let handle = graph.import_texture("External", external.clone(), RhiResourceState::ShaderResource);
        assert!(Arc::ptr_eq(graph.registry().texture(handle).unwrap(), &external));

        graph
            .add_pass(
                "Sample",
                |b, _: &mut ()| {
                    b.read(handle);
                },
                draw_triangle,
            )
            .unwrap();
        graph.compile().unwrap();
        graph.execute(&mut cmd, &device).unwrap();

        assert!(Arc::ptr_eq(graph.registry().texture(handle).unwrap(), &external));
        assert!(cmd.barriers().is_empty());
        assert_eq!(Arc::strong_count(&external), 3);
    }
}
