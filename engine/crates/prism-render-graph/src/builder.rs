//! Pass 构建器
//!
//! 在 `add_pass` 的 setup 回调中使用，声明当前 pass 的资源依赖，
//! 并在需要时借用管线缓存 / 着色器库创建 pipeline。

use ash::vk;
use prism_rhi::{PipelineDesc, RhiBufferDesc, RhiDevice, RhiPipeline, RhiShader, RhiTextureDesc};
use std::sync::Arc;

use crate::error::{RgError, RgResult};
use crate::handle::RgResourceHandle;
use crate::pass::RgAttachmentInfo;
use crate::pipeline_cache::{RgPipelineCache, RgShaderLibrary};
use crate::resource::{RgResourceDesc, RgResourceTable};

/// setup 阶段可以使用的外部服务
///
/// 由调用方持有，通过 `RenderGraph::add_pass_with_services` 借给 builder。
pub struct RgPassServices<'a> {
    pub device: &'a dyn RhiDevice,
    pub pipelines: &'a mut RgPipelineCache,
    pub shaders: &'a mut RgShaderLibrary,
}

impl RgPassServices<'_> {
    /// 重新借用，生命周期缩短为本次调用
    pub(crate) fn reborrow(&mut self) -> RgPassServices<'_> {
        RgPassServices {
            device: self.device,
            pipelines: &mut *self.pipelines,
            shaders: &mut *self.shaders,
        }
    }
}

/// Pass 构建器
///
/// 只在一次 setup 调用期间存在，绑定到正在创建的那个 pass。
pub struct RgPassBuilder<'a> {
    pub(crate) pass_name: String,

    /// 读取列表
    pub(crate) reads: Vec<RgResourceHandle>,
    /// 写入列表
    pub(crate) writes: Vec<RgAttachmentInfo>,
    /// 查找错误
    pub(crate) diagnostics: Vec<RgError>,

    /// 写入的颜色附件格式，按声明顺序
    color_formats: Vec<vk::Format>,
    /// 写入的深度附件格式
    depth_format: Option<vk::Format>,

    resources: &'a mut RgResourceTable,
    services: Option<RgPassServices<'a>>,
}

// new & init
impl<'a> RgPassBuilder<'a> {
    pub(crate) fn new(
        pass_name: impl Into<String>,
        resources: &'a mut RgResourceTable,
        services: Option<RgPassServices<'a>>,
    ) -> Self {
        Self {
            pass_name: pass_name.into(),
            reads: Vec::new(),
            writes: Vec::new(),
            diagnostics: Vec::new(),
            color_formats: Vec::new(),
            depth_format: None,
            resources,
            services,
        }
    }
}

// 资源声明
impl RgPassBuilder<'_> {
    /// 声明读取
    ///
    /// 返回相同的句柄；无效句柄会被记录到 pass 的 diagnostics 中，不会加入读取列表。
    pub fn read(&mut self, handle: RgResourceHandle) -> RgResourceHandle {
        if !self.validate(handle, "read") {
            return handle;
        }
        if !self.reads.contains(&handle) {
            self.reads.push(handle);
        }
        handle
    }

    /// 声明写入，使用默认的 clear + store
    #[inline]
    pub fn write(&mut self, handle: RgResourceHandle) -> RgResourceHandle {
        self.write_attachment(RgAttachmentInfo::new(handle))
    }

    /// 声明写入，并指定 load / store 操作和清除值
    pub fn write_attachment(&mut self, info: RgAttachmentInfo) -> RgResourceHandle {
        let handle = info.handle;
        if !self.validate(handle, "write") {
            return handle;
        }

        if let Some(existing) = self.writes.iter_mut().find(|w| w.handle == handle) {
            *existing = info;
            return handle;
        }
        self.writes.push(info);

        let format = self.resources.get(handle).and_then(|node| {
            let desc = &node.desc;
            desc.format().map(|format| (format, desc.is_depth()))
        });
        match format {
            Some((format, true)) => {
                if let Some(previous) = self.depth_format.replace(format) {
                    log::warn!(
                        "RenderGraph: pass '{}' writes more than one depth attachment ({:?} replaced by {:?})",
                        self.pass_name,
                        previous,
                        format
                    );
                }
            }
            Some((format, false)) => self.color_formats.push(format),
            None => {}
        }
        handle
    }

    /// 声明读写（累积、后处理等）
    pub fn read_write(&mut self, handle: RgResourceHandle) -> RgResourceHandle {
        self.read(handle);
        self.write_attachment(RgAttachmentInfo::new(handle).load())
    }

    /// 创建临时纹理，物理资源在 execute 时才分配
    pub fn create_texture(&mut self, name: impl Into<String>, desc: RhiTextureDesc) -> RgResourceHandle {
        self.resources.push(name, RgResourceDesc::Texture(desc), None)
    }

    /// 创建临时缓冲区
    pub fn create_buffer(&mut self, name: impl Into<String>, desc: RhiBufferDesc) -> RgResourceHandle {
        self.resources.push(name, RgResourceDesc::Buffer(desc), None)
    }

    /// 按名称查找资源
    pub fn get_resource(&mut self, name: &str) -> RgResult<RgResourceHandle> {
        match self.resources.find(name) {
            Some(handle) => Ok(handle),
            None => {
                log::warn!("RenderGraph: pass '{}' looked up unknown resource '{}'", self.pass_name, name);
                let err = RgError::ResourceNotFound(name.to_string());
                self.diagnostics.push(err.clone());
                Err(err)
            }
        }
    }

    pub fn resource_desc(&self, handle: RgResourceHandle) -> Option<&RgResourceDesc> {
        self.resources.get(handle).map(|node| &node.desc)
    }
}

// getters
impl RgPassBuilder<'_> {
    #[inline]
    pub fn pass_name(&self) -> &str {
        &self.pass_name
    }

    /// 目前为止写入的颜色附件格式
    #[inline]
    pub fn color_formats(&self) -> &[vk::Format] {
        &self.color_formats
    }

    /// 目前为止写入的深度附件格式
    #[inline]
    pub fn depth_format(&self) -> Option<vk::Format> {
        self.depth_format
    }

    #[inline]
    pub fn has_services(&self) -> bool {
        self.services.is_some()
    }
}

// 管线与着色器
impl RgPassBuilder<'_> {
    /// 创建（或从缓存获取）pipeline
    ///
    /// 附件格式由本 pass 之前的 `write` 调用自动填充，desc 中已有的格式会被覆盖。
    pub fn create_pipeline(&mut self, mut desc: PipelineDesc) -> RgResult<Arc<dyn RhiPipeline>> {
        desc.color_formats = self.color_formats.clone();
        desc.depth_format = self.depth_format.unwrap_or(vk::Format::UNDEFINED);

        let services = self.services.as_mut().ok_or_else(|| RgError::NoServices(self.pass_name.clone()))?;
        Ok(services.pipelines.get_or_create(services.device, &desc)?)
    }

    /// 加载（或从缓存获取）shader
    pub fn load_shader(&mut self, path: &str, stage: vk::ShaderStageFlags) -> RgResult<Arc<dyn RhiShader>> {
        let services = self.services.as_mut().ok_or_else(|| RgError::NoServices(self.pass_name.clone()))?;
        Ok(services.shaders.load(services.device, path, stage)?)
    }
}

// tools
impl RgPassBuilder<'_> {
    fn validate(&mut self, handle: RgResourceHandle, usage: &str) -> bool {
        if self.resources.contains(handle) {
            return true;
        }
        log::warn!("RenderGraph: pass '{}' tried to {} invalid handle {:?}", self.pass_name, usage, handle);
        self.diagnostics.push(RgError::InvalidHandle(handle));
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_rhi::headless::HeadlessDevice;

    fn texture_desc(format: vk::Format) -> RgResourceDesc {
        RgResourceDesc::Texture(RhiTextureDesc::new_2d(32, 32, format))
    }

    #[test]
    fn test_invalid_handles_pass_through() {
        let mut resources = RgResourceTable::default();
        let mut builder = RgPassBuilder::new("Broken", &mut resources, None);

        assert_eq!(builder.read(RgResourceHandle::INVALID), RgResourceHandle::INVALID);
        let dangling = RgResourceHandle::new(5);
        assert_eq!(builder.write(dangling), dangling);

        assert!(builder.reads.is_empty());
        assert!(builder.writes.is_empty());
        assert_eq!(
            builder.diagnostics,
            vec![RgError::InvalidHandle(RgResourceHandle::INVALID), RgError::InvalidHandle(dangling)]
        );
    }

    #[test]
    fn test_format_accumulation() {
        let mut resources = RgResourceTable::default();
        let albedo = resources.push("Albedo", texture_desc(vk::Format::R8G8B8A8_UNORM), None);
        let normal = resources.push("Normal", texture_desc(vk::Format::R16G16B16A16_SFLOAT), None);
        let depth = resources.push("Depth", texture_desc(vk::Format::D32_SFLOAT), None);

        let mut builder = RgPassBuilder::new("GBuffer", &mut resources, None);
        builder.write(albedo);
        builder.write(depth);
        builder.write(normal);
        builder.write(albedo);

        assert_eq!(builder.color_formats(), &[vk::Format::R8G8B8A8_UNORM, vk::Format::R16G16B16A16_SFLOAT]);
        assert_eq!(builder.depth_format(), Some(vk::Format::D32_SFLOAT));
        assert_eq!(builder.writes.len(), 3);
    }

    #[test]
    fn test_read_write_declares_both() {
        let mut resources = RgResourceTable::default();
        let accum = resources.push("Accum", texture_desc(vk::Format::R32G32B32A32_SFLOAT), None);

        let mut builder = RgPassBuilder::new("Accumulate", &mut resources, None);
        builder.read_write(accum);
        builder.read(accum);

        assert_eq!(builder.reads, vec![accum]);
        assert_eq!(builder.writes[0].load_op, vk::AttachmentLoadOp::LOAD);
    }

    #[test]
    fn test_create_and_lookup() {
        let mut resources = RgResourceTable::default();
        let mut builder = RgPassBuilder::new("Cull", &mut resources, None);

        let visible = builder.create_buffer("Visible", RhiBufferDesc::new(1024, vk::BufferUsageFlags::STORAGE_BUFFER));
        assert_eq!(builder.get_resource("Visible"), Ok(visible));
        assert_eq!(builder.get_resource("Missing"), Err(RgError::ResourceNotFound("Missing".to_string())));
        assert_eq!(builder.diagnostics.len(), 1);
    }

    #[test]
    fn test_create_pipeline_fills_formats() {
        let device = HeadlessDevice::default();
        let mut pipelines = RgPipelineCache::default();
        let mut shaders = RgShaderLibrary::default();
        let mut resources = RgResourceTable::default();
        let hdr = resources.push("HDR", texture_desc(vk::Format::R16G16B16A16_SFLOAT), None);
        let depth = resources.push("Depth", texture_desc(vk::Format::D24_UNORM_S8_UINT), None);

        let services = RgPassServices {
            device: &device,
            pipelines: &mut pipelines,
            shaders: &mut shaders,
        };
        let mut builder = RgPassBuilder::new("Forward", &mut resources, Some(services));
        builder.write(hdr);
        builder.write(depth);

        let vs = builder.load_shader("forward.hlsl", vk::ShaderStageFlags::VERTEX).unwrap();
        let ps = builder.load_shader("forward.hlsl", vk::ShaderStageFlags::FRAGMENT).unwrap();
        let desc = PipelineDesc {
            vertex_shader: Some(vs.id()),
            fragment_shader: Some(ps.id()),
            color_formats: vec![vk::Format::B8G8R8A8_SRGB],
            ..Default::default()
        };
        builder.create_pipeline(desc.clone()).unwrap();
        drop(builder);

        let expected = PipelineDesc {
            color_formats: vec![vk::Format::R16G16B16A16_SFLOAT],
            depth_format: vk::Format::D24_UNORM_S8_UINT,
            ..desc
        };
        assert!(pipelines.contains(&expected));
        assert_eq!(shaders.len(), 2);
    }

    #[test]
    fn test_create_pipeline_without_services() {
        let mut resources = RgResourceTable::default();
        let mut builder = RgPassBuilder::new("Lonely", &mut resources, None);

        let err = builder.create_pipeline(PipelineDesc::default()).unwrap_err();
        assert_eq!(err, RgError::NoServices("Lonely".to_string()));
    }
}
