//! 管线缓存与着色器库
//!
//! 两者都由调用方显式持有，通过 `RgPassServices` 借给 builder，
//! graph 本身不依赖任何全局状态。

use ash::vk;
use prism_rhi::{PipelineDesc, RhiDevice, RhiPipeline, RhiResult, RhiShader, ShaderDesc};
use std::collections::HashMap;
use std::sync::Arc;

/// PipelineDesc → pipeline
#[derive(Default)]
pub struct RgPipelineCache {
    pipelines: HashMap<PipelineDesc, Arc<dyn RhiPipeline>>,
}

impl RgPipelineCache {
    pub fn get_or_create(&mut self, device: &dyn RhiDevice, desc: &PipelineDesc) -> RhiResult<Arc<dyn RhiPipeline>> {
        if let Some(pipeline) = self.pipelines.get(desc) {
            return Ok(pipeline.clone());
        }

        let pipeline = device.create_pipeline(desc)?;
        log::debug!(
            "PipelineCache: created pipeline {:?} (colors: {:?}, depth: {:?})",
            pipeline.id(),
            desc.color_formats,
            desc.depth_format
        );
        self.pipelines.insert(desc.clone(), pipeline.clone());
        Ok(pipeline)
    }

    #[inline]
    pub fn contains(&self, desc: &PipelineDesc) -> bool {
        self.pipelines.contains_key(desc)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn clear(&mut self) {
        self.pipelines.clear();
    }
}

/// (路径, stage) → shader
#[derive(Default)]
pub struct RgShaderLibrary {
    shaders: HashMap<(String, vk::ShaderStageFlags), Arc<dyn RhiShader>>,
}

impl RgShaderLibrary {
    pub fn load(
        &mut self,
        device: &dyn RhiDevice,
        path: &str,
        stage: vk::ShaderStageFlags,
    ) -> RhiResult<Arc<dyn RhiShader>> {
        let key = (path.to_string(), stage);
        if let Some(shader) = self.shaders.get(&key) {
            return Ok(shader.clone());
        }

        let shader = device.create_shader(&ShaderDesc::new(path, stage))?;
        log::debug!("ShaderLibrary: loaded '{}' ({:?})", path, stage);
        self.shaders.insert(key, shader.clone());
        Ok(shader)
    }

    /// 丢弃某个文件的所有 stage，下次 `load` 会重新创建；返回丢弃的数量
    pub fn reload(&mut self, path: &str) -> usize {
        let before = self.shaders.len();
        self.shaders.retain(|(shader_path, _), _| shader_path != path);
        let evicted = before - self.shaders.len();
        log::info!("ShaderLibrary: reload '{}', {} stage(s) evicted", path, evicted);
        evicted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    pub fn clear(&mut self) {
        self.shaders.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_rhi::headless::HeadlessDevice;

    #[test]
    fn test_shader_library_reload() {
        let device = HeadlessDevice::default();
        let mut shaders = RgShaderLibrary::default();

        let vs = shaders.load(&device, "gbuffer.hlsl", vk::ShaderStageFlags::VERTEX).unwrap();
        let ps = shaders.load(&device, "gbuffer.hlsl", vk::ShaderStageFlags::FRAGMENT).unwrap();
        let cs = shaders.load(&device, "blur.hlsl", vk::ShaderStageFlags::COMPUTE).unwrap();
        let vs_again = shaders.load(&device, "gbuffer.hlsl", vk::ShaderStageFlags::VERTEX).unwrap();
        assert_eq!(vs.id(), vs_again.id());
        assert_ne!(vs.id(), ps.id());
        assert_eq!(device.shader_count(), 3);

        assert_eq!(shaders.reload("gbuffer.hlsl"), 2);
        assert_eq!(shaders.len(), 1);

        let vs_reloaded = shaders.load(&device, "gbuffer.hlsl", vk::ShaderStageFlags::VERTEX).unwrap();
        assert_ne!(vs.id(), vs_reloaded.id());
        assert_eq!(shaders.load(&device, "blur.hlsl", vk::ShaderStageFlags::COMPUTE).unwrap().id(), cs.id());
    }

    #[test]
    fn test_pipeline_cache_hit() {
        let device = HeadlessDevice::default();
        let mut shaders = RgShaderLibrary::default();
        let mut pipelines = RgPipelineCache::default();

        let cs = shaders.load(&device, "cull.hlsl", vk::ShaderStageFlags::COMPUTE).unwrap();
        let desc = PipelineDesc {
            compute_shader: Some(cs.id()),
            ..Default::default()
        };

        let a = pipelines.get_or_create(&device, &desc).unwrap();
        let b = pipelines.get_or_create(&device, &desc).unwrap();
        assert_eq!(a.id(), b.id());
        assert!(pipelines.contains(&desc));
        assert_eq!(device.pipeline_count(), 1);
    }
}
