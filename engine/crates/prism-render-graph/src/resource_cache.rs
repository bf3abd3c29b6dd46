//! 跨帧复用的临时资源缓存
//!
//! key 为 (名称, 完整描述符)，两者都相同时返回同一个物理资源。
//! `clear()` 只释放引用，真正的销毁由资源的引用计数决定。

use prism_rhi::{RhiBuffer, RhiBufferDesc, RhiDevice, RhiResult, RhiTexture, RhiTextureDesc};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct RgResourceCache {
    textures: HashMap<(String, RhiTextureDesc), Arc<dyn RhiTexture>>,
    buffers: HashMap<(String, RhiBufferDesc), Arc<dyn RhiBuffer>>,
}

impl RgResourceCache {
    pub fn get_or_create_texture(
        &mut self,
        device: &dyn RhiDevice,
        name: &str,
        desc: &RhiTextureDesc,
    ) -> RhiResult<Arc<dyn RhiTexture>> {
        let key = (name.to_string(), desc.clone());
        if let Some(texture) = self.textures.get(&key) {
            return Ok(texture.clone());
        }

        let texture = device.create_texture(name, desc)?;
        log::debug!("RenderGraph: cache miss, created texture '{}' {}x{}", name, desc.width, desc.height);
        self.textures.insert(key, texture.clone());
        Ok(texture)
    }

    pub fn get_or_create_buffer(
        &mut self,
        device: &dyn RhiDevice,
        name: &str,
        desc: &RhiBufferDesc,
    ) -> RhiResult<Arc<dyn RhiBuffer>> {
        let key = (name.to_string(), desc.clone());
        if let Some(buffer) = self.buffers.get(&key) {
            return Ok(buffer.clone());
        }

        let buffer = device.create_buffer(name, desc)?;
        log::debug!("RenderGraph: cache miss, created buffer '{}' ({} bytes)", name, desc.size);
        self.buffers.insert(key, buffer.clone());
        Ok(buffer)
    }

    #[inline]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.buffers.clear();
    }
}
