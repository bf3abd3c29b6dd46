//! 执行期的 handle → 物理资源 查询表
//!
//! 以 handle id 为下标的数组，按需增长，空位返回 None。
//! 每次 execute 开始时清空；只持有引用计数，不负责资源的销毁时机。

use prism_rhi::{RhiBuffer, RhiResourceRef, RhiTexture};
use std::sync::Arc;

use crate::handle::RgResourceHandle;

#[derive(Default)]
pub struct RgRegistry {
    textures: Vec<Option<Arc<dyn RhiTexture>>>,
    buffers: Vec<Option<Arc<dyn RhiBuffer>>>,
}

// getters
impl RgRegistry {
    #[inline]
    pub fn texture(&self, handle: RgResourceHandle) -> Option<&Arc<dyn RhiTexture>> {
        if !handle.is_valid() {
            return None;
        }
        self.textures.get(handle.index()).and_then(Option::as_ref)
    }

    #[inline]
    pub fn buffer(&self, handle: RgResourceHandle) -> Option<&Arc<dyn RhiBuffer>> {
        if !handle.is_valid() {
            return None;
        }
        self.buffers.get(handle.index()).and_then(Option::as_ref)
    }

    /// 无论纹理还是缓冲区，返回 barrier 可以使用的引用
    pub fn resource(&self, handle: RgResourceHandle) -> Option<RhiResourceRef<'_>> {
        if let Some(texture) = self.texture(handle) {
            return Some(RhiResourceRef::Texture(texture.as_ref()));
        }
        self.buffer(handle).map(|buffer| RhiResourceRef::Buffer(buffer.as_ref()))
    }

    /// 已经登记的资源数量
    pub fn len(&self) -> usize {
        self.textures.iter().flatten().count() + self.buffers.iter().flatten().count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// tools
impl RgRegistry {
    pub fn register_texture(&mut self, handle: RgResourceHandle, texture: Arc<dyn RhiTexture>) {
        if let Some(slot) = Self::slot(&mut self.textures, handle) {
            *slot = Some(texture);
        }
    }

    pub fn register_buffer(&mut self, handle: RgResourceHandle, buffer: Arc<dyn RhiBuffer>) {
        if let Some(slot) = Self::slot(&mut self.buffers, handle) {
            *slot = Some(buffer);
        }
    }

    /// 登记外部持有的纹理
    pub fn import_texture(&mut self, handle: RgResourceHandle, texture: Arc<dyn RhiTexture>) {
        log::debug!("RenderGraph: import texture '{}' as {:?}", texture.name(), handle);
        self.register_texture(handle, texture);
    }

    /// 登记外部持有的缓冲区
    pub fn import_buffer(&mut self, handle: RgResourceHandle, buffer: Arc<dyn RhiBuffer>) {
        log::debug!("RenderGraph: import buffer '{}' as {:?}", buffer.name(), handle);
        self.register_buffer(handle, buffer);
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.buffers.clear();
    }

    fn slot<T>(slots: &mut Vec<Option<T>>, handle: RgResourceHandle) -> Option<&mut Option<T>> {
        if !handle.is_valid() {
            log::warn!("RenderGraph: cannot register resource with invalid handle");
            return None;
        }
        if handle.index() >= slots.len() {
            slots.resize_with(handle.index() + 1, || None);
        }
        slots.get_mut(handle.index())
    }
}
