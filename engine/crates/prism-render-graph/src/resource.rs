//! 资源节点
//!
//! 节点只保存描述符、生命周期和导入信息；临时资源的物理对象在 execute 时才创建。

use ash::vk;
use prism_rhi::format::is_depth_format;
use prism_rhi::{RhiBuffer, RhiBufferDesc, RhiResourceRef, RhiResourceState, RhiTexture, RhiTextureDesc};
use std::sync::Arc;

use crate::handle::RgResourceHandle;

/// 虚拟资源的描述
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RgResourceDesc {
    Texture(RhiTextureDesc),
    Buffer(RhiBufferDesc),
}

impl RgResourceDesc {
    #[inline]
    pub fn is_texture(&self) -> bool {
        matches!(self, RgResourceDesc::Texture(_))
    }

    /// 纹理格式；buffer 返回 None
    #[inline]
    pub fn format(&self) -> Option<vk::Format> {
        match self {
            RgResourceDesc::Texture(desc) => Some(desc.format),
            RgResourceDesc::Buffer(_) => None,
        }
    }

    #[inline]
    pub fn is_depth(&self) -> bool {
        self.format().is_some_and(is_depth_format)
    }

    /// 进入 graph 时的状态
    #[inline]
    pub fn initial_state(&self) -> RhiResourceState {
        match self {
            RgResourceDesc::Texture(desc) => desc.initial_state,
            RgResourceDesc::Buffer(desc) => desc.initial_state,
        }
    }

    /// 被 pass 写入时需要的状态
    pub fn write_state(&self) -> RhiResourceState {
        match self {
            RgResourceDesc::Texture(_) if self.is_depth() => RhiResourceState::DepthStencilWrite,
            RgResourceDesc::Texture(_) => RhiResourceState::RenderTarget,
            RgResourceDesc::Buffer(_) => RhiResourceState::UnorderedAccess,
        }
    }
}

impl From<RhiTextureDesc> for RgResourceDesc {
    fn from(desc: RhiTextureDesc) -> Self {
        RgResourceDesc::Texture(desc)
    }
}

impl From<RhiBufferDesc> for RgResourceDesc {
    fn from(desc: RhiBufferDesc) -> Self {
        RgResourceDesc::Buffer(desc)
    }
}

/// 资源在排序后的执行序列中的存活区间，-1 表示没有被任何 pass 使用
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RgLifetime {
    pub first_pass: i32,
    pub last_pass: i32,
}

impl RgLifetime {
    pub const UNTOUCHED: Self = Self {
        first_pass: -1,
        last_pass: -1,
    };

    #[inline]
    pub fn is_touched(&self) -> bool {
        self.first_pass >= 0
    }

    /// 在排序后的第 `index` 个 pass 中使用了该资源
    #[inline]
    pub(crate) fn touch(&mut self, index: i32) {
        if self.first_pass < 0 {
            self.first_pass = index;
        }
        self.last_pass = index;
    }
}

impl Default for RgLifetime {
    fn default() -> Self {
        Self::UNTOUCHED
    }
}

/// 外部持有的物理资源
#[derive(Clone, Debug)]
pub enum RgPhysicalResource {
    Texture(Arc<dyn RhiTexture>),
    Buffer(Arc<dyn RhiBuffer>),
}

impl RgPhysicalResource {
    pub fn resource_ref(&self) -> RhiResourceRef<'_> {
        match self {
            RgPhysicalResource::Texture(texture) => RhiResourceRef::Texture(texture.as_ref()),
            RgPhysicalResource::Buffer(buffer) => RhiResourceRef::Buffer(buffer.as_ref()),
        }
    }
}

/// 资源节点
#[derive(Clone, Debug)]
pub struct RgResourceNode {
    pub handle: RgResourceHandle,
    pub name: String,
    pub desc: RgResourceDesc,
    pub lifetime: RgLifetime,
    /// 导入的资源不由 graph 创建
    pub imported: Option<RgPhysicalResource>,
}

impl RgResourceNode {
    #[inline]
    pub fn is_imported(&self) -> bool {
        self.imported.is_some()
    }
}

/// 资源节点表，下标即句柄
#[derive(Debug, Default)]
pub(crate) struct RgResourceTable {
    nodes: Vec<RgResourceNode>,
}

impl RgResourceTable {
    /// 追加一个节点，返回它的句柄；句柄空间耗尽时返回无效句柄
    pub fn push(
        &mut self,
        name: impl Into<String>,
        desc: RgResourceDesc,
        imported: Option<RgPhysicalResource>,
    ) -> RgResourceHandle {
        let name = name.into();
        if self.nodes.len() >= u16::MAX as usize {
            log::error!("RenderGraph: too many resources, cannot create '{}'", name);
            return RgResourceHandle::INVALID;
        }

        let handle = RgResourceHandle::new(self.nodes.len() as u16);
        self.nodes.push(RgResourceNode {
            handle,
            name,
            desc,
            lifetime: RgLifetime::UNTOUCHED,
            imported,
        });
        handle
    }

    #[inline]
    pub fn contains(&self, handle: RgResourceHandle) -> bool {
        handle.is_valid() && handle.index() < self.nodes.len()
    }

    #[inline]
    pub fn get(&self, handle: RgResourceHandle) -> Option<&RgResourceNode> {
        if !handle.is_valid() {
            return None;
        }
        self.nodes.get(handle.index())
    }

    #[inline]
    pub fn get_mut(&mut self, handle: RgResourceHandle) -> Option<&mut RgResourceNode> {
        if !handle.is_valid() {
            return None;
        }
        self.nodes.get_mut(handle.index())
    }

    /// 按名称线性查找
    pub fn find(&self, name: &str) -> Option<RgResourceHandle> {
        self.nodes.iter().find(|node| node.name == name).map(|node| node.handle)
    }

    /// 调试输出使用的名称
    pub fn name_of(&self, handle: RgResourceHandle) -> &str {
        self.get(handle).map(|node| node.name.as_str()).unwrap_or("<unknown>")
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &RgResourceNode> {
        self.nodes.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RgResourceNode> {
        self.nodes.iter_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_state_by_format() {
        let color: RgResourceDesc = RhiTextureDesc::new_2d(8, 8, vk::Format::R16G16B16A16_SFLOAT).into();
        let depth: RgResourceDesc = RhiTextureDesc::new_2d(8, 8, vk::Format::D24_UNORM_S8_UINT).into();
        let buffer: RgResourceDesc = RhiBufferDesc::new(64, vk::BufferUsageFlags::STORAGE_BUFFER).into();

        assert_eq!(color.write_state(), RhiResourceState::RenderTarget);
        assert_eq!(depth.write_state(), RhiResourceState::DepthStencilWrite);
        assert_eq!(buffer.write_state(), RhiResourceState::UnorderedAccess);
        assert_eq!(buffer.format(), None);
    }

    #[test]
    fn test_lifetime_touch() {
        let mut lifetime = RgLifetime::default();
        assert!(!lifetime.is_touched());

        lifetime.touch(2);
        lifetime.touch(5);
        assert_eq!(lifetime, RgLifetime { first_pass: 2, last_pass: 5 });
    }

    #[test]
    fn test_table_handles_are_indices() {
        let mut table = RgResourceTable::default();
        let desc: RgResourceDesc = RhiTextureDesc::new_2d(8, 8, vk::Format::R8G8B8A8_UNORM).into();
        let a = table.push("A", desc.clone(), None);
        let b = table.push("B", desc, None);

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(table.find("B"), Some(b));
        assert_eq!(table.find("C"), None);
        assert!(!table.contains(RgResourceHandle::INVALID));
        assert!(!table.contains(RgResourceHandle::new(2)));
    }
}
