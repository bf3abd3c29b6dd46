//! 把抽象状态转换为 Vulkan barrier

use ash::vk;

use crate::format::infer_aspect;
use crate::resource_state::RhiResourceState;

/// 便捷创建 image memory barrier 的结构体
pub struct RhiImageBarrier {
    inner: vk::ImageMemoryBarrier2<'static>,
}

impl Default for RhiImageBarrier {
    fn default() -> Self {
        Self {
            inner: vk::ImageMemoryBarrier2 {
                old_layout: vk::ImageLayout::UNDEFINED,
                new_layout: vk::ImageLayout::UNDEFINED,
                src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                subresource_range: vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_array_layer: 0,
                    layer_count: vk::REMAINING_ARRAY_LAYERS,
                    base_mip_level: 0,
                    level_count: vk::REMAINING_MIP_LEVELS,
                },
                ..Default::default()
            },
        }
    }
}

impl RhiImageBarrier {
    /// 根据前后状态创建，aspect 由 format 推断
    pub fn transition(before: RhiResourceState, after: RhiResourceState, format: vk::Format) -> Self {
        let src = before.vk_info();
        let dst = after.vk_info();
        Self::default()
            .layout_transfer(src.layout, dst.layout)
            .src_mask(src.stage, before.src_access())
            .dst_mask(dst.stage, dst.access)
            .image_aspect_flag(infer_aspect(format))
    }

    #[inline]
    pub fn inner(&self) -> &vk::ImageMemoryBarrier2<'static> {
        &self.inner
    }

    /// builder
    #[inline]
    pub fn image(mut self, image: vk::Image) -> Self {
        self.inner.image = image;
        self
    }

    /// builder
    #[inline]
    pub fn layout_transfer(mut self, old_layout: vk::ImageLayout, new_layout: vk::ImageLayout) -> Self {
        self.inner.old_layout = old_layout;
        self.inner.new_layout = new_layout;
        self
    }

    /// builder
    #[inline]
    pub fn src_mask(mut self, src_stage_mask: vk::PipelineStageFlags2, src_access_mask: vk::AccessFlags2) -> Self {
        self.inner.src_stage_mask = src_stage_mask;
        self.inner.src_access_mask = src_access_mask;
        self
    }

    /// builder
    #[inline]
    pub fn dst_mask(mut self, dst_stage_mask: vk::PipelineStageFlags2, dst_access_mask: vk::AccessFlags2) -> Self {
        self.inner.dst_stage_mask = dst_stage_mask;
        self.inner.dst_access_mask = dst_access_mask;
        self
    }

    /// builder
    #[inline]
    pub fn image_aspect_flag(mut self, aspect: vk::ImageAspectFlags) -> Self {
        self.inner.subresource_range.aspect_mask = aspect;
        self
    }
}

/// 便捷创建 buffer memory barrier 的结构体
pub struct RhiBufferBarrier {
    inner: vk::BufferMemoryBarrier2<'static>,
}

impl Default for RhiBufferBarrier {
    fn default() -> Self {
        Self {
            inner: vk::BufferMemoryBarrier2 {
                src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                offset: 0,
                size: vk::WHOLE_SIZE,
                ..Default::default()
            },
        }
    }
}

impl RhiBufferBarrier {
    pub fn transition(before: RhiResourceState, after: RhiResourceState) -> Self {
        let src = before.vk_info();
        let dst = after.vk_info();
        let mut barrier = Self::default();
        barrier.inner.src_stage_mask = src.stage;
        barrier.inner.src_access_mask = before.src_access();
        barrier.inner.dst_stage_mask = dst.stage;
        barrier.inner.dst_access_mask = dst.access;
        barrier
    }

    #[inline]
    pub fn inner(&self) -> &vk::BufferMemoryBarrier2<'static> {
        &self.inner
    }

    /// builder
    #[inline]
    pub fn buffer(mut self, buffer: vk::Buffer, offset: vk::DeviceSize, size: vk::DeviceSize) -> Self {
        self.inner.buffer = buffer;
        self.inner.offset = offset;
        self.inner.size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_transition() {
        let barrier = RhiImageBarrier::transition(
            RhiResourceState::RenderTarget,
            RhiResourceState::ShaderResource,
            vk::Format::R8G8B8A8_UNORM,
        );
        let inner = barrier.inner();
        assert_eq!(inner.old_layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
        assert_eq!(inner.new_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        assert_eq!(inner.src_access_mask, vk::AccessFlags2::COLOR_ATTACHMENT_WRITE);
        assert_eq!(inner.subresource_range.aspect_mask, vk::ImageAspectFlags::COLOR);
    }

    #[test]
    fn test_depth_transition_aspect() {
        let barrier = RhiImageBarrier::transition(
            RhiResourceState::Undefined,
            RhiResourceState::DepthStencilWrite,
            vk::Format::D24_UNORM_S8_UINT,
        );
        assert_eq!(
            barrier.inner().subresource_range.aspect_mask,
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
    }

    #[test]
    fn test_buffer_transition() {
        let barrier = RhiBufferBarrier::transition(RhiResourceState::UnorderedAccess, RhiResourceState::ShaderResource);
        assert_eq!(barrier.inner().src_access_mask, vk::AccessFlags2::SHADER_STORAGE_WRITE);
        assert_eq!(barrier.inner().size, vk::WHOLE_SIZE);
    }
}
