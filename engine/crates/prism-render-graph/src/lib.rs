//! Prism Render Graph
//!
//! 每帧重建的声明式渲染图。pass 在 setup 阶段声明读写的虚拟资源，
//! 图负责推导执行顺序、计算资源生命周期、自动插入 barrier，最后交给后端录制。
//!
//! # 使用流程
//!
//! 1. 创建图: `RenderGraph::new(config)`
//! 2. 导入外部资源: `graph.import_texture(...)`
//! 3. 添加 Pass: `graph.add_pass("name", setup, execute)`，setup 会立即执行
//! 4. 编译: `graph.compile()?`（排序 → 生命周期 → barrier）
//! 5. 执行: `graph.execute(cmd, device)?`
//! 6. 下一帧开始前: `graph.clear()`
//!
//! # 模块
//!
//! - `handle`: 虚拟资源与 pass 句柄
//! - `arena`: pass 私有数据的分配器
//! - `builder`: setup 阶段使用的 `RgPassBuilder`
//! - `registry`: 执行期 handle → 物理资源 的查询表
//! - `resource_cache`: 跨帧复用的临时资源缓存
//! - `pipeline_cache`: 管线缓存与着色器库
//! - `graph` / `executor`: 编译与执行
//! - `dump`: 调试输出

/// 在开启 `profiling` feature 时创建一个 tracy span
macro_rules! profile_scope {
    ($name:literal) => {
        #[cfg(feature = "profiling")]
        let _span = tracy_client::span!($name);
    };
}

pub mod arena;
pub mod barrier;
pub mod builder;
pub mod config;
pub mod dependency;
pub mod dump;
pub mod error;
pub mod executor;
pub mod graph;
pub mod handle;
pub mod pass;
pub mod pipeline_cache;
pub mod registry;
pub mod resource;
pub mod resource_cache;

pub use arena::RgPassArena;
pub use barrier::RgBarrier;
pub use builder::{RgPassBuilder, RgPassServices};
pub use config::RgConfig;
pub use dump::RgGraphDump;
pub use error::{RgError, RgResult};
pub use graph::RenderGraph;
pub use handle::{RgPassDataHandle, RgPassHandle, RgResourceHandle};
pub use pass::{RgAttachmentInfo, RgExecuteFn, RgPassContext, RgPassNode};
pub use pipeline_cache::{RgPipelineCache, RgShaderLibrary};
pub use registry::RgRegistry;
pub use resource::{RgLifetime, RgPhysicalResource, RgResourceDesc, RgResourceNode};
pub use resource_cache::RgResourceCache;
