//! RenderGraph 本体：pass 声明与编译
//!
//! 编译分为三个线性阶段：排序 → 生命周期 → barrier。
//! 任意阶段失败时不保留部分结果，graph 标记为未编译，不能执行。

use itertools::Itertools;
use prism_rhi::{RhiBuffer, RhiBufferDesc, RhiResourceState, RhiTexture, RhiTextureDesc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::arena::RgPassArena;
use crate::barrier::{READ_STATE, RgBarrier};
use crate::builder::{RgPassBuilder, RgPassServices};
use crate::config::RgConfig;
use crate::dependency::RgDependencyGraph;
use crate::error::{RgError, RgResult};
use crate::handle::{RgPassHandle, RgResourceHandle};
use crate::pass::{RgExecuteFn, RgPassExecutor, RgPassNode, RgPassSlot};
use crate::registry::RgRegistry;
use crate::resource::{RgLifetime, RgPhysicalResource, RgResourceDesc, RgResourceNode, RgResourceTable};
use crate::resource_cache::RgResourceCache;

/// 渲染图
///
/// 持有一代 graph 的所有 pass 与资源。registry 与 resource cache 在多次调用之间保留，
/// 其余状态在 `clear()` 时重置。只支持单线程使用。
pub struct RenderGraph {
    pub(crate) config: RgConfig,

    pub(crate) resources: RgResourceTable,
    /// Pass 节点列表（按声明顺序）
    pub(crate) passes: Vec<RgPassNode>,
    /// 执行顺序（拓扑排序后）
    pub(crate) execution_order: Vec<RgPassHandle>,
    pub(crate) compiled: bool,

    pub(crate) arena: RgPassArena,
    pub(crate) registry: RgRegistry,
    pub(crate) cache: RgResourceCache,
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::new(RgConfig::default())
    }
}

// new & init
impl RenderGraph {
    pub fn new(config: RgConfig) -> Self {
        Self {
            arena: RgPassArena::new(config.pass_arena_bytes),
            config,
            resources: RgResourceTable::default(),
            passes: Vec::new(),
            execution_order: Vec::new(),
            compiled: false,
            registry: RgRegistry::default(),
            cache: RgResourceCache::default(),
        }
    }

    /// 开始新的一帧：清空 pass、资源、registry 和 arena，resource cache 保留
    pub fn clear(&mut self) {
        self.passes.clear();
        self.resources.clear();
        self.execution_order.clear();
        self.registry.clear();
        self.arena.reset();
        self.compiled = false;
    }

    /// 释放所有缓存的临时资源
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

// pass 声明
impl RenderGraph {
    /// 添加 Pass
    ///
    /// `setup` 会立即执行，用于声明读写并填充 pass 数据；
    /// `execute` 在 `RenderGraph::execute` 时按排序后的顺序调用。
    pub fn add_pass<T: Default + 'static>(
        &mut self,
        name: &str,
        setup: impl FnOnce(&mut RgPassBuilder<'_>, &mut T),
        execute: RgExecuteFn<T>,
    ) -> RgResult<RgPassHandle> {
        self.add_pass_internal(name, None, setup, execute)
    }

    /// 添加 Pass，setup 中可以通过 builder 创建 pipeline、加载 shader
    pub fn add_pass_with_services<T: Default + 'static>(
        &mut self,
        name: &str,
        services: &mut RgPassServices<'_>,
        setup: impl FnOnce(&mut RgPassBuilder<'_>, &mut T),
        execute: RgExecuteFn<T>,
    ) -> RgResult<RgPassHandle> {
        self.add_pass_internal(name, Some(services.reborrow()), setup, execute)
    }

    fn add_pass_internal<T: Default + 'static>(
        &mut self,
        name: &str,
        services: Option<RgPassServices<'_>>,
        setup: impl FnOnce(&mut RgPassBuilder<'_>, &mut T),
        execute: RgExecuteFn<T>,
    ) -> RgResult<RgPassHandle> {
        let data = self.arena.alloc(RgPassSlot {
            data: T::default(),
            execute,
        })?;

        let mut builder = RgPassBuilder::new(name, &mut self.resources, services);
        if let Some(slot) = self.arena.get_mut::<RgPassSlot<T>>(data) {
            setup(&mut builder, &mut slot.data);
        }
        let RgPassBuilder {
            reads,
            writes,
            diagnostics,
            ..
        } = builder;

        let handle = RgPassHandle::new(self.passes.len() as u32);
        self.passes.push(RgPassNode {
            name: name.to_string(),
            reads,
            writes,
            barriers: Vec::new(),
            diagnostics,
            executor: RgPassExecutor::new::<T>(data),
        });
        self.compiled = false;
        Ok(handle)
    }
}

// 资源声明
impl RenderGraph {
    /// 创建临时资源，返回的句柄等于节点下标
    pub fn create_resource(&mut self, name: &str, desc: RgResourceDesc) -> RgResourceHandle {
        self.compiled = false;
        self.resources.push(name, desc, None)
    }

    #[inline]
    pub fn create_texture(&mut self, name: &str, desc: RhiTextureDesc) -> RgResourceHandle {
        self.create_resource(name, RgResourceDesc::Texture(desc))
    }

    #[inline]
    pub fn create_buffer(&mut self, name: &str, desc: RhiBufferDesc) -> RgResourceHandle {
        self.create_resource(name, RgResourceDesc::Buffer(desc))
    }

    /// 导入外部纹理
    ///
    /// graph 不负责它的创建与销毁；`initial_state` 是它进入 graph 时的状态。
    pub fn import_texture(
        &mut self,
        name: &str,
        texture: Arc<dyn RhiTexture>,
        initial_state: RhiResourceState,
    ) -> RgResourceHandle {
        let desc = texture.desc().clone().with_initial_state(initial_state);
        let handle =
            self.resources.push(name, RgResourceDesc::Texture(desc), Some(RgPhysicalResource::Texture(texture.clone())));
        if handle.is_valid() {
            self.registry.import_texture(handle, texture);
        }
        self.compiled = false;
        handle
    }

    /// 导入外部缓冲区
    pub fn import_buffer(
        &mut self,
        name: &str,
        buffer: Arc<dyn RhiBuffer>,
        initial_state: RhiResourceState,
    ) -> RgResourceHandle {
        let desc = buffer.desc().clone().with_initial_state(initial_state);
        let handle =
            self.resources.push(name, RgResourceDesc::Buffer(desc), Some(RgPhysicalResource::Buffer(buffer.clone())));
        if handle.is_valid() {
            self.registry.import_buffer(handle, buffer);
        }
        self.compiled = false;
        handle
    }

    /// 按名称查找资源
    pub fn get_resource(&self, name: &str) -> RgResult<RgResourceHandle> {
        self.resources.find(name).ok_or_else(|| {
            log::warn!("RenderGraph: resource '{}' not found", name);
            RgError::ResourceNotFound(name.to_string())
        })
    }
}

// 编译
impl RenderGraph {
    /// 编译渲染图：排序 → 生命周期 → barrier
    ///
    /// 失败时之前的执行顺序保持不变，但 graph 标记为未编译，本帧不能执行。
    pub fn compile(&mut self) -> RgResult<()> {
        profile_scope!("RenderGraph::compile");
        self.compiled = false;

        self.check_writers()?;
        self.execution_order = self.sort_passes()?;
        self.calculate_lifetimes();
        self.calculate_barriers();
        self.compiled = true;

        log::debug!(
            "RenderGraph: compiled {} passes, {} resources: [{}]",
            self.passes.len(),
            self.resources.len(),
            self.sorted_pass_names().join(" → ")
        );
        if self.config.log_execution_plan {
            self.print_execution_plan();
        }
        if let Some(path) = &self.config.dump_graph {
            if let Err(err) = self.write_dump(path) {
                log::warn!("RenderGraph: failed to write graph dump to {:?}: {}", path, err);
            }
        }
        Ok(())
    }

    /// 检查写后写
    ///
    /// 同时读取该资源的写入者视为读-改-写链，依赖边会保证它们的顺序；
    /// 只写不读的写入者多于一个时顺序没有定义，严格模式下报错，宽松模式下按声明顺序执行并给出警告。
    fn check_writers(&self) -> RgResult<()> {
        let mut pure_writers: HashMap<RgResourceHandle, Vec<usize>> = HashMap::new();
        for (pass_idx, pass) in self.passes.iter().enumerate() {
            for write in &pass.writes {
                if !pass.reads_resource(write.handle) {
                    pure_writers.entry(write.handle).or_default().push(pass_idx);
                }
            }
        }

        for (handle, writers) in pure_writers.iter().sorted_by_key(|(handle, _)| handle.id()) {
            let [first, second, ..] = writers.as_slice() else {
                continue;
            };
            let resource = self.resources.name_of(*handle).to_string();
            let first = self.passes[*first].name.clone();
            let second = self.passes[*second].name.clone();
            if self.config.strict_single_writer {
                log::error!("RenderGraph: resource '{}' written by both '{}' and '{}'", resource, first, second);
                return Err(RgError::MultipleWriters {
                    resource,
                    first,
                    second,
                });
            }
            log::warn!(
                "RenderGraph: resource '{}' written by both '{}' and '{}', order is not defined",
                resource,
                first,
                second
            );
        }
        Ok(())
    }

    /// 拓扑排序
    fn sort_passes(&self) -> RgResult<Vec<RgPassHandle>> {
        self.order_passes(&RgDependencyGraph::build(&self.passes))
    }

    fn order_passes(&self, dep_graph: &RgDependencyGraph) -> RgResult<Vec<RgPassHandle>> {
        match dep_graph.topological_sort() {
            Ok(order) => Ok(order.into_iter().map(|i| RgPassHandle::new(i as u32)).collect()),
            Err(cycle) => {
                let passes = cycle.iter().map(|&i| self.passes[i].name.clone()).collect_vec();
                log::error!("RenderGraph: cycle detected involving passes: {:?}", passes);
                Err(RgError::CyclicDependency { passes })
            }
        }
    }

    /// 在排序后的顺序上计算每个资源的 [first, last] 区间
    fn calculate_lifetimes(&mut self) {
        for node in self.resources.iter_mut() {
            node.lifetime = RgLifetime::UNTOUCHED;
        }

        for (order, pass_handle) in self.execution_order.iter().enumerate() {
            let pass = &self.passes[pass_handle.index()];
            for handle in pass.touched_resources() {
                if let Some(node) = self.resources.get_mut(handle) {
                    node.lifetime.touch(order as i32);
                }
            }
        }
    }

    /// 模拟执行顺序，跟踪资源状态，为每个 pass 生成 barrier
    ///
    /// 同一个 pass 内先处理读再处理写，写入状态覆盖读取状态，每个资源至多一个 barrier。
    fn calculate_barriers(&mut self) {
        let mut states: Vec<RhiResourceState> = self.resources.iter().map(|node| node.desc.initial_state()).collect();

        for pass_handle in &self.execution_order {
            let pass = &mut self.passes[pass_handle.index()];

            // 保持声明顺序，便于调试输出稳定
            let mut usage: Vec<(RgResourceHandle, RhiResourceState)> = Vec::new();
            for &handle in &pass.reads {
                if !usage.iter().any(|(h, _)| *h == handle) {
                    usage.push((handle, READ_STATE));
                }
            }
            for write in &pass.writes {
                let Some(node) = self.resources.get(write.handle) else {
                    continue;
                };
                let target = node.desc.write_state();
                match usage.iter_mut().find(|(h, _)| *h == write.handle) {
                    Some(entry) => entry.1 = target,
                    None => usage.push((write.handle, target)),
                }
            }

            pass.barriers.clear();
            for (handle, target) in usage {
                let Some(current) = states.get_mut(handle.index()) else {
                    continue;
                };
                if *current != target {
                    pass.barriers.push(RgBarrier::new(handle, *current, target));
                    *current = target;
                }
            }
        }
    }
}

// getters
impl RenderGraph {
    #[inline]
    pub fn config(&self) -> &RgConfig {
        &self.config
    }

    #[inline]
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    #[inline]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    #[inline]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// 执行顺序（拓扑排序后）
    #[inline]
    pub fn execution_order(&self) -> &[RgPassHandle] {
        &self.execution_order
    }

    pub fn sorted_pass_names(&self) -> Vec<&str> {
        self.execution_order.iter().map(|h| self.passes[h.index()].name.as_str()).collect()
    }

    pub fn pass(&self, pass: RgPassHandle) -> Option<&RgPassNode> {
        self.passes.get(pass.index())
    }

    pub fn pass_name(&self, pass: RgPassHandle) -> Option<&str> {
        self.pass(pass).map(|p| p.name.as_str())
    }

    /// 编译后的 barrier
    pub fn pass_barriers(&self, pass: RgPassHandle) -> &[RgBarrier] {
        self.pass(pass).map(|p| p.barriers.as_slice()).unwrap_or_default()
    }

    /// setup 阶段记录的查找错误
    pub fn pass_diagnostics(&self, pass: RgPassHandle) -> &[RgError] {
        self.pass(pass).map(|p| p.diagnostics.as_slice()).unwrap_or_default()
    }

    pub fn resource(&self, handle: RgResourceHandle) -> Option<&RgResourceNode> {
        self.resources.get(handle)
    }

    pub fn resource_desc(&self, handle: RgResourceHandle) -> Option<&RgResourceDesc> {
        self.resources.get(handle).map(|node| &node.desc)
    }

    pub fn resource_lifetime(&self, handle: RgResourceHandle) -> Option<RgLifetime> {
        self.resources.get(handle).map(|node| node.lifetime)
    }

    pub fn resources(&self) -> impl Iterator<Item = &RgResourceNode> {
        self.resources.iter()
    }

    #[inline]
    pub fn registry(&self) -> &RgRegistry {
        &self.registry
    }

    #[inline]
    pub fn resource_cache(&self) -> &RgResourceCache {
        &self.cache
    }

    #[inline]
    pub fn arena(&self) -> &RgPassArena {
        &self.arena
    }
}
