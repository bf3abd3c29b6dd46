//! 调试输出
//!
//! - `dump()` / `dump_json()` / `write_dump()`：给外部可视化工具使用的 JSON
//! - `print_execution_plan()`：通过 `log::info!` 打印执行计划

use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::graph::RenderGraph;
use crate::handle::RgPassHandle;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RgGraphDump {
    pub resources: Vec<RgResourceDump>,
    pub passes: Vec<RgPassDump>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RgResourceDump {
    pub id: u16,
    pub name: String,
    pub first_pass: i32,
    pub last_pass: i32,
    pub imported: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RgPassDump {
    pub id: u32,
    pub name: String,
    pub barriers: Vec<RgBarrierDump>,
    pub writes: Vec<u16>,
    pub reads: Vec<u16>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RgBarrierDump {
    pub res: u16,
    pub from: String,
    pub to: String,
}

impl RenderGraph {
    /// 导出 graph 的结构
    ///
    /// 编译成功后 pass 按执行顺序排列，否则按声明顺序。
    pub fn dump(&self) -> RgGraphDump {
        let resources = self
            .resources
            .iter()
            .map(|node| RgResourceDump {
                id: node.handle.id(),
                name: node.name.clone(),
                first_pass: node.lifetime.first_pass,
                last_pass: node.lifetime.last_pass,
                imported: node.is_imported(),
            })
            .collect();

        let passes = self
            .dump_order()
            .into_iter()
            .filter_map(|handle| {
                let pass = self.passes.get(handle.index())?;
                Some(RgPassDump {
                    id: handle.id(),
                    name: pass.name.clone(),
                    barriers: pass
                        .barriers
                        .iter()
                        .map(|b| RgBarrierDump {
                            res: b.resource.id(),
                            from: b.before.name().to_string(),
                            to: b.after.name().to_string(),
                        })
                        .collect(),
                    writes: pass.writes.iter().map(|w| w.handle.id()).collect(),
                    reads: pass.reads.iter().map(|r| r.id()).collect(),
                })
            })
            .collect();

        RgGraphDump { resources, passes }
    }

    pub fn dump_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.dump())
    }

    pub fn write_dump(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &self.dump())?;
        log::info!("RenderGraph: graph dumped to {:?}", path);
        Ok(())
    }

    fn dump_order(&self) -> Vec<RgPassHandle> {
        if self.compiled {
            self.execution_order.clone()
        } else {
            (0..self.passes.len()).map(|i| RgPassHandle::new(i as u32)).collect()
        }
    }

    /// 打印执行计划（用于调试）
    ///
    /// 输出每个 Pass 的执行顺序、读写的资源以及 barrier 的状态转换。
    pub fn print_execution_plan(&self) {
        log::info!("╔══════════════════════════════════════════════════════════════════╗");
        log::info!("║              RenderGraph Execution Plan                          ║");
        log::info!("╠══════════════════════════════════════════════════════════════════╣");
        log::info!(
            "║ Total Passes: {}  |  Execution Order: [{}]",
            self.passes.len(),
            self.sorted_pass_names().join(" → ")
        );
        log::info!("╚══════════════════════════════════════════════════════════════════╝");

        for (order, pass_handle) in self.execution_order.iter().enumerate() {
            let pass = &self.passes[pass_handle.index()];

            log::info!("┌─────────────────────────────────────────────────────────────────┐");
            log::info!("│ [{}/{}] Pass: \"{}\"", order + 1, self.execution_order.len(), pass.name);
            log::info!("├─────────────────────────────────────────────────────────────────┤");

            if !pass.reads.is_empty() {
                log::info!("│ Reads:");
                for handle in &pass.reads {
                    log::info!("│   📖 \"{}\"", self.resources.name_of(*handle));
                }
            }

            if !pass.writes.is_empty() {
                log::info!("│ Writes:");
                for write in &pass.writes {
                    log::info!("│   ✏️  \"{}\" (load: {:?})", self.resources.name_of(write.handle), write.load_op);
                }
            }

            if !pass.barriers.is_empty() {
                log::info!("├─────────────────────────────────────────────────────────────────┤");
                log::info!("│ Barriers: {}", pass.barriers.len());
                for barrier in &pass.barriers {
                    log::info!(
                        "│   🔒 \"{}\": {} → {}",
                        self.resources.name_of(barrier.resource),
                        barrier.before,
                        barrier.after
                    );
                }
            }
            log::info!("└─────────────────────────────────────────────────────────────────┘");
        }

        for node in self.resources.iter() {
            log::info!(
                "Resource \"{}\"{}: passes [{}, {}]",
                node.name,
                if node.is_imported() { " (imported)" } else { "" },
                node.lifetime.first_pass,
                node.lifetime.last_pass
            );
        }
    }
}
