use serde::Deserialize;
use std::path::PathBuf;

/// Render graph 配置
///
/// 通常作为应用配置文件中的 `[graph]` 段加载，缺省字段使用默认值。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RgConfig {
    /// pass 私有数据 arena 的字节预算
    pub pass_arena_bytes: usize,
    /// 是否拒绝两个 pass 写入同一个资源（读写同一资源的 pass 除外）
    pub strict_single_writer: bool,
    /// 编译成功后把 graph 的 JSON 写到这个路径
    pub dump_graph: Option<PathBuf>,
    /// 编译成功后打印执行计划
    pub log_execution_plan: bool,
}

impl Default for RgConfig {
    fn default() -> Self {
        Self {
            pass_arena_bytes: 64 * 1024,
            strict_single_writer: true,
            dump_graph: None,
            log_execution_plan: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_crate_tools::config::parse_toml;

    #[test]
    fn test_defaults() {
        let config = RgConfig::default();
        assert_eq!(config.pass_arena_bytes, 65536);
        assert!(config.strict_single_writer);
        assert!(config.dump_graph.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: RgConfig = parse_toml(
            r#"
            strict_single_writer = false
            dump_graph = "target/graph.json"
            "#,
        )
        .unwrap();

        assert!(!config.strict_single_writer);
        assert_eq!(config.dump_graph, Some(PathBuf::from("target/graph.json")));
        assert_eq!(config.pass_arena_bytes, RgConfig::default().pass_arena_bytes);
    }
}
