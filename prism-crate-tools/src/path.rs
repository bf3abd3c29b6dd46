use std::path::{Path, PathBuf};

/// 统一路径管理
///
/// 所有路径基于工作区根目录（通过 `CARGO_MANIFEST_DIR` 推导）。
///
/// # 使用示例
/// ```ignore
/// let config = PrismPath::config_path("prism.toml"); // <workspace>/prism.toml
/// let dump = PrismPath::visualizer_path("graph.json"); // <workspace>/docs/visualizers/graph.json
/// ```
pub struct PrismPath {}
// 核心路径
impl PrismPath {
    /// 获取工作区根目录
    pub fn workspace_path() -> PathBuf {
        // 当前 crate 位于 workspace 根目录下一层
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        manifest_dir.parent().unwrap_or(manifest_dir).to_path_buf()
    }

    pub fn target_path() -> PathBuf {
        Self::workspace_path().join("target")
    }
}
// 根目录下
impl PrismPath {
    /// 获取工作区根目录下的配置文件路径
    pub fn config_path(filename: &str) -> PathBuf {
        Self::workspace_path().join(filename)
    }

    /// render graph 调试导出的目录：`docs/visualizers/`
    pub fn visualizer_path(filename: &str) -> PathBuf {
        Self::workspace_path().join("docs").join("visualizers").join(filename)
    }
}
