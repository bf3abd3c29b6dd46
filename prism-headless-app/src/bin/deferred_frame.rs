//! Headless 延迟渲染帧
//!
//! 读取工作区根目录下的 `prism.toml`（不存在时使用默认配置），
//! 通过 headless 后端渲染若干帧并打印每帧的调度结果。

use prism_crate_tools::config::load_toml_or_default;
use prism_crate_tools::init_log::init_log;
use prism_crate_tools::path::PrismPath;
use prism_headless_app::app::HeadlessApp;
use prism_headless_app::config::PrismConfig;

fn main() -> anyhow::Result<()> {
    init_log();

    #[cfg(feature = "profiling")]
    let _tracy = tracy_client::Client::start();

    let config: PrismConfig = load_toml_or_default(PrismPath::config_path("prism.toml"))?;
    let mut app = HeadlessApp::new(config)?;
    let stats = app.run()?;

    let skipped = stats.iter().filter(|s| s.is_none()).count();
    if skipped > 0 {
        log::warn!("{} frame(s) skipped because the graph failed to compile", skipped);
    }
    Ok(())
}
