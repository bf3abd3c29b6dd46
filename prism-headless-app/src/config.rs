use prism_render_graph::RgConfig;
use serde::Deserialize;

/// `prism.toml`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PrismConfig {
    pub app: AppConfig,
    pub graph: RgConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 渲染的帧数
    pub frames: u32,
    /// swapchain 尺寸
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            frames: 3,
            width: 1280,
            height: 720,
        }
    }
}
