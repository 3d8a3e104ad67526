use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

/// 默认配置文件名，位于当前工作目录
pub const DEFAULT_CONFIG_FILE: &str = "geotaste.toml";

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// 分析后台配置
    pub backend: BackendConfig,

    /// 地理编码配置
    pub geocoding: GeocodingConfig,

    /// 代理动画配置
    pub animation: AnimationConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// 分析后台配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct BackendConfig {
    /// 后台基地址
    pub base_url: String,

    /// 可视化任务的数据条数
    pub visualization_limit: u32,

    /// 商业分析任务的数据条数
    pub narrative_limit: u32,

    /// 单个请求的超时时间（秒）
    pub request_timeout_seconds: u64,
}

/// 地理编码配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GeocodingConfig {
    /// 地点搜索接口基地址
    pub base_url: String,

    /// 访问令牌
    pub access_token: String,

    /// 结果中缺少国家信息时使用的国家代码
    pub default_country_code: String,

    /// 返回结果数
    pub result_limit: u32,
}

/// 代理动画配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnimationConfig {
    /// 巡游点数量
    pub point_count: usize,

    /// 巡游半径（度）
    pub radius_degrees: f64,

    /// 每一步的间隔（毫秒）
    pub tick_interval_ms: u64,

    /// 相机飞行时长（毫秒）
    pub fly_duration_ms: u64,

    /// 巡游缩放下限
    pub zoom_min: f64,

    /// 巡游缩放上限
    pub zoom_max: f64,

    /// 展示结果时城市视角的缩放级别
    pub city_zoom: f64,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.animation.validate()?;
        Ok(config)
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl AnimationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn fly_duration(&self) -> Duration {
        Duration::from_millis(self.fly_duration_ms)
    }

    /// 校验动画参数
    pub fn validate(&self) -> Result<()> {
        if self.point_count == 0 {
            bail!("animation.point_count must be positive");
        }
        if !(self.radius_degrees.is_finite() && self.radius_degrees > 0.0) {
            bail!("animation.radius_degrees must be a positive number");
        }
        if self.tick_interval_ms == 0 {
            bail!("animation.tick_interval_ms must be positive");
        }
        if !(self.zoom_min.is_finite() && self.zoom_max.is_finite() && self.city_zoom.is_finite()) {
            bail!("animation zoom levels must be finite numbers");
        }
        if self.zoom_min > self.zoom_max {
            bail!(
                "animation zoom band is inverted: {} > {}",
                self.zoom_min,
                self.zoom_max
            );
        }
        Ok(())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:5000"),
            visualization_limit: 20,
            narrative_limit: 30,
            request_timeout_seconds: 30,
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://api.mapbox.com/geocoding/v5/mapbox.places"),
            access_token: std::env::var("GEOTASTE_MAPBOX_TOKEN").unwrap_or_default(),
            default_country_code: String::from("US"),
            result_limit: 1,
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            point_count: 8,
            radius_degrees: 0.02,
            tick_interval_ms: 1800,
            fly_duration_ms: 1200,
            zoom_min: 13.0,
            zoom_max: 15.0,
            city_zoom: 12.0,
        }
    }
}

// Include tests
#[cfg(test)]
mod tests;
