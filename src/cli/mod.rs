use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::dashboard::DashboardCommand;
use crate::tracker::JobKind;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;

/// GeoTaste - 城市商业环境仪表盘
#[derive(Parser, Debug)]
#[command(name = "geotaste")]
#[command(
    about = "City business-environment dashboard. Geocodes a city, runs the visualization and business analysis jobs side by side and shows both panels once they have settled."
)]
#[command(version)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 分析后台基地址
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Mapbox访问令牌
    #[arg(long)]
    pub mapbox_token: Option<String>,

    /// 地理编码结果缺少国家信息时使用的国家代码
    #[arg(long)]
    pub default_country: Option<String>,

    /// 后台请求超时时间（秒）
    #[arg(long)]
    pub timeout: Option<u64>,

    /// 只检查后台健康状态后退出
    #[arg(long)]
    pub check: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 启动后立即搜索的城市
    pub query: Vec<String>,
}

impl Args {
    /// 启动时的初始查询
    pub fn initial_query(&self) -> Option<String> {
        let query = self.query.join(" ");
        let query = query.trim();
        (!query.is_empty()).then(|| query.to_string())
    }

    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = if let Some(config_path) = &self.config {
            // 显式指定的配置文件必须可读
            Config::from_file(config_path)
                .with_context(|| format!("无法读取配置文件 {:?}", config_path))?
        } else {
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_CONFIG_FILE);

            if default_config_path.exists() {
                Config::from_file(&default_config_path).with_context(|| {
                    format!("无法读取默认配置文件 {:?}", default_config_path)
                })?
            } else {
                Config::default()
            }
        };

        // 覆盖配置文件中的设置
        if let Some(backend_url) = self.backend_url {
            config.backend.base_url = backend_url;
        }
        if let Some(token) = self.mapbox_token {
            config.geocoding.access_token = token;
        }
        if let Some(country) = self.default_country {
            let country = country.trim().to_uppercase();
            if country.is_empty() {
                eprintln!("⚠️ 警告: 国家代码为空，使用默认值 {}", config.geocoding.default_country_code);
            } else {
                config.geocoding.default_country_code = country;
            }
        }
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                bail!("--timeout must be positive");
            }
            config.backend.request_timeout_seconds = timeout;
        }
        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }
}

/// 解析交互输入的一行
///
/// 普通文本视为城市搜索，`:` 开头的是面板操作；空行返回 `None`。
pub fn parse_command(line: &str) -> Result<Option<DashboardCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Some(DashboardCommand::Search(line.to_string())));
    };

    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };
    let command = match name.to_lowercase().as_str() {
        "close" => DashboardCommand::Close,
        "min" | "minimize" => DashboardCommand::Minimize,
        "retry" => {
            if argument.is_empty() {
                bail!("usage: :retry viz|narrative");
            }
            let job = argument.parse::<JobKind>().map_err(anyhow::Error::msg)?;
            DashboardCommand::Retry(job)
        }
        "chat" => {
            if argument.is_empty() {
                bail!("usage: :chat <message>");
            }
            DashboardCommand::Chat(argument.to_string())
        }
        "quit" | "exit" | "q" => DashboardCommand::Shutdown,
        other => bail!("unknown command :{}", other),
    };
    Ok(Some(command))
}
