use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use geotaste_rs::backend::{HttpBackend, MapboxGeocoder};
use geotaste_rs::cli::{self, Args};
use geotaste_rs::map::{ConsoleMap, MapSlot};
use geotaste_rs::panels::ConsolePanels;
use geotaste_rs::{Dashboard, DashboardCommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let check_only = args.check;
    let initial_query = args.initial_query();
    let config = args.into_config()?;

    let default_level = if config.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let backend = Arc::new(HttpBackend::new(config.backend.clone())?);
    if check_only {
        backend.check_health().await?;
        return Ok(());
    }
    if config.geocoding.access_token.is_empty() {
        eprintln!("⚠️ 警告: 未配置Mapbox访问令牌，地理编码请求将会失败");
    }

    let geocoder = Arc::new(MapboxGeocoder::new(
        config.geocoding.clone(),
        config.backend.request_timeout(),
    )?);
    let map = MapSlot::with_handle(Arc::new(ConsoleMap::new(config.verbose)));
    let dashboard = Dashboard::new(
        &config,
        map,
        geocoder,
        backend,
        Arc::new(ConsolePanels::new()),
    );

    let (tx, rx) = mpsc::channel(16);
    if let Some(query) = initial_query {
        tx.send(DashboardCommand::Search(query)).await?;
    }

    println!("🚀 GeoTaste 已启动。输入城市名称开始搜索，:close / :min / :retry viz|narrative / :chat <问题> / :quit");
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!("failed to read stdin: {}", err);
                    break;
                }
            };
            match cli::parse_command(&line) {
                Ok(Some(command)) => {
                    let shutdown = command == DashboardCommand::Shutdown;
                    if tx.send(command).await.is_err() || shutdown {
                        break;
                    }
                }
                Ok(None) => {}
                Err(err) => println!("⚠️ {}", err),
            }
        }
    });

    dashboard.run(rx).await
}
