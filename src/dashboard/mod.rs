//! 仪表盘主循环
//!
//! 串联地理编码、搜索编排与后台任务回报。所有状态变化都发生在 `run` 所在的单个任务里，
//! 外部任务只通过通道回报结果。

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::backend::{AnalysisBackend, CityTarget, Geocoder};
use crate::config::Config;
use crate::error::{DashboardError, DashboardResult};
use crate::map::MapSlot;
use crate::orchestrator::{
    BackendDispatcher, CompletionEffect, JobCompletion, SearchOrchestrator, SessionToken,
};
use crate::panels::ResultPanels;
use crate::tracker::JobKind;

/// 用户对仪表盘的操作
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardCommand {
    Search(String),
    Close,
    Minimize,
    Retry(JobKind),
    Chat(String),
    Shutdown,
}

/// 后台任务完成后回送给主循环的事件
#[derive(Debug)]
enum DashboardEvent {
    Geocoded {
        generation: u64,
        query: String,
        result: DashboardResult<CityTarget>,
    },
    ChatReplied {
        token: SessionToken,
        result: DashboardResult<String>,
    },
}

pub struct Dashboard {
    orchestrator: SearchOrchestrator,
    geocoder: Arc<dyn Geocoder>,
    backend: Arc<dyn AnalysisBackend>,
    panels: Arc<dyn ResultPanels>,
    completions: mpsc::UnboundedReceiver<JobCompletion>,
    events_tx: mpsc::UnboundedSender<DashboardEvent>,
    events_rx: mpsc::UnboundedReceiver<DashboardEvent>,
    geocode_generation: u64,
    pending_geocode: Option<AbortHandle>,
}

impl Dashboard {
    pub fn new(
        config: &Config,
        map: MapSlot,
        geocoder: Arc<dyn Geocoder>,
        backend: Arc<dyn AnalysisBackend>,
        panels: Arc<dyn ResultPanels>,
    ) -> Self {
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let dispatcher = Arc::new(BackendDispatcher::new(
            backend.clone(),
            config.backend.request_timeout(),
            completions_tx,
        ));
        let orchestrator = SearchOrchestrator::new(
            map,
            config.animation.clone(),
            dispatcher,
            panels.clone(),
        );

        Self {
            orchestrator,
            geocoder,
            backend,
            panels,
            completions,
            events_tx,
            events_rx,
            geocode_generation: 0,
            pending_geocode: None,
        }
    }

    pub fn orchestrator(&self) -> &SearchOrchestrator {
        &self.orchestrator
    }

    /// 处理命令直到收到 `Shutdown` 或命令通道关闭
    pub async fn run(mut self, mut commands: mpsc::Receiver<DashboardCommand>) -> Result<()> {
        tracing::info!("dashboard started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(DashboardCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(completion) = self.completions.recv() => {
                    let effect = self.orchestrator.complete(completion);
                    if effect == CompletionEffect::Revealed {
                        tracing::info!(phase = ?self.orchestrator.phase(), "results revealed");
                    }
                }
                Some(event) = self.events_rx.recv() => self.handle_event(event),
            }
        }

        self.shutdown();
        Ok(())
    }

    pub fn handle_command(&mut self, command: DashboardCommand) {
        match command {
            DashboardCommand::Search(query) => self.search(&query),
            DashboardCommand::Close => {
                if let Err(err) = self.orchestrator.close() {
                    println!("⚠️ {}", err);
                }
            }
            DashboardCommand::Minimize => {
                if let Err(err) = self.orchestrator.toggle_minimized() {
                    println!("⚠️ {}", err);
                }
            }
            DashboardCommand::Retry(job) => match self.orchestrator.retry(job) {
                Ok(true) => println!("🔄 正在重试 {} ...", job),
                Ok(false) => println!("⚠️ 当前没有可重试的 {} 面板", job),
                Err(err) => println!("⚠️ {}", err),
            },
            DashboardCommand::Chat(message) => self.chat(&message),
            DashboardCommand::Shutdown => self.shutdown(),
        }
    }

    /// 地理编码查询，较新的查询会取代仍在进行的旧查询
    fn search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        self.geocode_generation += 1;
        let generation = self.geocode_generation;
        if let Some(previous) = self.pending_geocode.take() {
            previous.abort();
        }

        println!("🌍 正在定位 \"{}\" ...", query);
        let geocoder = self.geocoder.clone();
        let events = self.events_tx.clone();
        let query = query.to_string();
        let handle = tokio::spawn(async move {
            let result = geocoder.lookup(&query).await;
            let _ = events.send(DashboardEvent::Geocoded {
                generation,
                query,
                result,
            });
        });
        self.pending_geocode = Some(handle.abort_handle());
    }

    fn chat(&mut self, message: &str) {
        let message = message.trim();
        if message.is_empty() {
            return;
        }

        let (token, city) = match self.orchestrator.begin_chat(message) {
            Ok(session) => session,
            Err(err) => {
                println!("⚠️ {}", err);
                return;
            }
        };
        let backend = self.backend.clone();
        let events = self.events_tx.clone();
        let message = message.to_string();
        tokio::spawn(async move {
            let result = backend.chat(&city, &message).await;
            let _ = events.send(DashboardEvent::ChatReplied { token, result });
        });
    }

    fn handle_event(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::Geocoded {
                generation,
                query,
                result,
            } => {
                if generation != self.geocode_generation {
                    tracing::debug!(generation, %query, "discarding superseded geocode result");
                    return;
                }
                self.pending_geocode = None;
                match result {
                    Ok(city) => {
                        self.orchestrator.submit(city);
                    }
                    Err(err) => {
                        tracing::warn!(%query, "geocoding failed: {}", err);
                        self.panels.search_failed(&query, &err);
                    }
                }
            }
            DashboardEvent::ChatReplied { token, result } => {
                self.orchestrator.finish_chat(token, result);
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(pending) = self.pending_geocode.take() {
            pending.abort();
        }
        match self.orchestrator.close() {
            Ok(token) => tracing::info!(%token, "closed live session on shutdown"),
            Err(DashboardError::NoActiveSession) => {}
            Err(err) => tracing::warn!("failed to close session: {}", err),
        }
        tracing::info!("dashboard stopped");
    }
}
