use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::{CityTarget, Narrative, VisualizationSet};
use crate::error::DashboardResult;
use crate::tracker::{JobKind, JobOutcome};

/// 会话令牌，单调递增；回调到达时与当前会话比对
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn first() -> Self {
        Self(1)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 单个面板的展示内容
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PanelContent<T> {
    #[default]
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> PanelContent<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, PanelContent::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PanelContent::Error(_))
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            PanelContent::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<DashboardResult<T>> for PanelContent<T> {
    fn from(result: DashboardResult<T>) -> Self {
        match result {
            Ok(value) => PanelContent::Loaded(value),
            Err(err) => PanelContent::Error(err.to_string()),
        }
    }
}

/// 一个任务的结果载荷
#[derive(Debug, Clone, PartialEq)]
pub enum JobPayload {
    Visualization(DashboardResult<VisualizationSet>),
    Narrative(DashboardResult<Narrative>),
}

impl JobPayload {
    pub fn failed(job: JobKind, error: crate::error::DashboardError) -> Self {
        match job {
            JobKind::Visualization => JobPayload::Visualization(Err(error)),
            JobKind::Narrative => JobPayload::Narrative(Err(error)),
        }
    }

    pub fn job(&self) -> JobKind {
        match self {
            JobPayload::Visualization(_) => JobKind::Visualization,
            JobPayload::Narrative(_) => JobKind::Narrative,
        }
    }

    pub fn outcome(&self) -> JobOutcome {
        let ok = match self {
            JobPayload::Visualization(result) => result.is_ok(),
            JobPayload::Narrative(result) => result.is_ok(),
        };
        if ok { JobOutcome::Ready } else { JobOutcome::Failed }
    }
}

/// 带会话令牌的任务完成通知
#[derive(Debug, Clone, PartialEq)]
pub struct JobCompletion {
    pub token: SessionToken,
    pub payload: JobPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

pub const CHAT_ERROR_REPLY: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";

/// 一次用户发起的城市搜索
#[derive(Debug, Clone)]
pub struct SearchSession {
    pub token: SessionToken,
    pub city: CityTarget,
    pub visualizations: PanelContent<VisualizationSet>,
    pub narrative: PanelContent<Narrative>,
    pub chat: Vec<ChatMessage>,
    pub minimized: bool,
    pub visible: bool,
    pub started_at: DateTime<Utc>,
    pub revealed_at: Option<DateTime<Utc>>,
    retries: HashSet<JobKind>,
}

impl SearchSession {
    pub fn new(token: SessionToken, city: CityTarget) -> Self {
        Self {
            token,
            city,
            visualizations: PanelContent::Loading,
            narrative: PanelContent::Loading,
            chat: Vec::new(),
            minimized: false,
            visible: false,
            started_at: Utc::now(),
            revealed_at: None,
            retries: HashSet::new(),
        }
    }

    /// 把任务结果写入对应面板
    pub(crate) fn apply(&mut self, payload: JobPayload) {
        match payload {
            JobPayload::Visualization(result) => self.visualizations = result.into(),
            JobPayload::Narrative(result) => {
                if let Ok(narrative) = &result {
                    self.chat = vec![ChatMessage::new(
                        ChatRole::Assistant,
                        format!(
                            "🤖 **Business Environment Analysis for {}**\n\n{}\n\n💡 You can ask me specific questions about the business environment, market opportunities, or any other business-related topics!",
                            self.city.name, narrative.analysis
                        ),
                    )];
                }
                self.narrative = result.into();
            }
        }
    }

    pub fn panel_is_error(&self, job: JobKind) -> bool {
        match job {
            JobKind::Visualization => self.visualizations.is_error(),
            JobKind::Narrative => self.narrative.is_error(),
        }
    }

    pub(crate) fn begin_retry(&mut self, job: JobKind) {
        match job {
            JobKind::Visualization => self.visualizations = PanelContent::Loading,
            JobKind::Narrative => self.narrative = PanelContent::Loading,
        }
        self.retries.insert(job);
    }

    /// 消费一次重试标记，返回该任务是否处于重试中
    pub(crate) fn finish_retry(&mut self, job: JobKind) -> bool {
        self.retries.remove(&job)
    }

    pub fn is_retrying(&self, job: JobKind) -> bool {
        self.retries.contains(&job)
    }

    pub fn chat_available(&self) -> bool {
        self.narrative.loaded().is_some()
    }
}
