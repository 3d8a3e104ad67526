use std::sync::{Arc, Mutex, MutexGuard};

use super::ResultPanels;
use crate::error::DashboardError;
use crate::orchestrator::{SearchSession, SessionToken};
use crate::tracker::JobKind;

/// 面板收到的一次通知
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    SearchStarted(SessionToken, String),
    Revealed(SessionToken, String),
    PanelUpdated(SessionToken, JobKind),
    ChatUpdated(SessionToken, usize),
    Minimized(SessionToken, bool),
    Closed,
    SearchFailed(String, DashboardError),
}

/// 记录全部通知与最近一次展示的会话快照
#[derive(Clone, Default)]
pub struct RecordingPanels {
    events: Arc<Mutex<Vec<PanelEvent>>>,
    journal: Option<Arc<Mutex<Vec<String>>>>,
    last_revealed: Arc<Mutex<Option<SearchSession>>>,
    latest: Arc<Mutex<Option<SearchSession>>>,
}

impl RecordingPanels {
    pub fn new() -> Self {
        Self::default()
    }

    /// 与地图共享的顺序日志
    pub fn with_journal(journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<PanelEvent> {
        lock(&self.events).clone()
    }

    pub fn reveal_count(&self) -> usize {
        lock(&self.events)
            .iter()
            .filter(|event| matches!(event, PanelEvent::Revealed(..)))
            .count()
    }

    pub fn last_revealed(&self) -> Option<SearchSession> {
        lock(&self.last_revealed).clone()
    }

    /// 最近一次通知携带的会话快照
    pub fn latest(&self) -> Option<SearchSession> {
        lock(&self.latest).clone()
    }

    fn push(&self, event: PanelEvent, session: Option<&SearchSession>) {
        if let Some(journal) = &self.journal {
            let entry = match &event {
                PanelEvent::SearchStarted(..) => "panels:search_started",
                PanelEvent::Revealed(..) => "panels:reveal",
                PanelEvent::PanelUpdated(..) => "panels:panel_updated",
                PanelEvent::ChatUpdated(..) => "panels:chat_updated",
                PanelEvent::Minimized(..) => "panels:minimized",
                PanelEvent::Closed => "panels:closed",
                PanelEvent::SearchFailed(..) => "panels:search_failed",
            };
            lock(journal).push(entry.to_string());
        }
        if let Some(session) = session {
            *lock(&self.latest) = Some(session.clone());
        }
        lock(&self.events).push(event);
    }
}

impl ResultPanels for RecordingPanels {
    fn search_started(&self, session: &SearchSession) {
        self.push(
            PanelEvent::SearchStarted(session.token, session.city.name.clone()),
            Some(session),
        );
    }

    fn reveal(&self, session: &SearchSession) {
        *lock(&self.last_revealed) = Some(session.clone());
        self.push(
            PanelEvent::Revealed(session.token, session.city.name.clone()),
            Some(session),
        );
    }

    fn panel_updated(&self, session: &SearchSession, job: JobKind) {
        self.push(PanelEvent::PanelUpdated(session.token, job), Some(session));
    }

    fn chat_updated(&self, session: &SearchSession) {
        self.push(
            PanelEvent::ChatUpdated(session.token, session.chat.len()),
            Some(session),
        );
    }

    fn minimized(&self, session: &SearchSession) {
        self.push(
            PanelEvent::Minimized(session.token, session.minimized),
            Some(session),
        );
    }

    fn closed(&self) {
        *lock(&self.latest) = None;
        self.push(PanelEvent::Closed, None);
    }

    fn search_failed(&self, query: &str, error: &DashboardError) {
        self.push(
            PanelEvent::SearchFailed(query.to_string(), error.clone()),
            None,
        );
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
