//! 搜索编排状态机
//!
//! `Idle → Searching → Settling → Revealed`，任意状态收到新查询都会回到 `Searching`。
//! 新会话开始时同步重置跟踪器、启动代理动画、派发两个任务；
//! 两个任务都结算后先停动画，再展示面板。迟到的回调按会话令牌丢弃。

use std::sync::Arc;

use crate::agent::AgentAnimator;
use crate::backend::CityTarget;
use crate::config::AnimationConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::map::{MapSlot, MarkerStyle};
use crate::panels::ResultPanels;
use crate::tracker::{AsyncTaskTracker, JobKind, JobStatus, ReportEffect};

mod dispatcher;
mod session;

pub use dispatcher::{BackendDispatcher, JobDispatcher};
pub use session::{
    CHAT_ERROR_REPLY, ChatMessage, ChatRole, JobCompletion, JobPayload, PanelContent,
    SearchSession, SessionToken,
};

/// 编排阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Searching,
    /// 仅在停止动画与展示面板之间短暂存在，外部不可观察
    Settling,
    Revealed,
}

/// 一次任务回报被如何处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionEffect {
    /// 来自已被取代的会话，丢弃
    Stale,
    /// 该任务已结算过，忽略
    Duplicate,
    /// 已记录，另一个任务仍在进行
    Recorded,
    /// 两个任务结算完毕，面板已展示
    Revealed,
    /// 重试结果更新了单个面板
    PanelUpdated,
}

pub struct SearchOrchestrator {
    phase: SearchPhase,
    last_token: Option<SessionToken>,
    session: Option<SearchSession>,
    tracker: AsyncTaskTracker,
    animator: AgentAnimator,
    map: MapSlot,
    animation: AnimationConfig,
    dispatcher: Arc<dyn JobDispatcher>,
    panels: Arc<dyn ResultPanels>,
}

impl SearchOrchestrator {
    pub fn new(
        map: MapSlot,
        animation: AnimationConfig,
        dispatcher: Arc<dyn JobDispatcher>,
        panels: Arc<dyn ResultPanels>,
    ) -> Self {
        let animator = AgentAnimator::new(map.clone(), animation.clone());
        Self {
            phase: SearchPhase::Idle,
            last_token: None,
            session: None,
            tracker: AsyncTaskTracker::new(),
            animator,
            map,
            animation,
            dispatcher,
            panels,
        }
    }

    /// 收到地理编码后的城市，开始新会话并取代当前会话
    pub fn submit(&mut self, city: CityTarget) -> SessionToken {
        if let Some(previous) = self.session.take() {
            tracing::info!(
                superseded = %previous.token,
                phase = ?self.phase,
                "new search supersedes the live session"
            );
            self.dispatcher.cancel(previous.token);
        }

        let token = self
            .last_token
            .map(SessionToken::next)
            .unwrap_or_else(SessionToken::first);
        self.last_token = Some(token);

        // 必须先于任务派发，否则快速返回的任务会写入旧状态
        self.tracker.reset();
        self.phase = SearchPhase::Searching;
        let session = SearchSession::new(token, city.clone());

        println!("🔍 正在分析 {} ...", city);
        self.animator.start(city.center, &city.name);
        self.panels.search_started(&session);
        self.session = Some(session);

        for job in JobKind::ALL {
            self.dispatcher.dispatch(token, job, &city);
        }
        token
    }

    /// 处理任务回报
    pub fn complete(&mut self, completion: JobCompletion) -> CompletionEffect {
        let JobCompletion { token, payload } = completion;
        let job = payload.job();

        let Some(session) = self.session.as_mut().filter(|s| s.token == token) else {
            tracing::debug!(%token, %job, "discarding completion from a superseded session");
            return CompletionEffect::Stale;
        };

        match self.phase {
            SearchPhase::Searching => {
                let effect = self.tracker.report(job, payload.outcome());
                if effect == ReportEffect::Duplicate {
                    return CompletionEffect::Duplicate;
                }
                session.apply(payload);
                tracing::info!(%token, %job, status = ?self.tracker.status(job), "job settled");

                if effect == ReportEffect::Settled {
                    self.phase = SearchPhase::Settling;
                    self.reveal();
                    CompletionEffect::Revealed
                } else {
                    CompletionEffect::Recorded
                }
            }
            SearchPhase::Revealed if session.finish_retry(job) => {
                session.apply(payload);
                self.panels.panel_updated(session, job);
                CompletionEffect::PanelUpdated
            }
            _ => {
                tracing::warn!(%token, %job, phase = ?self.phase, "ignoring unexpected completion");
                CompletionEffect::Duplicate
            }
        }
    }

    /// Settling：先停动画，再把相机带回城市并展示面板
    fn reveal(&mut self) {
        self.animator.stop();

        let Some(session) = self.session.as_mut() else {
            self.phase = SearchPhase::Idle;
            return;
        };
        if let Some(map) = self.map.get() {
            map.fly_to(
                session.city.center,
                self.animation.city_zoom,
                self.animation.fly_duration(),
            );
            map.place_marker(session.city.center, MarkerStyle::City);
        }
        session.visible = true;
        session.revealed_at = Some(chrono::Utc::now());
        self.phase = SearchPhase::Revealed;

        println!("✅ {} 分析完成", session.city);
        self.panels.reveal(session);
    }

    /// 关闭面板，回到 Idle
    pub fn close(&mut self) -> DashboardResult<SessionToken> {
        let session = self.session.take().ok_or(DashboardError::NoActiveSession)?;
        self.dispatcher.cancel(session.token);
        self.animator.stop();
        if session.visible
            && let Some(map) = self.map.get()
        {
            map.remove_marker();
        }
        self.tracker.reset();
        self.phase = SearchPhase::Idle;
        self.panels.closed();
        Ok(session.token)
    }

    /// 切换最小化，返回新的状态
    pub fn toggle_minimized(&mut self) -> DashboardResult<bool> {
        let session = self
            .session
            .as_mut()
            .ok_or(DashboardError::NoActiveSession)?;
        session.minimized = !session.minimized;
        self.panels.minimized(session);
        Ok(session.minimized)
    }

    /// 用户对失败面板发起重试，返回是否真正派发
    pub fn retry(&mut self, job: JobKind) -> DashboardResult<bool> {
        let session = self
            .session
            .as_mut()
            .ok_or(DashboardError::NoActiveSession)?;
        if self.phase != SearchPhase::Revealed
            || !session.panel_is_error(job)
            || session.is_retrying(job)
        {
            return Ok(false);
        }

        session.begin_retry(job);
        self.panels.panel_updated(session, job);
        self.dispatcher.dispatch(session.token, job, &session.city);
        Ok(true)
    }

    /// 记录用户追问，返回发送请求所需的会话信息
    pub fn begin_chat(&mut self, message: &str) -> DashboardResult<(SessionToken, CityTarget)> {
        let session = self
            .session
            .as_mut()
            .ok_or(DashboardError::NoActiveSession)?;
        if !session.chat_available() {
            return Err(DashboardError::ChatUnavailable);
        }
        session.chat.push(ChatMessage::new(ChatRole::User, message));
        self.panels.chat_updated(session);
        Ok((session.token, session.city.clone()))
    }

    /// 追问回复到达；过期会话的回复被丢弃
    pub fn finish_chat(&mut self, token: SessionToken, reply: DashboardResult<String>) -> bool {
        let Some(session) = self.session.as_mut().filter(|s| s.token == token) else {
            tracing::debug!(%token, "discarding chat reply from a superseded session");
            return false;
        };
        let content = match reply {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(%token, "chat request failed: {}", err);
                CHAT_ERROR_REPLY.to_string()
            }
        };
        session.chat.push(ChatMessage::new(ChatRole::Assistant, content));
        self.panels.chat_updated(session);
        true
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&SearchSession> {
        self.session.as_ref()
    }

    pub fn current_token(&self) -> Option<SessionToken> {
        self.session.as_ref().map(|s| s.token)
    }

    pub fn status(&self, job: JobKind) -> JobStatus {
        self.tracker.status(job)
    }

    pub fn is_settled(&self) -> bool {
        self.tracker.is_settled()
    }

    pub fn results_visible(&self) -> bool {
        self.phase == SearchPhase::Revealed
            && self.session.as_ref().is_some_and(|s| s.visible)
    }

    pub fn animator(&self) -> &AgentAnimator {
        &self.animator
    }
}
