//! 结果面板：被动消费两个任务的结果并展示

use crate::error::DashboardError;
use crate::orchestrator::SearchSession;
use crate::tracker::JobKind;

mod console;
mod recording;

pub use console::ConsolePanels;
pub use recording::{PanelEvent, RecordingPanels};

/// 编排器向面板层推送的通知
///
/// 除 `reveal` 外都有空实现，面板只需关心自己展示的部分。
pub trait ResultPanels: Send + Sync {
    /// 新搜索开始，旧面板应当清空
    fn search_started(&self, _session: &SearchSession) {}

    /// 两个任务均已结算，展示结果
    fn reveal(&self, session: &SearchSession);

    /// 重试使单个面板内容变化
    fn panel_updated(&self, _session: &SearchSession, _job: JobKind) {}

    fn chat_updated(&self, _session: &SearchSession) {}

    fn minimized(&self, _session: &SearchSession) {}

    fn closed(&self) {}

    /// 地理编码失败，编排未启动
    fn search_failed(&self, _query: &str, _error: &DashboardError) {}
}
