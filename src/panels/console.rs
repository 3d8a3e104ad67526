use super::ResultPanels;
use crate::backend::ChartKeys;
use crate::error::DashboardError;
use crate::orchestrator::{ChatRole, PanelContent, SearchSession};
use crate::tracker::JobKind;

/// 终端面板渲染
#[derive(Debug, Default, Clone)]
pub struct ConsolePanels;

impl ConsolePanels {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn render_visualizations(&self, session: &SearchSession) -> String {
        match &session.visualizations {
            PanelContent::Loading => "📊 可视化: 加载中...".to_string(),
            PanelContent::Error(message) => {
                format!("📊 可视化: ❌ {} (输入 :retry viz 重试)", message)
            }
            PanelContent::Loaded(set) => {
                let mut text = format!("📊 可视化: {} 张图表", set.len());
                for key in ChartKeys::display_order() {
                    if let Some(figure) = set.chart(key) {
                        text.push_str(&format!("\n   - {} ({} bytes)", key, figure.as_str().len()));
                    }
                }
                text
            }
        }
    }

    pub(crate) fn render_narrative(&self, session: &SearchSession) -> String {
        match &session.narrative {
            PanelContent::Loading => "🏢 商业环境分析: 加载中...".to_string(),
            PanelContent::Error(message) => {
                format!("🏢 商业环境分析: ❌ {} (输入 :retry narrative 重试)", message)
            }
            PanelContent::Loaded(narrative) => format!("🏢 商业环境分析:\n{}", narrative.analysis),
        }
    }

    pub(crate) fn render_reveal(&self, session: &SearchSession) -> String {
        let mut text = format!("\n==================== {} ====================", session.city);
        text.push('\n');
        text.push_str(&self.render_visualizations(session));
        text.push('\n');
        text.push_str(&self.render_narrative(session));
        if session.chat_available() {
            text.push_str("\n💬 可以继续追问: :chat <问题>");
        }
        text
    }

    /// 面板尚未展示时只切换状态，不提前输出面板内容
    pub(crate) fn render_minimized(&self, session: &SearchSession) -> Option<String> {
        if session.minimized {
            Some("🔽 面板已最小化".to_string())
        } else if session.visible {
            Some(self.render_reveal(session))
        } else {
            None
        }
    }
}

impl ResultPanels for ConsolePanels {
    fn search_started(&self, session: &SearchSession) {
        println!("🤖 GeoTaste Agent 已出发: {}", session.city);
    }

    fn reveal(&self, session: &SearchSession) {
        println!("{}", self.render_reveal(session));
    }

    fn panel_updated(&self, session: &SearchSession, job: JobKind) {
        match job {
            JobKind::Visualization => println!("{}", self.render_visualizations(session)),
            JobKind::Narrative => println!("{}", self.render_narrative(session)),
        }
    }

    fn chat_updated(&self, session: &SearchSession) {
        if let Some(message) = session.chat.last() {
            let speaker = match message.role {
                ChatRole::User => "🧑",
                ChatRole::Assistant => "🤖",
            };
            println!("{} {}", speaker, message.content);
        }
    }

    fn minimized(&self, session: &SearchSession) {
        if let Some(text) = self.render_minimized(session) {
            println!("{}", text);
        }
    }

    fn closed(&self) {
        println!("👋 面板已关闭");
    }

    fn search_failed(&self, query: &str, error: &DashboardError) {
        match error {
            DashboardError::GeocodeNotFound { .. } => println!(
                "⚠️ 没有找到 \"{}\"，请换一个城市名称试试",
                query
            ),
            other => println!("⚠️ 搜索失败，请重试: {}", other),
        }
    }
}
