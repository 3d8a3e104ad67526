//! 地图代理动画
//!
//! 两个分析任务进行期间，在城市周边巡游的代理标记，用于遮盖等待时间。
//! 纯装饰效果：地图不可用时直接跳过，永远不会阻塞编排。

mod animator;

pub use animator::{AgentAnimator, phase_messages, popup_html};

#[cfg(test)]
mod tests;
