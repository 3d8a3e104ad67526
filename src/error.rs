use std::time::Duration;

/// 仪表盘错误类型
///
/// 所有错误都在本地恢复：地理编码失败只提示，不启动编排；
/// 后台任务失败记为 `Failed` 并由对应面板展示；动画不可用时静默跳过。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DashboardError {
    #[error("no location found for query \"{query}\"")]
    GeocodeNotFound { query: String },

    #[error("{operation} timed out after {}s", after.as_secs_f64())]
    NetworkTimeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("{operation} failed: {message}")]
    BackendError {
        operation: &'static str,
        message: String,
    },

    #[error("map handle is not ready")]
    AnimationUnavailable,

    #[error("chat is only available once the business analysis is ready")]
    ChatUnavailable,

    #[error("no active search session")]
    NoActiveSession,
}

impl DashboardError {
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        Self::BackendError {
            operation,
            message: message.into(),
        }
    }

    /// 将reqwest错误归类为超时或后台错误
    pub fn from_transport(operation: &'static str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::NetworkTimeout {
                operation,
                after: timeout,
            }
        } else {
            Self::backend(operation, err.to_string())
        }
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
