//! 双任务就绪跟踪
//!
//! 可视化与商业分析两个异步任务各自恰好结算一次；
//! 两者都不再处于 `Pending` 时视为结算完成，不论成功与否。

use serde::{Deserialize, Serialize};

/// 两个后台任务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobKind {
    #[serde(rename = "visualization")]
    Visualization,
    #[serde(rename = "narrative")]
    Narrative,
}

impl JobKind {
    pub const ALL: [JobKind; 2] = [JobKind::Visualization, JobKind::Narrative];

    pub fn operation(&self) -> &'static str {
        match self {
            JobKind::Visualization => "visualization job",
            JobKind::Narrative => "business analysis job",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Visualization => write!(f, "visualization"),
            JobKind::Narrative => write!(f, "narrative"),
        }
    }
}

impl std::str::FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "visualization" | "visualizations" | "viz" | "charts" => Ok(JobKind::Visualization),
            "narrative" | "analysis" | "business" => Ok(JobKind::Narrative),
            _ => Err(format!("Unknown job: {}", s)),
        }
    }
}

/// 任务槽位状态，只会从 `Pending` 单向迁移一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobStatus {
    #[default]
    Pending,
    Ready,
    Failed,
}

/// 任务结算结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Ready,
    Failed,
}

impl From<JobOutcome> for JobStatus {
    fn from(outcome: JobOutcome) -> Self {
        match outcome {
            JobOutcome::Ready => JobStatus::Ready,
            JobOutcome::Failed => JobStatus::Failed,
        }
    }
}

/// 一次上报的效果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportEffect {
    /// 已记录，另一个任务仍在进行
    Recorded,
    /// 这次上报使两个任务都已结算
    Settled,
    /// 槽位已结算过，上报被忽略
    Duplicate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsyncTaskTracker {
    visualization: JobStatus,
    narrative: JobStatus,
}

impl AsyncTaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 两个槽位回到 `Pending`；必须在派发任务之前同步调用
    pub fn reset(&mut self) {
        self.visualization = JobStatus::Pending;
        self.narrative = JobStatus::Pending;
    }

    pub fn report_visualization(&mut self, outcome: JobOutcome) -> ReportEffect {
        self.report(JobKind::Visualization, outcome)
    }

    pub fn report_narrative(&mut self, outcome: JobOutcome) -> ReportEffect {
        self.report(JobKind::Narrative, outcome)
    }

    pub fn report(&mut self, job: JobKind, outcome: JobOutcome) -> ReportEffect {
        let slot = match job {
            JobKind::Visualization => &mut self.visualization,
            JobKind::Narrative => &mut self.narrative,
        };

        if *slot != JobStatus::Pending {
            tracing::warn!(
                %job,
                current = ?*slot,
                reported = ?outcome,
                "ignoring duplicate report for an already settled job"
            );
            return ReportEffect::Duplicate;
        }

        *slot = outcome.into();
        if self.is_settled() {
            ReportEffect::Settled
        } else {
            ReportEffect::Recorded
        }
    }

    pub fn status(&self, job: JobKind) -> JobStatus {
        match job {
            JobKind::Visualization => self.visualization,
            JobKind::Narrative => self.narrative,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.visualization != JobStatus::Pending && self.narrative != JobStatus::Pending
    }
}
