use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use super::session::{JobCompletion, JobPayload, SessionToken};
use crate::backend::{AnalysisBackend, CityTarget};
use crate::error::DashboardError;
use crate::tracker::JobKind;

/// 后台任务派发
pub trait JobDispatcher: Send + Sync {
    /// 为会话启动一个任务，完成后以 `JobCompletion` 回报
    fn dispatch(&self, token: SessionToken, job: JobKind, city: &CityTarget);

    /// 放弃会话仍在进行的任务
    fn cancel(&self, token: SessionToken);
}

/// 每个任务一个tokio任务，带超时，完成结果写入通道
pub struct BackendDispatcher {
    backend: Arc<dyn AnalysisBackend>,
    timeout: Duration,
    completions: mpsc::UnboundedSender<JobCompletion>,
    in_flight: Mutex<HashMap<SessionToken, Vec<AbortHandle>>>,
}

impl BackendDispatcher {
    pub fn new(
        backend: Arc<dyn AnalysisBackend>,
        timeout: Duration,
        completions: mpsc::UnboundedSender<JobCompletion>,
    ) -> Self {
        Self {
            backend,
            timeout,
            completions,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    fn job_future(&self, job: JobKind, city: CityTarget) -> BoxFuture<'static, JobPayload> {
        let backend = self.backend.clone();
        match job {
            JobKind::Visualization => async move {
                JobPayload::Visualization(backend.fetch_visualizations(&city).await)
            }
            .boxed(),
            JobKind::Narrative => {
                async move { JobPayload::Narrative(backend.fetch_narrative(&city).await) }.boxed()
            }
        }
    }

    /// 仍在进行的任务数
    pub fn in_flight(&self) -> usize {
        self.lock_in_flight()
            .values()
            .flatten()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashMap<SessionToken, Vec<AbortHandle>>> {
        match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl JobDispatcher for BackendDispatcher {
    fn dispatch(&self, token: SessionToken, job: JobKind, city: &CityTarget) {
        let future = self.job_future(job, city.clone());
        let timeout = self.timeout;
        let completions = self.completions.clone();

        tracing::info!(%token, %job, city = %city, "dispatching job");
        let handle = tokio::spawn(async move {
            let payload = match tokio::time::timeout(timeout, future).await {
                Ok(payload) => payload,
                Err(_) => {
                    tracing::warn!(%token, %job, "job timed out after {:?}", timeout);
                    JobPayload::failed(
                        job,
                        DashboardError::NetworkTimeout {
                            operation: job.operation(),
                            after: timeout,
                        },
                    )
                }
            };
            // 接收端关闭说明仪表盘已退出
            let _ = completions.send(JobCompletion { token, payload });
        });

        let mut in_flight = self.lock_in_flight();
        in_flight.retain(|_, handles| {
            handles.retain(|handle| !handle.is_finished());
            !handles.is_empty()
        });
        in_flight
            .entry(token)
            .or_default()
            .push(handle.abort_handle());
    }

    fn cancel(&self, token: SessionToken) {
        if let Some(handles) = self.lock_in_flight().remove(&token) {
            let outstanding = handles.iter().filter(|h| !h.is_finished()).count();
            for handle in handles {
                handle.abort();
            }
            if outstanding > 0 {
                tracing::info!(%token, outstanding, "cancelled superseded jobs");
            }
        }
    }
}
