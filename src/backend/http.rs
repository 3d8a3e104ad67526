use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::types::{
    AnalysisRequest, ChatRequest, ChatResponse, Narrative, NarrativeResponse, VisualizationSet,
};
use super::{AnalysisBackend, CityTarget};
use crate::config::BackendConfig;
use crate::error::{DashboardError, DashboardResult};

/// 基于HTTP的分析后台客户端
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn timeout(&self) -> Duration {
        self.config.request_timeout()
    }

    /// 检查后台健康状态
    pub async fn check_health(&self) -> DashboardResult<String> {
        let operation = "health check";
        println!("🔄 正在检查分析后台连接...");
        let response = self
            .client
            .get(self.endpoint("api/health"))
            .send()
            .await
            .map_err(|e| DashboardError::from_transport(operation, self.timeout(), e))?;
        let body = read_json(operation, response).await?;
        let status = body
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        println!("✅ 分析后台连接正常: {}", status);
        Ok(status)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> DashboardResult<Value> {
        tracing::debug!(operation, path, "sending backend request");
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| DashboardError::from_transport(operation, self.timeout(), e))?;
        read_json(operation, response).await
    }
}

/// 读取JSON响应，非2xx或格式错误都归为后台错误
async fn read_json(operation: &'static str, response: reqwest::Response) -> DashboardResult<Value> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| DashboardError::backend(operation, e.to_string()))?;
    let parsed = serde_json::from_str::<Value>(&text);

    if !status.is_success() {
        let message = parsed
            .ok()
            .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
        return Err(DashboardError::backend(operation, message));
    }

    parsed.map_err(|e| DashboardError::backend(operation, format!("malformed JSON: {}", e)))
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn fetch_visualizations(&self, city: &CityTarget) -> DashboardResult<VisualizationSet> {
        let request = AnalysisRequest {
            city: &city.name,
            country: &city.country_code,
            limit: self.config.visualization_limit,
        };
        let body = self
            .post_json("visualization job", "api/visualizations", &request)
            .await?;
        VisualizationSet::from_response(body)
    }

    async fn fetch_narrative(&self, city: &CityTarget) -> DashboardResult<Narrative> {
        let operation = "business analysis job";
        let request = AnalysisRequest {
            city: &city.name,
            country: &city.country_code,
            limit: self.config.narrative_limit,
        };
        let body = self
            .post_json(operation, "api/chatgpt-analysis", &request)
            .await?;
        let response: NarrativeResponse = serde_json::from_value(body)
            .map_err(|e| DashboardError::backend(operation, format!("malformed JSON: {}", e)))?;
        response.into_narrative()
    }

    async fn chat(&self, city: &CityTarget, message: &str) -> DashboardResult<String> {
        let operation = "chat";
        if message.trim().is_empty() {
            return Err(DashboardError::backend(operation, "Message is required"));
        }
        let request = ChatRequest {
            city: &city.name,
            country: &city.country_code,
            message,
        };
        let body = self.post_json(operation, "api/chat-response", &request).await?;
        let response: ChatResponse = serde_json::from_value(body)
            .map_err(|e| DashboardError::backend(operation, format!("malformed JSON: {}", e)))?;
        response.into_reply()
    }
}
