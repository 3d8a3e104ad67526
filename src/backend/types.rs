use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DashboardError, DashboardResult};

/// 后台可能返回的图表键
pub struct ChartKeys;

impl ChartKeys {
    pub const BUSINESS_DENSITY: &'static str = "business_density";
    pub const BUSINESS_HOURS: &'static str = "business_hours";
    pub const PRICE_RANGE: &'static str = "price_range";
    pub const PLACE_CATEGORIES: &'static str = "place_categories";
    pub const PLACE_RATINGS: &'static str = "place_ratings";
    pub const BRAND_POPULARITY: &'static str = "brand_popularity";
    pub const BRAND_CATEGORIES: &'static str = "brand_categories";

    /// 面板的展示顺序
    pub fn display_order() -> Vec<&'static str> {
        vec![
            Self::BUSINESS_DENSITY,
            Self::BUSINESS_HOURS,
            Self::PRICE_RANGE,
            Self::PLACE_CATEGORIES,
            Self::PLACE_RATINGS,
            Self::BRAND_POPULARITY,
            Self::BRAND_CATEGORIES,
        ]
    }
}

/// 字符串编码的绘图库图形描述，对编排层不透明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartFigure(String);

impl ChartFigure {
    pub fn new(spec: impl Into<String>) -> Self {
        Self(spec.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 解码为JSON交给绘图库
    pub fn decode(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.0)
    }
}

/// 可视化任务结果：键名到图形的映射，缺失的键不渲染
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationSet {
    charts: BTreeMap<String, ChartFigure>,
}

impl VisualizationSet {
    pub fn from_response(body: Value) -> DashboardResult<Self> {
        let operation = "visualization job";
        let Value::Object(entries) = body else {
            return Err(DashboardError::backend(
                operation,
                "expected a JSON object of charts",
            ));
        };

        if let Some(error) = entries.get("error") {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(DashboardError::backend(operation, message));
        }

        let charts = entries
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(spec) => Some((key, ChartFigure::new(spec))),
                other => Some((key, ChartFigure::new(other.to_string()))),
            })
            .collect();

        Ok(Self { charts })
    }

    pub fn chart(&self, key: &str) -> Option<&ChartFigure> {
        self.charts.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.charts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}

/// 商业环境分析文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub analysis: String,
}

/// 商业分析接口响应
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NarrativeResponse {
    pub success: bool,
    pub analysis: Option<String>,
    pub error: Option<String>,
}

impl NarrativeResponse {
    pub fn into_narrative(self) -> DashboardResult<Narrative> {
        match self.analysis {
            Some(analysis) if self.success && !analysis.trim().is_empty() => {
                Ok(Narrative { analysis })
            }
            _ => Err(DashboardError::backend(
                "business analysis job",
                self.error
                    .unwrap_or_else(|| "Failed to generate analysis".to_string()),
            )),
        }
    }
}

/// 追问接口响应
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatResponse {
    pub success: bool,
    pub response: Option<String>,
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn into_reply(self) -> DashboardResult<String> {
        match self.response {
            Some(reply) if self.success && !reply.trim().is_empty() => Ok(reply),
            _ => Err(DashboardError::backend(
                "chat",
                self.error
                    .unwrap_or_else(|| "Failed to get chat response".to_string()),
            )),
        }
    }
}

/// 可视化/商业分析请求体
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest<'a> {
    pub city: &'a str,
    pub country: &'a str,
    pub limit: u32,
}

/// 追问请求体
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub city: &'a str,
    pub country: &'a str,
    pub message: &'a str,
}
