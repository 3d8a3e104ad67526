//! 外部服务边界：分析后台与地理编码

use async_trait::async_trait;

use crate::error::DashboardResult;

mod geocoding;
mod http;
mod types;

pub use geocoding::{
    CityTarget, CountryFallback, DefaultCountry, Geocoder, MapboxGeocoder, parse_geocode_response,
};
pub use http::HttpBackend;
pub use types::{
    AnalysisRequest, ChartFigure, ChartKeys, ChatRequest, ChatResponse, Narrative,
    NarrativeResponse, VisualizationSet,
};

/// 分析后台
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// 可视化数据管线
    async fn fetch_visualizations(&self, city: &CityTarget) -> DashboardResult<VisualizationSet>;

    /// AI生成的商业环境分析
    async fn fetch_narrative(&self, city: &CityTarget) -> DashboardResult<Narrative>;

    /// 基于分析结果的追问
    async fn chat(&self, city: &CityTarget, message: &str) -> DashboardResult<String>;
}
