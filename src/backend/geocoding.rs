use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::GeocodingConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::geo::Coordinate;

/// 地理编码得到的城市身份与坐标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityTarget {
    pub name: String,
    pub country_code: String,
    pub center: Coordinate,
}

impl CityTarget {
    pub fn new(name: impl Into<String>, country_code: impl Into<String>, center: Coordinate) -> Self {
        Self {
            name: name.into(),
            country_code: country_code.into(),
            center,
        }
    }
}

impl std::fmt::Display for CityTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.name, self.country_code)
    }
}

/// 结果中没有国家信息时的国家代码策略
pub trait CountryFallback: Send + Sync {
    fn country_for(&self, place_name: &str) -> String;
}

/// 固定返回配置的默认国家代码
#[derive(Debug, Clone)]
pub struct DefaultCountry(String);

impl DefaultCountry {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }
}

impl Default for DefaultCountry {
    fn default() -> Self {
        Self::new("US")
    }
}

impl CountryFallback for DefaultCountry {
    fn country_for(&self, _place_name: &str) -> String {
        self.0.clone()
    }
}

/// 地点名称到城市坐标的查询
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn lookup(&self, query: &str) -> DashboardResult<CityTarget>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeocodeResponse {
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeocodeFeature {
    center: Option<[f64; 2]>,
    text: Option<String>,
    place_name: Option<String>,
    context: Vec<ContextEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContextEntry {
    id: String,
    text: Option<String>,
    short_code: Option<String>,
}

/// 从地点搜索响应中解析城市
///
/// 取第一个结果；上下文里 `place.*` 覆盖城市名，`country.*` 提供国家代码。
pub fn parse_geocode_response(
    query: &str,
    body: Value,
    fallback: &dyn CountryFallback,
) -> DashboardResult<CityTarget> {
    let not_found = || DashboardError::GeocodeNotFound {
        query: query.to_string(),
    };

    let response: GeocodeResponse = serde_json::from_value(body)
        .map_err(|e| DashboardError::backend("geocoding", format!("malformed JSON: {}", e)))?;
    let feature = response.features.into_iter().next().ok_or_else(not_found)?;
    let center = Coordinate::from(feature.center.ok_or_else(not_found)?);
    if !center.is_finite() {
        return Err(not_found());
    }

    let mut name = feature.text.clone().unwrap_or_default();
    let mut country_code = None;
    for entry in &feature.context {
        if entry.id.starts_with("place")
            && let Some(text) = entry.text.as_ref().filter(|t| !t.is_empty())
        {
            name = text.clone();
        }
        if entry.id.starts_with("country")
            && let Some(code) = entry.short_code.as_ref().filter(|c| !c.is_empty())
        {
            country_code = Some(code.to_uppercase());
        }
    }
    if name.is_empty() {
        name = feature
            .place_name
            .clone()
            .unwrap_or_else(|| query.trim().to_string());
    }

    let country_code = country_code.unwrap_or_else(|| {
        let place_name = feature.place_name.as_deref().unwrap_or(&name);
        fallback.country_for(place_name)
    });

    Ok(CityTarget {
        name,
        country_code,
        center,
    })
}

/// Mapbox地点搜索
pub struct MapboxGeocoder {
    client: reqwest::Client,
    config: GeocodingConfig,
    fallback: Arc<dyn CountryFallback>,
    timeout: Duration,
}

impl MapboxGeocoder {
    pub fn new(config: GeocodingConfig, timeout: Duration) -> anyhow::Result<Self> {
        let fallback = Arc::new(DefaultCountry::new(config.default_country_code.clone()));
        Self::with_fallback(config, timeout, fallback)
    }

    pub fn with_fallback(
        config: GeocodingConfig,
        timeout: Duration,
        fallback: Arc<dyn CountryFallback>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            config,
            fallback,
            timeout,
        })
    }

    fn lookup_url(&self, query: &str) -> DashboardResult<reqwest::Url> {
        let operation = "geocoding";
        let mut url = reqwest::Url::parse(&self.config.base_url)
            .map_err(|e| DashboardError::backend(operation, e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| DashboardError::backend(operation, "invalid geocoding base url"))?
            .pop_if_empty()
            .push(&format!("{}.json", query));
        url.query_pairs_mut()
            .append_pair("access_token", &self.config.access_token)
            .append_pair("limit", &self.config.result_limit.to_string());
        Ok(url)
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn lookup(&self, query: &str) -> DashboardResult<CityTarget> {
        let operation = "geocoding";
        let query = query.trim();
        if query.is_empty() {
            return Err(DashboardError::GeocodeNotFound {
                query: query.to_string(),
            });
        }

        let response = self
            .client
            .get(self.lookup_url(query)?)
            .send()
            .await
            .map_err(|e| DashboardError::from_transport(operation, self.timeout, e))?;
        if !response.status().is_success() {
            return Err(DashboardError::backend(
                operation,
                format!("HTTP error! status: {}", response.status().as_u16()),
            ));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| DashboardError::backend(operation, format!("malformed JSON: {}", e)))?;

        let city = parse_geocode_response(query, body, self.fallback.as_ref())?;
        tracing::info!(query, city = %city, "geocoded search query");
        Ok(city)
    }
}
