use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client, Response, StatusCode,
};
use serde::Deserialize;

use crate::config::InsightsConfig;
use crate::error::{PulseError, Result};
use crate::models::{DemographicProfile, HeatmapPoint, SearchResult};
use crate::upstream::{HeatmapParams, InsightsApi, SearchParams};

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct DemographicsResponse {
    #[serde(default)]
    demographics: Vec<DemographicProfile>,
}

#[derive(Debug, Deserialize)]
struct HeatmapResponse {
    #[serde(default)]
    heatmap: Vec<HeatmapPoint>,
}

#[derive(Clone)]
pub struct InsightsClient {
    client: Client,
    base_url: String,
}

impl InsightsClient {
    pub fn new(config: &InsightsConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(ref api_key) = config.api_key {
            headers.insert(
                API_KEY_HEADER,
                HeaderValue::from_str(api_key)
                    .map_err(|e| PulseError::Upstream(format!("Invalid API key header: {e}")))?,
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| PulseError::Upstream(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Maps an upstream response to our error taxonomy: 429 is distinguishable
    /// (carrying a parsed `retry-after` when present), 401/403 are auth
    /// failures, any other non-2xx is a plain upstream error.
    async fn check_status(resp: Response) -> Result<Response> {
        let status = resp.status();

        if status.is_success() {
            return Ok(resp);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok());
            return Err(PulseError::RateLimited { retry_after });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(PulseError::UpstreamAuth(body));
        }

        let body = resp.text().await.unwrap_or_default();
        Err(PulseError::Upstream(format!("API error {status}: {body}")))
    }
}

#[async_trait]
impl InsightsApi for InsightsClient {
    async fn search(&self, params: &SearchParams) -> Result<Vec<SearchResult>> {
        let url = format!("{}/search", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[("query", params.query.as_str())])
            .query(&[
                ("filter.location", format!("{},{}", params.lat, params.lng)),
                ("filter.radius", params.radius.to_string()),
                ("filter.popularity", params.popularity.to_string()),
                ("page", params.page.to_string()),
                ("take", params.take.to_string()),
            ])
            .send()
            .await?;

        let resp = Self::check_status(resp).await?;
        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| PulseError::Upstream(format!("Failed to parse search response: {e}")))?;

        Ok(body.results)
    }

    async fn demographics(&self, entity_id: &str) -> Result<Option<DemographicProfile>> {
        let url = format!("{}/demographics", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[("entity_id", entity_id)])
            .send()
            .await?;

        let resp = Self::check_status(resp).await?;
        let body: DemographicsResponse = resp.json().await.map_err(|e| {
            PulseError::Upstream(format!("Failed to parse demographics response: {e}"))
        })?;

        Ok(body.demographics.into_iter().next())
    }

    async fn heatmap(&self, params: &HeatmapParams) -> Result<Vec<HeatmapPoint>> {
        let url = format!("{}/heatmap", self.base_url);

        let mut request = self.client.get(&url).query(&[
            ("filter.location", format!("{},{}", params.lat, params.lng)),
        ]);

        if let Some(radius) = params.radius {
            request = request.query(&[("filter.radius", radius.to_string())]);
        }
        if let Some(ref age) = params.age {
            request = request.query(&[("signal.demographics.age", age.as_str())]);
        }
        if let Some(ref income) = params.income {
            request = request.query(&[("signal.demographics.income", income.as_str())]);
        }

        let resp = request.send().await?;
        let resp = Self::check_status(resp).await?;
        let body: HeatmapResponse = resp
            .json()
            .await
            .map_err(|e| PulseError::Upstream(format!("Failed to parse heatmap response: {e}")))?;

        Ok(body.heatmap)
    }
}
