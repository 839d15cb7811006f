use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::config::Analysis;

pub mod model;

pub use model::{
    confidence, AnalysisFailure, AnalysisKind, AnalysisRequest, AnalysisResponse,
};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/";
const NO_ANALYSIS: &str = "No analysis available";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Text generation backend.
#[async_trait]
pub trait LlmService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let base_url = Url::parse(GEMINI_API_BASE).context("invalid Gemini URL")?;
        Self::with_base_url(api_key, model, base_url)
    }

    pub fn with_base_url(api_key: String, model: String, base_url: Url) -> Result<Self> {
        let http = Client::builder()
            .user_agent("stock-watch/0.1")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            api_key,
            model,
        })
    }

    pub fn from_config(cfg: &Analysis) -> Result<Self> {
        Self::new(cfg.api_key.clone(), cfg.model.clone())
    }

    pub fn build_request(&self, prompt: &str) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", self.model))
            .context("invalid Gemini model path")?;
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.3,
                "topK": 40,
                "topP": 0.95,
                "maxOutputTokens": 8192
            }
        });
        self.http
            .post(endpoint)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&body)
            .build()
            .context("failed to build Gemini request")
    }
}

#[async_trait]
impl LlmService for GeminiClient {
    #[instrument(skip_all)]
    async fn generate(&self, prompt: &str) -> Result<String> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow!("Gemini API key not configured"));
        }
        let request = self.build_request(prompt)?;
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach Gemini")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Gemini API error");
            return Err(anyhow!("Gemini API error: {}", status.as_u16()));
        }

        let body: Value = res.json().await.context("invalid Gemini response JSON")?;
        info!("Gemini API response received");
        Ok(model::candidate_text(&body)
            .unwrap_or(NO_ANALYSIS)
            .to_string())
    }
}

pub fn build_prompt(req: &AnalysisRequest) -> String {
    match req.kind {
        AnalysisKind::TextAnalysis => format!(
            "Extract the structured business data (amounts, dates, items, quantities) from this text:\n\n{}",
            req.text
        ),
        AnalysisKind::FileAnalysis => format!(
            "Extract the structured business data from the file \"{}\" ({}):\n\n{}",
            req.file_name.as_deref().unwrap_or("unnamed"),
            req.file_type.as_deref().unwrap_or("unknown type"),
            req.text
        ),
    }
}

/// Run one analysis request. Any backend failure becomes the error payload.
#[instrument(skip_all, fields(kind = ?req.kind))]
pub async fn analyze(
    llm: &dyn LlmService,
    req: &AnalysisRequest,
) -> Result<AnalysisResponse, AnalysisFailure> {
    info!("processing analysis request");
    match llm.generate(&build_prompt(req)).await {
        Ok(analysis) => Ok(AnalysisResponse {
            confidence: confidence(&analysis, req.kind),
            analysis,
            kind: req.kind,
            processed: true,
        }),
        Err(err) => {
            warn!(?err, "analysis failed");
            Err(AnalysisFailure::new(err.to_string()))
        }
    }
}
