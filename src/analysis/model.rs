use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    TextAnalysis,
    FileAnalysis,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: AnalysisKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

impl AnalysisRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: AnalysisKind::TextAnalysis,
            file_name: None,
            file_type: None,
        }
    }

    pub fn file(text: impl Into<String>, file_name: &str, file_type: &str) -> Self {
        Self {
            text: text.into(),
            kind: AnalysisKind::FileAnalysis,
            file_name: Some(file_name.to_string()),
            file_type: Some(file_type.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisResponse {
    pub analysis: String,
    pub confidence: u8,
    #[serde(rename = "type")]
    pub kind: AnalysisKind,
    pub processed: bool,
}

/// Error payload; always served with status 500.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisFailure {
    pub error: String,
    pub analysis: String,
    pub confidence: u8,
}

impl AnalysisFailure {
    pub const STATUS: u16 = 500;

    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            analysis: "Error occurred during processing".to_string(),
            confidence: 0,
        }
    }
}

/// Confidence heuristic for a model answer, 75..=95.
pub fn confidence(analysis: &str, kind: AnalysisKind) -> u8 {
    let mut score: u8 = 75;
    if analysis.chars().count() > 100 {
        score += 10;
    }
    if ["Amount:", "Date:", "Quantity:"]
        .iter()
        .any(|marker| analysis.contains(marker))
    {
        score += 10;
    }
    if kind == AnalysisKind::FileAnalysis {
        score += 5;
    }
    score.min(95)
}

/// First non-empty candidate text of a `generateContent` response.
pub fn candidate_text(body: &Value) -> Option<&str> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .filter(|text| !text.is_empty())
}
