// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI photo analysis.
//!
//! Sends the compressed photo to Gemini and asks for a pigeon count and a
//! Spanish description of the scene.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;

const GENERATIVE_LANGUAGE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const ANALYSIS_PROMPT: &str = "You are an expert in describing photos of pigeons.

Your task is to analyze the provided photo and return two pieces of information:
1.  A precise count of the number of pigeons visible in the photo. Output 0 if there are none.
2.  A descriptive summary of the photo.

Focus on the number of pigeons, their location, and any interesting details for the description.
The description must be written in Spanish.";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
];

/// What the model reported about a photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoAnalysis {
    pub pigeon_count: u32,
    pub description: String,
    pub model_version: String,
}

/// Anything that can count and describe pigeons in a photo.
pub trait PhotoAnalyzer: Send + Sync + 'static {
    /// Analyze a `data:<mime>;base64,<...>` photo.
    fn analyze(
        &self,
        photo_data_uri: &str,
    ) -> impl Future<Output = Result<PhotoAnalysis, AppError>> + Send;
}

/// Gemini (Generative Language API) client.
#[derive(Clone)]
pub struct GeminiAnalyzer {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiAnalyzer {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: GENERATIVE_LANGUAGE_URL.to_string(),
            api_key,
            model,
        }
    }

    /// Point the client at a different endpoint (local fakes).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Identifier recorded on every report.
    pub fn model_version(&self) -> String {
        format!("googleai/{}", self.model)
    }

    fn request_body(mime_type: &str, data: &str) -> serde_json::Value {
        let safety_settings: Vec<serde_json::Value> = SAFETY_CATEGORIES
            .iter()
            .map(|category| json!({ "category": category, "threshold": "BLOCK_NONE" }))
            .collect();

        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": ANALYSIS_PROMPT },
                    { "inline_data": { "mime_type": mime_type, "data": data } }
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "pigeonCount": { "type": "INTEGER" },
                        "photoDescription": { "type": "STRING" }
                    },
                    "required": ["pigeonCount", "photoDescription"]
                }
            },
            "safetySettings": safety_settings
        })
    }

    async fn generate(&self, photo_data_uri: &str) -> Result<PhotoAnalysis, String> {
        let (mime_type, data) = split_data_uri(photo_data_uri)?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(mime_type, data))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, body));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| e.to_string())?;
        let output = parse_model_output(&body)?;

        Ok(PhotoAnalysis {
            pigeon_count: output.pigeon_count,
            description: output.photo_description,
            model_version: self.model_version(),
        })
    }
}

impl PhotoAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, photo_data_uri: &str) -> Result<PhotoAnalysis, AppError> {
        match self.generate(photo_data_uri).await {
            Ok(analysis) => {
                tracing::info!(
                    pigeon_count = analysis.pigeon_count,
                    model = %analysis.model_version,
                    "Photo analyzed"
                );
                Ok(analysis)
            }
            Err(details) => {
                tracing::warn!(error = %details, "Photo analysis failed");
                Err(AppError::Analysis(format!(
                    "Failed to analyze photo with AI. Details: {}",
                    details
                )))
            }
        }
    }
}

/// Split `data:<mime>;base64,<payload>` into its MIME type and payload.
fn split_data_uri(data_uri: &str) -> Result<(&str, &str), String> {
    let rest = data_uri
        .strip_prefix("data:")
        .ok_or_else(|| "photo must be a data URI".to_string())?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| "data URI has no payload".to_string())?;
    let mime_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| "data URI must be base64 encoded".to_string())?;

    if mime_type.is_empty() || payload.is_empty() {
        return Err("data URI is missing its MIME type or payload".to_string());
    }

    Ok((mime_type, payload))
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelOutput {
    pigeon_count: i64,
    photo_description: String,
}

#[derive(Debug)]
struct ValidatedOutput {
    pigeon_count: u32,
    photo_description: String,
}

fn parse_model_output(body: &GenerateContentResponse) -> Result<ValidatedOutput, String> {
    let candidate = body
        .candidates
        .first()
        .ok_or_else(|| "Prompt returned null or undefined output.".to_string())?;

    let text: String = candidate
        .content
        .as_ref()
        .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(format!(
            "Model returned no content (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        ));
    }

    let output: ModelOutput =
        serde_json::from_str(text.trim()).map_err(|e| format!("invalid model output: {}", e))?;

    let pigeon_count = u32::try_from(output.pigeon_count)
        .map_err(|_| format!("invalid pigeon count: {}", output.pigeon_count))?;

    Ok(ValidatedOutput {
        pigeon_count,
        photo_description: output.photo_description,
    })
}
