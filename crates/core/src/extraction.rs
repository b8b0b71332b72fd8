//! Free-text history extraction.
//!
//! Turns a pasted clinical history into the `{"data": ...}` envelope the push endpoint
//! accepts, by asking a Gemini model to fill the blank record template.

use crate::config::FillerConfig;
use crate::error::{FillError, FillResult};
use crate::record::PatientRecord;
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(3);
const OVERLOADED: i64 = 503;

pub struct GeminiExtractor {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    attempts: u32,
    retry_delay: Duration,
}

impl GeminiExtractor {
    pub fn from_config(cfg: &FillerConfig) -> FillResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs()))
            .build()
            .map_err(FillError::ExtractionRequest)?;
        Ok(Self {
            client,
            api_key: cfg.gemini_api_key()?.to_owned(),
            model: cfg.gemini_model().to_owned(),
            base_url: cfg.gemini_api_base().trim_end_matches('/').to_owned(),
            attempts: DEFAULT_ATTEMPTS,
            retry_delay: RETRY_DELAY,
        })
    }

    /// Extract a record envelope from `history`.
    ///
    /// An overloaded model (API error 503) is retried after a short pause; any other API
    /// error fails immediately.
    pub fn extract(&self, history: &str) -> FillResult<Value> {
        if history.trim().is_empty() {
            return Err(FillError::InvalidInput("clinical history is empty".into()));
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let payload = json!({ "contents": [{ "parts": [{ "text": build_prompt(history) }] }] });

        for attempt in 1..=self.attempts {
            let body: Value = self
                .client
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(&payload)
                .send()
                .and_then(|res| res.json())
                .map_err(FillError::ExtractionRequest)?;

            match classify(&body) {
                Reply::Overloaded => {
                    tracing::warn!(
                        "Gemini overloaded, retrying ({}/{})",
                        attempt,
                        self.attempts
                    );
                    std::thread::sleep(self.retry_delay);
                }
                Reply::Failed(message) => return Err(FillError::Extraction(message)),
                Reply::Answer(text) => return parse_answer(&text),
            }
        }

        Err(FillError::Extraction(format!(
            "no answer after {} attempts",
            self.attempts
        )))
    }
}

enum Reply {
    Answer(String),
    Overloaded,
    Failed(String),
}

fn classify(body: &Value) -> Reply {
    if let Some(error) = body.get("error") {
        if error["code"].as_i64() == Some(OVERLOADED) {
            return Reply::Overloaded;
        }
        return Reply::Failed(error.to_string());
    }

    match body["candidates"][0]["content"]["parts"][0]["text"].as_str() {
        Some(text) => Reply::Answer(text.to_owned()),
        None => Reply::Failed(format!("response has no candidate text: {body}")),
    }
}

/// Prompt asking the model to fill the blank template from `history`.
pub fn build_prompt(history: &str) -> String {
    let template = serde_json::to_string_pretty(&PatientRecord::blank_template())
        .unwrap_or_else(|_| PatientRecord::blank_template().to_string());

    format!(
        "Você extrai informações de históricos clínicos.\n\
         Preencha o JSON abaixo usando apenas o texto do paciente. \
         Campos sem informação no texto ficam vazios; não invente nem remova informações.\n\n\
         Texto:\n{history}\n\n\
         JSON base:\n{template}\n\n\
         Responda somente com o JSON preenchido. Peso em quilogramas e altura em metros. \
         Em \"antecedentes pessoais\", itens não mencionados devem ser preenchidos com \"nega\".\n"
    )
}

/// Remove Markdown code fences the model sometimes wraps its answer in.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

fn parse_answer(text: &str) -> FillResult<Value> {
    let value: Value = serde_json::from_str(strip_code_fences(text))
        .map_err(|e| FillError::Extraction(format!("answer is not JSON: {e}")))?;

    // Accept a bare record as well as the envelope.
    let envelope = if value.get("data").is_some() {
        value
    } else {
        json!({ "data": value })
    };

    PatientRecord::from_envelope(&envelope)?;
    Ok(envelope)
}
