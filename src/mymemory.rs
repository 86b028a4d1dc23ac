use crate::cache::TranslationRequest;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Response body of the MyMemory `/get` endpoint.
///
/// Every field is optional: error responses send `matches` as an empty
/// string or omit it, and `responseStatus` arrives as a number on success
/// but as a string ("403") on some failures.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    #[serde(default, deserialize_with = "lenient_matches")]
    pub matches: Option<Vec<Match>>,
    #[serde(default)]
    pub response_data: Option<ResponseData>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub response_status: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub response_details: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    #[serde(default, deserialize_with = "lenient_text")]
    pub translated_text: Option<String>,
}

/// One translation-memory candidate.
#[derive(Debug, Default, Deserialize)]
pub struct Match {
    #[serde(rename = "match", default, deserialize_with = "lenient_number")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub translation: Option<String>,
}

impl Match {
    /// Missing or non-finite scores rank as zero.
    fn rank(&self) -> f64 {
        self.score.filter(|s| s.is_finite()).unwrap_or(0.0)
    }

    fn usable_translation(&self) -> Option<&str> {
        self.translation.as_deref().filter(|t| !t.is_empty())
    }
}

impl ApiResponse {
    /// Pick the text to show for this response.
    ///
    /// The highest-scoring candidate with a non-empty translation wins (ties
    /// go to the earlier candidate). Without one, the nested
    /// `responseData.translatedText` is used, and with neither the result is
    /// an empty string.
    pub fn best_translation(&self) -> String {
        let best_match = self
            .matches
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|m| m.usable_translation().is_some())
            .fold(None::<&Match>, |best, candidate| match best {
                Some(current) if current.rank() >= candidate.rank() => Some(current),
                _ => Some(candidate),
            })
            .and_then(Match::usable_translation);

        let nested = self
            .response_data
            .as_ref()
            .and_then(|data| data.translated_text.as_deref())
            .filter(|t| !t.is_empty());

        match (best_match, nested) {
            (Some(text), _) => text.to_string(),
            (None, Some(text)) => text.to_string(),
            (None, None) => String::new(),
        }
    }

    /// Advisory status for a non-200 `responseStatus`: the API's detail text,
    /// or "Status <code>" when it sent none.
    ///
    /// The status is compared by numeric value, so `"200"` sent as a string
    /// is a success too.
    pub fn advisory(&self) -> Option<String> {
        let code = self.response_status.filter(|c| *c != 0.0 && *c != 200.0)?;
        let detail = self
            .response_details
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        Some(match detail {
            Some(detail) => detail.to_string(),
            None => format!("Status {}", code),
        })
    }
}

/// Accept a JSON number or a numeric string.
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// Accept an array of candidate objects. Anything other than an array reads
/// as absent, and array entries that do not parse as a candidate are skipped.
fn lenient_matches<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<Match>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

/// Accept a JSON string, or render a bare number as text.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

/// HTTP client for the MyMemory translation API.
#[derive(Debug, Clone)]
pub struct MyMemoryClient {
    http: reqwest::Client,
    api_url: String,
}

impl MyMemoryClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("lingo-pane/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            api_url: api_url.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Issue one `GET ?q=..&langpair=..` call.
    ///
    /// Fails on network errors, non-2xx statuses and bodies that are not
    /// JSON objects. A 200 response whose `responseStatus` reports a problem
    /// is still `Ok`; see [`ApiResponse::advisory`].
    pub async fn fetch(&self, request: &TranslationRequest) -> Result<ApiResponse> {
        let langpair = request.langpair();
        debug!("Requesting translation {} ({} chars)", langpair, request.text.len());

        let response = self
            .http
            .get(&self.api_url)
            .query(&[("q", request.text.as_str()), ("langpair", langpair.as_str())])
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to translation API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("Translation API error ({}): {}", status, body);
        }

        response
            .json::<ApiResponse>()
            .await
            .context("Failed to parse translation API response")
    }
}
