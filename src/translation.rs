use crate::cache::{TranslationCache, TranslationRequest};
use crate::config::Config;
use crate::i18n::{Language, MetricsReport, TranslationMetrics};
use crate::mymemory::MyMemoryClient;
use anyhow::Result;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Informational status attached to a successful translation. None of these
/// are failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationStatus {
    /// Source and target are the same language; the text is returned as is.
    SameLanguage,
    /// Served from the session cache.
    Cached,
    /// Fresh result from the API.
    Done,
    /// The API answered but flagged a problem (quota, bad pair, ...).
    Advisory(String),
}

impl fmt::Display for TranslationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationStatus::SameLanguage => f.write_str("Same language"),
            TranslationStatus::Cached => f.write_str("Cached"),
            TranslationStatus::Done => f.write_str("Done"),
            TranslationStatus::Advisory(detail) => f.write_str(detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranslateOutcome {
    Translated {
        request: TranslationRequest,
        text: String,
        status: TranslationStatus,
    },
    /// An identical request is already in flight; its completion is the only
    /// result that will be produced.
    InFlight,
}

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("Please enter text to translate.")]
    EmptyInput,

    #[error("Translation failed: {0}")]
    TranslationFailed(String),
}

impl TranslateError {
    /// Short notice for the user.
    pub fn notice(&self) -> &'static str {
        match self {
            TranslateError::EmptyInput => "Please enter text to translate.",
            TranslateError::TranslationFailed(_) => "Translation failed. Try again.",
        }
    }
}

/// Per-session translation orchestrator.
///
/// Owns the session cache, the in-flight marker and the metrics. Only the
/// most recently issued network request is tracked as in flight; an identical
/// request arriving meanwhile is dropped, a different one gets its own call.
pub struct Translator {
    client: MyMemoryClient,
    cache: Mutex<TranslationCache>,
    in_flight: Mutex<Option<TranslationRequest>>,
    metrics: TranslationMetrics,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight marker when the network call ends, including when
/// the calling future is dropped mid-request.
struct InFlightGuard<'a> {
    slot: &'a Mutex<Option<TranslationRequest>>,
    request: TranslationRequest,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut slot = lock(self.slot);
        // A newer request may have taken the slot; leave its marker alone.
        if slot.as_ref() == Some(&self.request) {
            *slot = None;
        }
    }
}

impl Translator {
    pub fn new(client: MyMemoryClient) -> Self {
        Self {
            client,
            cache: Mutex::new(TranslationCache::new()),
            in_flight: Mutex::new(None),
            metrics: TranslationMetrics::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = MyMemoryClient::new(config.api_url.clone(), config.request_timeout)?;
        info!("Using translation API at {}", client.api_url());
        Ok(Self::new(client))
    }

    /// Translate `text` from `source` to `target`.
    ///
    /// Leading and trailing whitespace is trimmed before anything else; the
    /// trimmed text is what gets sent, cached and compared.
    pub async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<TranslateOutcome, TranslateError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TranslateError::EmptyInput);
        }

        let request = TranslationRequest::new(text, source, target);

        if source == target {
            return Ok(TranslateOutcome::Translated {
                text: request.text.clone(),
                request,
                status: TranslationStatus::SameLanguage,
            });
        }

        let guard = {
            let mut in_flight = lock(&self.in_flight);

            if in_flight.as_ref() == Some(&request) {
                debug!("Identical request {} already in flight, skipping", request.langpair());
                self.metrics.record_coalesced();
                return Ok(TranslateOutcome::InFlight);
            }

            if let Some(cached) = lock(&self.cache).get(&request) {
                debug!("Cache hit for {}", request.langpair());
                self.metrics.record_cache_hit();
                return Ok(TranslateOutcome::Translated {
                    text: cached.to_string(),
                    request,
                    status: TranslationStatus::Cached,
                });
            }

            self.metrics.record_cache_miss();
            *in_flight = Some(request.clone());
            InFlightGuard {
                slot: &self.in_flight,
                request: request.clone(),
            }
        };

        self.metrics.record_api_call();
        let fetched = self.client.fetch(&request).await;

        let response = match fetched {
            Ok(response) => response,
            Err(e) => {
                drop(guard);
                self.metrics.record_api_failure();
                error!("Translation {} failed: {:#}", request.langpair(), e);
                return Err(TranslateError::TranslationFailed(format!("{:#}", e)));
            }
        };

        let translated = response.best_translation();
        lock(&self.cache).put(request.clone(), translated.clone());
        // An identical call must find either the marker or the cache entry.
        drop(guard);

        let status = match response.advisory() {
            Some(detail) => {
                warn!("Translation API advisory for {}: {}", request.langpair(), detail);
                TranslationStatus::Advisory(detail)
            }
            None => TranslationStatus::Done,
        };

        Ok(TranslateOutcome::Translated {
            request,
            text: translated,
            status,
        })
    }

    /// Cached translation for an exact request, if any.
    pub fn cached(&self, request: &TranslationRequest) -> Option<String> {
        lock(&self.cache).get(request).map(str::to_string)
    }

    pub fn is_in_flight(&self, request: &TranslationRequest) -> bool {
        lock(&self.in_flight).as_ref() == Some(request)
    }

    pub fn cache_len(&self) -> usize {
        lock(&self.cache).len()
    }

    pub fn metrics(&self) -> MetricsReport {
        self.metrics.report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== Helper Functions ====================

    fn translator_for(server: &MockServer) -> Translator {
        let client = MyMemoryClient::new(format!("{}/get", server.uri()), Duration::from_secs(5))
            .expect("client should build");
        Translator::new(client)
    }

    fn api_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "responseData": {"translatedText": text, "match": 1},
            "responseStatus": 200,
            "responseDetails": "",
            "matches": [
                {"id": "1", "segment": "x", "translation": text, "match": 1}
            ]
        })
    }

    fn french() -> Language {
        Language::from_code("fr").unwrap()
    }

    fn text_of(outcome: &TranslateOutcome) -> (&str, &TranslationStatus) {
        match outcome {
            TranslateOutcome::Translated { text, status, .. } => (text.as_str(), status),
            TranslateOutcome::InFlight => panic!("expected a translation, got InFlight"),
        }
    }

    // ==================== Early Exit Tests ====================

    #[tokio::test]
    async fn test_empty_input_is_rejected_without_network() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(api_response("x")))
            .expect(0)
            .mount(&mock_server)
            .await;

        let translator = translator_for(&mock_server);
        let result = translator.translate("   ", Language::ENGLISH, Language::SPANISH).await;

        assert!(matches!(result, Err(TranslateError::EmptyInput)));
        assert_eq!(translator.metrics().api_calls, 0);
    }

    #[tokio::test]
    async fn test_same_language_short_circuit() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(api_response("x")))
            .expect(0)
            .mount(&mock_server)
            .await;

        let translator = translator_for(&mock_server);
        let outcome = translator
            .translate("hello", Language::ENGLISH, Language::ENGLISH)
            .await
            .expect("Should succeed");

        let (text, status) = text_of(&outcome);
        assert_eq!(text, "hello");
        assert_eq!(*status, TranslationStatus::SameLanguage);
        assert_eq!(translator.cache_len(), 0);
    }

    // ==================== Network + Cache Tests ====================

    #[tokio::test]
    async fn test_translate_then_cached() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get"))
            .and(query_param("q", "hello"))
            .and(query_param("langpair", "en|es"))
            .respond_with(ResponseTemplate::new(200).set_body_json(api_response("hola")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let translator = translator_for(&mock_server);

        let first = translator
            .translate("hello", Language::ENGLISH, Language::SPANISH)
            .await
            .expect("Should succeed");
        assert_eq!(text_of(&first), ("hola", &TranslationStatus::Done));

        for _ in 0..2 {
            let again = translator
                .translate("hello", Language::ENGLISH, Language::SPANISH)
                .await
                .expect("Should succeed");
            assert_eq!(text_of(&again), ("hola", &TranslationStatus::Cached));
        }

        let report = translator.metrics();
        assert_eq!(report.api_calls, 1);
        assert_eq!(report.cache_hits, 2);
        assert_eq!(report.cache_misses, 1);
    }

    #[tokio::test]
    async fn test_surrounding_whitespace_is_trimmed_before_lookup() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "hello"))
            .respond_with(ResponseTemplate::new(200).set_body_json(api_response("hola")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let translator = translator_for(&mock_server);
        translator
            .translate("  hello\n", Language::ENGLISH, Language::SPANISH)
            .await
            .expect("Should succeed");
        let outcome = translator
            .translate("hello", Language::ENGLISH, Language::SPANISH)
            .await
            .expect("Should succeed");

        assert_eq!(text_of(&outcome).1, &TranslationStatus::Cached);
    }

    #[tokio::test]
    async fn test_identical_concurrent_requests_are_coalesced() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(api_response("hola"))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let translator = translator_for(&mock_server);
        let (a, b) = tokio::join!(
            translator.translate("hello", Language::ENGLISH, Language::SPANISH),
            translator.translate("hello", Language::ENGLISH, Language::SPANISH),
        );

        let outcomes = [a.expect("Should succeed"), b.expect("Should succeed")];
        let in_flight = outcomes
            .iter()
            .filter(|o| matches!(o, TranslateOutcome::InFlight))
            .count();
        assert_eq!(in_flight, 1);
        assert_eq!(translator.metrics().coalesced, 1);
    }

    #[tokio::test]
    async fn test_different_concurrent_requests_both_call() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("langpair", "en|es"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(api_response("hola"))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("langpair", "en|fr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(api_response("bonjour")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let translator = translator_for(&mock_server);
        let (a, b) = tokio::join!(
            translator.translate("hello", Language::ENGLISH, Language::SPANISH),
            translator.translate("hello", Language::ENGLISH, french()),
        );

        assert_eq!(text_of(&a.expect("Should succeed")).0, "hola");
        assert_eq!(text_of(&b.expect("Should succeed")).0, "bonjour");
        assert_eq!(translator.cache_len(), 2);
    }

    #[tokio::test]
    async fn test_marker_cleared_after_completion() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(api_response("hola")))
            .mount(&mock_server)
            .await;

        let translator = translator_for(&mock_server);
        let request = TranslationRequest::new("hello", Language::ENGLISH, Language::SPANISH);

        translator
            .translate("hello", Language::ENGLISH, Language::SPANISH)
            .await
            .expect("Should succeed");

        assert!(!translator.is_in_flight(&request));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_identical_callers_around_completion_share_one_call() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(api_response("hola"))
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let translator = std::sync::Arc::new(translator_for(&mock_server));

        // Callers keep retrying until they see a result, so some of them
        // land right as the first call completes.
        let callers: Vec<_> = (0..8)
            .map(|_| {
                let translator = std::sync::Arc::clone(&translator);
                tokio::spawn(async move {
                    loop {
                        let outcome = translator
                            .translate("hello", Language::ENGLISH, Language::SPANISH)
                            .await
                            .expect("Should succeed");
                        if let TranslateOutcome::Translated { text, .. } = outcome {
                            return text;
                        }
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        for caller in callers {
            assert_eq!(caller.await.expect("caller task"), "hola");
        }
        assert_eq!(translator.metrics().api_calls, 1);
    }

    #[tokio::test]
    async fn test_dropped_call_clears_marker() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(api_response("hola"))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let translator = translator_for(&mock_server);
        let request = TranslationRequest::new("hello", Language::ENGLISH, Language::SPANISH);

        let timed_out = tokio::time::timeout(
            Duration::from_millis(50),
            translator.translate("hello", Language::ENGLISH, Language::SPANISH),
        )
        .await;

        assert!(timed_out.is_err());
        assert!(!translator.is_in_flight(&request));
        assert!(translator.cached(&request).is_none());
    }

    // ==================== Failure Tests ====================

    #[tokio::test]
    async fn test_http_error_is_translation_failed_and_not_cached() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(2)
            .mount(&mock_server)
            .await;

        let translator = translator_for(&mock_server);

        for _ in 0..2 {
            let result = translator
                .translate("hello", Language::ENGLISH, Language::SPANISH)
                .await;
            match result {
                Err(TranslateError::TranslationFailed(detail)) => assert!(detail.contains("500")),
                other => panic!("expected TranslationFailed, got {:?}", other),
            }
        }

        assert_eq!(translator.cache_len(), 0);
        assert_eq!(translator.metrics().api_failures, 2);
    }

    #[tokio::test]
    async fn test_malformed_json_is_translation_failed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let translator = translator_for(&mock_server);
        let result = translator
            .translate("hello", Language::ENGLISH, Language::SPANISH)
            .await;

        let error = result.unwrap_err();
        assert!(matches!(error, TranslateError::TranslationFailed(_)));
        assert_eq!(error.notice(), "Translation failed. Try again.");
    }

    // ==================== Advisory Tests ====================

    #[tokio::test]
    async fn test_non_200_response_status_is_advisory() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responseData": {"translatedText": "hola"},
                "responseStatus": 429,
                "responseDetails": "QUOTA EXCEEDED"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let translator = translator_for(&mock_server);
        let outcome = translator
            .translate("hello", Language::ENGLISH, Language::SPANISH)
            .await
            .expect("Advisory is not an error");

        assert_eq!(
            text_of(&outcome),
            ("hola", &TranslationStatus::Advisory("QUOTA EXCEEDED".to_string()))
        );

        let cached = translator
            .translate("hello", Language::ENGLISH, Language::SPANISH)
            .await
            .expect("Should succeed");
        assert_eq!(text_of(&cached).1, &TranslationStatus::Cached);
    }

    #[tokio::test]
    async fn test_invalid_language_error_body_is_advisory() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responseData": {"translatedText": "'XX' IS AN INVALID TARGET LANGUAGE"},
                "responseDetails": "'XX' IS AN INVALID TARGET LANGUAGE",
                "responseStatus": "403",
                "matches": ""
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let translator = translator_for(&mock_server);
        let outcome = translator
            .translate("hello", Language::ENGLISH, french())
            .await
            .expect("Advisory is not an error");

        assert_eq!(
            text_of(&outcome),
            (
                "'XX' IS AN INVALID TARGET LANGUAGE",
                &TranslationStatus::Advisory("'XX' IS AN INVALID TARGET LANGUAGE".to_string())
            )
        );
        assert_eq!(translator.metrics().api_failures, 0);
    }

    #[tokio::test]
    async fn test_empty_selection_is_cached() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let translator = translator_for(&mock_server);
        let first = translator
            .translate("zzz", Language::ENGLISH, Language::SPANISH)
            .await
            .expect("Should succeed");
        assert_eq!(text_of(&first).0, "");

        let second = translator
            .translate("zzz", Language::ENGLISH, Language::SPANISH)
            .await
            .expect("Should succeed");
        assert_eq!(text_of(&second), ("", &TranslationStatus::Cached));
    }

    // ==================== Status Display Tests ====================

    #[test]
    fn test_status_display() {
        assert_eq!(TranslationStatus::SameLanguage.to_string(), "Same language");
        assert_eq!(TranslationStatus::Cached.to_string(), "Cached");
        assert_eq!(TranslationStatus::Done.to_string(), "Done");
        assert_eq!(
            TranslationStatus::Advisory("Status 403".to_string()).to_string(),
            "Status 403"
        );
    }

    #[test]
    fn test_empty_input_notice() {
        assert_eq!(
            TranslateError::EmptyInput.notice(),
            "Please enter text to translate."
        );
    }
}
