//! Translator session: the state behind the two text panes and the actions a
//! user can take on them.
//!
//! Translation results are delivered as [`SessionEvent`]s because they can
//! arrive at any time (debounced auto-translate); every other action returns
//! its outcome directly.

use crate::clipboard::{Clipboard, ClipboardError};
use crate::debounce::Debouncer;
use crate::i18n::{Language, LanguageRegistry, MetricsReport};
use crate::preferences::{KeyValueStore, Preferences, Theme};
use crate::speech::{SpeechError, SpeechSynthesizer, VoiceResolver};
use crate::translation::{TranslateError, TranslateOutcome, Translator};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

/// Picker shortlists, shown above the full alphabetical list.
pub const PREFERRED_SOURCE: [&str; 4] = ["en", "es", "fr", "de"];
pub const PREFERRED_TARGET: [&str; 4] = ["es", "en", "fr", "de"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Source,
    Target,
}

impl Pane {
    pub fn parse(value: &str) -> Option<Pane> {
        match value {
            "from" | "source" => Some(Pane::Source),
            "to" | "target" => Some(Pane::Target),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The output pane changed.
    Output { text: String, status: String },
    /// Transient message for the user.
    Notice(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Nothing to speak")]
    NothingToSpeak,

    #[error("Nothing to copy")]
    NothingToCopy,

    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

impl ActionError {
    pub fn notice(&self) -> &'static str {
        match self {
            ActionError::NothingToSpeak => "Nothing to speak",
            ActionError::NothingToCopy => "Nothing to copy",
            ActionError::Speech(e) => e.notice(),
            ActionError::Clipboard(e) => e.notice(),
        }
    }
}

/// Read-only copy of what the panes currently show.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub input: String,
    pub output: String,
    pub status: String,
    pub prefs: Preferences,
}

#[derive(Debug)]
struct PaneState {
    input: String,
    output: String,
    status: String,
    prefs: Preferences,
}

impl PaneState {
    /// Whether the panes still show this text and language pair.
    fn shows(&self, text: &str, source: Language, target: Language) -> bool {
        self.input.trim() == text && self.prefs.source == source && self.prefs.target == target
    }
}

/// State the debounced task needs after the session has moved on.
struct Shared {
    translator: Arc<Translator>,
    state: Mutex<PaneState>,
    events: UnboundedSender<SessionEvent>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, PaneState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, event: SessionEvent) {
        // Receiver gone means nobody is watching any more.
        let _ = self.events.send(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Explicit,
    Auto,
}

/// Translate the current input with the current language pair and publish
/// the result if it still matches what the panes show.
async fn run_translation(shared: Arc<Shared>, trigger: Trigger) {
    let (input, source, target) = {
        let state = shared.state();
        if trigger == Trigger::Auto && !state.prefs.auto_translate {
            return;
        }
        (state.input.clone(), state.prefs.source, state.prefs.target)
    };

    let outcome = shared.translator.translate(&input, source, target).await;

    match outcome {
        Ok(TranslateOutcome::Translated {
            request,
            text,
            status,
        }) => {
            let status = status.to_string();
            {
                let mut state = shared.state();
                if !state.shows(&request.text, request.source, request.target) {
                    debug!("Discarding result for superseded request {}", request.langpair());
                    return;
                }
                state.output = text.clone();
                state.status = status.clone();
            }
            shared.notify(SessionEvent::Output { text, status });
        }
        Ok(TranslateOutcome::InFlight) => {}
        Err(TranslateError::EmptyInput) => {
            // Auto-translate on a blank pane stays quiet.
            if trigger == Trigger::Explicit {
                shared.notify(SessionEvent::Notice(
                    TranslateError::EmptyInput.notice().to_string(),
                ));
            }
        }
        Err(e) => {
            {
                let mut state = shared.state();
                if !state.shows(input.trim(), source, target) {
                    debug!("Discarding failure for superseded request {}|{}", source, target);
                    return;
                }
                state.status = "Error".to_string();
            }
            shared.notify(SessionEvent::Notice(e.notice().to_string()));
        }
    }
}

pub struct Session {
    shared: Arc<Shared>,
    store: Arc<dyn KeyValueStore>,
    speech: Box<dyn SpeechSynthesizer>,
    clipboard: Box<dyn Clipboard>,
    voices: VoiceResolver,
    debouncer: Debouncer,
    max_input_chars: usize,
}

impl Session {
    pub fn new(
        translator: Arc<Translator>,
        store: Arc<dyn KeyValueStore>,
        speech: Box<dyn SpeechSynthesizer>,
        clipboard: Box<dyn Clipboard>,
        debounce_window: Duration,
        max_input_chars: usize,
    ) -> (Self, UnboundedReceiver<SessionEvent>) {
        let prefs = Preferences::load(store.as_ref());
        let (events, receiver) = mpsc::unbounded_channel();

        let mut voices = VoiceResolver::default();
        voices.reload(speech.as_ref());

        info!(
            "Session ready: {} -> {}, auto-translate {}",
            prefs.source.name(),
            prefs.target.name(),
            if prefs.auto_translate { "on" } else { "off" }
        );

        let session = Self {
            shared: Arc::new(Shared {
                translator,
                state: Mutex::new(PaneState {
                    input: String::new(),
                    output: String::new(),
                    status: String::new(),
                    prefs,
                }),
                events,
            }),
            store,
            speech,
            clipboard,
            voices,
            debouncer: Debouncer::new(debounce_window),
            max_input_chars,
        };

        (session, receiver)
    }

    pub fn view(&self) -> SessionView {
        let state = self.shared.state();
        SessionView {
            input: state.input.clone(),
            output: state.output.clone(),
            status: state.status.clone(),
            prefs: state.prefs.clone(),
        }
    }

    pub fn preferences(&self) -> Preferences {
        self.shared.state().prefs.clone()
    }

    /// Character counter, e.g. "12 / 5000".
    pub fn char_count(&self) -> String {
        let count = self.shared.state().input.chars().count();
        format!("{} / {}", count, self.max_input_chars)
    }

    pub fn is_right_to_left(&self, pane: Pane) -> bool {
        self.language_of(pane).is_right_to_left()
    }

    /// Codes for a picker, shortlist first.
    pub fn language_choices(pane: Pane) -> Vec<&'static str> {
        let preferred: &[&str] = match pane {
            Pane::Source => &PREFERRED_SOURCE,
            Pane::Target => &PREFERRED_TARGET,
        };
        LanguageRegistry::get().all_codes(preferred).codes()
    }

    fn language_of(&self, pane: Pane) -> Language {
        let state = self.shared.state();
        match pane {
            Pane::Source => state.prefs.source,
            Pane::Target => state.prefs.target,
        }
    }

    fn save_selection(&self) {
        self.shared.state().prefs.save_selection(self.store.as_ref());
    }

    fn schedule_auto_translate(&mut self) {
        let shared = Arc::clone(&self.shared);
        self.debouncer.schedule(run_translation(shared, Trigger::Auto));
    }

    fn input_is_blank(&self) -> bool {
        self.shared.state().input.trim().is_empty()
    }

    /// Replace the input text. Longer text is cut at the input limit.
    /// Schedules a debounced translation.
    pub fn set_input(&mut self, text: &str) {
        let clipped: String = text.chars().take(self.max_input_chars).collect();
        self.shared.state().input = clipped;
        self.schedule_auto_translate();
    }

    /// Translate right away, regardless of the auto-translate setting.
    pub async fn translate_now(&self) {
        run_translation(Arc::clone(&self.shared), Trigger::Explicit).await;
    }

    pub fn set_source(&mut self, language: Language) {
        self.shared.state().prefs.source = language;
        self.save_selection();
        self.schedule_auto_translate();
    }

    pub fn set_target(&mut self, language: Language) {
        self.shared.state().prefs.target = language;
        self.save_selection();
        self.schedule_auto_translate();
    }

    /// Swap the languages and the pane contents.
    pub async fn swap(&mut self) {
        {
            let mut state = self.shared.state();
            let prefs = &mut state.prefs;
            std::mem::swap(&mut prefs.source, &mut prefs.target);

            let PaneState { input, output, .. } = &mut *state;
            std::mem::swap(input, output);
        }
        self.save_selection();

        let auto = self.shared.state().prefs.auto_translate;
        if auto && !self.input_is_blank() {
            self.translate_now().await;
        }
    }

    pub async fn set_auto_translate(&mut self, enabled: bool) {
        self.shared.state().prefs.auto_translate = enabled;
        self.save_selection();

        if enabled && !self.input_is_blank() {
            self.translate_now().await;
        }
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let prefs = {
            let mut state = self.shared.state();
            state.prefs.theme = state.prefs.theme.toggled();
            state.prefs.clone()
        };
        prefs.save_theme(self.store.as_ref());
        prefs.theme
    }

    /// Read a pane aloud with the best matching voice.
    pub fn speak(&self, pane: Pane) -> Result<(), ActionError> {
        let text = {
            let state = self.shared.state();
            match pane {
                Pane::Source => state.input.trim().to_string(),
                Pane::Target => state.output.trim().to_string(),
            }
        };
        if text.is_empty() {
            return Err(ActionError::NothingToSpeak);
        }

        let utterance = self.voices.utterance(&text, self.language_of(pane).code());
        self.speech.cancel();
        self.speech.speak(&utterance)?;
        Ok(())
    }

    pub fn stop_speaking(&self) {
        self.speech.cancel();
    }

    /// Re-read the platform voice list.
    pub fn refresh_voices(&mut self) -> usize {
        self.voices.reload(self.speech.as_ref());
        self.voices.voices().len()
    }

    pub fn copy(&self, pane: Pane) -> Result<(), ActionError> {
        let text = {
            let state = self.shared.state();
            match pane {
                Pane::Source => state.input.clone(),
                Pane::Target => state.output.clone(),
            }
        };
        if text.is_empty() {
            return Err(ActionError::NothingToCopy);
        }

        self.clipboard.write_text(&text)?;
        Ok(())
    }

    pub fn clear(&mut self, pane: Pane) {
        let mut state = self.shared.state();
        match pane {
            Pane::Source => {
                state.input.clear();
                state.status.clear();
            }
            Pane::Target => state.output.clear(),
        }
    }

    pub fn metrics(&self) -> MetricsReport {
        self.shared.translator.metrics()
    }
}
