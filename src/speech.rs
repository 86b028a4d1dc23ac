//! Speech output: voice selection and the platform synthesizer seam.

use std::io::ErrorKind;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use tracing::{debug, warn};

/// A synthesis voice as exposed by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP 47-ish tag such as "en-US" or "tl-PH"
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }

    fn lang_starts_with(&self, prefix: &str) -> bool {
        !self.lang.is_empty() && self.lang.to_lowercase().starts_with(prefix)
    }
}

/// Codes the translation API uses that voices commonly publish under a
/// different tag.
const VOICE_ALIASES: [(&str, &str); 3] = [("fil", "tl"), ("zh-tw", "zh"), ("no", "nb")];

/// Pick the voice to read `target_lang` text with.
///
/// Rules, first non-empty candidate set wins and its first voice (platform
/// order) is taken:
/// 1. tag starts with the lower-cased code
/// 2. tag starts with the alias of the code (`fil`→`tl`, `zh-tw`→`zh`, `no`→`nb`)
/// 3. tag starts with the primary subtag of the code
/// 4. any English voice
pub fn select_voice<'a>(target_lang: &str, voices: &'a [Voice]) -> Option<&'a Voice> {
    let code = target_lang.to_lowercase();
    let first_with = |prefix: &str| voices.iter().find(|v| v.lang_starts_with(prefix));

    first_with(&code)
        .or_else(|| {
            VOICE_ALIASES
                .iter()
                .find(|(from, _)| *from == code)
                .and_then(|(_, alias)| first_with(alias))
        })
        .or_else(|| {
            let primary = code.split('-').next().unwrap_or(&code);
            first_with(primary)
        })
        .or_else(|| first_with("en"))
}

/// A request to the synthesizer. `voice` is `None` when nothing matched, in
/// which case the engine is asked for `lang` directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<Voice>,
    pub lang: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("Speech synthesis is not available: {0}")]
    Unsupported(String),

    #[error("Speech synthesis failed: {0}")]
    Failed(String),
}

impl SpeechError {
    pub fn notice(&self) -> &'static str {
        match self {
            SpeechError::Unsupported(_) => "Speech not supported on this system.",
            SpeechError::Failed(_) => "Speech failed.",
        }
    }
}

/// Platform text-to-speech engine.
pub trait SpeechSynthesizer: Send + Sync {
    /// Voices currently installed. May change over time; callers refresh.
    fn voices(&self) -> Result<Vec<Voice>, SpeechError>;

    /// Start speaking. Returns once playback has started.
    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError>;

    /// Stop whatever is currently being spoken.
    fn cancel(&self);
}

/// Snapshot of the platform's voices plus the selection rules.
#[derive(Debug, Default)]
pub struct VoiceResolver {
    voices: Vec<Voice>,
}

impl VoiceResolver {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self { voices }
    }

    /// Replace the snapshot after the platform reports a voice change.
    pub fn refresh(&mut self, voices: Vec<Voice>) {
        debug!("Voice list refreshed: {} voices", voices.len());
        self.voices = voices;
    }

    /// Reload from the synthesizer. A failing engine leaves an empty list.
    pub fn reload(&mut self, synthesizer: &dyn SpeechSynthesizer) {
        match synthesizer.voices() {
            Ok(voices) => self.refresh(voices),
            Err(e) => {
                warn!("Could not list voices: {}", e);
                self.voices.clear();
            }
        }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn select(&self, target_lang: &str) -> Option<&Voice> {
        select_voice(target_lang, &self.voices)
    }

    /// Build the utterance for `text` in `lang_code`.
    pub fn utterance(&self, text: &str, lang_code: &str) -> Utterance {
        match self.select(lang_code) {
            Some(voice) => Utterance {
                text: text.to_string(),
                lang: voice.lang.clone(),
                voice: Some(voice.clone()),
            },
            None => Utterance {
                text: text.to_string(),
                voice: None,
                lang: lang_code.to_string(),
            },
        }
    }
}

/// Synthesizer driving an eSpeak NG compatible command line tool.
pub struct CommandSynthesizer {
    program: String,
    current: Mutex<Option<Child>>,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            current: Mutex::new(None),
        }
    }

    fn map_spawn_error(&self, e: std::io::Error) -> SpeechError {
        if e.kind() == ErrorKind::NotFound {
            SpeechError::Unsupported(format!("'{}' is not installed", self.program))
        } else {
            SpeechError::Failed(e.to_string())
        }
    }
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File          Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  2  en-us           --/M      English_(America)  gmw/en-US     (en 3)
/// ```
pub fn parse_voice_table(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let _priority = columns.next()?;
            let lang = columns.next()?;
            let _age_gender = columns.next()?;
            let name = columns.next()?;
            Some(Voice::new(name.replace('_', " "), lang))
        })
        .collect()
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn voices(&self) -> Result<Vec<Voice>, SpeechError> {
        let output = Command::new(&self.program)
            .arg("--voices")
            .stderr(Stdio::null())
            .output()
            .map_err(|e| self.map_spawn_error(e))?;

        if !output.status.success() {
            return Err(SpeechError::Failed(format!(
                "'{} --voices' exited with {}",
                self.program, output.status
            )));
        }

        Ok(parse_voice_table(&String::from_utf8_lossy(&output.stdout)))
    }

    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
        let voice = utterance
            .voice
            .as_ref()
            .map(|v| v.lang.as_str())
            .unwrap_or(utterance.lang.as_str());

        let child = Command::new(&self.program)
            .arg("-v")
            .arg(voice)
            .arg("--")
            .arg(&utterance.text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| self.map_spawn_error(e))?;

        debug!("Speaking {} chars with voice {}", utterance.text.len(), voice);
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = Some(child);
        Ok(())
    }

    fn cancel(&self) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(mut child) = current.take() {
            // Already exited is fine.
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
