use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
#[error("Clipboard write failed: {0}")]
pub struct ClipboardError(pub String);

impl ClipboardError {
    pub fn notice(&self) -> &'static str {
        "Copy failed"
    }
}

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// The desktop clipboard via `arboard`.
///
/// The handle is opened on first use and kept for the life of the session:
/// on X11 the copied text is only served while the handle exists.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Mutex<Option<arboard::Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut handle = self.handle.lock().unwrap_or_else(|e| e.into_inner());

        if handle.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| ClipboardError(e.to_string()))?;
            *handle = Some(clipboard);
        }

        match handle.as_mut() {
            Some(clipboard) => {
                clipboard
                    .set_text(text.to_string())
                    .map_err(|e| ClipboardError(e.to_string()))?;
                debug!("Copied {} chars to clipboard", text.chars().count());
                Ok(())
            }
            None => Err(ClipboardError("clipboard unavailable".to_string())),
        }
    }
}
