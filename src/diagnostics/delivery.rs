//! Delivery of an exported report to the operator
//!
//! The clipboard is tried first. Whenever it is missing or the write fails,
//! the caller gets the full text back in a [`ManualCopy`] to present for
//! manual selection; the fallback is never skipped.

use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// No clipboard can be opened in this environment
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard write failed: {0}")]
    WriteFailed(String),
}

/// Destination for copied text
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Text the operator has to copy by hand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualCopy {
    /// The complete serialized report
    pub text: String,
    /// Why the clipboard path was not taken
    pub reason: String,
}

impl ManualCopy {
    /// One-line prompt shown above the selectable text
    pub fn instructions(&self) -> String {
        format!(
            "Could not copy automatically ({}). Select the text below and copy it manually.",
            self.reason
        )
    }
}

/// Outcome of delivering a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The text is on the clipboard
    Clipboard,
    /// The text must be copied by hand
    Manual(ManualCopy),
}

impl Delivery {
    pub fn is_clipboard(&self) -> bool {
        matches!(self, Delivery::Clipboard)
    }

    pub fn manual(&self) -> Option<&ManualCopy> {
        match self {
            Delivery::Manual(copy) => Some(copy),
            Delivery::Clipboard => None,
        }
    }
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delivery::Clipboard => write!(f, "Diagnostics copied to clipboard"),
            Delivery::Manual(copy) => write!(f, "{}\n\n{}", copy.instructions(), copy.text),
        }
    }
}

/// Copy `text` to the clipboard, falling back to manual copy
pub fn deliver(text: String, clipboard: Option<&mut dyn ClipboardSink>) -> Delivery {
    let Some(sink) = clipboard else {
        warn!("no clipboard available, presenting diagnostics for manual copy");
        return Delivery::Manual(ManualCopy {
            text,
            reason: "clipboard unavailable".to_string(),
        });
    };

    match sink.set_text(&text) {
        Ok(()) => {
            info!(bytes = text.len(), "diagnostics copied to clipboard");
            Delivery::Clipboard
        }
        Err(e) => {
            warn!(error = %e, "clipboard copy failed, presenting diagnostics for manual copy");
            Delivery::Manual(ManualCopy {
                text,
                reason: e.to_string(),
            })
        }
    }
}

/// The desktop clipboard
///
/// The platform handle is opened on first use and re-opened after a failure.
#[cfg(feature = "clipboard")]
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

#[cfg(feature = "clipboard")]
impl SystemClipboard {
    pub fn new() -> Self {
        Self {
            inner: arboard::Clipboard::new().ok(),
        }
    }
}

#[cfg(feature = "clipboard")]
impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.inner.is_none() {
            self.inner = Some(
                arboard::Clipboard::new()
                    .map_err(|e| ClipboardError::Unavailable(e.to_string()))?,
            );
        }
        let Some(clipboard) = self.inner.as_mut() else {
            return Err(ClipboardError::Unavailable("no clipboard handle".to_string()));
        };
        let result = clipboard.set_text(text.to_owned());
        result.map_err(|e| {
            self.inner = None;
            ClipboardError::WriteFailed(e.to_string())
        })
    }
}
