use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use unveil_core::clipboard::{Clipboard, ClipboardError};

/// Terminal clipboard via the OSC 52 escape sequence.
///
/// The terminal emulator decodes the payload into the system clipboard,
/// so this also works over SSH.
pub struct Osc52Clipboard;

impl Osc52Clipboard {
    pub fn sequence(text: &str) -> String {
        format!("\x1b]52;c;{}\x07", STANDARD.encode(text.as_bytes()))
    }
}

impl Clipboard for Osc52Clipboard {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(Self::sequence(text).as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| ClipboardError::WriteFailed(e.to_string()))
    }
}
