//! Incremental UTF-8 decoding
//!
//! PTY chunk boundaries carry no semantic meaning and may split multi-byte
//! UTF-8 sequences. `Utf8Carry` buffers an incomplete trailing sequence
//! between chunks so downstream text processing always sees whole
//! characters. Invalid byte runs are dropped rather than surfaced.

/// Carry buffer for UTF-8 sequences split across chunk boundaries
#[derive(Debug, Default)]
pub struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    /// Create an empty carry buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the decodable prefix as text.
    /// An incomplete trailing sequence (up to 3 bytes) is held back for the
    /// next call; invalid sequences are skipped.
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // Incomplete trailing sequence; keep for the next chunk
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }
        // Lossy decode of an invalid range inserts U+FFFD; drop those markers
        // to match the "skip undecodable bytes" contract.
        if out.contains('\u{FFFD}') {
            out.retain(|c| c != '\u{FFFD}');
        }
        out
    }

    /// Decode and discard anything still buffered (stream end)
    pub fn flush(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let mut text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text.retain(|c| c != '\u{FFFD}');
        text
    }

    /// Drop any buffered bytes
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}
