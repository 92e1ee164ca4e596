//! Structured streaming sub-protocol
//!
//! Decoding of the newline-delimited JSON event stream the agent CLI emits
//! in print mode (`--output-format stream-json`). The schema is an external,
//! versionless contract: unknown fields are ignored and malformed lines are
//! skipped, never errors.

pub mod decoder;

pub use decoder::StreamDecoder;
