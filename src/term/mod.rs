//! Terminal text processing
//!
//! Transforms the raw PTY byte stream into readable text and discrete
//! command/output records: incremental UTF-8 decoding, ANSI/VT escape
//! removal, and cross-chunk line segmentation.

pub mod normalize;
pub mod segmenter;
pub mod utf8;

pub use normalize::normalize;
pub use segmenter::{LineSegmenter, SegmenterOutput, NO_OUTPUT, PROMPT_MARKER};
pub use utf8::Utf8Carry;
