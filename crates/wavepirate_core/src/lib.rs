//! Carving of RIFF/WAVE streams embedded in arbitrary binary data.
//!
//! The crate is I/O-agnostic: sources are any [`std::io::Read`], outputs come
//! from a [`SinkFactory`].

mod error;
pub mod extractor;
pub mod riff;
pub mod scanner;
pub mod sinks;
pub mod stream;
mod traits;

pub use error::{ExtractError, Result};
pub use extractor::{
    ExtractedRecord, ExtractionEvent, Extractor, RunSummary, SkipReason, extract_all,
};
pub use scanner::PatternScanner;
pub use sinks::{DiscardSinks, MemorySinks};
pub use stream::ByteStream;
pub use traits::SinkFactory;
