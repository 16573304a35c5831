//! Archive extraction: the streaming loop and the per-entry writer.

pub mod engine;
pub mod writer;

pub use engine::Extractor;
pub use writer::EntryWriter;
pub use writer::WriteOutcome;
