//! Core domain types, slide layout engine, border styling, and batch runner
//! for PPTX geometry normalization.

pub mod border;
pub mod error;
pub mod layout;
pub mod runner;
pub mod types;

pub use error::{Error, Result};
pub use runner::{BatchRunner, BatchSummary, FileOutcome, FileReport};
pub use types::{
    BorderWeight, Canvas, Document, DocumentStore, Emu, Geometry, LogSink, MemorySink, Outline,
    Rgb, Shape, ShapeKind, Slide, WriteSink,
};
