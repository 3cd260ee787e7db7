//! PPTX (OOXML) document store backend.
//!
//! Opens .pptx files (ZIP archives of XML parts), exposes slides and shapes
//! through the `deckfit-core` document model, and writes geometry and outline
//! edits back into the original file.

pub mod parser;
pub mod store;
pub mod writer;

pub use store::{PptxDocument, PptxStore};
