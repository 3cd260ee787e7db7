//! PPTX document store: open, mutate, save in place.
//!
//! A `.pptx` is a ZIP archive of XML parts. Opening reads the whole archive
//! into memory and parses the slide parts into the domain model; saving
//! rewrites the slide parts from the model and writes a fresh archive over
//! the original path. The document exclusively owns its in-memory archive
//! for the open-to-save span; nothing is held on disk in between.

use crate::{parser, writer};
use deckfit_core::{Canvas, Document, DocumentStore, Error, Result, Slide};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// ZIP local file header, the container of every .pptx.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// OLE/CFB header, the container of legacy .ppt files.
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";

/// Opens `.pptx` files from the filesystem.
#[derive(Debug, Default)]
pub struct PptxStore;

impl PptxStore {
    pub fn new() -> Self {
        Self
    }
}

/// Reject anything that is not a ZIP container up front, with a pointed
/// message for legacy .ppt files.
fn check_magic(bytes: &[u8]) -> Result<()> {
    if bytes.starts_with(&ZIP_MAGIC) {
        return Ok(());
    }
    if bytes.starts_with(&OLE_MAGIC) {
        return Err(Error::UnsupportedFormat(
            "legacy .ppt (OLE) file; only .pptx is supported".to_string(),
        ));
    }
    Err(Error::UnsupportedFormat(
        "not a .pptx (ZIP) file".to_string(),
    ))
}

impl DocumentStore for PptxStore {
    type Document = PptxDocument;

    fn open(&self, path: &Path) -> Result<PptxDocument> {
        let bytes = std::fs::read(path)?;
        check_magic(&bytes)?;

        let mut archive = ZipArchive::new(Cursor::new(&bytes))
            .map_err(|e| Error::Zip(format!("Failed to open ZIP: {}", e)))?;

        let mut entries: Vec<(String, Vec<u8>)> = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::Zip(format!("Failed to read archive entry: {}", e)))?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push((file.name().to_string(), data));
        }

        let canvas = parser::parse_canvas(entry_str(&entries, PRESENTATION_PART)?)?;
        let slide_paths = parser::slide_order(entry_str(&entries, PRESENTATION_RELS_PART)?)?;
        log::debug!(
            "{}: {} slides, canvas {}x{} EMU",
            path.display(),
            slide_paths.len(),
            canvas.width,
            canvas.height
        );

        let mut slides = Vec::with_capacity(slide_paths.len());
        for slide_path in &slide_paths {
            slides.push(parser::parse_slide(entry_str(&entries, slide_path)?)?);
        }

        Ok(PptxDocument {
            path: path.to_path_buf(),
            canvas,
            slides,
            slide_paths,
            entries,
        })
    }
}

/// Look up a required archive part as UTF-8 text.
fn entry_str<'a>(entries: &'a [(String, Vec<u8>)], name: &str) -> Result<&'a str> {
    let (_, data) = entries
        .iter()
        .find(|(n, _)| n == name)
        .ok_or_else(|| Error::Corrupted(format!("archive is missing {}", name)))?;
    std::str::from_utf8(data)
        .map_err(|_| Error::Corrupted(format!("{} is not valid UTF-8", name)))
}

/// An open `.pptx` document with its slides parsed into the domain model.
pub struct PptxDocument {
    path: PathBuf,
    canvas: Canvas,
    slides: Vec<Slide>,
    /// Archive paths of the slide parts, aligned with `slides`.
    slide_paths: Vec<String>,
    /// Every archive part, in original order.
    entries: Vec<(String, Vec<u8>)>,
}

impl Document for PptxDocument {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn slides_mut(&mut self) -> &mut [Slide] {
        &mut self.slides
    }

    fn save(&mut self) -> Result<()> {
        // Regenerate every slide part from the model, then rebuild the
        // archive around the untouched parts.
        let mut rewritten = Vec::with_capacity(self.slide_paths.len());
        for (slide_path, slide) in self.slide_paths.iter().zip(&self.slides) {
            let xml = entry_str(&self.entries, slide_path)?;
            rewritten.push((slide_path.clone(), writer::rewrite_slide(xml, slide)?));
        }
        for (slide_path, data) in rewritten {
            if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == slide_path) {
                entry.1 = data;
            }
        }

        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buf);
            let options =
                FileOptions::default().compression_method(CompressionMethod::Deflated);
            for (name, data) in &self.entries {
                zip.start_file(name, options)
                    .map_err(|e| Error::Save(format!("{}", e)))?;
                zip.write_all(data)
                    .map_err(|e| Error::Save(format!("{}", e)))?;
            }
            zip.finish().map_err(|e| Error::Save(format!("{}", e)))?;
        }

        match std::fs::write(&self.path, buf.into_inner()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(Error::SaveLocked(self.path.clone()))
            }
            Err(e) => Err(Error::Save(e.to_string())),
        }
    }
}
