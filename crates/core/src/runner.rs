//! Batch runner: drives the layout engine over a set of presentation files.
//!
//! Failures are isolated at three levels. A file that cannot be opened, a
//! shape that cannot be processed, and a file that cannot be saved each get a
//! log line and processing moves on; nothing short of invalid invocation
//! input aborts the batch.

use crate::border;
use crate::layout::{self, SlideContext};
use crate::types::{BorderWeight, Canvas, Document, DocumentStore, LogSink, Shape};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Terminal state of one file's pass.
///
/// Files only move forward: `Opened -> Processing -> Saved | SaveFailed`,
/// or straight to `OpenFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileOutcome {
    /// Processed and written back in place.
    Saved,
    /// Could not be opened; file left untouched.
    OpenFailed,
    /// Processed but could not be written back.
    SaveFailed,
}

/// Outcome of one file in the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Result of a whole batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Per-file outcomes, in invocation order.
    pub files: Vec<FileReport>,
    /// Total shapes that failed to process across all files.
    pub shape_errors: usize,
}

impl BatchSummary {
    fn record(&mut self, path: &Path, outcome: FileOutcome) {
        self.files.push(FileReport {
            path: path.to_path_buf(),
            outcome,
        });
    }

    pub fn saved(&self) -> usize {
        self.count(FileOutcome::Saved)
    }

    pub fn open_failures(&self) -> usize {
        self.count(FileOutcome::OpenFailed)
    }

    pub fn save_failures(&self) -> usize {
        self.count(FileOutcome::SaveFailed)
    }

    fn count(&self, outcome: FileOutcome) -> usize {
        self.files.iter().filter(|f| f.outcome == outcome).count()
    }
}

/// Processes a set of presentation files, one at a time.
pub struct BatchRunner<S> {
    store: S,
    weight: BorderWeight,
}

impl<S: DocumentStore> BatchRunner<S> {
    pub fn new(store: S, weight: BorderWeight) -> Self {
        Self { store, weight }
    }

    /// Run the batch over `paths`, reporting progress to `log`.
    ///
    /// Every path is attempted regardless of earlier failures, and a
    /// completion line is always appended once all paths have been tried.
    pub fn run(&self, paths: &[PathBuf], log: &mut dyn LogSink) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for path in paths {
            log.append(&format!("Processing {}...", path.display()));

            let mut doc = match self.store.open(path) {
                Ok(doc) => doc,
                Err(e) => {
                    log.append(&format!("Error opening {}: {}", path.display(), e));
                    summary.record(path, FileOutcome::OpenFailed);
                    continue;
                }
            };

            summary.shape_errors += self.process_document(&mut doc, log);

            match doc.save() {
                Ok(()) => {
                    log.append(&format!("Processed successfully: {}", path.display()));
                    summary.record(path, FileOutcome::Saved);
                }
                Err(e @ Error::SaveLocked(_)) => {
                    log.append(&format!("{}", e));
                    summary.record(path, FileOutcome::SaveFailed);
                }
                Err(e) => {
                    log.append(&format!("Error saving {}: {}", path.display(), e));
                    summary.record(path, FileOutcome::SaveFailed);
                }
            }
            // `doc` drops here, releasing the handle before the next file.
        }

        log.append("All files processed.");
        summary
    }

    /// Lay out and style every slide of an open document.
    ///
    /// Returns the number of shapes that failed; each failure has already
    /// been logged and the siblings kept going.
    fn process_document(&self, doc: &mut S::Document, log: &mut dyn LogSink) -> usize {
        let canvas = doc.canvas();
        let mut errors = 0;

        for slide in doc.slides_mut() {
            // Classification happens once, before any mutation on the slide.
            let qualifying = layout::qualifying(slide);
            let mut ctx = SlideContext::new(qualifying.len());
            log::debug!(
                "slide: {} shapes, {} qualifying",
                slide.shapes.len(),
                qualifying.len()
            );

            for &idx in &qualifying {
                if let Err(e) = Self::layout_shape(&mut slide.shapes[idx], canvas, &mut ctx) {
                    log.append(&format!("Error processing shape: {}", e));
                    errors += 1;
                }
            }

            // Borders go on every capable shape, repositioned or not.
            for shape in &mut slide.shapes {
                border::apply(shape, self.weight);
            }
        }

        errors
    }

    fn layout_shape(shape: &mut Shape, canvas: Canvas, ctx: &mut SlideContext) -> Result<()> {
        let original = shape
            .geometry
            .ok_or_else(|| Error::Shape("qualifying shape has no transform".to_string()))?;

        if let Some(new_geometry) = layout::plan(shape.kind, original, canvas, ctx) {
            shape.geometry = Some(new_geometry);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{inches_to_emu, Geometry, MemorySink, Rgb, ShapeKind, Slide};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// How the in-memory store should behave for one path.
    enum Behavior {
        Ok(Vec<Slide>),
        OpenFails,
        SaveLocked(Vec<Slide>),
        SaveFails(Vec<Slide>),
    }

    #[derive(Default)]
    struct MemoryStore {
        canvas: Option<Canvas>,
        docs: HashMap<PathBuf, Behavior>,
        saved: Rc<RefCell<HashMap<PathBuf, Vec<Slide>>>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                canvas: Some(widescreen()),
                ..Self::default()
            }
        }

        fn with_doc(mut self, path: &str, behavior: Behavior) -> Self {
            self.docs.insert(PathBuf::from(path), behavior);
            self
        }
    }

    struct MemoryDoc {
        path: PathBuf,
        canvas: Canvas,
        slides: Vec<Slide>,
        save_result: Option<Error>,
        saved: Rc<RefCell<HashMap<PathBuf, Vec<Slide>>>>,
    }

    impl Document for MemoryDoc {
        fn canvas(&self) -> Canvas {
            self.canvas
        }

        fn slides_mut(&mut self) -> &mut [Slide] {
            &mut self.slides
        }

        fn save(&mut self) -> crate::Result<()> {
            match self.save_result.take() {
                Some(e) => Err(e),
                None => {
                    self.saved
                        .borrow_mut()
                        .insert(self.path.clone(), self.slides.clone());
                    Ok(())
                }
            }
        }
    }

    impl DocumentStore for MemoryStore {
        type Document = MemoryDoc;

        fn open(&self, path: &Path) -> crate::Result<MemoryDoc> {
            let Some(behavior) = self.docs.get(path) else {
                return Err(Error::Corrupted(format!("{}", path.display())));
            };
            let (slides, save_result) = match behavior {
                Behavior::Ok(slides) => (slides.clone(), None),
                Behavior::OpenFails => {
                    return Err(Error::Corrupted(format!("{}", path.display())))
                }
                Behavior::SaveLocked(slides) => {
                    (slides.clone(), Some(Error::SaveLocked(path.to_path_buf())))
                }
                Behavior::SaveFails(slides) => (
                    slides.clone(),
                    Some(Error::Save("disk full".to_string())),
                ),
            };
            Ok(MemoryDoc {
                path: path.to_path_buf(),
                canvas: self.canvas.unwrap(),
                slides,
                save_result,
                saved: Rc::clone(&self.saved),
            })
        }
    }

    fn widescreen() -> Canvas {
        Canvas {
            width: inches_to_emu(24.4),
            height: inches_to_emu(13.72),
        }
    }

    fn picture(width_in: f64, height_in: f64) -> Shape {
        Shape::new(
            ShapeKind::Picture,
            Some(Geometry {
                left: 0,
                top: 0,
                width: inches_to_emu(width_in),
                height: inches_to_emu(height_in),
            }),
            true,
        )
    }

    fn runner(store: MemoryStore) -> BatchRunner<MemoryStore> {
        BatchRunner::new(store, BorderWeight::try_new(1.5).unwrap())
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_single_shape_slide_is_saved_centered() {
        let store = MemoryStore::new()
            .with_doc("a.pptx", Behavior::Ok(vec![Slide::new(vec![picture(3.0, 2.8)])]));
        let saved = Rc::clone(&store.saved);
        let mut log = MemorySink::default();

        let summary = runner(store).run(&paths(&["a.pptx"]), &mut log);

        assert_eq!(summary.saved(), 1);
        assert_eq!(summary.shape_errors, 0);

        let saved = saved.borrow();
        let slides = &saved[&PathBuf::from("a.pptx")];
        let geometry = slides[0].shapes[0].geometry.unwrap();
        assert_eq!(geometry.width, 9_643_200);
        assert_eq!(geometry.height, 5_510_400);
        assert_eq!(geometry.left, 6_382_880);
        assert_eq!(geometry.top, 3_545_024);
    }

    #[test]
    fn test_border_applied_to_every_capable_shape() {
        let slide = Slide::new(vec![
            picture(3.0, 2.8),
            Shape::new(ShapeKind::Other, None, true),
            Shape::new(ShapeKind::Chart, Some(Geometry { left: 0, top: 0, width: 1, height: 1 }), false),
        ]);
        let store = MemoryStore::new().with_doc("a.pptx", Behavior::Ok(vec![slide]));
        let saved = Rc::clone(&store.saved);
        let mut log = MemorySink::default();

        runner(store).run(&paths(&["a.pptx"]), &mut log);

        let saved = saved.borrow();
        let shapes = &saved[&PathBuf::from("a.pptx")][0].shapes;

        let pic_outline = shapes[0].outline.unwrap();
        assert_eq!(pic_outline.color, Rgb::BLACK);
        assert_eq!(pic_outline.weight_pt, 1.5);

        // Non-qualifying but capable shape still gets the border.
        assert_eq!(shapes[1].outline.unwrap().weight_pt, 1.5);

        // Charts have no outline capability.
        assert!(shapes[2].outline.is_none());
    }

    #[test]
    fn test_open_failure_does_not_abort_batch() {
        let store = MemoryStore::new()
            .with_doc("bad.pptx", Behavior::OpenFails)
            .with_doc("good.pptx", Behavior::Ok(vec![Slide::new(vec![picture(3.0, 2.8)])]));
        let saved = Rc::clone(&store.saved);
        let mut log = MemorySink::default();

        let summary = runner(store).run(&paths(&["bad.pptx", "good.pptx"]), &mut log);

        assert_eq!(summary.open_failures(), 1);
        assert_eq!(summary.saved(), 1);
        assert!(saved.borrow().contains_key(&PathBuf::from("good.pptx")));
        assert!(log.0.iter().any(|l| l.starts_with("Error opening bad.pptx")));
        assert_eq!(log.0.last().unwrap(), "All files processed.");
    }

    #[test]
    fn test_shape_failure_does_not_abort_siblings() {
        // Qualifying picture without a transform fails; its sibling must
        // still be processed, and the file still saved.
        let broken = Shape::new(ShapeKind::Picture, None, true);
        let slide = Slide::new(vec![broken, picture(1.0, 1.0)]);
        let store = MemoryStore::new().with_doc("a.pptx", Behavior::Ok(vec![slide]));
        let saved = Rc::clone(&store.saved);
        let mut log = MemorySink::default();

        let summary = runner(store).run(&paths(&["a.pptx"]), &mut log);

        assert_eq!(summary.shape_errors, 1);
        assert_eq!(summary.saved(), 1);
        assert!(log.0.iter().any(|l| l.starts_with("Error processing shape:")));

        let saved = saved.borrow();
        let shapes = &saved[&PathBuf::from("a.pptx")][0].shapes;
        // Multi-shape regime, no large placed: small picture scaled to origin.
        let geometry = shapes[1].geometry.unwrap();
        assert_eq!(geometry.width, 1_065_344);
        assert_eq!((geometry.left, geometry.top), (0, 0));
    }

    #[test]
    fn test_slot_flags_do_not_leak_across_slides() {
        // Two slides, each with a large and a small picture. The large slot
        // must be granted once per slide, not once per document.
        let make_slide = || Slide::new(vec![picture(3.0, 2.8), picture(1.0, 1.0)]);
        let store = MemoryStore::new()
            .with_doc("a.pptx", Behavior::Ok(vec![make_slide(), make_slide()]));
        let saved = Rc::clone(&store.saved);
        let mut log = MemorySink::default();

        runner(store).run(&paths(&["a.pptx"]), &mut log);

        let saved = saved.borrow();
        for slide in &saved[&PathBuf::from("a.pptx")] {
            let large = slide.shapes[0].geometry.unwrap();
            assert_eq!((large.left, large.top), (2_929_696, 1_809_248));
            let small = slide.shapes[1].geometry.unwrap();
            assert_eq!((small.left, small.top), (12_738_208, 1_800_064));
        }
    }

    #[test]
    fn test_locked_save_reported_with_retry_hint() {
        let store = MemoryStore::new().with_doc(
            "locked.pptx",
            Behavior::SaveLocked(vec![Slide::new(vec![picture(3.0, 2.8)])]),
        );
        let mut log = MemorySink::default();

        let summary = runner(store).run(&paths(&["locked.pptx"]), &mut log);

        assert_eq!(summary.save_failures(), 1);
        assert!(log.0.iter().any(|l| l.contains("Close it and retry")));
    }

    #[test]
    fn test_generic_save_failure_continues_batch() {
        let store = MemoryStore::new()
            .with_doc(
                "full.pptx",
                Behavior::SaveFails(vec![Slide::new(vec![picture(3.0, 2.8)])]),
            )
            .with_doc("ok.pptx", Behavior::Ok(vec![Slide::new(vec![picture(3.0, 2.8)])]));
        let mut log = MemorySink::default();

        let summary = runner(store).run(&paths(&["full.pptx", "ok.pptx"]), &mut log);

        assert_eq!(summary.save_failures(), 1);
        assert_eq!(summary.saved(), 1);
        assert!(log.0.iter().any(|l| l.starts_with("Error saving full.pptx")));
    }

    #[test]
    fn test_empty_batch_still_reports_completion() {
        let store = MemoryStore::new();
        let mut log = MemorySink::default();

        let summary = runner(store).run(&[], &mut log);

        assert!(summary.files.is_empty());
        assert_eq!(log.0, vec!["All files processed."]);
    }
}
