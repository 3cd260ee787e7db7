//! Slide shape layout engine.
//!
//! Classifies the pictures and charts on a slide, then recomputes each one's
//! size and position according to a fixed set of rules tuned for a specific
//! presentation template. The rules branch on how many qualifying shapes the
//! slide holds and, in the multi-shape case, on the shape's kind and original
//! size. Geometry is not a solver: every target size and slot coordinate is a
//! hand-tuned constant.

use crate::types::{inches_to_emu, Canvas, Emu, Geometry, ShapeKind, Slide};

/// Hand-tuned layout constants, in inches.
///
/// Converted through [`crate::types::EMU_PER_IN`] at use sites. Keep the
/// ratios exactly as they are; downstream decks were laid out against them.
pub mod slots {
    /// Standard size for the lone shape on a single-shape slide.
    pub const SINGLE_WIDTH_IN: f64 = 10.5;
    pub const SINGLE_HEIGHT_IN: f64 = 6.0;

    /// A picture is "large" when both dimensions meet these minima.
    pub const LARGE_MIN_WIDTH_IN: f64 = 2.74;
    pub const LARGE_MIN_HEIGHT_IN: f64 = 2.45;

    /// Scale factors applied to a large picture's original size.
    pub const LARGE_SCALE_WIDTH: f64 = 2.06;
    pub const LARGE_SCALE_HEIGHT: f64 = 2.04;

    /// Scale factor applied to a small picture's original size (both axes).
    pub const SMALL_SCALE: f64 = 1.16;

    /// Slot for the first large picture on a slide.
    pub const LARGE_SLOT_LEFT_IN: f64 = 3.19;
    pub const LARGE_SLOT_TOP_IN: f64 = 1.97;

    /// Slot for a small picture once a large one has been placed.
    pub const SMALL_SLOT_LEFT_IN: f64 = 13.87;
    pub const SMALL_SLOT_TOP_IN: f64 = 1.96;

    /// Slot and fixed size for the first chart on a slide.
    pub const CHART_SLOT_LEFT_IN: f64 = 2.4;
    pub const CHART_SLOT_TOP_IN: f64 = 2.45;
    pub const CHART_WIDTH_IN: f64 = 10.73;
    pub const CHART_HEIGHT_IN: f64 = 7.08;
}

/// Indices of the shapes on a slide that the layout policy applies to
/// (pictures and charts), in slide order.
///
/// Computed once per slide, before any shape is mutated, so that resizing one
/// shape can never change how later shapes on the same slide are classified.
pub fn qualifying(slide: &Slide) -> Vec<usize> {
    slide
        .shapes
        .iter()
        .enumerate()
        .filter(|(_, s)| s.kind.qualifies())
        .map(|(i, _)| i)
        .collect()
}

/// Per-slide layout state threaded through shape processing.
///
/// Built fresh for every slide; nothing leaks across slides. The two flags
/// gate the designated slots: only the first large picture and the first
/// chart on a slide get moved into theirs.
#[derive(Debug, Clone, Copy)]
pub struct SlideContext {
    /// Number of qualifying shapes on the slide, fixed before any mutation.
    pub total_shapes: usize,
    /// A large picture has already been moved into the large slot.
    pub large_placed: bool,
    /// A chart has already been moved into the chart slot.
    pub chart_placed: bool,
}

impl SlideContext {
    pub fn new(total_shapes: usize) -> Self {
        Self {
            total_shapes,
            large_placed: false,
            chart_placed: false,
        }
    }
}

/// Decide the new geometry for one qualifying shape.
///
/// Returns `None` when the policy leaves the shape untouched (currently only
/// a second chart on the same slide). Pure apart from updating the slot flags
/// in `ctx`.
pub fn plan(
    kind: ShapeKind,
    original: Geometry,
    canvas: Canvas,
    ctx: &mut SlideContext,
) -> Option<Geometry> {
    if ctx.total_shapes == 1 {
        return Some(plan_single(canvas));
    }

    match kind {
        ShapeKind::Picture => Some(plan_picture(original, ctx)),
        ShapeKind::Chart => plan_chart(original, ctx),
        ShapeKind::Other => None,
    }
}

/// Single-shape regime: fixed standard size, centered on the canvas.
/// Kind is irrelevant here.
fn plan_single(canvas: Canvas) -> Geometry {
    let width = inches_to_emu(slots::SINGLE_WIDTH_IN);
    let height = inches_to_emu(slots::SINGLE_HEIGHT_IN);
    Geometry {
        left: (canvas.width - width) / 2,
        top: (canvas.height - height) / 2,
        width,
        height,
    }
}

/// Multi-shape regime for pictures: large pictures get the large slot (first
/// one only) and the large scale factors; small pictures get the small scale
/// and either the small slot or the origin, depending on whether a large
/// picture was already placed.
fn plan_picture(original: Geometry, ctx: &mut SlideContext) -> Geometry {
    let is_large = original.width >= inches_to_emu(slots::LARGE_MIN_WIDTH_IN)
        && original.height >= inches_to_emu(slots::LARGE_MIN_HEIGHT_IN);

    if is_large {
        let (left, top) = if ctx.large_placed {
            // Later large pictures are rescaled but stay where they are.
            (original.left, original.top)
        } else {
            ctx.large_placed = true;
            (
                inches_to_emu(slots::LARGE_SLOT_LEFT_IN),
                inches_to_emu(slots::LARGE_SLOT_TOP_IN),
            )
        };
        Geometry {
            left,
            top,
            width: scale(original.width, slots::LARGE_SCALE_WIDTH),
            height: scale(original.height, slots::LARGE_SCALE_HEIGHT),
        }
    } else {
        let (left, top) = if ctx.large_placed {
            (
                inches_to_emu(slots::SMALL_SLOT_LEFT_IN),
                inches_to_emu(slots::SMALL_SLOT_TOP_IN),
            )
        } else {
            (0, 0)
        };
        Geometry {
            left,
            top,
            width: scale(original.width, slots::SMALL_SCALE),
            height: scale(original.height, slots::SMALL_SCALE),
        }
    }
}

/// Multi-shape regime for charts: the first chart on a slide gets a fixed
/// size and the chart slot; later charts are left entirely alone.
fn plan_chart(_original: Geometry, ctx: &mut SlideContext) -> Option<Geometry> {
    if ctx.chart_placed {
        return None;
    }
    ctx.chart_placed = true;
    Some(Geometry {
        left: inches_to_emu(slots::CHART_SLOT_LEFT_IN),
        top: inches_to_emu(slots::CHART_SLOT_TOP_IN),
        width: inches_to_emu(slots::CHART_WIDTH_IN),
        height: inches_to_emu(slots::CHART_HEIGHT_IN),
    })
}

/// Scale an EMU length by a factor, truncating toward zero.
fn scale(value: Emu, factor: f64) -> Emu {
    (value as f64 * factor) as Emu
}
