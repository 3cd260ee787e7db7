//! Domain types for representing editable presentation content.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// English Metric Units, the native length unit of slide geometry.
pub type Emu = i64;

/// EMUs per inch as used by the layout template.
///
/// The OOXML standard defines 914400 EMU per inch; the slot coordinates in
/// [`crate::layout`] were tuned against 918400, so this value must not be
/// "corrected" without retuning every slot.
pub const EMU_PER_IN: Emu = 918_400;

/// EMUs per point (stroke widths are given in points).
pub const EMU_PER_PT: Emu = 12_700;

/// Convert a length in inches to EMU, truncating toward zero.
pub fn inches_to_emu(inches: f64) -> Emu {
    (inches * EMU_PER_IN as f64) as Emu
}

/// The kind of a shape, as far as the layout engine cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// A raster or vector picture.
    Picture,
    /// A chart hosted in a graphic frame.
    Chart,
    /// Anything else (text boxes, tables, connectors, groups, ...).
    Other,
}

impl ShapeKind {
    /// Whether this kind participates in the layout policy.
    pub fn qualifies(self) -> bool {
        matches!(self, Self::Picture | Self::Chart)
    }
}

/// Position and size of a shape on its slide, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub left: Emu,
    pub top: Emu,
    pub width: Emu,
    pub height: Emu,
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Hex form without leading `#`, as used in `a:srgbClr/@val`.
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Outline (border) style of a shape.
///
/// A shape carrying `Some(Outline)` exposes the outline capability; shapes
/// without one (charts, groups) cannot take a border.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub color: Rgb,
    pub weight_pt: f64,
}

impl Outline {
    /// Stroke width in EMU for the `a:ln/@w` attribute.
    pub fn weight_emu(&self) -> Emu {
        (self.weight_pt * EMU_PER_PT as f64) as Emu
    }
}

impl Default for Outline {
    fn default() -> Self {
        Self {
            color: Rgb::BLACK,
            weight_pt: 0.75,
        }
    }
}

/// A single shape on a slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    /// What the layout engine should treat this shape as.
    pub kind: ShapeKind,

    /// Current geometry. `None` when the source XML carries no transform
    /// (typically placeholders inheriting from the layout).
    pub geometry: Option<Geometry>,

    /// Outline capability with its current style, or `None` if the shape
    /// cannot take an outline.
    pub outline: Option<Outline>,
}

impl Shape {
    /// Create a shape with geometry and, for capable kinds, a default outline.
    pub fn new(kind: ShapeKind, geometry: Option<Geometry>, outline_capable: bool) -> Self {
        Self {
            kind,
            geometry,
            outline: outline_capable.then(Outline::default),
        }
    }
}

/// A single slide: an ordered sequence of shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Slide {
    pub shapes: Vec<Shape>,
}

impl Slide {
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }
}

/// Slide canvas dimensions, shared by every slide of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: Emu,
    pub height: Emu,
}

/// An open, editable presentation document.
///
/// Implementations own whatever backing representation they need (for PPTX,
/// the raw archive entries) and are responsible for writing mutations back on
/// [`Document::save`].
pub trait Document {
    /// Canvas dimensions of every slide.
    fn canvas(&self) -> Canvas;

    /// Slides in presentation order, mutable so the engine can edit geometry
    /// and outlines in place.
    fn slides_mut(&mut self) -> &mut [Slide];

    /// Persist the document back to the path it was opened from.
    fn save(&mut self) -> Result<()>;
}

/// Opens presentation documents from the filesystem.
pub trait DocumentStore {
    type Document: Document;

    fn open(&self, path: &Path) -> Result<Self::Document>;
}

/// Append-only sink for human-readable progress lines.
pub trait LogSink {
    fn append(&mut self, line: &str);
}

/// Log sink writing one line at a time to any [`std::io::Write`].
pub struct WriteSink<W: std::io::Write>(pub W);

impl<W: std::io::Write> LogSink for WriteSink<W> {
    fn append(&mut self, line: &str) {
        // A failing log sink must never abort the batch.
        let _ = writeln!(self.0, "{}", line);
    }
}

/// Log sink collecting lines in memory, for tests.
#[derive(Debug, Default)]
pub struct MemorySink(pub Vec<String>);

impl LogSink for MemorySink {
    fn append(&mut self, line: &str) {
        self.0.push(line.to_string());
    }
}

/// A validated border weight in points: finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorderWeight(f64);

impl BorderWeight {
    /// Default border weight in points.
    pub const DEFAULT_PT: f64 = 1.5;

    /// Validate a raw weight. Rejects NaN, infinities, and negative values.
    pub fn try_new(pt: f64) -> Result<Self> {
        if !pt.is_finite() {
            return Err(Error::InvalidWeight(format!("{} is not a finite number", pt)));
        }
        if pt < 0.0 {
            return Err(Error::InvalidWeight(format!("{} is negative", pt)));
        }
        Ok(Self(pt))
    }

    /// Parse and validate from user input.
    pub fn parse(input: &str) -> Result<Self> {
        let pt: f64 = input
            .trim()
            .parse()
            .map_err(|_| Error::InvalidWeight(format!("'{}' is not a number", input)))?;
        Self::try_new(pt)
    }

    pub fn points(self) -> f64 {
        self.0
    }
}

impl Default for BorderWeight {
    fn default() -> Self {
        Self(Self::DEFAULT_PT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inches_to_emu_uses_template_constant() {
        assert_eq!(inches_to_emu(1.0), 918_400);
        assert_eq!(inches_to_emu(10.5), 9_643_200);
        assert_eq!(inches_to_emu(0.0), 0);
    }

    #[test]
    fn test_outline_weight_emu() {
        let outline = Outline {
            color: Rgb::BLACK,
            weight_pt: 1.5,
        };
        assert_eq!(outline.weight_emu(), 19_050);
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Rgb::BLACK.to_hex(), "000000");
        assert_eq!(Rgb(255, 128, 0).to_hex(), "FF8000");
    }

    #[test]
    fn test_border_weight_accepts_valid() {
        assert_eq!(BorderWeight::try_new(1.5).unwrap().points(), 1.5);
        assert_eq!(BorderWeight::try_new(0.0).unwrap().points(), 0.0);
        assert_eq!(BorderWeight::parse(" 2.25 ").unwrap().points(), 2.25);
    }

    #[test]
    fn test_border_weight_rejects_invalid() {
        assert!(BorderWeight::try_new(f64::NAN).is_err());
        assert!(BorderWeight::try_new(f64::INFINITY).is_err());
        assert!(BorderWeight::try_new(-0.5).is_err());
        assert!(BorderWeight::parse("abc").is_err());
        assert!(BorderWeight::parse("").is_err());
    }

    #[test]
    fn test_shape_outline_capability() {
        let pic = Shape::new(ShapeKind::Picture, None, true);
        assert!(pic.outline.is_some());

        let chart = Shape::new(ShapeKind::Chart, None, false);
        assert!(chart.outline.is_none());
    }
}
