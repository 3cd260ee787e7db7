//! Uniform border styling.
//!
//! Applies a black outline of caller-chosen weight to every shape that
//! exposes the outline capability, independent of what the layout engine did
//! (or didn't do) to the shape's geometry.

use crate::types::{BorderWeight, Outline, Rgb, Shape};

/// Set the shape's outline to pure black at the given weight.
///
/// Shapes without the outline capability are left alone. Never touches
/// geometry. Returns whether an outline was applied.
pub fn apply(shape: &mut Shape, weight: BorderWeight) -> bool {
    match shape.outline.as_mut() {
        Some(outline) => {
            *outline = Outline {
                color: Rgb::BLACK,
                weight_pt: weight.points(),
            };
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Geometry, ShapeKind};

    #[test]
    fn test_apply_sets_black_at_requested_weight() {
        let mut shape = Shape::new(ShapeKind::Picture, None, true);
        let weight = BorderWeight::try_new(1.5).unwrap();

        assert!(apply(&mut shape, weight));
        let outline = shape.outline.unwrap();
        assert_eq!(outline.color, Rgb::BLACK);
        assert_eq!(outline.weight_pt, 1.5);
    }

    #[test]
    fn test_apply_skips_incapable_shapes() {
        let mut chart = Shape::new(ShapeKind::Chart, None, false);
        assert!(!apply(&mut chart, BorderWeight::default()));
        assert!(chart.outline.is_none());
    }

    #[test]
    fn test_apply_does_not_touch_geometry() {
        let geometry = Geometry {
            left: 10,
            top: 20,
            width: 30,
            height: 40,
        };
        let mut shape = Shape::new(ShapeKind::Other, Some(geometry), true);

        apply(&mut shape, BorderWeight::try_new(3.0).unwrap());
        assert_eq!(shape.geometry, Some(geometry));
    }

    #[test]
    fn test_apply_is_independent_of_kind() {
        for kind in [ShapeKind::Picture, ShapeKind::Chart, ShapeKind::Other] {
            let mut shape = Shape::new(kind, None, true);
            assert!(apply(&mut shape, BorderWeight::default()));
            assert_eq!(shape.outline.unwrap().weight_pt, BorderWeight::DEFAULT_PT);
        }
    }
}
