// THEORY:
// The `geometry` module holds the one piece of real math in the overlay: mapping
// a bounding box stored in natural-image pixel space onto an image element that
// the page has resized. It is pure: no I/O, no pixels, no async. Everything
// that draws calls `project_box` and trusts its output.
//
// Scaling is per axis. Responsive layouts resize width and height
// independently, so a single uniform factor is not enough.

use serde::{Deserialize, Serialize};

use crate::error::NotReady;

/// Largest displayed side an overlay surface is allocated for. Anything
/// bigger is treated as a layout that has not settled.
pub const MAX_DISPLAYED_SIDE: f64 = 16_384.0;

/// A width/height pair. Used for both natural (intrinsic) and displayed
/// (laid-out) image sizes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when both sides are finite and strictly positive, i.e. usable as a
    /// scale denominator.
    pub fn is_resolved(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(f64::from(width), f64::from(height))
    }
}

/// A rectangle in natural-image pixel coordinates, as stored in a card's
/// `BBox` field. Coordinates are kept in the order they were written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, right, bottom }
    }

    /// Returns the same region with `left <= right` and `top <= bottom`.
    pub fn normalized(&self) -> Self {
        Self {
            left: self.left.min(self.right),
            top: self.top.min(self.bottom),
            right: self.left.max(self.right),
            bottom: self.top.max(self.bottom),
        }
    }
}

/// Per-axis ratio between displayed and natural size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactor {
    /// Derives `displayed / natural` for each axis. Fails when either size is
    /// unresolved, so a zero or NaN ratio can never reach the drawing code, and
    /// when a displayed side exceeds `MAX_DISPLAYED_SIDE`.
    pub fn between(natural: Dimensions, displayed: Dimensions) -> Result<Self, NotReady> {
        if !natural.is_resolved() || !displayed.is_resolved() {
            return Err(NotReady);
        }
        if displayed.width > MAX_DISPLAYED_SIDE || displayed.height > MAX_DISPLAYED_SIDE {
            return Err(NotReady);
        }
        Ok(Self {
            x: displayed.width / natural.width,
            y: displayed.height / natural.height,
        })
    }
}

/// A rectangle in displayed coordinates, anchored at its top-left corner.
/// `width` and `height` are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayRect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Maps `bbox` from natural-image space onto an element displayed at
/// `displayed`. Inverted boxes are normalized first.
pub fn project_box(
    natural: Dimensions,
    displayed: Dimensions,
    bbox: BoundingBox,
) -> Result<DisplayRect, NotReady> {
    let scale = ScaleFactor::between(natural, displayed)?;
    let ordered = bbox.normalized();

    let left = ordered.left * scale.x;
    let top = ordered.top * scale.y;
    let right = ordered.right * scale.x;
    let bottom = ordered.bottom * scale.y;

    Ok(DisplayRect {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_a_box_on_a_half_size_thumbnail() {
        let rect = project_box(
            Dimensions::new(800.0, 600.0),
            Dimensions::new(400.0, 300.0),
            BoundingBox::new(100.0, 100.0, 200.0, 200.0),
        )
        .unwrap();
        assert_eq!(rect, DisplayRect { x: 50.0, y: 50.0, width: 50.0, height: 50.0 });
    }

    #[test]
    fn scales_axes_independently() {
        let rect = project_box(
            Dimensions::new(1000.0, 500.0),
            Dimensions::new(250.0, 500.0),
            BoundingBox::new(100.0, 100.0, 300.0, 200.0),
        )
        .unwrap();
        assert_eq!(rect, DisplayRect { x: 25.0, y: 100.0, width: 50.0, height: 100.0 });
    }

    #[test]
    fn inverted_box_is_normalized() {
        let rect = project_box(
            Dimensions::new(800.0, 600.0),
            Dimensions::new(400.0, 300.0),
            BoundingBox::new(200.0, 200.0, 100.0, 100.0),
        )
        .unwrap();
        assert_eq!(rect, DisplayRect { x: 50.0, y: 50.0, width: 50.0, height: 50.0 });
    }

    #[test]
    fn unresolved_natural_size_is_not_ready() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let shown = Dimensions::new(100.0, 100.0);
        assert_eq!(project_box(Dimensions::default(), shown, bbox), Err(NotReady));
        assert_eq!(project_box(Dimensions::new(f64::NAN, 10.0), shown, bbox), Err(NotReady));
        assert_eq!(project_box(Dimensions::new(10.0, 0.0), shown, bbox), Err(NotReady));
    }

    #[test]
    fn unlaid_out_element_is_not_ready() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(
            project_box(Dimensions::new(100.0, 100.0), Dimensions::new(0.0, 50.0), bbox),
            Err(NotReady)
        );
    }

    #[test]
    fn oversized_display_is_not_ready() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let natural = Dimensions::new(100.0, 100.0);
        assert_eq!(project_box(natural, Dimensions::new(1e6, 1e6), bbox), Err(NotReady));
        assert!(project_box(natural, Dimensions::new(MAX_DISPLAYED_SIDE, 10.0), bbox).is_ok());
    }
}
