// THEORY:
// An `OverlaySurface` is the drawing layer that sits on top of a card's
// thumbnail: a transparent RGBA buffer exactly the size of the displayed image,
// positioned at the image origin, with the projected bounding box stroked on
// it. It is the thin adapter between `geometry::project_box` and pixels.
//
// Key properties:
// 1.  **Sized to the display**: the buffer covers the laid-out image area
//     (rounded up), never the natural image.
// 2.  **Clipped strokes**: boxes that run past the image edge are drawn only
//     where they intersect the surface.
// 3.  **Composable**: `composite` blends a surface onto an already-resized
//     thumbnail, which is how the CLI produces reviewable PNGs.

use image::{Rgba, RgbaImage};

use crate::core_modules::geometry::{Dimensions, DisplayRect};
use crate::error::ConfigError;

/// `#5eba7d`, the dashboard's detection green.
pub const DEFAULT_STROKE_COLOR: Rgba<u8> = Rgba([0x5e, 0xba, 0x7d, 0xff]);
pub const DEFAULT_LINE_WIDTH: u32 = 1;

/// Stroke color and line width used for every overlay in a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeStyle {
    pub color: Rgba<u8>,
    pub line_width: u32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_STROKE_COLOR,
            line_width: DEFAULT_LINE_WIDTH,
        }
    }
}

impl StrokeStyle {
    /// Parses `#rrggbb` (the leading `#` is optional) into an opaque color.
    pub fn parse_hex(value: &str) -> Result<Rgba<u8>, ConfigError> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ConfigError::InvalidColor(value.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ConfigError::InvalidColor(value.to_string()))
        };
        Ok(Rgba([channel(0..2)?, channel(2..4)?, channel(4..6)?, 0xff]))
    }
}

/// Integer pixel edges of a stroked rectangle, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl From<DisplayRect> for PixelRect {
    fn from(rect: DisplayRect) -> Self {
        Self {
            x0: rect.x.round() as i64,
            y0: rect.y.round() as i64,
            x1: rect.right().round() as i64,
            y1: rect.bottom().round() as i64,
        }
    }
}

/// A transparent layer the size of the displayed image with one stroked box.
#[derive(Debug, Clone)]
pub struct OverlaySurface {
    /// Offset of the surface relative to the image's top-left corner.
    pub origin: (f64, f64),
    /// The projected box, in displayed coordinates.
    pub rect: DisplayRect,
    pub style: StrokeStyle,
    pixels: RgbaImage,
}

impl OverlaySurface {
    /// Allocates a surface covering `displayed` and strokes `rect` on it.
    pub fn draw(displayed: Dimensions, rect: DisplayRect, style: StrokeStyle) -> Self {
        let width = displayed.width.ceil().max(1.0) as u32;
        let height = displayed.height.ceil().max(1.0) as u32;
        let mut pixels = RgbaImage::new(width, height);
        stroke_rect(&mut pixels, PixelRect::from(rect), style.color, style.line_width);
        Self {
            origin: (0.0, 0.0),
            rect,
            style,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Strokes the border of `rect` with the given thickness, growing inwards.
/// Pixels outside the image are skipped.
pub fn stroke_rect(img: &mut RgbaImage, rect: PixelRect, color: Rgba<u8>, thickness: u32) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let max_x = i64::from(w) - 1;
    let max_y = i64::from(h) - 1;
    let reach = i64::from(thickness);

    // Edges further out than the stroke can reach are invisible either way.
    let rect = PixelRect {
        x0: rect.x0.clamp(-reach, max_x + reach),
        y0: rect.y0.clamp(-reach, max_y + reach),
        x1: rect.x1.clamp(-reach, max_x + reach),
        y1: rect.y1.clamp(-reach, max_y + reach),
    };

    for t in 0..reach {
        let x0 = rect.x0.saturating_add(t);
        let y0 = rect.y0.saturating_add(t);
        let x1 = rect.x1.saturating_sub(t);
        let y1 = rect.y1.saturating_sub(t);
        if x0 > x1 || y0 > y1 {
            break;
        }

        for x in x0.max(0)..=x1.min(max_x) {
            put_clipped(img, x, y0, color);
            put_clipped(img, x, y1, color);
        }
        for y in y0.max(0)..=y1.min(max_y) {
            put_clipped(img, x0, y, color);
            put_clipped(img, x1, y, color);
        }
    }
}

fn put_clipped(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= i64::from(img.width()) || y >= i64::from(img.height()) {
        return;
    }
    img.put_pixel(x as u32, y as u32, color);
}

/// Blends `surface` over `base` at the surface origin.
pub fn composite(base: &mut RgbaImage, surface: &OverlaySurface) {
    let (x, y) = surface.origin;
    image::imageops::overlay(base, surface.pixels(), x.round() as i64, y.round() as i64);
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    #[test]
    fn surface_matches_displayed_size() {
        let surface = OverlaySurface::draw(
            Dimensions::new(400.0, 299.5),
            DisplayRect { x: 50.0, y: 50.0, width: 50.0, height: 50.0 },
            StrokeStyle::default(),
        );
        assert_eq!((surface.width(), surface.height()), (400, 300));
        assert_eq!(surface.origin, (0.0, 0.0));
    }

    #[test]
    fn strokes_corners_and_leaves_interior_clear() {
        let surface = OverlaySurface::draw(
            Dimensions::new(40.0, 40.0),
            DisplayRect { x: 5.0, y: 5.0, width: 5.0, height: 5.0 },
            StrokeStyle::default(),
        );
        let px = surface.pixels();
        for (x, y) in [(5, 5), (10, 5), (5, 10), (10, 10)] {
            assert_eq!(px.get_pixel(x, y), &DEFAULT_STROKE_COLOR);
        }
        assert_eq!(px.get_pixel(7, 7), &CLEAR);
        assert_eq!(px.get_pixel(4, 4), &CLEAR);
    }

    #[test]
    fn clips_box_past_the_edge() {
        let mut img = RgbaImage::new(10, 10);
        let red = Rgba([255, 0, 0, 255]);
        stroke_rect(&mut img, PixelRect { x0: -5, y0: 2, x1: 20, y1: 6 }, red, 1);
        assert_eq!(img.get_pixel(0, 2), &red);
        assert_eq!(img.get_pixel(9, 6), &red);
        // Left and right edges fall outside the image.
        assert_eq!(img.get_pixel(0, 4), &CLEAR);
        assert_eq!(img.get_pixel(9, 4), &CLEAR);
    }

    #[test]
    fn thicker_lines_grow_inwards() {
        let mut img = RgbaImage::new(20, 20);
        let red = Rgba([255, 0, 0, 255]);
        stroke_rect(&mut img, PixelRect { x0: 2, y0: 2, x1: 12, y1: 12 }, red, 2);
        assert_eq!(img.get_pixel(3, 3), &red);
        assert_eq!(img.get_pixel(1, 1), &CLEAR);
        assert_eq!(img.get_pixel(5, 5), &CLEAR);
    }

    #[test]
    fn saturated_edges_with_wide_stroke_stay_in_bounds() {
        let mut img = RgbaImage::new(10, 10);
        let red = Rgba([255, 0, 0, 255]);
        stroke_rect(&mut img, PixelRect { x0: i64::MIN, y0: 0, x1: i64::MAX, y1: 5 }, red, 2);
        for x in [0, 5, 9] {
            assert_eq!(img.get_pixel(x, 0), &red);
            assert_eq!(img.get_pixel(x, 1), &red);
            assert_eq!(img.get_pixel(x, 4), &red);
            assert_eq!(img.get_pixel(x, 5), &red);
        }
        assert_eq!(img.get_pixel(5, 3), &CLEAR);
        assert_eq!(img.get_pixel(5, 6), &CLEAR);

        let mut far = RgbaImage::new(10, 10);
        stroke_rect(&mut far, PixelRect { x0: i64::MAX, y0: 0, x1: i64::MAX, y1: 10 }, red, 3);
        assert!(far.pixels().all(|p| *p == CLEAR));
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(StrokeStyle::parse_hex("#5eba7d").unwrap(), DEFAULT_STROKE_COLOR);
        assert_eq!(StrokeStyle::parse_hex("ff0000").unwrap(), Rgba([255, 0, 0, 255]));
        assert!(StrokeStyle::parse_hex("#5eba7").is_err());
        assert!(StrokeStyle::parse_hex("#zzzzzz").is_err());
    }

    #[test]
    fn composite_paints_stroke_onto_thumbnail() {
        let mut base = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        let surface = OverlaySurface::draw(
            Dimensions::new(20.0, 20.0),
            DisplayRect { x: 2.0, y: 2.0, width: 6.0, height: 6.0 },
            StrokeStyle::default(),
        );
        composite(&mut base, &surface);
        assert_eq!(base.get_pixel(2, 2), &DEFAULT_STROKE_COLOR);
        assert_eq!(base.get_pixel(5, 5), &Rgba([0, 0, 0, 255]));
    }
}
