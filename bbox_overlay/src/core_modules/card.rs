// THEORY:
// A `CardElement` is the data-side mirror of one rendered card on the dataset
// page: a list of labelled text fields (`<p data-heading=...>`) and one image
// element. It is a "dumb" container. It knows how to find its own fields and
// how to hold exactly one overlay, but nothing about probing or scaling.
//
// Cards are deserialized from a JSON manifest with the same shape the page
// exposes, so the overlay pass can run with or without a browser.

use serde::{Deserialize, Serialize};

use crate::core_modules::geometry::Dimensions;
use crate::core_modules::overlay_surface::OverlaySurface;

/// Heading of the field holding `left,top,right,bottom`.
pub const BBOX_HEADING: &str = "BBox";

/// One `<p data-heading=...>` field of a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardField {
    pub heading: String,
    pub text: String,
}

/// The card's `<img>`: its `src` and the size the page laid it out at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    pub src: String,
    /// Rendered size after CSS. `None` means the element is shown at its
    /// natural size.
    #[serde(default)]
    pub displayed: Option<Dimensions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardElement {
    pub id: String,
    #[serde(default)]
    pub fields: Vec<CardField>,
    #[serde(default)]
    pub image: Option<ImageElement>,
    #[serde(skip)]
    overlay: Option<OverlaySurface>,
}

impl CardElement {
    pub fn new(id: impl Into<String>, image: Option<ImageElement>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
            image,
            overlay: None,
        }
    }

    /// Builder-style helper for adding a field.
    pub fn with_field(mut self, heading: impl Into<String>, text: impl Into<String>) -> Self {
        self.fields.push(CardField {
            heading: heading.into(),
            text: text.into(),
        });
        self
    }

    /// Text of the first field with this heading.
    pub fn field(&self, heading: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.heading == heading)
            .map(|f| f.text.as_str())
    }

    pub fn bbox_text(&self) -> Option<&str> {
        self.field(BBOX_HEADING)
    }

    pub fn overlay(&self) -> Option<&OverlaySurface> {
        self.overlay.as_ref()
    }

    /// Attaches `surface`, replacing any overlay from an earlier pass.
    pub fn set_overlay(&mut self, surface: OverlaySurface) {
        self.overlay = Some(surface);
    }

    pub fn clear_overlay(&mut self) -> Option<OverlaySurface> {
        self.overlay.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::geometry::DisplayRect;
    use crate::core_modules::overlay_surface::StrokeStyle;

    #[test]
    fn deserializes_manifest_card() {
        let json = r#"{
            "id": "img-1222517",
            "fields": [
                {"heading": "File", "text": "/system/images/1.jpg"},
                {"heading": "BBox", "text": "10,20,30,40"}
            ],
            "image": {"src": "/system/images/1.jpg", "displayed": {"width": 400, "height": 300}}
        }"#;
        let card: CardElement = serde_json::from_str(json).unwrap();
        assert_eq!(card.bbox_text(), Some("10,20,30,40"));
        assert_eq!(card.field("File"), Some("/system/images/1.jpg"));
        let image = card.image.as_ref().unwrap();
        assert_eq!(image.displayed, Some(Dimensions::new(400.0, 300.0)));
        assert!(card.overlay().is_none());
    }

    #[test]
    fn overlay_slot_holds_one_surface() {
        let mut card = CardElement::new("a", None);
        let rect = DisplayRect { x: 0.0, y: 0.0, width: 1.0, height: 1.0 };
        card.set_overlay(OverlaySurface::draw(Dimensions::new(4.0, 4.0), rect, StrokeStyle::default()));
        card.set_overlay(OverlaySurface::draw(Dimensions::new(8.0, 8.0), rect, StrokeStyle::default()));
        assert_eq!(card.overlay().map(|o| o.width()), Some(8));
        assert!(card.clear_overlay().is_some());
        assert!(card.overlay().is_none());
    }
}
