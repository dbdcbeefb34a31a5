// Reads the plain-text `BBox` field of a card: `left,top,right,bottom`.

use std::str::FromStr;

use crate::core_modules::geometry::BoundingBox;
use crate::error::ParseError;

const COORDINATES: usize = 4;

/// Parses the first four comma-separated coordinates. Anything after the
/// fourth token is ignored; whitespace around tokens is allowed.
pub fn parse_bbox(text: &str) -> Result<BoundingBox, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::TooFewFields { found: 0 });
    }

    let tokens: Vec<&str> = trimmed.split(',').collect();
    if tokens.len() < COORDINATES {
        return Err(ParseError::TooFewFields { found: tokens.len() });
    }

    let mut coords = [0.0_f64; COORDINATES];
    for (index, token) in tokens.iter().take(COORDINATES).enumerate() {
        let token = token.trim();
        let value: f64 = token.parse().map_err(|_| ParseError::NotNumeric {
            index,
            token: token.to_string(),
        })?;
        if !value.is_finite() {
            return Err(ParseError::NotFinite { index });
        }
        coords[index] = value;
    }

    let [left, top, right, bottom] = coords;
    Ok(BoundingBox::new(left, top, right, bottom))
}

impl FromStr for BoundingBox {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_bbox(s)
    }
}
