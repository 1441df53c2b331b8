//! Bounding box validation shared by the predicate parser and the map operation.

use std::fmt;
use thiserror::Error;

/// Why a bounding box was rejected. Checks run in declaration order, so a
/// malformed box always reports the same reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BboxError {
    #[error("Invalid bbox.")]
    Invalid,
    #[error("Left > Right.")]
    LeftGreaterThanRight,
    #[error("Bottom > Top.")]
    BottomGreaterThanTop,
    #[error("Bottom is out of range.")]
    BottomOutOfRange,
    #[error("Top is out of range.")]
    TopOutOfRange,
    #[error("Left is out of range.")]
    LeftOutOfRange,
    #[error("Right is out of range.")]
    RightOutOfRange,
}

/// Axis-aligned box in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl BBox {
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Result<Self, BboxError> {
        if ![left, bottom, right, top].iter().all(|v| v.is_finite()) {
            return Err(BboxError::Invalid);
        }
        if left > right {
            return Err(BboxError::LeftGreaterThanRight);
        }
        if bottom > top {
            return Err(BboxError::BottomGreaterThanTop);
        }
        if !(-90.0..=90.0).contains(&bottom) {
            return Err(BboxError::BottomOutOfRange);
        }
        if !(-90.0..=90.0).contains(&top) {
            return Err(BboxError::TopOutOfRange);
        }
        if !(-180.0..=180.0).contains(&left) {
            return Err(BboxError::LeftOutOfRange);
        }
        if !(-180.0..=180.0).contains(&right) {
            return Err(BboxError::RightOutOfRange);
        }
        Ok(Self {
            left,
            bottom,
            right,
            top,
        })
    }

    /// Parse `left,bottom,right,top`.
    pub fn parse(value: &str) -> Result<Self, BboxError> {
        let parts: Vec<f64> = value
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| BboxError::Invalid)?;
        match parts.as_slice() {
            [left, bottom, right, top] => BBox::new(*left, *bottom, *right, *top),
            _ => Err(BboxError::Invalid),
        }
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.left, self.bottom, self.right, self.top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_boxes() {
        for (l, b, r, t) in [
            (-180.0, -90.0, 180.0, 90.0),
            (0.0, 0.0, 0.0, 0.0),
            (-0.13, 51.50, -0.12, 51.51),
            (179.9, 89.9, 180.0, 90.0),
        ] {
            assert!(BBox::new(l, b, r, t).is_ok(), "{l},{b},{r},{t}");
        }
    }

    #[test]
    fn rejects_each_invariant_with_its_message() {
        let cases = [
            ("a,b,c,d", "Invalid bbox."),
            ("1,2,3", "Invalid bbox."),
            ("1,2,3,4,5", "Invalid bbox."),
            ("nan,0,1,1", "Invalid bbox."),
            ("2,0,1,1", "Left > Right."),
            ("0,2,1,1", "Bottom > Top."),
            ("0,-91,1,1", "Bottom is out of range."),
            ("0,0,1,91", "Top is out of range."),
            ("-181,0,1,1", "Left is out of range."),
            ("0,0,181,1", "Right is out of range."),
        ];
        for (input, message) in cases {
            let err = BBox::parse(input).unwrap_err();
            assert_eq!(err.to_string(), message, "input {input}");
        }
    }

    #[test]
    fn ordering_checks_win_over_range_checks() {
        // Both left > right and right out of range; ordering is reported first.
        assert_eq!(
            BBox::new(200.0, 0.0, 190.0, 1.0).unwrap_err(),
            BboxError::LeftGreaterThanRight
        );
        // Bottom and top both out of range; bottom is checked first.
        assert_eq!(
            BBox::new(0.0, -100.0, 1.0, 100.0).unwrap_err(),
            BboxError::BottomOutOfRange
        );
        // Bottom out of range beats left out of range.
        assert_eq!(
            BBox::new(-200.0, -100.0, 1.0, 1.0).unwrap_err(),
            BboxError::BottomOutOfRange
        );
    }

    #[test]
    fn parses_negative_coordinates() {
        let bbox = BBox::parse(" -0.2, 51.4,-0.1 ,51.6").unwrap();
        assert_eq!((bbox.left, bbox.top), (-0.2, 51.6));
        assert_eq!(BBox::parse("0,0,1,nan").unwrap_err(), BboxError::Invalid);
        assert_eq!(BBox::parse("0,0,1,1,2").unwrap_err(), BboxError::Invalid);
    }
}
