//! Header region geometry and the region-text capability the engine consumes.

use crate::error::PageFilterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed rectangle where header-identifying text is expected on every page.
///
/// Coordinates are PDF points with a top-left origin: `y` is measured
/// downward from the top edge of the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeaderRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for HeaderRegion {
    /// Top-left strip holding the work-address field of the payslip layout
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 130.0,
            width: 320.0,
            height: 23.0,
        }
    }
}

impl HeaderRegion {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Result<Self, PageFilterError> {
        let region = Self {
            x,
            y,
            width,
            height,
        };
        region.validate()?;
        Ok(region)
    }

    pub fn validate(&self) -> Result<(), PageFilterError> {
        if ![self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(PageFilterError::InvalidRegion(
                "Coordinates must be finite numbers".into(),
            ));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(PageFilterError::InvalidRegion(format!(
                "Width and height must be positive (got {}x{})",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Whether a point in display coordinates (top-left origin, see
    /// [`PageFrame::to_display`]) lies inside the region.
    pub fn contains_display(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// Whether a point in PDF space lies inside the region of a page.
    pub fn contains(&self, frame: &PageFrame, x: f32, y: f32) -> bool {
        let (x, y) = frame.to_display(x, y);
        self.contains_display(x, y)
    }
}

/// Visible area of a page and its `/Rotate`, as a viewer shows it.
///
/// Region coordinates are measured from the top-left corner of the crop box
/// after rotation is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    /// `[llx, lly, urx, ury]`, normalised so that ll < ur
    bounds: [f32; 4],
    /// Clockwise rotation in degrees: 0, 90, 180 or 270
    rotation: u16,
}

impl Default for PageFrame {
    /// Unrotated US Letter
    fn default() -> Self {
        Self::new([0.0, 0.0, 612.0, 792.0], 0)
    }
}

impl PageFrame {
    pub fn new(bounds: [f32; 4], rotate: i64) -> Self {
        let [x1, y1, x2, y2] = bounds;
        Self {
            bounds: [x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)],
            rotation: (rotate.rem_euclid(360) / 90 * 90) as u16,
        }
    }

    pub fn bounds(&self) -> [f32; 4] {
        self.bounds
    }

    pub fn rotation(&self) -> u16 {
        self.rotation
    }

    /// Map a point in PDF space to display coordinates: origin at the
    /// top-left of the rotated crop box, y growing downward.
    pub fn to_display(&self, x: f32, y: f32) -> (f32, f32) {
        let [llx, lly, urx, ury] = self.bounds;
        let (width, height) = (urx - llx, ury - lly);
        let (dx, dy) = (x - llx, y - lly);

        match self.rotation {
            90 => (dy, dx),
            180 => (width - dx, dy),
            270 => (height - dy, width - dx),
            _ => (dx, height - dy),
        }
    }
}

impl fmt::Display for HeaderRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for HeaderRegion {
    type Err = PageFilterError;

    /// Parse `"x,y,width,height"`
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let values = input
            .split(',')
            .map(|part| {
                part.trim().parse::<f32>().map_err(|_| {
                    PageFilterError::InvalidRegion(format!("Invalid number: {}", part.trim()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        match values.as_slice() {
            [x, y, width, height] => Self::new(*x, *y, *width, *height),
            _ => Err(PageFilterError::InvalidRegion(format!(
                "Expected x,y,width,height but got {} value(s)",
                values.len()
            ))),
        }
    }
}

/// Source of header-region text, one page at a time.
///
/// Implementations must answer for every index below `page_count()`; a page
/// whose text cannot be read fails with `ExtractionError`.
pub trait RegionTextSource {
    fn page_count(&self) -> usize;

    fn extract(&self, page: usize) -> Result<String, PageFilterError>;
}

/// Pre-extracted region texts, indexed by page
impl<T: AsRef<str>> RegionTextSource for [T] {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn extract(&self, page: usize) -> Result<String, PageFilterError> {
        self.get(page)
            .map(|text| text.as_ref().to_string())
            .ok_or_else(|| PageFilterError::extraction(page, "page index out of range"))
    }
}
