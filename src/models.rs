use imageproc::point::Point;
use serde::Serialize;

/// Outer boundary of one connected foreground region.
#[derive(Debug, Clone)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed area of the polygon traced by the points (shoelace formula)
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }

        let mut twice_area: i64 = 0;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
        }

        (twice_area as f64 / 2.0).abs()
    }
}

/// Minimal circle containing the coin contour, in integer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnclosingCircle {
    pub center_x: i32,
    pub center_y: i32,
    pub radius: i32,
}

impl EnclosingCircle {
    /// Truncates a floating-point circle toward zero, like an integer cast.
    pub fn from_f64(center_x: f64, center_y: f64, radius: f64) -> Self {
        Self {
            center_x: center_x as i32,
            center_y: center_y as i32,
            radius: radius as i32,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            x: self.center_x - self.radius,
            y: self.center_y - self.radius,
            width: 2 * self.radius,
            height: 2 * self.radius,
        }
    }
}

/// Square around the enclosing circle. Coordinates may lie outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Pixel region of a bounding box that lies inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x as i64 + self.width as i64 <= image_width as i64
            && self.y as i64 + self.height as i64 <= image_height as i64
    }

    /// Intersection with `[0, image_width) x [0, image_height)`, or `None` when empty
    pub fn clip_to(&self, image_width: u32, image_height: u32) -> Option<CropRegion> {
        let x0 = (self.x as i64).max(0);
        let y0 = (self.y as i64).max(0);
        let x1 = (self.x as i64 + self.width as i64).min(image_width as i64);
        let y1 = (self.y as i64 + self.height as i64).min(image_height as i64);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(CropRegion {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

/// Everything the locator learned about one photograph.
#[derive(Debug, Clone, Serialize)]
pub struct CoinLocation {
    pub otsu_level: u8,
    pub contour_area: f64,
    pub contour_points: usize,
    /// Contour area over enclosing circle area
    pub fill_ratio: f64,
    pub circle: EnclosingCircle,
}
