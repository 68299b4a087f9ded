use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;

use crate::models::Contour;

/// Find the outer borders of the top-level foreground regions of a binary mask.
///
/// Hole borders and regions nested inside holes are dropped. Each border is
/// returned in compressed form (see [`compress_chain`]), in raster scan order.
pub fn find_external_contours(mask: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Contour::new(compress_chain(&c.points)))
        .collect()
}

/// Drop every point that continues the step direction of its predecessor, so
/// straight horizontal, vertical and diagonal runs keep only their end points.
pub fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let step = |a: Point<i32>, b: Point<i32>| ((b.x - a.x).signum(), (b.y - a.y).signum());

    let compressed: Vec<Point<i32>> = points
        .iter()
        .enumerate()
        .filter(|&(i, &p)| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, p) != step(p, next)
        })
        .map(|(_, &p)| p)
        .collect();

    if compressed.is_empty() {
        points.to_vec()
    } else {
        compressed
    }
}

/// Contour with the largest enclosed area; the earliest one wins ties
pub fn largest_contour(contours: &[Contour]) -> Option<&Contour> {
    let mut best: Option<(&Contour, f64)> = None;
    for contour in contours {
        let area = contour.area();
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((contour, area)),
        }
    }
    best.map(|(c, _)| c)
}
