use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Circle with sub-pixel center and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleFit {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

impl CircleFit {
    fn point(p: (f64, f64)) -> Self {
        Self {
            center_x: p.0,
            center_y: p.1,
            radius: 0.0,
        }
    }

    fn contains(&self, p: (f64, f64)) -> bool {
        let dx = p.0 - self.center_x;
        let dy = p.1 - self.center_y;
        (dx * dx + dy * dy).sqrt() <= self.radius + 1e-7 * self.radius.max(1.0)
    }

    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }
}

// Fixed so the same contour always yields the same circle
const SHUFFLE_SEED: u64 = 0x636f_696e;

/// Smallest circle containing every point.
///
/// Only convex hull vertices can lie on that circle, so the incremental
/// (Welzl-style) construction runs over the hull in a shuffled order.
pub fn min_enclosing_circle(points: &[Point<i32>]) -> Option<CircleFit> {
    if points.is_empty() {
        return None;
    }

    let mut hull = if points.len() < 3 {
        points.to_vec()
    } else {
        convex_hull(points)
    };
    if hull.len() < 3 {
        // Degenerate (collinear or tiny) input; the full set is small anyway
        hull = points.to_vec();
    }
    let mut hull: Vec<(f64, f64)> = hull.into_iter().map(|p| (p.x as f64, p.y as f64)).collect();

    let mut rng = StdRng::seed_from_u64(SHUFFLE_SEED);
    hull.shuffle(&mut rng);

    let mut circle = CircleFit::point(hull[0]);
    for i in 1..hull.len() {
        if circle.contains(hull[i]) {
            continue;
        }
        circle = CircleFit::point(hull[i]);
        for j in 0..i {
            if circle.contains(hull[j]) {
                continue;
            }
            circle = circle_from_two(hull[i], hull[j]);
            for k in 0..j {
                if !circle.contains(hull[k]) {
                    circle = circle_from_three(hull[i], hull[j], hull[k]);
                }
            }
        }
    }

    Some(circle)
}

fn circle_from_two(a: (f64, f64), b: (f64, f64)) -> CircleFit {
    let center_x = (a.0 + b.0) / 2.0;
    let center_y = (a.1 + b.1) / 2.0;
    let radius = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt() / 2.0;
    CircleFit {
        center_x,
        center_y,
        radius,
    }
}

fn circle_from_three(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> CircleFit {
    let bx = b.0 - a.0;
    let by = b.1 - a.1;
    let cx = c.0 - a.0;
    let cy = c.1 - a.1;
    let d = 2.0 * (bx * cy - by * cx);

    if d.abs() < 1e-12 {
        // Collinear: the widest pair spans the other point
        return [circle_from_two(a, b), circle_from_two(a, c), circle_from_two(b, c)]
            .into_iter()
            .fold(CircleFit::point(a), |best, cand| {
                if cand.radius > best.radius { cand } else { best }
            });
    }

    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (cy * b2 - by * c2) / d;
    let uy = (bx * c2 - cx * b2) / d;

    CircleFit {
        center_x: ux + a.0,
        center_y: uy + a.1,
        radius: (ux * ux + uy * uy).sqrt(),
    }
}

/// Share of the circle's area covered by the contour (1.0 for a perfect disc)
pub fn fill_ratio(contour_area: f64, circle: &CircleFit) -> f64 {
    let area = circle.area();
    if area <= 0.0 {
        return 0.0;
    }
    contour_area / area
}
