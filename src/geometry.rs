//! Plane geometry for fixation points
//!
//! Provides the smallest enclosing circle of a point set using the incremental
//! (Welzl-style) construction. Points are processed in the given order without
//! shuffling, so the result is deterministic for a fixed input order.

use serde::{Deserialize, Serialize};

/// Relative tolerance when testing whether a point lies inside a circle
const MULTIPLICATIVE_EPSILON: f64 = 1.0 + 1e-14;

/// A point in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A circle given by center and radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Circle {
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.center().distance(point) <= self.radius * MULTIPLICATIVE_EPSILON
    }

    /// Round center and radius to `decimals` places, halves to even.
    pub fn rounded(&self, decimals: i32) -> Circle {
        let factor = 10_f64.powi(decimals);
        let round = |value: f64| (value * factor).round_ties_even() / factor;
        Circle {
            x: round(self.x),
            y: round(self.y),
            radius: round(self.radius),
        }
    }
}

/// Smallest circle containing every point, or `None` for an empty set.
pub fn minimal_enclosing_circle(points: &[Point]) -> Option<Circle> {
    let mut circle: Option<Circle> = None;
    for (i, p) in points.iter().enumerate() {
        if circle.map_or(true, |c| !c.contains(p)) {
            circle = Some(circle_with_one_point(&points[..=i], *p));
        }
    }
    circle
}

/// One boundary point known
fn circle_with_one_point(points: &[Point], p: Point) -> Circle {
    let mut circle = Circle {
        x: p.x,
        y: p.y,
        radius: 0.0,
    };
    for (i, q) in points.iter().enumerate() {
        if !circle.contains(q) {
            circle = if circle.radius == 0.0 {
                diameter_circle(p, *q)
            } else {
                circle_with_two_points(&points[..=i], p, *q)
            };
        }
    }
    circle
}

/// Two boundary points known
fn circle_with_two_points(points: &[Point], p: Point, q: Point) -> Circle {
    let circle = diameter_circle(p, q);
    let mut left: Option<Circle> = None;
    let mut right: Option<Circle> = None;

    // Grow the circle towards the side holding the outlying point
    for r in points {
        if circle.contains(r) {
            continue;
        }
        let cross = cross_product(p, q, *r);
        let Some(candidate) = circumcircle(p, q, *r) else {
            continue;
        };
        let candidate_cross = cross_product(p, q, candidate.center());
        if cross > 0.0
            && left.map_or(true, |l| candidate_cross > cross_product(p, q, l.center()))
        {
            left = Some(candidate);
        } else if cross < 0.0
            && right.map_or(true, |r| candidate_cross < cross_product(p, q, r.center()))
        {
            right = Some(candidate);
        }
    }

    match (left, right) {
        (None, None) => circle,
        (None, Some(r)) => r,
        (Some(l), None) => l,
        (Some(l), Some(r)) => {
            if l.radius <= r.radius {
                l
            } else {
                r
            }
        }
    }
}

fn diameter_circle(a: Point, b: Point) -> Circle {
    let center = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    Circle {
        x: center.x,
        y: center.y,
        radius: center.distance(&a).max(center.distance(&b)),
    }
}

fn circumcircle(a: Point, b: Point, c: Point) -> Option<Circle> {
    // Work relative to the bounding-box center for numerical stability
    let ox = (a.x.min(b.x).min(c.x) + a.x.max(b.x).max(c.x)) / 2.0;
    let oy = (a.y.min(b.y).min(c.y) + a.y.max(b.y).max(c.y)) / 2.0;
    let (ax, ay) = (a.x - ox, a.y - oy);
    let (bx, by) = (b.x - ox, b.y - oy);
    let (cx, cy) = (c.x - ox, c.y - oy);

    let d = (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by)) * 2.0;
    if d == 0.0 {
        return None;
    }

    let a_sq = ax * ax + ay * ay;
    let b_sq = bx * bx + by * by;
    let c_sq = cx * cx + cy * cy;
    let center = Point::new(
        ox + (a_sq * (by - cy) + b_sq * (cy - ay) + c_sq * (ay - by)) / d,
        oy + (a_sq * (cx - bx) + b_sq * (ax - cx) + c_sq * (bx - ax)) / d,
    );
    let radius = center
        .distance(&a)
        .max(center.distance(&b))
        .max(center.distance(&c));

    Some(Circle {
        x: center.x,
        y: center.y,
        radius,
    })
}

/// Twice the signed area of triangle (a, b, c)
fn cross_product(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_circle(actual: Circle, x: f64, y: f64, radius: f64) {
        assert!((actual.x - x).abs() < 1e-9, "x: {actual:?}");
        assert!((actual.y - y).abs() < 1e-9, "y: {actual:?}");
        assert!((actual.radius - radius).abs() < 1e-9, "radius: {actual:?}");
    }

    #[test]
    fn test_empty() {
        assert!(minimal_enclosing_circle(&[]).is_none());
    }

    #[test]
    fn test_single_point() {
        let circle = minimal_enclosing_circle(&[Point::new(3.0, 4.0)]).unwrap();
        assert_circle(circle, 3.0, 4.0, 0.0);
    }

    #[test]
    fn test_two_points() {
        let circle =
            minimal_enclosing_circle(&[Point::new(0.0, 0.0), Point::new(10.0, 0.0)]).unwrap();
        assert_circle(circle, 5.0, 0.0, 5.0);
    }

    #[test]
    fn test_interior_point_does_not_grow_circle() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(5.0, 1.0),
        ];
        let circle = minimal_enclosing_circle(&points).unwrap();
        assert_circle(circle, 5.0, 0.0, 5.0);
    }

    #[test]
    fn test_right_triangle_uses_hypotenuse() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 3.0),
        ];
        let circle = minimal_enclosing_circle(&points).unwrap();
        assert_circle(circle, 2.0, 1.5, 2.5);
    }

    #[test]
    fn test_equilateral_triangle_uses_circumcircle() {
        let h = 3.0_f64.sqrt();
        let points = [
            Point::new(-1.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, h),
        ];
        let circle = minimal_enclosing_circle(&points).unwrap();
        assert_circle(circle, 0.0, h / 3.0, 2.0 / h);
    }

    #[test]
    fn test_not_the_bounding_box() {
        // Square corners: the bounding box center matches, but the radius is
        // half the diagonal rather than half the side.
        let points = [
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ];
        let circle = minimal_enclosing_circle(&points).unwrap();
        assert_circle(circle, 1.0, 1.0, 2.0_f64.sqrt());
    }

    #[test]
    fn test_contains_all_points() {
        let points: Vec<Point> = (0..25)
            .map(|i| {
                let t = i as f64;
                Point::new((t * 1.7).sin() * 40.0 + t, (t * 0.9).cos() * 25.0 - t)
            })
            .collect();
        let circle = minimal_enclosing_circle(&points).unwrap();
        assert!(points.iter().all(|p| circle.contains(p)));
    }

    #[test]
    fn test_deterministic() {
        let points = [
            Point::new(1.0, 7.0),
            Point::new(-3.0, 2.5),
            Point::new(4.2, -1.0),
            Point::new(0.0, 0.0),
        ];
        assert_eq!(
            minimal_enclosing_circle(&points),
            minimal_enclosing_circle(&points)
        );
    }

    #[test]
    fn test_rounded() {
        let circle = Circle {
            x: 1.23456,
            y: 2.0049,
            radius: 0.125001,
        };
        assert_eq!(
            circle.rounded(2),
            Circle {
                x: 1.23,
                y: 2.0,
                radius: 0.13,
            }
        );
    }

    #[test]
    fn test_rounded_halves_to_even() {
        let circle = Circle {
            x: 0.125,
            y: 0.375,
            radius: 2.5,
        };
        assert_eq!(
            circle.rounded(2),
            Circle {
                x: 0.12,
                y: 0.38,
                radius: 2.5,
            }
        );
        assert_eq!(circle.rounded(0).radius, 2.0);
    }
}
