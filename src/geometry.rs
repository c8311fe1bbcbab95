//! # Geometry
//!
//! Rectangles, 2D affine transforms and convex polygon clipping.
//!
//! Overflow detection happens after transforms are applied, so a rotated
//! box is no longer a rectangle. Every mark is carried as a convex polygon
//! (a transformed rectangle is a parallelogram) and clipped against other
//! convex regions with Sutherland–Hodgman. Convex in, convex out, so the
//! whole pipeline stays exact.

use serde::{Deserialize, Serialize};

/// Tolerance for geometric comparisons, in points.
pub const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle, top-left origin, y grows downwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= EPSILON || self.height <= EPSILON
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn to_polygon(&self) -> Polygon {
        Polygon::from_rect(self)
    }
}

/// A 2D affine transform `[a b c d e f]`, mapping
/// `(x, y)` to `(a·x + c·y + e, b·x + d·y + f)` like PDF's `cm` operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Clockwise rotation in degrees (y axis points down, as in CSS).
    pub fn rotate(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self` applied first, then `next`.
    pub fn then(&self, next: &Transform) -> Transform {
        Transform {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    /// Conjugate by a translation so the transform pivots around `origin`.
    pub fn around(&self, origin: Point) -> Transform {
        Transform::translate(-origin.x, -origin.y)
            .then(self)
            .then(&Transform::translate(origin.x, origin.y))
    }

    pub fn is_identity(&self) -> bool {
        (self.a - 1.0).abs() < EPSILON
            && self.b.abs() < EPSILON
            && self.c.abs() < EPSILON
            && (self.d - 1.0).abs() < EPSILON
            && self.e.abs() < EPSILON
            && self.f.abs() < EPSILON
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn apply_rect(&self, r: &Rect) -> Polygon {
        let mut poly = Polygon::from_rect(r);
        for p in &mut poly.points {
            *p = self.apply(*p);
        }
        poly
    }
}

/// A convex polygon, vertices in order (either winding).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn from_rect(r: &Rect) -> Self {
        Self {
            points: vec![
                Point::new(r.x, r.y),
                Point::new(r.right(), r.y),
                Point::new(r.right(), r.bottom()),
                Point::new(r.x, r.bottom()),
            ],
        }
    }

    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            sum += p.x * q.y - q.x * p.y;
        }
        (sum / 2.0).abs()
    }

    pub fn is_empty(&self) -> bool {
        self.area() <= EPSILON
    }

    pub fn bounds(&self) -> Option<Rect> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Clip this polygon to a convex `clip` polygon (Sutherland–Hodgman).
    pub fn clip(&self, clip: &Polygon) -> Polygon {
        let n = clip.points.len();
        if n < 3 || self.points.len() < 3 {
            return Polygon::default();
        }
        let orientation = signed_area(&clip.points).signum();
        let mut output = self.points.clone();
        for i in 0..n {
            if output.is_empty() {
                break;
            }
            let a = clip.points[i];
            let b = clip.points[(i + 1) % n];
            let inside = |p: &Point| orientation * cross(a, b, *p) >= -EPSILON;
            let input = std::mem::take(&mut output);
            for j in 0..input.len() {
                let cur = input[j];
                let prev = input[(j + input.len() - 1) % input.len()];
                match (inside(&prev), inside(&cur)) {
                    (true, true) => output.push(cur),
                    (true, false) => output.push(intersect(prev, cur, a, b)),
                    (false, true) => {
                        output.push(intersect(prev, cur, a, b));
                        output.push(cur);
                    }
                    (false, false) => {}
                }
            }
        }
        Polygon { points: output }
    }

    pub fn clip_rect(&self, rect: &Rect) -> Polygon {
        self.clip(&Polygon::from_rect(rect))
    }

    /// Whether any part of the polygon with positive area lies outside `rect`.
    pub fn extends_outside(&self, rect: &Rect) -> bool {
        self.extends_beyond(&Polygon::from_rect(rect))
    }

    /// Whether any part of the polygon with positive area lies outside the
    /// convex `region`.
    pub fn extends_beyond(&self, region: &Polygon) -> bool {
        let inside = self.clip(region).area();
        self.area() - inside > EPSILON
    }

    /// Whether the polygon and `rect` share a region of positive area.
    pub fn overlaps(&self, rect: &Rect) -> bool {
        !self.clip_rect(rect).is_empty()
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Polygon {
        Polygon {
            points: self
                .points
                .iter()
                .map(|p| Point::new(p.x + dx, p.y + dy))
                .collect(),
        }
    }
}

fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        sum += p.x * q.y - q.x * p.y;
    }
    sum / 2.0
}

fn cross(a: Point, b: Point, p: Point) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn intersect(p: Point, q: Point, a: Point, b: Point) -> Point {
    let d1x = q.x - p.x;
    let d1y = q.y - p.y;
    let d2x = b.x - a.x;
    let d2y = b.y - a.y;
    let denom = d1x * d2y - d1y * d2x;
    if denom.abs() < f64::EPSILON {
        return q;
    }
    let t = ((a.x - p.x) * d2y - (a.y - p.y) * d2x) / denom;
    Point::new(p.x + t * d1x, p.y + t * d1y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn rotate_quarter_turn_about_center() {
        let r = Rect::new(0.0, 0.0, 100.0, 20.0);
        let t = Transform::rotate(90.0).around(r.center());
        let b = t.apply_rect(&r).bounds().unwrap();
        assert!(approx(b.x, 40.0), "{b:?}");
        assert!(approx(b.y, -40.0), "{b:?}");
        assert!(approx(b.width, 20.0));
        assert!(approx(b.height, 100.0));
    }

    #[test]
    fn then_composes_in_order() {
        let t = Transform::scale(2.0, 2.0).then(&Transform::translate(10.0, 0.0));
        let p = t.apply(Point::new(1.0, 1.0));
        assert!(approx(p.x, 12.0) && approx(p.y, 2.0));
    }

    #[test]
    fn clip_keeps_overlap_area() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0).to_polygon();
        let clipped = a.clip_rect(&Rect::new(5.0, -5.0, 20.0, 20.0));
        assert!(approx(clipped.area(), 50.0));
    }

    #[test]
    fn clip_disjoint_is_empty() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0).to_polygon();
        assert!(a.clip_rect(&Rect::new(10.0, 0.0, 5.0, 5.0)).is_empty());
    }

    #[test]
    fn clip_against_rotated_region() {
        // A 45° rotated square clipping an axis-aligned one: the corners are cut.
        let square = Rect::new(0.0, 0.0, 10.0, 10.0);
        let diamond = Transform::rotate(45.0)
            .around(square.center())
            .apply_rect(&square);
        let clipped = square.to_polygon().clip(&diamond);
        assert!(clipped.area() < 100.0);
        assert!(clipped.area() > 80.0);
    }

    #[test]
    fn extends_outside_detects_partial_overflow() {
        let page = Rect::new(0.0, 0.0, 500.0, 700.0);
        assert!(Rect::new(0.0, 0.0, 600.0, 10.0)
            .to_polygon()
            .extends_outside(&page));
        assert!(!Rect::new(0.0, 0.0, 500.0, 10.0)
            .to_polygon()
            .extends_outside(&page));
    }
}
