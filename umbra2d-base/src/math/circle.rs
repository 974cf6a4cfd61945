//! Intersection and tangency primitives for circles, lines, and segments.
//!
//! These are plain functions rather than methods so that callers can mix
//! coordinate data from several sources without conversion ceremony.

use arrayvec::ArrayVec;
use euclid::vec2;

use crate::math::{WorldCoord, WorldPoint};

/// Computes the two points at which lines through `external` touch the circle.
///
/// Returns [`None`] when `external` is inside the circle or on its boundary,
/// where two distinct tangent points do not exist.
#[inline]
pub fn tangent_points(
    center: WorldPoint,
    radius: WorldCoord,
    external: WorldPoint,
) -> Option<[WorldPoint; 2]> {
    let d2 = (center - external).square_length();
    if d2 < radius * radius {
        return None;
    }
    // The tangent points lie on the circle about `external` whose radius is the
    // tangent line length, so this reduces to a circle-circle intersection.
    let tangent_len = (d2 - radius * radius).sqrt();
    let points = circle_circle_intersections(center, radius, external, tangent_len);
    match points.into_inner() {
        Ok(pair) => Some(pair),
        Err(_) => None,
    }
}

/// Computes the intersection points of two circles: none, one (tangency), or two.
#[allow(clippy::missing_inline_in_public_items)]
pub fn circle_circle_intersections(
    c1: WorldPoint,
    r1: WorldCoord,
    c2: WorldPoint,
    r2: WorldCoord,
) -> ArrayVec<WorldPoint, 2> {
    let mut out = ArrayVec::new();
    let delta = c2 - c1;
    let dist = delta.length();
    if dist > r1 + r2 {
        // No solutions, the circles are too far apart.
        return out;
    } else if dist < (r1 - r2).abs() {
        // No solutions, one circle contains the other.
        return out;
    } else if dist == 0.0 && r1 == r2 {
        // No solutions, the circles coincide.
        return out;
    }

    // Distance from c1 to the chord joining the intersection points,
    // and the chord's half-length.
    let a = (r1 * r1 - r2 * r2 + dist * dist) / (2.0 * dist);
    let h = (r1 * r1 - a * a).sqrt();

    let base = c1 + delta * (a / dist);
    let offset = vec2(delta.y, -delta.x) * (h / dist);

    out.push(base + offset);
    if dist != r1 + r2 {
        out.push(base - offset);
    }
    out
}

/// Computes the intersections of the infinite line through `start` and `end`
/// with a circle: none, one (tangency), or two.
///
/// Intersections beyond the ends of the `start..end` span are still reported;
/// callers wanting segment semantics should filter, e.g. against
/// [`nearest_point_on_segment`].
///
/// A degenerate line whose defining points are (nearly) coincident produces no
/// intersections.
#[allow(clippy::missing_inline_in_public_items)]
pub fn line_circle_intersections(
    center: WorldPoint,
    radius: WorldCoord,
    start: WorldPoint,
    end: WorldPoint,
) -> ArrayVec<WorldPoint, 2> {
    let mut out = ArrayVec::new();
    let d = end - start;
    let f = start - center;

    let a = d.square_length();
    let b = 2.0 * d.dot(f);
    let c = f.square_length() - radius * radius;

    let det = b * b - 4.0 * a * c;
    if a <= 0.001 || det < 0.0 {
        // No real solutions.
    } else if det == 0.0 {
        // One solution.
        let t = -b / (2.0 * a);
        out.push(start + d * t);
    } else {
        // Two solutions.
        let sqrt_det = det.sqrt();
        out.push(start + d * ((-b + sqrt_det) / (2.0 * a)));
        out.push(start + d * ((-b - sqrt_det) / (2.0 * a)));
    }
    out
}

/// Returns the point on the segment `start..end` nearest to `point`.
#[inline]
pub fn nearest_point_on_segment(
    start: WorldPoint,
    end: WorldPoint,
    point: WorldPoint,
) -> WorldPoint {
    let length2 = (end - start).square_length();
    if length2 == 0.0 {
        return start;
    }
    let t = ((point - start).dot(end - start) / length2).clamp(0.0, 1.0);
    start + (end - start) * t
}

/// Which side of the directed line through `a` and `b` the point lies on:
/// 1 to the left (counterclockwise), -1 to the right, 0 on the line.
#[inline]
pub fn point_line_side(a: WorldPoint, b: WorldPoint, point: WorldPoint) -> i32 {
    let cross = (b.x - a.x) * (point.y - a.y) - (b.y - a.y) * (point.x - a.x);
    if cross > 0.0 {
        1
    } else if cross < 0.0 {
        -1
    } else {
        0
    }
}

/// Computes the intersection of the infinite lines through `p1..p2` and `p3..p4`,
/// or [`None`] if they are parallel (or degenerate).
#[inline]
pub fn line_line_intersection(
    p1: WorldPoint,
    p2: WorldPoint,
    p3: WorldPoint,
    p4: WorldPoint,
) -> Option<WorldPoint> {
    let d = (p4.y - p3.y) * (p2.x - p1.x) - (p4.x - p3.x) * (p2.y - p1.y);
    if d == 0.0 {
        return None;
    }
    let ua = ((p4.x - p3.x) * (p1.y - p3.y) - (p4.y - p3.y) * (p1.x - p3.x)) / d;
    Some(p1 + (p2 - p1) * ua)
}

/// Computes the intersection of the segments `p1..p2` and `p3..p4`,
/// or [`None`] if they do not cross.
#[inline]
pub fn segment_segment_intersection(
    p1: WorldPoint,
    p2: WorldPoint,
    p3: WorldPoint,
    p4: WorldPoint,
) -> Option<WorldPoint> {
    let d = (p4.y - p3.y) * (p2.x - p1.x) - (p4.x - p3.x) * (p2.y - p1.y);
    if d == 0.0 {
        return None;
    }
    let ua = ((p4.x - p3.x) * (p1.y - p3.y) - (p4.y - p3.y) * (p1.x - p3.x)) / d;
    let ub = ((p2.x - p1.x) * (p1.y - p3.y) - (p2.y - p1.y) * (p1.x - p3.x)) / d;
    if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
        Some(p1 + (p2 - p1) * ua)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use euclid::point2;
    use rstest::rstest;

    fn assert_approx_point(actual: WorldPoint, expected: WorldPoint, tolerance: f32) {
        assert!(
            (actual - expected).length() <= tolerance,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[rstest]
    #[case(point2(0., 0.), 2.0, point2(5., 0.))]
    #[case(point2(0., 0.), 1.0, point2(3., 4.))]
    #[case(point2(-3., 7.), 0.5, point2(10., -2.))]
    #[case(point2(1., 1.), 2.0, point2(1., 8.))]
    fn tangents_touch_and_are_perpendicular(
        #[case] center: WorldPoint,
        #[case] radius: WorldCoord,
        #[case] external: WorldPoint,
    ) {
        let [t1, t2] = tangent_points(center, radius, external).unwrap();
        assert_ne!(t1, t2);
        for t in [t1, t2] {
            // The tangent point is on the circle...
            assert!(((t - center).length() - radius).abs() < 1e-4);
            // ...and the radius there is perpendicular to the tangent line.
            let radial = t - center;
            let tangential = t - external;
            let cos = radial.dot(tangential) / (radial.length() * tangential.length());
            assert!(cos.abs() < 1e-3, "not perpendicular: cos = {cos}");
        }
    }

    #[test]
    fn tangents_from_inside_dont_exist() {
        assert_eq!(tangent_points(point2(0., 0.), 2.0, point2(1., 0.)), None);
        // A point exactly on the boundary has no two distinct tangent points either.
        assert_eq!(tangent_points(point2(0., 0.), 2.0, point2(2., 0.)), None);
    }

    #[test]
    fn circle_circle_crossing() {
        let points = circle_circle_intersections(point2(0., 0.), 1.0, point2(1., 0.), 1.0);
        assert_eq!(points.len(), 2);
        for p in &points {
            assert!(((*p - point2(0., 0.)).length() - 1.0).abs() < 1e-6);
            assert!(((*p - point2(1., 0.)).length() - 1.0).abs() < 1e-6);
        }
        // The two points are mirror images across the center line.
        assert!((points[0].x - 0.5).abs() < 1e-6);
        assert!((points[0].y + points[1].y).abs() < 1e-6);
    }

    #[test]
    fn circle_circle_external_tangency() {
        let points = circle_circle_intersections(point2(0., 0.), 1.0, point2(2., 0.), 1.0);
        assert_eq!(points.len(), 1);
        assert_approx_point(points[0], point2(1., 0.), 1e-6);
    }

    #[rstest]
    #[case(point2(5., 0.), 1.0)] // too far apart
    #[case(point2(0.1, 0.), 0.1)] // contained
    #[case(point2(0., 0.), 1.0)] // coincident
    fn circle_circle_no_intersection(#[case] c2: WorldPoint, #[case] r2: WorldCoord) {
        assert!(circle_circle_intersections(point2(0., 0.), 1.0, c2, r2).is_empty());
    }

    #[test]
    fn chord_endpoints_satisfy_both_equations() {
        // Circle of radius 5 about the origin; horizontal line at y = 3 crosses at x = ±4.
        let points =
            line_circle_intersections(point2(0., 0.), 5.0, point2(-10., 3.), point2(10., 3.));
        assert_eq!(points.len(), 2);
        let mut xs = [points[0].x, points[1].x];
        xs.sort_by(f32::total_cmp);
        assert!((xs[0] + 4.0).abs() < 1e-4);
        assert!((xs[1] - 4.0).abs() < 1e-4);
        for p in &points {
            assert!((p.y - 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn line_reports_intersections_beyond_segment() {
        // The chord is entirely to the right of the segment span, but the infinite
        // line still intersects.
        let points =
            line_circle_intersections(point2(10., 0.), 1.0, point2(0., 0.), point2(1., 0.));
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn line_miss_and_degenerate() {
        assert!(
            line_circle_intersections(point2(0., 0.), 1.0, point2(-5., 2.), point2(5., 2.))
                .is_empty()
        );
        // Degenerate (near-zero-length) line.
        assert!(
            line_circle_intersections(point2(0., 0.), 1.0, point2(0.5, 0.), point2(0.5001, 0.))
                .is_empty()
        );
    }

    #[test]
    fn nearest_point_clamps_to_ends() {
        let (a, b) = (point2(0., 0.), point2(10., 0.));
        assert_eq!(nearest_point_on_segment(a, b, point2(5., 3.)), point2(5., 0.));
        assert_eq!(nearest_point_on_segment(a, b, point2(-5., 3.)), a);
        assert_eq!(nearest_point_on_segment(a, b, point2(15., 3.)), b);
        assert_eq!(nearest_point_on_segment(a, a, point2(15., 3.)), a);
    }

    #[test]
    fn side_of_line() {
        let (a, b) = (point2(0., 0.), point2(1., 0.));
        assert_eq!(point_line_side(a, b, point2(0.5, 1.)), 1);
        assert_eq!(point_line_side(a, b, point2(0.5, -1.)), -1);
        assert_eq!(point_line_side(a, b, point2(2., 0.)), 0);
    }

    #[test]
    fn lines_cross_where_expected() {
        let hit = line_line_intersection(
            point2(0., 0.),
            point2(2., 2.),
            point2(0., 2.),
            point2(2., 0.),
        )
        .unwrap();
        assert_approx_point(hit, point2(1., 1.), 1e-6);

        assert_eq!(
            line_line_intersection(
                point2(0., 0.),
                point2(1., 1.),
                point2(0., 1.),
                point2(1., 2.),
            ),
            None
        );
    }

    #[test]
    fn segments_cross_only_within_spans() {
        assert!(
            segment_segment_intersection(
                point2(0., 0.),
                point2(2., 2.),
                point2(0., 2.),
                point2(2., 0.),
            )
            .is_some()
        );
        // Same lines, but one segment stops short of the crossing.
        assert_eq!(
            segment_segment_intersection(
                point2(0., 0.),
                point2(0.4, 0.4),
                point2(0., 2.),
                point2(2., 0.),
            ),
            None
        );
    }
}
