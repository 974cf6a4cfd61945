use core::cmp::Ordering;
use core::fmt;

use euclid::vec2;

use crate::math::lines::{self, Wireframe};
use crate::math::{WorldCoord, WorldPoint, WorldSize, WorldVector};

/// Axis-aligned rectangle data type, used for light extents, view bounds,
/// and broad-phase queries.
///
/// Maintains the invariant that the bounds are ordered and free of NaN,
/// so it can implement [`Eq`].
#[derive(Copy, Clone, PartialEq)]
pub struct Aabb {
    lower_bounds: WorldPoint,
    upper_bounds: WorldPoint,
}

impl Aabb {
    /// The [`Aabb`] of zero size at the origin.
    pub const ZERO: Aabb = Aabb {
        lower_bounds: WorldPoint::new(0., 0.),
        upper_bounds: WorldPoint::new(0., 0.),
    };

    /// Constructs an [`Aabb`] from individual coordinates.
    #[inline]
    #[track_caller]
    pub fn new(lx: WorldCoord, hx: WorldCoord, ly: WorldCoord, hy: WorldCoord) -> Self {
        Self::from_lower_upper(WorldPoint::new(lx, ly), WorldPoint::new(hx, hy))
    }

    /// Constructs an [`Aabb`] from most-negative and most-positive corner points.
    ///
    /// Panics if the points are not in the proper order or if they are NaN.
    #[inline]
    #[track_caller]
    pub fn from_lower_upper(
        lower_bounds: impl Into<WorldPoint>,
        upper_bounds: impl Into<WorldPoint>,
    ) -> Self {
        let lower_bounds = lower_bounds.into();
        let upper_bounds = upper_bounds.into();
        match Self::checked_from_lower_upper(lower_bounds, upper_bounds) {
            Some(aabb) => aabb,
            None => panic!(
                "invalid bounds points that are misordered or NaN: \
                lower {lower_bounds:?} upper {upper_bounds:?}"
            ),
        }
    }

    /// Constructs an [`Aabb`] from most-negative and most-positive corner points.
    ///
    /// Returns [`None`] if the points are not in the proper order or if they are NaN.
    #[inline]
    pub fn checked_from_lower_upper(
        lower_bounds: WorldPoint,
        upper_bounds: WorldPoint,
    ) -> Option<Self> {
        if lower_bounds.x <= upper_bounds.x && lower_bounds.y <= upper_bounds.y {
            Some(Self {
                lower_bounds,
                upper_bounds,
            })
        } else {
            None
        }
    }

    /// Constructs an [`Aabb`] with the given center point and half-size on each axis.
    ///
    /// Panics if `half_size` is negative or NaN.
    #[inline]
    #[track_caller]
    pub fn centered(center: WorldPoint, half_size: WorldVector) -> Self {
        Self::from_lower_upper(center - half_size, center + half_size)
    }

    /// Constructs the smallest [`Aabb`] containing every point of the iterator,
    /// or [`None`] if the iterator is empty or any coordinate is NaN.
    #[inline]
    pub fn from_points(points: impl IntoIterator<Item = WorldPoint>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut result = Self::checked_from_lower_upper(first, first)?;
        for point in points {
            if point.x.is_nan() || point.y.is_nan() {
                return None;
            }
            result = result.union_point(point);
        }
        Some(result)
    }

    /// The most negative corner of the rectangle.
    #[inline]
    pub const fn lower_bounds(&self) -> WorldPoint {
        self.lower_bounds
    }

    /// The most positive corner of the rectangle.
    #[inline]
    pub const fn upper_bounds(&self) -> WorldPoint {
        self.upper_bounds
    }

    /// Size of the rectangle in each axis; equivalent to
    /// `self.upper_bounds() - self.lower_bounds()`.
    #[inline]
    pub fn size(&self) -> WorldSize {
        WorldSize::from(self.upper_bounds - self.lower_bounds)
    }

    /// The center of the enclosed area.
    ///
    /// ```
    /// # extern crate umbra2d_base as umbra2d;
    /// use umbra2d::math::{Aabb, WorldPoint};
    ///
    /// let aabb = Aabb::new(1.0, 2.0, 3.0, 4.0);
    /// assert_eq!(aabb.center(), WorldPoint::new(1.5, 3.5));
    /// ```
    #[inline]
    pub fn center(&self) -> WorldPoint {
        (self.lower_bounds + self.upper_bounds.to_vector()) * 0.5
    }

    /// Returns whether this rectangle, including the boundary, contains the point.
    #[inline]
    pub fn contains(&self, point: WorldPoint) -> bool {
        self.lower_bounds.x <= point.x
            && point.x <= self.upper_bounds.x
            && self.lower_bounds.y <= point.y
            && point.y <= self.upper_bounds.y
    }

    /// Returns whether this rectangle, including the boundary, intersects the other
    /// rectangle.
    #[inline]
    pub fn intersects(&self, other: Aabb) -> bool {
        let min = self.lower_bounds.max(other.lower_bounds);
        let max = self.upper_bounds.min(other.upper_bounds);
        matches!(
            min.x.partial_cmp(&max.x),
            Some(Ordering::Less | Ordering::Equal)
        ) && matches!(
            min.y.partial_cmp(&max.y),
            Some(Ordering::Less | Ordering::Equal)
        )
    }

    /// Returns the smallest rectangle that contains both `self` and `point`.
    #[must_use]
    #[inline]
    pub fn union_point(self, point: WorldPoint) -> Self {
        Self {
            lower_bounds: self.lower_bounds.min(point),
            upper_bounds: self.upper_bounds.max(point),
        }
    }

    /// Translate this rectangle by the specified offset.
    #[inline]
    #[must_use]
    #[track_caller] // in case of NaN
    pub fn translate(self, offset: WorldVector) -> Self {
        Self::from_lower_upper(self.lower_bounds + offset, self.upper_bounds + offset)
    }

    /// Enlarges the rectangle by moving each edge outward by the specified distance
    /// (or inward if negative).
    ///
    /// If this would result in a negative or NaN size, produces a zero size rectangle
    /// located at the center point of `self`.
    ///
    /// ```
    /// # extern crate umbra2d_base as umbra2d;
    /// use umbra2d::math::Aabb;
    ///
    /// assert_eq!(
    ///     Aabb::new(1.0, 2.0, 3.0, 4.0).expand(0.25),
    ///     Aabb::new(0.75, 2.25, 2.75, 4.25)
    /// );
    /// ```
    #[must_use]
    #[inline]
    pub fn expand(self, distance: WorldCoord) -> Self {
        let distance_vec = vec2(distance, distance);
        match Self::checked_from_lower_upper(
            self.lower_bounds - distance_vec,
            self.upper_bounds + distance_vec,
        ) {
            Some(aabb) => aabb,
            None => {
                let center = self.center();
                Aabb::from_lower_upper(center, center)
            }
        }
    }
}

impl fmt::Debug for Aabb {
    #[allow(clippy::missing_inline_in_public_items)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Aabb {
            lower_bounds: l,
            upper_bounds: u,
        } = *self;
        f.debug_tuple("Aabb")
            .field(&(l.x..=u.x))
            .field(&(l.y..=u.y))
            .finish()
    }
}

/// [`Aabb`] rejects NaN values, so it can implement [`Eq`]
/// even though it contains floats.
impl Eq for Aabb {}

impl Wireframe for Aabb {
    #[inline(never)]
    fn wireframe_points<E: Extend<[lines::Vertex; 2]>>(&self, output: &mut E) {
        let l = self.lower_bounds;
        let u = self.upper_bounds;
        output.extend(lines::line_loop([
            lines::Vertex::from(WorldPoint::new(l.x, l.y)),
            lines::Vertex::from(WorldPoint::new(u.x, l.y)),
            lines::Vertex::from(WorldPoint::new(u.x, u.y)),
            lines::Vertex::from(WorldPoint::new(l.x, u.y)),
        ]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use euclid::point2;

    #[test]
    fn new_wrong_order() {
        assert_eq!(
            Aabb::checked_from_lower_upper(point2(2., 1.), point2(1., 2.)),
            None
        );
        assert_eq!(
            Aabb::checked_from_lower_upper(point2(1., 2.), point2(2., 1.)),
            None
        );
    }

    #[test]
    fn new_nan_rejected() {
        assert_eq!(
            Aabb::checked_from_lower_upper(point2(0., f32::NAN), point2(1., 2.)),
            None
        );
    }

    #[test]
    fn union_point_grows_in_all_directions() {
        let aabb = Aabb::ZERO
            .union_point(point2(2., 0.))
            .union_point(point2(-1., 3.));
        assert_eq!(aabb, Aabb::new(-1., 2., 0., 3.));
    }

    #[test]
    fn from_points_matches_manual_union() {
        assert_eq!(Aabb::from_points([]), None);
        assert_eq!(
            Aabb::from_points([point2(1., 5.), point2(-2., 6.), point2(0., 0.)]),
            Some(Aabb::new(-2., 1., 0., 6.))
        );
    }

    #[test]
    fn intersects_inclusive_of_edges() {
        let a = Aabb::new(0., 1., 0., 1.);
        assert!(a.intersects(Aabb::new(1., 2., 0., 1.)));
        assert!(!a.intersects(Aabb::new(1.001, 2., 0., 1.)));
        assert!(a.intersects(a));
    }

    #[test]
    fn expand_inward_collapse() {
        let a = Aabb::new(0., 1., 0., 1.);
        assert_eq!(a.expand(-2.0), Aabb::centered(point2(0.5, 0.5), vec2(0., 0.)));
    }

    #[test]
    fn wireframe_is_four_segments() {
        let mut out: Vec<[lines::Vertex; 2]> = Vec::new();
        Aabb::new(0., 1., 0., 1.).wireframe_points(&mut out);
        assert_eq!(out.len(), 4);
        // Segments chain into a closed loop.
        for window in out.windows(2) {
            assert_eq!(window[0][1].position, window[1][0].position);
        }
        assert_eq!(out[3][1].position, out[0][0].position);
    }
}
