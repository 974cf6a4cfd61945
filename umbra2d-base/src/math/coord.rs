//! Numeric types used for coordinates and related quantities.

use euclid::{Angle, Point2D, Size2D, Vector2D};

/// Coordinate type for “world” (continuous) coordinates; an alias for [`f32`].
///
/// The choice of [`f32`] matches the numeric precision physics engines in this
/// domain conventionally offer; all tolerances in this crate family are chosen
/// for that precision.
pub type WorldCoord = f32;

/// Unit-of-measure type for points and vectors in the plane the lights and their
/// occluders inhabit.
#[allow(clippy::exhaustive_enums)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum World {}

/// A point in world space. Alias for [`Point2D`] with our preferred coordinate type.
pub type WorldPoint = Point2D<WorldCoord, World>;

/// A vector in world space. Alias for [`Vector2D`] with our preferred coordinate type.
pub type WorldVector = Vector2D<WorldCoord, World>;

/// A size (extent) in world space. Alias for [`Size2D`] with our preferred coordinate type.
pub type WorldSize = Size2D<WorldCoord, World>;

/// An angle measure. Alias for [`Angle`] with our preferred coordinate type.
///
/// All public angle-taking operations in this crate family accept [`WorldAngle`]
/// rather than raw radians or degrees, so that the unit is always explicit.
pub type WorldAngle = Angle<WorldCoord>;

/// Vector operations that are not currently provided by [`euclid`].
pub trait VectorExt {
    /// Rotates 90° counterclockwise, i.e. `(x, y)` becomes `(-y, x)`.
    #[must_use]
    fn perp(self) -> Self;

    /// Rotates by an angle whose sine and cosine have already been computed.
    #[must_use]
    fn rotated_by_sin_cos(self, sin: WorldCoord, cos: WorldCoord) -> Self;

    /// Normalizes to unit length, except that the zero vector stays zero
    /// rather than becoming NaN.
    #[must_use]
    fn normalize_or_zero(self) -> Self;
}

impl<U> VectorExt for Vector2D<WorldCoord, U> {
    #[inline]
    fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    #[inline]
    fn rotated_by_sin_cos(self, sin: WorldCoord, cos: WorldCoord) -> Self {
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    #[inline]
    fn normalize_or_zero(self) -> Self {
        let length = self.length();
        if length > 0.0 { self / length } else { self }
    }
}
