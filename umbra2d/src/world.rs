//! Traits through which lights observe the collision world they illuminate.
//!
//! Implementations of [`OccluderWorld`] are typically thin adapters over a
//! physics engine's broad phase and raycast facilities. The lights only ever
//! ask two things of the world: “which shapes overlap this rectangle” and
//! “what does this ray hit”.

use core::fmt;

use crate::math::{Aabb, WorldAngle, WorldCoord, WorldPoint};

// -------------------------------------------------------------------------------------------------

/// Identifies one occluding shape within its world.
///
/// The value is chosen by the [`OccluderWorld`] implementation and must be stable
/// for as long as the shape exists, and never reused for a different shape while
/// any light might still remember it.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OccluderId(pub u64);

/// Identifies the body (shape owner) an occluder belongs to.
///
/// Several shapes may share one body; a light attached to a body can choose to
/// ignore all of that body's shapes when casting.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BodyId(pub u64);

/// Broad classification of how a body moves, matching the conventional
/// physics-engine body types.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, exhaust::Exhaust)]
#[expect(clippy::exhaustive_enums)]
pub enum BodyKind {
    /// Never moves.
    Static,
    /// Moved directly by its owner rather than by simulation.
    Kinematic,
    /// Fully simulated.
    Dynamic,
}

impl BodyKind {
    /// Whether shapes of this body may be cached across frames without revalidation.
    #[inline]
    pub fn is_static(self) -> bool {
        matches!(self, BodyKind::Static)
    }
}

/// Geometric classification of an occluder shape.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, exhaust::Exhaust)]
#[expect(clippy::exhaustive_enums)]
pub enum ShapeKind {
    /// A circle, reported through [`Occluder::circle`].
    Circle,
    /// A closed convex loop of vertices.
    Polygon,
    /// An open polyline of vertices.
    Chain,
    /// A single segment. Too thin to have a silhouette of its own.
    Edge,
}

// -------------------------------------------------------------------------------------------------

/// Category/mask/group contact-filter data, with the semantics physics engines
/// conventionally give those fields.
///
/// Two parties collide when either their (nonzero) group indices match and are
/// positive, or their category and mask bits mutually overlap.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(clippy::exhaustive_structs)]
pub struct ContactFilter {
    /// The collision category bits of this party. Normally one bit is set.
    pub category: u16,
    /// The categories this party accepts collisions with.
    pub mask: u16,
    /// Group override: parties with equal nonzero groups always collide
    /// (positive) or never collide (negative), regardless of the bits.
    pub group: i16,
}

impl ContactFilter {
    /// Decides whether a party using this filter interacts with a party carrying
    /// `other`.
    #[inline]
    #[must_use]
    pub fn should_collide(&self, other: ContactFilter) -> bool {
        if self.group != 0 && self.group == other.group {
            return self.group > 0;
        }
        (self.mask & other.category) != 0 && (self.category & other.mask) != 0
    }
}

impl Default for ContactFilter {
    /// Category 1, all mask bits set, no group; collides with everything
    /// by default, like a freshly created physics fixture.
    #[inline]
    fn default() -> Self {
        Self {
            category: 0x0001,
            mask: 0xFFFF,
            group: 0,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// A single occluding shape reported by an [`OccluderWorld`] query.
///
/// The trait object is only valid for the duration of the visitor call it is
/// passed to; anything a light needs longer than that, it copies out.
pub trait Occluder: fmt::Debug {
    /// Identity of this shape.
    fn id(&self) -> OccluderId;

    /// Identity of the body this shape belongs to.
    fn body(&self) -> BodyId;

    /// How the owning body moves.
    fn body_kind(&self) -> BodyKind;

    /// Whether this shape is a non-solid sensor.
    ///
    /// Sensors still occlude light; this is informational for filters.
    fn is_sensor(&self) -> bool {
        false
    }

    /// The shape's contact-filter data.
    fn filter(&self) -> ContactFilter {
        ContactFilter::default()
    }

    /// Geometric classification, or [`None`] if the provider cannot classify
    /// the shape. Unclassifiable shapes are skipped (with a log message) rather
    /// than treated as errors.
    fn shape_kind(&self) -> Option<ShapeKind>;

    /// World-space center and radius, for [`ShapeKind::Circle`] shapes.
    fn circle(&self) -> Option<(WorldPoint, WorldCoord)>;

    /// Number of vertices, for vertex-based shapes.
    fn vertex_count(&self) -> usize;

    /// The `index`th vertex in world coordinates, for vertex-based shapes.
    ///
    /// `index` is less than [`Occluder::vertex_count()`].
    fn world_vertex(&self, index: usize) -> WorldPoint;
}

/// A candidate intersection reported during [`OccluderWorld::cast_ray`].
#[derive(Debug)]
#[expect(clippy::exhaustive_structs)]
pub struct RayHit<'a> {
    /// The shape that was hit.
    pub occluder: &'a dyn Occluder,
    /// The hit position in world coordinates.
    pub point: WorldPoint,
    /// Position of the hit along the ray: 0 at the start, 1 at the endpoint.
    pub fraction: WorldCoord,
}

/// Flow control returned by broad-phase query visitors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(clippy::exhaustive_enums)]
pub enum QueryFlow {
    /// Keep reporting shapes.
    Continue,
    /// Stop the query.
    Stop,
}

/// Flow control returned by raycast visitors.
///
/// These correspond to the conventional raycast-callback return values of
/// −1 (ignore), 0 (terminate), the hit fraction (clip), and 1 (continue).
#[derive(Clone, Copy, Debug, PartialEq)]
#[expect(clippy::exhaustive_enums)]
pub enum RayFlow {
    /// Skip this shape as if it were not present.
    Ignore,
    /// Accept and stop reporting entirely.
    Stop,
    /// From now on, report only hits nearer than the given fraction.
    ClipTo(WorldCoord),
    /// Keep reporting without narrowing.
    Continue,
}

/// Broad-phase and raycast access to the collision world the lights live in.
pub trait OccluderWorld: fmt::Debug {
    /// Visits every shape whose bounds overlap `bounds`, until the visitor
    /// returns [`QueryFlow::Stop`].
    ///
    /// Shapes with several broad-phase entries (such as chains) may be visited
    /// more than once; callers deduplicate by [`Occluder::id()`].
    fn query_bounds(&self, bounds: Aabb, visitor: &mut dyn FnMut(&dyn Occluder) -> QueryFlow);

    /// Casts a ray from `from` to `to`, reporting candidate hits to the visitor.
    ///
    /// Hits need not arrive in distance order; the visitor narrows the search
    /// with [`RayFlow::ClipTo`] and keeps the nearest hit itself.
    fn cast_ray(
        &self,
        from: WorldPoint,
        to: WorldPoint,
        visitor: &mut dyn FnMut(RayHit<'_>) -> RayFlow,
    );

    /// The current pose of a body, for lights attached to one.
    ///
    /// Returns [`None`] if the body is unknown, in which case attached lights
    /// keep their previous placement.
    fn body_transform(&self, body: BodyId) -> Option<(WorldPoint, WorldAngle)>;
}

/// An [`OccluderWorld`] containing no shapes at all.
///
/// Useful for lights that only need their own geometry, and for tests.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[expect(clippy::exhaustive_structs)]
#[expect(clippy::module_name_repetitions)]
pub struct EmptyWorld;

impl OccluderWorld for EmptyWorld {
    #[inline]
    fn query_bounds(&self, _: Aabb, _: &mut dyn FnMut(&dyn Occluder) -> QueryFlow) {}

    #[inline]
    fn cast_ray(&self, _: WorldPoint, _: WorldPoint, _: &mut dyn FnMut(RayHit<'_>) -> RayFlow) {}

    #[inline]
    fn body_transform(&self, _: BodyId) -> Option<(WorldPoint, WorldAngle)> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exhaust::Exhaust as _;

    #[test]
    fn filter_group_overrides_bits() {
        let mut a = ContactFilter::default();
        let mut b = ContactFilter::default();
        // Bits say collide, negative shared group says never.
        a.group = -3;
        b.group = -3;
        assert!(!a.should_collide(b));
        // Positive shared group says always, even with disjoint bits.
        a.group = 5;
        b.group = 5;
        b.category = 0x0002;
        a.mask = 0x0001;
        assert!(a.should_collide(b));
    }

    #[test]
    fn filter_bits_must_overlap_both_ways() {
        let a = ContactFilter {
            category: 0x0001,
            mask: 0x0002,
            group: 0,
        };
        let b = ContactFilter {
            category: 0x0002,
            mask: 0x0002,
            group: 0,
        };
        // a accepts b's category, but b does not accept a's.
        assert!(!a.should_collide(b));
        let b = ContactFilter { mask: 0x0001, ..b };
        assert!(a.should_collide(b));
    }

    #[test]
    fn only_static_bodies_are_static() {
        for kind in BodyKind::exhaust() {
            assert_eq!(kind.is_static(), matches!(kind, BodyKind::Static));
        }
    }
}
