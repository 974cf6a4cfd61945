//! Silhouette-driven (“exact”) light variants.
//!
//! The plain light variants cast a fixed fan of evenly spaced rays, so their
//! shadow fidelity is bounded by the ray count: occluder corners land between
//! two rays, and shadow edges wobble as lights move. The variants here instead
//! query the world for the occluders around each light and aim rays directly
//! at silhouette features — polygon corners, circle tangents, and the points
//! where outline edges cross the light's reach — with a sparse base fan
//! filling the gaps between features. Shadow edges come out exact, usually
//! with far fewer rays than a fixed fan of comparable quality.
//!
//! Construct these lights through the `exact_*` constructors on
//! [`Light`](crate::Light). They share some machinery the plain variants do
//! not have:
//!
//! * a [`RayCount`](crate::RayCount) budget of base rays plus feature rays;
//! * sleeping: when the bodies around an awake light are unchanged since its
//!   previous update, the previous rays are reused without casting
//!   ([`Light::is_sleeping()`](crate::Light::is_sleeping));
//! * a peak-ray statistic for tuning budgets
//!   ([`Light::peak_rays()`](crate::Light::peak_rays)).

use core::ops::Range;

use hashbrown::HashSet;

use crate::light::UpdateContext;
use crate::math::{Aabb, WorldCoord, WorldPoint};
use crate::world::{Occluder, OccluderId, OccluderWorld, QueryFlow, ShapeKind};

mod chain;
pub use chain::ChainLight;
mod directional;
pub use directional::DirectionalLight;
mod line;
pub use line::LineLight;
mod positional;
pub use positional::{ConeLight, PointLight};

// -------------------------------------------------------------------------------------------------

/// Sideways nudge, in world units, applied to rays aimed at outline corners so
/// that they pass just beside the corner instead of striking it; a ray aimed
/// straight at a corner sometimes slips through. Much smaller values run into
/// float precision.
pub(crate) const OFFSET_SIZE: WorldCoord = 0.02;

// -------------------------------------------------------------------------------------------------

/// Reusable buffers for one light's silhouette query, owned by the
/// [`LightSet`](crate::LightSet) and lent to each light in turn.
#[derive(Clone, Debug, Default)]
pub(crate) struct Scratch {
    /// Shapes already reported in the current query; chains may be reported
    /// once per overlapping segment.
    seen: HashSet<OccluderId>,
    shapes: Vec<GatheredShape>,
    /// Backing storage for the outline shapes' vertex ranges.
    vertices: Vec<WorldPoint>,
    /// Ids of the static shapes found, sorted.
    static_ids: Vec<OccluderId>,
    /// Number of non-static shapes found.
    dynamic: usize,
}

/// One occluder's geometry, copied out of the world during a query.
#[derive(Clone, Debug)]
pub(crate) enum GatheredShape {
    Circle {
        center: WorldPoint,
        radius: WorldCoord,
    },
    /// A polygon or chain outline; the feature walks treat both as closed
    /// loops of edges.
    Outline { vertices: Range<usize> },
}

impl Scratch {
    /// Runs the broad-phase query, deduplicating, counting, and copying out
    /// shape geometry. With `ignore_static`, static shapes are neither counted
    /// nor collected.
    fn gather(&mut self, world: &dyn OccluderWorld, bounds: Aabb, ignore_static: bool) {
        self.seen.clear();
        self.shapes.clear();
        self.vertices.clear();
        self.static_ids.clear();
        self.dynamic = 0;
        world.query_bounds(bounds, &mut |occluder| {
            if self.seen.insert(occluder.id()) {
                if occluder.body_kind().is_static() {
                    if ignore_static {
                        return QueryFlow::Continue;
                    }
                    self.static_ids.push(occluder.id());
                } else {
                    self.dynamic += 1;
                }
                self.collect(occluder);
            }
            QueryFlow::Continue
        });
        self.static_ids.sort_unstable();
    }

    fn collect(&mut self, occluder: &dyn Occluder) {
        match occluder.shape_kind() {
            Some(ShapeKind::Circle) => {
                if let Some((center, radius)) = occluder.circle() {
                    self.shapes.push(GatheredShape::Circle { center, radius });
                }
            }
            Some(ShapeKind::Polygon | ShapeKind::Chain) => {
                let start = self.vertices.len();
                self.vertices
                    .extend((0..occluder.vertex_count()).map(|i| occluder.world_vertex(i)));
                if self.vertices.len() > start {
                    self.shapes.push(GatheredShape::Outline {
                        vertices: start..self.vertices.len(),
                    });
                }
            }
            // A single segment (often chain ghost data) has no silhouette
            // worth aiming at; rays still collide with it.
            Some(ShapeKind::Edge) => {}
            None => log::warn!("ignoring unclassifiable occluder {:?}", occluder.id()),
        }
    }

    pub fn shapes(&self) -> &[GatheredShape] {
        &self.shapes
    }

    /// The vertex slice of a [`GatheredShape::Outline`]. Never empty.
    pub fn outline(&self, vertices: Range<usize>) -> &[WorldPoint] {
        &self.vertices[vertices]
    }
}

// -------------------------------------------------------------------------------------------------

/// Collects the occluders overlapping `bounds` into the scratch buffers and
/// decides whether the light may sleep, that is, reuse its previous rays
/// because the bodies around it are exactly the ones it saw last time.
///
/// A light sleeps when sleeping is allowed, none of its parameters changed,
/// no dynamic bodies are nearby, and the set of static shapes equals
/// `last_static`; `last_static` is refreshed whenever the light stays awake.
pub(crate) fn gather_or_sleep(
    ctx: &mut UpdateContext<'_>,
    bounds: Aabb,
    ignore_static: bool,
    allow_sleeping: bool,
    dirty: bool,
    last_static: &mut Vec<OccluderId>,
) -> bool {
    ctx.scratch.gather(ctx.world, bounds, ignore_static);
    if allow_sleeping
        && !dirty
        && !ctx.force
        && ctx.scratch.dynamic == 0
        && ctx.scratch.static_ids == *last_static
    {
        return true;
    }
    last_static.clone_from(&ctx.scratch.static_ids);
    false
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use euclid::point2;

    use super::*;
    use crate::testing::FixtureWorld;
    use crate::world::BodyKind;

    fn query(world: &FixtureWorld, bounds: Aabb, ignore_static: bool) -> Scratch {
        let mut scratch = Scratch::default();
        scratch.gather(world, bounds, ignore_static);
        scratch
    }

    #[test]
    fn gather_classifies_and_counts() {
        let mut world = FixtureWorld::new();
        let circle = world.add_circle(BodyKind::Static, point2(1., 1.), 0.5);
        world.add_box(BodyKind::Dynamic, Aabb::new(2., 3., 0., 1.));
        world.add_edge(BodyKind::Static, point2(0., 2.), point2(1., 2.));

        let scratch = query(&world, Aabb::new(-5., 5., -5., 5.), false);
        // The edge is counted (it can still block rays) but yields no shape.
        assert_eq!(scratch.static_ids.len(), 2);
        assert_eq!(scratch.dynamic, 1);
        assert_eq!(scratch.shapes().len(), 2);
        assert!(matches!(
            scratch.shapes()[0],
            GatheredShape::Circle { radius, .. } if radius == 0.5
        ));
        assert!(scratch.static_ids.contains(&circle));
    }

    #[test]
    fn gather_reports_chains_once() {
        let mut world = FixtureWorld::new();
        world.add_chain(
            BodyKind::Static,
            [point2(-2., 0.), point2(0., 0.), point2(2., 0.), point2(2., 2.)],
        );
        let scratch = query(&world, Aabb::new(-5., 5., -5., 5.), false);
        assert_eq!(scratch.shapes().len(), 1);
        let GatheredShape::Outline { ref vertices } = scratch.shapes()[0] else {
            panic!("expected an outline");
        };
        assert_eq!(scratch.outline(vertices.clone()).len(), 4);
    }

    #[test]
    fn ignore_static_drops_static_shapes_entirely() {
        let mut world = FixtureWorld::new();
        world.add_box(BodyKind::Static, Aabb::new(0., 1., 0., 1.));
        world.add_circle(BodyKind::Dynamic, point2(-1., -1.), 0.25);

        let scratch = query(&world, Aabb::new(-5., 5., -5., 5.), true);
        assert_eq!(scratch.static_ids.len(), 0);
        assert_eq!(scratch.dynamic, 1);
        assert_eq!(scratch.shapes().len(), 1);
    }

    #[test]
    fn unclassifiable_shapes_are_skipped() {
        let mut world = FixtureWorld::new();
        let id = world.add_box(BodyKind::Dynamic, Aabb::new(0., 1., 0., 1.));
        world.set_unclassified(id);
        let scratch = query(&world, Aabb::new(-5., 5., -5., 5.), false);
        // Still counted for sleep purposes; no geometry to aim at.
        assert_eq!(scratch.dynamic, 1);
        assert!(scratch.shapes().is_empty());
    }
}
