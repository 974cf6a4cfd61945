//! Tools for testing the light engine against a concrete collision world.
//!
//! Do not use. Everything in this module is unstable and may be removed; it is
//! `pub` only so that this crate's own test suites can share it.

use core::cell::Cell;

use hashbrown::HashMap;

use crate::math::{
    Aabb, WorldAngle, WorldCoord, WorldPoint, WorldVector, line_circle_intersections,
    segment_segment_intersection,
};
use crate::world::{
    BodyId, BodyKind, ContactFilter, Occluder, OccluderId, OccluderWorld, QueryFlow, RayFlow,
    RayHit, ShapeKind,
};

// -------------------------------------------------------------------------------------------------

/// An [`OccluderWorld`] holding plain geometric fixtures, with no physics engine
/// behind it.
///
/// Besides implementing the queries, it counts them ([`FixtureWorld::query_count()`],
/// [`FixtureWorld::raycast_count()`]) so tests can verify that caching and sleeping
/// actually avoid work. Chains are reported to broad-phase queries once per
/// overlapping segment, like a real broad phase with one proxy per segment would
/// report them, which exercises callers' deduplication.
#[derive(Debug, Default)]
pub struct FixtureWorld {
    fixtures: Vec<FixtureData>,
    bodies: HashMap<BodyId, (WorldPoint, WorldAngle)>,
    next_id: u64,
    query_count: Cell<usize>,
    raycast_count: Cell<usize>,
}

#[derive(Debug)]
struct FixtureData {
    id: OccluderId,
    body: BodyId,
    body_kind: BodyKind,
    sensor: bool,
    /// When false, `shape_kind()` reports [`None`], as a provider that cannot
    /// classify the shape would.
    classified: bool,
    filter: ContactFilter,
    geometry: Geometry,
}

#[derive(Debug)]
enum Geometry {
    Circle { center: WorldPoint, radius: WorldCoord },
    Polygon(Vec<WorldPoint>),
    Chain(Vec<WorldPoint>),
    Edge([WorldPoint; 2]),
}

impl FixtureWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a circular fixture and returns its id.
    pub fn add_circle(
        &mut self,
        body_kind: BodyKind,
        center: WorldPoint,
        radius: WorldCoord,
    ) -> OccluderId {
        self.add(body_kind, Geometry::Circle { center, radius })
    }

    /// Adds a closed polygon fixture and returns its id.
    pub fn add_polygon(
        &mut self,
        body_kind: BodyKind,
        vertices: impl IntoIterator<Item = WorldPoint>,
    ) -> OccluderId {
        self.add(body_kind, Geometry::Polygon(vertices.into_iter().collect()))
    }

    /// Adds an axis-aligned rectangle (as a polygon fixture) and returns its id.
    pub fn add_box(&mut self, body_kind: BodyKind, bounds: Aabb) -> OccluderId {
        let (l, u) = (bounds.lower_bounds(), bounds.upper_bounds());
        self.add_polygon(
            body_kind,
            [
                l,
                WorldPoint::new(u.x, l.y),
                u,
                WorldPoint::new(l.x, u.y),
            ],
        )
    }

    /// Adds an open polyline fixture and returns its id.
    pub fn add_chain(
        &mut self,
        body_kind: BodyKind,
        vertices: impl IntoIterator<Item = WorldPoint>,
    ) -> OccluderId {
        self.add(body_kind, Geometry::Chain(vertices.into_iter().collect()))
    }

    /// Adds a single-segment fixture and returns its id.
    pub fn add_edge(&mut self, body_kind: BodyKind, a: WorldPoint, b: WorldPoint) -> OccluderId {
        self.add(body_kind, Geometry::Edge([a, b]))
    }

    fn add(&mut self, body_kind: BodyKind, geometry: Geometry) -> OccluderId {
        self.next_id += 1;
        let id = OccluderId(self.next_id);
        self.fixtures.push(FixtureData {
            id,
            // Each fixture gets a body of its own.
            body: BodyId(self.next_id),
            body_kind,
            sensor: false,
            classified: true,
            filter: ContactFilter::default(),
            geometry,
        });
        id
    }

    /// Removes the fixture, returning whether it existed.
    pub fn remove(&mut self, id: OccluderId) -> bool {
        let before = self.fixtures.len();
        self.fixtures.retain(|f| f.id != id);
        self.fixtures.len() != before
    }

    /// Translates the fixture's geometry.
    ///
    /// Panics if the fixture does not exist.
    pub fn translate(&mut self, id: OccluderId, offset: WorldVector) {
        match &mut self.fixture_mut(id).geometry {
            Geometry::Circle { center, .. } => *center += offset,
            Geometry::Polygon(vertices) | Geometry::Chain(vertices) => {
                for v in vertices {
                    *v += offset;
                }
            }
            Geometry::Edge(points) => {
                for p in points {
                    *p += offset;
                }
            }
        }
    }

    /// Replaces the fixture's contact filter.
    pub fn set_filter(&mut self, id: OccluderId, filter: ContactFilter) {
        self.fixture_mut(id).filter = filter;
    }

    /// Marks the fixture as a sensor.
    pub fn set_sensor(&mut self, id: OccluderId, sensor: bool) {
        self.fixture_mut(id).sensor = sensor;
    }

    /// Makes the fixture report an unclassifiable shape kind while keeping its
    /// geometry solid to raycasts.
    pub fn set_unclassified(&mut self, id: OccluderId) {
        self.fixture_mut(id).classified = false;
    }

    /// The body the fixture belongs to.
    pub fn body_of(&self, id: OccluderId) -> BodyId {
        self.fixtures
            .iter()
            .find(|f| f.id == id)
            .unwrap_or_else(|| panic!("no fixture {id:?}"))
            .body
    }

    /// Reassigns the fixture to the given body.
    pub fn set_body(&mut self, id: OccluderId, body: BodyId) {
        self.fixture_mut(id).body = body;
    }

    /// Sets the pose [`OccluderWorld::body_transform()`] reports for `body`.
    pub fn set_body_pose(&mut self, body: BodyId, position: WorldPoint, angle: WorldAngle) {
        self.bodies.insert(body, (position, angle));
    }

    fn fixture_mut(&mut self, id: OccluderId) -> &mut FixtureData {
        self.fixtures
            .iter_mut()
            .find(|f| f.id == id)
            .unwrap_or_else(|| panic!("no fixture {id:?}"))
    }

    /// Number of [`OccluderWorld::query_bounds()`] calls made so far.
    pub fn query_count(&self) -> usize {
        self.query_count.get()
    }

    /// Number of [`OccluderWorld::cast_ray()`] calls made so far.
    pub fn raycast_count(&self) -> usize {
        self.raycast_count.get()
    }

    pub fn reset_counters(&self) {
        self.query_count.set(0);
        self.raycast_count.set(0);
    }
}

// -------------------------------------------------------------------------------------------------

impl OccluderWorld for FixtureWorld {
    fn query_bounds(&self, bounds: Aabb, visitor: &mut dyn FnMut(&dyn Occluder) -> QueryFlow) {
        self.query_count.set(self.query_count.get() + 1);
        for fixture in &self.fixtures {
            let report_count = match &fixture.geometry {
                Geometry::Chain(vertices) => vertices
                    .windows(2)
                    .filter(|seg| {
                        Aabb::from_points(seg.iter().copied())
                            .is_some_and(|seg_bounds| seg_bounds.intersects(bounds))
                    })
                    .count(),
                _ => usize::from(
                    fixture
                        .bounds()
                        .is_some_and(|shape_bounds| shape_bounds.intersects(bounds)),
                ),
            };
            for _ in 0..report_count {
                if visitor(fixture) == QueryFlow::Stop {
                    return;
                }
            }
        }
    }

    fn cast_ray(
        &self,
        from: WorldPoint,
        to: WorldPoint,
        visitor: &mut dyn FnMut(RayHit<'_>) -> RayFlow,
    ) {
        self.raycast_count.set(self.raycast_count.get() + 1);
        let mut clip = 1.0;
        for fixture in &self.fixtures {
            let Some((point, fraction)) = fixture.nearest_hit(from, to) else {
                continue;
            };
            if fraction > clip {
                continue;
            }
            match visitor(RayHit {
                occluder: fixture,
                point,
                fraction,
            }) {
                RayFlow::Ignore | RayFlow::Continue => {}
                RayFlow::Stop => return,
                RayFlow::ClipTo(fraction) => clip = fraction,
            }
        }
    }

    fn body_transform(&self, body: BodyId) -> Option<(WorldPoint, WorldAngle)> {
        self.bodies.get(&body).copied()
    }
}

impl Occluder for FixtureData {
    fn id(&self) -> OccluderId {
        self.id
    }

    fn body(&self) -> BodyId {
        self.body
    }

    fn body_kind(&self) -> BodyKind {
        self.body_kind
    }

    fn is_sensor(&self) -> bool {
        self.sensor
    }

    fn filter(&self) -> ContactFilter {
        self.filter
    }

    fn shape_kind(&self) -> Option<ShapeKind> {
        if !self.classified {
            return None;
        }
        Some(match self.geometry {
            Geometry::Circle { .. } => ShapeKind::Circle,
            Geometry::Polygon(_) => ShapeKind::Polygon,
            Geometry::Chain(_) => ShapeKind::Chain,
            Geometry::Edge(_) => ShapeKind::Edge,
        })
    }

    fn circle(&self) -> Option<(WorldPoint, WorldCoord)> {
        match self.geometry {
            Geometry::Circle { center, radius } => Some((center, radius)),
            _ => None,
        }
    }

    fn vertex_count(&self) -> usize {
        match &self.geometry {
            Geometry::Circle { .. } => 0,
            Geometry::Polygon(vertices) | Geometry::Chain(vertices) => vertices.len(),
            Geometry::Edge(_) => 2,
        }
    }

    fn world_vertex(&self, index: usize) -> WorldPoint {
        match &self.geometry {
            Geometry::Circle { .. } => panic!("circles have no vertices"),
            Geometry::Polygon(vertices) | Geometry::Chain(vertices) => vertices[index],
            Geometry::Edge(points) => points[index],
        }
    }
}

impl FixtureData {
    fn bounds(&self) -> Option<Aabb> {
        match &self.geometry {
            Geometry::Circle { center, radius } => {
                Some(Aabb::centered(*center, WorldVector::new(*radius, *radius)))
            }
            Geometry::Polygon(vertices) | Geometry::Chain(vertices) => {
                Aabb::from_points(vertices.iter().copied())
            }
            Geometry::Edge(points) => Aabb::from_points(points.iter().copied()),
        }
    }

    /// This fixture's nearest intersection with the segment `from..to`, as
    /// `(point, fraction)`.
    fn nearest_hit(&self, from: WorldPoint, to: WorldPoint) -> Option<(WorldPoint, WorldCoord)> {
        match &self.geometry {
            Geometry::Circle { center, radius } => {
                let d = to - from;
                let length2 = d.square_length();
                line_circle_intersections(*center, *radius, from, to)
                    .into_iter()
                    .filter_map(|p| {
                        let fraction = (p - from).dot(d) / length2;
                        (0.0..=1.0).contains(&fraction).then_some((p, fraction))
                    })
                    .min_by(|(_, f1), (_, f2)| f1.total_cmp(f2))
            }
            Geometry::Polygon(vertices) => nearest_segment_hit(
                from,
                to,
                vertices.len(),
                |i| (vertices[i], vertices[(i + 1) % vertices.len()]),
            ),
            Geometry::Chain(vertices) => nearest_segment_hit(
                from,
                to,
                vertices.len().saturating_sub(1),
                |i| (vertices[i], vertices[i + 1]),
            ),
            Geometry::Edge(points) => {
                nearest_segment_hit(from, to, 1, |_| (points[0], points[1]))
            }
        }
    }
}

fn nearest_segment_hit(
    from: WorldPoint,
    to: WorldPoint,
    segment_count: usize,
    segment: impl Fn(usize) -> (WorldPoint, WorldPoint),
) -> Option<(WorldPoint, WorldCoord)> {
    let d = to - from;
    let length2 = d.square_length();
    (0..segment_count)
        .filter_map(|i| {
            let (a, b) = segment(i);
            let p = segment_segment_intersection(from, to, a, b)?;
            Some((p, (p - from).dot(d) / length2))
        })
        .min_by(|(_, f1), (_, f2)| f1.total_cmp(f2))
}

// -------------------------------------------------------------------------------------------------
