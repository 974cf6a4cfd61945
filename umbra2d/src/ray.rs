//! Rays, and the per-light collections of rays from which meshes are built.

use core::cmp::Ordering;
use core::f32::consts::PI;
use core::ops::Range;

use crate::math::{NotNan, WorldCoord, WorldPoint, WorldVector};
use crate::world::{BodyId, ContactFilter, OccluderWorld, RayFlow};

// -------------------------------------------------------------------------------------------------

/// How the hits of one ray cast are to be filtered.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct CastPolicy {
    /// If present, occluders whose filter does not pass are treated as absent.
    pub filter: Option<ContactFilter>,
    /// If present, all shapes of this body are treated as absent.
    pub ignore_body: Option<BodyId>,
}

/// Finds the nearest acceptable hit of the ray `from..to`, if any.
///
/// Hits may be reported in any order; this keeps the minimum fraction rather
/// than trusting the world to honor [`RayFlow::ClipTo`] exactly.
pub(crate) fn cast_ray_closest(
    world: &dyn OccluderWorld,
    from: WorldPoint,
    to: WorldPoint,
    policy: CastPolicy,
) -> Option<(WorldPoint, WorldCoord)> {
    let mut best: Option<(WorldPoint, WorldCoord)> = None;
    world.cast_ray(from, to, &mut |hit| {
        if let Some(filter) = policy.filter
            && !filter.should_collide(hit.occluder.filter())
        {
            return RayFlow::Ignore;
        }
        if let Some(ignored) = policy.ignore_body
            && hit.occluder.body() == ignored
        {
            return RayFlow::Ignore;
        }
        if best.is_none_or(|(_, fraction)| hit.fraction < fraction) {
            best = Some((hit.point, hit.fraction));
        }
        RayFlow::ClipTo(hit.fraction)
    });
    best
}

// -------------------------------------------------------------------------------------------------

/// One ray of light: where it starts, where it would end unobstructed, and
/// where it actually ended.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Ray {
    /// Position in the fan at aim time. Sorting permutes the rays; window scans
    /// use this to find particular rays again afterwards.
    pub seq: u32,
    /// Source position of the ray.
    pub start: WorldPoint,
    /// Endpoint the ray would reach if nothing obstructed it.
    pub target: WorldPoint,
    /// Endpoint the ray actually reached; equals `target` when unobstructed.
    pub hit: WorldPoint,
    /// Position of `hit` along the ray: 0 at `start`, 1 at `target`.
    pub fraction: WorldCoord,
    /// `target - start`, cached for sorting.
    pub dir: WorldVector,
    /// Angle of `dir` in radians.
    pub angle: WorldCoord,
    /// Sine of `angle`, cached for soft-edge extrusion.
    pub sin: WorldCoord,
    /// Cosine of `angle`, cached for soft-edge extrusion.
    pub cos: WorldCoord,
    /// Ordering key for strip-shaped lights, which sort laterally rather than
    /// by angle. Unused (zero) in fan-shaped lights.
    pub offset: NotNan<WorldCoord>,
}

impl Ray {
    /// Constructs an unobstructed ray from `start` towards `target`.
    pub fn aimed(seq: u32, start: WorldPoint, target: WorldPoint) -> Self {
        let dir = target - start;
        let angle = dir.y.atan2(dir.x);
        let (sin, cos) = angle.sin_cos();
        Self {
            seq,
            start,
            target,
            hit: target,
            fraction: 1.0,
            dir,
            angle,
            sin,
            cos,
            offset: NotNan::from(0u8),
        }
    }

    /// Returns this ray with the strip ordering key replaced.
    #[must_use]
    pub fn with_offset(mut self, offset: NotNan<WorldCoord>) -> Self {
        self.offset = offset;
        self
    }

    /// Casts this ray through the world, recording the nearest hit (or the
    /// unobstructed endpoint if there is none).
    pub fn cast(&mut self, world: &dyn OccluderWorld, policy: CastPolicy) {
        match cast_ray_closest(world, self.start, self.target, policy) {
            Some((point, fraction)) => {
                self.hit = point;
                self.fraction = fraction;
            }
            None => {
                self.hit = self.target;
                self.fraction = 1.0;
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// A light's reusable collection of rays.
///
/// Lights refill this every update: aim, cast, sort, and finally select the
/// `window` of rays that actually contribute to the mesh. The capacity is one
/// more than `budget` so that a closing ray can always be added after the
/// budget of cast rays is spent.
#[derive(Clone, Debug)]
pub(crate) struct RayFan {
    rays: Vec<Ray>,
    budget: usize,
    window: Range<usize>,
    peak: usize,
}

impl RayFan {
    pub fn new(budget: usize) -> Self {
        Self {
            rays: Vec::with_capacity(budget + 1),
            budget,
            window: 0..0,
            peak: 0,
        }
    }

    /// Discards all rays in preparation for a fresh update.
    pub fn clear(&mut self) {
        self.rays.clear();
        self.window = 0..0;
    }

    /// Discards all rays and changes the budget, reallocating.
    pub fn resize_budget(&mut self, budget: usize) {
        self.rays = Vec::with_capacity(budget + 1);
        self.budget = budget;
        self.window = 0..0;
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn len(&self) -> usize {
        self.rays.len()
    }

    pub fn rays(&self) -> &[Ray] {
        &self.rays
    }

    pub fn rays_mut(&mut self) -> &mut [Ray] {
        &mut self.rays
    }

    /// Adds a ray, unless the budget is already spent.
    pub fn push(&mut self, ray: Ray) -> bool {
        if self.rays.len() >= self.budget {
            return false;
        }
        self.rays.push(ray);
        true
    }

    /// The contiguous range of sorted rays that contribute to the mesh.
    pub fn window(&self) -> Range<usize> {
        self.window.clone()
    }

    /// The rays within [`RayFan::window()`].
    pub fn windowed(&self) -> &[Ray] {
        &self.rays[self.window.clone()]
    }

    /// Makes the window cover every ray.
    pub fn set_full_window(&mut self) {
        self.window = 0..self.rays.len();
    }

    /// Sets the window to span from the ray aimed `first_seq`th to the ray
    /// aimed `last_seq`th, inclusive, in the current (sorted) order.
    pub fn window_by_seq(&mut self, first_seq: u32, last_seq: u32) {
        let start = self
            .rays
            .iter()
            .position(|ray| ray.seq == first_seq)
            .unwrap_or(0);
        let end = self.rays[start..]
            .iter()
            .position(|ray| ray.seq == last_seq)
            .map_or(self.rays.len(), |found| start + found + 1);
        self.window = start..end;
    }

    /// Appends a copy of the first ray and windows the whole fan, closing the
    /// loop of a full-circle light.
    pub fn close_fan(&mut self) {
        if let Some(&first) = self.rays.first() {
            debug_assert!(self.rays.len() < self.rays.capacity());
            self.rays.push(first);
        }
        self.window = 0..self.rays.len();
    }

    /// Inserts a copy of the window's first ray just past its last, for wide
    /// cones whose two edges nearly meet.
    pub fn close_window(&mut self) {
        debug_assert!(self.rays.len() < self.rays.capacity());
        let first = self.rays[self.window.start];
        self.rays.insert(self.window.end, first);
        self.window.end += 1;
    }

    /// Sorts the rays into a clockwise sweep.
    ///
    /// The sweep starts just counterclockwise of the direction a quarter turn
    /// counterclockwise from `sorter_angle` (radians), so a fan's first aimed
    /// ray stays first if `sorter_angle` is chosen slightly below its angle.
    /// Rays aimed in exactly the same direction order farthest first. The sort
    /// is stable, so ties keep their aim order.
    pub fn sort_radial(&mut self, sorter_angle: WorldCoord) {
        let (sorter_sin, sorter_cos) = (-sorter_angle).sin_cos();
        self.rays.sort_by(|r1, r2| {
            if r1.target == r2.target {
                return Ordering::Equal;
            }
            let x1 = r1.dir.x * sorter_cos - r1.dir.y * sorter_sin;
            let y1 = r1.dir.x * sorter_sin + r1.dir.y * sorter_cos;
            let x2 = r2.dir.x * sorter_cos - r2.dir.y * sorter_sin;
            let y2 = r2.dir.x * sorter_sin + r2.dir.y * sorter_cos;

            // The right half-plane of the rotated frame sorts before the left.
            if x1 >= 0.0 && x2 < 0.0 {
                return Ordering::Less;
            }
            if x1 < 0.0 && x2 >= 0.0 {
                return Ordering::Greater;
            }
            // On the dividing axis itself, up before down.
            if x1.abs() <= AXIS_EPSILON && x2.abs() <= AXIS_EPSILON && (y1 >= 0.0) != (y2 >= 0.0) {
                return if y1 >= 0.0 {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
            }
            // Clockwise within the half-plane.
            let det = x1 * y2 - x2 * y1;
            if det < 0.0 {
                return Ordering::Less;
            }
            if det > 0.0 {
                return Ordering::Greater;
            }
            // Same direction: farther first.
            let d1 = x1 * x1 + y1 * y1;
            let d2 = x2 * x2 + y2 * y2;
            d2.total_cmp(&d1)
        });
    }

    /// Sorts the rays by their strip ordering key, ascending. Stable.
    pub fn sort_by_offset(&mut self) {
        self.rays.sort_by_key(|ray| ray.offset);
    }

    /// Records the current window size in the high-water mark.
    pub fn note_peak(&mut self) {
        self.peak = self.peak.max(self.window.len());
    }

    /// The largest number of rays any single update has contributed to the
    /// mesh, for choosing ray budgets.
    pub fn peak(&self) -> usize {
        self.peak
    }
}

/// Sorting tolerance for rays lying on the dividing axis of the sweep.
const AXIS_EPSILON: WorldCoord = 1e-6;

/// The offset applied to the radial sort so that a cone's first ray, which its
/// construction aims along one edge of the cone, begins the sweep.
///
/// Slightly less than a quarter turn so that the first ray itself lands just
/// inside the starting half-plane rather than exactly on its boundary.
pub(crate) fn cone_sorter_angle(first_ray_angle: WorldCoord) -> WorldCoord {
    first_ray_angle - PI * 0.495
}

// -------------------------------------------------------------------------------------------------

/// Even-odd test of whether `point` lies inside the polygon traced by
/// `vertices` (implicitly closed). An empty polygon contains nothing.
pub(crate) fn point_in_polygon(
    point: WorldPoint,
    vertices: impl IntoIterator<Item = WorldPoint>,
) -> bool {
    fn crossing(point: WorldPoint, v1: WorldPoint, v2: WorldPoint) -> bool {
        (v1.y > point.y) != (v2.y > point.y)
            && point.x < (v2.x - v1.x) * (point.y - v1.y) / (v2.y - v1.y) + v1.x
    }

    let mut iter = vertices.into_iter();
    let Some(first) = iter.next() else {
        return false;
    };
    let mut inside = false;
    let mut prev = first;
    for vertex in iter {
        if crossing(point, prev, vertex) {
            inside = !inside;
        }
        prev = vertex;
    }
    if crossing(point, prev, first) {
        inside = !inside;
    }
    inside
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{BodyKind, Occluder, OccluderId, OccluderWorld, RayHit, ShapeKind};
    use euclid::point2;

    fn fan_of_angles(degrees: &[f32]) -> RayFan {
        let origin = point2(0., 0.);
        let mut fan = RayFan::new(degrees.len());
        for (i, &deg) in degrees.iter().enumerate() {
            let angle = deg.to_radians();
            let target = origin + WorldVector::new(angle.cos(), angle.sin()) * 10.0;
            assert!(fan.push(Ray::aimed(i as u32, origin, target)));
        }
        fan
    }

    fn seq_order(fan: &RayFan) -> Vec<u32> {
        fan.rays().iter().map(|ray| ray.seq).collect()
    }

    #[test]
    fn radial_sort_sweeps_clockwise_from_top() {
        let mut fan = fan_of_angles(&[10., 200., 80., -80., 170., -10.]);
        fan.sort_radial(0.0);
        // Clockwise starting at +90°: 80, 10, -10, -80, then the left
        // half-plane: 200 (= -160) before 170.
        assert_eq!(seq_order(&fan), vec![2, 0, 5, 3, 1, 4]);
    }

    #[test]
    fn radial_sort_puts_farther_ray_first_on_ties() {
        let origin = point2(0., 0.);
        let mut fan = RayFan::new(3);
        fan.push(Ray::aimed(0, origin, point2(1., 1.)));
        fan.push(Ray::aimed(1, origin, point2(3., 3.)));
        fan.push(Ray::aimed(2, origin, point2(2., 2.)));
        fan.sort_radial(0.0);
        assert_eq!(seq_order(&fan), vec![1, 2, 0]);
    }

    #[test]
    fn cone_window_excludes_stray_candidates() {
        // Five "cone edge to edge" rays and then two candidates, one inside
        // the angular range and one outside it.
        let mut fan = fan_of_angles(&[30., 15., 0., -15., -30., 5., 40.]);
        let sorter = cone_sorter_angle(fan.rays()[0].angle);
        fan.sort_radial(sorter);
        assert_eq!(seq_order(&fan), vec![0, 1, 5, 2, 3, 4, 6]);
        fan.window_by_seq(0, 4);
        assert_eq!(fan.window(), 0..6);
        assert_eq!(fan.windowed().len(), 6);

        fan.close_window();
        assert_eq!(fan.window(), 0..7);
        assert_eq!(fan.windowed()[6].seq, 0);
        fan.note_peak();
        assert_eq!(fan.peak(), 7);
    }

    #[test]
    fn close_fan_duplicates_first_ray() {
        let mut fan = fan_of_angles(&[0., 120., 240.]);
        fan.sort_radial(0.0);
        fan.close_fan();
        assert_eq!(fan.len(), 4);
        assert_eq!(fan.windowed()[0].target, fan.windowed()[3].target);
    }

    #[test]
    fn push_respects_budget() {
        let mut fan = fan_of_angles(&[0., 90.]);
        assert_eq!(fan.budget(), 2);
        assert!(!fan.push(Ray::aimed(9, point2(0., 0.), point2(1., 0.))));
        assert_eq!(fan.len(), 2);
    }

    #[test]
    fn offset_sort_is_ascending() {
        let origin = point2(0., 0.);
        let mut fan = RayFan::new(3);
        for (seq, offset) in [(0u32, 0.5f32), (1, -1.0), (2, 0.0)] {
            fan.push(
                Ray::aimed(seq, origin, point2(1., 0.)).with_offset(NotNan::new(offset).unwrap()),
            );
        }
        fan.sort_by_offset();
        assert_eq!(seq_order(&fan), vec![1, 2, 0]);
    }

    #[test]
    fn polygon_containment_is_even_odd() {
        let square = [
            point2(0., 0.),
            point2(2., 0.),
            point2(2., 2.),
            point2(0., 2.),
        ];
        assert!(point_in_polygon(point2(1., 1.), square));
        assert!(!point_in_polygon(point2(3., 1.), square));
        assert!(!point_in_polygon(point2(-0.001, 1.), square));
        assert!(!point_in_polygon(point2(1., 1.), []));
    }

    // ---------------------------------------------------------------------------------------------
    // A scripted world for exercising the cast visitor protocol.

    #[derive(Debug)]
    struct ScriptedShape {
        body: BodyId,
        filter: ContactFilter,
    }

    impl Occluder for ScriptedShape {
        fn id(&self) -> OccluderId {
            OccluderId(self.body.0)
        }
        fn body(&self) -> BodyId {
            self.body
        }
        fn body_kind(&self) -> BodyKind {
            BodyKind::Static
        }
        fn filter(&self) -> ContactFilter {
            self.filter
        }
        fn shape_kind(&self) -> Option<ShapeKind> {
            Some(ShapeKind::Circle)
        }
        fn circle(&self) -> Option<(WorldPoint, WorldCoord)> {
            None
        }
        fn vertex_count(&self) -> usize {
            0
        }
        fn world_vertex(&self, _: usize) -> WorldPoint {
            unreachable!()
        }
    }

    /// Reports scripted hits, deliberately out of distance order.
    #[derive(Debug)]
    struct ScriptedWorld(Vec<(ScriptedShape, WorldCoord)>);

    impl OccluderWorld for ScriptedWorld {
        fn query_bounds(
            &self,
            _: crate::math::Aabb,
            _: &mut dyn FnMut(&dyn Occluder) -> crate::world::QueryFlow,
        ) {
        }

        fn cast_ray(
            &self,
            from: WorldPoint,
            to: WorldPoint,
            visitor: &mut dyn FnMut(RayHit<'_>) -> RayFlow,
        ) {
            for (shape, fraction) in &self.0 {
                let hit = RayHit {
                    occluder: shape,
                    point: from.lerp(to, *fraction),
                    fraction: *fraction,
                };
                if visitor(hit) == RayFlow::Stop {
                    return;
                }
            }
        }

        fn body_transform(&self, _: BodyId) -> Option<(WorldPoint, crate::math::WorldAngle)> {
            None
        }
    }

    fn shape(body: u64) -> ScriptedShape {
        ScriptedShape {
            body: BodyId(body),
            filter: ContactFilter::default(),
        }
    }

    #[test]
    fn cast_keeps_nearest_of_unordered_hits() {
        let world = ScriptedWorld(vec![(shape(1), 0.75), (shape(2), 0.25), (shape(3), 0.5)]);
        let (point, fraction) = cast_ray_closest(
            &world,
            point2(0., 0.),
            point2(4., 0.),
            CastPolicy::default(),
        )
        .unwrap();
        assert_eq!(fraction, 0.25);
        assert_eq!(point, point2(1., 0.));
    }

    #[test]
    fn cast_skips_ignored_body_and_filtered_shapes() {
        let mut world = ScriptedWorld(vec![(shape(1), 0.25), (shape(2), 0.5)]);
        let policy = CastPolicy {
            ignore_body: Some(BodyId(1)),
            ..CastPolicy::default()
        };
        let (_, fraction) =
            cast_ray_closest(&world, point2(0., 0.), point2(4., 0.), policy).unwrap();
        assert_eq!(fraction, 0.5);

        // Shape 1 moves to a category the light's filter does not accept.
        world.0[0].0.filter.category = 0x0004;
        let policy = CastPolicy {
            filter: Some(ContactFilter {
                category: 0x0001,
                mask: 0x0002,
                group: 0,
            }),
            ..CastPolicy::default()
        };
        assert_eq!(
            cast_ray_closest(&world, point2(0., 0.), point2(4., 0.), policy),
            None,
        );
    }

    #[test]
    fn cast_misses_in_empty_world() {
        let world = crate::world::EmptyWorld;
        assert_eq!(
            cast_ray_closest(
                &world,
                point2(0., 0.),
                point2(4., 0.),
                CastPolicy::default()
            ),
            None
        );
    }

    #[test]
    fn ray_cast_records_hit_or_full_length() {
        let world = ScriptedWorld(vec![(shape(1), 0.5)]);
        let mut ray = Ray::aimed(0, point2(0., 0.), point2(4., 0.));
        ray.cast(&world, CastPolicy::default());
        assert_eq!(ray.hit, point2(2., 0.));
        assert_eq!(ray.fraction, 0.5);

        ray.cast(&crate::world::EmptyWorld, CastPolicy::default());
        assert_eq!(ray.hit, ray.target);
        assert_eq!(ray.fraction, 1.0);
    }
}
