//! Silhouette-driven radial lights: [`PointLight`] and [`ConeLight`].

use core::f32::consts::{PI, TAU};
use core::iter;
use core::ops::Range;

use euclid::vec2;

use crate::light::{LightCommon, POSITION_EPSILON, RayCount, UpdateContext, build_fan_meshes};
use crate::math::{
    Aabb, LightColor, VectorExt as _, WorldAngle, WorldCoord, WorldPoint,
    line_circle_intersections, nearest_point_on_segment, tangent_points,
};
use crate::mesh::LightMesh;
use crate::ray::{Ray, RayFan, cone_sorter_angle, point_in_polygon};
use crate::world::OccluderId;

use super::{GatheredShape, OFFSET_SIZE, gather_or_sleep};

// -------------------------------------------------------------------------------------------------

/// State and update steps shared by the two silhouette-driven radial lights.
#[derive(Clone, Debug)]
struct SilhouetteCore {
    position: WorldPoint,
    count: RayCount,
    rays: RayFan,
    /// World-space targets of the base fan, rebuilt when the light is dirty.
    targets: Vec<WorldPoint>,
    /// Bounds of the base fan; both the silhouette query and culling use this.
    aabb: Aabb,
    last_static: Vec<OccluderId>,
    sleeping: bool,
    allow_sleeping: bool,
    ignore_static_bodies: bool,
    lit: LightMesh,
    soft: LightMesh,
}

impl SilhouetteCore {
    fn new(count: RayCount, position: WorldPoint) -> Self {
        let budget = count.budget();
        Self {
            position,
            count,
            rays: RayFan::new(budget),
            targets: Vec::with_capacity(count.base()),
            aabb: Aabb::ZERO,
            last_static: Vec::new(),
            sleeping: false,
            allow_sleeping: true,
            ignore_static_bodies: false,
            // One anchor plus a full fan and its closing ray.
            lit: LightMesh::with_capacity(budget + 2),
            soft: LightMesh::with_capacity((budget + 1) * 2),
        }
    }

    fn resize(&mut self, common: &mut LightCommon, count: RayCount) {
        let budget = count.budget();
        self.count = count;
        self.rays.resize_budget(budget);
        self.targets = Vec::with_capacity(count.base());
        self.lit.resize_capacity(budget + 2);
        self.soft.resize_capacity((budget + 1) * 2);
        common.dirty = true;
    }

    fn move_to(&mut self, common: &mut LightCommon, position: WorldPoint) {
        if (position.x - self.position.x).abs() > POSITION_EPSILON
            || (position.y - self.position.y).abs() > POSITION_EPSILON
        {
            self.position = position;
            common.dirty = true;
        }
    }

    /// Recomputes the base targets and the query bounds from the given aim
    /// angles (radians).
    fn retarget(&mut self, distance: WorldCoord, angles: impl Iterator<Item = WorldCoord>) {
        self.targets.clear();
        let mut bounds = Aabb::centered(self.position, vec2(0., 0.));
        for angle in angles {
            let (sin, cos) = angle.sin_cos();
            let target = self.position + vec2(cos, sin) * distance;
            self.targets.push(target);
            bounds = bounds.union_point(target);
        }
        self.aabb = bounds.expand(distance * 0.01);
    }

    /// Records and returns whether the light lies wholly outside the view.
    fn cull(&self, common: &mut LightCommon, ctx: &UpdateContext<'_>) -> bool {
        common.culled = ctx.culling && !ctx.force && !self.aabb.intersects(ctx.view);
        common.culled
    }

    /// Queries the world around the light, unless it is x-ray and casts no
    /// rays at all. Sets [`SilhouetteCore::sleeping`].
    fn gather(&mut self, common: &LightCommon, ctx: &mut UpdateContext<'_>) {
        if common.xray {
            self.sleeping = false;
            return;
        }
        self.sleeping = gather_or_sleep(
            ctx,
            self.aabb,
            self.ignore_static_bodies,
            self.allow_sleeping,
            common.dirty,
            &mut self.last_static,
        );
    }

    /// Refills the fan with the base rays, unobstructed.
    fn aim_base_rays(&mut self) {
        self.rays.clear();
        for (i, &target) in self.targets.iter().enumerate() {
            self.rays.push(Ray::aimed(i as u32, self.position, target));
        }
        self.rays.set_full_window();
    }

    /// Aims extra rays at the features of every gathered shape, within the ray
    /// budget. With `bounded`, candidates outside the light's own bounds are
    /// rejected (cone lights, whose bounds cover only their wedge).
    fn aim_at_features(&mut self, ctx: &UpdateContext<'_>, distance: WorldCoord, bounded: bool) {
        for shape in ctx.scratch.shapes() {
            match *shape {
                GatheredShape::Circle { center, radius } => {
                    let reach = distance + radius;
                    if (center - self.position).square_length() > reach * reach {
                        continue;
                    }
                    // Most circles need the center ray and both tangent pairs.
                    if self.rays.len() + 5 >= self.rays.budget() {
                        continue;
                    }
                    self.aim_at(ctx, distance, center, bounded);
                    if let Some(tangents) = tangent_points(center, radius, self.position) {
                        for tangent in tangents {
                            self.aim_straddling(ctx, distance, tangent, bounded);
                        }
                    }
                }
                GatheredShape::Outline { ref vertices } => {
                    self.walk_outline(ctx, ctx.scratch.outline(vertices.clone()), distance, bounded);
                }
            }
        }
    }

    /// One outline's features: each corner in range, straddled, and the points
    /// where each edge crosses the reach circle, aimed at dead on.
    fn walk_outline(
        &mut self,
        ctx: &UpdateContext<'_>,
        outline: &[WorldPoint],
        distance: WorldCoord,
        bounded: bool,
    ) {
        let dst2 = distance * distance;
        let Some(&last) = outline.last() else {
            return;
        };
        let mut prev = last;
        if (prev - self.position).square_length() <= dst2 {
            if self.rays.len() + 2 >= self.rays.budget() {
                return;
            }
            self.aim_straddling(ctx, distance, prev, bounded);
        }
        for &vertex in outline {
            let crossings = line_circle_intersections(self.position, distance, prev, vertex);
            if !crossings.is_empty() && self.rays.len() + crossings.len() >= self.rays.budget() {
                return;
            }
            for crossing in crossings {
                // The intersections are with the infinite line; keep only
                // those on the edge itself (a little margin for floats).
                if (crossing - self.position).square_length() <= dst2 + 0.001
                    && (nearest_point_on_segment(prev, vertex, crossing) - crossing)
                        .square_length()
                        <= 0.01
                {
                    self.aim_at(ctx, distance, crossing, bounded);
                }
            }
            if (vertex - self.position).square_length() <= dst2 {
                if self.rays.len() + 2 >= self.rays.budget() {
                    return;
                }
                self.aim_straddling(ctx, distance, vertex, bounded);
            }
            prev = vertex;
        }
    }

    /// Aims one ray through `src`, re-projected out to the light's reach.
    fn aim_at(&mut self, ctx: &UpdateContext<'_>, distance: WorldCoord, src: WorldPoint, bounded: bool) {
        let aim = (src - self.position).normalize_or_zero();
        self.try_push(ctx, self.position + aim * distance, bounded);
    }

    /// Aims a pair of rays passing just either side of `src`, so that one
    /// strikes the feature and the other slips past it.
    fn aim_straddling(
        &mut self,
        ctx: &UpdateContext<'_>,
        distance: WorldCoord,
        src: WorldPoint,
        bounded: bool,
    ) {
        let towards = src - self.position;
        let jitter = towards.perp().normalize_or_zero() * OFFSET_SIZE;
        for side in [1.0, -1.0] {
            let aim = (towards + jitter * side).normalize_or_zero();
            self.try_push(ctx, self.position + aim * distance, bounded);
        }
    }

    /// Admits a candidate target unless it is out of bounds, indistinguishable
    /// from the light position (a degenerate ray), or a duplicate.
    fn try_push(&mut self, ctx: &UpdateContext<'_>, target: WorldPoint, bounded: bool) {
        if bounded && !self.aabb.contains(target) {
            return;
        }
        let eps = ctx.dedup_epsilon;
        if (target.x - self.position.x).abs() <= eps && (target.y - self.position.y).abs() <= eps {
            return;
        }
        if self.rays.rays().iter().any(|ray| ray.target == target) {
            return;
        }
        self.rays
            .push(Ray::aimed(self.rays.len() as u32, self.position, target));
    }

    fn cast_all(&mut self, common: &LightCommon, ctx: &UpdateContext<'_>) {
        let policy = common.cast_policy(ctx);
        for ray in self.rays.rays_mut() {
            ray.cast(ctx.world, policy);
        }
    }

    fn build_meshes(&mut self, common: &LightCommon) {
        build_fan_meshes(
            &mut self.lit,
            &mut self.soft,
            self.position,
            self.rays.windowed(),
            common,
        );
    }

    /// Whether `point` is inside the lit polygon, or failing that, inside the
    /// soft fringe polygon. Both tests fail fast beyond the light's reach, so
    /// fringe that extends past the reach is not counted.
    fn contains(&self, common: &LightCommon, point: WorldPoint) -> bool {
        if (point - self.position).square_length() >= common.distance * common.distance {
            return false;
        }
        let rays = self.rays.windowed();
        if point_in_polygon(
            point,
            iter::once(self.position).chain(rays.iter().map(|ray| ray.hit)),
        ) {
            return true;
        }
        common.soft
            && !common.xray
            && point_in_polygon(
                point,
                iter::once(self.position).chain(rays.iter().map(|ray| {
                    let shade = 1.0 - ray.fraction;
                    ray.hit + vec2(ray.cos, ray.sin) * (common.soft_length * shade)
                })),
            )
    }
}

// -------------------------------------------------------------------------------------------------

/// A radial light that aims rays at the silhouettes of nearby occluders.
///
/// Constructed via [`Light::exact_point()`](crate::Light::exact_point).
#[derive(Clone, Debug)]
pub struct PointLight {
    common: LightCommon,
    core: SilhouetteCore,
}

impl PointLight {
    pub(crate) fn new(
        count: RayCount,
        color: LightColor,
        distance: WorldCoord,
        position: WorldPoint,
    ) -> Self {
        Self {
            common: LightCommon::new(color, distance, WorldAngle::zero()),
            core: SilhouetteCore::new(count, position),
        }
    }

    pub(crate) fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.common.refresh_distance(ctx.gamma_scale);
        if let Some((position, _)) = self.common.attachment_pose(ctx.world) {
            self.core.move_to(&mut self.common, position);
        }
        if self.common.dirty {
            self.refresh_geometry();
        }
        if self.core.cull(&mut self.common, ctx) {
            return;
        }
        if self.common.static_light && !self.common.dirty && !ctx.force {
            return;
        }
        self.core.gather(&self.common, ctx);
        if !self.core.sleeping {
            self.core.aim_base_rays();
            if !self.common.xray {
                self.core.aim_at_features(ctx, self.common.distance, false);
                self.core.cast_all(&self.common, ctx);
                self.core.rays.sort_radial(0.0);
            }
            self.core.rays.close_fan();
        }
        self.core.build_meshes(&self.common);
        self.core.rays.note_peak();
        self.common.dirty = false;
    }

    /// Evenly spaced full-circle aim angles; the first and last coincide so
    /// that the fan meets itself.
    fn refresh_geometry(&mut self) {
        let step = TAU / (self.core.count.base() - 1) as WorldCoord;
        self.core.retarget(
            self.common.distance,
            (0..self.core.count.base()).map(move |i| i as WorldCoord * step),
        );
    }

    pub(crate) fn contains(&self, point: WorldPoint) -> bool {
        self.core.contains(&self.common, point)
    }

    pub(crate) fn lit(&self) -> &LightMesh {
        &self.core.lit
    }

    pub(crate) fn soft(&self) -> &LightMesh {
        &self.core.soft
    }

    pub(crate) fn window(&self) -> Range<usize> {
        self.core.rays.window()
    }

    pub(crate) fn peak_rays(&self) -> usize {
        self.core.rays.peak()
    }

    pub(crate) fn set_ray_count(&mut self, count: RayCount) {
        self.core.resize(&mut self.common, count);
    }

    pub(crate) fn sleeping(&self) -> bool {
        self.core.sleeping
    }

    pub(crate) fn set_allow_sleeping(&mut self, allow: bool) {
        self.core.allow_sleeping = allow;
    }

    pub(crate) fn set_ignore_static_bodies(&mut self, ignore: bool) {
        self.core.ignore_static_bodies = ignore;
        self.common.dirty = true;
    }

    pub(crate) fn position(&self) -> WorldPoint {
        self.core.position
    }

    pub(crate) fn set_position(&mut self, position: WorldPoint) {
        self.core.move_to(&mut self.common, position);
    }

    pub(crate) fn common(&self) -> &LightCommon {
        &self.common
    }

    pub(crate) fn common_mut(&mut self) -> &mut LightCommon {
        &mut self.common
    }
}

// -------------------------------------------------------------------------------------------------

/// Widest half-angle the cone geometry uses; at the full 180° the two edges of
/// the fan would coincide and the window could not tell them apart.
const APERTURE_CAP: WorldCoord = PI * (179.5 / 180.0);

/// A silhouette-driven light restricted to an angular wedge.
///
/// Constructed via [`Light::exact_cone()`](crate::Light::exact_cone).
#[derive(Clone, Debug)]
pub struct ConeLight {
    common: LightCommon,
    core: SilhouetteCore,
    half_angle: WorldAngle,
}

impl ConeLight {
    pub(crate) fn new(
        count: RayCount,
        color: LightColor,
        distance: WorldCoord,
        position: WorldPoint,
        direction: WorldAngle,
        half_angle: WorldAngle,
    ) -> Self {
        Self {
            common: LightCommon::new(color, distance, direction),
            core: SilhouetteCore::new(count, position),
            half_angle: clamp_half_angle(half_angle),
        }
    }

    pub(crate) fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.common.refresh_distance(ctx.gamma_scale);
        if let Some((position, angle)) = self.common.attachment_pose(ctx.world) {
            self.core.move_to(&mut self.common, position);
            self.common.set_direction(angle);
        }
        if self.common.dirty {
            self.refresh_geometry();
        }
        if self.core.cull(&mut self.common, ctx) {
            return;
        }
        if self.common.static_light && !self.common.dirty && !ctx.force {
            return;
        }
        self.core.gather(&self.common, ctx);
        if !self.core.sleeping {
            self.core.aim_base_rays();
            if !self.common.xray {
                self.core.aim_at_features(ctx, self.common.distance, true);
                self.core.cast_all(&self.common, ctx);
                // The first base ray is aimed along one cone edge; start the
                // sweep there so the window scan finds both edges.
                let sorter = cone_sorter_angle(self.core.rays.rays()[0].angle);
                self.core.rays.sort_radial(sorter);
                self.core
                    .rays
                    .window_by_seq(0, (self.core.count.base() - 1) as u32);
            }
            if self.half_angle.radians > APERTURE_CAP {
                self.core.rays.close_window();
            }
        }
        self.core.build_meshes(&self.common);
        self.core.rays.note_peak();
        self.common.dirty = false;
    }

    /// Aim angles sweeping edge to edge: `direction + aperture` down to
    /// `direction - aperture`.
    fn refresh_geometry(&mut self) {
        let aperture = self.half_angle.radians.min(APERTURE_CAP);
        let direction = self.common.direction.radians;
        let base = self.core.count.base();
        let denom = (base - 1) as WorldCoord;
        self.core.retarget(
            self.common.distance,
            (0..base).map(move |i| direction + aperture - 2.0 * aperture * i as WorldCoord / denom),
        );
    }

    /// Half the angular extent of the cone, as last set, clamped to
    /// `0° ..= 180°`.
    #[inline]
    pub fn half_angle(&self) -> WorldAngle {
        self.half_angle
    }

    /// Sets the angular extent of the cone to `direction ± half_angle`,
    /// clamping to `0° ..= 180°`.
    pub fn set_half_angle(&mut self, half_angle: WorldAngle) {
        let half_angle = clamp_half_angle(half_angle);
        if half_angle != self.half_angle {
            self.half_angle = half_angle;
            self.common.dirty = true;
        }
    }

    pub(crate) fn contains(&self, point: WorldPoint) -> bool {
        self.core.contains(&self.common, point)
    }

    pub(crate) fn lit(&self) -> &LightMesh {
        &self.core.lit
    }

    pub(crate) fn soft(&self) -> &LightMesh {
        &self.core.soft
    }

    pub(crate) fn window(&self) -> Range<usize> {
        self.core.rays.window()
    }

    pub(crate) fn peak_rays(&self) -> usize {
        self.core.rays.peak()
    }

    pub(crate) fn set_ray_count(&mut self, count: RayCount) {
        self.core.resize(&mut self.common, count);
    }

    pub(crate) fn sleeping(&self) -> bool {
        self.core.sleeping
    }

    pub(crate) fn set_allow_sleeping(&mut self, allow: bool) {
        self.core.allow_sleeping = allow;
    }

    pub(crate) fn set_ignore_static_bodies(&mut self, ignore: bool) {
        self.core.ignore_static_bodies = ignore;
        self.common.dirty = true;
    }

    pub(crate) fn position(&self) -> WorldPoint {
        self.core.position
    }

    pub(crate) fn set_position(&mut self, position: WorldPoint) {
        self.core.move_to(&mut self.common, position);
    }

    pub(crate) fn common(&self) -> &LightCommon {
        &self.common
    }

    pub(crate) fn common_mut(&mut self) -> &mut LightCommon {
        &mut self.common
    }
}

fn clamp_half_angle(half_angle: WorldAngle) -> WorldAngle {
    WorldAngle::radians(half_angle.radians.clamp(0.0, PI))
}

// -------------------------------------------------------------------------------------------------
