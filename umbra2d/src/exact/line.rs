//! [`LineLight`]: silhouette-driven light emitted from a baseline segment.

use core::ops::Range;

use euclid::vec2;

use crate::light::{LightCommon, POSITION_EPSILON, RayCount, UpdateContext};
use crate::math::{
    Aabb, LightColor, NotNan, PackedColor, VectorExt as _, WorldAngle, WorldCoord, WorldPoint,
    WorldVector, line_line_intersection, point_line_side, segment_segment_intersection,
};
use crate::mesh::LightMesh;
use crate::ray::{Ray, RayFan, point_in_polygon};
use crate::world::OccluderId;

use super::{GatheredShape, OFFSET_SIZE, gather_or_sleep};

// -------------------------------------------------------------------------------------------------

/// Narrowest half-width the geometry tolerates; thinner baselines degenerate
/// into a point and the projections lose precision.
const MIN_HALF_WIDTH: WorldCoord = 0.1;

/// End scales this close to 1 use the parallel-ray candidate construction; the
/// angled construction divides by the spread and is unstable near parallel.
const STRAIGHT_EPSILON: WorldCoord = 1e-6;

// -------------------------------------------------------------------------------------------------

/// Light emitted from a baseline segment, a quarter turn counterclockwise from
/// its direction, with rays aimed at the silhouettes of nearby occluders.
///
/// The lit region is the strip swept from the baseline out to `distance`, with
/// three shape parameters beyond that:
///
/// * [`end_scale`](LineLight::set_end_scale) widens (>1) or narrows (<1) the
///   far edge relative to the baseline; 0 brings it to a point.
/// * [`center_offset`](LineLight::set_center_offset) slides the far edge
///   sideways along the baseline direction.
/// * [`end_color_scale`](LineLight::set_end_color_scale) controls how much the
///   light fades towards the far edge: 1 fades to nothing, 0 not at all.
///
/// Constructed via [`Light::exact_line()`](crate::Light::exact_line).
#[derive(Clone, Debug)]
pub struct LineLight {
    common: LightCommon,
    position: WorldPoint,
    half_width: WorldCoord,
    end_scale: WorldCoord,
    center_offset: WorldCoord,
    end_color_scale: WorldCoord,
    count: RayCount,
    rays: RayFan,
    /// World-space baseline points of the base rays, rebuilt when dirty.
    starts: Vec<WorldPoint>,
    /// World-space far points of the base rays.
    targets: Vec<WorldPoint>,
    /// Center of the far edge; with `far_side`, spans the line candidate ends
    /// are projected onto.
    far_center: WorldPoint,
    far_side: WorldPoint,
    aabb: Aabb,
    /// The exact trapezoid of the lit region, for candidate bounds tests.
    quad: [WorldPoint; 4],
    /// Accept candidates by the AABB alone; the whole-view directional light
    /// does this, since everything in view is fair game.
    aabb_bounds_only: bool,
    /// When false, a body attachment filters the rays (`ignore_attached_body`)
    /// but does not place the light; the directional and chain lights place
    /// their inner lines themselves.
    follow_attachment: bool,
    last_static: Vec<OccluderId>,
    sleeping: bool,
    allow_sleeping: bool,
    ignore_static_bodies: bool,
    lit: LightMesh,
    soft: LightMesh,
}

impl LineLight {
    pub(crate) fn new(
        count: RayCount,
        color: LightColor,
        distance: WorldCoord,
        position: WorldPoint,
        direction: WorldAngle,
        width: WorldCoord,
    ) -> Self {
        let budget = count.budget();
        Self {
            common: LightCommon::new(color, distance, direction),
            position,
            half_width: (width * 0.5).max(MIN_HALF_WIDTH),
            end_scale: 1.0,
            center_offset: 0.0,
            end_color_scale: 1.0,
            count,
            rays: RayFan::new(budget),
            starts: Vec::with_capacity(count.base()),
            targets: Vec::with_capacity(count.base()),
            far_center: position,
            far_side: position,
            aabb: Aabb::ZERO,
            quad: [position; 4],
            aabb_bounds_only: false,
            follow_attachment: true,
            last_static: Vec::new(),
            sleeping: false,
            allow_sleeping: true,
            ignore_static_bodies: false,
            lit: LightMesh::with_capacity(budget * 2),
            soft: LightMesh::with_capacity(budget * 2),
        }
    }

    pub(crate) fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.common.refresh_distance(ctx.gamma_scale);
        if self.follow_attachment
            && let Some((position, _)) = self.common.attachment_pose(ctx.world)
        {
            self.move_to(position);
        }
        if self.common.dirty {
            self.refresh_geometry();
        }
        self.common.culled = ctx.culling && !ctx.force && !self.aabb.intersects(ctx.view);
        if self.common.culled {
            return;
        }
        if self.common.static_light && !self.common.dirty && !ctx.force {
            return;
        }
        if self.common.xray {
            self.sleeping = false;
        } else {
            self.sleeping = gather_or_sleep(
                ctx,
                self.aabb,
                self.ignore_static_bodies,
                self.allow_sleeping,
                self.common.dirty,
                &mut self.last_static,
            );
        }
        if !self.sleeping {
            self.aim_base_rays();
            if !self.common.xray {
                self.aim_at_features(ctx);
                self.cast_all(ctx);
                self.rays.sort_by_offset();
            }
            self.rays.set_full_window();
        }
        self.build_meshes();
        self.rays.note_peak();
        self.common.dirty = false;
    }

    // --- Geometry --------------------------------------------------------------------------------

    /// Rebuilds the base ray tables, the projection lines, the query bounds,
    /// and the bounds trapezoid from the current parameters.
    fn refresh_geometry(&mut self) {
        let (sin, cos) = self.common.direction.radians.sin_cos();
        let along = vec2(cos, sin);
        let emit = along.perp();
        let distance = self.common.distance;
        let spill = along * self.center_offset + emit * distance;

        let base = self.count.base();
        let step = self.half_width * 2.0 / (base - 1) as WorldCoord;
        self.starts.clear();
        self.targets.clear();
        for i in 0..base {
            let offset = i as WorldCoord * step - self.half_width;
            self.starts.push(self.position + along * offset);
            self.targets
                .push(self.position + along * (offset * self.end_scale) + spill);
        }
        self.far_center = self.position + spill;
        self.far_side = self.starts[0] + spill;

        self.aabb = Aabb::from_points([
            self.position,
            self.starts[0],
            self.targets[0],
            self.starts[base - 1],
            self.targets[base - 1],
        ])
        .unwrap_or(Aabb::ZERO)
        .expand(0.1);

        // A hair taller than the strip so candidates on its edges survive.
        let center = self.position + emit * (distance * 0.5);
        let reach = distance * 0.5 + 0.005;
        let (hw, es, co) = (self.half_width, self.end_scale, self.center_offset);
        self.quad = [
            center + along * -hw + emit * -reach,
            center + along * (-hw * es + co) + emit * reach,
            center + along * (hw * es + co) + emit * reach,
            center + along * hw + emit * -reach,
        ];
    }

    fn in_bounds(&self, point: WorldPoint) -> bool {
        if !self.aabb.contains(point) {
            return false;
        }
        self.aabb_bounds_only || point_in_polygon(point, self.quad)
    }

    /// Lateral ordering key: signed squared distance of a ray's start from the
    /// light's center axis, so the sorted rays sweep the baseline end to end.
    fn offset_key(&self, start: WorldPoint) -> NotNan<WorldCoord> {
        let side = point_line_side(self.position, self.far_center, start);
        let key = if side == 0 {
            0.0
        } else {
            -(start - self.position).square_length() * side as WorldCoord
        };
        NotNan::new(key).unwrap_or_default()
    }

    // --- Aiming ----------------------------------------------------------------------------------

    fn aim_base_rays(&mut self) {
        self.rays.clear();
        for (i, (&start, &target)) in self.starts.iter().zip(&self.targets).enumerate() {
            let key = self.offset_key(start);
            self.rays.push(Ray::aimed(i as u32, start, target).with_offset(key));
        }
    }

    fn aim_at_features(&mut self, ctx: &UpdateContext<'_>) {
        if (self.end_scale - 1.0).abs() <= STRAIGHT_EPSILON {
            self.aim_straight(ctx);
        } else {
            self.aim_angled(ctx);
        }
    }

    /// Candidates when the far edge parallels the baseline: every ray travels
    /// in the emission direction, so a feature's ray is found by projecting the
    /// emission line through it onto the baseline and the far line.
    fn aim_straight(&mut self, ctx: &UpdateContext<'_>) {
        let (sin, cos) = self.common.direction.radians.sin_cos();
        let along = vec2(cos, sin);
        for shape in ctx.scratch.shapes() {
            match *shape {
                GatheredShape::Circle { center, radius } => {
                    if self.in_bounds(center)
                        && let Some((start, end)) = self.project_straight(center)
                    {
                        self.add_ray(ctx, start, end);
                    }
                    // Two rays just grazing and two just inside each rim.
                    for k in [
                        radius + OFFSET_SIZE,
                        radius - OFFSET_SIZE,
                        -(radius - OFFSET_SIZE),
                        -(radius + OFFSET_SIZE),
                    ] {
                        let feature = center + along * k;
                        if self.in_bounds(feature)
                            && let Some((start, end)) = self.project_straight(feature)
                        {
                            self.add_ray(ctx, start, end);
                        }
                    }
                }
                GatheredShape::Outline { ref vertices } => {
                    let outline = ctx.scratch.outline(vertices.clone());
                    self.walk_outline_straight(ctx, outline, along);
                }
            }
        }
    }

    fn walk_outline_straight(
        &mut self,
        ctx: &UpdateContext<'_>,
        outline: &[WorldPoint],
        along: WorldVector,
    ) {
        let jitter = along * OFFSET_SIZE;
        let far_edge = (self.targets[0], self.targets[self.targets.len() - 1]);
        let Some(&last) = outline.last() else {
            return;
        };
        let mut prev = last;
        for &vertex in outline {
            // Where an outline edge crosses the light's far edge, one dead-on
            // ray pins the lit region's rim to it.
            if let Some(crossing) = segment_segment_intersection(far_edge.0, far_edge.1, prev, vertex)
                && let Some((start, end)) = self.project_straight(crossing)
            {
                self.add_ray(ctx, start, end);
            }
            if self.in_bounds(vertex)
                && let Some((start, end)) = self.project_straight(vertex)
            {
                self.add_ray(ctx, start + jitter, end + jitter);
                self.add_ray(ctx, start - jitter, end - jitter);
            }
            prev = vertex;
        }
    }

    /// Projects the emission line through `feature` onto the baseline and the
    /// far line. [`None`] only for degenerate geometry.
    fn project_straight(&self, feature: WorldPoint) -> Option<(WorldPoint, WorldPoint)> {
        let back = feature - (self.far_center - self.position);
        let start = line_line_intersection(back, feature, self.position, self.starts[0])?;
        let end = line_line_intersection(back, feature, self.far_center, self.far_side)?;
        Some((start, end))
    }

    /// Candidates when the far edge is scaled: all rays pass through the
    /// virtual apex where the outermost rays' lines meet, so a feature's ray is
    /// the line from the apex through it.
    fn aim_angled(&mut self, ctx: &UpdateContext<'_>) {
        let Some(apex) = line_line_intersection(
            self.position,
            self.far_center,
            self.starts[0],
            self.targets[0],
        ) else {
            return;
        };
        let (sin, cos) = self.common.direction.radians.sin_cos();
        let along = vec2(cos, sin);
        for shape in ctx.scratch.shapes() {
            match *shape {
                GatheredShape::Circle { center, radius } => {
                    let Some((start, end)) = self.project_through(apex, center) else {
                        continue;
                    };
                    self.add_ray(ctx, start, end);
                    // Lateral offsets perpendicular to this ray: two interior
                    // samples and the four rim-grazing ones.
                    let off = (end - start).normalize_or_zero().perp();
                    for k in [
                        radius * 0.5,
                        -radius * 0.5,
                        radius + OFFSET_SIZE,
                        radius - OFFSET_SIZE,
                        -(radius - OFFSET_SIZE),
                        -(radius + OFFSET_SIZE),
                    ] {
                        let feature = center + off * k;
                        if self.in_bounds(feature)
                            && let Some((start, end)) = self.project_through(apex, feature)
                        {
                            self.fast_add_ray(ctx, start, end);
                        }
                    }
                }
                GatheredShape::Outline { ref vertices } => {
                    let outline = ctx.scratch.outline(vertices.clone());
                    self.walk_outline_angled(ctx, outline, apex, along);
                }
            }
        }
    }

    fn walk_outline_angled(
        &mut self,
        ctx: &UpdateContext<'_>,
        outline: &[WorldPoint],
        apex: WorldPoint,
        along: WorldVector,
    ) {
        let jitter = along * OFFSET_SIZE;
        let far_edge = (self.targets[0], self.targets[self.targets.len() - 1]);
        // With the far edge shrunk to a point every ray ends there.
        let pointy = self.end_scale == 0.0;
        let Some(&last) = outline.last() else {
            return;
        };
        let mut prev = last;
        for &vertex in outline {
            if !pointy
                && let Some(crossing) =
                    segment_segment_intersection(far_edge.0, far_edge.1, prev, vertex)
                && let Some(start) =
                    line_line_intersection(crossing, apex, self.position, self.starts[0])
            {
                self.add_ray(ctx, start, crossing);
            }
            if self.in_bounds(vertex) {
                if pointy {
                    if let Some(start) =
                        line_line_intersection(vertex, apex, self.position, self.starts[0])
                    {
                        self.add_ray(ctx, start - jitter, self.targets[0]);
                        self.add_ray(ctx, start + jitter, self.targets[0]);
                    }
                } else if let Some((start, end)) = self.project_through(apex, vertex) {
                    self.add_ray(ctx, start - jitter, end - jitter);
                    self.add_ray(ctx, start + jitter, end + jitter);
                }
            }
            prev = vertex;
        }
    }

    /// Projects the line from the apex through `feature` onto the baseline and
    /// the far line.
    fn project_through(
        &self,
        apex: WorldPoint,
        feature: WorldPoint,
    ) -> Option<(WorldPoint, WorldPoint)> {
        let start = line_line_intersection(feature, apex, self.position, self.starts[0])?;
        let end = line_line_intersection(feature, apex, self.far_center, self.far_side)?;
        Some((start, end))
    }

    /// Admits a candidate ray after checking both endpoints against the
    /// light's bounds.
    fn add_ray(&mut self, ctx: &UpdateContext<'_>, start: WorldPoint, end: WorldPoint) {
        if self.rays.len() >= self.rays.budget() {
            return;
        }
        if !self.in_bounds(end) || !self.in_bounds(start) {
            return;
        }
        self.fast_add_ray(ctx, start, end);
    }

    /// Admits a candidate ray unless it is degenerate or a duplicate. With a
    /// widening far edge starts discriminate duplicates best; with a narrowing
    /// one, ends.
    fn fast_add_ray(&mut self, ctx: &UpdateContext<'_>, start: WorldPoint, end: WorldPoint) {
        if self.rays.len() >= self.rays.budget() {
            return;
        }
        let eps = ctx.dedup_epsilon;
        if (start.x - end.x).abs() <= eps && (start.y - end.y).abs() <= eps {
            return;
        }
        let by_start = self.end_scale >= 0.0;
        let probe = if by_start { start } else { end };
        if self.rays.rays().iter().any(|ray| {
            let existing = if by_start { ray.start } else { ray.target };
            (existing.x - probe.x).abs() <= eps && (existing.y - probe.y).abs() <= eps
        }) {
            return;
        }
        let seq = self.rays.len() as u32;
        let key = self.offset_key(start);
        self.rays.push(Ray::aimed(seq, start, end).with_offset(key));
    }

    fn cast_all(&mut self, ctx: &UpdateContext<'_>) {
        let policy = self.common.cast_policy(ctx);
        for ray in self.rays.rays_mut() {
            ray.cast(ctx.world, policy);
        }
    }

    // --- Meshes and queries ----------------------------------------------------------------------

    /// Near/far vertex pairs for a triangle strip. The far shade reflects how
    /// much of the ray survived, attenuated by the end color scale.
    fn build_meshes(&mut self) {
        self.lit.clear();
        for ray in self.rays.windowed() {
            self.lit.push(ray.start, self.common.packed, 1.0);
            self.lit.push(
                ray.hit,
                self.common.packed,
                1.0 - ray.fraction * self.end_color_scale,
            );
        }
        self.soft.clear();
        if !self.common.soft || self.common.xray {
            return;
        }
        for ray in self.rays.windowed() {
            let shade = 1.0 - ray.fraction * self.end_color_scale;
            self.soft.push(ray.hit, self.common.packed, shade);
            self.soft.push(
                ray.hit + vec2(ray.cos, ray.sin) * (self.common.soft_length * shade),
                PackedColor::TRANSPARENT,
                0.0,
            );
        }
    }

    /// Whether `point` is inside the strip polygon (baseline forward, hits
    /// backward), or failing that, the soft fringe polygon.
    pub(crate) fn contains(&self, point: WorldPoint) -> bool {
        if !self.aabb.contains(point) {
            return false;
        }
        let rays = self.rays.windowed();
        if point_in_polygon(
            point,
            rays.iter()
                .map(|ray| ray.start)
                .chain(rays.iter().rev().map(|ray| ray.hit)),
        ) {
            return true;
        }
        self.common.soft
            && !self.common.xray
            && point_in_polygon(
                point,
                rays.iter().map(|ray| ray.hit).chain(rays.iter().rev().map(|ray| {
                    let shade = 1.0 - ray.fraction * self.end_color_scale;
                    ray.hit + vec2(ray.cos, ray.sin) * (self.common.soft_length * shade)
                })),
            )
    }

    // --- Parameters ------------------------------------------------------------------------------

    /// Width of the baseline segment. Clamped from below; see
    /// [`LineLight::set_width()`].
    #[inline]
    pub fn width(&self) -> WorldCoord {
        self.half_width * 2.0
    }

    /// Sets the baseline width, clamping so the half-width is at least 0.1.
    pub fn set_width(&mut self, width: WorldCoord) {
        let half_width = (width * 0.5).max(MIN_HALF_WIDTH);
        if half_width != self.half_width {
            self.half_width = half_width;
            self.common.dirty = true;
        }
    }

    /// Width of the far edge relative to the baseline.
    #[inline]
    pub fn end_scale(&self) -> WorldCoord {
        self.end_scale
    }

    /// Sets the far edge's width relative to the baseline: 1 for a parallel
    /// strip, 0 to bring the far edge to a point, larger values to flare out.
    pub fn set_end_scale(&mut self, end_scale: WorldCoord) {
        if end_scale != self.end_scale {
            self.end_scale = end_scale;
            self.common.dirty = true;
        }
    }

    /// Sideways displacement of the far edge along the baseline direction.
    #[inline]
    pub fn center_offset(&self) -> WorldCoord {
        self.center_offset
    }

    /// Slides the far edge sideways, shearing the strip.
    pub fn set_center_offset(&mut self, center_offset: WorldCoord) {
        if center_offset != self.center_offset {
            self.center_offset = center_offset;
            self.common.dirty = true;
        }
    }

    /// How much the light fades towards its far edge.
    #[inline]
    pub fn end_color_scale(&self) -> WorldCoord {
        self.end_color_scale
    }

    /// Sets the fade towards the far edge: 1 fades to nothing there, 0 keeps
    /// full brightness all the way out.
    pub fn set_end_color_scale(&mut self, end_color_scale: WorldCoord) {
        if end_color_scale != self.end_color_scale {
            self.end_color_scale = end_color_scale;
            self.common.dirty = true;
        }
    }

    pub(super) fn set_aabb_bounds_only(&mut self, aabb_only: bool) {
        self.aabb_bounds_only = aabb_only;
    }

    pub(super) fn set_follow_attachment(&mut self, follow: bool) {
        self.follow_attachment = follow;
    }

    /// Repositions and resizes in one step, used by the whole-view directional
    /// light when the view changes.
    pub(super) fn place_for_view(
        &mut self,
        position: WorldPoint,
        width: WorldCoord,
        distance: WorldCoord,
    ) {
        self.position = position;
        self.half_width = (width * 0.5).max(MIN_HALF_WIDTH);
        self.common.set_raw_distance(distance);
        self.common.dirty = true;
    }

    // --- Plumbing --------------------------------------------------------------------------------

    fn move_to(&mut self, position: WorldPoint) {
        if (position.x - self.position.x).abs() > POSITION_EPSILON
            || (position.y - self.position.y).abs() > POSITION_EPSILON
        {
            self.position = position;
            self.common.dirty = true;
        }
    }

    pub(crate) fn lit(&self) -> &LightMesh {
        &self.lit
    }

    pub(crate) fn soft(&self) -> &LightMesh {
        &self.soft
    }

    pub(crate) fn window(&self) -> Range<usize> {
        self.rays.window()
    }

    pub(crate) fn peak_rays(&self) -> usize {
        self.rays.peak()
    }

    pub(crate) fn set_ray_count(&mut self, count: RayCount) {
        let budget = count.budget();
        self.count = count;
        self.rays.resize_budget(budget);
        self.starts = Vec::with_capacity(count.base());
        self.targets = Vec::with_capacity(count.base());
        self.lit.resize_capacity(budget * 2);
        self.soft.resize_capacity(budget * 2);
        self.common.dirty = true;
    }

    pub(crate) fn sleeping(&self) -> bool {
        self.sleeping
    }

    pub(crate) fn set_allow_sleeping(&mut self, allow: bool) {
        self.allow_sleeping = allow;
    }

    pub(crate) fn set_ignore_static_bodies(&mut self, ignore: bool) {
        self.ignore_static_bodies = ignore;
        self.common.dirty = true;
    }

    pub(crate) fn position(&self) -> WorldPoint {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: WorldPoint) {
        self.move_to(position);
    }

    pub(crate) fn common(&self) -> &LightCommon {
        &self.common
    }

    pub(crate) fn common_mut(&mut self) -> &mut LightCommon {
        &mut self.common
    }
}

// -------------------------------------------------------------------------------------------------
