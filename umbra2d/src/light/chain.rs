//! Fixed-fan light emitted sideways from a polyline.

use core::f32::consts::{PI, TAU};

use euclid::vec2;
use itertools::Itertools as _;

use crate::light::{ChainSide, LightCommon, UpdateContext};
use crate::math::{
    Aabb, LightColor, PackedColor, VectorExt as _, WorldAngle, WorldCoord, WorldPoint,
};
use crate::mesh::LightMesh;
use crate::ray::{Ray, RayFan, point_in_polygon};

/// How far off the chain surface each ray starts, so that rays do not
/// immediately collide with the emitting geometry itself.
const RAY_START_OFFSET: WorldCoord = 0.001;

/// Light emitted from one side of a polyline, such as a glowing wall edge.
///
/// Rays leave perpendicular to each segment, blending direction near the
/// joints, and are distributed over the segments in proportion to their
/// length. Which side emits is chosen by [`ChainSide`].
///
/// Constructed via [`Light::chain()`](crate::Light::chain).
#[derive(Clone, Debug)]
pub struct ChainLight {
    common: LightCommon,
    side: ChainSide,
    vertices: Vec<WorldPoint>,
    start_offset: WorldCoord,
    segment_lengths: Vec<WorldCoord>,
    segment_angles: Vec<WorldCoord>,
    starts: Vec<WorldPoint>,
    targets: Vec<WorldPoint>,
    last_pose: Option<(WorldPoint, WorldAngle)>,
    rays: RayFan,
    lit: LightMesh,
    soft: LightMesh,
}

impl ChainLight {
    pub(crate) fn new(
        rays: usize,
        color: LightColor,
        distance: WorldCoord,
        side: ChainSide,
        vertices: impl IntoIterator<Item = WorldPoint>,
    ) -> Self {
        let rays = rays.max(super::MIN_RAYS);
        let mut light = Self {
            common: LightCommon::new(color, distance, WorldAngle::zero()),
            side,
            vertices: vertices.into_iter().collect(),
            start_offset: RAY_START_OFFSET,
            segment_lengths: Vec::new(),
            segment_angles: Vec::new(),
            starts: Vec::with_capacity(rays),
            targets: Vec::with_capacity(rays),
            last_pose: None,
            rays: RayFan::new(rays),
            lit: LightMesh::with_capacity(rays * 2),
            soft: LightMesh::with_capacity(rays * 2),
        };
        light.rebuild_tables();
        light
    }

    /// The polyline this light is emitted from.
    pub fn vertices(&self) -> &[WorldPoint] {
        &self.vertices
    }

    /// Replaces the polyline. Takes effect on the next update.
    pub fn set_vertices(&mut self, vertices: impl IntoIterator<Item = WorldPoint>) {
        self.vertices.clear();
        self.vertices.extend(vertices);
        self.common.dirty = true;
    }

    /// Which side of the polyline emits light.
    pub fn side(&self) -> ChainSide {
        self.side
    }

    /// Changes the emitting side. Takes effect on the next update.
    pub fn set_side(&mut self, side: ChainSide) {
        if self.side != side {
            self.side = side;
            self.common.dirty = true;
        }
    }

    /// How far off the chain surface rays start. Defaults to a small positive
    /// offset so rays clear the emitting geometry.
    pub fn start_offset(&self) -> WorldCoord {
        self.start_offset
    }

    /// Sets the ray start offset. Takes effect on the next update.
    pub fn set_start_offset(&mut self, offset: WorldCoord) {
        if self.start_offset != offset {
            self.start_offset = offset;
            self.common.dirty = true;
        }
    }

    /// Recomputes the per-ray start and target tables from the polyline.
    ///
    /// Rays are budgeted to segments proportionally to segment length; each
    /// ray's direction interpolates between angles blended at the segment
    /// ends, so adjacent segments share a direction at their joint.
    fn rebuild_tables(&mut self) {
        self.starts.clear();
        self.targets.clear();
        self.segment_lengths.clear();
        self.segment_angles.clear();
        self.last_pose = None;
        if self.vertices.len() < 2 {
            return;
        }

        let mut remaining_length = 0.0;
        for (a, b) in self.vertices.iter().tuple_windows() {
            let v = *b - *a;
            let normal = v.perp() * self.side.sign();
            self.segment_lengths.push(v.length());
            self.segment_angles.push(normal.y.atan2(normal.x));
            remaining_length += v.length();
        }

        let distance = self.common.distance;
        let segment_count = self.segment_lengths.len();
        let mut remaining_rays = self.rays.budget();
        for i in 0..segment_count {
            let previous = self.segment_angles[i.saturating_sub(1)];
            let current = self.segment_angles[i];
            let next = self.segment_angles[(i + 1).min(segment_count - 1)];
            let start_angle = lerp_angle_shortest(previous, current, 0.5);
            let end_angle = lerp_angle_shortest(current, next, 0.5);

            let length = self.segment_lengths[i];
            let origin = self.vertices[i];
            let along = (self.vertices[i + 1] - origin).normalize_or_zero();
            let ray_spacing = remaining_length / remaining_rays as f32;
            let segment_rays = if i == segment_count - 1 {
                remaining_rays
            } else {
                ((length / remaining_length) * remaining_rays as f32) as usize
            };
            for j in 0..segment_rays {
                let position = j as f32 * ray_spacing;
                let t = if length > 0.0 { position / length } else { 0.0 };
                let angle = lerp_angle_shortest(start_angle, end_angle, t);
                let (sin, cos) = angle.sin_cos();
                let start = origin + along * position + vec2(cos, sin) * self.start_offset;
                self.starts.push(start);
                self.targets.push(start + vec2(cos, sin) * distance);
            }
            remaining_rays -= segment_rays;
            remaining_length -= length;
        }
    }

    pub(crate) fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.common.refresh_distance(ctx.gamma_scale);
        if self.common.dirty {
            self.rebuild_tables();
        }

        // Follow the attached body by rigidly transforming the tables with
        // the pose delta since the previous update.
        if let Some(pose) = self.common.attachment_pose(ctx.world) {
            if let Some(last) = self.last_pose
                && last != pose
            {
                let (sin, cos) = (pose.1 - last.1).radians.sin_cos();
                for point in self.starts.iter_mut().chain(self.targets.iter_mut()) {
                    *point = pose.0 + (*point - last.0).rotated_by_sin_cos(sin, cos);
                }
            }
            self.last_pose = Some(pose);
        }

        if ctx.culling && !ctx.force {
            let bounds = Aabb::from_points(self.starts.iter().chain(&self.targets).copied());
            self.common.culled = match bounds {
                Some(bounds) => !ctx.view.intersects(bounds.expand(self.common.soft_length)),
                None => true,
            };
            if self.common.culled {
                return;
            }
        } else {
            self.common.culled = false;
        }
        if self.common.static_light && !self.common.dirty && !ctx.force {
            return;
        }

        let policy = self.common.cast_policy(ctx);
        self.rays.clear();
        for (i, (&start, &target)) in self.starts.iter().zip(&self.targets).enumerate() {
            let mut ray = Ray::aimed(i as u32, start, target);
            if !self.common.xray {
                ray.cast(ctx.world, policy);
            }
            self.rays.push(ray);
        }
        self.rays.set_full_window();

        self.lit.clear();
        for ray in self.rays.windowed() {
            self.lit.push(ray.start, self.common.packed, 1.0);
            self.lit.push(ray.hit, self.common.packed, 1.0 - ray.fraction);
        }
        self.soft.clear();
        if self.common.soft && !self.common.xray {
            for ray in self.rays.windowed() {
                let shade = 1.0 - ray.fraction;
                self.soft.push(ray.hit, self.common.packed, shade);
                self.soft.push(
                    ray.hit + vec2(ray.cos, ray.sin) * (self.common.soft_length * shade),
                    PackedColor::TRANSPARENT,
                    0.0,
                );
            }
        }
        self.common.dirty = false;
    }

    pub(crate) fn set_ray_count(&mut self, rays: usize) {
        let rays = rays.max(super::MIN_RAYS);
        self.rays.resize_budget(rays);
        self.lit.resize_capacity(rays * 2);
        self.soft.resize_capacity(rays * 2);
        self.common.dirty = true;
    }

    pub(crate) fn contains(&self, point: WorldPoint) -> bool {
        // Outline of the lit strip: ray starts forward along the chain, hit
        // points back again.
        let rays = self.rays.rays();
        point_in_polygon(
            point,
            rays.iter()
                .map(|ray| ray.start)
                .chain(rays.iter().rev().map(|ray| ray.hit)),
        )
    }

    pub(crate) fn position(&self) -> WorldPoint {
        self.starts.first().copied().unwrap_or_else(WorldPoint::origin)
    }

    pub(crate) fn set_position(&mut self, _: WorldPoint) {}

    pub(crate) fn lit(&self) -> &LightMesh {
        &self.lit
    }

    pub(crate) fn soft(&self) -> &LightMesh {
        &self.soft
    }

    pub(crate) fn window(&self) -> core::ops::Range<usize> {
        self.rays.window()
    }

    pub(crate) fn common(&self) -> &LightCommon {
        &self.common
    }

    pub(crate) fn common_mut(&mut self) -> &mut LightCommon {
        &mut self.common
    }
}

/// Interpolates between two angles (in radians) along the shorter arc.
fn lerp_angle_shortest(from: WorldCoord, to: WorldCoord, t: WorldCoord) -> WorldCoord {
    let mut difference = (to - from).rem_euclid(TAU);
    if difference > PI {
        difference -= TAU;
    }
    from + difference * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixtureWorld;
    use crate::world::BodyId;
    use crate::{Light, LightSet};
    use euclid::point2;

    fn updated(light: Light, world: &FixtureWorld) -> LightSet {
        let mut set = LightSet::default();
        set.insert(light);
        set.update(world);
        set
    }

    #[test]
    fn angle_interpolation_takes_the_short_way() {
        let quarter = lerp_angle_shortest(0.0, PI / 2.0, 0.5);
        assert!((quarter - PI / 4.0).abs() < 1e-6);
        // Crossing the ±π seam must not swing through zero.
        let seam = lerp_angle_shortest(PI - 0.1, -PI + 0.1, 0.5);
        assert!((seam - PI).abs() < 1e-6);
    }

    #[test]
    fn rays_distribute_along_segments_by_length() {
        let world = FixtureWorld::new();
        let set = updated(
            Light::chain(
                6,
                LightColor::DEFAULT,
                5.0,
                ChainSide::Left,
                [point2(0., 0.), point2(4., 0.), point2(4., 2.)],
            ),
            &world,
        );
        let light = set.iter().next().unwrap().1;
        let lit = light.lit_mesh().vertices();
        assert_eq!(lit.len(), 12);

        // Two thirds of the chain length lies on the first segment, so it
        // receives 4 of the 6 rays; the first one leaves (0, 0) straight up.
        assert!((lit[0].position[0]).abs() < 2e-3);
        assert!((lit[1].position[0]).abs() < 2e-3);
        assert!((lit[1].position[1] - 5.0).abs() < 2e-3);
        let first_segment = lit
            .chunks_exact(2)
            .filter(|pair| pair[0].position[0] < 3.9)
            .count();
        assert_eq!(first_segment, 4);
    }

    #[test]
    fn side_selects_the_emitting_normal() {
        let world = FixtureWorld::new();
        let set = updated(
            Light::chain(
                4,
                LightColor::DEFAULT,
                5.0,
                ChainSide::Right,
                [point2(0., 0.), point2(4., 0.)],
            ),
            &world,
        );
        let lit = set.iter().next().unwrap().1.lit_mesh().vertices();
        // Rightward of +x is −y.
        assert!((lit[1].position[1] + 5.0).abs() < 2e-3);
    }

    #[test]
    fn attached_body_moves_the_chain_rigidly() {
        let mut world = FixtureWorld::new();
        world.set_body_pose(BodyId(1), point2(0., 0.), WorldAngle::zero());
        let mut set = LightSet::default();
        let id = set.insert(Light::chain(
            4,
            LightColor::DEFAULT,
            3.0,
            ChainSide::Left,
            [point2(0., 0.), point2(2., 0.)],
        ));
        set[id].attach_to_body(BodyId(1), vec2(0., 0.), WorldAngle::zero());
        set.update(&world);

        world.set_body_pose(BodyId(1), point2(3., 0.), WorldAngle::degrees(90.0));
        set.update(&world);
        let lit = set[id].lit_mesh().vertices();
        // The chain now runs along +y from (3, 0) and shines towards −x.
        assert!((lit[0].position[0] - 3.0).abs() < 2e-3);
        assert!((lit[0].position[1]).abs() < 2e-3);
        assert!((lit[1].position[0]).abs() < 2e-3);
        assert!((lit[1].position[1]).abs() < 2e-3);
    }

    #[test]
    fn strip_outline_bounds_the_lit_region() {
        let world = FixtureWorld::new();
        let set = updated(
            Light::chain(
                16,
                LightColor::DEFAULT,
                4.0,
                ChainSide::Left,
                [point2(-3., 0.), point2(3., 0.)],
            ),
            &world,
        );
        let light = set.iter().next().unwrap().1;
        assert!(light.contains(point2(0., 2.)));
        assert!(!light.contains(point2(0., -1.)));
        assert!(!light.contains(point2(9., 2.)));
    }

    #[test]
    fn replacing_vertices_rebuilds_the_fan() {
        let world = FixtureWorld::new();
        let mut set = LightSet::default();
        let id = set.insert(Light::chain(
            8,
            LightColor::DEFAULT,
            4.0,
            ChainSide::Left,
            core::iter::empty(),
        ));
        set.update(&world);
        assert!(set[id].lit_mesh().is_empty());

        match &mut set[id] {
            Light::Chain(chain) => {
                chain.set_vertices([point2(0., 0.), point2(1., 0.)]);
            }
            _ => unreachable!(),
        }
        set.update(&world);
        assert_eq!(set[id].lit_mesh().len(), 16);
    }
}
