//! Fixed-fan radial lights: [`PointLight`] and [`ConeLight`].

use core::f32::consts::TAU;

use euclid::{point2, vec2};

use crate::light::{LightCommon, UpdateContext, build_fan_meshes};
use crate::math::{Aabb, LightColor, WorldAngle, WorldCoord, WorldPoint};
use crate::mesh::LightMesh;
use crate::ray::{Ray, RayFan, point_in_polygon};

// -------------------------------------------------------------------------------------------------

/// State and update steps shared by the two fixed-fan lights.
#[derive(Clone, Debug)]
struct RadialCore {
    position: WorldPoint,
    rays: RayFan,
    /// `(sin, cos)` of each ray's aim angle, rebuilt when the aim changes.
    trig: Vec<(WorldCoord, WorldCoord)>,
    lit: LightMesh,
    soft: LightMesh,
}

impl RadialCore {
    fn new(ray_count: usize, position: WorldPoint) -> Self {
        Self {
            position,
            rays: RayFan::new(ray_count),
            trig: Vec::with_capacity(ray_count),
            lit: LightMesh::with_capacity(ray_count + 1),
            soft: LightMesh::with_capacity(ray_count * 2),
        }
    }

    fn resize(&mut self, ray_count: usize) {
        self.rays.resize_budget(ray_count);
        self.trig = Vec::with_capacity(ray_count);
        self.lit.resize_capacity(ray_count + 1);
        self.soft.resize_capacity(ray_count * 2);
    }

    fn move_to(&mut self, common: &mut LightCommon, position: WorldPoint) {
        if (position.x - self.position.x).abs() > super::POSITION_EPSILON
            || (position.y - self.position.y).abs() > super::POSITION_EPSILON
        {
            self.position = position;
            common.dirty = true;
        }
    }

    /// Records and returns whether the light lies wholly outside the view.
    fn cull(&self, common: &mut LightCommon, ctx: &UpdateContext<'_>) -> bool {
        let reach = common.distance + common.soft_length;
        common.culled = ctx.culling
            && !ctx.force
            && !ctx
                .view
                .intersects(Aabb::centered(self.position, vec2(reach, reach)));
        common.culled
    }

    /// Casts the whole fan from the current position and rebuilds both meshes.
    fn cast_and_mesh(&mut self, common: &LightCommon, ctx: &UpdateContext<'_>) {
        let policy = common.cast_policy(ctx);
        self.rays.clear();
        for (i, &(sin, cos)) in self.trig.iter().enumerate() {
            let target = self.position + vec2(cos, sin) * common.distance;
            let mut ray = Ray::aimed(i as u32, self.position, target);
            if !common.xray {
                ray.cast(ctx.world, policy);
            }
            self.rays.push(ray);
        }
        self.rays.set_full_window();
        build_fan_meshes(
            &mut self.lit,
            &mut self.soft,
            self.position,
            self.rays.windowed(),
            common,
        );
    }

    /// Hit-point polygon test, preceded by a cheap range check.
    fn contains(&self, common: &LightCommon, point: WorldPoint) -> bool {
        if (point - self.position).square_length() >= common.distance * common.distance {
            return false;
        }
        // The anchor vertex takes part in the polygon so that a cone's wedge
        // closes through its apex.
        point_in_polygon(
            point,
            self.lit
                .vertices()
                .iter()
                .map(|v| point2(v.position[0], v.position[1])),
        )
    }
}

// -------------------------------------------------------------------------------------------------

/// Light radiating in all directions from a point, casting a fixed fan of
/// evenly spaced rays.
///
/// Constructed via [`Light::point()`](crate::Light::point).
#[derive(Clone, Debug)]
pub struct PointLight {
    common: LightCommon,
    core: RadialCore,
}

impl PointLight {
    pub(crate) fn new(
        rays: usize,
        color: LightColor,
        distance: WorldCoord,
        position: WorldPoint,
    ) -> Self {
        let rays = rays.max(super::MIN_RAYS);
        Self {
            common: LightCommon::new(color, distance, WorldAngle::zero()),
            core: RadialCore::new(rays, position),
        }
    }

    pub(crate) fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        if let Some((position, _)) = self.common.attachment_pose(ctx.world) {
            self.core.move_to(&mut self.common, position);
        }
        self.common.refresh_distance(ctx.gamma_scale);
        if self.core.cull(&mut self.common, ctx) {
            return;
        }
        if self.common.static_light && !self.common.dirty && !ctx.force {
            return;
        }

        if self.core.trig.len() != self.core.rays.budget() {
            let n = self.core.rays.budget();
            self.core.trig.clear();
            // The final ray repeats the first (at a full turn) so the fan closes.
            let step = TAU / (n - 1) as f32;
            self.core
                .trig
                .extend((0..n).map(|i| (step * i as f32).sin_cos()));
        }
        self.core.cast_and_mesh(&self.common, ctx);
        self.common.dirty = false;
    }

    pub(crate) fn set_ray_count(&mut self, rays: usize) {
        self.core.resize(rays.max(super::MIN_RAYS));
        self.common.dirty = true;
    }

    pub(crate) fn contains(&self, point: WorldPoint) -> bool {
        self.core.contains(&self.common, point)
    }

    pub(crate) fn position(&self) -> WorldPoint {
        self.core.position
    }

    pub(crate) fn set_position(&mut self, position: WorldPoint) {
        self.core.move_to(&mut self.common, position);
    }

    pub(crate) fn lit(&self) -> &LightMesh {
        &self.core.lit
    }

    pub(crate) fn soft(&self) -> &LightMesh {
        &self.core.soft
    }

    pub(crate) fn window(&self) -> core::ops::Range<usize> {
        self.core.rays.window()
    }

    pub(crate) fn common(&self) -> &LightCommon {
        &self.common
    }

    pub(crate) fn common_mut(&mut self) -> &mut LightCommon {
        &mut self.common
    }
}

// -------------------------------------------------------------------------------------------------

/// Light radiating over an angular wedge, casting a fixed fan of evenly spaced
/// rays between its two edges.
///
/// Constructed via [`Light::cone()`](crate::Light::cone).
#[derive(Clone, Debug)]
pub struct ConeLight {
    common: LightCommon,
    core: RadialCore,
    half_angle: WorldAngle,
}

impl ConeLight {
    pub(crate) fn new(
        rays: usize,
        color: LightColor,
        distance: WorldCoord,
        position: WorldPoint,
        direction: WorldAngle,
        half_angle: WorldAngle,
    ) -> Self {
        let rays = rays.max(super::MIN_RAYS);
        Self {
            common: LightCommon::new(color, distance, direction),
            core: RadialCore::new(rays, position),
            half_angle: clamp_half_angle(half_angle),
        }
    }

    /// Half-angle of the cone: the wedge spans the light's direction plus or
    /// minus this.
    #[inline]
    pub fn half_angle(&self) -> WorldAngle {
        self.half_angle
    }

    /// Sets the cone's half-angle, clamped to 0°..=180°.
    #[inline]
    pub fn set_half_angle(&mut self, half_angle: WorldAngle) {
        self.half_angle = clamp_half_angle(half_angle);
        self.common.dirty = true;
    }

    pub(crate) fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        if let Some((position, angle)) = self.common.attachment_pose(ctx.world) {
            self.core.move_to(&mut self.common, position);
            self.common.set_direction(angle);
        }
        self.common.refresh_distance(ctx.gamma_scale);
        if self.core.cull(&mut self.common, ctx) {
            return;
        }
        if self.common.static_light && !self.common.dirty && !ctx.force {
            return;
        }

        if self.common.dirty || self.core.trig.len() != self.core.rays.budget() {
            let n = self.core.rays.budget();
            let direction = self.common.direction.radians;
            let half = self.half_angle.radians;
            self.core.trig.clear();
            // Sweep from one edge of the wedge to the other.
            self.core.trig.extend(
                (0..n).map(|i| (direction + half - 2.0 * half * i as f32 / (n - 1) as f32).sin_cos()),
            );
        }
        self.core.cast_and_mesh(&self.common, ctx);
        self.common.dirty = false;
    }

    pub(crate) fn set_ray_count(&mut self, rays: usize) {
        self.core.resize(rays.max(super::MIN_RAYS));
        self.common.dirty = true;
    }

    pub(crate) fn contains(&self, point: WorldPoint) -> bool {
        self.core.contains(&self.common, point)
    }

    pub(crate) fn position(&self) -> WorldPoint {
        self.core.position
    }

    pub(crate) fn set_position(&mut self, position: WorldPoint) {
        self.core.move_to(&mut self.common, position);
    }

    pub(crate) fn lit(&self) -> &LightMesh {
        &self.core.lit
    }

    pub(crate) fn soft(&self) -> &LightMesh {
        &self.core.soft
    }

    pub(crate) fn window(&self) -> core::ops::Range<usize> {
        self.core.rays.window()
    }

    pub(crate) fn common(&self) -> &LightCommon {
        &self.common
    }

    pub(crate) fn common_mut(&mut self) -> &mut LightCommon {
        &mut self.common
    }
}

fn clamp_half_angle(half_angle: WorldAngle) -> WorldAngle {
    WorldAngle::radians(half_angle.radians.clamp(0.0, core::f32::consts::PI))
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    use crate::testing::FixtureWorld;
    use crate::world::{BodyKind, EmptyWorld};
    use crate::{Light, LightSet};
    use euclid::point2;

    fn updated(light: Light, world: &FixtureWorld) -> LightSet {
        let mut set = LightSet::default();
        set.insert(light);
        set.update(world);
        set
    }

    fn hit_points(light: &Light) -> Vec<WorldPoint> {
        light
            .lit_mesh()
            .vertices()
            .iter()
            .skip(1) // anchor
            .map(|v| point2(v.position[0], v.position[1]))
            .collect()
    }

    #[test]
    fn point_light_fan_closes_on_itself() {
        let world = FixtureWorld::new();
        let set = updated(
            Light::point(9, LightColor::DEFAULT, 10.0, point2(1., 2.)),
            &world,
        );
        let light = set.iter().next().unwrap().1;
        let hits = hit_points(light);
        assert_eq!(hits.len(), 9);
        // Eight distinct directions plus a repeat of the first at a full turn.
        assert!((hits[8] - hits[0]).length() < 1e-4);
        assert!((hits[0] - point2(11., 2.)).length() < 1e-4);
        assert!((hits[2] - point2(1., 12.)).length() < 1e-4);
        // Unobstructed rays run the full distance and fade to zero.
        for v in &light.lit_mesh().vertices()[1..] {
            assert_eq!(v.shade, 0.0);
        }
        assert_eq!(light.lit_mesh().vertices()[0].shade, 1.0);
    }

    #[test]
    fn wide_cone_base_ray_directions() {
        let world = FixtureWorld::new();
        let set = updated(
            Light::cone(
                5,
                LightColor::DEFAULT,
                10.0,
                point2(0., 0.),
                WorldAngle::zero(),
                WorldAngle::degrees(180.0),
            ),
            &world,
        );
        let hits = hit_points(set.iter().next().unwrap().1);
        // direction + {180°, 90°, 0°, −90°, −180°}, in sweep order.
        let expected = [
            point2(-10., 0.),
            point2(0., 10.),
            point2(10., 0.),
            point2(0., -10.),
            point2(-10., 0.),
        ];
        for (hit, want) in hits.iter().zip(expected) {
            assert!((*hit - want).length() < 1e-3, "{hit:?} vs {want:?}");
        }
    }

    #[test]
    fn rays_stop_at_occluders() {
        let mut world = FixtureWorld::new();
        world.add_box(BodyKind::Static, Aabb::new(4., 6., -1., 1.));
        let set = updated(
            Light::point(64, LightColor::DEFAULT, 10.0, point2(0., 0.)),
            &world,
        );
        let light = set.iter().next().unwrap().1;
        // The ray aimed along +x stops at the box's near edge.
        let hits = hit_points(light);
        assert!((hits[0] - point2(4., 0.)).length() < 1e-3);
        let shade = light.lit_mesh().vertices()[1].shade;
        assert!((shade - 0.6).abs() < 1e-3);
        // Shadow testing: behind the box is dark, beside it is lit.
        assert!(!light.contains(point2(7., 0.)));
        assert!(light.contains(point2(7., 5.)));
        assert!(!light.contains(point2(20., 0.)));
    }

    #[test]
    fn xray_casts_no_rays() {
        let mut world = FixtureWorld::new();
        world.add_box(BodyKind::Static, Aabb::new(4., 6., -1., 1.));
        let mut set = LightSet::default();
        let id = set.insert(Light::point(16, LightColor::DEFAULT, 10.0, point2(0., 0.)));
        set[id].set_xray(true);
        set.update(&world);
        assert_eq!(world.raycast_count(), 0);
        // The box does not dent the disc.
        assert!(set[id].contains(point2(7., 0.)));
        // X-ray lights also have no soft fringe.
        assert!(set[id].soft_mesh().is_empty());
    }

    #[test]
    fn static_light_reuses_geometry_until_dirtied() {
        let mut world = FixtureWorld::new();
        world.add_box(BodyKind::Static, Aabb::new(4., 6., -1., 1.));
        let mut set = LightSet::default();
        let id = set.insert(Light::point(16, LightColor::DEFAULT, 10.0, point2(0., 0.)));
        set[id].set_static(true);

        set.update(&world);
        assert_eq!(world.raycast_count(), 16);
        set.update(&world);
        set.update(&world);
        assert_eq!(world.raycast_count(), 16);

        set[id].set_position(point2(0.5, 0.));
        set.update(&world);
        assert_eq!(world.raycast_count(), 32);
    }

    #[test]
    fn tiny_movements_do_not_dirty() {
        let mut light = Light::point(8, LightColor::DEFAULT, 10.0, point2(0., 0.));
        light.common_mut().dirty = false;
        light.set_position(point2(0.0005, 0.0));
        assert!(!light.common().dirty);
        assert_eq!(light.position(), point2(0., 0.));
        light.set_position(point2(0.01, 0.0));
        assert!(light.common().dirty);
    }

    #[test]
    fn culling_skips_out_of_view_lights() {
        let mut world = FixtureWorld::new();
        world.add_box(BodyKind::Static, Aabb::new(4., 6., -1., 1.));
        let mut set = LightSet::default();
        let id = set.insert(Light::point(16, LightColor::DEFAULT, 10.0, point2(100., 100.)));
        set.set_view_bounds(Aabb::new(-20., 20., -20., 20.));
        set.update(&world);
        assert!(set[id].is_culled());
        assert_eq!(world.raycast_count(), 0);
        assert_eq!(set.visible_last_sweep(), 0);

        // Soft length counts towards the culling radius.
        set[id].set_position(point2(32., 0.));
        set.update(&world);
        assert!(!set[id].is_culled());
        assert_eq!(set.visible_last_sweep(), 1);
    }

    #[test]
    fn cone_follows_attached_body_angle() {
        let mut world = FixtureWorld::new();
        let body = crate::world::BodyId(1);
        world.set_body_pose(body, point2(5., 0.), WorldAngle::degrees(90.0));
        let mut set = LightSet::default();
        let id = set.insert(Light::cone(
            5,
            LightColor::DEFAULT,
            10.0,
            point2(0., 0.),
            WorldAngle::zero(),
            WorldAngle::degrees(30.0),
        ));
        set[id].attach_to_body(body, euclid::vec2(0., 0.), WorldAngle::zero());
        set.update(&world);
        assert_eq!(set[id].position(), point2(5., 0.));
        // The wedge now points along +y: its middle ray ends above the body.
        let hits = hit_points(&set[id]);
        assert!((hits[2] - point2(5., 10.)).length() < 1e-3);
    }

    #[test]
    fn cone_half_angle_is_clamped() {
        let Light::Cone(mut cone) = Light::cone(
            5,
            LightColor::DEFAULT,
            10.0,
            point2(0., 0.),
            WorldAngle::zero(),
            WorldAngle::degrees(30.0),
        ) else {
            unreachable!()
        };
        cone.set_half_angle(WorldAngle::degrees(700.0));
        assert!((cone.half_angle().radians - PI).abs() < 1e-6);
        cone.set_half_angle(WorldAngle::degrees(-5.0));
        assert_eq!(cone.half_angle(), WorldAngle::zero());
    }

    #[test]
    fn repeated_updates_are_byte_identical() {
        let mut world = FixtureWorld::new();
        world.add_box(BodyKind::Static, Aabb::new(4., 6., -1., 1.));
        world.add_circle(BodyKind::Static, point2(-3., 2.), 1.0);
        let mut set = LightSet::default();
        let id = set.insert(Light::point(32, LightColor::DEFAULT, 10.0, point2(0., 0.)));
        set.update(&world);
        let lit = set[id].lit_mesh().as_bytes().to_vec();
        let soft = set[id].soft_mesh().as_bytes().to_vec();

        set.update(&world);
        assert_eq!(set[id].lit_mesh().as_bytes(), lit);
        assert_eq!(set[id].soft_mesh().as_bytes(), soft);
    }

    #[test]
    fn update_against_empty_world_is_well_formed() {
        let mut set = LightSet::default();
        let id = set.insert(Light::point(4, LightColor::DEFAULT, 5.0, point2(0., 0.)));
        set.update(&EmptyWorld);
        assert_eq!(set[id].lit_mesh().len(), 5);
        assert_eq!(set[id].soft_mesh().len(), 8);
        assert_eq!(set[id].ray_window(), 0..4);
    }
}
