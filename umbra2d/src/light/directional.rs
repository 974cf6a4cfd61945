//! Fixed-fan parallel light spanning the whole view.

use euclid::vec2;

use crate::light::{LightCommon, UpdateContext};
use crate::math::{LightColor, PackedColor, WorldAngle, WorldPoint};
use crate::mesh::LightMesh;
use crate::ray::{Ray, RayFan, point_in_polygon};

/// Light whose source is at infinite distance, like sunlight: parallel rays of
/// equal intensity everywhere, covering the current view bounds.
///
/// A direction of −90° shines straight down. Directional lights have no
/// position and are never culled; without view bounds they collapse to a
/// token sliver.
///
/// Constructed via [`Light::directional()`](crate::Light::directional).
#[derive(Clone, Debug)]
pub struct DirectionalLight {
    common: LightCommon,
    rays: RayFan,
    lit: LightMesh,
    soft: LightMesh,
}

impl DirectionalLight {
    pub(crate) fn new(rays: usize, color: LightColor, direction: WorldAngle) -> Self {
        let rays = rays.max(super::MIN_RAYS);
        Self {
            common: LightCommon::new(color, f32::INFINITY, direction),
            rays: RayFan::new(rays),
            lit: LightMesh::with_capacity(rays * 2),
            soft: LightMesh::with_capacity(rays * 2),
        }
    }

    pub(crate) fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        if self.common.static_light && !self.common.dirty && !ctx.force {
            return;
        }
        let n = self.rays.budget();
        let size = ctx.view.size();
        let span = size.width.max(size.height);
        let (sin, cos) = self.common.direction.radians.sin_cos();

        let mut axis = vec2(cos, sin) * span;
        // A degenerate view would produce zero-length rays, which physics
        // engines reject; give it a token axis instead.
        if axis.x * axis.x < 0.1 && axis.y * axis.y < 0.1 {
            axis = vec2(1.0, 1.0);
        }
        let lateral = vec2(-sin, cos) * span;
        let portion = lateral * (2.0 / (n - 1) as f32);
        let mut base = ctx.view.center() - lateral;
        // Snap the baseline onto the ray grid so a panning view does not make
        // the shadow edges shimmer. An axis-aligned direction zeroes one
        // portion component; that coordinate needs no snapping.
        if portion.x != 0.0 {
            base.x = (base.x / (portion.x * 2.0)).floor() * (portion.x * 2.0);
        }
        if portion.y != 0.0 {
            base.y = (base.y / (portion.y * 2.0)).ceil() * (portion.y * 2.0);
        }

        let policy = self.common.cast_policy(ctx);
        self.rays.clear();
        for i in 0..n {
            let step = base + portion * i as f32;
            let mut ray = Ray::aimed(i as u32, step - axis, step + axis);
            if !self.common.xray {
                ray.cast(ctx.world, policy);
            }
            self.rays.push(ray);
        }
        self.rays.set_full_window();

        self.lit.clear();
        for ray in self.rays.windowed() {
            self.lit.push(ray.start, self.common.packed, 1.0);
            self.lit.push(ray.hit, self.common.packed, 1.0);
        }
        self.soft.clear();
        if self.common.soft && !self.common.xray {
            let fringe = vec2(cos, sin) * self.common.soft_length;
            for ray in self.rays.windowed() {
                self.soft.push(ray.hit, self.common.packed, 1.0);
                self.soft.push(ray.hit + fringe, PackedColor::TRANSPARENT, 1.0);
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
        // Outline of the lit strip: the baseline forward, then the hit points
        // back again.
        let rays = self.rays.rays();
        point_in_polygon(
            point,
            rays.iter()
                .map(|ray| ray.start)
                .chain(rays.iter().rev().map(|ray| ray.hit)),
        )
    }

    pub(crate) fn position(&self) -> WorldPoint {
        WorldPoint::origin()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Aabb;
    use crate::testing::FixtureWorld;
    use crate::world::BodyKind;
    use crate::{Light, LightSet};
    use euclid::point2;

    fn downward_set(rays: usize, view: Aabb) -> LightSet {
        let mut set = LightSet::default();
        set.insert(Light::directional(
            rays,
            LightColor::DEFAULT,
            WorldAngle::degrees(-90.0),
        ));
        set.set_view_bounds(view);
        set
    }

    #[test]
    fn rays_form_a_grid_across_the_view() {
        let world = FixtureWorld::new();
        let mut set = downward_set(5, Aabb::new(-10., 10., -10., 10.));
        set.update(&world);
        let light = set.iter().next().unwrap().1;
        let lit = light.lit_mesh().vertices();
        assert_eq!(lit.len(), 10);
        // span = 20, so five rays at x = −20, −10, 0, 10, 20, from above the
        // view to below it.
        for (i, pair) in lit.chunks_exact(2).enumerate() {
            let x = -20.0 + 10.0 * i as f32;
            assert!((pair[0].position[0] - x).abs() < 1e-3);
            assert!((pair[0].position[1] - 20.0).abs() < 1e-3);
            assert!((pair[1].position[0] - x).abs() < 1e-3);
            assert!((pair[1].position[1] + 20.0).abs() < 1e-3);
            // Directional light does not attenuate.
            assert_eq!(pair[0].shade, 1.0);
            assert_eq!(pair[1].shade, 1.0);
        }
    }

    #[test]
    fn baseline_snapping_survives_view_pans() {
        let world = FixtureWorld::new();
        let mut set = downward_set(5, Aabb::new(-10., 10., -10., 10.));
        set.update(&world);
        let first_x = set.iter().next().unwrap().1.lit_mesh().vertices()[0].position[0];

        // Pan by less than the snap granularity: the ray grid must not move.
        set.set_view_bounds(Aabb::new(-9.7, 10.3, -10., 10.));
        set.update(&world);
        let panned_x = set.iter().next().unwrap().1.lit_mesh().vertices()[0].position[0];
        assert_eq!(first_x, panned_x);
    }

    #[test]
    fn axis_aligned_directions_stay_finite() {
        // A horizontal light zeroes the y portion of the ray grid; the
        // baseline y coordinate must pass through unsnapped rather than
        // becoming NaN.
        let world = FixtureWorld::new();
        let mut set = LightSet::default();
        set.insert(Light::directional(
            7,
            LightColor::DEFAULT,
            WorldAngle::zero(),
        ));
        set.set_view_bounds(Aabb::new(-10., 10., -4., 4.));
        set.update(&world);
        let light = set.iter().next().unwrap().1;
        assert_eq!(light.lit_mesh().len(), 14);
        for v in light.lit_mesh().vertices() {
            assert!(v.position[0].is_finite() && v.position[1].is_finite());
        }
        // Rays travel towards +x.
        let lit = light.lit_mesh().vertices();
        assert!(lit[1].position[0] > lit[0].position[0]);
    }

    #[test]
    fn shadows_fall_away_from_the_light() {
        let mut world = FixtureWorld::new();
        world.add_box(BodyKind::Static, Aabb::new(-2., 2., -6., -5.));
        let mut set = downward_set(41, Aabb::new(-10., 10., -10., 10.));
        set.update(&world);
        let light = set.iter().next().unwrap().1;

        assert!(light.contains(point2(0., -3.)), "above the box is lit");
        assert!(!light.contains(point2(0., -10.)), "below the box is shadow");
        assert!(light.contains(point2(8., -10.)), "beside the box is lit");

        // The soft fringe continues along the light direction from each hit.
        let soft = light.soft_mesh().vertices();
        let on_top = soft
            .chunks_exact(2)
            .find(|pair| pair[0].position[0].abs() < 1e-3)
            .unwrap();
        assert!((on_top[0].position[1] + 5.0).abs() < 1e-3);
        assert!((on_top[1].position[1] + 7.5).abs() < 1e-3);
    }

    #[test]
    fn missing_view_bounds_produce_token_geometry() {
        let world = FixtureWorld::new();
        let mut set = LightSet::default();
        let id = set.insert(Light::directional(
            4,
            LightColor::DEFAULT,
            WorldAngle::degrees(-90.0),
        ));
        set.update(&world);
        // No view: all rays share the token axis and the mesh stays finite.
        for v in set[id].lit_mesh().vertices() {
            assert!(v.position[0].is_finite() && v.position[1].is_finite());
        }
    }
}
