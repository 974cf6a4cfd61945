//! [`DirectionalLight`]: silhouette-driven parallel light covering the view.

use core::f32::consts::SQRT_2;
use core::ops::Range;

use euclid::vec2;

use crate::light::{LightCommon, RayCount, UpdateContext};
use crate::math::{Aabb, LightColor, VectorExt as _, WorldAngle, WorldCoord, WorldPoint};
use crate::mesh::LightMesh;

use super::LineLight;

// -------------------------------------------------------------------------------------------------

/// Parallel light covering the whole view, like sunlight, with rays aimed at
/// occluder silhouettes.
///
/// Internally this is a [`LineLight`] re-placed from the view bounds on every
/// update: the baseline sits one view-span behind the view center,
/// perpendicular to the travel direction, and is wide and deep enough to cover
/// the view at any rotation. Distance and position setters therefore have no
/// effect, and without view bounds the light degenerates to a sliver at the
/// origin.
///
/// Constructed via [`Light::exact_directional()`](crate::Light::exact_directional).
#[derive(Clone, Debug)]
pub struct DirectionalLight {
    line: LineLight,
    last_view: Option<Aabb>,
}

/// The baseline must cover the view diagonal however the light is angled.
const WIDTH_SCALE: WorldCoord = SQRT_2;

/// One span behind the center plus one ahead of it.
const DISTANCE_SCALE: WorldCoord = 2.0;

impl DirectionalLight {
    pub(crate) fn new(count: RayCount, color: LightColor, direction: WorldAngle) -> Self {
        let mut line = LineLight::new(
            count,
            color,
            1.0,
            WorldPoint::origin(),
            direction - WorldAngle::degrees(90.0),
            1.0,
        );
        // Sunlight does not fade with distance, and everything in view is in
        // bounds for candidate rays.
        line.set_end_color_scale(0.0);
        line.set_aabb_bounds_only(true);
        // The baseline is placed from the view; attachments never move it.
        line.set_follow_attachment(false);
        Self {
            line,
            last_view: None,
        }
    }

    pub(crate) fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let view = ctx.view;
        if self.line.common().dirty || self.last_view != Some(view) {
            self.last_view = Some(view);
            let size = view.size();
            let span = size.width.max(size.height);
            let (sin, cos) = self.line.common().direction.radians.sin_cos();
            let travel = vec2(cos, sin).perp();
            self.line.place_for_view(
                view.center() - travel * span,
                span * WIDTH_SCALE,
                span * DISTANCE_SCALE,
            );
        }
        self.line.update(ctx);
    }

    /// The direction the light travels.
    pub fn direction(&self) -> WorldAngle {
        (self.line.common().direction + WorldAngle::degrees(90.0)).signed()
    }

    pub(crate) fn set_direction(&mut self, direction: WorldAngle) {
        self.line
            .common_mut()
            .set_direction(direction - WorldAngle::degrees(90.0));
    }

    pub(crate) fn contains(&self, point: WorldPoint) -> bool {
        self.line.contains(point)
    }

    pub(crate) fn lit(&self) -> &LightMesh {
        self.line.lit()
    }

    pub(crate) fn soft(&self) -> &LightMesh {
        self.line.soft()
    }

    pub(crate) fn window(&self) -> Range<usize> {
        self.line.window()
    }

    pub(crate) fn peak_rays(&self) -> usize {
        self.line.peak_rays()
    }

    pub(crate) fn set_ray_count(&mut self, count: RayCount) {
        self.line.set_ray_count(count);
    }

    pub(crate) fn sleeping(&self) -> bool {
        self.line.sleeping()
    }

    pub(crate) fn set_allow_sleeping(&mut self, allow: bool) {
        self.line.set_allow_sleeping(allow);
    }

    pub(crate) fn set_ignore_static_bodies(&mut self, ignore: bool) {
        self.line.set_ignore_static_bodies(ignore);
    }

    /// The view-derived baseline center, not a user-settable position.
    pub(crate) fn position(&self) -> WorldPoint {
        self.line.position()
    }

    pub(crate) fn set_position(&mut self, _position: WorldPoint) {
        // Placed from the view bounds.
    }

    pub(crate) fn common(&self) -> &LightCommon {
        self.line.common()
    }

    pub(crate) fn common_mut(&mut self) -> &mut LightCommon {
        self.line.common_mut()
    }
}

// -------------------------------------------------------------------------------------------------
