//! The [`Light`] type: construction, shared state, and the per-frame update
//! entry point. The geometry algorithms themselves live in the variant modules
//! and in [`crate::exact`].

use core::fmt;
use core::ops::Range;

use euclid::{point2, vec2};
use itertools::Itertools as _;
use manyfmt::Refmt as _;

use crate::exact;
use crate::math::lines::{self, Wireframe};
use crate::math::{
    Aabb, LightColor, PackedColor, VectorExt as _, WorldAngle, WorldCoord, WorldPoint, WorldVector,
};
use crate::mesh::{LightMesh, LightVertex, MeshTopology};
use crate::ray::{CastPolicy, Ray};
use crate::util::ConciseDebug;
use crate::world::{BodyId, ContactFilter, OccluderWorld};

mod chain;
pub use chain::ChainLight;
mod directional;
pub use directional::DirectionalLight;
mod positional;
pub use positional::{ConeLight, PointLight};

// -------------------------------------------------------------------------------------------------

/// Fewest rays any light may use; the meshes degenerate below this.
pub(crate) const MIN_RAYS: usize = 3;

/// Smallest effective reach of a light. Distances are clamped up to this after
/// gamma scaling so that ray aiming never degenerates.
pub(crate) const MIN_DISTANCE: WorldCoord = 0.01;

/// Default world-space length of the soft shadow fringe.
pub(crate) const DEFAULT_SOFT_LENGTH: WorldCoord = 2.5;

/// Position setters ignore movements smaller than this, so that feeding a light
/// its own position back does not dirty it.
pub(crate) const POSITION_EPSILON: WorldCoord = 0.001;

// -------------------------------------------------------------------------------------------------

/// One light source in a 2D scene, together with the mesh geometry computed for
/// it on the most recent [`LightSet::update()`](crate::LightSet::update).
///
/// The variants differ in the shape of the lit region (radial fan, cone,
/// baseline strip, chain of strips, whole-view parallel light) and in how rays
/// are aimed: the plain variants cast a fixed fan of evenly spaced rays, while
/// the `Exact*` variants, from [`crate::exact`], aim rays at the silhouettes of
/// the occluders actually present and so resolve corners a fixed fan would
/// blur, usually with far fewer rays.
///
/// Construct lights with [`Light::point()`] and the other constructors here;
/// the variant structs themselves expose the parameters unique to each shape.
#[derive(Clone)]
#[non_exhaustive]
pub enum Light {
    /// Radial light: a fixed fan of rays in all directions.
    Point(PointLight),
    /// Radial light restricted to an angular wedge.
    Cone(ConeLight),
    /// Parallel rays covering the whole view, like sunlight.
    Directional(DirectionalLight),
    /// Light emitted sideways from a polyline.
    Chain(ChainLight),
    /// Silhouette-driven radial light.
    ExactPoint(exact::PointLight),
    /// Silhouette-driven cone light.
    ExactCone(exact::ConeLight),
    /// Silhouette-driven light emitted from a baseline segment.
    ExactLine(exact::LineLight),
    /// Silhouette-driven parallel light covering the whole view.
    ExactDirectional(exact::DirectionalLight),
    /// Silhouette-driven chain of baseline lights.
    ExactChain(exact::ChainLight),
}

/// Ray budget of a silhouette-driven light: a fixed number of base rays plus
/// room for rays aimed at occluder features.
///
/// `usize` converts with the extra budget defaulting to twice the base count,
/// so plain numbers can be passed where a `RayCount` is expected.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RayCount {
    base: usize,
    extra: usize,
}

impl RayCount {
    /// A budget of `base` evenly spaced rays plus `2 * base` feature rays.
    #[inline]
    pub fn new(base: usize) -> Self {
        Self::with_extra(base, base.max(MIN_RAYS) * 2)
    }

    /// A budget with an explicit feature-ray allowance.
    #[inline]
    pub fn with_extra(base: usize, extra: usize) -> Self {
        Self {
            base: base.max(MIN_RAYS),
            extra,
        }
    }

    /// The number of evenly spaced rays always cast.
    #[inline]
    pub fn base(self) -> usize {
        self.base
    }

    /// The number of additional rays available for occluder features.
    #[inline]
    pub fn extra(self) -> usize {
        self.extra
    }

    pub(crate) fn budget(self) -> usize {
        self.base + self.extra
    }
}

impl From<usize> for RayCount {
    #[inline]
    fn from(base: usize) -> Self {
        Self::new(base)
    }
}

/// Which side of its vertex polyline a chain light shines towards.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, exhaust::Exhaust)]
#[expect(clippy::exhaustive_enums)]
pub enum ChainSide {
    /// The side a quarter turn counterclockwise from each segment's direction.
    Left,
    /// The side a quarter turn clockwise from each segment's direction.
    Right,
}

impl ChainSide {
    pub(crate) fn sign(self) -> WorldCoord {
        match self {
            ChainSide::Left => 1.0,
            ChainSide::Right => -1.0,
        }
    }
}

// -------------------------------------------------------------------------------------------------

macro_rules! dispatch {
    ($target:expr, $light:ident => $body:expr) => {
        match $target {
            Light::Point($light) => $body,
            Light::Cone($light) => $body,
            Light::Directional($light) => $body,
            Light::Chain($light) => $body,
            Light::ExactPoint($light) => $body,
            Light::ExactCone($light) => $body,
            Light::ExactLine($light) => $body,
            Light::ExactDirectional($light) => $body,
            Light::ExactChain($light) => $body,
        }
    };
}

impl Light {
    // --- Constructors ----------------------------------------------------------------------------

    /// Creates a [`PointLight`] of `rays` evenly spaced rays at `position`.
    #[inline]
    pub fn point(
        rays: usize,
        color: LightColor,
        distance: WorldCoord,
        position: WorldPoint,
    ) -> Self {
        Light::Point(PointLight::new(rays, color, distance, position))
    }

    /// Creates a [`ConeLight`] spanning `direction ± half_angle`.
    #[inline]
    pub fn cone(
        rays: usize,
        color: LightColor,
        distance: WorldCoord,
        position: WorldPoint,
        direction: WorldAngle,
        half_angle: WorldAngle,
    ) -> Self {
        Light::Cone(ConeLight::new(
            rays, color, distance, position, direction, half_angle,
        ))
    }

    /// Creates a [`DirectionalLight`] shining across the whole view towards
    /// `direction`.
    #[inline]
    pub fn directional(rays: usize, color: LightColor, direction: WorldAngle) -> Self {
        Light::Directional(DirectionalLight::new(rays, color, direction))
    }

    /// Creates a [`ChainLight`] emitting from the polyline `vertices` towards
    /// `side`.
    #[inline]
    pub fn chain(
        rays: usize,
        color: LightColor,
        distance: WorldCoord,
        side: ChainSide,
        vertices: impl IntoIterator<Item = WorldPoint>,
    ) -> Self {
        Light::Chain(ChainLight::new(rays, color, distance, side, vertices))
    }

    /// Creates an [`exact::PointLight`]: a radial light that aims its rays at
    /// occluder silhouettes.
    #[inline]
    pub fn exact_point(
        rays: impl Into<RayCount>,
        color: LightColor,
        distance: WorldCoord,
        position: WorldPoint,
    ) -> Self {
        Light::ExactPoint(exact::PointLight::new(rays.into(), color, distance, position))
    }

    /// Creates an [`exact::ConeLight`] spanning `direction ± half_angle`.
    #[inline]
    pub fn exact_cone(
        rays: impl Into<RayCount>,
        color: LightColor,
        distance: WorldCoord,
        position: WorldPoint,
        direction: WorldAngle,
        half_angle: WorldAngle,
    ) -> Self {
        Light::ExactCone(exact::ConeLight::new(
            rays.into(),
            color,
            distance,
            position,
            direction,
            half_angle,
        ))
    }

    /// Creates an [`exact::LineLight`]: light emitted from a baseline segment of
    /// the given `width`, a quarter turn counterclockwise from `direction`.
    #[inline]
    pub fn exact_line(
        rays: impl Into<RayCount>,
        color: LightColor,
        distance: WorldCoord,
        position: WorldPoint,
        direction: WorldAngle,
        width: WorldCoord,
    ) -> Self {
        Light::ExactLine(exact::LineLight::new(
            rays.into(),
            color,
            distance,
            position,
            direction,
            width,
        ))
    }

    /// Creates an [`exact::DirectionalLight`] shining across the whole view
    /// towards `direction`.
    #[inline]
    pub fn exact_directional(
        rays: impl Into<RayCount>,
        color: LightColor,
        direction: WorldAngle,
    ) -> Self {
        Light::ExactDirectional(exact::DirectionalLight::new(rays.into(), color, direction))
    }

    /// Creates an [`exact::ChainLight`] emitting from the polyline `vertices`
    /// towards `side`.
    #[inline]
    pub fn exact_chain(
        rays: impl Into<RayCount>,
        color: LightColor,
        distance: WorldCoord,
        side: ChainSide,
        vertices: impl IntoIterator<Item = WorldPoint>,
    ) -> Self {
        Light::ExactChain(exact::ChainLight::new(
            rays.into(),
            color,
            distance,
            side,
            vertices,
        ))
    }

    // --- Update and queries ----------------------------------------------------------------------

    pub(crate) fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        dispatch!(self, light => light.update(ctx));
    }

    /// Whether `point` lies in this light's lit area or soft fringe, as computed
    /// by the most recent update.
    #[inline]
    pub fn contains(&self, point: WorldPoint) -> bool {
        dispatch!(self, light => light.contains(point))
    }

    /// The lit-area mesh computed by the most recent update.
    #[inline]
    pub fn lit_mesh(&self) -> &LightMesh {
        dispatch!(self, light => light.lit())
    }

    /// The soft shadow fringe mesh computed by the most recent update. Empty
    /// when the light is not soft or is x-ray.
    #[inline]
    pub fn soft_mesh(&self) -> &LightMesh {
        dispatch!(self, light => light.soft())
    }

    /// How the mesh vertices are to be assembled into triangles.
    #[inline]
    pub fn topology(&self) -> MeshTopology {
        match self {
            Light::Point(_) | Light::Cone(_) | Light::ExactPoint(_) | Light::ExactCone(_) => {
                MeshTopology::Fan
            }
            _ => MeshTopology::Strip,
        }
    }

    /// The range of sorted rays that contributed to the mesh in the most recent
    /// update. Mostly of diagnostic interest; the meshes already contain only
    /// these rays.
    #[inline]
    pub fn ray_window(&self) -> Range<usize> {
        dispatch!(self, light => light.window())
    }

    /// The most rays any single update of this light has used, for tuning ray
    /// budgets. [`None`] for the fixed-fan variants, whose count never varies.
    #[inline]
    pub fn peak_rays(&self) -> Option<usize> {
        match self {
            Light::ExactPoint(l) => Some(l.peak_rays()),
            Light::ExactCone(l) => Some(l.peak_rays()),
            Light::ExactLine(l) => Some(l.peak_rays()),
            Light::ExactDirectional(l) => Some(l.peak_rays()),
            Light::ExactChain(l) => Some(l.peak_rays()),
            _ => None,
        }
    }

    /// Changes the ray budget, reallocating fan and mesh storage. The fixed
    /// fans use the base count; silhouette-driven lights also keep the extra
    /// allowance.
    pub fn set_ray_count(&mut self, rays: impl Into<RayCount>) {
        let rays = rays.into();
        match self {
            Light::Point(l) => l.set_ray_count(rays.base()),
            Light::Cone(l) => l.set_ray_count(rays.base()),
            Light::Directional(l) => l.set_ray_count(rays.base()),
            Light::Chain(l) => l.set_ray_count(rays.base()),
            Light::ExactPoint(l) => l.set_ray_count(rays),
            Light::ExactCone(l) => l.set_ray_count(rays),
            Light::ExactLine(l) => l.set_ray_count(rays),
            Light::ExactDirectional(l) => l.set_ray_count(rays),
            Light::ExactChain(l) => l.set_ray_count(rays),
        }
    }

    // --- Shared parameters -----------------------------------------------------------------------

    /// The light's color, including alpha.
    #[inline]
    pub fn color(&self) -> LightColor {
        self.common().color
    }

    /// Sets the light's color.
    #[inline]
    pub fn set_color(&mut self, color: LightColor) {
        self.common_mut().set_color(color);
    }

    /// The light's reach, as given to the constructor or
    /// [`Light::set_distance()`].
    ///
    /// When the owning set applies gamma correction, the effective reach used
    /// during updates is this value scaled by the gamma factor.
    #[inline]
    pub fn distance(&self) -> WorldCoord {
        self.common().raw_distance
    }

    /// Sets the light's reach. Has no effect on the directional variants, which
    /// always span the view.
    #[inline]
    pub fn set_distance(&mut self, distance: WorldCoord) {
        self.common_mut().set_raw_distance(distance);
    }

    /// The direction the light points, for the variants that have one.
    #[inline]
    pub fn direction(&self) -> WorldAngle {
        match self {
            Light::ExactDirectional(l) => l.direction(),
            Light::ExactChain(l) => l.direction(),
            _ => self.common().direction,
        }
    }

    /// Aims the light. Plain chain lights, which aim from their vertices,
    /// ignore this; silhouette chains rotate their vertices by it; point
    /// lights have no use for it.
    #[inline]
    pub fn set_direction(&mut self, direction: WorldAngle) {
        match self {
            Light::ExactDirectional(l) => l.set_direction(direction),
            Light::ExactChain(l) => l.set_direction(direction),
            Light::Chain(_) => {}
            _ => self.common_mut().set_direction(direction),
        }
    }

    /// The light's reference position. For directional lights, which have none,
    /// this is the origin (plain variant) or a view-derived point (exact).
    #[inline]
    pub fn position(&self) -> WorldPoint {
        dispatch!(self, light => light.position())
    }

    /// Moves the light. Movements smaller than a thousandth of a unit are
    /// ignored. Directional and plain chain lights place themselves (by view
    /// or by vertices) and ignore this.
    #[inline]
    pub fn set_position(&mut self, position: WorldPoint) {
        dispatch!(self, light => light.set_position(position));
    }

    /// Whether the light renders a soft shadow fringe past its hard edge.
    #[inline]
    pub fn is_soft(&self) -> bool {
        self.common().soft
    }

    /// Enables or disables the soft shadow fringe.
    #[inline]
    pub fn set_soft(&mut self, soft: bool) {
        let common = self.common_mut();
        common.soft = soft;
        common.dirty = true;
    }

    /// World-space length of the soft shadow fringe.
    #[inline]
    pub fn softness_length(&self) -> WorldCoord {
        self.common().soft_length
    }

    /// Sets the length of the soft shadow fringe.
    #[inline]
    pub fn set_softness_length(&mut self, length: WorldCoord) {
        let common = self.common_mut();
        common.soft_length = length;
        common.dirty = true;
    }

    /// Whether the light shines through occluders rather than being stopped.
    #[inline]
    pub fn is_xray(&self) -> bool {
        self.common().xray
    }

    /// Makes the light shine through occluders (no raycasts at all).
    #[inline]
    pub fn set_xray(&mut self, xray: bool) {
        let common = self.common_mut();
        common.xray = xray;
        common.dirty = true;
    }

    /// Whether the light only recomputes when marked dirty by a setter (or by
    /// [`LightSet::force_recompute()`](crate::LightSet::force_recompute)).
    #[inline]
    pub fn is_static(&self) -> bool {
        self.common().static_light
    }

    /// Marks the light static: after the next update it keeps its geometry
    /// until a setter dirties it again, no matter how the world changes.
    #[inline]
    pub fn set_static(&mut self, static_light: bool) {
        let common = self.common_mut();
        common.static_light = static_light;
        common.dirty = true;
    }

    /// Whether the light takes part in updates. Lights are created active;
    /// an inactive light keeps its last geometry but is skipped entirely.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.common().active
    }

    /// Activates or deactivates the light.
    #[inline]
    pub fn set_active(&mut self, active: bool) {
        self.common_mut().active = active;
    }

    /// Whether the most recent update skipped this light as outside the view.
    #[inline]
    pub fn is_culled(&self) -> bool {
        self.common().culled
    }

    /// Whether the most recent update found nothing changed around this light
    /// and reused its rays. Always false for the fixed-fan variants.
    #[inline]
    pub fn is_sleeping(&self) -> bool {
        match self {
            Light::ExactPoint(l) => l.sleeping(),
            Light::ExactCone(l) => l.sleeping(),
            Light::ExactLine(l) => l.sleeping(),
            Light::ExactDirectional(l) => l.sleeping(),
            Light::ExactChain(l) => l.sleeping(),
            _ => false,
        }
    }

    /// Permits or forbids the silhouette-driven variants to reuse rays when the
    /// occluders around them have not changed. No effect on other variants.
    #[inline]
    pub fn set_allow_sleeping(&mut self, allow: bool) {
        match self {
            Light::ExactPoint(l) => l.set_allow_sleeping(allow),
            Light::ExactCone(l) => l.set_allow_sleeping(allow),
            Light::ExactLine(l) => l.set_allow_sleeping(allow),
            Light::ExactDirectional(l) => l.set_allow_sleeping(allow),
            Light::ExactChain(l) => l.set_allow_sleeping(allow),
            _ => {}
        }
    }

    /// Makes the silhouette-driven variants disregard static occluders when
    /// collecting silhouettes (rays still collide with them). No effect on
    /// other variants.
    #[inline]
    pub fn set_ignore_static_bodies(&mut self, ignore: bool) {
        match self {
            Light::ExactPoint(l) => l.set_ignore_static_bodies(ignore),
            Light::ExactCone(l) => l.set_ignore_static_bodies(ignore),
            Light::ExactLine(l) => l.set_ignore_static_bodies(ignore),
            Light::ExactDirectional(l) => l.set_ignore_static_bodies(ignore),
            Light::ExactChain(l) => l.set_ignore_static_bodies(ignore),
            _ => {}
        }
    }

    /// The light's own contact filter, overriding the set-wide default.
    #[inline]
    pub fn filter(&self) -> Option<ContactFilter> {
        self.common().filter
    }

    /// Sets a contact filter deciding which occluders stop this light's rays,
    /// or [`None`] to use the owning set's default.
    #[inline]
    pub fn set_filter(&mut self, filter: Option<ContactFilter>) {
        let common = self.common_mut();
        common.filter = filter;
        common.dirty = true;
    }

    // --- Body attachment -------------------------------------------------------------------------

    /// Attaches the light to a body: every update repositions the light at the
    /// body's pose plus the body-local `offset`, aimed at the body's angle plus
    /// `angle`. Static lights do not follow their body until dirtied.
    #[inline]
    pub fn attach_to_body(&mut self, body: BodyId, offset: WorldVector, angle: WorldAngle) {
        let common = self.common_mut();
        common.attachment = Some(Attachment {
            body,
            offset,
            angle,
        });
        common.dirty = true;
    }

    /// Detaches the light from its body, keeping its current placement.
    #[inline]
    pub fn detach_from_body(&mut self) {
        let common = self.common_mut();
        common.attachment = None;
        common.dirty = true;
    }

    /// The body the light is attached to, if any.
    #[inline]
    pub fn attached_body(&self) -> Option<BodyId> {
        self.common().attachment.as_ref().map(|a| a.body)
    }

    /// Whether the attached body's own shapes are invisible to this light's
    /// rays, so a light carried by a body is not shadowed by it.
    #[inline]
    pub fn ignores_attached_body(&self) -> bool {
        self.common().ignore_attached_body
    }

    /// Makes the light's rays pass through the shapes of its attached body.
    #[inline]
    pub fn set_ignore_attached_body(&mut self, ignore: bool) {
        let common = self.common_mut();
        common.ignore_attached_body = ignore;
        common.dirty = true;
    }

    // --- Internal --------------------------------------------------------------------------------

    pub(crate) fn common(&self) -> &LightCommon {
        dispatch!(self, light => light.common())
    }

    pub(crate) fn common_mut(&mut self) -> &mut LightCommon {
        dispatch!(self, light => light.common_mut())
    }
}

impl fmt::Debug for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Light::Point(_) => "PointLight",
            Light::Cone(_) => "ConeLight",
            Light::Directional(_) => "DirectionalLight",
            Light::Chain(_) => "ChainLight",
            Light::ExactPoint(_) => "exact::PointLight",
            Light::ExactCone(_) => "exact::ConeLight",
            Light::ExactLine(_) => "exact::LineLight",
            Light::ExactDirectional(_) => "exact::DirectionalLight",
            Light::ExactChain(_) => "exact::ChainLight",
        };
        let common = self.common();
        f.debug_struct(name)
            .field("position", &self.position().refmt(&ConciseDebug))
            .field("direction", &common.direction)
            .field("color", &common.color.refmt(&ConciseDebug))
            .field("distance", &common.raw_distance)
            .field("static", &common.static_light)
            .field("culled", &common.culled)
            .finish_non_exhaustive()
    }
}

// -------------------------------------------------------------------------------------------------

/// State every light variant carries.
#[derive(Clone, Debug)]
pub(crate) struct LightCommon {
    pub color: LightColor,
    /// `color` packed for the vertex buffers, kept in sync by `set_color`.
    pub packed: PackedColor,
    /// Reach as last set by the user, before gamma scaling.
    pub raw_distance: WorldCoord,
    /// Effective reach: `raw_distance` gamma-scaled and clamped upward to
    /// [`MIN_DISTANCE`]. Recomputed by `refresh_distance` each update.
    pub distance: WorldCoord,
    pub direction: WorldAngle,
    pub soft_length: WorldCoord,
    pub soft: bool,
    pub xray: bool,
    pub static_light: bool,
    /// Parameters changed since the light's geometry was last computed.
    pub dirty: bool,
    pub culled: bool,
    pub active: bool,
    pub ignore_attached_body: bool,
    pub attachment: Option<Attachment>,
    pub filter: Option<ContactFilter>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Attachment {
    pub body: BodyId,
    /// Body-local offset of the light from the body origin.
    pub offset: WorldVector,
    /// Aim offset added to the body's angle.
    pub angle: WorldAngle,
}

impl LightCommon {
    pub fn new(color: LightColor, distance: WorldCoord, direction: WorldAngle) -> Self {
        Self {
            color,
            packed: PackedColor::from(color),
            raw_distance: distance,
            distance: distance.max(MIN_DISTANCE),
            direction: direction.signed(),
            soft_length: DEFAULT_SOFT_LENGTH,
            soft: true,
            xray: false,
            static_light: false,
            dirty: true,
            culled: false,
            active: true,
            ignore_attached_body: false,
            attachment: None,
            filter: None,
        }
    }

    pub fn set_color(&mut self, color: LightColor) {
        self.color = color;
        self.packed = PackedColor::from(color);
        self.dirty = true;
    }

    pub fn set_raw_distance(&mut self, distance: WorldCoord) {
        if distance != self.raw_distance {
            self.raw_distance = distance;
            self.dirty = true;
        }
    }

    /// Applies the set-wide gamma scale to produce the effective reach. Only
    /// known at update time, because the light does not know its set's options.
    pub fn refresh_distance(&mut self, gamma_scale: WorldCoord) {
        let effective = (self.raw_distance * gamma_scale).max(MIN_DISTANCE);
        if effective != self.distance {
            self.distance = effective;
            self.dirty = true;
        }
    }

    pub fn set_direction(&mut self, direction: WorldAngle) {
        let direction = direction.signed();
        if direction != self.direction {
            self.direction = direction;
            self.dirty = true;
        }
    }

    /// The cast policy for this light's rays under the given context.
    pub fn cast_policy(&self, ctx: &UpdateContext<'_>) -> CastPolicy {
        CastPolicy {
            filter: self.filter.or(ctx.default_filter),
            ignore_body: match &self.attachment {
                Some(attachment) if self.ignore_attached_body => Some(attachment.body),
                _ => None,
            },
        }
    }

    /// Where the attachment currently places the light: the body pose with the
    /// attachment offsets applied. [`None`] if there is nothing to follow
    /// (no attachment, unknown body, or a static light, which holds still).
    pub fn attachment_pose(&self, world: &dyn OccluderWorld) -> Option<(WorldPoint, WorldAngle)> {
        let attachment = self.attachment.as_ref()?;
        if self.static_light {
            return None;
        }
        let (position, angle) = world.body_transform(attachment.body)?;
        let (sin, cos) = angle.radians.sin_cos();
        Some((
            position + attachment.offset.rotated_by_sin_cos(sin, cos),
            angle + attachment.angle,
        ))
    }
}

// -------------------------------------------------------------------------------------------------

/// Everything a light needs from its set and world for one update.
pub(crate) struct UpdateContext<'a> {
    pub world: &'a dyn OccluderWorld,
    /// Current view bounds; [`Aabb::ZERO`] when the set has none.
    pub view: Aabb,
    /// Whether lights outside `view` should be skipped.
    pub culling: bool,
    /// Factor applied to raw distances (1.0, or the gamma correction factor).
    pub gamma_scale: WorldCoord,
    /// Filter for lights that have none of their own.
    pub default_filter: Option<ContactFilter>,
    /// Tolerance below which candidate rays count as duplicates.
    pub dedup_epsilon: WorldCoord,
    /// One-shot recompute: bypass culling, the static-light cache, and sleeping.
    pub force: bool,
    /// Set-owned arena reused by each light's silhouette query in turn.
    pub scratch: &'a mut exact::Scratch,
}

// -------------------------------------------------------------------------------------------------

/// Fills the lit fan and soft fringe of a radial light from its cast rays.
///
/// The lit mesh is a triangle fan anchored at the light position; the soft mesh
/// is a strip of hit points and their extrusions along each ray, shrinking to
/// nothing where the ray was unobstructed.
pub(crate) fn build_fan_meshes(
    lit: &mut LightMesh,
    soft: &mut LightMesh,
    anchor: WorldPoint,
    rays: &[Ray],
    common: &LightCommon,
) {
    lit.clear();
    lit.push(anchor, common.packed, 1.0);
    for ray in rays {
        lit.push(ray.hit, common.packed, 1.0 - ray.fraction);
    }

    soft.clear();
    if !common.soft || common.xray {
        return;
    }
    for ray in rays {
        let shade = 1.0 - ray.fraction;
        soft.push(ray.hit, common.packed, shade);
        soft.push(
            ray.hit + vec2(ray.cos, ray.sin) * (common.soft_length * shade),
            PackedColor::TRANSPARENT,
            0.0,
        );
    }
}

// -------------------------------------------------------------------------------------------------

/// Wireframe colors for rays and edges; translucent so that overdraw reads as
/// density.
const RAY_COLOR: LightColor = LightColor::new(0., 1., 1., 0.1);
const HARD_EDGE_COLOR: LightColor = LightColor::new(1., 0., 0., 0.25);
const SOFT_EDGE_COLOR: LightColor = LightColor::new(1., 1., 0., 0.25);

fn line_vertex(v: &LightVertex) -> lines::Vertex {
    lines::Vertex::from(point2(v.position[0], v.position[1]))
}

impl Wireframe for Light {
    /// Draws each ray, the hard shadow edge connecting the hit points, and the
    /// outer edge of the soft fringe, in distinct translucent colors.
    #[mutants::skip] // debug visualization, not relied upon by anything
    fn wireframe_points<E: Extend<[lines::Vertex; 2]>>(&self, output: &mut E) {
        let lit = self.lit_mesh().vertices();
        match self.topology() {
            MeshTopology::Fan => {
                if let Some((anchor, hits)) = lit.split_first() {
                    lines::colorize(output, RAY_COLOR)
                        .extend(hits.iter().map(|hit| [line_vertex(anchor), line_vertex(hit)]));
                    lines::colorize(output, HARD_EDGE_COLOR).extend(
                        hits.iter()
                            .tuple_windows()
                            .map(|(a, b)| [line_vertex(a), line_vertex(b)]),
                    );
                }
            }
            MeshTopology::Strip => {
                lines::colorize(output, RAY_COLOR).extend(
                    lit.chunks_exact(2)
                        .map(|pair| [line_vertex(&pair[0]), line_vertex(&pair[1])]),
                );
                lines::colorize(output, HARD_EDGE_COLOR).extend(
                    lit.iter()
                        .skip(1)
                        .step_by(2)
                        .tuple_windows()
                        .map(|(a, b)| [line_vertex(a), line_vertex(b)]),
                );
            }
        }
        lines::colorize(output, SOFT_EDGE_COLOR).extend(
            self.soft_mesh()
                .vertices()
                .iter()
                .skip(1)
                .step_by(2)
                .tuple_windows()
                .map(|(a, b)| [line_vertex(a), line_vertex(b)]),
        );
    }
}

// -------------------------------------------------------------------------------------------------
