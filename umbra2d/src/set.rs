//! The [`LightSet`]: the collection that owns lights and drives their updates.

use core::fmt;
use core::ops;

use crate::exact;
use crate::light::{Light, UpdateContext};
use crate::math::{Aabb, WorldCoord, WorldPoint, WorldVector};
use crate::world::{ContactFilter, OccluderWorld};

// -------------------------------------------------------------------------------------------------

/// Reach multiplier applied to every light when gamma correction is enabled, so
/// that a gamma-corrected render pass reaches the same perceived distance.
const GAMMA_DISTANCE_SCALE: WorldCoord = 0.625;

/// Default tolerance below which two candidate rays of a silhouette-driven
/// light count as duplicates.
const DEFAULT_DEDUP_EPSILON: WorldCoord = 0.01;

// -------------------------------------------------------------------------------------------------

/// Handle to a [`Light`] within a [`LightSet`].
///
/// Handles are only meaningful for the set that issued them; removing a light
/// invalidates its handle, and a later insertion may reuse it.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LightId(usize);

impl fmt::Debug for LightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LightId({})", self.0)
    }
}

// -------------------------------------------------------------------------------------------------

/// Options applying to every light in a [`LightSet`].
///
/// Obtain via [`LightSet::options_mut()`] and mutate the fields; they take
/// effect on the next update.
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub struct LightSetOptions {
    /// Whether to skip lights lying wholly outside the view bounds. Only
    /// effective once [`LightSet::set_view_bounds()`] has been called; without
    /// view bounds nothing is culled.
    pub culling: bool,
    /// Whether the rendering this set feeds performs gamma correction. When
    /// set, every light's effective reach is scaled by a constant factor so
    /// that its perceived falloff distance stays put.
    pub gamma_correction: bool,
    /// Contact filter applied to the rays of lights that have no filter of
    /// their own.
    pub default_filter: Option<ContactFilter>,
    /// Tolerance below which the candidate rays of silhouette-driven lights
    /// count as duplicates and are dropped.
    pub dedup_epsilon: WorldCoord,
}

impl Default for LightSetOptions {
    fn default() -> Self {
        Self {
            culling: true,
            gamma_correction: false,
            default_filter: None,
            dedup_epsilon: DEFAULT_DEDUP_EPSILON,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// An updatable collection of [`Light`]s sharing one view, one set of options,
/// and one scratch arena.
///
/// Call [`LightSet::update()`] once per frame after the physics step; every
/// active light then recomputes its meshes against the world's current
/// occluders. Between updates, read the lights' meshes and query
/// [`LightSet::point_in_light()`].
#[derive(Debug, Default)]
pub struct LightSet {
    /// Slot storage so that [`LightId`]s stay stable across removals.
    lights: Vec<Option<Light>>,
    options: LightSetOptions,
    view: Option<Aabb>,
    visible: usize,
    scratch: exact::Scratch,
}

impl LightSet {
    pub fn new(options: LightSetOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    // --- Membership ------------------------------------------------------------------------------

    /// Adds a light, returning its handle. Vacated slots are reused.
    pub fn insert(&mut self, light: Light) -> LightId {
        match self.lights.iter_mut().enumerate().find(|(_, s)| s.is_none()) {
            Some((index, slot)) => {
                *slot = Some(light);
                LightId(index)
            }
            None => {
                self.lights.push(Some(light));
                LightId(self.lights.len() - 1)
            }
        }
    }

    /// Removes and returns a light. Returns [`None`] if the handle is stale.
    pub fn remove(&mut self, id: LightId) -> Option<Light> {
        self.lights.get_mut(id.0).and_then(Option::take)
    }

    /// Removes every light.
    pub fn clear(&mut self) {
        self.lights.clear();
        self.visible = 0;
    }

    pub fn len(&self) -> usize {
        self.lights.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: LightId) -> Option<&Light> {
        self.lights.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: LightId) -> Option<&mut Light> {
        self.lights.get_mut(id.0).and_then(Option::as_mut)
    }

    /// All lights in the set, in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (LightId, &Light)> {
        self.lights
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| Some((LightId(index), slot.as_ref()?)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (LightId, &mut Light)> {
        self.lights
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| Some((LightId(index), slot.as_mut()?)))
    }

    // --- Options and view ------------------------------------------------------------------------

    pub fn options(&self) -> &LightSetOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut LightSetOptions {
        &mut self.options
    }

    /// Sets the world-space bounds of the current view. Culling and the
    /// directional lights' spans derive from these.
    pub fn set_view_bounds(&mut self, view: Aabb) {
        self.view = Some(view);
    }

    /// Convenience form of [`LightSet::set_view_bounds()`] taking a center and
    /// half-extent.
    pub fn set_view_centered(&mut self, center: WorldPoint, half_size: WorldVector) {
        self.view = Some(Aabb::centered(center, half_size));
    }

    /// The view bounds, if any have been set.
    pub fn view_bounds(&self) -> Option<Aabb> {
        self.view
    }

    // --- Update ----------------------------------------------------------------------------------

    /// Recomputes every active light against the world's current occluders.
    pub fn update(&mut self, world: &dyn OccluderWorld) {
        let mut ctx = UpdateContext {
            world,
            view: self.view.unwrap_or(Aabb::ZERO),
            culling: self.options.culling && self.view.is_some(),
            gamma_scale: gamma_scale(&self.options),
            default_filter: self.options.default_filter,
            dedup_epsilon: self.options.dedup_epsilon,
            force: false,
            scratch: &mut self.scratch,
        };
        let mut visible = 0;
        for slot in &mut self.lights {
            if let Some(light) = slot
                && light.is_active()
            {
                light.update(&mut ctx);
                if !light.is_culled() {
                    visible += 1;
                }
            }
        }
        self.visible = visible;
    }

    /// Recomputes one light immediately, bypassing culling, the static-light
    /// cache, and sleeping. The way to make a [static](Light::set_static)
    /// light notice a world change.
    ///
    /// Panics if the handle is stale.
    #[track_caller]
    pub fn force_recompute(&mut self, id: LightId, world: &dyn OccluderWorld) {
        let mut ctx = UpdateContext {
            world,
            view: self.view.unwrap_or(Aabb::ZERO),
            culling: false,
            gamma_scale: gamma_scale(&self.options),
            default_filter: self.options.default_filter,
            dedup_epsilon: self.options.dedup_epsilon,
            force: true,
            scratch: &mut self.scratch,
        };
        let Some(light) = self.lights.get_mut(id.0).and_then(Option::as_mut) else {
            panic!("no light at {id:?}");
        };
        light.update(&mut ctx);
    }

    /// How many active lights the most recent update computed geometry for,
    /// that is, were not culled.
    pub fn visible_last_sweep(&self) -> usize {
        self.visible
    }

    // --- Queries ---------------------------------------------------------------------------------

    /// Whether any active light's area, as of the most recent update, covers
    /// `point`.
    pub fn point_in_light(&self, point: WorldPoint) -> bool {
        self.iter()
            .any(|(_, light)| light.is_active() && light.contains(point))
    }

    /// Whether no active light reaches `point`.
    pub fn point_in_shadow(&self, point: WorldPoint) -> bool {
        !self.point_in_light(point)
    }
}

fn gamma_scale(options: &LightSetOptions) -> WorldCoord {
    if options.gamma_correction {
        GAMMA_DISTANCE_SCALE
    } else {
        1.0
    }
}

impl ops::Index<LightId> for LightSet {
    type Output = Light;

    #[track_caller]
    fn index(&self, id: LightId) -> &Light {
        match self.get(id) {
            Some(light) => light,
            None => panic!("no light at {id:?}"),
        }
    }
}

impl ops::IndexMut<LightId> for LightSet {
    #[track_caller]
    fn index_mut(&mut self, id: LightId) -> &mut Light {
        match self.lights.get_mut(id.0).and_then(Option::as_mut) {
            Some(light) => light,
            None => panic!("no light at {id:?}"),
        }
    }
}

// -------------------------------------------------------------------------------------------------
