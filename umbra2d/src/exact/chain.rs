//! [`ChainLight`]: silhouette-driven light emitted sideways from a polyline.

use core::ops::Range;

use euclid::vec2;

use crate::light::{ChainSide, LightCommon, MIN_RAYS, RayCount, UpdateContext};
use crate::math::{LightColor, VectorExt as _, WorldAngle, WorldCoord, WorldPoint};
use crate::mesh::LightMesh;

use super::LineLight;

// -------------------------------------------------------------------------------------------------

/// Light emitted from one side of a polyline, with rays aimed at occluder
/// silhouettes: one [`LineLight`] per chain segment, their strips joined into
/// a single mesh.
///
/// The chain has an envelope direction, local +x until rotated by
/// [`set_direction`](ChainLight::set_direction): each segment's reach is the
/// chain distance scaled by how squarely the segment's emission side faces
/// that direction, and its far edge is sheared sideways to meet its
/// neighbors', so the whole chain lights up to a common envelope line. A
/// segment whose emission side faces away from the envelope direction gets
/// only a token sliver.
///
/// `direction` rotates the vertices and the envelope direction together,
/// turning the light rigidly about the chain's
/// [`position`](ChainLight::set_position).
///
/// Constructed via [`Light::exact_chain()`](crate::Light::exact_chain).
#[derive(Clone, Debug)]
pub struct ChainLight {
    common: LightCommon,
    count: RayCount,
    side: ChainSide,
    /// Chain-local vertices; world placement applies `direction` then
    /// `position`.
    vertices: Vec<WorldPoint>,
    position: WorldPoint,
    end_scale: WorldCoord,
    allow_sleeping: bool,
    ignore_static_bodies: bool,
    /// One per segment, re-placed every update.
    lights: Vec<LineLight>,
    lit: LightMesh,
    soft: LightMesh,
    window_len: usize,
}

impl ChainLight {
    pub(crate) fn new(
        count: RayCount,
        color: LightColor,
        distance: WorldCoord,
        side: ChainSide,
        vertices: impl IntoIterator<Item = WorldPoint>,
    ) -> Self {
        let mut light = Self {
            common: LightCommon::new(color, distance, WorldAngle::zero()),
            count,
            side,
            vertices: vertices.into_iter().collect(),
            position: WorldPoint::origin(),
            end_scale: 1.0,
            allow_sleeping: true,
            ignore_static_bodies: false,
            lights: Vec::new(),
            lit: LightMesh::default(),
            soft: LightMesh::default(),
            window_len: 0,
        };
        light.rebuild_lights();
        light
    }

    /// Rebuilds the per-segment lights, splitting the ray budget in proportion
    /// to segment length (with a floor of [`MIN_RAYS`] per unit), and sizes
    /// the joined meshes to fit.
    fn rebuild_lights(&mut self) {
        self.lights.clear();
        self.window_len = 0;
        let total: WorldCoord = self
            .vertices
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).length())
            .sum();
        if !(total > 0.0) {
            self.lit = LightMesh::default();
            self.soft = LightMesh::default();
            return;
        }
        let base_per_unit = (self.count.base() as WorldCoord / total).max(MIN_RAYS as WorldCoord);
        let extra_per_unit = self.count.extra() as WorldCoord / total;
        let mut capacity = 0;
        for pair in self.vertices.windows(2) {
            let length = (pair[1] - pair[0]).length();
            let count = RayCount::with_extra(
                (base_per_unit * length).round() as usize,
                (extra_per_unit * length).round() as usize,
            );
            // Two extra vertices join this piece to the previous one.
            capacity += count.budget() * 2 + 2;
            let mut light = LineLight::new(
                count,
                self.common.color,
                self.common.raw_distance,
                pair[0].lerp(pair[1], 0.5),
                WorldAngle::zero(),
                length,
            );
            // The chain places its segments itself; the attachment is synced
            // into them only so its body can be excluded from their rays.
            light.set_follow_attachment(false);
            light.set_allow_sleeping(self.allow_sleeping);
            light.set_ignore_static_bodies(self.ignore_static_bodies);
            self.lights.push(light);
        }
        self.apply_end_scale();
        self.lit = LightMesh::with_capacity(capacity);
        self.soft = LightMesh::with_capacity(capacity);
        self.common.dirty = true;
    }

    /// The end scale shapes only the outermost edges of the chain.
    fn apply_end_scale(&mut self) {
        if let Some(first) = self.lights.first_mut() {
            first.set_end_scale(self.end_scale);
        }
        if let Some(last) = self.lights.last_mut() {
            last.set_end_scale(self.end_scale);
        }
    }

    pub(crate) fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        if let Some((position, _)) = self.common.attachment_pose(ctx.world) {
            if position != self.position {
                self.position = position;
                self.common.dirty = true;
            }
        }
        let distance = self.common.raw_distance;
        let (sin, cos) = self.common.direction.radians.sin_cos();
        let envelope = vec2(cos, sin);
        let last_index = self.lights.len().wrapping_sub(1);
        for (i, light) in self.lights.iter_mut().enumerate() {
            let a = self.position + self.vertices[i].to_vector().rotated_by_sin_cos(sin, cos);
            let b = self.position + self.vertices[i + 1].to_vector().rotated_by_sin_cos(sin, cos);
            let baseline = (b - a).normalize_or_zero() * self.side.sign();
            let emission = baseline.perp();

            Self::sync_common(&self.common, light);
            light
                .common_mut()
                .set_direction(WorldAngle::radians(baseline.y.atan2(baseline.x)));
            light.set_position(a.lerp(b, 0.5));
            light
                .common_mut()
                .set_raw_distance(envelope.dot(emission) * distance);
            let mut offset = (emission.x * envelope.y - emission.y * envelope.x) * distance;
            if self.end_scale != 1.0 {
                let correction = light.width() * 0.5 * (self.end_scale - 1.0);
                if i == 0 {
                    offset -= correction;
                }
                if i == last_index {
                    offset += correction;
                }
            }
            light.set_center_offset(offset);
            light.update(ctx);
        }
        self.assemble_meshes();
        self.common.culled =
            !self.lights.is_empty() && self.lights.iter().all(|light| light.common().culled);
        self.common.dirty = false;
    }

    /// Copies the chain-level parameters into a segment light before its
    /// update, carrying dirtiness along.
    fn sync_common(common: &LightCommon, light: &mut LineLight) {
        let sub = light.common_mut();
        sub.color = common.color;
        sub.packed = common.packed;
        sub.soft = common.soft;
        sub.soft_length = common.soft_length;
        sub.xray = common.xray;
        sub.static_light = common.static_light;
        sub.filter = common.filter;
        sub.attachment = common.attachment;
        sub.ignore_attached_body = common.ignore_attached_body;
        if common.dirty {
            sub.dirty = true;
        }
    }

    /// Joins the segment strips into one mesh, with a degenerate vertex pair
    /// bridging each gap.
    fn assemble_meshes(&mut self) {
        self.window_len = 0;
        self.lit.clear();
        self.soft.clear();
        let join_soft = self.common.soft && !self.common.xray;
        for light in &self.lights {
            if light.common().culled {
                continue;
            }
            self.window_len += light.window().len();
            extend_with_join(&mut self.lit, light.lit());
            if join_soft {
                extend_with_join(&mut self.soft, light.soft());
            }
        }
    }

    pub(crate) fn contains(&self, point: WorldPoint) -> bool {
        self.lights.iter().any(|light| light.contains(point))
    }

    // --- Parameters ------------------------------------------------------------------------------

    /// The envelope direction, as a rotation of the chain's local +x.
    pub fn direction(&self) -> WorldAngle {
        self.common.direction
    }

    pub(crate) fn set_direction(&mut self, direction: WorldAngle) {
        self.common.set_direction(direction);
    }

    /// The chain-local vertices of the polyline.
    pub fn vertices(&self) -> &[WorldPoint] {
        &self.vertices
    }

    /// Replaces the polyline, redistributing the ray budget over the new
    /// segments.
    pub fn set_vertices(&mut self, vertices: impl IntoIterator<Item = WorldPoint>) {
        self.vertices = vertices.into_iter().collect();
        self.rebuild_lights();
    }

    /// Which side of the polyline the light shines towards.
    pub fn chain_side(&self) -> ChainSide {
        self.side
    }

    pub fn set_chain_side(&mut self, side: ChainSide) {
        if side != self.side {
            self.side = side;
            self.common.dirty = true;
        }
    }

    /// Far-edge scale of the chain's outermost segments.
    pub fn end_scale(&self) -> WorldCoord {
        self.end_scale
    }

    /// Widens (>1) or narrows (<1) the chain's outermost far edges, so chains
    /// can flare or taper at the ends.
    pub fn set_end_scale(&mut self, end_scale: WorldCoord) {
        if end_scale != self.end_scale {
            self.end_scale = end_scale;
            self.apply_end_scale();
            self.common.dirty = true;
        }
    }

    // --- Plumbing --------------------------------------------------------------------------------

    pub(crate) fn lit(&self) -> &LightMesh {
        &self.lit
    }

    pub(crate) fn soft(&self) -> &LightMesh {
        &self.soft
    }

    pub(crate) fn window(&self) -> Range<usize> {
        0..self.window_len
    }

    /// Summed over the segment lights.
    pub(crate) fn peak_rays(&self) -> usize {
        self.lights.iter().map(LineLight::peak_rays).sum()
    }

    pub(crate) fn set_ray_count(&mut self, count: RayCount) {
        self.count = count;
        self.rebuild_lights();
    }

    /// The chain sleeps only when every segment does.
    pub(crate) fn sleeping(&self) -> bool {
        !self.lights.is_empty() && self.lights.iter().all(LineLight::sleeping)
    }

    pub(crate) fn set_allow_sleeping(&mut self, allow: bool) {
        self.allow_sleeping = allow;
        for light in &mut self.lights {
            light.set_allow_sleeping(allow);
        }
    }

    pub(crate) fn set_ignore_static_bodies(&mut self, ignore: bool) {
        self.ignore_static_bodies = ignore;
        for light in &mut self.lights {
            light.set_ignore_static_bodies(ignore);
        }
        self.common.dirty = true;
    }

    pub(crate) fn position(&self) -> WorldPoint {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: WorldPoint) {
        if position != self.position {
            self.position = position;
            self.common.dirty = true;
        }
    }

    pub(crate) fn common(&self) -> &LightCommon {
        &self.common
    }

    pub(crate) fn common_mut(&mut self) -> &mut LightCommon {
        &mut self.common
    }
}

fn extend_with_join(dest: &mut LightMesh, piece: &LightMesh) {
    if piece.is_empty() {
        return;
    }
    if let Some(&last) = dest.vertices().last() {
        dest.push_vertex(last);
        dest.push_vertex(piece.vertices()[0]);
    }
    for &vertex in piece.vertices() {
        dest.push_vertex(vertex);
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use euclid::point2;

    use super::*;
    use crate::light::Light;
    use crate::math::Aabb;
    use crate::set::LightSet;
    use crate::testing::FixtureWorld;
    use crate::world::BodyKind;

    /// A chain running down the y axis, shining towards +x.
    fn wall_light(distance: WorldCoord) -> Light {
        Light::exact_chain(
            8,
            LightColor::DEFAULT,
            distance,
            ChainSide::Left,
            [point2(0., 2.), point2(0., -2.)],
        )
    }

    fn updated(light: Light, world: &FixtureWorld) -> LightSet {
        let mut set = LightSet::default();
        set.insert(light);
        set.update(world);
        set
    }

    #[test]
    fn single_segment_shines_off_its_emission_side() {
        let world = FixtureWorld::new();
        let set = updated(wall_light(5.0), &world);
        let light = set.iter().next().unwrap().1;

        assert!(light.contains(point2(3., 0.)));
        assert!(light.contains(point2(4.5, 1.5)));
        assert!(!light.contains(point2(-1., 0.)), "nothing behind the chain");
        assert!(!light.contains(point2(3., 4.)), "nothing past the ends");
        // Strip pairs run from the baseline (x = 0) to the envelope (x = 5).
        for pair in light.lit_mesh().vertices().chunks_exact(2) {
            assert!((pair[0].position[0] - 0.0).abs() < 1e-4);
            assert!((pair[1].position[0] - 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn occluders_shadow_the_chain() {
        let mut world = FixtureWorld::new();
        world.add_box(BodyKind::Static, Aabb::new(2., 3., -0.5, 0.5));
        let set = updated(wall_light(6.0), &world);
        let light = set.iter().next().unwrap().1;

        assert!(light.contains(point2(1., 0.)), "before the box");
        assert!(!light.contains(point2(5., 0.)), "behind the box");
        assert!(light.contains(point2(5., 1.5)), "beside the shadow");
    }

    #[test]
    fn segments_join_with_degenerate_pairs() {
        let world = FixtureWorld::new();
        let light = Light::exact_chain(
            8,
            LightColor::DEFAULT,
            5.0,
            ChainSide::Left,
            [point2(0., 2.), point2(0., 0.), point2(0., -2.)],
        );
        let set = updated(light, &world);
        let light = set.iter().next().unwrap().1;

        // Each 2-unit segment gets 6 base rays (3 per unit), 12 vertices,
        // plus the 2-vertex bridge between the pieces.
        assert_eq!(light.ray_window(), 0..12);
        let lit = light.lit_mesh().vertices();
        assert_eq!(lit.len(), 26);
        assert_eq!(lit[12], lit[11], "bridge repeats the last vertex");
        assert_eq!(lit[13], lit[14], "and the next piece's first");
    }

    #[test]
    fn rotation_turns_the_whole_light() {
        let world = FixtureWorld::new();
        let mut set = LightSet::default();
        let id = set.insert(wall_light(5.0));
        set[id].set_direction(WorldAngle::degrees(90.));
        set.update(&world);

        // The chain now lies along the x axis and shines +y.
        assert_eq!(set[id].direction(), WorldAngle::degrees(90.));
        assert!(set[id].contains(point2(0., 3.)));
        assert!(!set[id].contains(point2(0., -1.)));
        assert!(!set[id].contains(point2(3., 0.)));
    }

    #[test]
    fn segments_facing_away_from_the_envelope_get_a_sliver() {
        let world = FixtureWorld::new();
        // The second segment's emission side faces +y, square to the +x
        // envelope direction, so it contributes almost nothing.
        let light = Light::exact_chain(
            8,
            LightColor::DEFAULT,
            5.0,
            ChainSide::Left,
            [point2(0., 2.), point2(0., -2.), point2(4., -2.)],
        );
        let set = updated(light, &world);
        let light = set.iter().next().unwrap().1;

        assert!(light.contains(point2(3., 0.)), "first segment at full reach");
        assert!(!light.contains(point2(2., -1.)), "second segment dark");
    }

    #[test]
    fn chain_moves_and_sleeps_as_a_unit() {
        let mut world = FixtureWorld::new();
        world.add_box(BodyKind::Static, Aabb::new(2., 3., -0.5, 0.5));
        let mut set = LightSet::default();
        let id = set.insert(wall_light(6.0));
        set.update(&world);
        assert!(!set[id].is_sleeping());

        world.reset_counters();
        set.update(&world);
        assert!(set[id].is_sleeping());
        assert_eq!(world.raycast_count(), 0);

        set[id].set_position(point2(0., 10.));
        set.update(&world);
        assert!(!set[id].is_sleeping());
        assert_eq!(set[id].position(), point2(0., 10.));
        assert!(set[id].contains(point2(3., 10.)));
        assert!(!set[id].contains(point2(3., 0.)));
    }

    #[test]
    fn degenerate_chains_produce_nothing() {
        let world = FixtureWorld::new();
        let set = updated(
            Light::exact_chain(
                8,
                LightColor::DEFAULT,
                5.0,
                ChainSide::Left,
                [point2(1., 1.)],
            ),
            &world,
        );
        let light = set.iter().next().unwrap().1;
        assert!(light.lit_mesh().is_empty());
        assert!(!light.contains(point2(1., 1.)));
        assert_eq!(light.peak_rays(), Some(0));
    }

    #[test]
    fn right_side_flips_the_emission() {
        let world = FixtureWorld::new();
        // Same polyline as `wall_light` but shining the other way.
        let light = Light::exact_chain(
            8,
            LightColor::DEFAULT,
            5.0,
            ChainSide::Right,
            [point2(0., -2.), point2(0., 2.)],
        );
        let set = updated(light, &world);
        let light = set.iter().next().unwrap().1;
        assert!(light.contains(point2(3., 0.)));
        assert!(!light.contains(point2(-1., 0.)));
    }

    #[test]
    fn end_scale_flares_only_the_outer_edges() {
        let world = FixtureWorld::new();
        let mut set = LightSet::default();
        let id = set.insert(wall_light(5.0));
        let Light::ExactChain(ref mut chain) = set[id] else {
            unreachable!()
        };
        chain.set_end_scale(2.0);
        set.update(&world);

        // The single segment is both first and last: its far edge doubles,
        // reaching past the baseline's ends.
        assert!(set[id].contains(point2(4.5, 3.)));
        assert!(set[id].contains(point2(4.5, -3.)));
        assert!(!set[id].contains(point2(0.5, 3.)));
    }
}
