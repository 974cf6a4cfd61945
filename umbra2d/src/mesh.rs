//! Vertex buffers in which computed light geometry is stored for rendering.

use umbra2d_base::math::PackedColor;

use crate::math::WorldPoint;

// -------------------------------------------------------------------------------------------------

/// How the vertices of a [`LightMesh`] are to be assembled into triangles.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, exhaust::Exhaust)]
#[expect(clippy::exhaustive_enums)]
pub enum MeshTopology {
    /// Triangle fan: vertex 0 is the light source, shared by every triangle.
    Fan,
    /// Triangle strip of near/far vertex pairs. Strips from several pieces of one
    /// light are joined by repeated (degenerate) vertices.
    Strip,
}

// -------------------------------------------------------------------------------------------------

/// One vertex of a [`LightMesh`].
///
/// The layout is 16 bytes, `[x, y, rgba, shade]`, suitable for uploading to a
/// GPU vertex buffer unchanged. Renderers typically compute the fragment color
/// as `color * shade` so that shadows fade the light out rather than darkening
/// what is underneath.
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
#[expect(clippy::exhaustive_structs)]
pub struct LightVertex {
    /// Position in world coordinates.
    pub position: [f32; 2],
    /// The light's tint at this vertex.
    pub color: PackedColor,
    /// Brightness coefficient: 1 at the light source, falling to 0 where the
    /// light is fully extinguished.
    pub shade: f32,
}

impl LightVertex {
    #[inline]
    pub(crate) fn new(position: WorldPoint, color: PackedColor, shade: f32) -> Self {
        Self {
            position: [position.x, position.y],
            color,
            shade,
        }
    }
}

// Positions come from finite ray geometry and shades from clamped fractions,
// so these components never contain NaN.
impl Eq for LightVertex {}

// -------------------------------------------------------------------------------------------------

/// Reusable vertex buffer holding one light's lit area or soft shadow fringe.
///
/// The capacity is fixed when the owning light is created (or its ray count
/// changed); updates rewrite the contents but never reallocate.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LightMesh {
    vertices: Vec<LightVertex>,
}

impl LightMesh {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
        }
    }

    /// The computed vertices, in triangle-fan or triangle-strip order depending
    /// on the light that produced them.
    #[inline]
    pub fn vertices(&self) -> &[LightVertex] {
        &self.vertices
    }

    /// The vertices as raw bytes, for direct buffer upload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::must_cast_slice::<LightVertex, u8>(&self.vertices)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.vertices.clear();
    }

    pub(crate) fn resize_capacity(&mut self, capacity: usize) {
        self.vertices = Vec::with_capacity(capacity);
    }

    #[inline]
    pub(crate) fn push(&mut self, position: WorldPoint, color: PackedColor, shade: f32) {
        debug_assert!(self.vertices.len() < self.vertices.capacity());
        self.vertices.push(LightVertex::new(position, color, shade));
    }

    /// Appends an already-built vertex; used when joining strips from several
    /// pieces of one light.
    #[inline]
    pub(crate) fn push_vertex(&mut self, vertex: LightVertex) {
        debug_assert!(self.vertices.len() < self.vertices.capacity());
        self.vertices.push(vertex);
    }
}
