//! Color data types. This module is private but reexported by its parent.

use core::fmt;

use manyfmt::Fmt;

use crate::util::ConciseDebug;

/// A floating-point RGBA color value used to tint lights and their meshes.
///
/// * Each component is finite and in the range 0 to 1; constructors clamp
///   out-of-range values (NaN becomes 0).
/// * The alpha is not premultiplied.
#[derive(Clone, Copy, PartialEq)]
pub struct LightColor {
    r: f32,
    g: f32,
    b: f32,
    a: f32,
}

/// Clamp to the unit interval, turning NaN into zero.
const fn clamp01(value: f32) -> f32 {
    if value >= 1.0 {
        1.0
    } else if value >= 0.0 {
        value
    } else {
        0.0
    }
}

impl LightColor {
    /// Transparent black; the constant equal to `LightColor::new(0., 0., 0., 0.)`.
    pub const TRANSPARENT: LightColor = LightColor::new(0., 0., 0., 0.);
    /// Opaque white; the constant equal to `LightColor::new(1., 1., 1., 1.)`.
    pub const WHITE: LightColor = LightColor::new(1., 1., 1., 1.);

    /// The warm dim yellow lights start out with if no other color is given.
    pub const DEFAULT: LightColor = LightColor::new(0.75, 0.75, 0.5, 0.75);

    /// Constructs a color from components, clamping each to the range 0 to 1.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: clamp01(r),
            g: clamp01(g),
            b: clamp01(b),
            a: clamp01(a),
        }
    }

    /// Red component.
    #[inline]
    pub const fn red(self) -> f32 {
        self.r
    }
    /// Green component.
    #[inline]
    pub const fn green(self) -> f32 {
        self.g
    }
    /// Blue component.
    #[inline]
    pub const fn blue(self) -> f32 {
        self.b
    }
    /// Alpha component.
    #[inline]
    pub const fn alpha(self) -> f32 {
        self.a
    }

    /// Returns this color with the alpha component replaced (and clamped).
    #[inline]
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: clamp01(alpha),
            ..self
        }
    }

    /// The components in `[r, g, b, a]` order.
    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for LightColor {
    /// Equal to [`LightColor::DEFAULT`].
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// [`LightColor`] rejects NaN values, so it can implement [`Eq`]
/// even though it contains floats.
impl Eq for LightColor {}

impl fmt::Debug for LightColor {
    #[allow(clippy::missing_inline_in_public_items)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { r, g, b, a } = *self;
        write!(f, "LightColor({r:?}, {g:?}, {b:?}, {a:?})")
    }
}

impl Fmt<ConciseDebug> for LightColor {
    #[allow(clippy::missing_inline_in_public_items)]
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>, _: &ConciseDebug) -> fmt::Result {
        let Self { r, g, b, a } = *self;
        write!(fmt, "({r:.2} {g:.2} {b:.2} {a:.2})")
    }
}

impl From<[f32; 4]> for LightColor {
    #[inline]
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

// -------------------------------------------------------------------------------------------------

/// An RGBA color packed into a `u32` the way vertex buffers want it:
/// red in the lowest byte, alpha in the highest.
#[derive(Clone, Copy, Eq, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct PackedColor(u32);

impl PackedColor {
    /// All-zero bytes; transparent black.
    pub const TRANSPARENT: PackedColor = PackedColor(0);

    /// Constructs from `[r, g, b, a]` bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }

    /// The `[r, g, b, a]` bytes.
    #[inline]
    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl From<LightColor> for PackedColor {
    #[inline]
    fn from(color: LightColor) -> Self {
        // Components are already clamped to 0..=1 so the cast cannot overflow.
        Self::from_bytes(color.to_array().map(|c| (c * 255.0).round() as u8))
    }
}

impl fmt::Debug for PackedColor {
    #[allow(clippy::missing_inline_in_public_items)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_bytes();
        write!(f, "PackedColor(#{r:02x}{g:02x}{b:02x}{a:02x})")
    }
}
