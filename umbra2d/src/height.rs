//! Pseudo-3D shadow lengths.
//!
//! The visibility algorithms treat the world as strictly flat, but a renderer
//! drawing wall sprites of a given height can stretch each occluder's shadow
//! according to how high the light sits above it. This helper computes that
//! stretch; nothing else in this crate consults it.

use crate::math::WorldCoord;

/// Heights, in world units, of an occluder and of the light shining over it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[expect(clippy::exhaustive_structs)]
pub struct ShadowHeights {
    /// How tall the occluder is.
    pub occluder: WorldCoord,
    /// How high above the ground plane the light sits.
    pub light: WorldCoord,
}

impl ShadowHeights {
    /// How far past the occluder its shadow extends.
    ///
    /// `distance` is how far the occluder is from the light and `range` the
    /// light's reach; the result is by similar triangles, clamped so that the
    /// shadow never extends past the light's reach and never has negative
    /// length. A light at height zero grazes the ground and shadows its whole
    /// range; a light no higher than the occluder shadows everything beyond it.
    pub fn shadow_limit(&self, distance: WorldCoord, range: WorldCoord) -> WorldCoord {
        let limit = if self.light > self.occluder {
            let cast = distance * self.occluder / (self.light - self.occluder);
            cast.min(range - distance)
        } else if self.light == 0.0 {
            range
        } else {
            range - distance
        };
        limit.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    // Light 4 high, wall 2 high: the shadow is as long as the wall is far.
    #[case(2.0, 4.0, 3.0, 100.0, 3.0)]
    // Closer to the light's height the shadow stretches.
    #[case(3.0, 4.0, 3.0, 100.0, 9.0)]
    // ...but never past the light's range.
    #[case(3.0, 3.1, 4.0, 10.0, 6.0)]
    // A grazing light shadows its whole range.
    #[case(1.0, 0.0, 4.0, 10.0, 10.0)]
    // A light below the occluder shadows everything beyond it.
    #[case(2.0, 1.0, 4.0, 10.0, 6.0)]
    // An occluder outside the range casts nothing.
    #[case(2.0, 1.0, 12.0, 10.0, 0.0)]
    fn shadow_limit_cases(
        #[case] occluder: WorldCoord,
        #[case] light: WorldCoord,
        #[case] distance: WorldCoord,
        #[case] range: WorldCoord,
        #[case] expected: WorldCoord,
    ) {
        let heights = ShadowHeights { occluder, light };
        assert_eq!(heights.shadow_limit(distance, range), expected);
    }
}
