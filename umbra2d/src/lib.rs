//! Per-light 2D visibility: computes, for each light in a scene, the region the
//! light actually reaches, as a triangle mesh ready for rendering, by casting rays
//! against the occluding shapes of a physics world.
//!
//! All of the algorithms here are independent of graphics API and of any particular
//! physics engine; the collision world is reached through the [`world::OccluderWorld`]
//! trait, and the computed geometry comes out as plain vertex buffers
//! ([`LightMesh`]).
//!
//! Restrictions and caveats:
//! * This crate computes geometry only. Blending the meshes into a framebuffer,
//!   accumulating them into a light map, and similar rendering concerns are the
//!   caller's business.
//! * Coordinates are [`f32`], matching the precision physics engines conventionally
//!   offer; very large worlds will want their own origin management.
//!
//! # Getting started
//!
//! [`Light`] is the key type: construct one with [`Light::point()`] and friends, add
//! it to a [`LightSet`], and call [`LightSet::update()`] once per frame with your
//! [`world::OccluderWorld`] implementation. Each light then exposes its lit area via
//! [`Light::lit_mesh()`] and its soft shadow fringe via [`Light::soft_mesh()`].

// Crate-specific lint settings. (General settings can be found in the workspace manifest.)
#![forbid(unsafe_code)]

pub mod exact;
pub mod height;
mod light;
pub use light::*;
pub mod math;
mod mesh;
pub use mesh::*;
mod ray;
mod set;
pub use set::*;
#[doc(hidden)]
pub mod testing;
pub mod util;
pub mod world;

// Re-export the version of the `euclid` vector math library we're using.
pub use umbra2d_base::euclid;
