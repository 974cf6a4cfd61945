//! This library is an internal component of [`umbra2d`],
//! which defines the core mathematical types and functions for its
//! two-dimensional visibility computations.
//! Do not depend on this library; use only [`umbra2d`] instead.
//!
//! [`umbra2d`]: https://crates.io/crates/umbra2d/

// Crate-specific lint settings. (General settings can be found in the workspace manifest.)
#![forbid(unsafe_code)]
#![warn(clippy::missing_inline_in_public_items)]

/// Do not use this module directly; its contents are re-exported from `umbra2d`.
pub mod math;

/// Do not use this module directly; its contents are re-exported from `umbra2d`.
pub mod util;

// Re-export the version of the `euclid` crate we're using, so that users of our math types
// can name the underlying generic types without a version mismatch.
#[doc(hidden)]
pub use euclid;
