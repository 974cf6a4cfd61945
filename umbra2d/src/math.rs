//! Mathematical utilities and decisions.
//!
//! The contents are re-exported from `umbra2d_base`, which exists only to be this
//! crate's foundation and should not be depended on directly.

pub use umbra2d_base::math::*;
