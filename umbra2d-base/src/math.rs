//! Mathematical utilities and decisions.

pub use ordered_float::{FloatIsNan, NotNan};

mod bounds;
pub use bounds::*;

mod circle;
pub use circle::*;

mod color;
pub use color::*;

mod coord;
pub use coord::*;

pub mod lines;
pub use lines::Wireframe;
