pub mod formulas;
pub mod interpolation;

pub use formulas::*;
pub use interpolation::*;
