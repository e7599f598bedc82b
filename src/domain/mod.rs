pub mod geometry;
pub mod levels;
pub mod series;
pub mod types;

pub use geometry::*;
pub use levels::*;
pub use series::*;
pub use types::*;
