pub mod dp;
pub mod greedy;
pub mod gwo;
pub mod types;

pub use dp::*;
pub use greedy::*;
pub use gwo::*;
pub use types::*;
