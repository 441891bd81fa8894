pub mod highlight;
pub mod point;
pub mod tiktok;

pub use highlight::*;
pub use point::*;
pub use tiktok::*;
