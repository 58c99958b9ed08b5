mod bounds;
mod traversal;

pub use bounds::*;
pub use traversal::*;
