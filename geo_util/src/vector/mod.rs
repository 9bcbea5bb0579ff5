mod bbox;
mod polygon_set;

pub use bbox::*;
pub use polygon_set::*;
