mod chunk_iterator;
mod raster_window_iterator;
#[allow(clippy::module_inception)]
mod util;

pub use chunk_iterator::*;
pub use raster_window_iterator::*;
pub use util::*;
