mod combined;
mod demographics;
mod heatmap;
mod place;
mod requests;

pub use combined::*;
pub use demographics::*;
pub use heatmap::*;
pub use place::*;
pub use requests::*;
