pub mod aggregate;
pub mod load;
pub mod parse;
pub mod partition;
pub mod progress;
pub mod rasterize;
pub mod render;
pub mod resolve;
