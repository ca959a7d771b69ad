// Index module
// Exact nearest-neighbour index over chunk embeddings, its on-disk bundle and the load cache

pub mod builder;
pub mod bundle;
pub mod cache;
pub mod flat;

pub use builder::IndexBuilder;
pub use bundle::{BundlePaths, IndexBundle};
pub use cache::IndexCache;
pub use flat::{FlatIndex, Neighbor, squared_l2};
