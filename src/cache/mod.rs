pub mod structs;

pub use structs::SnapshotCache;
