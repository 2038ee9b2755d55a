//! bitstore - volume discovery for a disk-backed volume store
//!
//! On startup every configured directory is scanned for volume data files
//! (`[<collection>_]<id>.dat`), each volume is recovered through a volume
//! factory, and the results are registered by id in an in-memory registry.

pub mod cli;
pub mod location;
pub mod observability;
pub mod store;
pub mod volume;
