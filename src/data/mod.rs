//! Data acquisition: HTTP source, daily snapshot cache, snapshot parsing.

pub mod cache;
pub mod dataset;
pub mod source;

pub use cache::{DownloadLog, Snapshot, SnapshotCache};
pub use dataset::Dataset;
pub use source::{DataSource, HttpSource};
