//! The commit workflow and its results.

pub mod driver;
pub mod lock;
pub mod result;

pub use driver::CommitDriver;
pub use lock::RepoLocks;
pub use result::{CommitResult, PreviewResult};
