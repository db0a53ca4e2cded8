pub mod comparator;
pub mod context;
pub mod engine;
pub mod error;
pub mod mirror;
pub mod pair;
pub mod report;
pub mod sweep;
pub mod verifier;

pub use comparator::{CompareMode, ComparisonOutcome, EntryComparator};
pub use context::PassContext;
pub use engine::{run, SyncEngine};
pub use error::{FsOp, SyncError};
pub use pair::DirectoryPair;
pub use report::{PassReport, SyncResult};
pub use verifier::{digest, ContentDigest};
