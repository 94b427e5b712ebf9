//! # patchscope-pool
//!
//! Reference backend for the kernel's collaborator traits.
//!
//! ```text
//! JSONL snapshot (repos, patches, packages, patterns, products, applications)
//!     │  read + validate + hash
//! Pool (immutable in-memory projection)
//!     ├─ PatchIndex:   OR attribute queries over patch metadata
//!     └─ PoolResolver: installed sets, version lookup, best-effort plan,
//!                      patch request log
//! ```
//!
//! There is no SAT solving here. The plan updates what it can and pulls in
//! missing requirements by name.

pub mod pool;
pub mod resolver;
pub mod snapshot;

pub use pool::{Pool, PoolError, SYSTEM_REPO_ALIAS};
pub use resolver::PoolResolver;
pub use snapshot::{
    ItemLine, POOL_SNAPSHOT_REF_PREFIX, PatchLine, PoolLine, RepoLine, Snapshot, SnapshotError,
    pool_snapshot_ref, read_lines, read_snapshot_from_path,
};
