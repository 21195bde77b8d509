//! Synchronous transcript core.
//!
//! Nothing here performs I/O or awaits. A poll cycle flows through:
//!
//! - [`reconcile`] - merge previous transcript, snapshot and outstanding echoes
//! - [`deduplicate`] - collapse the same real-world message arriving under two ids
//! - [`cap_to_newest`] - bound the transcript, dropping the oldest entries
//! - [`ChangeDetector`] - skip render and scroll work when nothing visible changed
//!
//! [`TranscriptPipeline`] chains the first three. [`TranscriptCache`],
//! [`OptimisticEchoTracker`] and [`ScrollPreserver`] hold the state around it.

pub mod cache;
pub mod dedup;
pub mod echo;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;
pub mod scroll;
pub mod signature;

pub use cache::TranscriptCache;
pub use dedup::deduplicate;
pub use echo::{OptimisticEchoTracker, SendRejected};
pub use normalize::normalize_content;
pub use pipeline::{TranscriptPipeline, cap_to_newest};
pub use reconcile::reconcile;
pub use scroll::{DEFAULT_ANCHOR_THRESHOLD, ScrollMetrics, ScrollPlan, ScrollPreserver};
pub use signature::{Change, ChangeDetector, TranscriptSignature};
