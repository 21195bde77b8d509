//! Async side of the transcript: fetching, polling and the session loop.
//!
//! - [`SnapshotFetcher`] - single-flight, cancellable fetches with the empty first-load retry
//! - [`ConversationController`] - poll timer and visible state for the conversation on screen
//! - [`InboxSession`] - event loop owning the cache and echo tracker

pub mod controller;
pub mod fetcher;
pub mod session;

pub use controller::ConversationController;
pub use fetcher::{FetchFuture, FetchOutcome, SnapshotFetcher};
pub use session::{InboxSession, SessionCommand, SessionEvent, SessionHandle};
