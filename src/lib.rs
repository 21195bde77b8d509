//! Inbox Transcript - reconcile polled WhatsApp conversation transcripts
//!
//! The backend is the source of truth for a conversation, but it only learns about an
//! operator's message after a round trip and reports the same message more than once when
//! webhooks are retried. This library keeps a flicker-free transcript on top of that:
//!
//! - Polling snapshots with single-flight fetches and cancellation on conversation switch
//! - Showing sent messages instantly as provisional echoes, then folding them into the
//!   server-confirmed records
//! - Collapsing duplicate records, keeping the most complete copy
//! - Skipping redraws when a poll changed nothing, and keeping the reader's scroll position
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use inbox_transcript::{Message, TranscriptPipeline};
//!
//! let pipeline = TranscriptPipeline::default();
//! let echo = Message::provisional("15551234567@c.us", "hi", Utc::now());
//!
//! let visible = pipeline.run(&[], &[], std::slice::from_ref(&echo));
//! assert_eq!(visible.len(), 1);
//! assert!(visible[0].is_provisional());
//! ```

pub mod cli;
pub mod client;
pub mod clipboard;
pub mod config;
pub mod engine;
pub mod models;
pub mod parsers;
pub mod sync;
pub mod tui;
pub mod utils;

// Re-export commonly used types
pub use client::{ApiError, HttpMessageApi, MessageApi};
pub use config::{AppConfig, load_config};
pub use engine::{
    ChangeDetector, OptimisticEchoTracker, ScrollPreserver, TranscriptCache, TranscriptPipeline,
};
pub use models::{ConversationRef, Message, MessageId};
pub use parsers::parse_snapshot;
pub use sync::{InboxSession, SessionCommand, SessionEvent};
