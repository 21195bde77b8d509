//! Data models for conversation transcripts.
//!
//! - [`Message`] - One transcript entry, server-confirmed or provisional
//! - [`MessageId`] - Stable server id or recognizable provisional marker
//! - [`ConversationRef`] - Addressing context for a transcript and its send shape
//!
//! Backend JSON is mapped onto these types by the `parsers` module, which
//! tolerates the many field spellings the backend uses.

pub mod conversation;
pub mod message;

pub use conversation::{ConversationRef, ConversationSource, SendTarget};
pub use message::{
    DeliveryStatus, Direction, MediaType, Message, MessageId, PROVISIONAL_ID_PREFIX,
};
