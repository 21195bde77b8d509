//! Defensive decoders for Message Listing Endpoint responses
//!
//! # Error Handling Strategy
//!
//! The backend is inconsistent about field names and nesting, so decoding
//! follows a **graceful degradation** approach:
//!
//! - **Wrapper shapes**: The record array may sit at the top level or under one of
//!   several wrapper keys; a response without any array decodes to an empty snapshot.
//!
//! - **Field aliases**: Each concept (id, content, timestamp, direction, status, media)
//!   is read from the first of several accepted field names.
//!
//! - **Malformed records**: Missing fields are defaulted (empty content, "now" as the
//!   timestamp, status unset) instead of dropping the record, so one bad record cannot
//!   blank a transcript. Only entries that are not JSON objects are skipped.

pub mod deserializers;
pub mod snapshot;

pub use snapshot::{parse_record, parse_snapshot};
