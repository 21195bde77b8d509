//! Message Listing, Send and Resync/Rebuild endpoints.

pub mod api;
pub mod error;
pub mod http;

pub use api::MessageApi;
pub use error::ApiError;
pub use http::HttpMessageApi;
