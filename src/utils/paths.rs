use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::config::CONVERSATION_PLACEHOLDER;

// Characters to percent-encode inside a single URL path segment
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%')
    .add(b'[')
    .add(b']')
    .add(b'+');

/// Percent-encodes a conversation id for use as one URL path segment
///
/// # Examples
///
/// ```
/// use inbox_transcript::utils::encode_path_segment;
///
/// assert_eq!(encode_path_segment("15551234567@c.us"), "15551234567@c.us");
/// assert_eq!(encode_path_segment("whatsapp:+1 555"), "whatsapp:%2B1%20555");
/// ```
pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT_ENCODE_SET).to_string()
}

/// Joins `base_url` and an endpoint template, filling in the conversation id
///
/// # Examples
///
/// ```
/// use inbox_transcript::utils::endpoint_url;
///
/// let url = endpoint_url("http://localhost:3000/", "/api/c/{conversation}/messages", Some("a/b"));
/// assert_eq!(url, "http://localhost:3000/api/c/a%2Fb/messages");
/// ```
pub fn endpoint_url(base_url: &str, template: &str, conversation_id: Option<&str>) -> String {
    let path = match conversation_id {
        Some(id) => template.replace(CONVERSATION_PLACEHOLDER, &encode_path_segment(id)),
        None => template.to_string(),
    };
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
