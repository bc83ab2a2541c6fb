//! Message correlation identifiers carried by SIRI requests.
//!
//! Every SIRI request carries a `MessageIdentifier`; batched deliveries carry
//! one per embedded message. Replies reference the request through
//! `RequestMessageRef`, so the mock needs the identifiers of each inbound body.

use regex::Regex;
use std::sync::OnceLock;

static MESSAGE_IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_message_identifier_regex() -> &'static Regex {
    // Opening tags only: `<MessageIdentifier>`, `<siri:MessageIdentifier>`,
    // `<siri:ResponseMessageIdentifier>`. Closing tags never match.
    MESSAGE_IDENTIFIER_REGEX.get_or_init(|| {
        Regex::new(r"<(?:[\w.-]+:)?\w*MessageIdentifier>([^<]*)<").expect("valid regex")
    })
}

/// Extract every message identifier from a raw request body, in document order.
///
/// Returns an empty vector when the body carries none.
pub fn extract_message_identifiers(body: &str) -> Vec<String> {
    get_message_identifier_regex()
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}
