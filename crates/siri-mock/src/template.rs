//! Response body templating with request correlation identifiers.
//!
//! Canned SIRI responses usually have to reference the request that triggered
//! them. A template may contain the following placeholders:
//!
//! - `{RequestMessageRef}` - the first `MessageIdentifier` of the request
//! - `{LastRequestMessageRef}` - the last `MessageIdentifier` of the request
//!
//! # Example
//!
//! ```
//! use siri_mock::template::render_response;
//!
//! let ids = vec!["abc".to_string()];
//! assert_eq!(render_response("<R>{RequestMessageRef}</R>", &ids), "<R>abc</R>");
//! ```

/// Placeholder replaced by the first identifier of the request
pub const REQUEST_MESSAGE_REF: &str = "{RequestMessageRef}";

/// Placeholder replaced by the last identifier of the request
pub const LAST_REQUEST_MESSAGE_REF: &str = "{LastRequestMessageRef}";

/// Substitute correlation placeholders in `template`.
///
/// With no identifiers the template is returned untouched, placeholders included.
pub fn render_response(template: &str, message_identifiers: &[String]) -> String {
    let (Some(first), Some(last)) = (message_identifiers.first(), message_identifiers.last())
    else {
        return template.to_string();
    };

    template
        .replace(REQUEST_MESSAGE_REF, first)
        .replace(LAST_REQUEST_MESSAGE_REF, last)
}

/// Check if a template references the request at all
pub fn has_placeholders(template: &str) -> bool {
    template.contains(REQUEST_MESSAGE_REF) || template.contains(LAST_REQUEST_MESSAGE_REF)
}
