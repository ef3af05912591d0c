//! Pull source code out of a model response.

/// Return the body of the first fenced code block (``` or ```lang).
///
/// Falls back to the whole trimmed response when there is no opening fence.
/// An unterminated fence takes everything after the opening line.
pub fn extract_code_block(response: &str) -> String {
    let Some(open) = response.find("```") else {
        return response.trim().to_string();
    };

    let after_fence = &response[open + 3..];
    // Skip the language tag, if any, up to the end of the fence line
    let body_start = match after_fence.find('\n') {
        Some(newline) => newline + 1,
        None => return response.trim().to_string(),
    };
    let body = &after_fence[body_start..];

    let body = match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    };

    body.trim().to_string()
}
