//! Locating the JSON document inside model text

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Slice of `text` that should hold the JSON document
///
/// In order of preference:
/// 1. the body of the first ```` ```json ```` fenced block, wherever it is
/// 2. the body of a bare ```` ``` ```` fence wrapping the whole text
/// 3. the trimmed text itself
///
/// An unterminated ```` ```json ```` fence is ignored.
pub fn extract_json(text: &str) -> &str {
    if let Some(start) = text.find(JSON_FENCE) {
        let body = &text[start + JSON_FENCE.len()..];
        if let Some(end) = body.find(FENCE) {
            return body[..end].trim();
        }
    }

    let trimmed = text.trim();
    if trimmed.len() >= 2 * FENCE.len() && trimmed.starts_with(FENCE) && trimmed.ends_with(FENCE) {
        let inner = &trimmed[FENCE.len()..trimmed.len() - FENCE.len()];
        // Drop an info string such as "JSON" or "javascript" on the opening line
        let inner = match inner.split_once('\n') {
            Some((info, rest)) if !info.trim_start().starts_with(['{', '[']) => rest,
            _ => inner,
        };
        return inner.trim();
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        assert_eq!(extract_json("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_json_fence_anywhere() {
        let text = "Here is the result:\n```json\n{\"a\": 1}\n```\nLet me know!";
        assert_eq!(extract_json(text), "{\"a\": 1}");
    }

    #[test]
    fn test_first_json_fence_wins() {
        let text = "```json\n[1]\n```\n```json\n[2]\n```";
        assert_eq!(extract_json(text), "[1]");
    }

    #[test]
    fn test_bare_fence_wrapping_text() {
        assert_eq!(extract_json("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(extract_json("```JSON\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(extract_json("```{\"a\": 1}```"), "{\"a\": 1}");
    }

    #[test]
    fn test_bare_fence_inside_prose_is_not_unwrapped() {
        let text = "Sure:\n```\n{\"a\": 1}\n```";
        assert_eq!(extract_json(text), text.trim());
    }

    #[test]
    fn test_unterminated_json_fence() {
        let text = "```json\n{\"a\": 1}";
        assert_eq!(extract_json(text), text);
    }
}
