use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 200;

const MARKER_PATTERNS: [&str; 4] = ["api_key=", "\"api_key\":\"", "apiKey=", "\"apiKey\":\""];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    let mut end = from;
    for (i, c) in input[from..].char_indices() {
        if is_secret_char(c) {
            end = from + i + c.len_utf8();
        } else {
            break;
        }
    }
    end
}

fn scrub_after_marker(scrubbed: &mut String, marker: &str) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);

        // Skip bare markers without a token value.
        if end == content_start {
            search_from = content_start;
            continue;
        }

        scrubbed.replace_range(content_start..end, "[REDACTED]");
        search_from = content_start + "[REDACTED]".len();
    }
}

/// Redact the tenant API key from backend error text, both as the literal
/// configured value and behind common `api_key` markers.
pub fn scrub_api_key<'a>(input: &'a str, api_key: &str) -> Cow<'a, str> {
    let literal = !api_key.is_empty() && input.contains(api_key);
    if !literal && !MARKER_PATTERNS.iter().any(|marker| input.contains(marker)) {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = if literal {
        input.replace(api_key, "[REDACTED]")
    } else {
        input.to_string()
    };
    for marker in MARKER_PATTERNS {
        scrub_after_marker(&mut scrubbed, marker);
    }
    Cow::Owned(scrubbed)
}

/// Scrub and truncate backend error text.
pub fn sanitize_api_error(input: &str, api_key: &str) -> String {
    let scrubbed = scrub_api_key(input, api_key);

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed.into_owned();
    }

    let scrubbed = scrubbed.as_ref();
    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &scrubbed[..end])
}
