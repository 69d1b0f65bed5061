//! Cheap, deterministic token estimation.
//!
//! The heuristic is never used for billing or compliance, only for
//! routing (`crate::router`) and telemetry. It is intentionally simple so
//! that [`estimate_tokens`] stays `O(n)` over the input and agrees with
//! itself across runs and platforms — see the determinism invariant on
//! [`crate::ContextDescriptor`].

/// Version tag for the estimator heuristic below. Bump whenever the
/// formula or its constants change, so stored/logged estimates from
/// different versions are never silently compared.
pub const ESTIMATOR_VERSION: u32 = 1;

const PUNCTUATION_INFLATION: f64 = 1.1;
const WORD_TO_TOKEN_RATIO: f64 = 1.3;
const CODE_INFLATION: f64 = 1.4;
const MIN_CODE_MARKERS: usize = 3;

/// A blob that `split_whitespace` reports as a single "word" longer than
/// this is not really a word — it's whitespace-free data (compact JSON,
/// a run of repeated bytes, ...) that happens to contain no separators.
/// Past this length the word-ratio formula stops approximating anything
/// and the blob is treated the same as the `words == 0` binary/undecodable
/// case: `bytes / 4`.
const MAX_SINGLE_WORD_CHARS: usize = 64;

const CODE_MARKERS: &[&str] = &[
    "def ", "function ", "class ", "import ", "from ", "{", "}", "()", "=>", "==", "!=", "&&",
    "||",
];

/// Estimates the token count of a text blob using the documented
/// heuristic: `words * 1.3 * 1.1 * c`, where `c = 1.4` when the blob looks
/// like source code (at least three distinct markers from a fixed set are
/// present) and `1.0` otherwise.
///
/// Falls back to `bytes / 4` when `text` is empty of whitespace-delimited
/// words, or when it is a single "word" longer than
/// [`MAX_SINGLE_WORD_CHARS`] (whitespace-free data such as compact JSON,
/// not prose) — non-empty in bytes either way (the binary/undecodable
/// case is handled by [`estimate_tokens_bytes`], which callers should
/// prefer when the input may not be valid UTF-8).
#[must_use]
pub fn estimate_tokens(text: &str) -> u64 {
    let words = text.split_whitespace().count();
    if words == 0 || (words == 1 && text.len() > MAX_SINGLE_WORD_CHARS) {
        return (text.len() as u64).div_ceil(4);
    }
    let c = if looks_like_code(text) {
        CODE_INFLATION
    } else {
        1.0
    };
    let estimate = (words as f64) * WORD_TO_TOKEN_RATIO * PUNCTUATION_INFLATION * c;
    estimate.round() as u64
}

/// Estimates tokens for a raw byte slice, handling the binary/undecodable
/// fallback (`bytes / 4`) before delegating to [`estimate_tokens`].
#[must_use]
pub fn estimate_tokens_bytes(bytes: &[u8]) -> u64 {
    if is_binary_looking(bytes) {
        return (bytes.len() as u64).div_ceil(4);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => estimate_tokens(text),
        Err(_) => (bytes.len() as u64).div_ceil(4),
    }
}

/// A blob is binary-looking if more than 1% of its bytes are NUL or other
/// C0 control bytes outside `\t`, `\n`, `\r`. Mirrors the sniffing bound
/// used by `crate::descriptor` so the two components agree on what counts
/// as text.
#[must_use]
pub fn is_binary_looking(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let control_bytes = bytes
        .iter()
        .filter(|&&b| b == 0 || (b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r')))
        .count();
    (control_bytes as f64) / (bytes.len() as f64) > 0.01
}

fn looks_like_code(text: &str) -> bool {
    CODE_MARKERS
        .iter()
        .filter(|marker| text.contains(*marker))
        .count()
        >= MIN_CODE_MARKERS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_estimates_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn plain_prose_uses_base_ratio() {
        let text = "the quick brown fox jumps over the lazy dog";
        let words = 9;
        let expected = ((words as f64) * WORD_TO_TOKEN_RATIO * PUNCTUATION_INFLATION).round() as u64;
        assert_eq!(estimate_tokens(text), expected);
    }

    #[test]
    fn code_like_text_gets_inflated() {
        let code = "def foo():\n    return {}\n\nfunction bar() { return 1; }\nclass Baz {}";
        let prose_equivalent = {
            let words = code.split_whitespace().count();
            ((words as f64) * WORD_TO_TOKEN_RATIO * PUNCTUATION_INFLATION).round() as u64
        };
        assert!(estimate_tokens(code) > prose_equivalent);
    }

    #[test]
    fn two_markers_is_not_enough() {
        // Only "def " and "{" present -> not code-like, no inflation.
        let text = "def retrieves items from {cache}";
        let words = text.split_whitespace().count();
        let expected = ((words as f64) * WORD_TO_TOKEN_RATIO * PUNCTUATION_INFLATION).round() as u64;
        assert_eq!(estimate_tokens(text), expected);
    }

    #[test]
    fn binary_bytes_fall_back_to_byte_count() {
        let bytes = [0u8, 1, 2, 3, 0, 0, 0, 255, 254, 0];
        assert!(is_binary_looking(&bytes));
        assert_eq!(estimate_tokens_bytes(&bytes), (bytes.len() as u64).div_ceil(4));
    }

    #[test]
    fn invalid_utf8_falls_back_to_byte_count() {
        let bytes = vec![0xFF, 0xFE, 0xFD, b' ', b'h', b'i'];
        assert_eq!(estimate_tokens_bytes(&bytes), (bytes.len() as u64).div_ceil(4));
    }

    #[test]
    fn whitespace_free_compact_json_falls_back_to_byte_count() {
        // A single run with no whitespace is one `split_whitespace` "word"
        // no matter how long it is; past MAX_SINGLE_WORD_CHARS it's
        // compact data, not prose, so this must not collapse to the
        // word-ratio formula's `round(1 * 1.3 * 1.1) == 1`.
        let elements: Vec<String> = (0..1000).map(|i| format!(r#"{{"id":{i}}}"#)).collect();
        let text = format!("[{}]", elements.join(","));
        assert!(text.split_whitespace().count() == 1);
        assert_eq!(estimate_tokens(&text), (text.len() as u64).div_ceil(4));
    }

    #[test]
    fn short_single_word_still_uses_the_word_ratio_formula() {
        let text = "hello";
        assert!(text.len() <= MAX_SINGLE_WORD_CHARS);
        let expected = (1.0 * WORD_TO_TOKEN_RATIO * PUNCTUATION_INFLATION).round() as u64;
        assert_eq!(estimate_tokens(text), expected);
    }

    #[test]
    fn whitespace_only_text_falls_back_to_bytes() {
        let text = "   \t\t  ";
        assert_eq!(estimate_tokens(text), (text.len() as u64).div_ceil(4));
    }

    #[test]
    fn deterministic_across_calls() {
        let text = "deterministic estimation of the same text twice";
        assert_eq!(estimate_tokens(text), estimate_tokens(text));
    }
}
