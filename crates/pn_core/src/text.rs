/// Longest content, in characters, written to a destination record.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// Appended to content that was cut at [`MAX_CONTENT_CHARS`].
pub const ELLIPSIS: &str = "...";

/// Splits content into the part that fits and whether it was cut.
pub fn split_content(content: &str) -> (&str, bool) {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((byte_idx, _)) => (&content[..byte_idx], true),
        None => (content, false),
    }
}

/// Cuts content to [`MAX_CONTENT_CHARS`] characters plus [`ELLIPSIS`].
pub fn truncate_content(content: &str) -> String {
    match split_content(content) {
        (head, true) => format!("{}{}", head, ELLIPSIS),
        (head, false) => head.to_string(),
    }
}

/// Reads a displayed counter such as "1.2K" or "87" by keeping its digits.
/// Anything without digits counts as zero.
pub fn parse_count(text: &str) -> u64 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
