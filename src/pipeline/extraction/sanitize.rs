// Normalize raw report text before matching.
// Removes invisible Unicode, unifies line endings and quote glyphs, truncates.

/// Normalize text for extraction: strip invisible characters, convert CRLF/CR
/// to LF, fold curly quotes to straight ones and cap the length.
pub fn normalize_input(raw: &str, max_chars: usize) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let cleaned = remove_invisible_chars(&unified);
    let folded = fold_quotes(&cleaned);
    truncate_to_max_length(&folded, max_chars)
}

/// Remove zero-width and directional formatting characters.
/// Preserves standard whitespace (space, newline, tab).
fn remove_invisible_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            if *c == ' ' || *c == '\n' || *c == '\t' {
                return true;
            }
            if matches!(
                *c,
                '\u{200B}'  // Zero-width space
                | '\u{200C}' // Zero-width non-joiner
                | '\u{200E}' // Left-to-right mark
                | '\u{200F}' // Right-to-left mark
                | '\u{202A}'..='\u{202E}' // Directional embedding/override
                | '\u{2060}'..='\u{2064}' // Word joiner, invisible operators
                | '\u{FEFF}' // BOM
                | '\u{00AD}' // Soft hyphen
            ) {
                return false;
            }
            !c.is_control()
        })
        .collect()
}

// U+200D (zero-width joiner) is kept: it glues multi-codepoint emoji
// used as section markers.

fn fold_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}' | '\u{00BB}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
            _ => c,
        })
        .collect()
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_to_max_length(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => {
            tracing::debug!(max_chars = max, "Report input truncated");
            text[..idx].to_string()
        }
        None => text.to_string(),
    }
}
