//! Message formatting helpers
//!
//! Telegram's MarkdownV2 dialect treats a long list of punctuation as
//! markup, so every piece of dynamic text that lands in a formatted
//! message goes through [`escape_markdown`] first.

use chrono::NaiveDateTime;

/// Telegram's hard limit on message length, in UTF-16 code units;
/// staying under it in characters is close enough for our content
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Escape text for a MarkdownV2 message body
#[must_use]
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(
            ch,
            '_' | '*'
                | '['
                | ']'
                | '('
                | ')'
                | '~'
                | '`'
                | '>'
                | '#'
                | '+'
                | '-'
                | '='
                | '|'
                | '{'
                | '}'
                | '.'
                | '!'
        ) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Shorten text to at most `max` characters, appending an ellipsis when
/// anything was cut
///
/// Safe to apply to already-escaped MarkdownV2 text: the cut never
/// strands a lone backslash from its escaped character.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(max.saturating_sub(1)).collect();
    let trailing = shortened.chars().rev().take_while(|ch| *ch == '\\').count();
    if trailing % 2 == 1 {
        shortened.pop();
    }
    shortened.push('…');
    shortened
}

/// Human-readable file size
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    if bytes >= MIB {
        #[allow(clippy::cast_precision_loss)]
        let mib = bytes as f64 / MIB as f64;
        format!("{mib:.1} MiB")
    } else if bytes >= KIB {
        #[allow(clippy::cast_precision_loss)]
        let kib = bytes as f64 / KIB as f64;
        format!("{kib:.1} KiB")
    } else {
        format!("{bytes} B")
    }
}

/// Turn a snapshot filename into a display timestamp
///
/// Falls back to the raw filename when it does not match the
/// `content-<timestamp>.json` shape.
#[must_use]
pub fn backup_label(filename: &str) -> String {
    let stamp = filename
        .strip_prefix("content-")
        .and_then(|rest| rest.strip_suffix(".json"));
    let Some(stamp) = stamp else {
        return filename.to_string();
    };
    match NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H-%M-%S-%6fZ") {
        Ok(parsed) => parsed.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        Err(_) => filename.to_string(),
    }
}
