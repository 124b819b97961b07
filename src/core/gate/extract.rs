// pulls one sql statement out of whatever the model said

use std::sync::LazyLock;

use regex::Regex;

static SQL_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```sql\s*(.*?)```").expect("valid regex"));

static STATEMENT_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(select|with)\b").expect("valid regex"));

/// Isolate a single terminated statement from raw model output.
///
/// Prose before the first `SELECT`/`WITH` is dropped, as is everything after
/// the first separator. A ```` ```sql ```` fence wins over surrounding text.
/// Returns `None` when there is nothing that looks like a statement.
pub fn extract(candidate: &str, question: &str) -> Option<String> {
    let mut text = candidate.trim();

    if let Some(fenced) = SQL_FENCE.captures(text).and_then(|caps| caps.get(1)) {
        text = fenced.as_str().trim();
    }

    let text = strip_echo(text, question);
    let start = STATEMENT_START.find(text)?.start();
    let statement = &text[start..];

    let statement = match separator(statement) {
        Some(end) => statement[..=end].trim_end().to_string(),
        None => format!("{};", statement.trim_end()),
    };

    Some(statement)
}

// local models like to repeat the question on its own line before answering.
// only a whole echoed line goes, and never one that is itself a statement
fn strip_echo<'a>(text: &'a str, question: &str) -> &'a str {
    let question = question.trim();
    if question.is_empty() || STATEMENT_START.find(question).is_some_and(|m| m.start() == 0) {
        return text;
    }

    let Some(head) = text.get(..question.len()) else {
        return text;
    };
    let rest = &text[question.len()..];
    let line_ends = rest.trim_start_matches([' ', '\t']).starts_with(['\n', '\r']);

    if head.eq_ignore_ascii_case(question) && line_ends {
        rest.trim_start()
    } else {
        text
    }
}

/// Byte offset of the first `;` outside quotes and comments.
pub fn separator(sql: &str) -> Option<usize> {
    let bytes = sql.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        i = match bytes[i] {
            b';' => return Some(i),
            quote @ (b'\'' | b'"' | b'`') => skip_quoted(bytes, i, quote),
            b'-' if bytes.get(i + 1) == Some(&b'-') => skip_past(bytes, i + 2, b"\n"),
            b'/' if bytes.get(i + 1) == Some(&b'*') => skip_past(bytes, i + 2, b"*/"),
            b'$' => skip_dollar_quoted(bytes, i),
            _ => i + 1,
        };
    }

    None
}

// a doubled quote closes and reopens, which lands in the same place
fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    bytes[start + 1..]
        .iter()
        .position(|b| *b == quote)
        .map_or(bytes.len(), |offset| start + offset + 2)
}

fn skip_past(bytes: &[u8], from: usize, pattern: &[u8]) -> usize {
    bytes[from..]
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map_or(bytes.len(), |offset| from + offset + pattern.len())
}

// $$ ... $$ and $tag$ ... $tag$, but not $1 placeholders
fn skip_dollar_quoted(bytes: &[u8], start: usize) -> usize {
    let rest = &bytes[start + 1..];
    let tag_len = rest
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'));

    match tag_len {
        Some(len) if rest[len] == b'$' && !rest[0].is_ascii_digit() => {
            let tag = &bytes[start..start + len + 2];
            skip_past(bytes, start + tag.len(), tag)
        }
        _ => start + 1,
    }
}
