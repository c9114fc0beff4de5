//! HTML escaping for text that is about to be spliced into markup.

use std::borrow::Cow;

fn needs_escape(b: u8) -> bool {
    matches!(b, b'&' | b'<' | b'>' | b'"' | b'\'')
}

/// Escape `&`, `<`, `>`, `"` and `'` to their HTML entities.
///
/// Returns the input unchanged (borrowed) when there is nothing to escape.
pub fn escape(input: &str) -> Cow<'_, str> {
    let Some(first) = input.bytes().position(needs_escape) else {
        return Cow::Borrowed(input);
    };

    let mut out = String::with_capacity(input.len() + 16);
    out.push_str(&input[..first]);
    for c in input[first..].chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
