//! Escaping for the `title` and `message` commit fields
//!
//! Both fields sit between sentinel characters (`&`), so user text is rewritten with
//! an ordered substitution table: `/` first, then `&`. Decoding undoes the rules in
//! the opposite order. Escaped text never contains a literal `&`.

/// Ordered substitution rules, applied first to last when escaping
const ESCAPE_TABLE: [(char, &str); 2] = [('/', "/sl;"), ('&', "/amp;")];

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match ESCAPE_TABLE.iter().find(|(raw, _)| *raw == c) {
            Some((_, placeholder)) => escaped.push_str(placeholder),
            None => escaped.push(c),
        }
    }

    escaped
}

pub fn unescape(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(position) = rest.find('/') {
        unescaped.push_str(&rest[..position]);
        rest = &rest[position..];

        // later rules were applied last, so they are undone first
        match ESCAPE_TABLE
            .iter()
            .rev()
            .find(|(_, placeholder)| rest.starts_with(placeholder))
        {
            Some((raw, placeholder)) => {
                unescaped.push(*raw);
                rest = &rest[placeholder.len()..];
            }
            None => {
                unescaped.push('/');
                rest = &rest[1..];
            }
        }
    }
    unescaped.push_str(rest);

    unescaped
}
