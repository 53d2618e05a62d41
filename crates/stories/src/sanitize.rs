use std::collections::HashMap;
use std::sync::OnceLock;

/// Escapes text for insertion into HTML element content.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes text for a quoted attribute value. Backticks are escaped too,
/// since some legacy parsers treat them as attribute quotes.
pub fn escape_attribute(s: &str) -> String {
    escape_text(s).replace('`', "&#096;")
}

/// Turns HTML-encoded source text (`A &amp; B`) back into plain text.
pub trait EntityDecoder {
    fn decode(&self, s: &str) -> String;

    /// Absent values decode to the empty string.
    fn decode_opt(&self, s: Option<&str>) -> String {
        s.map(|s| self.decode(s)).unwrap_or_default()
    }
}

/// Decodes character references the way a browser does inside element
/// text: the full WHATWG named table, decimal and hex references with or
/// without `;`, and the legacy names (`&amp`, `&copy`, `&not`) that are
/// recognised without a terminator. Anything else is left as written.
///
/// Decoding is a single pass: `&amp;lt;` becomes `&lt;`, not `<`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlEntityDecoder;

// Longest named reference, excluding `&` and `;`.
const MAX_ENTITY_LEN: usize = 32;

impl EntityDecoder for HtmlEntityDecoder {
    fn decode(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut rest = s;
        while let Some(amp) = rest.find('&') {
            out.push_str(&rest[..amp]);
            let after = &rest[amp + 1..];
            let consumed = if after.starts_with('#') {
                numeric_reference(after, &mut out)
            } else {
                named_reference(after, &mut out)
            };
            match consumed {
                Some(used) => rest = &after[used..],
                None => {
                    out.push('&');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Decodes `s` with [`HtmlEntityDecoder`]; `None` yields `""`.
pub fn decode_entities(s: Option<&str>) -> String {
    HtmlEntityDecoder.decode_opt(s)
}

// Keyed without the leading `&`: both `amp;` and the legacy `amp` appear.
fn named_references() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        entities::ENTITIES
            .iter()
            .map(|e| (e.entity.trim_start_matches('&'), e.characters))
            .collect()
    })
}

// `s` starts just past the `&`. Returns the bytes consumed.
fn named_reference(s: &str, out: &mut String) -> Option<usize> {
    let table = named_references();
    let run = s
        .bytes()
        .take(MAX_ENTITY_LEN)
        .take_while(u8::is_ascii_alphanumeric)
        .count();
    if run == 0 {
        return None;
    }
    if s[run..].starts_with(';') {
        if let Some(text) = table.get(&s[..=run]) {
            out.push_str(text);
            return Some(run + 1);
        }
    }
    // Legacy names match as the longest prefix, so `&notit;` reads `¬it;`.
    let (len, text) = (1..=run)
        .rev()
        .find_map(|len| table.get(&s[..len]).map(|text| (len, *text)))?;
    out.push_str(text);
    Some(len)
}

fn numeric_reference(s: &str, out: &mut String) -> Option<usize> {
    let (start, radix) = match s.as_bytes().get(1) {
        Some(b'x' | b'X') => (2, 16),
        _ => (1, 10),
    };
    let digits = s[start..]
        .chars()
        .take_while(|c| c.is_digit(radix))
        .count();
    if digits == 0 {
        return None;
    }
    let end = start + digits;
    let code = s[start..end]
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0u32, |acc, d| acc.saturating_mul(radix).saturating_add(d));
    out.push(code_point(code));
    Some(if s[end..].starts_with(';') { end + 1 } else { end })
}

// NUL, surrogates and out-of-range values become U+FFFD. The C1 range
// is read as windows-1252, as browsers do.
fn code_point(code: u32) -> char {
    if let Some(c) = windows_1252(code) {
        return c;
    }
    match code {
        0 => char::REPLACEMENT_CHARACTER,
        _ => char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER),
    }
}

fn windows_1252(code: u32) -> Option<char> {
    let c = match code {
        0x80 => '\u{20ac}',
        0x82 => '\u{201a}',
        0x83 => '\u{0192}',
        0x84 => '\u{201e}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02c6}',
        0x89 => '\u{2030}',
        0x8a => '\u{0160}',
        0x8b => '\u{2039}',
        0x8c => '\u{0152}',
        0x8e => '\u{017d}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201c}',
        0x94 => '\u{201d}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02dc}',
        0x99 => '\u{2122}',
        0x9a => '\u{0161}',
        0x9b => '\u{203a}',
        0x9c => '\u{0153}',
        0x9e => '\u{017e}',
        0x9f => '\u{0178}',
        _ => return None,
    };
    Some(c)
}
