//! Text cleanup applied to every block and chunk, plus the hash-only normal form.

/// UTF-8 text that was decoded as Windows-1252 somewhere upstream.
const MOJIBAKE: &[(&str, &str)] = &[
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€\u{9d}", "\""),
    ("â€“", "-"),
    ("â€”", "-"),
    ("â€¦", "..."),
    ("â€¢", "*"),
    ("Â\u{a0}", " "),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ãª", "ê"),
    ("Ã¡", "á"),
    ("Ã\u{a0}", "à"),
    ("Ã³", "ó"),
    ("Ã¶", "ö"),
    ("Ã¼", "ü"),
    ("Ã±", "ñ"),
    ("Ã§", "ç"),
];

fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200c}'
            | '\u{200d}'
            | '\u{2060}'
            | '\u{feff}'
            | '\u{200e}'
            | '\u{200f}'
            | '\u{202a}'..='\u{202e}'
            | '\u{2066}'..='\u{2069}'
    )
}

/// Repair encoding damage, drop invisible characters, map typography to ASCII
/// and collapse whitespace. Total: every input yields a string.
pub fn clean(text: &str) -> String {
    let mut repaired = text.to_string();
    for (broken, fixed) in MOJIBAKE {
        if repaired.contains(broken) {
            repaired = repaired.replace(broken, fixed);
        }
    }

    let mut mapped = String::with_capacity(repaired.len());
    for c in repaired.chars() {
        match c {
            c if is_invisible(c) => {}
            '\u{200b}' | '\u{a0}' => mapped.push(' '),
            '\u{2018}' | '\u{2019}' | '\u{201a}' | '\u{201b}' | '\u{2032}' => mapped.push('\''),
            '\u{201c}' | '\u{201d}' | '\u{201e}' | '\u{201f}' | '\u{2033}' => mapped.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => mapped.push('-'),
            '\u{2026}' => mapped.push_str("..."),
            _ => mapped.push(c),
        }
    }

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase, with every run of non-word characters reduced to one space.
/// Only ever hashed, never shown.
pub fn normalize_for_hash(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut gap = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '_' {
            if gap && !out.is_empty() {
                out.push(' ');
            }
            gap = false;
            out.push(c);
        } else {
            gap = true;
        }
    }
    out
}
