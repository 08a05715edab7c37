//! Ordering used to pick the most recently retrained model.
//!
//! Retrained artifacts are named with a month counter (`..._month_2`,
//! `..._month_10`). Plain string ordering ranks `month_2` above `month_10`, so
//! names are compared chunk by chunk with digit runs compared as numbers.

use std::cmp::Ordering;

/// Marker identifying retrained models.
pub const RETRAINED_MARKER: &str = "month";

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Text(&'a str),
    Number(&'a str),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = None;

    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != is_digit => {
                out.push(make_chunk(&s[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(is_digit);
    }
    if let Some(prev) = in_digits {
        out.push(make_chunk(&s[start..], prev));
    }
    out
}

fn make_chunk(s: &str, digits: bool) -> Chunk<'_> {
    if digits {
        Chunk::Number(s)
    } else {
        Chunk::Text(s)
    }
}

/// Compare two digit runs by numeric value without parsing.
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Numeric-aware string comparison.
///
/// Ties (for example `month_02` vs `month_2`) are broken by plain string order
/// so the ordering is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (ca, cb) = (chunks(a), chunks(b));
    for (x, y) in ca.iter().zip(&cb) {
        let ord = match (x, y) {
            (Chunk::Number(x), Chunk::Number(y)) => cmp_digits(x, y),
            (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ca.len().cmp(&cb.len()).then_with(|| a.cmp(b))
}

/// The greatest retrained model name, if any.
pub fn latest_retrained<'a, I>(names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter(|name| name.contains(RETRAINED_MARKER))
        .max_by(|a, b| natural_cmp(a, b))
}
