#![forbid(unsafe_code)]

//! Ordered image-sequence assets.
//!
//! Frame files are ordered by the numeric runs in their file names
//! (`shot2-frame10.webp` → `[2, 10]`), compared element by element. A name
//! whose numbers are a prefix of another's sorts first. Remaining ties fall
//! back to a case-insensitive natural comparison of the whole file name.

use std::cmp::Ordering;

/// An ordered list of frame sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSet {
    sources: Vec<String>,
}

impl FrameSet {
    /// Build a set from unordered sources.
    pub fn from_sources<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sources: Vec<String> = sources.into_iter().map(Into::into).collect();
        sources.sort_by(|a, b| compare_frame_paths(a, b));
        Self { sources }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.sources.get(index).map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.get(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(String::as_str)
    }
}

/// File name component of a path or URL.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Numeric runs in `name`, in order. Runs too long for `u64` saturate.
pub fn numeric_parts(name: &str) -> Vec<u64> {
    let mut parts = Vec::new();
    let mut current: Option<u64> = None;
    for ch in name.chars() {
        if let Some(d) = ch.to_digit(10) {
            let acc = current.unwrap_or(0);
            current = Some(acc.saturating_mul(10).saturating_add(u64::from(d)));
        } else if let Some(n) = current.take() {
            parts.push(n);
        }
    }
    parts.extend(current);
    parts
}

/// Ordering used for frame sequences.
pub fn compare_frame_paths(a: &str, b: &str) -> Ordering {
    let (name_a, name_b) = (file_name(a), file_name(b));
    let (nums_a, nums_b) = (numeric_parts(name_a), numeric_parts(name_b));
    for i in 0..nums_a.len().max(nums_b.len()) {
        match (nums_a.get(i), nums_b.get(i)) {
            (None, _) => return Ordering::Less,
            (_, None) => return Ordering::Greater,
            (Some(x), Some(y)) if x != y => return x.cmp(y),
            _ => {}
        }
    }
    natural_cmp(name_a, name_b)
}

enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits: Option<bool> = None;
    for (i, ch) in s.char_indices() {
        let digit = ch.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != digit => {
                out.push(make_chunk(&s[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(digit);
    }
    if let Some(prev) = in_digits {
        out.push(make_chunk(&s[start..], prev));
    }
    out
}

fn make_chunk(text: &str, digits: bool) -> Chunk<'_> {
    if digits {
        Chunk::Digits(text)
    } else {
        Chunk::Text(text)
    }
}

fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Case-insensitive natural string comparison (`frame2` < `frame10`).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (ca, cb) = (chunks(a), chunks(b));
    for (x, y) in ca.iter().zip(cb.iter()) {
        let ord = match (x, y) {
            (Chunk::Digits(x), Chunk::Digits(y)) => cmp_digit_runs(x, y),
            (Chunk::Text(x), Chunk::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
            // Digits sort before letters, as in locale collation.
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ca.len().cmp(&cb.len())
}
