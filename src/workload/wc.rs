//! A MapReduce-compatible implementation of word count.
//!

use crate::KeyValue;

pub fn map(_filename: &str, contents: &str) -> Vec<KeyValue> {
    contents
        .split(|c: char| !c.is_alphabetic())
        .filter(|s| !s.is_empty())
        .map(|word| KeyValue::new(word, "1"))
        .collect()
}

/// Sums the counts.
///
/// A value that is not a count is kept in the output after the sum, as
/// `"{sum} !{value}"`, and logged, so corrupt intermediate data shows up in
/// the result instead of being dropped.
pub fn reduce(key: &str, values: &[String]) -> String {
    let (counts, malformed): (Vec<_>, Vec<_>) = values
        .iter()
        .map(|v| v.parse::<u64>().map_err(|_| v.as_str()))
        .partition(Result::is_ok);
    let count: u64 = counts.into_iter().flatten().sum();
    if malformed.is_empty() {
        return count.to_string();
    }

    let malformed = malformed.into_iter().filter_map(Result::err).collect::<Vec<_>>();
    tracing::warn!(key, ?malformed, "word count values are not counts");
    let mut out = count.to_string();
    for value in malformed {
        out.push_str(" !");
        out.push_str(value);
    }
    out
}
