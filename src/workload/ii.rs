//! A MapReduce-compatible inverted index.
//!
//! Maps every word to the input files it occurs in. The reduced value is
//! `"{count} {file},{file},..."` with the files sorted and deduplicated.

use crate::KeyValue;
use itertools::Itertools;

pub fn map(filename: &str, contents: &str) -> Vec<KeyValue> {
    contents
        .split(|c: char| !c.is_alphabetic())
        .filter(|s| !s.is_empty())
        .unique()
        .map(|word| KeyValue::new(word, filename))
        .collect()
}

pub fn reduce(_key: &str, values: &[String]) -> String {
    let files = values.iter().sorted().dedup().collect::<Vec<_>>();
    format!("{} {}", files.len(), files.iter().join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_record_per_word_and_file() {
        let kvs = map("doc1", "the cat the hat");
        assert_eq!(
            kvs,
            vec![
                KeyValue::new("the", "doc1"),
                KeyValue::new("cat", "doc1"),
                KeyValue::new("hat", "doc1"),
            ]
        );
    }

    #[test]
    fn lists_files() {
        let values = ["b.txt", "a.txt", "b.txt"].map(String::from);
        assert_eq!(reduce("the", &values), "2 a.txt,b.txt");
    }
}
