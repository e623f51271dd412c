//! Inverted index: values are the documents a word was seen in.
use itertools::Itertools;

/// `"<n> doc1,doc2,..."` with each document listed once, sorted.
#[no_mangle]
pub fn reduce(_key: &str, values: Vec<String>) -> Result<String, String> {
    let docs = values.into_iter().sorted().dedup().collect_vec();
    Ok(format!("{} {}", docs.len(), docs.join(",")))
}
