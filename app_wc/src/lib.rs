//! Word count: every value is a partial count for the word in `key`.

#[no_mangle]
pub fn reduce(_key: &str, values: Vec<String>) -> Result<String, String> {
    let mut total: u64 = 0;
    for value in &values {
        let n: u64 = value
            .trim()
            .parse()
            .map_err(|e| format!("bad count {value:?}: {e}"))?;
        total += n;
    }
    Ok(total.to_string())
}
