use std::{
    collections::HashMap,
    fs::File,
    io::BufReader,
    path::Path,
};

use common::{reduce_name, RecordReader};
use itertools::Itertools;
use tracing::debug;

use crate::ReduceError;

/// All values seen for every key of one partition.
#[derive(Debug, Default)]
pub struct Grouped {
    groups: HashMap<String, Vec<String>>,
    records: usize,
}

impl Grouped {
    pub fn push(&mut self, key: String, value: String) {
        self.groups.entry(key).or_default().push(value);
        self.records += 1;
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Drains the groups in ascending byte-wise key order.
    pub fn into_sorted(self) -> impl Iterator<Item = (String, Vec<String>)> {
        self.groups
            .into_iter()
            .sorted_unstable_by(|(a, _), (b, _)| a.cmp(b))
    }
}

pub fn collect(
    dir: &Path,
    job_name: &str,
    reduce_task: usize,
    n_map: usize,
) -> Result<Grouped, ReduceError> {
    let mut grouped = Grouped::default();
    for map_task in 0..n_map {
        let path = dir.join(reduce_name(job_name, map_task, reduce_task));
        let read = collect_file(&path, &mut grouped)?;
        debug!("read {} records from {}", read, path.display());
    }
    Ok(grouped)
}

fn collect_file(path: &Path, grouped: &mut Grouped) -> Result<usize, ReduceError> {
    let file = File::open(path).map_err(|source| ReduceError::InputUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut read = 0;
    for kv in RecordReader::new(BufReader::new(file)) {
        let kv = kv.map_err(|source| ReduceError::Decode {
            path: path.to_path_buf(),
            record: read,
            source,
        })?;
        grouped.push(kv.key, kv.value);
        read += 1;
    }
    Ok(read)
}
