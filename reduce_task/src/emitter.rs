use std::{
    ffi::OsStr,
    fs::{self, File, OpenOptions},
    io::{self, BufWriter},
    path::{Path, PathBuf},
};

use common::{KeyValue, RecordWriter, Reducer};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{collector::Grouped, ReduceError};

/// Writes one reduced record per key, in key order. `out_file` only appears
/// once every record is written and synced.
pub fn emit<R>(grouped: Grouped, reducer: &R, out_file: &Path) -> Result<usize, ReduceError>
where
    R: Reducer + ?Sized,
{
    remove_stale(out_file)?;
    let mut output = PendingOutput::create(out_file)?;

    let mut written = 0;
    for (key, values) in grouped.into_sorted() {
        let value = reducer
            .reduce(&key, values)
            .map_err(|err| ReduceError::ReduceFn {
                key: key.clone(),
                source: err.into(),
            })?;
        output.write(&KeyValue { key, value })?;
        written += 1;
    }

    output.commit()?;
    Ok(written)
}

pub(crate) fn remove_stale(out_file: &Path) -> Result<(), ReduceError> {
    match fs::remove_file(out_file) {
        Ok(()) => {
            debug!("removed stale output {}", out_file.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ReduceError::output(out_file)(e)),
    }
}

struct PendingOutput {
    out_file: PathBuf,
    tmp_file: PathBuf,
    writer: Option<RecordWriter<BufWriter<File>>>,
    committed: bool,
}

impl PendingOutput {
    fn create(out_file: &Path) -> Result<Self, ReduceError> {
        if let Some(parent) = out_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(ReduceError::output(out_file))?;
        }
        let tmp_file = temp_path(out_file);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_file)
            .map_err(ReduceError::output(out_file))?;
        Ok(Self {
            out_file: out_file.to_path_buf(),
            tmp_file,
            writer: Some(RecordWriter::new(BufWriter::new(file))),
            committed: false,
        })
    }

    fn write(&mut self, kv: &KeyValue) -> Result<(), ReduceError> {
        match self.writer.as_mut() {
            Some(writer) => writer.write(kv).map_err(ReduceError::output(&self.out_file)),
            None => Err(ReduceError::output(&self.out_file)(io::Error::other(
                "output already closed",
            ))),
        }
    }

    fn commit(mut self) -> Result<(), ReduceError> {
        let Some(writer) = self.writer.take() else {
            return Err(ReduceError::output(&self.out_file)(io::Error::other(
                "output already closed",
            )));
        };
        let file = writer
            .into_inner()
            .into_inner()
            .map_err(|e| ReduceError::output(&self.out_file)(e.into_error()))?;
        file.sync_all().map_err(ReduceError::output(&self.out_file))?;
        drop(file);

        fs::rename(&self.tmp_file, &self.out_file).map_err(ReduceError::output(&self.out_file))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PendingOutput {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // close before unlinking
        drop(self.writer.take());
        if let Err(e) = fs::remove_file(&self.tmp_file) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("failed to remove {}: {}", self.tmp_file.display(), e);
            }
        }
    }
}

fn temp_path(out_file: &Path) -> PathBuf {
    let mut name = out_file
        .file_name()
        .map(OsStr::to_os_string)
        .unwrap_or_default();
    name.push(format!(".{}.tmp", Uuid::new_v4()));
    out_file.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grouped(kvs: &[(&str, &str)]) -> Grouped {
        let mut grouped = Grouped::default();
        for (k, v) in kvs {
            grouped.push(k.to_string(), v.to_string());
        }
        grouped
    }

    fn sum(_: &str, values: Vec<String>) -> anyhow::Result<String> {
        let mut total = 0u64;
        for v in values {
            total += v.parse::<u64>()?;
        }
        Ok(total.to_string())
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_writes_sorted_records() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let input = grouped(&[("dog", "1"), ("cat", "1"), ("ant", "1"), ("cat", "1")]);

        assert_eq!(emit(input, &sum, &out).unwrap(), 3);
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "{\"Key\":\"ant\",\"Value\":\"1\"}\n\
             {\"Key\":\"cat\",\"Value\":\"2\"}\n\
             {\"Key\":\"dog\",\"Value\":\"1\"}\n"
        );
        assert_eq!(dir_entries(dir.path()), ["out"]);
    }

    #[test]
    fn test_empty_partition_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        assert_eq!(emit(Grouped::default(), &sum, &out).unwrap(), 0);
        assert_eq!(fs::read(&out).unwrap(), b"");
    }

    #[test]
    fn test_overwrites_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::write(&out, "garbage that is much longer than the real output").unwrap();

        emit(grouped(&[("a", "4")]), &sum, &out).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "{\"Key\":\"a\",\"Value\":\"4\"}\n");
    }

    #[test]
    fn test_reduce_failure_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::write(&out, "stale").unwrap();

        let err = emit(grouped(&[("a", "1"), ("b", "x"), ("c", "1")]), &sum, &out).unwrap_err();
        match err {
            ReduceError::ReduceFn { ref key, .. } => assert_eq!(key, "b"),
            ref other => panic!("unexpected error: {other}"),
        }
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[test]
    fn test_creates_missing_parent() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        emit(grouped(&[("a", "1")]), &sum, &out).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn test_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let err = emit(grouped(&[("a", "1")]), &sum, &blocker.join("out")).unwrap_err();
        assert!(matches!(err, ReduceError::OutputWrite { .. }));
    }

    #[test]
    fn test_reduce_called_once_per_key_in_order() {
        use std::cell::RefCell;

        let dir = tempfile::tempdir().unwrap();
        let seen = RefCell::new(Vec::new());
        let record = |key: &str, values: Vec<String>| -> anyhow::Result<String> {
            seen.borrow_mut().push((key.to_string(), values.len()));
            Ok(String::new())
        };
        emit(
            grouped(&[("b", "1"), ("a", "1"), ("b", "2"), ("c", "1")]),
            &record,
            &dir.path().join("out"),
        )
        .unwrap();

        assert_eq!(
            seen.into_inner(),
            [("a".to_string(), 1), ("b".to_string(), 2), ("c".to_string(), 1)]
        );
    }

    #[test]
    fn test_abandoned_output_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        let mut output = PendingOutput::create(&out).unwrap();
        output.write(&KeyValue::new("a", "1")).unwrap();
        assert_eq!(dir_entries(dir.path()).len(), 1);
        drop(output);

        assert!(dir_entries(dir.path()).is_empty());
        assert!(!out.exists());
    }

    #[test]
    fn test_abandoned_output_after_stale_removal() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::write(&out, "from an earlier attempt").unwrap();

        remove_stale(&out).unwrap();
        let mut output = PendingOutput::create(&out).unwrap();
        output.write(&KeyValue::new("a", "1")).unwrap();
        output.write(&KeyValue::new("b", "2")).unwrap();
        drop(output);

        assert!(!dir_entries(dir.path()).iter().any(|name| name.ends_with(".tmp")));
        assert!(!out.exists());
    }

    #[test]
    fn test_temp_path_is_a_sibling() {
        let tmp = temp_path(Path::new("/data/mrtmp.wc-res-0"));
        assert_eq!(tmp.parent(), Some(Path::new("/data")));
        let name = tmp.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("mrtmp.wc-res-0."));
        assert!(name.ends_with(".tmp"));
    }
}
