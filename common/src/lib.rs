pub mod app;
pub mod codec;
pub mod naming;
pub mod reducer;

use serde::{Deserialize, Serialize};

pub use app::App;
pub use codec::{RecordReader, RecordWriter};
pub use naming::{merge_name, reduce_name};
pub use reducer::Reducer;

/// One intermediate or output record.
///
/// Field names are capitalised on the wire so files stay readable by the
/// existing producers and by the partition merge step.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
