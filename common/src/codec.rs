//! Records are JSON objects written back to back, one per line.
//! The JSON grammar is the only framing, so a reader can pull records
//! one at a time without loading the whole file.

use std::io::{self, Read, Write};

use serde_json::{de::IoRead, StreamDeserializer};

use crate::KeyValue;

pub struct RecordReader<R: Read> {
    stream: StreamDeserializer<'static, IoRead<R>, KeyValue>,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            stream: serde_json::Deserializer::from_reader(reader).into_iter(),
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<KeyValue, serde_json::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stream.next()
    }
}

pub struct RecordWriter<W: Write> {
    inner: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write(&mut self, kv: &KeyValue) -> io::Result<()> {
        serde_json::to_writer(&mut self.inner, kv)?;
        self.inner.write_all(b"\n")
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
