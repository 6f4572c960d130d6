//! Catalog and input fixtures shared by handler tests

use crate::cli::OutputFormat;
use crate::output::testing::SharedBuffer;
use crate::output::OutputWriter;
use std::fs;
use std::path::{Path, PathBuf};

pub const CATALOG: &str = r#"
types:
  - id: User
    fields:
      - id
      - name: name
        from: user.full_name
      - email
    field_filters:
      email: [lower]
  - id: Greeting
    fields: [text]
    template:
      text: "Hello {{ user.full_name | trim | ucwords }}"
"#;

pub const BROKEN_CATALOG: &str = r#"
types:
  - id: User
    fields: [id]
  - id: Broken
    fields: [name]
    template:
      name: "{{ user.name | shout }}"
"#;

pub fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

pub fn writer(format: OutputFormat) -> (OutputWriter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let writer = OutputWriter::with_writer(format, false, false, 0, Box::new(buffer.clone()));
    (writer, buffer)
}
