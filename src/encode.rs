//! Row serialization.
//!
//! Each row becomes exactly one line (the caller appends the terminator).
//! Values are treated as opaque bytes: nothing is type-inferred and bytes
//! outside the ASCII control range pass through untouched.

use std::io::{self, Write};

use crate::db::Value;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// `{"col":"value","other":null}`
    #[default]
    Json,
    /// Tab separated fields, NULL written as an empty field.
    Tsv,
}

impl Format {
    /// Writes one row without the trailing newline.
    ///
    /// JSON keys are written verbatim, so a column name containing `"` or
    /// `\` produces invalid JSON.
    pub fn write_row<W: Write>(self, out: &mut W, columns: &[String], row: &[Value]) -> io::Result<()> {
        match self {
            Self::Json => write_json_row(out, columns, row),
            Self::Tsv => write_tsv_row(out, row),
        }
    }
}

fn write_json_row<W: Write>(out: &mut W, columns: &[String], row: &[Value]) -> io::Result<()> {
    out.write_all(b"{")?;
    for (idx, (name, value)) in columns.iter().zip(row).enumerate() {
        if idx > 0 {
            out.write_all(b",")?;
        }
        out.write_all(b"\"")?;
        out.write_all(name.as_bytes())?;
        out.write_all(b"\":")?;
        match value {
            Value::Null => out.write_all(b"null")?,
            Value::Bytes(bytes) => {
                out.write_all(b"\"")?;
                write_escaped(out, bytes, Format::Json)?;
                out.write_all(b"\"")?;
            }
        }
    }
    out.write_all(b"}")
}

fn write_tsv_row<W: Write>(out: &mut W, row: &[Value]) -> io::Result<()> {
    for (idx, value) in row.iter().enumerate() {
        if idx > 0 {
            out.write_all(b"\t")?;
        }
        if let Value::Bytes(bytes) = value {
            write_escaped(out, bytes, Format::Tsv)?;
        }
    }
    Ok(())
}

/// Backslash-escapes `\`, TAB, CR and LF (plus `"` for JSON) and drops every
/// other C0 control byte.
fn write_escaped<W: Write>(out: &mut W, value: &[u8], format: Format) -> io::Result<()> {
    let mut start = 0;
    for (idx, &byte) in value.iter().enumerate() {
        let replacement: &[u8] = match byte {
            b'"' if format == Format::Json => b"\\\"",
            b'\\' => b"\\\\",
            b'\t' => b"\\t",
            b'\r' => b"\\r",
            b'\n' => b"\\n",
            0x00..=0x1f => b"",
            _ => continue,
        };
        out.write_all(&value[start..idx])?;
        out.write_all(replacement)?;
        start = idx + 1;
    }
    out.write_all(&value[start..])
}
