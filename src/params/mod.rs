//! Hyper-parameter mappings, grids and their canonical identity
//!
//! A parameter mapping is a `BTreeMap`, so key order is always sorted. The
//! canonical JSON form (sorted keys, `", "` / `": "` separators, serde_json
//! number formatting) is the single input to `hash_params`, which makes the
//! identifier stable across processes and runs.

mod grid;

pub use grid::{ParameterGrid, ParameterGridIter};

use std::collections::BTreeMap;
use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::Result;

/// One resolved hyper-parameter point.
pub type Params = BTreeMap<String, Value>;

/// JSON formatter emitting `", "` between elements and `": "` after keys.
#[derive(Debug, Default, Clone, Copy)]
struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Serialize parameters into their canonical JSON text.
///
/// ```rust
/// use tsad_bench::params::{canonical_json, Params};
///
/// let mut params = Params::new();
/// params.insert("window_size".to_string(), 100.into());
/// params.insert("alpha".to_string(), 0.5.into());
/// assert_eq!(canonical_json(&params).unwrap(), r#"{"alpha": 0.5, "window_size": 100}"#);
/// ```
///
/// # Errors
///
/// Returns `Error::Json` if a value cannot be serialized.
pub fn canonical_json(params: &Params) -> Result<String> {
    let mut buffer = Vec::with_capacity(64);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, CanonicalFormatter);
    params.serialize(&mut serializer)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Stable identifier of a parameter mapping: hex SHA-256 of its canonical JSON.
///
/// Independent of insertion order; any change to a key or value changes the id.
///
/// # Errors
///
/// Returns `Error::Json` if a value cannot be serialized.
pub fn hash_params(params: &Params) -> Result<String> {
    let json = canonical_json(params)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write the canonical JSON form of `params` to `path`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn dump_params(params: &Params, path: &std::path::Path) -> Result<()> {
    std::fs::write(path, canonical_json(params)?)?;
    Ok(())
}
