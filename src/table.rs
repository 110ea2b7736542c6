//! Row-oriented CSV tables keyed by leading columns.
//!
//! Each table keeps at most one row per key. Updates go through an
//! ownership-preserving merge: a run writes only the fields it owns and
//! everything else in an existing row survives untouched. Fields nobody has
//! produced yet serialize as empty strings, not zeros.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{bail, Context, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    key_width: usize,
    rows: BTreeMap<Vec<String>, Vec<String>>,
}

/// Merges owned `(column index, value)` pairs into an existing row, or into
/// a fresh all-blank row of `width` cells when none exists. Cells not named
/// in `owned` keep their previous contents.
pub fn merge_row(width: usize, existing: Option<&[String]>, owned: &[(usize, String)]) -> Vec<String> {
    let mut row = match existing {
        Some(row) => row.to_vec(),
        None => vec![String::new(); width],
    };
    for (index, value) in owned {
        debug_assert!(*index < width, "column index {} out of range for width {}", index, width);
        row[*index] = value.clone();
    }
    row
}

impl Table {
    pub fn new(columns: &[&str], key_width: usize) -> Table {
        assert!(key_width >= 1 && key_width <= columns.len());
        Table {
            columns: columns.iter().map(|column| column.to_string()).collect(),
            key_width,
            rows: BTreeMap::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Rows in ascending key order.
    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.values().map(|row| row.as_slice())
    }

    pub fn get(&self, key: &[&str], column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        let key: Vec<String> = key.iter().map(|cell| cell.to_string()).collect();
        self.rows.get(&key).map(|row| row[index].as_str())
    }

    /// Writes the fields this caller owns into the row at `key`, creating
    /// the row with blank cells for everyone else's fields if needed.
    pub fn upsert(&mut self, key: &[&str], owned: &[(&str, String)]) -> Result<()> {
        if key.len() != self.key_width {
            bail!(
                "key has {} cells, table expects {}",
                key.len(),
                self.key_width
            );
        }
        let mut indexed = Vec::with_capacity(owned.len() + key.len());
        for (index, cell) in key.iter().enumerate() {
            indexed.push((index, cell.to_string()));
        }
        for (name, value) in owned {
            match self.column_index(name) {
                Some(index) => indexed.push((index, value.clone())),
                None => bail!("unknown column {:?}", name),
            }
        }
        let key: Vec<String> = key.iter().map(|cell| cell.to_string()).collect();
        let merged = merge_row(self.columns.len(), self.rows.get(&key).map(|row| row.as_slice()), &indexed);
        self.rows.insert(key, merged);
        Ok(())
    }

    /// Reads a table from `path`, taking columns from the header row.
    /// `Ok(None)` when the file does not exist.
    pub fn read(path: &Path, key_width: usize) -> Result<Option<Table>> {
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("opening {}", path.display()))
            }
        };
        let mut reader = csv::Reader::from_reader(file);
        let columns: Vec<String> = reader
            .headers()
            .with_context(|| format!("reading header of {}", path.display()))?
            .iter()
            .map(|column| column.to_string())
            .collect();
        if key_width < 1 || key_width > columns.len() {
            bail!("{} has fewer columns than the key", path.display());
        }
        let mut rows = BTreeMap::new();
        for record in reader.records() {
            let record = record.with_context(|| format!("reading {}", path.display()))?;
            let mut row: Vec<String> = record.iter().map(|cell| cell.to_string()).collect();
            row.resize(columns.len(), String::new());
            let key = row[..key_width].to_vec();
            rows.insert(key, row);
        }
        Ok(Some(Table {
            columns,
            key_width,
            rows,
        }))
    }

    /// Writes the header and all rows in key order.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut writer =
            csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
        writer
            .write_record(&self.columns)
            .context("writing header")?;
        for row in self.rows.values() {
            writer
                .write_record(row)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        writer.flush().context("flushing table")?;
        Ok(())
    }
}
