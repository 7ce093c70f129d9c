//! core::ledger
//!
//! The flat-file ledger of tracked target/symlink pairs.
//!
//! # Architecture
//!
//! One text file at the repository root holds the whole ledger, one entry
//! per line, in file order. An entry is either a tracked record or an
//! opaque comment (a blank line or a line starting with `#`). Comments are
//! re-emitted verbatim and never participate in lookups.
//!
//! Record lines have the shape:
//!
//! ```text
//! "<quoted-symlink>" => "<quoted-target>"
//! ```
//!
//! Fields are quoted with a reversible escape scheme so arbitrary path
//! content - embedded `=>`, quote characters, whitespace, even newlines -
//! round-trips exactly.
//!
//! # Invariants
//!
//! - A target or symlink value appears in at most one tracked record
//! - Reads materialize the full ordered sequence or fail entirely; a
//!   malformed line aborts parsing with its 1-based line number
//! - Appends never rewrite existing content; removals rewrite the whole
//!   file through a temporary sibling plus atomic rename

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed two-character token separating the two fields of a record line.
pub const SEPARATOR: &str = "=>";

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The target or symlink is already present in a tracked record.
    #[error("'{0}' already exists in the ledger")]
    Duplicate(String),

    /// No tracked record matches the given path.
    #[error("'{0}' not found in the ledger")]
    NotFound(String),

    /// A non-comment line did not parse as a record.
    #[error("invalid ledger line: {line}")]
    Parse {
        /// 1-based line number of the first malformed line.
        line: usize,
    },

    /// I/O error reading or writing the ledger file.
    #[error("ledger io error: {0}")]
    Io(#[from] io::Error),
}

/// One tracked target/symlink pair.
///
/// `target` is the absolute path of the original file before relocation.
/// `symlink` is the path, relative to the repository root, where the
/// content physically lives after the move - the actual symbolic link is
/// placed at `target`, pointing there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Absolute path of the original file.
    pub target: String,
    /// Repository-relative path of the relocated content.
    pub symlink: String,
}

impl Record {
    /// Create a new record.
    pub fn new(target: impl Into<String>, symlink: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            symlink: symlink.into(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            quote(&self.symlink),
            SEPARATOR,
            quote(&self.target)
        )
    }
}

/// One line of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A tracked target/symlink pair.
    Tracked(Record),
    /// A blank line or `#` comment, preserved verbatim.
    Comment(String),
}

impl Entry {
    /// Get the record if this entry is tracked.
    pub fn as_tracked(&self) -> Option<&Record> {
        match self {
            Entry::Tracked(record) => Some(record),
            Entry::Comment(_) => None,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Tracked(record) => record.fmt(f),
            Entry::Comment(raw) => f.write_str(raw),
        }
    }
}

/// Handle to the ledger file of one repository.
///
/// The handle holds no in-memory state; every operation performs a fresh
/// read of the backing file so the handle can be cloned freely into
/// pipeline operations.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    /// Create a handle for the ledger file at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the full ordered entry sequence.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Parse`] with the 1-based line number of the first
    /// malformed non-comment line; no partial results are returned.
    pub fn read(&self) -> Result<Vec<Entry>, LedgerError> {
        let data = fs::read_to_string(&self.path)?;

        let mut entries = Vec::new();
        for (i, line) in data.lines().enumerate() {
            if line.is_empty() || line.starts_with('#') {
                entries.push(Entry::Comment(line.to_string()));
                continue;
            }

            match parse_record(line) {
                Some(record) => entries.push(Entry::Tracked(record)),
                None => return Err(LedgerError::Parse { line: i + 1 }),
            }
        }

        Ok(entries)
    }

    /// Read only the tracked records, in file order.
    pub fn records(&self) -> Result<Vec<Record>, LedgerError> {
        Ok(self
            .read()?
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Tracked(record) => Some(record),
                Entry::Comment(_) => None,
            })
            .collect())
    }

    /// Append a new tracked record.
    ///
    /// Existing content is not reordered or rewritten.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Duplicate`] if `target` or `symlink` equals any
    /// existing tracked record's target or symlink.
    pub fn store(&self, target: &str, symlink: &str) -> Result<(), LedgerError> {
        for record in self.records()? {
            if record.target == target || record.symlink == target {
                return Err(LedgerError::Duplicate(target.to_string()));
            }
            if record.target == symlink || record.symlink == symlink {
                return Err(LedgerError::Duplicate(symlink.to_string()));
            }
        }

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(file, "{}", Record::new(target, symlink))?;
        file.sync_all()?;
        Ok(())
    }

    /// Find the first tracked record whose target or symlink equals `path`.
    ///
    /// Comments are skipped; scanning is in file order. By the uniqueness
    /// invariant a well-formed ledger has at most one match.
    pub fn find(&self, path: &str) -> Result<Record, LedgerError> {
        for entry in self.read()? {
            if let Entry::Tracked(record) = entry {
                if record.target == path || record.symlink == path {
                    return Ok(record);
                }
            }
        }
        Err(LedgerError::NotFound(path.to_string()))
    }

    /// Remove the tracked record whose symlink equals `symlink`.
    ///
    /// Every other line - comments included - is re-emitted verbatim and
    /// in original order. The rewrite goes through a temporary sibling
    /// file followed by an atomic rename, so a crash mid-write never
    /// leaves a truncated ledger behind.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] if no tracked record matches; the file is
    /// left unchanged.
    pub fn remove(&self, symlink: &str) -> Result<(), LedgerError> {
        let entries = self.read()?;

        let mut found = false;
        let mut kept = Vec::with_capacity(entries.len());
        for entry in entries {
            match &entry {
                Entry::Tracked(record) if !found && record.symlink == symlink => {
                    found = true;
                }
                _ => kept.push(entry),
            }
        }

        if !found {
            return Err(LedgerError::NotFound(symlink.to_string()));
        }

        self.rewrite(&kept)
    }

    /// Replace the file contents with `entries` atomically.
    fn rewrite(&self, entries: &[Entry]) -> Result<(), LedgerError> {
        let mut content = String::new();
        for entry in entries {
            content.push_str(&entry.to_string());
            content.push('\n');
        }

        let tmp = {
            let mut os = self.path.as_os_str().to_os_string();
            os.push(".tmp");
            PathBuf::from(os)
        };

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Quote a field value for emission.
///
/// Escapes backslash, double quote, newline, carriage return, and tab.
/// Everything else - separator tokens included - passes through unchanged;
/// the quotes themselves delimit the field.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Consume one quoted field from the front of `input`.
///
/// Returns the unescaped value and the remainder after the closing quote,
/// or `None` if the field is unterminated or contains a bad escape.
fn take_quoted(input: &str) -> Option<(String, &str)> {
    let rest = input.strip_prefix('"')?;

    let mut out = String::new();
    let mut iter = rest.char_indices();
    while let Some((i, c)) = iter.next() {
        match c {
            '\\' => {
                let (_, escaped) = iter.next()?;
                match escaped {
                    '\\' => out.push('\\'),
                    '"' => out.push('"'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    _ => return None,
                }
            }
            '"' => return Some((out, &rest[i + 1..])),
            _ => out.push(c),
        }
    }
    None
}

/// Parse one non-comment line into a record.
///
/// The line must be exactly: quoted field, separator, quoted field, with
/// optional surrounding whitespace. Anything else - a third field, a bare
/// separator, trailing garbage - is a parse failure.
fn parse_record(line: &str) -> Option<Record> {
    let (symlink, rest) = take_quoted(line.trim_start())?;
    let rest = rest.trim_start().strip_prefix(SEPARATOR)?;
    let (target, tail) = take_quoted(rest.trim_start())?;
    if !tail.trim().is_empty() {
        return None;
    }
    Some(Record { target, symlink })
}
