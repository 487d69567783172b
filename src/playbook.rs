//! The playbook: durable, append-only long-term memory.
//!
//! Lessons live in a single Markdown file. Each lesson is one block:
//!
//! ```text
//! ## Entry [2026-03-14 09:26:53]
//! - Always check firewall state before scanning
//! ```
//!
//! The file is read once when the store is loaded. After that the in-memory
//! mirror is authoritative: every successful append writes the block to disk
//! and then extends the mirror with the same text. Nothing here parses the
//! file back into entries; it is consumed as raw prompt context.

mod entry;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

// Trait must be in scope for `.write_all()` on File.
use io::Write;

use tracing::{debug, info, warn};

pub use entry::Entry;

/// Rendered in place of the playbook while it holds no entries.
pub const EMPTY_PLAYBOOK: &str = "No previous playbook entries found.";

/// Marker that opens every entry block.
const ENTRY_HEADING: &str = "\n## Entry [";

/// Errors that can occur while reading or appending to the playbook.
///
/// A missing file is not an error: it is an empty playbook.
#[derive(Debug, thiserror::Error)]
pub enum PlaybookError {
    #[error("playbook I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = core::result::Result<T, PlaybookError>;

/// File-backed playbook with an in-memory mirror.
#[derive(Debug)]
pub struct PlaybookStore {
    path: PathBuf,
    mirror: String,
}

impl PlaybookStore {
    /// Loads the playbook at `path`.
    ///
    /// A missing file yields an empty playbook. Any other read failure
    /// (permissions, path is a directory, invalid UTF-8) is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mirror = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no playbook on disk, starting empty");
                String::new()
            }
            Err(source) => return Err(PlaybookError::Io { path, source }),
        };
        Ok(Self { path, mirror })
    }

    /// Returns the default playbook location: `~/.ace/playbook.md`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".ace").join("playbook.md"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The playbook as prompt context.
    ///
    /// Returns the mirror verbatim, or [`EMPTY_PLAYBOOK`] while it is empty.
    pub fn render(&self) -> &str {
        if self.mirror.is_empty() {
            EMPTY_PLAYBOOK
        } else {
            &self.mirror
        }
    }

    /// Number of entry headings in the mirror.
    ///
    /// Counted textually: insights are not validated, so one that itself
    /// contains an entry heading counts twice. Use it for display only.
    pub fn len(&self) -> usize {
        self.mirror.matches(ENTRY_HEADING).count()
    }

    /// Whether the mirror holds no text at all.
    ///
    /// A file with content but no entry headings is not empty even though
    /// [`len`](Self::len) is zero.
    pub fn is_empty(&self) -> bool {
        self.mirror.is_empty()
    }

    /// Records `insight` as a new entry stamped with the current time.
    pub fn append(&mut self, insight: &str) -> Result<Entry> {
        let entry = Entry::new(insight);
        self.record(&entry)?;
        Ok(entry)
    }

    /// Appends a pre-built entry.
    ///
    /// The rendered block is appended to the file; if the write fails partway
    /// the file is cut back to its previous length. The mirror is only
    /// extended once the write succeeds, so a failed append leaves both
    /// exactly as they were.
    pub fn record(&mut self, entry: &Entry) -> Result<()> {
        let block = entry.render();
        self.write_block(&block)
            .map_err(|source| PlaybookError::Io {
                path: self.path.clone(),
                source,
            })?;
        self.mirror.push_str(&block);
        info!(
            path = %self.path.display(),
            timestamp = %entry.timestamp(),
            "playbook entry recorded"
        );
        Ok(())
    }

    fn write_block(&self, block: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        append_or_rewind(&mut file, block.as_bytes())
    }
}

/// An append target that can be cut back to an earlier length.
trait Rewind: Write {
    fn end(&mut self) -> io::Result<u64>;
    fn rewind_to(&mut self, len: u64) -> io::Result<()>;
}

impl Rewind for fs::File {
    fn end(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn rewind_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Writes `block` in full or leaves the target at its original length.
///
/// The write error is returned even when rewinding also fails.
fn append_or_rewind(target: &mut impl Rewind, block: &[u8]) -> io::Result<()> {
    let len = target.end()?;
    let Err(e) = target.write_all(block).and_then(|()| target.flush()) else {
        return Ok(());
    };
    if let Err(rewind) = target.rewind_to(len) {
        warn!(error = %rewind, "failed to remove partial playbook entry");
    }
    Err(e)
}
