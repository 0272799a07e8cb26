use std::collections::BTreeMap;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::store::{require_mode, EntryStore, StoreMode};

/// Magic bytes at the start of every archive.
const MAGIC: [u8; 4] = *b"MPAK";

/// Archive format version written by this crate.
const FORMAT_VERSION: u16 = 1;

/// Suffix appended to the previous file when a path is overwritten.
const BACKUP_SUFFIX: &str = ".bck";

/// Single-file compressed archive container — the persisted `.mat` format.
///
/// # Layout
///
/// All integers are little-endian:
///
/// ```text
/// magic "MPAK"  [u8; 4]
/// version       u16
/// entry count   u32
/// per entry:
///   name length u16, name bytes (UTF-8)
///   raw length  u32
///   compressed  u32
///   LZ4 block   [u8; compressed]
/// ```
///
/// Entries are compressed individually so a single entry can be read without
/// touching the rest of the archive body.
///
/// # Write path
///
/// [`ArchiveStore::create`] buffers entries in memory; nothing touches disk
/// until [`finish`](EntryStore::finish). Before the archive is written over
/// an existing file, that file is copied to `<path>.bck`. The backup is
/// best-effort: the copy and the subsequent write are two separate steps, and
/// a crash between them can still lose the previous file.
pub struct ArchiveStore {
    path: PathBuf,
    mode: StoreMode,
    backup: bool,
    /// Entry name -> (raw length, LZ4 block).
    entries: BTreeMap<String, (u32, Vec<u8>)>,
    finished: bool,
}

impl ArchiveStore {
    /// Open an existing archive for reading. The entry table and compressed
    /// blocks are read eagerly; decompression happens per entry on demand.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let file = std::fs::File::open(&path)?;
        let total = file.metadata()?.len();
        let mut reader = std::io::BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(StoreError::Format(format!(
                "{} is not a material package archive",
                path.display()
            )));
        }
        let version = read_u16(&mut reader)?;
        if version > FORMAT_VERSION {
            return Err(StoreError::Format(format!(
                "unsupported archive version {version} (newest supported is {FORMAT_VERSION})"
            )));
        }
        let count = read_u32(&mut reader)?;

        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let name_len = read_u16(&mut reader)? as usize;
            let mut name_bytes = vec![0u8; name_len];
            reader.read_exact(&mut name_bytes)?;
            let name = String::from_utf8(name_bytes)
                .map_err(|_| StoreError::Format("entry name is not valid UTF-8".into()))?;
            let raw_len = read_u32(&mut reader)?;
            let compressed_len = read_u32(&mut reader)? as usize;
            // Declared lengths come from untrusted input; sanity-check them
            // before any allocation sized by them. A block cannot be larger
            // than the archive itself, and LZ4 cannot expand a block by more
            // than 255x.
            if compressed_len as u64 > total {
                return Err(StoreError::Format(format!(
                    "entry '{name}' declares {compressed_len} compressed bytes \
                     in a {total}-byte archive"
                )));
            }
            if raw_len as u64 > compressed_len as u64 * 255 + 64 {
                return Err(StoreError::Format(format!(
                    "entry '{name}' declares an implausible size \
                     ({raw_len} bytes from a {compressed_len}-byte block)"
                )));
            }
            let mut block = vec![0u8; compressed_len];
            // read_exact loops until the buffer is full; a short file is an
            // integrity failure, not a partial read.
            reader.read_exact(&mut block).map_err(|_| {
                StoreError::Integrity(format!("entry '{name}' is truncated"))
            })?;
            entries.insert(name, (raw_len, block));
        }

        Ok(Self {
            path,
            mode: StoreMode::Read,
            backup: false,
            entries,
            finished: true,
        })
    }

    /// Start a new archive at `path`. Entries are buffered in memory and the
    /// file is written by [`finish`](EntryStore::finish). If `backup` is set
    /// and a file already exists at `path`, it is copied to `<path>.bck`
    /// before being overwritten.
    pub fn create(path: impl Into<PathBuf>, backup: bool) -> Self {
        Self {
            path: path.into(),
            mode: StoreMode::Create,
            backup,
            entries: BTreeMap::new(),
            finished: false,
        }
    }

    /// The path this archive reads from or writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The backup path used when overwriting this archive.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(BACKUP_SUFFIX);
        PathBuf::from(name)
    }

    fn write_out(&self) -> Result<(), StoreError> {
        if self.backup && self.path.exists() {
            let backup = self.backup_path();
            if let Err(err) = std::fs::copy(&self.path, &backup) {
                // Best-effort: a failed backup should not block the save.
                log::warn!(
                    "failed to back up {} to {}: {err}",
                    self.path.display(),
                    backup.display()
                );
            }
        }

        let file = std::fs::File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        writer.write_all(&(self.entries.len() as u32).to_le_bytes())?;
        for (name, (raw_len, block)) in &self.entries {
            writer.write_all(&(name.len() as u16).to_le_bytes())?;
            writer.write_all(name.as_bytes())?;
            writer.write_all(&raw_len.to_le_bytes())?;
            writer.write_all(&(block.len() as u32).to_le_bytes())?;
            writer.write_all(block)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl EntryStore for ArchiveStore {
    fn mode(&self) -> StoreMode {
        self.mode
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, StoreError> {
        require_mode(self.mode, StoreMode::Read, "read_entry")?;
        let (raw_len, block) = self
            .entries
            .get(name)
            .ok_or_else(|| StoreError::NotFound(name.to_owned()))?;
        let data = lz4_flex::decompress(block, *raw_len as usize)
            .map_err(|err| StoreError::Integrity(format!("entry '{name}': {err}")))?;
        if data.len() != *raw_len as usize {
            return Err(StoreError::Integrity(format!(
                "entry '{name}' decompressed to {} bytes, expected {raw_len}",
                data.len()
            )));
        }
        Ok(data)
    }

    fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<(), StoreError> {
        require_mode(self.mode, StoreMode::Create, "write_entry")?;
        if name.is_empty() || name.len() > u16::MAX as usize {
            return Err(StoreError::Format(format!(
                "entry name length {} is out of range",
                name.len()
            )));
        }
        if data.len() > u32::MAX as usize {
            return Err(StoreError::Format(format!(
                "entry '{name}' is too large for the archive format"
            )));
        }
        let block = lz4_flex::compress(data);
        self.entries
            .insert(name.to_owned(), (data.len() as u32, block));
        Ok(())
    }

    fn entry_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn finish(&mut self) -> Result<(), StoreError> {
        require_mode(self.mode, StoreMode::Create, "finish")?;
        self.write_out()?;
        self.finished = true;
        log::info!(
            "wrote archive {} ({} entries)",
            self.path.display(),
            self.entries.len()
        );
        Ok(())
    }
}

impl Drop for ArchiveStore {
    fn drop(&mut self) {
        if self.mode == StoreMode::Create && !self.finished {
            log::warn!(
                "archive {} was dropped without finish(); nothing was written",
                self.path.display()
            );
        }
    }
}

fn read_u16(reader: &mut impl Read) -> Result<u16, StoreError> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32(reader: &mut impl Read) -> Result<u32, StoreError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}
