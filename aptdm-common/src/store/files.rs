//! Instrument and result files stored next to the metadata

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use super::{discard_directory, DataStore};
use crate::{Error, Result};

/// Hidden directory under the datasets root holding uploads in flight
const STAGING_DIR: &str = ".uploads";

/// What a stored file is, which restricts its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Raw LEAP data
    Rhit,
    /// Reconstructed ion positions
    Pos,
    /// Range file
    Rrng,
    /// SEM image of the tip
    TipImage,
    /// Any file produced by an analysis
    AnalysisResult,
}

impl FileKind {
    /// Allowed extensions (lowercase). Empty means any extension.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileKind::Rhit => &["rhit"],
            FileKind::Pos => &["pos"],
            FileKind::Rrng => &["rrng"],
            FileKind::TipImage => &["png", "jpg", "jpeg", "tif", "tiff", "bmp"],
            FileKind::AnalysisResult => &[],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Rhit => "RHIT",
            FileKind::Pos => "POS",
            FileKind::Rrng => "RRNG",
            FileKind::TipImage => "tip image",
            FileKind::AnalysisResult => "analysis",
        }
    }

    /// True when `file_name` carries one of the allowed extensions
    pub fn accepts(&self, file_name: &str) -> bool {
        let allowed = self.extensions();
        if allowed.is_empty() {
            return true;
        }
        Path::new(file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .map(|ext| allowed.contains(&ext.as_str()))
            .unwrap_or(false)
    }
}

/// A file stored in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub name: String,
    pub size_bytes: u64,
    /// Hex-encoded SHA-256 of the contents
    pub sha256: String,
}

/// Reduce an uploaded file name to its final path component.
///
/// Browsers may send full client paths; those are cut at the last `/` or
/// `\`. Empty names, dot names and hidden files are rejected.
pub fn sanitize_file_name(raw: &str) -> Result<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if base.is_empty() || base == "." || base == ".." || base.starts_with('.') {
        return Err(Error::InvalidInput(format!("Invalid file name: {:?}", raw)));
    }
    Ok(base.to_string())
}

/// Contents that can be placed into the hierarchy as a new file
pub trait FileSource {
    /// Create `target` with these contents; fails with `AlreadyExists`
    /// instead of replacing a file already there
    fn place_at(&self, target: &Path) -> io::Result<()>;
    fn size_bytes(&self) -> u64;
    fn sha256(&self) -> String;
}

impl FileSource for [u8] {
    fn place_at(&self, target: &Path) -> io::Result<()> {
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        let staging = dir.join(format!(".upload-{}", Uuid::new_v4()));
        let placed = File::create(&staging)
            .and_then(|mut file| file.write_all(self).and_then(|_| file.sync_all()))
            .and_then(|_| std::fs::hard_link(&staging, target));
        let _ = std::fs::remove_file(&staging);
        placed
    }

    fn size_bytes(&self) -> u64 {
        self.len() as u64
    }

    fn sha256(&self) -> String {
        format!("{:x}", Sha256::digest(self))
    }
}

impl<const N: usize> FileSource for [u8; N] {
    fn place_at(&self, target: &Path) -> io::Result<()> {
        self.as_slice().place_at(target)
    }

    fn size_bytes(&self) -> u64 {
        N as u64
    }

    fn sha256(&self) -> String {
        self.as_slice().sha256()
    }
}

/// An upload already written to the store's staging directory.
///
/// Placing it hard-links the staged file into the hierarchy; the staged
/// copy is removed on drop.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    size_bytes: u64,
    sha256: String,
}

impl FileSource for StagedFile {
    fn place_at(&self, target: &Path) -> io::Result<()> {
        std::fs::hard_link(&self.path, target)
    }

    fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    fn sha256(&self) -> String {
        self.sha256.clone()
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to remove staged upload");
            }
        }
    }
}

/// Incremental writer producing a [`StagedFile`]
pub struct StagingWriter {
    file: File,
    hasher: Sha256,
    staged: StagedFile,
}

impl StagingWriter {
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.file.write_all(chunk)?;
        self.hasher.update(chunk);
        self.staged.size_bytes += chunk.len() as u64;
        Ok(())
    }

    pub fn finish(self) -> Result<StagedFile> {
        let StagingWriter {
            file,
            hasher,
            mut staged,
        } = self;
        file.sync_all()?;
        staged.sha256 = format!("{:x}", hasher.finalize());
        Ok(staged)
    }
}

impl DataStore {
    fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Start staging an upload next to the datasets, on the same filesystem
    pub fn staging_writer(&self) -> Result<StagingWriter> {
        let dir = self.staging_dir();
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(Uuid::new_v4().to_string());
        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        Ok(StagingWriter {
            file,
            hasher: Sha256::new(),
            staged: StagedFile {
                path,
                size_bytes: 0,
                sha256: String::new(),
            },
        })
    }

    /// Stage in-memory contents
    pub fn stage_bytes(&self, contents: &[u8]) -> Result<StagedFile> {
        let mut writer = self.staging_writer()?;
        writer.write_chunk(contents)?;
        writer.finish()
    }

    /// Remove uploads left staged by an interrupted run
    pub fn clear_staging(&self) -> Result<()> {
        match std::fs::remove_dir_all(self.staging_dir()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// A file sent along with a request to create a directory
#[derive(Clone, Copy)]
pub struct Upload<'a> {
    pub file_name: &'a str,
    pub contents: &'a dyn FileSource,
    pub kind: FileKind,
}

/// Sanitized name under which `file_name` may be stored as `kind`
fn storable_name(file_name: &str, kind: FileKind) -> Result<String> {
    let name = sanitize_file_name(file_name)?;
    if !kind.accepts(&name) {
        return Err(Error::InvalidInput(format!(
            "{} is not a {} file (expected {})",
            name,
            kind.label(),
            kind.extensions().join(", ")
        )));
    }
    if is_metadata_file(&name) {
        return Err(Error::InvalidInput(format!(
            "{} is reserved for metadata",
            name
        )));
    }
    Ok(name)
}

/// Refuse a batch of uploads that could not all be stored in one empty
/// directory: kinds outside `allowed`, bad or reserved names, or the same
/// name twice.
pub(crate) fn check_uploads(uploads: &[Upload<'_>], allowed: &[FileKind]) -> Result<()> {
    let mut seen = HashSet::new();
    for upload in uploads {
        if !allowed.contains(&upload.kind) {
            return Err(Error::InvalidInput(format!(
                "{} files are not accepted here",
                upload.kind.label()
            )));
        }
        let name = storable_name(upload.file_name, upload.kind)?;
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(Error::InvalidInput(format!(
                "File {} is uploaded more than once",
                name
            )));
        }
    }
    Ok(())
}

/// Store a checked batch in a directory created for it. The directory is
/// removed again if any file cannot be stored.
pub(crate) fn populate_new_directory(
    dir: &Path,
    uploads: &[Upload<'_>],
) -> Result<Vec<FileRecord>> {
    let stored: Result<Vec<FileRecord>> = uploads
        .iter()
        .map(|upload| store_file(dir, upload.file_name, upload.contents, upload.kind))
        .collect();
    if stored.is_err() {
        discard_directory(dir);
    }
    stored
}

/// Store `contents` as `file_name` inside `dir`.
///
/// The file is created by linking fully written contents into place, so a
/// reader never sees a partial file and an existing file with the same
/// name is never replaced.
pub(crate) fn store_file<S>(
    dir: &Path,
    file_name: &str,
    contents: &S,
    kind: FileKind,
) -> Result<FileRecord>
where
    S: FileSource + ?Sized,
{
    let name = storable_name(file_name, kind)?;
    let target = dir.join(&name);

    match contents.place_at(&target) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(Error::AlreadyExists(format!("File {} already exists", name)))
        }
        Err(e) => return Err(e.into()),
    }

    let record = FileRecord {
        name,
        size_bytes: contents.size_bytes(),
        sha256: contents.sha256(),
    };
    info!(
        file = %target.display(),
        size_bytes = record.size_bytes,
        "Stored {} file",
        kind.label()
    );
    Ok(record)
}

/// Records for the visible files of `dir` whose name passes `filter`, sorted
pub(crate) fn list_files<F>(dir: &Path, filter: F) -> Result<Vec<FileRecord>>
where
    F: Fn(&str) -> bool,
{
    let mut records = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || !filter(&name) {
            continue;
        }
        records.push(describe_file(&entry.path(), name)?);
    }
    records.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(records)
}

fn describe_file(path: &Path, name: String) -> Result<FileRecord> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::NotFound(format!("File vanished: {}", path.display())))
        }
        Err(e) => return Err(e.into()),
    };
    let mut hasher = Sha256::new();
    let size_bytes = io::copy(&mut file, &mut hasher)?;
    Ok(FileRecord {
        name,
        size_bytes,
        sha256: format!("{:x}", hasher.finalize()),
    })
}

/// Names of the metadata documents, which uploads may not overwrite
pub(crate) fn is_metadata_file(name: &str) -> bool {
    use crate::metadata::*;
    [
        GeneralMetadata::FILE_NAME,
        SampleInformation::FILE_NAME,
        CollectionMetadata::FILE_NAME,
        SamplePreparation::FILE_NAME,
        ReconstructionMetadata::FILE_NAME,
        AnalysisMetadata::FILE_NAME,
        PublicationRecord::FILE_NAME,
    ]
    .iter()
    .any(|reserved| reserved.eq_ignore_ascii_case(name))
}
