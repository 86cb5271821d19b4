use crate::{Error, InvertedIndex, Result};
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Leading bytes of every persisted index.
pub const MAGIC: &[u8; 4] = b"DSIX";
/// Bumped whenever the payload layout or scoring inputs change.
pub const FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = MAGIC.len() + 4;

/// Fixed-width integers, little endian, and the payload must end exactly
/// where the file ends.
fn codec() -> impl Options {
    bincode::DefaultOptions::new().with_fixint_encoding().reject_trailing_bytes()
}

/// Informational sidecar written next to the index. Not part of the
/// deterministic index bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_fragments: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn index(&self) -> PathBuf { self.root.join("index.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Encode as `MAGIC | version (u32 LE) | bincode payload`.
pub fn serialize(index: &InvertedIndex) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + 4096);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    codec().serialize_into(&mut bytes, index).map_err(|e| Error::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Decode and validate. Fails fast on a foreign or newer/older format
/// rather than handing back an index that would score incorrectly.
pub fn deserialize(bytes: &[u8]) -> Result<InvertedIndex> {
    if bytes.len() < HEADER_LEN || !bytes.starts_with(MAGIC) {
        return Err(Error::NotAnIndex);
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[MAGIC.len()..HEADER_LEN]);
    let found = u32::from_le_bytes(version);
    if found != FORMAT_VERSION {
        return Err(Error::IncompatibleIndexFormat { found, expected: FORMAT_VERSION });
    }
    let index: InvertedIndex =
        codec().deserialize(&bytes[HEADER_LEN..]).map_err(|e| Error::Corrupt(e.to_string()))?;
    index.validate()?;
    Ok(index)
}

/// Write the index through a temporary sibling and rename it into place so
/// a concurrent reader never sees a partial file.
pub fn save_index(path: &Path, index: &InvertedIndex) -> Result<()> {
    if let Some(dir) = path.parent() {
        create_dir_all(dir)?;
    }
    let bytes = serialize(index)?;
    let tmp = path.with_extension("bin.tmp");
    {
        let mut f = File::create(&tmp)?;
        f.write_all(&bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_index(path: &Path) -> Result<InvertedIndex> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    deserialize(&buf)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}
