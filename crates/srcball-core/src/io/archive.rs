//! Reading tar archives, compressed or not.
//!
//! Compression is sniffed from the leading magic bytes rather than the file
//! name, so an archive staged under an arbitrary name still opens.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];

/// Compression wrapped around a tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Zstd,
}

impl Compression {
    pub fn from_magic(header: &[u8]) -> Self {
        if header.starts_with(GZIP_MAGIC) {
            Self::Gzip
        } else if header.starts_with(BZIP2_MAGIC) {
            Self::Bzip2
        } else if header.starts_with(ZSTD_MAGIC) {
            Self::Zstd
        } else {
            Self::None
        }
    }
}

/// A tar reader over any supported compression.
pub type TarReader = tar::Archive<Box<dyn Read>>;

/// Open `path` as a tar archive, detecting its compression.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn open(path: &Path) -> io::Result<TarReader> {
    let mut file = File::open(path)?;
    let mut header = Vec::with_capacity(ZSTD_MAGIC.len());
    (&mut file)
        .take(ZSTD_MAGIC.len() as u64)
        .read_to_end(&mut header)?;
    file.seek(SeekFrom::Start(0))?;

    let reader = BufReader::new(file);
    let stream: Box<dyn Read> = match Compression::from_magic(&header) {
        Compression::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
        Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
        Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        Compression::None => Box::new(reader),
    };
    Ok(tar::Archive::new(stream))
}

/// Canonical form of a member name: no leading `./`, no trailing `/`.
pub fn normalize_member(name: &str) -> &str {
    name.strip_prefix("./")
        .unwrap_or(name)
        .trim_end_matches('/')
}

/// Names of every member, in archive order.
///
/// # Errors
///
/// Returns an error if the archive cannot be read.
pub fn member_names(path: &Path) -> io::Result<Vec<String>> {
    let mut archive = open(path)?;
    let mut names = Vec::new();
    for entry in archive.entries()? {
        let entry = entry?;
        names.push(normalize_member(&entry.path()?.to_string_lossy()).to_string());
    }
    Ok(names)
}

/// Unpack the non-directory member `member` to the file `dest`.
///
/// Returns `false` when no such member exists.
///
/// # Errors
///
/// Returns an error if the archive cannot be read or `dest` written.
pub fn unpack_member(path: &Path, member: &str, dest: &Path) -> io::Result<bool> {
    let wanted = normalize_member(member);
    let mut archive = open(path)?;

    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type().is_dir() {
            continue;
        }
        let found = normalize_member(&entry.path()?.to_string_lossy()) == wanted;
        if found {
            tracing::debug!(archive = %path.display(), %member, "unpacking member");
            entry.unpack(dest)?;
            return Ok(true);
        }
    }

    Ok(false)
}
