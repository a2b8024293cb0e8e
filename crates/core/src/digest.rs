use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha1::{Digest, Sha1};

use crate::error::CheckError;

/// Read size per chunk; only affects I/O efficiency.
pub const CHUNK_SIZE: usize = 1024 * 1024;

pub const SHA1_HEX_LEN: usize = 40;

/// Where file bytes come from while hashing.
pub trait ContentSource {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>>;
}

/// Reads straight from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl ContentSource for FsSource {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(File::open(path)?))
    }
}

/// SHA-1 over the concatenated contents of `files`, in iteration order, as lowercase hex.
pub fn sha1_files<'a, I>(files: I) -> Result<String, CheckError>
where
    I: IntoIterator<Item = &'a Path>,
{
    sha1_files_from(&FsSource, files)
}

pub fn sha1_files_from<'a, I>(source: &dyn ContentSource, files: I) -> Result<String, CheckError>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    for path in files {
        let mut f = source
            .open(path)
            .map_err(|e| CheckError::io(format!("open {}", path.display()), e))?;
        loop {
            let n = f
                .read(&mut buf)
                .map_err(|e| CheckError::io(format!("read {}", path.display()), e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
    }

    Ok(hex::encode(hasher.finalize()))
}

pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}
