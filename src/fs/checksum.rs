//! Checksum sidecar files for local copies
//!
//! A local file `dir/name` may carry a `dir/.name.crc` holding the lowercase
//! hex SHA-256 of its content. Downloads write one unless raw local writes
//! were requested; uploads check the source against it while checksum
//! verification is on.

use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

pub(crate) fn sidecar_path(target: &Path) -> Option<PathBuf> {
    let name = target.file_name()?;
    Some(target.with_file_name(format!(".{}.crc", name.to_string_lossy())))
}

/// Whether `path` is itself a sidecar and should not be copied as data
pub(crate) fn is_sidecar(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| name.starts_with('.') && name.ends_with(".crc"))
}

pub(crate) fn hex_digest(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

pub(crate) fn write_sidecar(target: &Path, data: &[u8]) -> io::Result<()> {
    match sidecar_path(target) {
        Some(sidecar) => std::fs::write(sidecar, hex_digest(data)),
        None => Ok(()),
    }
}

/// Fail with `InvalidData` when `src` has a sidecar that does not match `data`
pub(crate) fn verify_sidecar(src: &Path, data: &[u8]) -> io::Result<()> {
    let Some(sidecar) = sidecar_path(src) else {
        return Ok(());
    };
    let expected = match std::fs::read_to_string(&sidecar) {
        Ok(expected) => expected,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if expected.trim() != hex_digest(data) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Checksum error: {} does not match {}",
                src.display(),
                sidecar.display()
            ),
        ));
    }
    Ok(())
}
