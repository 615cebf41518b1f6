//! Local copies of remote files.
//!
//! Downloads go to `<dest>.part` and are renamed into place once complete, so
//! an interrupted fetch never leaves a truncated file under the final name.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::archive::Source;
use crate::catalogue::error::{CatalogError, CatalogResult};

/// `dest` with `.part` appended to its file name.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

/// Ensure `cache_file` exists, downloading it from `url` when missing.
pub fn mirror(url: &str, cache_file: &Path) -> CatalogResult<PathBuf> {
    if cache_file.is_file() {
        debug!(path = %cache_file.display(), "using cached copy");
        return Ok(cache_file.to_path_buf());
    }
    fetch_to_file(url, cache_file)?;
    Ok(cache_file.to_path_buf())
}

/// Download `url` (or copy a local path) to `dest`, returning the byte count.
pub fn fetch_to_file(url: &str, dest: &Path) -> CatalogResult<u64> {
    let cache_err = |path: &Path, e: io::Error| CatalogError::Cache {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| cache_err(parent, e))?;
    }

    let mut reader = Source::parse(url).open().map_err(|e| CatalogError::Fetch {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let part = part_path(dest);
    let file = File::create(&part).map_err(|e| cache_err(&part, e))?;
    let mut writer = BufWriter::new(file);
    let copied = io::copy(&mut reader, &mut writer).and_then(|n| writer.flush().map(|_| n));
    let bytes = match copied {
        Ok(n) => n,
        Err(e) => {
            let _ = std::fs::remove_file(&part);
            return Err(CatalogError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            });
        }
    };
    drop(writer);

    std::fs::rename(&part, dest).map_err(|e| cache_err(dest, e))?;
    info!(url, path = %dest.display(), bytes, "downloaded");
    Ok(bytes)
}
