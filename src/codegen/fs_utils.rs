//! Filesystem utilities for generated sources

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::controller::GeneratedFile;

/// Write content to a file, creating parent directories if needed
pub fn write_file<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> io::Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, contents)
}

/// Write generated files under `output_dir`, returning the paths written.
///
/// Each file's relative path is joined onto `output_dir`. Existing files are
/// only replaced when `overwrite` is set; skipped files are not returned.
pub fn write_generated_files(
    output_dir: &Path,
    files: &[GeneratedFile],
    overwrite: bool,
) -> Result<Vec<PathBuf>, String> {
    let mut written = Vec::with_capacity(files.len());

    for file in files {
        let target = output_dir.join(&file.path);
        if target.exists() && !overwrite {
            tracing::info!(path = %target.display(), "Skipping existing file");
            continue;
        }

        write_file(&target, &file.content)
            .map_err(|e| format!("Failed to write {}: {}", target.display(), e))?;
        written.push(target);
    }

    Ok(written)
}
