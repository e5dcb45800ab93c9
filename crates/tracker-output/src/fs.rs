use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::Result;

/// Create `path` for writing, creating its parent directories first.
pub(crate) fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}
