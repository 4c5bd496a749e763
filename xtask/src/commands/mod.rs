pub mod completions;
pub mod man;

use std::fs;
use std::path::{Path, PathBuf};

/// Resolve `out_dir` against the workspace root and make sure it exists.
pub fn prepare_out_dir(out_dir: &Path) -> Result<PathBuf, String> {
    let out_dir = crate::workspace_root().join(out_dir);
    fs::create_dir_all(&out_dir).map_err(|e| format!("{}: {e}", out_dir.display()))?;
    Ok(out_dir)
}
