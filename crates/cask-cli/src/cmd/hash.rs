//! Hash command

use std::path::PathBuf;

use anyhow::{Context, Result};

use cask_core::io::hash::hash_file;
use cask_schema::HashAlgorithm;

/// Print `algo:digest  path` for each file, ready to paste into a manifest.
pub fn hash(files: &[PathBuf], algo: HashAlgorithm) -> Result<()> {
    for path in files {
        let digest =
            hash_file(path, algo).with_context(|| format!("Failed to hash {}", path.display()))?;
        println!("{algo} = \"{digest}\"  # {}", path.display());
    }
    Ok(())
}
