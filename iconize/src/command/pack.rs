use anyhow::{Context, Result};
use iconpack::{Compression, IconPackager, SourceImage};
use std::path::{Path, PathBuf};

/// Packs the icons of a local image into a zip file.
///
/// Without an `output` the archive is written to `<basename>.icon.zip` in the
/// current directory. Returns the path written to.
pub fn pack(image: &Path, output: Option<&Path>, compression: Compression) -> Result<PathBuf> {
    let source = SourceImage::open(image)
        .with_context(|| format!("failed to read {}", image.display()))?;
    let (width, height) = source.dimensions();
    tracing::info!("packing {} ({}x{})", image.display(), width, height);
    let archive = IconPackager::default()
        .compression(compression)
        .pack(&source)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(source.archive_name()));
    std::fs::write(&output, archive)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(output)
}
