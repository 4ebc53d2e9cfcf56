pub mod analyze_pipeline;
pub mod anonymize_pipeline;

use crate::utils::error::{EtlError, Result};
use std::path::{Component, Path, PathBuf};

pub use analyze_pipeline::AnalyzePipeline;
pub use anonymize_pipeline::AnonymizePipeline;

fn normalize(path: &Path) -> PathBuf {
    if let Ok(real) = path.canonicalize() {
        return real;
    }
    // 目標檔尚未存在時，改用上層目錄的實際路徑
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        if let Ok(real_parent) = parent.canonicalize() {
            return real_parent.join(name);
        }
    }
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Refuses an output path that resolves to one of the inputs.
pub(crate) fn ensure_not_source(output: &str, inputs: &[&str]) -> Result<()> {
    let target = normalize(Path::new(output));
    if inputs.iter().any(|input| normalize(Path::new(input)) == target) {
        return Err(EtlError::OverwriteSourceError {
            path: output.to_string(),
        });
    }
    Ok(())
}
