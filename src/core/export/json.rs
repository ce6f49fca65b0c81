use std::path::PathBuf;
use tracing::info;

use super::{ExportArtifact, ExportError, ExportPayload, ExportService};

/// Writes the card payload as pretty-printed JSON into a directory.
pub struct JsonCardExporter {
    output_dir: PathBuf,
}

impl JsonCardExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl ExportService for JsonCardExporter {
    fn render(&self, payload: &ExportPayload) -> Result<ExportArtifact, ExportError> {
        let body = serde_json::to_vec_pretty(payload)
            .map_err(|e| ExportError::Render(e.to_string()))?;

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}.json", payload.file_stem));
        std::fs::write(&path, &body)?;

        info!("Exported identity card to {}", path.display());
        Ok(ExportArtifact {
            path,
            size: body.len(),
        })
    }
}
