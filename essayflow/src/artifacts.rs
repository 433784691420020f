//! Markdown rendering and persistence of stage outputs.
//!
//! One workflow run writes three files sharing a timestamp:
//! `essay-{ts}.md`, `feedback-{ts}.md` and `essay-updated-{ts}.md`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::{StageKind, StageResult};
use crate::errors::EssayflowError;

/// Returns the file name for a stage's output.
#[must_use]
pub fn artifact_filename(stage: StageKind, timestamp: &str) -> String {
    match stage {
        StageKind::Generate => format!("essay-{timestamp}.md"),
        StageKind::Review => format!("feedback-{timestamp}.md"),
        StageKind::Revise => format!("essay-updated-{timestamp}.md"),
    }
}

/// Renders the first draft with its header.
#[must_use]
pub fn render_essay(essay: &StageResult, topic: &str, generated_at: &str) -> String {
    format!(
        "# Essay\n\n**Model:** {}\n**Generated:** {generated_at}\n**Prompt:** {topic}\n\n---\n\n{}",
        essay.model, essay.text
    )
}

/// Renders the review with its header.
#[must_use]
pub fn render_feedback(feedback: &StageResult, essay_model: &str, generated_at: &str) -> String {
    format!(
        "# Essay Feedback\n\n**Review Model:** {}\n**Generated:** {generated_at}\n\
         **Original Essay Model:** {essay_model}\n\n---\n\n{}",
        feedback.model, feedback.text
    )
}

/// Renders the revised essay with its header.
#[must_use]
pub fn render_revision(revision: &StageResult, topic: &str, generated_at: &str) -> String {
    format!(
        "# Updated Essay\n\n**Model:** {}\n**Generated:** {generated_at}\n\
         **Original Prompt:** {topic}\n\n---\n\n{}",
        revision.model, revision.text
    )
}

/// A stage output that has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedArtifact {
    /// The raw stage text, without header.
    pub content: String,
    /// The model that produced it.
    pub model: String,
    /// File name inside the output directory.
    pub filename: String,
    /// Full path of the written file.
    pub path: PathBuf,
}

/// Writes markdown files into an output directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    /// Creates a writer for `output_dir`. The directory is created lazily.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// The target directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes `content` to `filename`, creating the directory if needed.
    pub async fn save(&self, filename: &str, content: &str) -> Result<PathBuf, EssayflowError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| EssayflowError::Artifact {
                path: self.output_dir.clone(),
                source,
            })?;

        let path = self.output_dir.join(filename);
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| EssayflowError::Artifact {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), bytes = content.len(), "Saved markdown file");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_artifact_filenames() {
        let ts = "2025-01-02T03-04-05";
        assert_eq!(artifact_filename(StageKind::Generate, ts), "essay-2025-01-02T03-04-05.md");
        assert_eq!(artifact_filename(StageKind::Review, ts), "feedback-2025-01-02T03-04-05.md");
        assert_eq!(
            artifact_filename(StageKind::Revise, ts),
            "essay-updated-2025-01-02T03-04-05.md"
        );
    }

    #[test]
    fn test_render_essay() {
        let essay = StageResult::new("Body text.", "writer");
        assert_eq!(
            render_essay(&essay, "Tides", "2025-01-02T03:04:05.000Z"),
            "# Essay\n\n**Model:** writer\n**Generated:** 2025-01-02T03:04:05.000Z\n\
             **Prompt:** Tides\n\n---\n\nBody text."
        );
    }

    #[test]
    fn test_render_feedback() {
        let feedback = StageResult::new("Looks fine.", "critic");
        assert_eq!(
            render_feedback(&feedback, "writer", "T"),
            "# Essay Feedback\n\n**Review Model:** critic\n**Generated:** T\n\
             **Original Essay Model:** writer\n\n---\n\nLooks fine."
        );
    }

    #[test]
    fn test_render_revision() {
        let revision = StageResult::new("Better text.", "writer");
        let rendered = render_revision(&revision, "Tides", "T");
        assert!(rendered.starts_with("# Updated Essay\n\n**Model:** writer\n"));
        assert!(rendered.contains("**Original Prompt:** Tides\n"));
        assert!(rendered.ends_with("---\n\nBetter text."));
    }

    #[tokio::test]
    async fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("nested").join("output"));

        let path = writer.save("essay-x.md", "# Essay").await.unwrap();

        assert_eq!(path, dir.path().join("nested/output/essay-x.md"));
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "# Essay");
    }

    #[tokio::test]
    async fn test_save_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        tokio::fs::write(&blocker, "file").await.unwrap();

        let err = ArtifactWriter::new(&blocker)
            .save("essay.md", "x")
            .await
            .unwrap_err();

        assert!(matches!(err, EssayflowError::Artifact { ref path, .. } if path == &blocker));
    }
}
