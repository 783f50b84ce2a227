//! Persisting a finished manuscript.

use crate::error::WriteError;
use crate::scrapers::Manuscript;
use crate::utils::sanitize_filename;
use std::path::{Path, PathBuf};

/// Serializes a manuscript to durable storage.
pub trait NovelWriter: Send + Sync {
    /// Writes `manuscript` under `novel_title` and returns where it went.
    fn write(&self, novel_title: &str, manuscript: &Manuscript) -> Result<PathBuf, WriteError>;
}

/// Renders chapters as plain text: title, blank line, body, blank line.
pub fn render(manuscript: &Manuscript) -> String {
    let mut out = String::new();
    for chapter in manuscript.chapters() {
        out.push_str(&chapter.title);
        out.push_str("\n\n");
        out.push_str(&chapter.body);
        out.push_str("\n\n");
    }
    out
}

/// Writes one UTF-8 `<title>.txt` file per novel into a directory.
///
/// Existing files are overwritten. Content goes to a `.part` file first
/// and is renamed into place, so a failed write leaves no truncated
/// output behind.
#[derive(Debug, Clone)]
pub struct TextFileWriter {
    output_dir: PathBuf,
}

impl TextFileWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Returns the path a novel with this title is written to.
    pub fn path_for(&self, novel_title: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.txt", sanitize_filename(novel_title)))
    }
}

impl NovelWriter for TextFileWriter {
    fn write(&self, novel_title: &str, manuscript: &Manuscript) -> Result<PathBuf, WriteError> {
        if manuscript.is_empty() {
            return Err(WriteError::EmptyManuscript(novel_title.to_string()));
        }

        let path = self.path_for(novel_title);
        let part = path.with_extension("txt.part");

        std::fs::create_dir_all(&self.output_dir).map_err(|e| io_error(&self.output_dir, e))?;

        let result = std::fs::write(&part, render(manuscript))
            .map_err(|e| io_error(&part, e))
            .and_then(|()| std::fs::rename(&part, &path).map_err(|e| io_error(&path, e)));

        if result.is_err() {
            let _ = std::fs::remove_file(&part);
        }

        result.map(|()| path)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> WriteError {
    WriteError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::ChapterContent;

    fn manuscript() -> Manuscript {
        vec![
            ChapterContent::new("Ch1", "Hello"),
            ChapterContent::new("Ch2", "World"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TextFileWriter::new(dir.path());

        let path = writer.write("斗破苍穹", &manuscript()).unwrap();
        assert_eq!(path, dir.path().join("斗破苍穹.txt"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Ch1\n\nHello\n\nCh2\n\nWorld\n\n");
        assert!(!path.with_extension("txt.part").exists());
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TextFileWriter::new(dir.path());
        std::fs::write(writer.path_for("novel"), "stale").unwrap();

        let path = writer.write("novel", &manuscript()).unwrap();
        assert!(std::fs::read_to_string(path).unwrap().starts_with("Ch1"));
    }

    #[test]
    fn test_write_sanitizes_title() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TextFileWriter::new(dir.path());

        let path = writer.write("a/b: c?", &manuscript()).unwrap();
        assert_eq!(path.file_name().unwrap(), "a_b_ c_.txt");
    }

    #[test]
    fn test_write_empty_manuscript() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TextFileWriter::new(dir.path());

        assert!(matches!(
            writer.write("novel", &Manuscript::new()),
            Err(WriteError::EmptyManuscript(_))
        ));
        assert!(!writer.path_for("novel").exists());
    }

    #[test]
    fn test_write_to_unwritable_location() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // A regular file cannot act as the output directory.
        let writer = TextFileWriter::new(file.path());

        assert!(matches!(
            writer.write("novel", &manuscript()),
            Err(WriteError::Io { .. })
        ));
    }
}
