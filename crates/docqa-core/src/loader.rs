use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::Document;

/// Loads `.txt` files below a directory as [`Document`]s.
///
/// Files are visited in sorted path order so repeated loads produce the same
/// chunk order. `source_id` is the file path as found on disk.
#[derive(Debug, Clone, Default)]
pub struct DocumentLoader {
    clean: bool,
}

impl DocumentLoader {
    pub fn new() -> Self { Self::default() }

    /// Normalise whitespace of every loaded document with [`clean_text`].
    pub fn cleaned(mut self) -> Self {
        self.clean = true;
        self
    }

    pub fn load_directory(&self, data_dir: &Path) -> Result<Vec<Document>> {
        self.load_with_limit(data_dir, usize::MAX)
    }

    pub fn load_with_limit(&self, data_dir: &Path, limit: usize) -> Result<Vec<Document>> {
        let mut files = list_txt_files(data_dir);
        if files.is_empty() {
            tracing::warn!(dir = %data_dir.display(), "no .txt files found");
            return Ok(vec![]);
        }
        if files.len() > limit {
            files.truncate(limit);
            tracing::info!(limit, "limited document count");
        }
        let mut documents = Vec::with_capacity(files.len());
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::debug!("loading file {}/{}: {}", file_index + 1, files.len(), file_path.display());
            let content = read_file_content(file_path)?;
            let raw_text = if self.clean { clean_text(&content) } else { content };
            documents.push(Document { raw_text, source_id: file_path.to_string_lossy().to_string() });
        }
        tracing::info!(files = documents.len(), dir = %data_dir.display(), "loaded documents");
        Ok(documents)
    }
}

/// Flatten text extracted from PDFs and similar sources:
/// drops `\r`, joins non-blank trimmed lines with one space, collapses runs of
/// whitespace and removes spaces around hyphens.
pub fn clean_text(text: &str) -> String {
    let joined = text
        .replace('\r', "")
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let collapsed = joined.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.split('-').map(str::trim).collect::<Vec<_>>().join("-")
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
    }
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("txt"))
        .map(|e| e.path().to_path_buf())
        .collect();
    txt_files.sort();
    txt_files
}

#[cfg(test)]
mod tests {
    use super::clean_text;

    #[test]
    fn clean_text_flattens_lines_and_hyphens() {
        let raw = "  First line \r\n\n second   line\nwell - known\tterm -\nsplit";
        assert_eq!(clean_text(raw), "First line second line well-known term-split");
    }

    #[test]
    fn clean_text_of_blank_is_empty() {
        assert_eq!(clean_text(" \n\r\n "), "");
    }
}
