//! Document loading from a data directory
//!
//! PDF parsing happens upstream: the loader consumes the extracted
//! per-page text representation of each document. A `.pages.json` file
//! holds the ordered pages of one source PDF; a plain `.txt` file is
//! treated as a single-page document.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::{Document, Page};
use crate::errors::{RagError, Result};

#[derive(Debug, Deserialize)]
struct PageRecord {
    page: u32,
    text: String,
}

/// Load every recognized document in `dir` (non-recursive), in file-name
/// order. An empty directory yields zero documents, not an error.
pub fn load_dir(dir: &Path) -> Result<Vec<Document>> {
    if !dir.is_dir() {
        return Err(RagError::Ingestion {
            path: dir.display().to_string(),
            reason: "not a directory".to_string(),
        });
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name.ends_with(".pages.json") {
            documents.push(load_pages_json(&path)?);
        } else if name.ends_with(".txt") {
            documents.push(load_txt(&path)?);
        }
    }

    Ok(documents)
}

fn load_pages_json(path: &Path) -> Result<Document> {
    let contents = read_file(path)?;
    let mut records: Vec<PageRecord> =
        serde_json::from_str(&contents).map_err(|e| RagError::Ingestion {
            path: path.display().to_string(),
            reason: format!("malformed page records: {}", e),
        })?;
    records.sort_by_key(|r| r.page);

    let pages = records
        .into_iter()
        .map(|r| Page::new(r.page, r.text))
        .collect();

    Ok(Document::new(path.display().to_string(), pages))
}

fn load_txt(path: &Path) -> Result<Document> {
    let contents = read_file(path)?;
    Ok(Document::new(
        path.display().to_string(),
        vec![Page::new(1, contents)],
    ))
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| RagError::Ingestion {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_pages_json() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("report.pages.json"),
            r#"[{"page": 2, "text": "second"}, {"page": 1, "text": "first"}]"#,
        )
        .unwrap();

        let docs = load_dir(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].pages.len(), 2);
        // pages come back in page order regardless of record order
        assert_eq!(docs[0].pages[0].number, 1);
        assert_eq!(docs[0].pages[0].text, "first");
    }

    #[test]
    fn test_load_txt_as_single_page() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "plain notes").unwrap();

        let docs = load_dir(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].pages.len(), 1);
        assert_eq!(docs[0].pages[0].number, 1);
        assert_eq!(docs[0].pages[0].text, "plain notes");
    }

    #[test]
    fn test_unrecognized_files_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("raw.pdf"), "binary").unwrap();

        let docs = load_dir(dir.path()).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_malformed_page_records_name_the_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.pages.json"), "not json").unwrap();

        let err = load_dir(dir.path()).unwrap_err();
        match err {
            RagError::Ingestion { path, .. } => assert!(path.contains("bad.pages.json")),
            other => panic!("expected Ingestion error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_directory_is_ingestion_error() {
        let err = load_dir(Path::new("/nonexistent/docchat-data")).unwrap_err();
        assert!(matches!(err, RagError::Ingestion { .. }));
    }

    #[test]
    fn test_documents_in_file_name_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "second doc").unwrap();
        fs::write(dir.path().join("a.txt"), "first doc").unwrap();

        let docs = load_dir(dir.path()).unwrap();
        assert!(docs[0].source.ends_with("a.txt"));
        assert!(docs[1].source.ends_with("b.txt"));
    }
}
