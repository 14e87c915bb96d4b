use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

/// A document ready for extraction: its page texts in ascending page order,
/// as produced by the upstream rendering + OCR step. This tool only consumes
/// the text.
pub struct Document {
    pub name: String,
    pub pages: Vec<String>,
}

/// Load the page texts for one document.
///
/// Accepts either a single text file with form-feed page breaks (the usual
/// OCR output) or a directory of per-page `.txt` files ordered by a
/// numeric-aware filename sort. An unreadable page file degrades to an empty
/// page; an unreadable document path fails the request.
pub fn load(path: &Path) -> Result<Document> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if path.is_dir() {
        let mut page_files: Vec<PathBuf> = fs::read_dir(path)
            .with_context(|| format!("failed to read document directory {}", path.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        page_files.sort_by_key(|p| page_sort_key(p));

        let pages = page_files
            .iter()
            .map(|p| match fs::read_to_string(p) {
                Ok(text) => text,
                Err(e) => {
                    warn!("unreadable page file {}: {}", p.display(), e);
                    String::new()
                }
            })
            .collect();
        return Ok(Document { name, pages });
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read document {}", path.display()))?;
    Ok(Document {
        name,
        pages: split_pages(&raw),
    })
}

/// Split raw OCR output into pages on form-feed breaks.
pub fn split_pages(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split('\u{c}').map(|page| page.to_string()).collect()
}

/// Sort key that keeps `page_2` before `page_10`.
fn page_sort_key(path: &Path) -> (String, u64) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let digits: String = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    let prefix = stem[..stem.len() - digits.len()].to_string();
    (prefix, digits.parse().unwrap_or(0))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn form_feed_splits_pages() {
        let pages = split_pages("page one\u{c}page two\u{c}page three");
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1], "page two");
    }

    #[test]
    fn empty_input_has_no_pages() {
        assert!(split_pages("").is_empty());
    }

    #[test]
    fn directory_pages_sort_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for (file, text) in [
            ("page_10.txt", "ten"),
            ("page_2.txt", "two"),
            ("page_1.txt", "one"),
            ("notes.md", "ignored"),
        ] {
            let mut f = fs::File::create(dir.path().join(file)).unwrap();
            f.write_all(text.as_bytes()).unwrap();
        }

        let doc = load(dir.path()).unwrap();
        assert_eq!(doc.pages, vec!["one", "two", "ten"]);
    }

    #[test]
    fn missing_document_is_an_error() {
        assert!(load(Path::new("does/not/exist.txt")).is_err());
    }
}
