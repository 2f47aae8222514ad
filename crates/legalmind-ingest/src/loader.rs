//! Document loading.
//!
//! PDFs are read page by page with `lopdf`; every non-empty page becomes a
//! section carrying its 1-based page number. Text files are UTF-8, and form
//! feeds (`\x0c`) separate their pages, the convention `pdftotext` follows.

use std::path::{Path, PathBuf};

use legalmind_core::{document_id, RagError, Result};
use lopdf::Document;
use tracing::{debug, warn};

/// Plain-text file extensions.
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md"];

/// PDF file extension.
pub const PDF_EXTENSION: &str = "pdf";

const PAGE_BREAK: char = '\x0c';

/// One page (or the whole file when it has no page breaks).
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// 1-based page number; `None` for unpaged files.
    pub page: Option<u32>,
    pub text: String,
}

/// A loaded document ready for chunking.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub doc_id: String,
    pub title: String,
    pub source: String,
    /// Non-empty sections in page order.
    pub sections: Vec<Section>,
}

/// Load a PDF or text file, choosing the loader by extension.
pub fn load_document(path: &Path) -> Result<LoadedDocument> {
    if extension(path).as_deref() == Some(PDF_EXTENSION) {
        load_pdf_file(path)
    } else {
        load_text_file(path)
    }
}

/// Load a text file, deriving its id from the canonical path.
pub fn load_text_file(path: &Path) -> Result<LoadedDocument> {
    let (canonical, source) = canonicalize(path)?;

    let bytes = std::fs::read(&canonical).map_err(|e| load_failed(&source, e))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| load_failed(&source, "file is not valid UTF-8"))?;

    let sections = split_pages(&text);
    debug!("Loaded {} ({} sections)", source, sections.len());

    Ok(LoadedDocument {
        doc_id: document_id(&source),
        title: title_of(&canonical, &source),
        source,
        sections,
    })
}

/// Load a PDF, one section per page with text.
///
/// A page whose text cannot be extracted is skipped with a warning; a file
/// that is not a readable PDF fails to load.
pub fn load_pdf_file(path: &Path) -> Result<LoadedDocument> {
    let (canonical, source) = canonicalize(path)?;

    let pdf = Document::load(&canonical).map_err(|e| load_failed(&source, e))?;

    let mut sections = Vec::new();
    for page in pdf.get_pages().into_keys() {
        let text = match pdf.extract_text(&[page]) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping page {} of {}: {}", page, source, e);
                continue;
            }
        };
        let text = text.trim();
        if !text.is_empty() {
            sections.push(Section {
                page: Some(page),
                text: text.to_string(),
            });
        }
    }
    debug!("Loaded PDF {} ({} pages with text)", source, sections.len());

    Ok(LoadedDocument {
        doc_id: document_id(&source),
        title: title_of(&canonical, &source),
        source,
        sections,
    })
}

fn canonicalize(path: &Path) -> Result<(PathBuf, String)> {
    let canonical = path
        .canonicalize()
        .map_err(|e| load_failed(&path.display().to_string(), e))?;
    let source = canonical.display().to_string();
    Ok((canonical, source))
}

fn title_of(canonical: &Path, source: &str) -> String {
    canonical
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string())
}

fn load_failed(uri: &str, reason: impl ToString) -> RagError {
    RagError::LoadFailed {
        uri: uri.to_string(),
        reason: reason.to_string(),
    }
}

/// Split text into page sections, dropping blank pages.
pub fn split_pages(text: &str) -> Vec<Section> {
    if !text.contains(PAGE_BREAK) {
        if text.trim().is_empty() {
            return Vec::new();
        }
        return vec![Section {
            page: None,
            text: text.to_string(),
        }];
    }

    text.split(PAGE_BREAK)
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| Section {
            page: Some(i as u32 + 1),
            text: page.to_string(),
        })
        .collect()
}

/// Collect ingestible files under `path`, sorted.
///
/// A file path is returned as-is regardless of extension. Directories yield
/// PDF and text files, descending when `recursive` is set.
pub fn collect_files(path: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(load_failed(
            &path.display().to_string(),
            "no such file or directory",
        ));
    }

    let mut files = Vec::new();
    walk(path, recursive, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if recursive {
                walk(&path, recursive, out)?;
            }
        } else if is_supported(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn is_supported(path: &Path) -> bool {
    extension(path)
        .map(|e| e == PDF_EXTENSION || TEXT_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or(false)
}
