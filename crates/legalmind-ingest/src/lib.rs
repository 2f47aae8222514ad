//! legalmind-ingest - Document loading and chunking
//!
//! This crate turns files on disk into chunks ready for embedding:
//!
//! - [`load_document`] reads a PDF page by page, or a UTF-8 text file split
//!   into pages on form feeds.
//! - [`TokenWindowChunker`] cuts each page into overlapping windows of BPE
//!   tokens.
//! - [`prepare_chunks`] assigns content-addressed ids and metadata.
//!
//! # Example
//!
//! ```rust
//! use legalmind_ingest::TokenWindowChunker;
//!
//! let chunker = TokenWindowChunker::new(350, 40).unwrap();
//! let windows = chunker.windows("Contract governed by English law.\n");
//! assert_eq!(windows, vec!["Contract governed by English law."]);
//! ```

mod chunker;
mod loader;
mod pipeline;

pub use chunker::{TokenWindowChunker, DEFAULT_ENCODING};
pub use loader::{
    collect_files, load_document, load_pdf_file, load_text_file, split_pages, LoadedDocument,
    Section, PDF_EXTENSION, TEXT_EXTENSIONS,
};
pub use pipeline::{embed_in_batches, prepare_chunks, PreparedChunk};
