// blendshape-parsers/src/traits.rs
//! Core traits defining the parser interface.
//!
//! This module establishes a unified parsing interface that enables:
//! - Consistent error handling across all decoders
//! - Streaming and memory-mapped file support
//! - Progress reporting

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use thiserror::Error;

use crate::archive::FeatureStream;

/// Errors that can occur during parsing operations
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData { offset: u64, message: String },

    #[error("Invalid boolean value {value} at offset {offset}")]
    InvalidBool { offset: u64, value: i32 },

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("No version registered for feature stream {0}")]
    UnresolvedVersion(FeatureStream),

    #[error("No morph LOD layout matches the version context: {0}")]
    UnreachableLayout(String),

    #[error("Invalid version configuration: {0}")]
    Config(String),

    #[error("Nested error in {context}: {source}")]
    Nested {
        context: String,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Wrap this error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ParseError::Nested {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether the underlying cause is the stream ending early
    pub fn is_unexpected_eof(&self) -> bool {
        match self {
            ParseError::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            ParseError::Nested { source, .. } => source.is_unexpected_eof(),
            _ => false,
        }
    }
}

/// Result type alias for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Progress callback for parse operations
pub type ProgressCallback = Box<dyn Fn(ParseProgress) + Send + Sync>;

/// Progress information during parsing
#[derive(Debug, Clone)]
pub struct ParseProgress {
    /// Current phase of parsing
    pub phase: ParsePhase,
    /// Bytes processed so far
    pub bytes_processed: u64,
    /// Total bytes to process (if known)
    pub total_bytes: Option<u64>,
    /// Number of items processed
    pub items_processed: u64,
    /// Total items to process (if known)
    pub total_items: Option<u64>,
}

impl ParseProgress {
    /// Calculate percentage complete (0.0 - 1.0)
    pub fn percentage(&self) -> Option<f32> {
        self.total_bytes.map(|total| {
            if total == 0 {
                1.0
            } else {
                self.bytes_processed as f32 / total as f32
            }
        })
    }
}

/// Phases of the parsing process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePhase {
    /// Running the base object hook and reading strip flags
    ReadingHeader,
    /// Parsing complete
    Complete,
}

/// Configuration options for parsing
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Reject booleans other than 0 or 1
    pub strict_validation: bool,
    /// Largest length prefix accepted for an array
    pub max_array_length: usize,
    /// Largest length prefix accepted for a string (in characters)
    pub max_string_length: usize,
    /// Whether to use memory mapping for large files
    pub use_memory_mapping: bool,
    /// Minimum file size to enable memory mapping
    pub memory_mapping_threshold: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict_validation: true,
            max_array_length: 64 * 1024 * 1024,
            max_string_length: 64 * 1024,
            use_memory_mapping: true,
            memory_mapping_threshold: 10 * 1024 * 1024, // 10 MB
        }
    }
}

/// Core trait for all decoders
pub trait Parser: Send + Sync {
    /// The parsed output type
    type Output: Send + Sync;

    /// Returns a human-readable name for this parser
    fn name(&self) -> &str;

    /// Parse from a reader with default options
    fn parse<R: Read + Seek>(&self, reader: R) -> ParseResult<Self::Output> {
        self.parse_with_options(reader, &ParseOptions::default(), None)
    }

    /// Parse from a reader with custom options and optional progress callback
    fn parse_with_options<R: Read + Seek>(
        &self,
        reader: R,
        options: &ParseOptions,
        progress: Option<ProgressCallback>,
    ) -> ParseResult<Self::Output>;

    /// Parse from a file path
    fn parse_file(&self, path: &Path) -> ParseResult<Self::Output> {
        self.parse_file_with_options(path, &ParseOptions::default(), None)
    }

    /// Parse from a file path with options
    fn parse_file_with_options(
        &self,
        path: &Path,
        options: &ParseOptions,
        progress: Option<ProgressCallback>,
    ) -> ParseResult<Self::Output> {
        let file = std::fs::File::open(path)?;

        // Use memory mapping for large files if enabled
        if options.use_memory_mapping {
            let metadata = file.metadata()?;
            if metadata.len() >= options.memory_mapping_threshold {
                return self.parse_memory_mapped(path, options, progress);
            }
        }

        let reader = std::io::BufReader::new(file);
        self.parse_with_options(reader, options, progress)
    }

    /// Parse using memory-mapped I/O (for large files)
    fn parse_memory_mapped(
        &self,
        path: &Path,
        options: &ParseOptions,
        progress: Option<ProgressCallback>,
    ) -> ParseResult<Self::Output> {
        let file = std::fs::File::open(path)?;
        // SAFETY: the mapping is read-only and dropped before returning; the
        // file must not be truncated by another process while it is mapped.
        #[allow(unsafe_code)]
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        self.parse_with_options(Cursor::new(&mmap[..]), options, progress)
    }
}
