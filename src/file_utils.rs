use std::fs;
use std::io;
use std::panic;
use std::path::{Path, PathBuf};

use log::debug;

use crate::errors::FileError;

// @module: Input document reading

/// Extensions accepted as input, matched case-insensitively
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".txt", ".pdf"];

// @struct: Text read from an input file, with the file stem as its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Full decoded text
    pub text: String,
    /// File name without directory or extension
    pub name: String,
}

impl Document {
    /// Number of whitespace separated words in the text
    pub fn word_count(&self) -> usize {
        FileManager::word_count(&self.text)
    }
}

/// Reads an input path into a document
pub trait DocumentReader: Send + Sync {
    /// Read `path`, or report why it cannot be used
    fn read(&self, path: &Path) -> Result<Document, FileError>;
}

// @struct: File operations utility
#[derive(Debug, Default, Clone, Copy)]
pub struct FileManager;

impl FileManager {
    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @returns: Lowercased extension with its dot, or "" when there is none
    pub fn extension_of(path: &Path) -> String {
        path.extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default()
    }

    // @checks: Path exists, is a file and has a supported extension
    pub fn validate_path<P: AsRef<Path>>(path: P) -> Result<PathBuf, FileError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(FileError::NotFound(path.to_path_buf()));
        }

        if !path.is_file() {
            return Err(FileError::NotAFile(path.to_path_buf()));
        }

        let extension = Self::extension_of(path);
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(FileError::UnsupportedExtension {
                extension: path
                    .extension()
                    .map(|ext| format!(".{}", ext.to_string_lossy()))
                    .unwrap_or_default(),
                supported: SUPPORTED_EXTENSIONS.join(", "),
            });
        }

        Ok(path.to_path_buf())
    }

    /// Read a text file as UTF-8, falling back to Latin-1
    pub fn read_txt<P: AsRef<Path>>(path: P) -> Result<String, FileError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let content = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(invalid) => {
                debug!("{:?} is not valid UTF-8, decoding as Latin-1", path);
                // Latin-1 maps every byte to the code point of the same value
                invalid.into_bytes().into_iter().map(char::from).collect()
            }
        };

        if content.trim().is_empty() {
            return Err(FileError::Empty(path.to_path_buf()));
        }

        Ok(content)
    }

    /// Extract the text of every page of a PDF file
    pub fn read_pdf<P: AsRef<Path>>(path: P) -> Result<String, FileError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        // The decoder panics on some malformed inputs
        let extracted = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
            .map_err(|_| FileError::Pdf {
                path: path.to_path_buf(),
                message: "decoder aborted".to_string(),
            })?
            .map_err(|e| FileError::Pdf {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if extracted.trim().is_empty() {
            return Err(FileError::Empty(path.to_path_buf()));
        }

        Ok(extracted)
    }

    /// Validate `path` and read it according to its extension
    pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Document, FileError> {
        let path = Self::validate_path(path)?;

        let text = match Self::extension_of(&path).as_str() {
            ".pdf" => Self::read_pdf(&path)?,
            _ => Self::read_txt(&path)?,
        };

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();

        debug!("Read {} characters from {:?}", text.chars().count(), path);
        Ok(Document { text, name })
    }

    // @returns: Number of whitespace separated words
    pub fn word_count(text: &str) -> usize {
        text.split_whitespace().count()
    }
}

impl DocumentReader for FileManager {
    fn read(&self, path: &Path) -> Result<Document, FileError> {
        Self::read_document(path)
    }
}
