//! Discovery of the documents to validate.

use crate::error::{DocumentParseError, SetupError};
use crate::loader::{GraphKind, load_graph};
use oxrdf::Graph;
use oxrdfio::RdfFormat;
use std::fs;
use std::path::{Path, PathBuf};

/// One corpus file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// File name without its extension. Names every artifact of the document.
    pub identity: String,
    pub path: PathBuf,
    pub format: RdfFormat,
}

impl Document {
    /// Reads the document into a fresh graph.
    pub fn parse(&self) -> Result<Graph, DocumentParseError> {
        load_graph(&self.path, self.format, GraphKind::Data)
    }
}

/// Lists the regular files of `dir` whose extension is `extension`, sorted by file name.
///
/// The directory is not searched recursively.
pub fn discover(dir: &Path, extension: &str) -> Result<Vec<Document>, SetupError> {
    if !dir.is_dir() {
        return Err(SetupError::MissingCorpus(dir.to_owned()));
    }
    let format = RdfFormat::from_extension(extension)
        .ok_or_else(|| SetupError::UnsupportedExtension(extension.to_owned()))?;
    let scan_error = |source| SetupError::CorpusScan {
        path: dir.to_owned(),
        source,
    };

    let mut documents = Vec::new();
    for entry in fs::read_dir(dir).map_err(scan_error)? {
        let path = entry.map_err(scan_error)?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let Some(identity) = path.file_stem().and_then(|s| s.to_str()) else {
            tracing::warn!(path = %path.display(), "skipping document with a non UTF-8 name");
            continue;
        };
        documents.push(Document {
            identity: identity.to_owned(),
            path,
            format,
        });
    }
    documents.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(documents)
}
