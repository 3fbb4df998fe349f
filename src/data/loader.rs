// ============================================================
// Layer 4: Corpus Loader
// ============================================================
// Loads the author/article directory tree produced by the
// crawler:
//
//   <root>/
//     ├── Jane Doe/
//     │     ├── 0001.txt
//     │     └── 0002.txt
//     └── John Roe/
//           └── 0001.txt
//
// Every sub-directory is one author, named by its display name.
// Every `.txt` file inside it is one article. Other files and
// loose files at the root are ignored.
//
// Each article is truncated to a fixed byte prefix. Articles that
// end up empty are skipped, and authors left without articles are
// dropped from the corpus.
//
// Entries are visited in name order so that the in-memory corpus
// is identical on every platform.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::corpus::{Author, Corpus, CorpusError};
use crate::domain::traits::CorpusSource;

/// File extension that marks an article inside an author directory.
const ARTICLE_EXTENSION: &str = "txt";

/// Reads a corpus from a directory tree.
pub struct CorpusLoader {
    /// Path to the corpus root directory
    root:            PathBuf,
    /// Maximum number of bytes kept from each article
    max_article_len: usize,
}

impl CorpusLoader {
    pub fn new(root: impl Into<PathBuf>, max_article_len: usize) -> Self {
        Self {
            root: root.into(),
            max_article_len,
        }
    }
}

impl CorpusSource for CorpusLoader {
    fn load(&self) -> Result<Corpus, CorpusError> {
        let author_dirs = sorted_entries(&self.root).map_err(|source| {
            CorpusError::UnreadableRoot {
                path: self.root.clone(),
                source,
            }
        })?;

        let mut authors = Vec::new();
        let mut skipped = 0usize;

        for dir in author_dirs.into_iter().filter(|p| p.is_dir()) {
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let articles = self.load_articles(&dir)?;
            if articles.is_empty() {
                tracing::debug!("Dropping '{}': no non-empty articles", name);
                skipped += 1;
                continue;
            }

            tracing::debug!("Loaded {} articles for '{}'", articles.len(), name);
            authors.push(Author::new(name, articles));
        }

        let corpus = Corpus::new(authors);
        tracing::info!(
            "Loaded corpus from '{}': {} ({} authors dropped)",
            self.root.display(),
            corpus,
            skipped
        );
        Ok(corpus)
    }
}

impl CorpusLoader {
    /// Read and truncate every article in one author directory.
    fn load_articles(&self, dir: &Path) -> Result<Vec<Vec<u8>>, CorpusError> {
        let entries = sorted_entries(dir).map_err(|source| CorpusError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut articles = Vec::new();
        for path in entries {
            if path.extension().and_then(|e| e.to_str()) != Some(ARTICLE_EXTENSION) {
                continue;
            }
            let body = fs::read(&path).map_err(|source| CorpusError::Io {
                path: path.clone(),
                source,
            })?;
            if let Some(body) = truncate_article(body, self.max_article_len) {
                articles.push(body);
            }
        }
        Ok(articles)
    }
}

/// Keep at most `limit` leading bytes of an article.
///
/// Returns `None` when nothing is left, so the caller can skip it.
pub fn truncate_article(mut body: Vec<u8>, limit: usize) -> Option<Vec<u8>> {
    body.truncate(limit);
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

/// List a directory's entries sorted by file name.
fn sorted_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();
    Ok(paths)
}
