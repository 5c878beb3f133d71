use crate::error::Result;
use datapath_protocol::{DocumentId, PATH_SEPARATOR};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::path::Path;

/// Raw text of one structured document, tagged with its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub id: DocumentId,
    pub text: String,
}

impl SourceDocument {
    pub fn new(id: impl Into<DocumentId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Read a document from disk, using its path as the identifier.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(path, text))
    }
}

/// Definition site and current value of one dotted path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    pub path: String,
    pub document_id: DocumentId,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    /// `false` when the end line was approximated after the bracket scan hit its cap.
    pub end_exact: bool,
    pub value: Value,
}

/// A path defined by more than one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathCollision {
    pub path: String,
    pub kept: DocumentId,
    pub dropped: DocumentId,
}

/// Immutable path table produced by one full rebuild.
///
/// Paths iterate in lexicographic order, so every derived listing is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathIndex {
    entries: BTreeMap<String, IndexEntry>,
    collisions: Vec<PathCollision>,
    documents: Vec<DocumentId>,
}

impl PathIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        entries: BTreeMap<String, IndexEntry>,
        collisions: Vec<PathCollision>,
        documents: Vec<DocumentId>,
    ) -> Self {
        Self {
            entries,
            collisions,
            documents,
        }
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    #[must_use]
    pub fn collisions(&self) -> &[PathCollision] {
        &self.collisions
    }

    /// Documents that contributed to this index, in processing order.
    #[must_use]
    pub fn documents(&self) -> &[DocumentId] {
        &self.documents
    }

    /// Distinct first segments of all indexed paths.
    #[must_use]
    pub fn top_level_keys(&self) -> BTreeSet<&str> {
        self.entries
            .keys()
            .map(|path| first_segment(path))
            .collect()
    }

    /// Distinct segments directly below `parent`.
    #[must_use]
    pub fn children_of(&self, parent: &str) -> BTreeSet<&str> {
        let prefix = format!("{parent}{PATH_SEPARATOR}");
        self.entries
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .take_while(|(path, _)| path.starts_with(&prefix))
            .map(|(path, _)| first_segment(&path[prefix.len()..]))
            .collect()
    }
}

fn first_segment(path: &str) -> &str {
    path.split(PATH_SEPARATOR).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(path: &str) -> IndexEntry {
        IndexEntry {
            path: path.to_string(),
            document_id: DocumentId::new("doc.json"),
            start_line: 0,
            start_column: 0,
            end_line: 0,
            end_exact: true,
            value: Value::Null,
        }
    }

    fn index(paths: &[&str]) -> PathIndex {
        let entries = paths
            .iter()
            .map(|p| ((*p).to_string(), entry(p)))
            .collect();
        PathIndex::from_parts(entries, Vec::new(), vec![DocumentId::new("doc.json")])
    }

    #[test]
    fn top_level_keys_are_distinct_and_sorted() {
        let idx = index(&["b", "b.x", "a", "a.y.z"]);
        assert_eq!(idx.top_level_keys().into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn children_are_immediate_only() {
        let idx = index(&["a", "a.b", "a.b.c", "a.b.d", "a.e", "ab.f"]);
        assert_eq!(
            idx.children_of("a").into_iter().collect::<Vec<_>>(),
            vec!["b", "e"]
        );
        assert_eq!(
            idx.children_of("a.b").into_iter().collect::<Vec<_>>(),
            vec!["c", "d"]
        );
        assert!(idx.children_of("a.e").is_empty());
        assert!(idx.children_of("missing").is_empty());
    }

    #[test]
    fn reads_document_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.json");
        std::fs::write(&path, r#"{"a": 1}"#).unwrap();

        let doc = SourceDocument::read(&path).unwrap();
        assert_eq!(doc.text, r#"{"a": 1}"#);
        assert_eq!(doc.id.file_name(), "site.json");

        let missing = SourceDocument::read(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, crate::IndexerError::Io(_)));
    }
}
