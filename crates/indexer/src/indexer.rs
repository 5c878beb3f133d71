use crate::error::{IndexerError, Result};
use crate::locate::{find_key, scan_container_end};
use crate::options::{DuplicatePolicy, IndexOptions};
use crate::path_index::{IndexEntry, PathCollision, PathIndex, SourceDocument};
use crate::stats::{DocumentStats, IndexStats};
use datapath_protocol::{DocumentId, LineIndex, PATH_SEPARATOR};
use serde_json::{Map, Value};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::time::Instant;

/// Paths located in a single document, before merging.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    pub document_id: DocumentId,
    pub entries: BTreeMap<String, IndexEntry>,
    pub stats: DocumentStats,
}

/// Result of a full rebuild.
#[derive(Debug, Clone)]
pub struct BuiltIndex {
    pub index: PathIndex,
    pub stats: IndexStats,
}

/// Parse one document and record every locatable key path.
pub fn index_document(
    text: &str,
    document_id: &DocumentId,
    options: &IndexOptions,
) -> Result<DocumentIndex> {
    let root: Value =
        serde_json::from_str(text).map_err(|e| IndexerError::parse(document_id, &e))?;

    let mut walker = DocumentWalker {
        text,
        lines: LineIndex::new(text),
        document_id,
        max_scan_lines: options.max_scan_lines,
        entries: BTreeMap::new(),
        stats: DocumentStats::default(),
    };
    if let Value::Object(object) = &root {
        walker.walk_object(object, None, 0, text.len());
    }

    log::debug!(
        "Indexed {document_id}: {} located, {} unlocated, {} inexact",
        walker.stats.located,
        walker.stats.unlocated,
        walker.stats.inexact_ends
    );

    Ok(DocumentIndex {
        document_id: document_id.clone(),
        entries: walker.entries,
        stats: walker.stats,
    })
}

/// Index every document in order and merge the fragments into one table.
///
/// Any parse failure aborts the whole build so the caller can keep its previous index.
pub fn build_path_index(
    documents: &[SourceDocument],
    options: &IndexOptions,
) -> Result<BuiltIndex> {
    let started = Instant::now();
    let fragments = documents
        .iter()
        .map(|doc| index_document(&doc.text, &doc.id, options))
        .collect::<Result<Vec<_>>>()?;
    Ok(merge_documents(fragments, options.duplicate_policy, started))
}

/// Same as [`build_path_index`], indexing documents on blocking worker tasks.
pub async fn build_path_index_parallel(
    documents: Vec<SourceDocument>,
    options: &IndexOptions,
) -> Result<BuiltIndex> {
    const MAX_CONCURRENT: usize = 16;

    let started = Instant::now();
    let mut fragments = Vec::with_capacity(documents.len());
    let mut remaining = documents.into_iter().peekable();

    while remaining.peek().is_some() {
        let mut tasks = Vec::with_capacity(MAX_CONCURRENT);
        for doc in remaining.by_ref().take(MAX_CONCURRENT) {
            let options = options.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                index_document(&doc.text, &doc.id, &options)
            }));
        }

        for task in tasks {
            match task.await {
                Ok(result) => fragments.push(result?),
                Err(e) => return Err(IndexerError::Task(format!("Task panicked: {e}"))),
            }
        }
    }

    Ok(merge_documents(fragments, options.duplicate_policy, started))
}

fn merge_documents(
    fragments: Vec<DocumentIndex>,
    policy: DuplicatePolicy,
    started: Instant,
) -> BuiltIndex {
    let mut stats = IndexStats::new();
    let mut entries: BTreeMap<String, IndexEntry> = BTreeMap::new();
    let mut collisions = Vec::new();
    let mut documents = Vec::with_capacity(fragments.len());

    for fragment in fragments {
        stats.add_document(&fragment.stats);
        documents.push(fragment.document_id);

        for (path, entry) in fragment.entries {
            match entries.entry(path) {
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
                Entry::Occupied(mut slot) => {
                    let existing = slot.get().document_id.clone();
                    let collision = match policy {
                        DuplicatePolicy::LastWins => {
                            let dropped = existing;
                            let kept = entry.document_id.clone();
                            slot.insert(entry);
                            PathCollision {
                                path: slot.key().clone(),
                                kept,
                                dropped,
                            }
                        }
                        DuplicatePolicy::FirstWins => PathCollision {
                            path: slot.key().clone(),
                            kept: existing,
                            dropped: entry.document_id,
                        },
                    };
                    log::debug!(
                        "Path {} defined in both {} and {}; keeping {}",
                        collision.path,
                        collision.dropped,
                        collision.kept,
                        collision.kept
                    );
                    collisions.push(collision);
                }
            }
        }
    }

    stats.paths = entries.len();
    stats.collisions = collisions.len();
    #[allow(clippy::cast_possible_truncation)]
    {
        stats.time_ms = started.elapsed().as_millis() as u64;
    }

    BuiltIndex {
        index: PathIndex::from_parts(entries, collisions, documents),
        stats,
    }
}

struct DocumentWalker<'a> {
    text: &'a str,
    lines: LineIndex<'a>,
    document_id: &'a DocumentId,
    max_scan_lines: usize,
    entries: BTreeMap<String, IndexEntry>,
    stats: DocumentStats,
}

impl DocumentWalker<'_> {
    /// Index the keys of `object`, searching `floor..ceiling`.
    /// Returns the furthest offset the search reached.
    fn walk_object(
        &mut self,
        object: &Map<String, Value>,
        parent: Option<&str>,
        floor: usize,
        ceiling: usize,
    ) -> usize {
        let mut cursor = floor;

        for (key, value) in object {
            let path = match parent {
                Some(parent) => format!("{parent}{PATH_SEPARATOR}{key}"),
                None => key.clone(),
            };

            let Some(occurrence) = find_key(self.text, key, cursor, ceiling) else {
                let skipped = 1 + count_descendant_keys(value);
                log::debug!(
                    "{}: no declaration of {path} after offset {cursor}; skipping {skipped} paths",
                    self.document_id
                );
                self.stats.unlocated += skipped;
                continue;
            };

            let (start_line, start_column) = self.lines.line_col(occurrence.key_start);
            let scan_limit = self
                .lines
                .offset_after_lines(start_line, self.max_scan_lines.saturating_add(1));

            let (end_line, end_exact, next_cursor) = match value {
                Value::Object(children) => {
                    let end = scan_container_end(self.text, occurrence.value_start, scan_limit);
                    let inner_ceiling = if end.exact { end.offset } else { ceiling };
                    let reached = self.walk_object(
                        children,
                        Some(&path),
                        occurrence.value_start,
                        inner_ceiling,
                    );
                    let next = if end.exact { end.offset + 1 } else { reached };
                    (self.lines.line_of(end.offset), end.exact, next)
                }
                Value::Array(_) => {
                    let end = scan_container_end(self.text, occurrence.value_start, scan_limit);
                    let next = if end.exact {
                        end.offset + 1
                    } else {
                        occurrence.value_start
                    };
                    (self.lines.line_of(end.offset), end.exact, next)
                }
                _ => (start_line, true, occurrence.value_start),
            };

            if !end_exact {
                self.stats.inexact_ends += 1;
            }
            cursor = cursor.max(next_cursor);
            self.stats.located += 1;
            self.entries.insert(
                path.clone(),
                IndexEntry {
                    path,
                    document_id: self.document_id.clone(),
                    start_line,
                    start_column,
                    end_line,
                    end_exact,
                    value: value.clone(),
                },
            );
        }

        cursor
    }
}

fn count_descendant_keys(value: &Value) -> usize {
    match value {
        Value::Object(object) => object
            .values()
            .map(|child| 1 + count_descendant_keys(child))
            .sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(text: &str) -> DocumentIndex {
        index_document(text, &DocumentId::new("test.json"), &IndexOptions::default())
            .expect("valid json")
    }

    #[test]
    fn records_key_positions_and_values() {
        let text = "{\n  \"Hero\": {\n    \"title\": \"Hi\",\n    \"tags\": [\n      1\n    ]\n  }\n}";
        let idx = doc(text);

        let hero = &idx.entries["Hero"];
        assert_eq!((hero.start_line, hero.start_column, hero.end_line), (1, 2, 6));
        assert!(hero.end_exact);

        let title = &idx.entries["Hero.title"];
        assert_eq!((title.start_line, title.start_column, title.end_line), (2, 4, 2));
        assert_eq!(title.value, Value::String("Hi".into()));

        let tags = &idx.entries["Hero.tags"];
        assert_eq!((tags.start_line, tags.end_line), (3, 5));
        assert_eq!(idx.stats.located, 3);
    }

    #[test]
    fn arrays_are_leaves() {
        let idx = doc(r#"{"list": [{"inner": 1}]}"#);
        assert!(idx.entries.contains_key("list"));
        assert!(!idx.entries.contains_key("list.inner"));
        assert!(!idx.entries.contains_key("list.0"));
    }

    #[test]
    fn repeated_key_names_resolve_to_their_own_occurrence() {
        let text = "{\n\"a\": {\n\"x\": 1\n},\n\"x\": 2\n}";
        let idx = doc(text);
        assert_eq!(idx.entries["a.x"].start_line, 2);
        assert_eq!(idx.entries["x"].start_line, 4);
    }

    #[test]
    fn non_object_root_yields_empty_index() {
        assert!(doc("[1, 2, 3]").entries.is_empty());
        assert!(doc("\"text\"").entries.is_empty());
    }

    #[test]
    fn parse_failure_is_reported_with_document() {
        let err = index_document(
            "{\"a\": ",
            &DocumentId::new("bad.json"),
            &IndexOptions::default(),
        )
        .unwrap_err();
        assert!(err.is_parse_error());
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn scan_cap_marks_end_inexact() {
        let text = "{\n\"big\": [\n1,\n2,\n3,\n4\n],\n\"after\": true\n}";
        let options = IndexOptions::default().with_max_scan_lines(2);
        let idx = index_document(text, &DocumentId::new("t.json"), &options).unwrap();
        let big = &idx.entries["big"];
        assert!(!big.end_exact);
        assert_eq!(big.end_line, 3);
        assert_eq!(idx.stats.inexact_ends, 1);
        // the sibling after the capped array is still found
        assert_eq!(idx.entries["after"].start_line, 7);
    }

    #[test]
    fn merge_applies_duplicate_policy() {
        let docs = vec![
            SourceDocument::new("one.json", r#"{"shared": 1, "only_one": true}"#),
            SourceDocument::new("two.json", r#"{"shared": 2}"#),
        ];

        let last = build_path_index(&docs, &IndexOptions::default()).unwrap();
        assert_eq!(last.index.get("shared").unwrap().value, Value::from(2));
        assert_eq!(
            last.index.collisions(),
            &[PathCollision {
                path: "shared".into(),
                kept: DocumentId::new("two.json"),
                dropped: DocumentId::new("one.json"),
            }]
        );
        assert_eq!(last.stats.collisions, 1);
        assert_eq!(last.stats.paths, 2);
        assert_eq!(last.stats.documents, 2);

        let first = build_path_index(
            &docs,
            &IndexOptions::default().with_duplicate_policy(DuplicatePolicy::FirstWins),
        )
        .unwrap();
        assert_eq!(first.index.get("shared").unwrap().value, Value::from(1));
        assert_eq!(first.index.collisions()[0].kept, DocumentId::new("one.json"));
    }

    #[test]
    fn one_bad_document_fails_the_build() {
        let docs = vec![
            SourceDocument::new("ok.json", r#"{"a": 1}"#),
            SourceDocument::new("bad.json", "{"),
        ];
        let err = build_path_index(&docs, &IndexOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            IndexerError::Parse { ref document, .. } if document.as_str() == "bad.json"
        ));
    }

    #[tokio::test]
    async fn parallel_build_matches_sequential_build() {
        let docs: Vec<SourceDocument> = (0..40)
            .map(|i| {
                SourceDocument::new(
                    format!("doc{i}.json"),
                    format!(r#"{{"k{i}": {{"v": {i}}}, "shared": {i}}}"#),
                )
            })
            .collect();
        let options = IndexOptions::default();
        let sequential = build_path_index(&docs, &options).unwrap();
        let parallel = build_path_index_parallel(docs, &options).await.unwrap();
        assert_eq!(parallel.index, sequential.index);
        assert_eq!(parallel.index.get("shared").unwrap().value, Value::from(39));
    }
}
