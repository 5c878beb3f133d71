use datapath_indexer::{IndexEntry, PathIndex, Value};
use datapath_protocol::{CompletionCandidate, ValueKind, PATH_SEPARATOR};

pub const DEFAULT_PREVIEW_MAX_CHARS: usize = 200;
const TRUNCATION_MARKER: &str = "...";

/// Entry for `path`, retrying without a leading `namespace_prefix.` when the full path misses.
#[must_use]
pub fn resolve_location<'i>(
    index: &'i PathIndex,
    path: &str,
    namespace_prefix: Option<&str>,
) -> Option<&'i IndexEntry> {
    index.get(path).or_else(|| {
        let stripped = path
            .strip_prefix(namespace_prefix?)?
            .strip_prefix(PATH_SEPARATOR)?;
        log::trace!("{path} not indexed, retrying as {stripped}");
        index.get(stripped)
    })
}

#[must_use]
pub const fn value_kind(value: &Value) -> ValueKind {
    match value {
        Value::Null => ValueKind::Null,
        Value::Bool(_) => ValueKind::Boolean,
        Value::Number(_) => ValueKind::Number,
        Value::String(_) => ValueKind::String,
        Value::Array(_) => ValueKind::Array,
        Value::Object(_) => ValueKind::Object,
    }
}

/// Indented JSON, two spaces per level.
pub(crate) fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Turns partially typed paths into completion candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathResolver {
    preview_max_chars: usize,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_MAX_CHARS)
    }
}

impl PathResolver {
    #[must_use]
    pub const fn new(preview_max_chars: usize) -> Self {
        Self { preview_max_chars }
    }

    /// Candidates for the segment being typed at the end of `partial_path`.
    ///
    /// Without a separator the top-level keys are offered; otherwise the immediate children
    /// of everything before the last separator. Names are filtered by a case-insensitive
    /// prefix and come out sorted.
    #[must_use]
    pub fn suggest(&self, index: &PathIndex, partial_path: &str) -> Vec<CompletionCandidate> {
        let Some(dot) = partial_path.rfind(PATH_SEPARATOR) else {
            return index
                .top_level_keys()
                .into_iter()
                .filter(|key| starts_with_ignore_case(key, partial_path))
                .map(CompletionCandidate::top_level)
                .collect();
        };

        let parent = &partial_path[..dot];
        let segment = &partial_path[dot + PATH_SEPARATOR.len_utf8()..];
        index
            .children_of(parent)
            .into_iter()
            .filter(|child| starts_with_ignore_case(child, segment))
            .map(|child| self.child_candidate(index, parent, child))
            .collect()
    }

    fn child_candidate(&self, index: &PathIndex, parent: &str, name: &str) -> CompletionCandidate {
        let full_path = format!("{parent}{PATH_SEPARATOR}{name}");
        let (detail, documentation) = match index.get(&full_path) {
            None => ("Property".to_string(), None),
            Some(entry) => match &entry.value {
                Value::Object(_) => ("Object".to_string(), Some(self.preview(&entry.value))),
                Value::Array(_) => ("Array".to_string(), Some(self.preview(&entry.value))),
                scalar => (format!("{}: {scalar}", value_kind(scalar).as_str()), None),
            },
        };
        CompletionCandidate::child(name, detail, documentation)
    }

    fn preview(&self, value: &Value) -> String {
        let pretty = pretty_json(value);
        match pretty.char_indices().nth(self.preview_max_chars) {
            Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &pretty[..cut]),
            None => pretty,
        }
    }
}

/// [`PathResolver::suggest`] with the default preview length.
#[must_use]
pub fn suggest(index: &PathIndex, partial_path: &str) -> Vec<CompletionCandidate> {
    PathResolver::default().suggest(index, partial_path)
}

fn starts_with_ignore_case(name: &str, prefix: &str) -> bool {
    name.to_lowercase().starts_with(&prefix.to_lowercase())
}
