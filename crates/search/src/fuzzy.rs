use datapath_indexer::PathIndex;
use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Matcher, Utf32String};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathMatch {
    pub path: String,
    /// Normalized to 0..=1; an exact path match scores 1.
    pub score: f32,
}

/// Fuzzy search over indexed paths using nucleo-matcher
pub struct PathFinder {
    matcher: Matcher,
}

impl PathFinder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(nucleo_matcher::Config::DEFAULT),
        }
    }

    /// Best `limit` paths for `query`: exact match first, then score descending, then path.
    pub fn search(&mut self, query: &str, index: &PathIndex, limit: usize) -> Vec<PathMatch> {
        let pattern = Pattern::parse(query, CaseMatching::Smart, Normalization::Smart);

        let mut scored: Vec<(&str, u32, bool)> = index
            .paths()
            .filter_map(|path| {
                let haystack = Utf32String::from(path);
                let score = pattern.score(haystack.slice(..), &mut self.matcher)?;
                Some((path, score, path == query))
            })
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let max_score = scored
            .iter()
            .map(|(_, score, _)| *score as f32)
            .fold(0.0f32, f32::max);

        // paths arrive sorted, and the sort is stable
        scored.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| b.1.cmp(&a.1)));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(path, score, exact)| {
                #[allow(clippy::cast_precision_loss)]
                let normalized = if exact {
                    1.0
                } else if max_score > 0.0 {
                    score as f32 / max_score
                } else {
                    0.0
                };
                PathMatch {
                    path: path.to_string(),
                    score: normalized,
                }
            })
            .collect()
    }
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datapath_indexer::{build_path_index, IndexOptions, SourceDocument};

    fn index() -> PathIndex {
        let text = r#"{
            "Hero": {"title": "Hi", "subtitle": "More", "cta": {"label": "Go"}},
            "Footer": {"title": "Bye"},
            "title": "Site"
        }"#;
        build_path_index(&[SourceDocument::new("d.json", text)], &IndexOptions::default())
            .unwrap()
            .index
    }

    #[test]
    fn exact_path_is_first() {
        let mut finder = PathFinder::new();
        let results = finder.search("title", &index(), 10);
        assert_eq!(results[0].path, "title");
        assert_eq!(results[0].score, 1.0);
        assert!(results.iter().any(|m| m.path == "Hero.title"));
        assert!(results.iter().any(|m| m.path == "Footer.title"));
    }

    #[test]
    fn subsequence_matches_nested_paths() {
        let mut finder = PathFinder::new();
        let results = finder.search("herocta", &index(), 10);
        assert!(results.iter().any(|m| m.path == "Hero.cta.label"));
        assert!(results.iter().all(|m| m.score <= 1.0));
    }

    #[test]
    fn limit_is_respected() {
        let mut finder = PathFinder::new();
        assert_eq!(finder.search("t", &index(), 2).len(), 2);
        assert!(finder.search("zzzz", &index(), 5).is_empty());
    }
}
