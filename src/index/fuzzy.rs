//! Fuzzy keyword index
//!
//! Every inserted key is split into characters; each character owns a
//! posting table of `(entry, position)` pairs sorted by entry, then
//! position. A query walks one table per needle character and keeps the
//! entries in which the needle occurs as a subsequence.
//!
//! Scoring favours short keys and tight matches:
//! `score = 1 / (chars(key) + gap)` where `gap` sums the distances between
//! consecutive needle characters.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Payload attached to index keys
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Stable identifier of the indexed node
    pub id: String,
    /// The keyword that identifies the node to humans
    pub word: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum MetaValue {
    String(String),
    U64(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
struct Posting {
    entry: u32,
    position: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    key: String,
    document: u32,
}

/// Accumulates keys and documents, then freezes them into a `FuzzyIndex`
#[derive(Debug, Default)]
pub struct FuzzyIndexBuilder {
    case_sensitive: bool,
    documents: Vec<IndexDocument>,
    document_ids: HashMap<IndexDocument, u32>,
    entries: Vec<Entry>,
    seen: HashSet<(String, u32)>,
    metadata: BTreeMap<String, MetaValue>,
}

impl FuzzyIndexBuilder {
    pub fn new(case_sensitive: bool) -> Self {
        FuzzyIndexBuilder {
            case_sensitive,
            ..Default::default()
        }
    }

    /// Map `key` to `document`, returning the document's id
    ///
    /// Equal documents share one id; ids are dense from 0.
    pub fn insert(&mut self, key: &str, document: IndexDocument) -> u32 {
        let key = if self.case_sensitive {
            key.to_string()
        } else {
            key.to_lowercase()
        };

        let document_id = match self.document_ids.get(&document) {
            Some(&id) => id,
            None => {
                let id = self.documents.len() as u32;
                self.documents.push(document.clone());
                self.document_ids.insert(document, id);
                id
            }
        };

        if self.seen.insert((key.clone(), document_id)) {
            self.entries.push(Entry {
                key,
                document: document_id,
            });
        }
        document_id
    }

    pub fn set_metadata_string(&mut self, key: &str, value: &str) {
        self.metadata
            .insert(key.to_string(), MetaValue::String(value.to_string()));
    }

    pub fn set_metadata_u64(&mut self, key: &str, value: u64) {
        self.metadata.insert(key.to_string(), MetaValue::U64(value));
    }

    pub fn metadata_string(&self, key: &str) -> Option<&str> {
        match self.metadata.get(key) {
            Some(MetaValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Number of distinct key/document pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(self) -> FuzzyIndex {
        let mut tables: BTreeMap<char, Vec<Posting>> = BTreeMap::new();

        // Entries are visited in id order and positions grow within a key,
        // so every table comes out sorted.
        for (entry, e) in self.entries.iter().enumerate() {
            for (position, ch) in e.key.chars().enumerate() {
                tables.entry(ch).or_default().push(Posting {
                    entry: entry as u32,
                    position: position as u32,
                });
            }
        }

        FuzzyIndex {
            case_sensitive: self.case_sensitive,
            documents: self.documents,
            entries: self.entries,
            tables,
            metadata: self.metadata,
        }
    }
}

/// One query result
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    /// Indexed key (lowercased unless the index is case-sensitive)
    pub key: String,
    pub document_id: u32,
    pub document: IndexDocument,
    pub score: f32,
}

/// Immutable, serializable fuzzy index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzyIndex {
    case_sensitive: bool,
    documents: Vec<IndexDocument>,
    entries: Vec<Entry>,
    tables: BTreeMap<char, Vec<Posting>>,
    metadata: BTreeMap<String, MetaValue>,
}

impl FuzzyIndex {
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Number of key/document entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn documents(&self) -> &[IndexDocument] {
        &self.documents
    }

    pub fn document(&self, id: u32) -> Option<&IndexDocument> {
        self.documents.get(id as usize)
    }

    pub fn metadata_string(&self, key: &str) -> Option<&str> {
        match self.metadata.get(key) {
            Some(MetaValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn metadata_u64(&self, key: &str) -> Option<u64> {
        match self.metadata.get(key) {
            Some(MetaValue::U64(v)) => Some(*v),
            _ => None,
        }
    }

    /// Entries containing `needle` as a subsequence, best first
    ///
    /// `max_matches == 0` means unlimited.
    pub fn query(&self, needle: &str, max_matches: usize) -> Vec<FuzzyMatch> {
        if needle.is_empty() {
            return Vec::new();
        }
        let needle = if self.case_sensitive {
            needle.to_string()
        } else {
            needle.to_lowercase()
        };

        let tables: Option<Vec<&[Posting]>> = needle
            .chars()
            .map(|ch| self.tables.get(&ch).map(Vec::as_slice))
            .collect();
        let tables = match tables {
            Some(tables) if !tables.is_empty() => tables,
            _ => return Vec::new(),
        };

        let mut matches = Vec::new();
        if tables.len() == 1 {
            let mut last = None;
            for posting in tables[0] {
                if last != Some(posting.entry) {
                    last = Some(posting.entry);
                    matches.extend(self.make_match(posting.entry, 0.0));
                }
            }
        } else {
            let mut lookup = Lookup::new(&tables);
            for &first in tables[0] {
                lookup.walk(1, first, 0);
            }
            for (entry, gap) in lookup.gaps {
                let key_len = self
                    .entries
                    .get(entry as usize)
                    .map_or(0, |e| e.key.chars().count());
                let score = 1.0 / (key_len as u32 + gap).max(1) as f32;
                matches.extend(self.make_match(entry, score));
            }
        }

        sort_matches(&mut matches);
        if max_matches > 0 {
            matches.truncate(max_matches);
        }
        matches
    }

    fn make_match(&self, entry: u32, score: f32) -> Option<FuzzyMatch> {
        let e = self.entries.get(entry as usize)?;
        let document = self.documents.get(e.document as usize)?;
        Some(FuzzyMatch {
            key: e.key.clone(),
            document_id: e.document,
            document: document.clone(),
            score,
        })
    }
}

/// Best score first, then key order
pub fn sort_matches(matches: &mut [FuzzyMatch]) {
    matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.key.cmp(&b.key)));
}

/// Subsequence search state for one query
///
/// Each table keeps a cursor that only moves forward. Calls at one level
/// see increasing `(entry, position)` predecessors, and a suffix that cannot
/// be matched after a posting cannot be matched after a later one either,
/// so the walk never rescans a table.
struct Lookup<'a> {
    tables: &'a [&'a [Posting]],
    cursors: Vec<usize>,
    /// Smallest gap found per entry
    gaps: HashMap<u32, u32>,
}

impl<'a> Lookup<'a> {
    fn new(tables: &'a [&'a [Posting]]) -> Self {
        Lookup {
            tables,
            cursors: vec![0; tables.len()],
            gaps: HashMap::new(),
        }
    }

    /// Extend an alignment ending at `prev` through tables `level..`
    ///
    /// Takes the first candidate that completes.
    fn walk(&mut self, level: usize, prev: Posting, gap: u32) -> bool {
        let table = self.tables[level];

        while let Some(&next) = table.get(self.cursors[level]) {
            if next <= prev {
                self.cursors[level] += 1;
                continue;
            }
            if next.entry != prev.entry {
                break;
            }

            let gap = gap + (next.position - prev.position);
            if level + 1 < self.tables.len() {
                if self.walk(level + 1, next, gap) {
                    return true;
                }
                self.cursors[level] += 1;
                continue;
            }

            self.gaps
                .entry(next.entry)
                .and_modify(|best| *best = (*best).min(gap))
                .or_insert(gap);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::{Duration, Instant};

    fn doc(id: &str) -> IndexDocument {
        IndexDocument {
            id: id.to_string(),
            word: id.to_string(),
        }
    }

    fn index(keys: &[&str]) -> FuzzyIndex {
        let mut builder = FuzzyIndexBuilder::new(false);
        for key in keys {
            builder.insert(key, doc(key));
        }
        builder.build()
    }

    fn keys(matches: &[FuzzyMatch]) -> Vec<&str> {
        matches.iter().map(|m| m.key.as_str()).collect()
    }

    #[test]
    fn test_subsequence_match() {
        let index = index(&["gtk_widget_show", "gtk_window_new", "g_object_ref"]);
        let matches = index.query("gws", 0);
        assert_eq!(keys(&matches), ["gtk_widget_show"]);
        // g0 w4 s11: gap 11, 15 characters
        assert_eq!(matches[0].score, 1.0 / 26.0);
    }

    #[test]
    fn test_tighter_and_shorter_first() {
        let index = index(&["gtk_widget_show", "show", "shadow"]);
        let matches = index.query("sh", 0);
        assert_eq!(keys(&matches), ["show", "shadow", "gtk_widget_show"]);
        assert_eq!(matches[0].score, 1.0 / 5.0);
    }

    #[test]
    fn test_ties_sorted_by_key() {
        let index = index(&["beta", "alfa"]);
        assert_eq!(keys(&index.query("a", 0)), ["alfa", "beta"]);
        assert!(index.query("a", 0).iter().all(|m| m.score == 0.0));
    }

    #[test]
    fn test_no_match_cases() {
        let index = index(&["widget"]);
        assert!(index.query("", 0).is_empty());
        assert!(index.query("wz", 0).is_empty());
        assert!(index.query("tw", 0).is_empty());
    }

    #[test]
    fn test_case_folding() {
        let index = index(&["GtkWidget"]);
        assert_eq!(keys(&index.query("GTKW", 0)), ["gtkwidget"]);

        let mut builder = FuzzyIndexBuilder::new(true);
        builder.insert("GtkWidget", doc("GtkWidget"));
        let index = builder.build();
        assert!(index.case_sensitive());
        assert_eq!(index.query("gtkw", 0).len(), 0);
        assert_eq!(keys(&index.query("GtkW", 0)), ["GtkWidget"]);
    }

    #[test]
    fn test_repeated_characters_need_distinct_positions() {
        let index = index(&["gtk_new", "aa"]);
        assert!(index.query("nn", 0).is_empty());
        assert_eq!(keys(&index.query("aa", 0)), ["aa"]);
    }

    #[test]
    fn test_near_miss_on_repetitive_keys() {
        let long = "a".repeat(30);
        let index = index(&[long.as_str(), "b"]);

        let started = Instant::now();
        for len in [13, 15, 29] {
            let needle = format!("{}b", "a".repeat(len));
            assert!(index.query(&needle, 0).is_empty());
        }
        assert!(index.query(&"a".repeat(31), 0).is_empty());
        assert!(started.elapsed() < Duration::from_millis(500));

        let matches = index.query(&"a".repeat(15), 0);
        assert_eq!(keys(&matches), [long.as_str()]);
        // consecutive positions: gap 14, 30 characters
        assert_eq!(matches[0].score, 1.0 / 44.0);
    }

    #[test]
    fn test_later_start_keeps_smaller_gap() {
        let index = index(&["xa_b_ab"]);
        let matches = index.query("ab", 0);
        // a1 b3 first fits with gap 2; a5 b6 gives gap 1
        assert_eq!(matches[0].score, 1.0 / 8.0);
    }

    proptest! {
        #[test]
        fn prop_matches_are_exactly_subsequences(
            keys in proptest::collection::vec("[ab_]{1,12}", 1..8),
            needle in "[ab]{1,6}",
        ) {
            let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
            let index = index(&key_refs);
            let found: HashSet<String> =
                index.query(&needle, 0).into_iter().map(|m| m.key).collect();
            let expected: HashSet<String> = keys
                .iter()
                .filter(|key| is_subsequence(&needle, key))
                .cloned()
                .collect();
            prop_assert_eq!(found, expected);
        }
    }

    fn is_subsequence(needle: &str, key: &str) -> bool {
        let mut chars = key.chars();
        needle.chars().all(|n| chars.any(|k| k == n))
    }

    #[test]
    fn test_truncate() {
        let index = index(&["a1", "a2", "a3"]);
        assert_eq!(index.query("a", 2).len(), 2);
        assert_eq!(index.query("a", 0).len(), 3);
    }

    #[test]
    fn test_documents_deduplicated() {
        let mut builder = FuzzyIndexBuilder::new(false);
        let a = builder.insert("gtk_widget_show", doc("show"));
        let b = builder.insert("show", doc("show"));
        let c = builder.insert("SHOW", doc("show"));
        let d = builder.insert("hide", doc("hide"));
        assert_eq!((a, b, c, d), (0, 0, 0, 1));
        assert_eq!(builder.len(), 3);

        let index = builder.build();
        assert_eq!(index.documents().len(), 2);
        let matches = index.query("show", 0);
        assert!(matches.iter().all(|m| m.document.id == "show"));
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_metadata() {
        let mut builder = FuzzyIndexBuilder::new(false);
        builder.set_metadata_string("namespace", "Gtk");
        builder.set_metadata_u64("mtime", 42);
        assert_eq!(builder.metadata_string("namespace"), Some("Gtk"));
        let index = builder.build();
        assert_eq!(index.metadata_string("namespace"), Some("Gtk"));
        assert_eq!(index.metadata_u64("mtime"), Some(42));
        assert_eq!(index.metadata_u64("namespace"), None);
        assert_eq!(index.metadata_string("missing"), None);
    }

    #[test]
    fn test_serde_round_trip_preserves_queries() {
        let index = index(&["gtk_widget_show", "gtk_window_new"]);
        let bytes = bincode::serialize(&index).unwrap();
        let loaded: FuzzyIndex = bincode::deserialize(&bytes).unwrap();
        assert_eq!(index.query("gwn", 0), loaded.query("gwn", 0));
    }
}
