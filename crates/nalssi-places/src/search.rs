//! District search: a read-only index over hierarchical place names.
//!
//! Each raw name like `"서울특별시-종로구-청운동"` is split once at build time
//! into its segments. Queries are matched as a subsequence of the segments
//! joined without separators, so `"종청"` finds `"서울특별시종로구청운동"`.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

/// Default segment separator in the bundled dataset.
pub const DEFAULT_SEPARATOR: char = '-';

/// Default maximum number of search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

const EMBEDDED_DISTRICTS: &str = include_str!("../data/korea_districts.json");

/// Errors raised while loading a district dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read district dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse district dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One entry of the district dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictRecord {
    raw_path: Vec<String>,
    display_name: String,
    search_key: String,
}

impl DistrictRecord {
    /// Build a record from a raw hierarchical name.
    ///
    /// Empty segments (from doubled or trailing separators) are dropped.
    pub fn parse(raw: &str, separator: char) -> Self {
        let raw_path: Vec<String> = raw
            .split(separator)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        let display_name = raw_path.last().cloned().unwrap_or_default();
        let search_key = raw_path.concat();

        Self {
            raw_path,
            display_name,
            search_key,
        }
    }

    /// Administrative hierarchy, province first.
    pub fn raw_path(&self) -> &[String] {
        &self.raw_path
    }

    /// Finest-grained unit name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// All segments concatenated; the text queries are matched against.
    pub fn search_key(&self) -> &str {
        &self.search_key
    }

    /// Segments joined with a single space, e.g. `"서울특별시 종로구 청운동"`.
    pub fn full_name(&self) -> String {
        self.raw_path.join(" ")
    }
}

/// Returns true if every char of `pattern` appears in `text` in order.
///
/// Two cursors walk left to right; the pattern cursor advances on each equal
/// char. Comparison is exact code-point equality.
pub fn is_subsequence(text: &str, pattern: &str) -> bool {
    let mut wanted = pattern.chars().peekable();

    for c in text.chars() {
        match wanted.peek() {
            Some(&p) if p == c => {
                wanted.next();
            }
            Some(_) => {}
            None => break,
        }
    }

    wanted.peek().is_none()
}

/// Read-only searchable index over district records, in source order.
#[derive(Debug, Clone, Default)]
pub struct DistrictSearchIndex {
    records: Vec<DistrictRecord>,
}

impl DistrictSearchIndex {
    /// Build an index from raw hierarchical names, preserving their order.
    pub fn from_raw_names<I, S>(names: I, separator: char) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let records = names
            .into_iter()
            .map(|raw| DistrictRecord::parse(raw.as_ref(), separator))
            .filter(|r| !r.raw_path.is_empty())
            .collect();

        Self { records }
    }

    /// Build an index from a JSON array of raw names.
    pub fn from_json_str(json: &str, separator: char) -> Result<Self, DatasetError> {
        let names: Vec<String> = serde_json::from_str(json)?;
        Ok(Self::from_raw_names(names, separator))
    }

    /// Build an index from a JSON file containing an array of raw names.
    pub fn from_json_file(path: &Path, separator: char) -> Result<Self, DatasetError> {
        let json = std::fs::read_to_string(path)?;
        let index = Self::from_json_str(&json, separator)?;
        tracing::info!("Loaded {} districts from {}", index.len(), path.display());
        Ok(index)
    }

    /// Build the index over the bundled Korean administrative districts.
    pub fn embedded() -> Result<Self, DatasetError> {
        Self::from_json_str(EMBEDDED_DISTRICTS, DEFAULT_SEPARATOR)
    }

    /// Search with the default result cap of [`DEFAULT_SEARCH_LIMIT`].
    pub fn search(&self, keyword: &str) -> Vec<&DistrictRecord> {
        self.search_with_limit(keyword, DEFAULT_SEARCH_LIMIT)
    }

    /// Return up to `limit` records whose search key contains the keyword
    /// (whitespace removed) as a subsequence, in index order.
    ///
    /// A blank keyword yields no results.
    pub fn search_with_limit(&self, keyword: &str, limit: usize) -> Vec<&DistrictRecord> {
        if keyword.trim().is_empty() {
            return Vec::new();
        }

        let pattern: String = keyword.chars().filter(|c| !c.is_whitespace()).collect();

        self.records
            .iter()
            .filter(|r| is_subsequence(&r.search_key, &pattern))
            .take(limit)
            .collect()
    }

    pub fn records(&self) -> &[DistrictRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> DistrictSearchIndex {
        DistrictSearchIndex::from_raw_names(
            ["서울특별시-종로구-청운동", "부산광역시-해운대구-우동"],
            DEFAULT_SEPARATOR,
        )
    }

    #[test]
    fn test_record_parse() {
        let record = DistrictRecord::parse("서울특별시-종로구-청운동", '-');
        assert_eq!(record.raw_path(), ["서울특별시", "종로구", "청운동"]);
        assert_eq!(record.display_name(), "청운동");
        assert_eq!(record.search_key(), "서울특별시종로구청운동");
        assert_eq!(record.full_name(), "서울특별시 종로구 청운동");
    }

    #[test]
    fn test_record_parse_drops_empty_segments() {
        let record = DistrictRecord::parse("경기도--수원시-", '-');
        assert_eq!(record.raw_path(), ["경기도", "수원시"]);
        assert_eq!(record.display_name(), "수원시");
    }

    #[test]
    fn test_is_subsequence() {
        assert!(is_subsequence("서울특별시종로구청운동", "종청"));
        assert!(is_subsequence("서울특별시종로구청운동", "청운"));
        assert!(is_subsequence("abc", ""));
        assert!(!is_subsequence("서울특별시종로구청운동", "청종"));
        assert!(!is_subsequence("ab", "abc"));
    }

    #[test]
    fn test_is_subsequence_is_case_sensitive() {
        assert!(!is_subsequence("Seoul", "seoul"));
        assert!(is_subsequence("Seoul", "Sl"));
    }

    #[test]
    fn test_blank_keyword_returns_nothing() {
        let index = sample_index();
        assert!(index.search("").is_empty());
        assert!(index.search("   ").is_empty());
        assert!(index.search("\t\n").is_empty());
    }

    #[test]
    fn test_non_contiguous_match() {
        let index = sample_index();
        let results = index.search("종청");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].display_name(), "청운동");
    }

    #[test]
    fn test_whitespace_in_keyword_is_ignored() {
        let index = sample_index();
        let results = index.search(" 해운대  우동 ");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].display_name(), "우동");
    }

    #[test]
    fn test_keyword_longer_than_any_key() {
        let index = sample_index();
        assert!(index.search("서울특별시종로구청운동청운동").is_empty());
    }

    #[test]
    fn test_results_capped_and_ordered() {
        let names: Vec<String> = (0..25).map(|i| format!("경기도-시{:02}", i)).collect();
        let index = DistrictSearchIndex::from_raw_names(&names, '-');

        let results = index.search("경기");
        assert_eq!(results.len(), DEFAULT_SEARCH_LIMIT);
        let shown: Vec<&str> = results.iter().map(|r| r.display_name()).collect();
        assert_eq!(shown[0], "시00");
        assert_eq!(shown[9], "시09");

        assert_eq!(index.search_with_limit("경기", 3).len(), 3);
        assert!(index.search_with_limit("경기", 0).is_empty());
    }

    #[test]
    fn test_every_result_matches_keyword() {
        let index = DistrictSearchIndex::embedded().unwrap();
        for keyword in ["구동", "서울", "해 운", "중", "시"] {
            let pattern: String = keyword.chars().filter(|c| !c.is_whitespace()).collect();
            let results = index.search(keyword);
            assert!(results.len() <= DEFAULT_SEARCH_LIMIT);
            for record in results {
                assert!(is_subsequence(record.search_key(), &pattern));
            }
        }
    }

    #[test]
    fn test_embedded_dataset_loads() {
        let index = DistrictSearchIndex::embedded().unwrap();
        assert!(!index.is_empty());
        assert!(index.search("청운").iter().any(|r| r.display_name() == "청운동"));
    }

    #[test]
    fn test_from_json_str_rejects_garbage() {
        let result = DistrictSearchIndex::from_json_str("{not json", '-');
        assert!(matches!(result, Err(DatasetError::Parse(_))));
    }
}
