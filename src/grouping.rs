//! Orphan grouping by image identifier.

use crate::error::Result;
use crate::scanner::{ImageId, OrphanFile};
use chrono::{DateTime, Utc};
use globset::{GlobBuilder, GlobMatcher};
use std::collections::BTreeMap;
use std::path::Path;

/// All orphaned files sharing one identifier, smallest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanGroup {
    image_id: ImageId,
    files: Vec<OrphanFile>,
    total_size_bytes: u64,
    latest_modified: DateTime<Utc>,
}

impl OrphanGroup {
    pub fn image_id(&self) -> ImageId {
        self.image_id
    }

    /// Members in ascending size order (ties keep discovery order)
    pub fn files(&self) -> &[OrphanFile] {
        &self.files
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.total_size_bytes
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn latest_modified(&self) -> DateTime<Utc> {
        self.latest_modified
    }

    /// The smallest member. Groups are never empty.
    pub fn thumbnail(&self) -> &OrphanFile {
        &self.files[0]
    }

    pub fn formats(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.format.as_str()).collect()
    }
}

/// Partition orphans by identifier.
///
/// Groups come out in ascending identifier order. The result depends only on
/// the input sequence.
pub fn group_orphans(orphans: Vec<OrphanFile>) -> Vec<OrphanGroup> {
    let mut partitions: BTreeMap<ImageId, Vec<OrphanFile>> = BTreeMap::new();
    for orphan in orphans {
        partitions.entry(orphan.image_id).or_default().push(orphan);
    }

    partitions
        .into_iter()
        .map(|(image_id, mut files)| {
            // sort_by_key is stable
            files.sort_by_key(|f| f.size_bytes);
            let total_size_bytes = files.iter().map(|f| f.size_bytes).sum();
            let latest_modified = files
                .iter()
                .map(|f| f.modified)
                .max()
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            OrphanGroup {
                image_id,
                files,
                total_size_bytes,
                latest_modified,
            }
        })
        .collect()
}

/// Totals across every group, for report headers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrphanSummary {
    pub groups: usize,
    pub files: usize,
    pub total_size_bytes: u64,
}

impl OrphanSummary {
    pub fn from_groups(groups: &[OrphanGroup]) -> Self {
        Self {
            groups: groups.len(),
            files: groups.iter().map(|g| g.file_count()).sum(),
            total_size_bytes: groups.iter().map(|g| g.total_size_bytes()).sum(),
        }
    }
}

/// Listing filter over a group's identifier and member file names.
///
/// Matching is case-insensitive against `"<id> <name> <name> ..."`. A query
/// containing `*` is a wildcard pattern that may match anywhere in that text;
/// any other query is a plain substring.
#[derive(Debug, Clone)]
pub struct GroupFilter {
    query: String,
    glob: Option<GlobMatcher>,
}

impl GroupFilter {
    /// `Ok(None)` for a blank query, which matches every group.
    pub fn parse(query: &str) -> Result<Option<Self>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(None);
        }

        let glob = if query.contains('*') {
            // Only `*` is special; runs of it collapse since `**` means something else
            let literal: Vec<String> = query
                .split('*')
                .filter(|piece| !piece.is_empty())
                .map(globset::escape)
                .collect();
            let pattern = format!("*{}*", literal.join("*"));
            let matcher = GlobBuilder::new(&pattern)
                .case_insensitive(true)
                .literal_separator(false)
                .backslash_escape(false)
                .build()?
                .compile_matcher();
            Some(matcher)
        } else {
            None
        };

        Ok(Some(Self { query, glob }))
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self, group: &OrphanGroup) -> bool {
        let text = search_text(group);
        match &self.glob {
            Some(glob) => glob.is_match(Path::new(&text)),
            None => text.contains(&self.query),
        }
    }
}

fn search_text(group: &OrphanGroup) -> String {
    let mut text = group.image_id().to_string();
    for file in group.files() {
        text.push(' ');
        text.push_str(&file.filename);
    }
    text.to_lowercase()
}

/// Keep the groups `filter` matches; everything when there is no filter.
pub fn filter_groups(groups: Vec<OrphanGroup>, filter: Option<&GroupFilter>) -> Vec<OrphanGroup> {
    match filter {
        Some(filter) => groups.into_iter().filter(|g| filter.matches(g)).collect(),
        None => groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn orphan(id: u64, name: &str, size: u64, mtime_secs: i64) -> OrphanFile {
        OrphanFile {
            absolute_path: PathBuf::from("/img/p").join(name),
            relative_path: PathBuf::from(name),
            filename: name.to_string(),
            image_id: ImageId::new(id).unwrap(),
            format: "original".to_string(),
            size_bytes: size,
            modified: Utc.timestamp_opt(mtime_secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_groups_sorted_by_id_and_files_by_size() {
        let groups = group_orphans(vec![
            orphan(12, "12-large.jpg", 900, 100),
            orphan(3, "3-large.jpg", 2000, 50),
            orphan(12, "12-small.jpg", 10, 300),
            orphan(3, "3-small.jpg", 500, 70),
        ]);

        let ids: Vec<u64> = groups.iter().map(|g| g.image_id().get()).collect();
        assert_eq!(ids, vec![3, 12]);

        let first = &groups[0];
        assert_eq!(first.file_count(), 2);
        assert_eq!(first.total_size_bytes(), 2500);
        assert_eq!(first.thumbnail().filename, "3-small.jpg");
        assert_eq!(first.latest_modified().timestamp(), 70);

        let second = &groups[1];
        assert_eq!(second.thumbnail().filename, "12-small.jpg");
        assert_eq!(second.latest_modified().timestamp(), 300);
    }

    #[test]
    fn test_equal_sizes_keep_discovery_order() {
        let groups = group_orphans(vec![
            orphan(5, "b.jpg", 100, 0),
            orphan(5, "a.jpg", 100, 0),
            orphan(5, "c.jpg", 50, 0),
        ]);
        let names: Vec<&str> = groups[0].files().iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["c.jpg", "b.jpg", "a.jpg"]);
    }

    #[test]
    fn test_totals_match_input() {
        let input = vec![
            orphan(1, "1.jpg", 11, 0),
            orphan(2, "2.jpg", 22, 0),
            orphan(2, "2-x.jpg", 33, 0),
            orphan(9, "9.jpg", 0, 0),
        ];
        let expected: u64 = input.iter().map(|o| o.size_bytes).sum();
        let groups = group_orphans(input);
        let summary = OrphanSummary::from_groups(&groups);

        assert_eq!(summary.total_size_bytes, expected);
        assert_eq!(summary.files, 4);
        assert_eq!(summary.groups, 3);
        for group in &groups {
            assert!(group.files().windows(2).all(|w| w[0].size_bytes <= w[1].size_bytes));
            assert!(group.files().iter().all(|f| f.image_id == group.image_id()));
        }
        assert!(groups.windows(2).all(|w| w[0].image_id() < w[1].image_id()));
    }

    #[test]
    fn test_empty_input() {
        assert!(group_orphans(Vec::new()).is_empty());
        assert_eq!(OrphanSummary::from_groups(&[]), OrphanSummary::default());
    }

    fn filter(query: &str) -> GroupFilter {
        GroupFilter::parse(query).unwrap().unwrap()
    }

    fn sample_groups() -> Vec<OrphanGroup> {
        group_orphans(vec![
            orphan(12, "12-home_default.jpg", 10, 0),
            orphan(12, "12.jpg", 20, 0),
            orphan(305, "305-cart_default.webp", 5, 0),
            orphan(7, "7.png", 1, 0),
        ])
    }

    fn ids(groups: &[OrphanGroup]) -> Vec<u64> {
        groups.iter().map(|g| g.image_id().get()).collect()
    }

    #[test]
    fn test_blank_filter_matches_everything() {
        assert!(GroupFilter::parse("   ").unwrap().is_none());
        assert_eq!(ids(&filter_groups(sample_groups(), None)), vec![7, 12, 305]);
    }

    #[test]
    fn test_substring_filter_on_id_and_names() {
        let by_id = filter("30");
        assert_eq!(ids(&filter_groups(sample_groups(), Some(&by_id))), vec![305]);

        let by_name = filter("  HOME_Default ");
        assert_eq!(by_name.query(), "home_default");
        assert_eq!(ids(&filter_groups(sample_groups(), Some(&by_name))), vec![12]);

        let nothing = filter("missing");
        assert!(filter_groups(sample_groups(), Some(&nothing)).is_empty());
    }

    #[test]
    fn test_wildcard_filter_matches_anywhere() {
        let webp = filter("*.webp");
        assert_eq!(ids(&filter_groups(sample_groups(), Some(&webp))), vec![305]);

        let defaults = filter("*_default*");
        assert_eq!(ids(&filter_groups(sample_groups(), Some(&defaults))), vec![12, 305]);

        let collapsed = filter("**web**");
        assert_eq!(ids(&filter_groups(sample_groups(), Some(&collapsed))), vec![305]);

        let spanning = filter("12*.jpg");
        assert_eq!(ids(&filter_groups(sample_groups(), Some(&spanning))), vec![12]);
    }

    #[test]
    fn test_wildcard_filter_treats_other_characters_literally() {
        let groups = group_orphans(vec![orphan(4, "4-[a].jpg", 1, 0), orphan(5, "5-a.jpg", 1, 0)]);

        let brackets = filter("*[a]*");
        assert_eq!(ids(&filter_groups(groups.clone(), Some(&brackets))), vec![4]);

        let question = filter("5?a*");
        assert!(filter_groups(groups, Some(&question)).is_empty());
    }
}
