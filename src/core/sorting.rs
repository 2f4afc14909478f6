//! Ordering and windowing shared by every listing mode.

use super::{CoreError, EntryRecord};
use std::cmp::Ordering;

/// The fields a listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Size,
    ModifiedTime,
    CreatedTime,
    FileType,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Name,
        SortField::Size,
        SortField::ModifiedTime,
        SortField::CreatedTime,
        SortField::FileType,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Size => "size",
            SortField::ModifiedTime => "modified_time",
            SortField::CreatedTime => "created_time",
            SortField::FileType => "file_type",
        }
    }

    /// Parses a query value. An empty string means "keep traversal order".
    pub fn parse(raw: &str) -> Result<Option<Self>, CoreError> {
        if raw.is_empty() {
            return Ok(None);
        }
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == raw)
            .map(Some)
            .ok_or_else(|| CoreError::InvalidSortField(raw.to_string()))
    }

    fn compare(self, a: &EntryRecord, b: &EntryRecord) -> Ordering {
        match self {
            SortField::Name => a.name.as_bytes().cmp(b.name.as_bytes()),
            SortField::Size => a.size.cmp(&b.size),
            SortField::ModifiedTime => a.modified_time.cmp(&b.modified_time),
            SortField::CreatedTime => a.created_time.cmp(&b.created_time),
            SortField::FileType => a.file_type.as_bytes().cmp(b.file_type.as_bytes()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Only the exact value `desc` sorts descending; anything else is ascending.
    pub fn parse(raw: &str) -> Self {
        if raw == "desc" {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub field: Option<SortField>,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn parse(sort_by: &str, order: &str) -> Result<Self, CoreError> {
        Ok(Self {
            field: SortField::parse(sort_by)?,
            order: SortOrder::parse(order),
        })
    }

    /// Sorts in place with a stable sort, so equal keys keep their input
    /// order in both directions.
    pub fn apply(&self, entries: &mut [EntryRecord]) {
        let Some(field) = self.field else {
            return;
        };
        match self.order {
            SortOrder::Ascending => entries.sort_by(|a, b| field.compare(a, b)),
            SortOrder::Descending => entries.sort_by(|a, b| field.compare(b, a)),
        }
    }
}

/// Returns the window `[skip, skip + limit)` of `entries`.
///
/// A `skip` past the end gives an empty page; `limit <= 0` means no upper bound.
pub fn paginate(entries: Vec<EntryRecord>, skip: usize, limit: i64) -> Vec<EntryRecord> {
    let page = entries.into_iter().skip(skip);
    if limit > 0 {
        page.take(usize::try_from(limit).unwrap_or(usize::MAX)).collect()
    } else {
        page.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(name: &str, size: u64, time: i64, file_type: &str) -> EntryRecord {
        EntryRecord {
            name: name.to_string(),
            full_name: name.to_string(),
            size,
            is_directory: false,
            created_time: time,
            modified_time: time,
            file_type: file_type.to_string(),
            owner: "user1".to_string(),
        }
    }

    fn names(entries: &[EntryRecord]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_parse_fields() {
        assert_eq!(SortField::parse("").unwrap(), None);
        assert_eq!(
            SortField::parse("modified_time").unwrap(),
            Some(SortField::ModifiedTime)
        );
        assert!(matches!(
            SortField::parse("Name"),
            Err(CoreError::InvalidSortField(f)) if f == "Name"
        ));
    }

    #[test]
    fn test_unknown_order_is_ascending() {
        assert_eq!(SortOrder::parse("desc"), SortOrder::Descending);
        assert_eq!(SortOrder::parse("DESC"), SortOrder::Ascending);
        assert_eq!(SortOrder::parse("sideways"), SortOrder::Ascending);
    }

    #[test]
    fn test_name_sort_is_bytewise() {
        let mut entries = vec![
            entry("b.txt", 1, 1, ""),
            entry("B.txt", 1, 1, ""),
            entry("a.txt", 1, 1, ""),
        ];
        SortSpec::parse("name", "asc").unwrap().apply(&mut entries);
        assert_eq!(names(&entries), ["B.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_descending_keeps_ties_in_input_order() {
        let mut entries = vec![
            entry("first", 10, 1, ""),
            entry("big", 99, 1, ""),
            entry("second", 10, 1, ""),
        ];
        SortSpec::parse("size", "desc").unwrap().apply(&mut entries);
        assert_eq!(names(&entries), ["big", "first", "second"]);
    }

    #[test]
    fn test_empty_sort_keeps_order() {
        let mut entries = vec![entry("z", 1, 3, ""), entry("a", 2, 1, "")];
        SortSpec::parse("", "desc").unwrap().apply(&mut entries);
        assert_eq!(names(&entries), ["z", "a"]);
    }

    #[test]
    fn test_paginate_windows() {
        let entries: Vec<_> = (0..5).map(|i| entry(&i.to_string(), i, 0, "")).collect();
        assert_eq!(names(&paginate(entries.clone(), 1, 2)), ["1", "2"]);
        assert_eq!(names(&paginate(entries.clone(), 3, 25)), ["3", "4"]);
        assert_eq!(names(&paginate(entries.clone(), 2, 0)), ["2", "3", "4"]);
        assert_eq!(names(&paginate(entries.clone(), 2, -7)), ["2", "3", "4"]);
        assert!(paginate(entries, 9, 3).is_empty());
    }

    fn arb_entries() -> impl Strategy<Value = Vec<EntryRecord>> {
        prop::collection::vec((0u64..5, 0i64..5, "[a-c]{1,2}"), 0..40).prop_map(|items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (size, time, name))| {
                    let mut e = entry(&name, size, time, if i % 2 == 0 { "video/mp4" } else { "" });
                    // Unique marker so stability can be checked after sorting.
                    e.full_name = i.to_string();
                    e
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_sort_is_ordered_and_stable(
            entries in arb_entries(),
            field_idx in 0usize..5,
            desc in any::<bool>(),
        ) {
            let field = SortField::ALL[field_idx];
            let order = if desc { "desc" } else { "asc" };
            let mut sorted = entries.clone();
            SortSpec::parse(field.as_str(), order).unwrap().apply(&mut sorted);

            prop_assert_eq!(sorted.len(), entries.len());
            for pair in sorted.windows(2) {
                let ord = field.compare(&pair[0], &pair[1]);
                if desc {
                    prop_assert_ne!(ord, Ordering::Less);
                } else {
                    prop_assert_ne!(ord, Ordering::Greater);
                }
                if ord == Ordering::Equal {
                    let a: usize = pair[0].full_name.parse().unwrap();
                    let b: usize = pair[1].full_name.parse().unwrap();
                    prop_assert!(a < b, "equal keys must keep input order");
                }
            }
        }

        #[test]
        fn prop_paginate_matches_slice(
            entries in arb_entries(),
            skip in 0usize..50,
            limit in -3i64..50,
        ) {
            let total = entries.len();
            let page = paginate(entries.clone(), skip, limit);
            let start = skip.min(total);
            let end = if limit > 0 { (start + limit as usize).min(total) } else { total };
            prop_assert_eq!(page, entries[start..end].to_vec());
        }
    }
}
