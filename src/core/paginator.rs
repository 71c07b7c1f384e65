use crate::core::trend::parse_timestamp;
use crate::domain::model::{Form, FormPage};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_EXPANDED_PAGE_SIZE: usize = 25;
pub const DEFAULT_EXPAND_THRESHOLD: usize = 50;

/// Page size that grows once the list gets long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSizePolicy {
    pub base: usize,
    pub expanded: usize,
    pub threshold: usize,
}

impl Default for PageSizePolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_PAGE_SIZE,
            expanded: DEFAULT_EXPANDED_PAGE_SIZE,
            threshold: DEFAULT_EXPAND_THRESHOLD,
        }
    }
}

impl PageSizePolicy {
    pub fn fixed(size: usize) -> Self {
        Self {
            base: size,
            expanded: size,
            threshold: usize::MAX,
        }
    }

    pub fn page_size_for(&self, count: usize) -> usize {
        if count > self.threshold {
            self.expanded
        } else {
            self.base
        }
    }
}

/// Most recently updated first. Ties and undated forms keep input order,
/// undated forms after every dated one.
pub fn sort_forms(forms: &[Form]) -> Vec<Form> {
    let mut keyed: Vec<_> = forms
        .iter()
        .map(|f| (f.updated_at.as_deref().and_then(parse_timestamp), f))
        .collect();
    // `None < Some(_)`, so reversing the comparison puts undated forms last.
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed.into_iter().map(|(_, f)| f.clone()).collect()
}

/// Slices an already-sorted list. Out-of-range page indices clamp to the
/// first or last page.
pub fn paginate(sorted: &[Form], page_index: usize, page_size: usize) -> FormPage {
    let page_size = page_size.max(1);
    let total_items = sorted.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page_index = page_index.clamp(1, total_pages);

    let start = (page_index - 1) * page_size;
    let end = (start + page_size).min(total_items);
    let items = sorted.get(start..end).map(<[Form]>::to_vec).unwrap_or_default();

    FormPage {
        items,
        page_index,
        page_size,
        total_pages,
        total_items,
    }
}

pub fn sort_and_paginate(forms: &[Form], page_index: usize, page_size: usize) -> FormPage {
    paginate(&sort_forms(forms), page_index, page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(id: &str, updated_at: Option<&str>) -> Form {
        Form {
            id: id.to_string(),
            form_name: format!("Form {}", id),
            updated_at: updated_at.map(str::to_string),
            ..Default::default()
        }
    }

    fn ids(page: &FormPage) -> Vec<&str> {
        page.items.iter().map(|f| f.id.as_str()).collect()
    }

    fn twelve_forms() -> Vec<Form> {
        (1..=12)
            .map(|i| form(&i.to_string(), Some(&format!("2025-08-{:02}T10:00:00Z", i))))
            .collect()
    }

    #[test]
    fn test_sorts_newest_first_with_stable_ties() {
        let forms = vec![
            form("a", Some("2025-08-01T00:00:00Z")),
            form("b", None),
            form("c", Some("2025-09-01T00:00:00Z")),
            form("d", Some("2025-08-01T00:00:00Z")),
            form("e", Some("not a date")),
        ];

        let sorted = sort_forms(&forms);

        let order: Vec<&str> = sorted.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "d", "b", "e"]);
    }

    #[test]
    fn test_pages_slice_sorted_forms() {
        let page = sort_and_paginate(&twelve_forms(), 2, 5);

        assert_eq!(ids(&page), vec!["7", "6", "5", "4", "3"]);
        assert_eq!(page.page_index, 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 12);

        let last = sort_and_paginate(&twelve_forms(), 3, 5);
        assert_eq!(ids(&last), vec!["2", "1"]);
    }

    #[test]
    fn test_out_of_range_pages_clamp() {
        let forms = twelve_forms();

        let first = sort_and_paginate(&forms, 0, 5);
        assert_eq!(first.page_index, 1);
        assert_eq!(ids(&first), vec!["12", "11", "10", "9", "8"]);

        let last = sort_and_paginate(&forms, 9999, 5);
        assert_eq!(last.page_index, 3);
        assert_eq!(ids(&last), vec!["2", "1"]);
    }

    #[test]
    fn test_empty_collection_has_one_empty_page() {
        let page = sort_and_paginate(&[], 4, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page_index, 1);
    }

    #[test]
    fn test_zero_page_size_is_treated_as_one() {
        let page = sort_and_paginate(&twelve_forms(), 1, 0);
        assert_eq!(page.page_size, 1);
        assert_eq!(page.total_pages, 12);
    }

    #[test]
    fn test_page_size_policy_expands_past_threshold() {
        let policy = PageSizePolicy::default();
        assert_eq!(policy.page_size_for(50), 10);
        assert_eq!(policy.page_size_for(51), 25);
        assert_eq!(PageSizePolicy::fixed(7).page_size_for(10_000), 7);
    }

    #[test]
    fn test_same_request_same_page() {
        let forms = twelve_forms();
        assert_eq!(sort_and_paginate(&forms, 2, 4), sort_and_paginate(&forms, 2, 4));
    }
}
