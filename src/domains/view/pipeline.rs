use std::cmp::Ordering;

use crate::domains::view::types::{SortDirection, SortValue, ViewQuery, Viewable, CATEGORY_WILDCARD};

/// Filter and order `items` for display, with "All" as the category wildcard.
///
/// Pure: the input is left untouched and a new vector is returned.
pub fn view<T: Viewable + Clone>(items: &[T], query: &ViewQuery) -> Vec<T> {
    view_with_wildcard(items, query, CATEGORY_WILDCARD)
}

/// Same as [`view`] with a caller-chosen category wildcard.
///
/// Filters run in order text, category, period; the sort is stable so
/// items with equal keys keep their input order.
///
/// The text filter is a plain case-insensitive substring match on the display
/// name. Whitespace is part of the needle; only an empty string disables it.
/// Category and wildcard are compared trimmed and Unicode-lowercased.
pub fn view_with_wildcard<T: Viewable + Clone>(items: &[T], query: &ViewQuery, wildcard: &str) -> Vec<T> {
    let needle = query
        .text
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase);
    let wildcard = wildcard.trim().to_lowercase();
    let category = query
        .category
        .as_deref()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty() && *c != wildcard);
    let spec = query.sort.unwrap_or(T::DEFAULT_SORT);

    let mut keyed: Vec<(SortValue, &T)> = items
        .iter()
        .filter(|item| match &needle {
            Some(needle) => item.display_name().to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .filter(|item| match &category {
            Some(category) => item
                .category()
                .is_some_and(|c| c.trim().to_lowercase() == *category),
            None => true,
        })
        .filter(|item| match &query.within {
            Some(scope) if scope.is_bounded() => item.occurred_at().is_some_and(|at| scope.contains(at)),
            _ => true,
        })
        .map(|item| (item.sort_value(spec.key), item))
        .collect();

    // slice::sort_by is stable
    keyed.sort_by(|(a, _), (b, _)| compare_values(a, b, spec.direction));

    keyed.into_iter().map(|(_, item)| item.clone()).collect()
}

fn compare_values(a: &SortValue, b: &SortValue, direction: SortDirection) -> Ordering {
    match (a.is_missing(), b.is_missing()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match direction {
            SortDirection::Ascending => a.compare_present(b),
            SortDirection::Descending => b.compare_present(a),
        },
    }
}
