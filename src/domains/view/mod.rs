pub mod types;
pub mod pipeline;

pub use types::{
    SortDirection, SortKey, SortSpec, SortValue, ViewQuery, Viewable, CATEGORY_WILDCARD, MAX_SEARCH_TEXT_LENGTH,
};
pub use pipeline::{view, view_with_wildcard};
