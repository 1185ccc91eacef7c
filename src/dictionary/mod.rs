//! Keyword dictionaries for the dialect

mod keywords;
mod loader;

pub use keywords::{Keyword, KeywordMap};
