//! Dialect -> Python translation

mod rewriter;

pub use rewriter::Translator;
