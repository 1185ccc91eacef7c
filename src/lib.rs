//! Tsar - Python with dialect keywords, run in a sandbox
//!
//! Tsar rewrites source written with dialect keywords into plain Python and
//! runs the result inside an isolated, resource-capped process.
//!
//! # Example
//!
//! ```no_run
//! use tsar::{KeywordMap, Translator};
//! use tsar::sandbox::{DockerBoundary, ExecutionRequest, Executor};
//!
//! let translator = Translator::new(KeywordMap::builtin());
//! let python = translator.translate("выведи(истина)");
//! assert_eq!(python, "print(True)");
//!
//! let executor = Executor::new(DockerBoundary::new());
//! let result = executor.run(&ExecutionRequest::new(python));
//! println!("{}", result.stdout);
//! ```

pub mod cli;
pub mod dictionary;
pub mod error;
pub mod output;
pub mod sandbox;
pub mod translator;

pub use dictionary::KeywordMap;
pub use error::{Result, TsarError};
pub use output::{format_report, format_words, OutputFormat, Report};
pub use sandbox::{ExecutionRequest, ExecutionResult, Executor};
pub use translator::Translator;
