//! Configuration resolution.
//!
//! A primary YAML document may pull in other documents through a top-level
//! `includes` list. Resolution:
//! 1. **Load** - parse each document, then decrypt `!encrypted` scalars
//! 2. **Traverse** - breadth-first over includes, each file loaded once
//! 3. **Merge** - shallow, top-level only; primary > later include > earlier include
//! 4. **Context** - attach runtime metadata under `context`
//!
//! ## Reserved Keys
//! - `includes` - paths relative to the declaring document; stripped from output
//! - `logging` - `log_dir` and `log_level`, validated before any log file exists
//! - `context` - replaced by the injected runtime context

mod context;
mod diagnostics;
mod graph;
mod loader;
mod merge;
mod merged;
mod resolver;
pub mod value;

pub use context::{CONTEXT_KEY, RuntimeContext, inject_context, script_name};
pub use diagnostics::Diagnostic;
pub use graph::ConfigGraph;
pub use loader::{
    ConfigDocument, DocumentLoader, DocumentSource, INCLUDES_KEY, RawDocument, extract_includes,
    parse_document,
};
pub use merge::{MergeOutcome, merge, merge_documents};
pub use merged::MergedConfig;
pub use resolver::{ConfigResolver, resolve};
pub use value::{ConfigValue, Mapping};
