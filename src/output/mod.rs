//! Report formatters for batch results.
//!
//! - text for people (the default)
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use report_merger::config::Config;
//! use report_merger::error::ExitCode;
//! use report_merger::output::JsonReport;
//! use report_merger::pipeline::GroupPipeline;
//!
//! let config = Config::default();
//! let results = GroupPipeline::from_config(&config).unwrap().process_all(&config.groups);
//! let report = JsonReport::new(&results, false, ExitCode::from_results(&results));
//! println!("{}", report.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::{GroupStatus, JsonReport};
pub use text::TextReport;
