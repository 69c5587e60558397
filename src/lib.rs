//! sqltpl: a SQL template preprocessor
//!
//! Takes SQL text containing tagged comments plus a set of named parameters
//! and produces the final SQL (conditional fragments kept or dropped, array
//! parameters expanded into uniquely-named placeholders, literal text
//! substituted) together with the flattened bind map a driver needs.
//!
//! This is not a SQL parser: the engine only understands the comment tag
//! syntax and `:@name` tokens, and never validates or executes queries.

pub mod error;
pub mod params;
pub mod template;
mod util;

use anyhow::Result;

pub use error::TemplateError;
pub use params::{
    params_from_json, simplified_to_json, BindMode, BoundValue, ParamMap, ParamValue, Payload,
    Scalar, SimplifiedParams,
};
pub use template::{simplify, ExpandPolicy, Template};

/// Options for one template expansion
#[derive(Debug, Clone, Default)]
pub struct ExpandOptions {
    /// Inline SQL text, or a path ending in `.sql`
    pub source: String,
    /// Parameters driving tag resolution and placeholder expansion
    pub params: ParamMap,
    pub policy: ExpandPolicy,
    /// Enable verbose output
    pub verbose: bool,
}

/// Expand a template into its final SQL and bind map
pub fn expand_template(options: ExpandOptions) -> Result<Template> {
    if options.verbose {
        println!(
            "Expanding template ({} bytes of source, {} parameters)",
            options.source.len(),
            options.params.len()
        );
    }

    let template = Template::with_policy(&options.source, options.params, options.policy)?;

    if options.verbose {
        println!("Rewrote SQL to {} bytes", template.sql().len());
        println!(
            "Flattened {} bind parameters",
            template.simplified_params().len()
        );
    }

    Ok(template)
}
