//! The template engine: tagged-comment rewriting and placeholder expansion.
//!
//! Tag syntax recognized in the SQL text:
//! - multi-line: `/*name body */` — body may span lines
//! - single-line: `--*name rest-of-line`
//! - bare array token outside any comment: `:@name`
//!
//! A tag name may be a `|`-joined alternative list (`a|b`): if any alternative
//! is a known parameter the body is kept verbatim, otherwise the whole region
//! is dropped. A single-name tag is dropped when the parameter is absent and
//! kept (with placeholder substitution applied to the body) when present.

mod flatten;
mod loader;

pub use flatten::simplify;
pub use loader::load_template;

use std::fmt;
use std::path::Path;
use std::sync::{LazyLock, OnceLock};

use regex::Regex;

use crate::error::TemplateError;
use crate::params::{BindMode, ParamMap, ParamValue, Payload, SimplifiedParams};
use crate::util::replace_all_ci;

// Word characters are ASCII here, as are `:@name` tokens; see replace_all_ci.
static MULTI_LINE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Non-greedy body: inline code like `WHEN 700 /*float4*/ THEN 24
    // /*FLT_MANT_DIG*/` must parse as two comments, not one spanning the THEN
    // clause. The flip side: code between two adjacent tagged comments can be
    // absorbed into the first one's body.
    Regex::new(r"(?s)/\*([0-9A-Za-z_|]+)(.*?)\*/").unwrap()
});

static SINGLE_LINE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--\*([0-9A-Za-z_|]+)(.+)").unwrap());

static BARE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":@([0-9A-Za-z_]+)").unwrap());

static NEWLINE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+").unwrap());

/// Policy knobs for template expansion.
#[derive(Debug, Clone, Copy)]
pub struct ExpandPolicy {
    /// Leave unresolved bare `:@name` tokens in place instead of deleting
    /// them. Tagged comments are unaffected: an unresolved comment tag is
    /// always dropped.
    pub keep_unresolved_tokens: bool,
}

impl Default for ExpandPolicy {
    fn default() -> Self {
        Self {
            keep_unresolved_tokens: true,
        }
    }
}

/// A preprocessed SQL template.
///
/// Construction performs all rewriting; afterwards the instance is immutable.
/// [`Template::simplified_params`] is computed on first use and cached.
#[derive(Debug)]
pub struct Template {
    sql: String,
    params: ParamMap,
    simplified: OnceLock<SimplifiedParams>,
}

impl Template {
    /// Build a template from inline SQL text or (when `source` ends in
    /// `.sql`) from a file, under the default policy.
    pub fn new(source: &str, params: ParamMap) -> Result<Self, TemplateError> {
        Self::with_policy(source, params, ExpandPolicy::default())
    }

    pub fn with_policy(
        source: &str,
        params: ParamMap,
        policy: ExpandPolicy,
    ) -> Result<Self, TemplateError> {
        let text = if loader::is_template_path(source) {
            loader::load_template(Path::new(source))?
        } else {
            source.to_string()
        };

        let mut template = Self {
            sql: text,
            params,
            simplified: OnceLock::new(),
        };
        template.rewrite(policy);
        Ok(template)
    }

    /// The final rewritten SQL.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The flattened bind map matching the placeholders in [`Template::sql`].
    pub fn simplified_params(&self) -> &SimplifiedParams {
        self.simplified.get_or_init(|| simplify(&self.params))
    }

    /// Run the rewrite passes over the owned buffer. Each pass collects all
    /// matches first and then splices replacements, never scanning and
    /// mutating at once.
    fn rewrite(&mut self, policy: ExpandPolicy) {
        // Multi-line tags: exactly one pass.
        for (full, name, body) in collect_tags(&MULTI_LINE_TAG_RE, &self.sql) {
            self.resolve_tag(&full, &name, &body, true);
        }

        // Single-line tags nest on one physical line (`--*a --*b sql`), so
        // iterate full rounds until a round finds nothing. Every matched tag
        // is consumed by its round, and placeholder substitution cannot mint
        // a new `--*` marker, so only tags nested inside kept bodies survive
        // into the next round and the loop terminates.
        loop {
            let tags = collect_tags(&SINGLE_LINE_TAG_RE, &self.sql);
            if tags.is_empty() {
                break;
            }
            for (full, name, body) in tags {
                self.resolve_tag(&full, &name, &body, true);
            }
        }

        // Bare array tokens that were never inside a comment. The token text
        // doubles as the tag body, so a resolved token is substituted in
        // place and an unresolved one is kept or dropped per policy.
        let tokens: Vec<(String, String)> = BARE_TOKEN_RE
            .captures_iter(&self.sql)
            .map(|caps| (caps[0].to_string(), caps[1].to_string()))
            .collect();
        for (full, name) in tokens {
            self.resolve_tag(&full, &name, &full, !policy.keep_unresolved_tokens);
        }

        self.sql = normalize_whitespace(&self.sql);
    }

    /// Resolve one tagged region and splice its replacement over the first
    /// literal occurrence of the matched text. Byte-identical duplicate tags
    /// therefore all end up with the same replacement — deterministic and
    /// accepted.
    fn resolve_tag(&mut self, full: &str, name_expr: &str, body: &str, replace_not_found: bool) {
        let replacement = self.render_tag(name_expr, body, replace_not_found);
        self.sql = self.sql.replacen(full, &replacement, 1);
    }

    fn render_tag(&self, name_expr: &str, body: &str, replace_not_found: bool) -> String {
        if name_expr.contains('|') {
            let found = name_expr.split('|').any(|alt| self.params.contains(alt));
            // Alternatives gate the body; no substitution happens inside it.
            return if found { body.to_string() } else { String::new() };
        }

        let Some((canonical, value)) = self.params.lookup(name_expr) else {
            return if replace_not_found {
                String::new()
            } else {
                body.to_string()
            };
        };

        match value {
            ParamValue::Scalar(_) | ParamValue::Typed(..) => {
                replace_token(body, canonical, &format!(":{canonical}"))
            }
            ParamValue::Array { mode, payload } => match mode {
                BindMode::Bind => match payload {
                    Some(Payload::Seq(items)) => {
                        replace_token(body, canonical, &flatten::placeholder_list(canonical, items))
                    }
                    // A scalar payload binds as a single placeholder.
                    Some(Payload::Leaf(_)) => {
                        replace_token(body, canonical, &format!(":{canonical}"))
                    }
                    None => body.to_string(),
                },
                BindMode::Text => {
                    let literal = match payload {
                        Some(Payload::Leaf(scalar)) => scalar.to_string(),
                        _ => String::new(),
                    };
                    replace_all_ci(body, canonical, &literal)
                }
                BindMode::Tuple => match payload {
                    Some(Payload::Seq(rows)) => {
                        replace_token(body, canonical, &flatten::tuple_groups(canonical, rows))
                    }
                    // Degenerate tuple: substitute the value as a literal.
                    Some(Payload::Leaf(scalar)) => {
                        replace_token(body, canonical, &scalar.to_string())
                    }
                    None => body.to_string(),
                },
                BindMode::NoBind => body.to_string(),
            },
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Replace `:@name` tokens (case-insensitive) in a tag body.
fn replace_token(body: &str, name: &str, replacement: &str) -> String {
    replace_all_ci(body, &format!(":@{name}"), replacement)
}

fn collect_tags(pattern: &Regex, sql: &str) -> Vec<(String, String, String)> {
    pattern
        .captures_iter(sql)
        .map(|caps| {
            (
                caps[0].to_string(),
                caps[1].to_string(),
                caps[2].to_string(),
            )
        })
        .collect()
}

/// Trim the whole text and collapse every newline run to a single newline.
/// Idempotent.
fn normalize_whitespace(sql: &str) -> String {
    NEWLINE_RUN_RE.replace_all(sql.trim(), "\n").into_owned()
}
