use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sqltpl::{expand_template, params_from_json, simplified_to_json, ExpandOptions, ExpandPolicy, ParamMap};

#[derive(Parser)]
#[command(name = "sqltpl")]
#[command(author, version, about = "SQL template preprocessor with conditional comment tags")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a SQL template against a set of named parameters
    Expand {
        /// Inline SQL text, or a path to a template file ending in .sql
        #[arg(short, long)]
        template: String,

        /// Path to a JSON file with the parameter map
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Print the flattened bind map as JSON after the SQL
        #[arg(short, long)]
        bindings: bool,

        /// Delete unresolved bare :@name tokens instead of keeping them
        #[arg(long)]
        drop_unresolved: bool,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Expand {
            template,
            params,
            bindings,
            drop_unresolved,
            verbose,
        } => {
            let params = match params {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read params file: {}", path.display()))?;
                    let doc = serde_json::from_str(&text)
                        .with_context(|| format!("Invalid JSON in params file: {}", path.display()))?;
                    params_from_json(&doc)?
                }
                None => ParamMap::new(),
            };

            let options = ExpandOptions {
                source: template,
                params,
                policy: ExpandPolicy {
                    keep_unresolved_tokens: !drop_unresolved,
                },
                verbose,
            };

            let expanded = expand_template(options)?;
            println!("{}", expanded.sql());

            if bindings {
                let json = simplified_to_json(expanded.simplified_params());
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
        }
    }

    Ok(())
}
