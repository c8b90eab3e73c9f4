//! Command-line front end.

pub mod commands;
pub mod id_resolver;
pub mod output;
pub mod types;

use console::style;

use crate::adapters::JsonFileStateStore;
use crate::domain::errors::WorkflowError;
use crate::domain::models::Config;

pub use types::{Cli, Commands};

/// State store at the configured path.
pub fn open_store(config: &Config) -> JsonFileStateStore {
    JsonFileStateStore::new(&config.store.state_file)
}

/// Report a command failure and exit with status 1.
///
/// Rejected transitions also list the triggers that were legal.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let legal = err
        .downcast_ref::<WorkflowError>()
        .and_then(WorkflowError::legal_triggers);

    if json_mode {
        let mut body = serde_json::json!({ "error": format!("{err:#}") });
        if let Some(triggers) = &legal {
            body["legal_triggers"] = serde_json::json!(triggers);
        }
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", style("error:").red().bold());
        if let Some(triggers) = legal {
            let names: Vec<&str> = triggers.iter().map(|t| t.as_str()).collect();
            if names.is_empty() {
                eprintln!("  {}", style("no triggers are legal from this state").dim());
            } else {
                eprintln!("  {} {}", style("legal triggers:").yellow(), names.join(", "));
            }
        }
    }

    std::process::exit(1)
}
