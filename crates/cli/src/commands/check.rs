use std::path::Path;
use std::process;

use entity_dsl_core::build_model;

use super::{load_or_exit, report_model_errors};
use crate::OutputFormat;

pub(crate) fn cmd_check(path: &Path, output: OutputFormat, quiet: bool) {
    let loaded = load_or_exit(path, output, quiet);

    match build_model(&loaded.name, &loaded.sources) {
        Ok(model) => {
            if quiet {
                return;
            }
            match output {
                OutputFormat::Json => {
                    let result = serde_json::json!({
                        "model": model.name,
                        "entities": model.entities.len(),
                        "errors": [],
                    });
                    let pretty = serde_json::to_string_pretty(&result)
                        .unwrap_or_else(|e| format!("serialization error: {}", e));
                    println!("{}", pretty);
                }
                OutputFormat::Text => {
                    println!(
                        "model '{}' is valid ({} entities)",
                        model.name,
                        model.entities.len()
                    );
                }
            }
        }
        Err(errors) => {
            report_model_errors(&errors, output, quiet);
            process::exit(1);
        }
    }
}
