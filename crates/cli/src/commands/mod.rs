mod build;
mod check;
mod render;

pub(crate) use build::cmd_build;
pub(crate) use check::cmd_check;
pub(crate) use render::cmd_render;

use std::path::Path;
use std::process;

use entity_dsl_core::{build_model, Model, ModelErrors};

use crate::model_dir::{load_model, LoadedModel};
use crate::{report_error, OutputFormat};

/// Load the model files, or report and exit 1.
fn load_or_exit(path: &Path, output: OutputFormat, quiet: bool) -> LoadedModel {
    match load_model(path) {
        Ok(m) => m,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }
}

/// Load and build the model, or report its errors and exit 1.
fn build_or_exit(path: &Path, output: OutputFormat, quiet: bool) -> Model {
    let loaded = load_or_exit(path, output, quiet);
    match build_model(&loaded.name, &loaded.sources) {
        Ok(model) => model,
        Err(errors) => {
            report_model_errors(&errors, output, quiet);
            process::exit(1);
        }
    }
}

fn report_model_errors(errors: &ModelErrors, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&errors.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{}\"}}", errors));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            for e in errors.errors() {
                eprintln!("{}", e);
            }
            eprintln!("{}", errors);
        }
    }
}
