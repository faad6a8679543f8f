use std::path::Path;
use std::process;

use entity_dsl_core::render_model;

use super::build_or_exit;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_render(path: &Path, entity: Option<&str>, output: OutputFormat, quiet: bool) {
    let model = build_or_exit(path, output, quiet);
    let mut rendered = render_model(&model);

    if let Some(name) = entity {
        rendered.retain(|s| s.name == name);
        if rendered.is_empty() {
            let msg = format!("entity '{}' not found in model '{}'", name, model.name);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }

    match output {
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(&rendered)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            let texts: Vec<&str> = rendered.iter().map(|s| s.content.as_str()).collect();
            print!("{}", texts.join("\n"));
        }
    }
}
