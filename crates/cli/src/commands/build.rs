use std::path::Path;

use entity_dsl_core::Model;

use super::build_or_exit;
use crate::OutputFormat;

pub(crate) fn cmd_build(path: &Path, output: OutputFormat, quiet: bool) {
    let model = build_or_exit(path, output, quiet);
    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(&model)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => print_summary(&model),
    }
}

fn print_summary(model: &Model) {
    println!("Model {} ({} entities)", model.name, model.entities.len());
    for entity in &model.entities {
        println!(
            "  {}: {} fields, {} foreign keys, {} links",
            entity.name,
            entity.fields.len(),
            entity.foreign_keys.len(),
            entity.links.len()
        );
        for link in &entity.links {
            let side = if link.owning_side { "owning" } else { "inverse" };
            println!(
                "    {} -> {} ({:?}, {})",
                link.field_name, link.target_entity, link.cardinality, side
            );
        }
    }
}
