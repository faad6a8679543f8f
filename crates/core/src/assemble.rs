//! Model assembly: a thin orchestrator that runs the passes in order.
//!
//! Every pass runs even when an earlier one reported errors, so that a
//! single build reports as many problems as possible. The model is only
//! returned when no error at all was found.

use crate::error::{Errors, ModelErrors};
use crate::model::Model;
use crate::pass1_names;
use crate::pass2_entities;
use crate::pass3_annotations;
use crate::pass4_foreign_keys;
use crate::pass5_links;
use serde::{Deserialize, Serialize};

/// One entity text and the entity name it was read under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySource {
    pub name: String,
    pub content: String,
}

impl EntitySource {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        EntitySource {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Build the model named `model_name` from its entity texts.
pub fn build_model(model_name: &str, sources: &[EntitySource]) -> Result<Model, ModelErrors> {
    tracing::debug!(model = model_name, entities = sources.len(), "building model");
    let mut errors = Errors::new();

    // Pass 1: closed set of entity names
    let (names, accepted) = pass1_names::collect_names(sources, &mut errors);

    // Pass 2: parse each entity against the name set
    let mut entities = pass2_entities::parse_entities(&accepted, &names, &mut errors);

    // Pass 3: entity and attribute annotations
    pass3_annotations::apply_annotations(&mut entities, &mut errors);

    // Pass 4: foreign keys
    pass4_foreign_keys::build_foreign_keys(&mut entities, &names, &mut errors);

    // Pass 5: links
    pass5_links::build_links(&mut entities, &names, &mut errors);

    if !errors.is_empty() {
        tracing::debug!(model = model_name, errors = errors.len(), "model has errors");
        return Err(errors.into());
    }
    Ok(Model {
        name: model_name.to_owned(),
        entities,
    })
}
