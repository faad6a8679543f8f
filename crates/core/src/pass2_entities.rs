//! Pass 2: entity parsing -- each entity text is parsed on its own against
//! the pass-1 name set. Fatal structure errors drop the entity; the other
//! errors are collected and the entity is kept.

use crate::assemble::EntitySource;
use crate::error::Errors;
use crate::model::Entity;
use crate::parser;
use crate::pass1_names::EntityNames;

pub fn parse_entities(
    sources: &[&EntitySource],
    entity_names: &EntityNames,
    errors: &mut Errors,
) -> Vec<Entity> {
    let mut entities = Vec::with_capacity(sources.len());
    for source in sources {
        match parser::parse_entity(&source.name, &source.content, entity_names) {
            Ok((entity, entity_errors)) => {
                errors.extend(entity_errors);
                entities.push(entity);
            }
            Err(fatal) => {
                tracing::debug!(entity = %source.name, "entity dropped after fatal error");
                errors.push(fatal);
            }
        }
    }
    entities
}
