//! Pass 3: apply entity-scoped and attribute-scoped annotations.
//!
//! Link-scoped annotations are applied in pass 5, once links exist.

use crate::annotations::apply;
use crate::error::{ErrorContext, Errors};
use crate::model::{Entity, Scope};

pub fn apply_annotations(entities: &mut [Entity], errors: &mut Errors) {
    for entity in entities.iter_mut() {
        apply_entity_annotations(entity, errors);
        apply_attribute_annotations(entity, errors);
    }
}

fn apply_entity_annotations(entity: &mut Entity, errors: &mut Errors) {
    let ctx = ErrorContext::for_entity(&entity.name);
    for annotation in &entity.annotations {
        tracing::trace!(entity = %entity.name, annotation = annotation.name(), "apply");
        if let Err(msg) = apply::apply_to_entity(annotation, &mut entity.props) {
            errors.push(ctx.error(msg));
        }
    }
}

fn apply_attribute_annotations(entity: &mut Entity, errors: &mut Errors) {
    for field in entity.fields.iter_mut() {
        if field.scope() != Scope::Attribute {
            continue;
        }
        let ctx = ErrorContext::for_field(&entity.name, &field.name);
        for annotation in &field.annotations {
            tracing::trace!(
                entity = %entity.name,
                field = %field.name,
                annotation = annotation.name(),
                "apply"
            );
            if let Err(msg) = apply::apply_to_attribute(annotation, &mut field.attribute) {
                errors.push(ctx.error(format!("@{} : {}", annotation.name(), msg)));
            }
        }
    }
}
