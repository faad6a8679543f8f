/// Entity parser: one entity text in, one [`Entity`] plus its recoverable
/// errors out. Structural faults abort the entity with a fatal error.
///
/// Type resolution needs the names of every entity of the model, so parsing
/// runs after the name-collection pass.
use crate::error::{DslError, ErrorContext, Errors};
use crate::lexer::{Token, TokenKind};
use crate::model::{Entity, Scope};
use crate::pass1_names::EntityNames;
use std::collections::HashSet;

pub mod block;
pub mod decoration;
pub mod fields;

pub use block::{parse_block, EntityBlock, FieldBlockMachine, FieldTokens, Position};
pub use decoration::DecorationParser;
pub use fields::{resolve_type, FieldProcessor};

// ──────────────────────────────────────────────
// Entry point
// ──────────────────────────────────────────────

/// Parse the text of entity `name`.
///
/// `Err` only for fatal structure errors. Otherwise the entity is returned
/// with every field that could be built, along with the errors found.
pub fn parse_entity(
    name: &str,
    content: &str,
    entity_names: &EntityNames,
) -> Result<(Entity, Errors), DslError> {
    tracing::debug!(entity = name, "parsing entity");
    if content.trim().is_empty() {
        return Err(DslError::structure(name, 0, "no content"));
    }

    let block = parse_block(name, content)?;
    let mut entity = Entity::new(name);
    let mut errors = Errors::new();

    parse_header(&mut entity, &block.header, &mut errors);

    let processor = FieldProcessor::new(name, entity_names);
    let mut seen = HashSet::new();
    for group in &block.fields {
        let Some(field) = processor.process(group, &mut errors) else {
            continue;
        };
        if !seen.insert(field.name.clone()) {
            errors.push(DslError::field(name, &field.name, "duplicated field name"));
            continue;
        }
        entity.fields.push(field);
    }

    if let Some(pending) = &block.unterminated {
        let field = pending.tokens.first().map(|t| t.text.as_str()).unwrap_or_default();
        errors.push(DslError::field(name, field, "';' expected at end of field"));
    }

    tracing::debug!(
        entity = name,
        fields = entity.fields.len(),
        errors = errors.len(),
        "entity parsed"
    );
    Ok((entity, errors))
}

/// Header tokens: entity decorations, then the entity name.
fn parse_header(entity: &mut Entity, header: &[Token], errors: &mut Errors) {
    let ctx = ErrorContext::for_entity(&entity.name);
    let parser = DecorationParser::new(ctx);
    let mut annotations = Vec::new();
    let mut tags = Vec::new();

    for token in header {
        match token.kind {
            TokenKind::Annotation => {
                if let Some(a) = errors.collect(parser.parse_annotation(&token.text, Scope::Entity)) {
                    annotations.push(a);
                }
            }
            TokenKind::Tag => {
                if let Some(t) = errors.collect(parser.parse_tag(&token.text)) {
                    tags.push(t);
                }
            }
            TokenKind::Word if token.text != entity.name => {
                tracing::warn!(
                    entity = %entity.name,
                    declared = %token.text,
                    "entity name in text differs from file name, file name is used"
                );
            }
            TokenKind::Word => {}
            _ => errors.push(ctx.error(format!("unexpected element '{}'", token.text))),
        }
    }

    entity.annotations = annotations;
    entity.tags = tags;
}
