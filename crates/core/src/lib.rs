//! entity-dsl-core: parser and model builder for the entity definition language.
//!
//! Turns a set of entity texts into a [`Model`]: entities, fields with their
//! annotations and tags, foreign keys and links. No file access is done
//! here; callers hand over `(entity name, text)` pairs.
//!
//! # Public API
//!
//! - [`build_model()`] -- run the whole pipeline
//! - [`parse_entity()`] -- parse one entity against a known name set
//! - [`render_entity()`] / [`render_model()`] -- back to entity text
//! - [`DslError`] / [`ModelErrors`] -- parsing errors
//! - model types: [`Model`], [`Entity`], [`Field`], [`Link`], [`ForeignKey`]
//!
//! Passes:
//!
//! 1. [`pass1_names`] -- entity names
//! 2. [`pass2_entities`] -- lexer, field blocks, field grammar, annotations
//! 3. [`pass3_annotations`] -- entity and attribute annotation effects
//! 4. [`pass4_foreign_keys`] -- foreign keys from `@FK`
//! 5. [`pass5_links`] -- links and join information
//! 6. [`pass6_render`] -- rendering

pub mod annotations;
pub mod assemble;
pub mod error;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod pass1_names;
pub mod pass2_entities;
pub mod pass3_annotations;
pub mod pass4_foreign_keys;
pub mod pass5_links;
pub mod pass6_render;

// ── Convenience re-exports: key types ────────────────────────────────

pub use annotations::AnnotationKind;
pub use assemble::EntitySource;
pub use error::{DslError, ModelErrors};
pub use model::{
    Annotation, AnnotationParam, Cardinality, Entity, Field, FieldType, ForeignKey, Link, Model,
    NeutralType, Scope, Tag,
};
pub use pass1_names::EntityNames;

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use assemble::build_model;
pub use parser::parse_entity;
pub use pass6_render::{render_entity, render_model};
