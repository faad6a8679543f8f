//! Pass 1: entity name collection -- the closed set of names that field
//! types may refer to, built before any entity is parsed.

use crate::assemble::EntitySource;
use crate::error::{DslError, Errors};
use std::collections::BTreeSet;

/// Names of every entity of the model. Read-only once pass 1 is done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityNames(BTreeSet<String>);

impl EntityNames {
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for EntityNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        EntityNames(iter.into_iter().map(Into::into).collect())
    }
}

/// An entity name starts with a letter, then letters, digits or `_`.
pub fn is_valid_entity_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// Collect the entity names. Sources with an invalid or duplicated name are
/// reported and left out; the returned sources are the ones to parse.
pub fn collect_names<'a>(
    sources: &'a [EntitySource],
    errors: &mut Errors,
) -> (EntityNames, Vec<&'a EntitySource>) {
    let mut names = BTreeSet::new();
    let mut accepted = Vec::new();

    for source in sources {
        if !is_valid_entity_name(&source.name) {
            errors.push(DslError::entity(&source.name, "invalid entity name"));
            continue;
        }
        if !names.insert(source.name.clone()) {
            errors.push(DslError::entity(&source.name, "duplicated entity name"));
            continue;
        }
        accepted.push(source);
    }

    tracing::debug!(count = names.len(), "entity names collected");
    (EntityNames(names), accepted)
}
