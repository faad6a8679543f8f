use serde::{Deserialize, Serialize};

/// A parsing error. Every error names the entity it was raised for; field-level
/// errors also name the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DslError {
    /// No specific field context (entity header, entity identifier, ...).
    #[error("{entity} : {message}")]
    Entity { entity: String, message: String },

    /// Tied to one named field.
    #[error("{entity}.{field} : {message}")]
    Field {
        entity: String,
        field: String,
        message: String,
    },

    /// Malformed entity structure. Fatal: the rest of the entity is not parsed.
    #[error("{entity} (line {line}) : {message}")]
    Structure {
        entity: String,
        line: u32,
        message: String,
    },
}

impl DslError {
    pub fn entity(entity: &str, message: impl Into<String>) -> Self {
        DslError::Entity {
            entity: entity.to_owned(),
            message: message.into(),
        }
    }

    pub fn field(entity: &str, field: &str, message: impl Into<String>) -> Self {
        DslError::Field {
            entity: entity.to_owned(),
            field: field.to_owned(),
            message: message.into(),
        }
    }

    pub fn structure(entity: &str, line: u32, message: impl Into<String>) -> Self {
        DslError::Structure {
            entity: entity.to_owned(),
            line,
            message: message.into(),
        }
    }

    pub fn entity_name(&self) -> &str {
        match self {
            DslError::Entity { entity, .. }
            | DslError::Field { entity, .. }
            | DslError::Structure { entity, .. } => entity,
        }
    }

    pub fn field_name(&self) -> Option<&str> {
        match self {
            DslError::Field { field, .. } => Some(field),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            DslError::Entity { message, .. }
            | DslError::Field { message, .. }
            | DslError::Structure { message, .. } => message,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, DslError::Structure { .. })
    }

    /// Serialize to JSON with every key present (null when absent).
    pub fn to_json_value(&self) -> serde_json::Value {
        let line = match self {
            DslError::Structure { line, .. } => Some(*line),
            _ => None,
        };
        serde_json::json!({
            "entity":  self.entity_name(),
            "field":   self.field_name(),
            "fatal":   self.is_fatal(),
            "line":    line,
            "message": self.message(),
        })
    }
}

/// Where an error is raised: inside an entity, optionally inside one field.
///
/// Decides between entity-level and field-level errors.
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext<'a> {
    pub entity: &'a str,
    pub field: Option<&'a str>,
}

impl<'a> ErrorContext<'a> {
    pub fn for_entity(entity: &'a str) -> Self {
        ErrorContext {
            entity,
            field: None,
        }
    }

    pub fn for_field(entity: &'a str, field: &'a str) -> Self {
        ErrorContext {
            entity,
            field: Some(field),
        }
    }

    pub fn error(&self, message: impl Into<String>) -> DslError {
        match self.field {
            Some(field) => DslError::field(self.entity, field, message),
            None => DslError::entity(self.entity, message),
        }
    }
}

/// Accumulator for recoverable errors, threaded through the passes so that one
/// run reports every problem instead of stopping at the first.
#[derive(Debug, Default, Clone)]
pub struct Errors {
    items: Vec<DslError>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: DslError) {
        tracing::debug!(%error, "parsing error collected");
        self.items.push(error);
    }

    /// Keep the `Ok` value, record the `Err`.
    pub fn collect<T>(&mut self, result: Result<T, DslError>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.push(e);
                None
            }
        }
    }

    pub fn extend(&mut self, other: Errors) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DslError> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<DslError> {
        self.items
    }
}

/// All the errors found while building a model, in discovery order.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} error(s) found in model", .0.len())]
pub struct ModelErrors(pub Vec<DslError>);

impl ModelErrors {
    pub fn errors(&self) -> &[DslError] {
        &self.0
    }

    /// Errors raised for one entity.
    pub fn for_entity<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a DslError> {
        self.0.iter().filter(move |e| e.entity_name() == entity)
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::Value::Array(self.0.iter().map(DslError::to_json_value).collect())
    }
}

impl From<Errors> for ModelErrors {
    fn from(errors: Errors) -> Self {
        ModelErrors(errors.into_vec())
    }
}
