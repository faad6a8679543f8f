//! Domain model produced by the parser and consumed by code generators.
//!
//! Every type is serde-serializable so that a built model can be emitted as
//! JSON. Field order, annotation order and tag order follow the source text.

use crate::annotations::AnnotationKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ──────────────────────────────────────────────
// Types
// ──────────────────────────────────────────────

/// The neutral type catalog: DSL primitives independent of any target language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeutralType {
    String,
    Byte,
    Short,
    Int,
    Long,
    Decimal,
    Float,
    Double,
    Boolean,
    Date,
    Time,
    Timestamp,
    Binary,
}

impl NeutralType {
    pub const ALL: &'static [NeutralType] = &[
        NeutralType::String,
        NeutralType::Byte,
        NeutralType::Short,
        NeutralType::Int,
        NeutralType::Long,
        NeutralType::Decimal,
        NeutralType::Float,
        NeutralType::Double,
        NeutralType::Boolean,
        NeutralType::Date,
        NeutralType::Time,
        NeutralType::Timestamp,
        NeutralType::Binary,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NeutralType::String => "string",
            NeutralType::Byte => "byte",
            NeutralType::Short => "short",
            NeutralType::Int => "int",
            NeutralType::Long => "long",
            NeutralType::Decimal => "decimal",
            NeutralType::Float => "float",
            NeutralType::Double => "double",
            NeutralType::Boolean => "boolean",
            NeutralType::Date => "date",
            NeutralType::Time => "time",
            NeutralType::Timestamp => "timestamp",
            NeutralType::Binary => "binary",
        }
    }

    pub fn from_name(name: &str) -> Option<NeutralType> {
        NeutralType::ALL.iter().copied().find(|t| t.name() == name)
    }
}

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Neutral(NeutralType),
    /// Reference to another entity of the model; `collection` for `Name[]`
    Entity { name: String, collection: bool },
}

impl FieldType {
    pub fn is_entity(&self) -> bool {
        matches!(self, FieldType::Entity { .. })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Neutral(t) => f.write_str(t.name()),
            FieldType::Entity { name, collection } => {
                f.write_str(name)?;
                if *collection {
                    f.write_str("[]")?;
                }
                Ok(())
            }
        }
    }
}

// ──────────────────────────────────────────────
// Annotations and tags
// ──────────────────────────────────────────────

/// Kind of model element an annotation is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    Entity,
    Attribute,
    Link,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Entity => "entity",
            Scope::Attribute => "attribute",
            Scope::Link => "link",
        })
    }
}

/// Typed annotation parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationParam {
    Int(i64),
    Text(String),
    List(Vec<String>),
}

impl fmt::Display for AnnotationParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationParam::Int(n) => write!(f, "{}", n),
            AnnotationParam::Text(s) => f.write_str(s),
            AnnotationParam::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

/// A registry-validated annotation, bound to one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: AnnotationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<AnnotationParam>,
    pub scope: Scope,
}

impl Annotation {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn text(&self) -> Option<&str> {
        match &self.parameter {
            Some(AnnotationParam::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn int(&self) -> Option<i64> {
        match &self.parameter {
            Some(AnnotationParam::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn list(&self) -> &[String] {
        match &self.parameter {
            Some(AnnotationParam::List(items)) => items,
            _ => &[],
        }
    }
}

/// Free-form decoration, carried through without interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

// ──────────────────────────────────────────────
// Fields
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStrategy {
    Auto,
    Identity,
    Sequence,
    Table,
}

impl GenerationStrategy {
    pub fn from_name(name: &str) -> Option<GenerationStrategy> {
        match name {
            "AUTO" => Some(GenerationStrategy::Auto),
            "IDENTITY" => Some(GenerationStrategy::Identity),
            "SEQUENCE" => Some(GenerationStrategy::Sequence),
            "TABLE" => Some(GenerationStrategy::Table),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedValue {
    pub strategy: GenerationStrategy,
    pub generator_name: Option<String>,
    pub sequence_name: Option<String>,
    pub table_name: Option<String>,
    pub pk_column_name: Option<String>,
    pub pk_column_value: Option<String>,
    pub value_column_name: Option<String>,
    pub allocation_size: Option<i64>,
}

impl GeneratedValue {
    pub fn new(strategy: GenerationStrategy) -> Self {
        GeneratedValue {
            strategy,
            generator_name: None,
            sequence_name: None,
            table_name: None,
            pk_column_name: None,
            pk_column_value: None,
            value_column_name: None,
            allocation_size: None,
        }
    }
}

/// Attribute properties set by applying attribute-scoped annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeProps {
    pub id: bool,
    pub not_null: bool,
    pub not_empty: bool,
    pub not_blank: bool,
    pub unique: bool,
    pub long_text: bool,
    pub transient: bool,
    pub past: bool,
    pub future: bool,
    pub object_type: bool,
    pub primitive_type: bool,
    pub unsigned_type: bool,
    pub foreign_key: bool,
    pub size_min: Option<i64>,
    pub size_max: Option<i64>,
    pub min_length: Option<i64>,
    pub max_length: Option<i64>,
    pub min_value: Option<Decimal>,
    pub max_value: Option<Decimal>,
    pub db_name: Option<String>,
    pub db_type: Option<String>,
    pub db_default_value: Option<String>,
    pub default_value: Option<String>,
    pub initial_value: Option<String>,
    pub label: Option<String>,
    pub input_type: Option<String>,
    pub pattern: Option<String>,
    pub generated_value: Option<GeneratedValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub annotations: Vec<Annotation>,
    pub tags: Vec<Tag>,
    /// Only meaningful for neutral-typed fields
    pub attribute: AttributeProps,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Field {
            name: name.into(),
            field_type,
            annotations: Vec::new(),
            tags: Vec::new(),
            attribute: AttributeProps::default(),
        }
    }

    pub fn scope(&self) -> Scope {
        if self.field_type.is_entity() {
            Scope::Link
        } else {
            Scope::Attribute
        }
    }

    pub fn has_annotation(&self, kind: AnnotationKind) -> bool {
        self.annotations.iter().any(|a| a.kind == kind)
    }

    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name == name)
    }
}

// ──────────────────────────────────────────────
// Foreign keys and links
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyAttribute {
    pub origin_attribute: String,
    pub referenced_attribute: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    name: String,
    origin_entity: String,
    referenced_entity: String,
    attributes: Vec<ForeignKeyAttribute>,
}

impl ForeignKey {
    /// Panics if any value is empty: callers only build foreign keys from
    /// names that were already validated.
    pub fn new(name: &str, origin_entity: &str, referenced_entity: &str) -> Self {
        assert!(!name.is_empty(), "foreign key name is empty");
        assert!(
            !origin_entity.is_empty(),
            "foreign key origin entity is empty"
        );
        assert!(
            !referenced_entity.is_empty(),
            "foreign key referenced entity is empty"
        );
        ForeignKey {
            name: name.to_owned(),
            origin_entity: origin_entity.to_owned(),
            referenced_entity: referenced_entity.to_owned(),
            attributes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin_entity(&self) -> &str {
        &self.origin_entity
    }

    pub fn referenced_entity(&self) -> &str {
        &self.referenced_entity
    }

    pub fn attributes(&self) -> &[ForeignKeyAttribute] {
        &self.attributes
    }

    pub fn add_attribute(&mut self, origin_attribute: &str, referenced_attribute: &str) {
        self.attributes.push(ForeignKeyAttribute {
            origin_attribute: origin_attribute.to_owned(),
            referenced_attribute: referenced_attribute.to_owned(),
        });
    }

    pub fn is_composite(&self) -> bool {
        self.attributes.len() > 1
    }

    pub fn link_attributes(&self) -> Vec<LinkAttribute> {
        self.attributes
            .iter()
            .map(|a| LinkAttribute {
                origin_attribute: a.origin_attribute.clone(),
                referenced_attribute: a.referenced_attribute.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchType {
    #[default]
    Default,
    Eager,
    Lazy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CascadeOption {
    All,
    Merge,
    Persist,
    Refresh,
    Remove,
}

impl CascadeOption {
    pub fn from_name(name: &str) -> Option<CascadeOption> {
        match name {
            "ALL" => Some(CascadeOption::All),
            "MERGE" => Some(CascadeOption::Merge),
            "PERSIST" => Some(CascadeOption::Persist),
            "REFRESH" => Some(CascadeOption::Refresh),
            "REMOVE" => Some(CascadeOption::Remove),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAttribute {
    pub origin_attribute: String,
    pub referenced_attribute: String,
}

/// Relationship carried by an entity-typed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub field_name: String,
    pub origin_entity: String,
    pub target_entity: String,
    pub collection: bool,
    pub cardinality: Cardinality,
    pub owning_side: bool,
    pub join_entity: Option<String>,
    pub based_on_join_entity: bool,
    /// Foreign key of the origin entity the link is based on
    pub foreign_key: Option<String>,
    /// Origin attributes named by `@LinkByAttr`
    pub by_attributes: Vec<String>,
    pub attributes: Vec<LinkAttribute>,
    pub mapped_by: Option<String>,
    pub optional: bool,
    pub fetch: FetchType,
    pub cascade: Vec<CascadeOption>,
    pub orphan_removal: bool,
}

impl Link {
    pub fn new(field_name: &str, origin_entity: &str, target_entity: &str, collection: bool) -> Self {
        Link {
            field_name: field_name.to_owned(),
            origin_entity: origin_entity.to_owned(),
            target_entity: target_entity.to_owned(),
            collection,
            cardinality: if collection {
                Cardinality::OneToMany
            } else {
                Cardinality::ManyToOne
            },
            owning_side: false,
            join_entity: None,
            based_on_join_entity: false,
            foreign_key: None,
            by_attributes: Vec::new(),
            attributes: Vec::new(),
            mapped_by: None,
            optional: false,
            fetch: FetchType::Default,
            cascade: Vec::new(),
            orphan_removal: false,
        }
    }

    pub fn is_inverse_side(&self) -> bool {
        !self.owning_side
    }

    /// True when the link says how the two entities are joined.
    pub fn has_join_info(&self) -> bool {
        self.join_entity.is_some() || self.foreign_key.is_some() || !self.attributes.is_empty()
    }
}

// ──────────────────────────────────────────────
// Entities and model
// ──────────────────────────────────────────────

/// Entity properties set by applying entity-scoped annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityProps {
    pub db_table: Option<String>,
    pub db_schema: Option<String>,
    pub db_catalog: Option<String>,
    pub read_only: bool,
    pub aggregate_root: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub tags: Vec<Tag>,
    pub fields: Vec<Field>,
    pub props: EntityProps,
    pub foreign_keys: Vec<ForeignKey>,
    pub links: Vec<Link>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Entity {
            name: name.into(),
            annotations: Vec::new(),
            tags: Vec::new(),
            fields: Vec::new(),
            props: EntityProps::default(),
            foreign_keys: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Neutral-typed fields, in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.field_type.is_entity())
    }

    /// Names of the `@Id` attributes, in declaration order.
    pub fn id_attributes(&self) -> Vec<String> {
        self.attributes()
            .filter(|f| f.attribute.id)
            .map(|f| f.name.clone())
            .collect()
    }

    pub fn foreign_key(&self, name: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.name() == name)
    }

    pub fn link(&self, field_name: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.field_name == field_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub entities: Vec<Entity>,
}

impl Model {
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }
}
