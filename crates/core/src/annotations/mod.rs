//! Annotation registry: the closed set of known annotations, each with its
//! accepted scopes, parameter shape, post-build validation and apply behavior.
//!
//! The registry is built once per process and never mutated afterwards, so
//! concurrent parses can share it freely.

pub mod apply;
mod generated_value;

use crate::error::{DslError, ErrorContext};
use crate::model::{Annotation, AnnotationParam, CascadeOption, Scope};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

/// Separator between the elements of a LIST parameter.
pub const LIST_DELIMITER: char = ',';

/// Declared shape of an annotation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamShape {
    None,
    String,
    Int,
    List,
}

const ENTITY: &[Scope] = &[Scope::Entity];
const ATTRIBUTE: &[Scope] = &[Scope::Attribute];
const LINK: &[Scope] = &[Scope::Link];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    // attribute flags
    Id,
    NotNull,
    NotEmpty,
    NotBlank,
    Unique,
    LongText,
    Transient,
    Past,
    Future,
    ObjectType,
    PrimitiveType,
    UnsignedType,
    // attribute sizes and bounds
    SizeMin,
    SizeMax,
    MinLen,
    MaxLen,
    Min,
    Max,
    // attribute values
    DbName,
    DbType,
    DbDefaultValue,
    DefaultValue,
    InitialValue,
    Label,
    InputType,
    Pattern,
    GeneratedValue,
    #[serde(rename = "FK")]
    Fk,
    // entity
    DbTable,
    DbSchema,
    DbCatalog,
    ReadOnly,
    AggregateRoot,
    // link
    OneToOne,
    ManyToOne,
    ManyToMany,
    Optional,
    FetchTypeEager,
    FetchTypeLazy,
    OrphanRemoval,
    LinkByJoinEntity,
    #[serde(rename = "LinkByFK")]
    LinkByFk,
    LinkByAttr,
    MappedBy,
    Cascade,
}

static REGISTRY: LazyLock<HashMap<&'static str, AnnotationKind>> = LazyLock::new(|| {
    AnnotationKind::ALL
        .iter()
        .map(|kind| (kind.name(), *kind))
        .collect()
});

/// Look up an annotation by its name as written after `@`.
pub fn lookup(name: &str) -> Option<AnnotationKind> {
    REGISTRY.get(name).copied()
}

impl AnnotationKind {
    pub const ALL: &'static [AnnotationKind] = &[
        AnnotationKind::Id,
        AnnotationKind::NotNull,
        AnnotationKind::NotEmpty,
        AnnotationKind::NotBlank,
        AnnotationKind::Unique,
        AnnotationKind::LongText,
        AnnotationKind::Transient,
        AnnotationKind::Past,
        AnnotationKind::Future,
        AnnotationKind::ObjectType,
        AnnotationKind::PrimitiveType,
        AnnotationKind::UnsignedType,
        AnnotationKind::SizeMin,
        AnnotationKind::SizeMax,
        AnnotationKind::MinLen,
        AnnotationKind::MaxLen,
        AnnotationKind::Min,
        AnnotationKind::Max,
        AnnotationKind::DbName,
        AnnotationKind::DbType,
        AnnotationKind::DbDefaultValue,
        AnnotationKind::DefaultValue,
        AnnotationKind::InitialValue,
        AnnotationKind::Label,
        AnnotationKind::InputType,
        AnnotationKind::Pattern,
        AnnotationKind::GeneratedValue,
        AnnotationKind::Fk,
        AnnotationKind::DbTable,
        AnnotationKind::DbSchema,
        AnnotationKind::DbCatalog,
        AnnotationKind::ReadOnly,
        AnnotationKind::AggregateRoot,
        AnnotationKind::OneToOne,
        AnnotationKind::ManyToOne,
        AnnotationKind::ManyToMany,
        AnnotationKind::Optional,
        AnnotationKind::FetchTypeEager,
        AnnotationKind::FetchTypeLazy,
        AnnotationKind::OrphanRemoval,
        AnnotationKind::LinkByJoinEntity,
        AnnotationKind::LinkByFk,
        AnnotationKind::LinkByAttr,
        AnnotationKind::MappedBy,
        AnnotationKind::Cascade,
    ];

    pub fn name(self) -> &'static str {
        use AnnotationKind as K;
        match self {
            K::Id => "Id",
            K::NotNull => "NotNull",
            K::NotEmpty => "NotEmpty",
            K::NotBlank => "NotBlank",
            K::Unique => "Unique",
            K::LongText => "LongText",
            K::Transient => "Transient",
            K::Past => "Past",
            K::Future => "Future",
            K::ObjectType => "ObjectType",
            K::PrimitiveType => "PrimitiveType",
            K::UnsignedType => "UnsignedType",
            K::SizeMin => "SizeMin",
            K::SizeMax => "SizeMax",
            K::MinLen => "MinLen",
            K::MaxLen => "MaxLen",
            K::Min => "Min",
            K::Max => "Max",
            K::DbName => "DbName",
            K::DbType => "DbType",
            K::DbDefaultValue => "DbDefaultValue",
            K::DefaultValue => "DefaultValue",
            K::InitialValue => "InitialValue",
            K::Label => "Label",
            K::InputType => "InputType",
            K::Pattern => "Pattern",
            K::GeneratedValue => "GeneratedValue",
            K::Fk => "FK",
            K::DbTable => "DbTable",
            K::DbSchema => "DbSchema",
            K::DbCatalog => "DbCatalog",
            K::ReadOnly => "ReadOnly",
            K::AggregateRoot => "AggregateRoot",
            K::OneToOne => "OneToOne",
            K::ManyToOne => "ManyToOne",
            K::ManyToMany => "ManyToMany",
            K::Optional => "Optional",
            K::FetchTypeEager => "FetchTypeEager",
            K::FetchTypeLazy => "FetchTypeLazy",
            K::OrphanRemoval => "OrphanRemoval",
            K::LinkByJoinEntity => "LinkByJoinEntity",
            K::LinkByFk => "LinkByFK",
            K::LinkByAttr => "LinkByAttr",
            K::MappedBy => "MappedBy",
            K::Cascade => "Cascade",
        }
    }

    pub fn param_shape(self) -> ParamShape {
        use AnnotationKind as K;
        match self {
            K::SizeMin | K::SizeMax | K::MinLen | K::MaxLen => ParamShape::Int,
            K::Min
            | K::Max
            | K::DbName
            | K::DbType
            | K::DbDefaultValue
            | K::DefaultValue
            | K::InitialValue
            | K::Label
            | K::InputType
            | K::Pattern
            | K::DbTable
            | K::DbSchema
            | K::DbCatalog
            | K::LinkByJoinEntity
            | K::LinkByFk
            | K::MappedBy => ParamShape::String,
            K::GeneratedValue | K::Fk | K::LinkByAttr | K::Cascade => ParamShape::List,
            _ => ParamShape::None,
        }
    }

    pub fn scopes(self) -> &'static [Scope] {
        use AnnotationKind as K;
        match self {
            K::DbTable | K::DbSchema | K::DbCatalog | K::ReadOnly | K::AggregateRoot => ENTITY,
            K::OneToOne
            | K::ManyToOne
            | K::ManyToMany
            | K::Optional
            | K::FetchTypeEager
            | K::FetchTypeLazy
            | K::OrphanRemoval
            | K::LinkByJoinEntity
            | K::LinkByFk
            | K::LinkByAttr
            | K::MappedBy
            | K::Cascade => LINK,
            _ => ATTRIBUTE,
        }
    }

    pub fn accepts(self, scope: Scope) -> bool {
        self.scopes().contains(&scope)
    }

    /// Build an annotation from its raw parameter: parse the parameter by
    /// the declared shape, run the post-build validation, check the scope.
    pub fn build(
        self,
        ctx: &ErrorContext<'_>,
        raw: Option<&str>,
        scope: Scope,
    ) -> Result<Annotation, DslError> {
        let name = self.name();
        let parameter = match (self.param_shape(), raw) {
            (ParamShape::None, None) => None,
            (ParamShape::None, Some(_)) => {
                return Err(ctx.error(format!("@{} : unexpected parameter", name)));
            }
            (_, None) => {
                return Err(ctx.error(format!("@{} : parameter required", name)));
            }
            (ParamShape::String, Some(p)) => Some(AnnotationParam::Text(p.to_owned())),
            (ParamShape::Int, Some(p)) => {
                let n: i64 = p.parse().map_err(|_| {
                    ctx.error(format!("@{} : invalid integer parameter '{}'", name, p))
                })?;
                Some(AnnotationParam::Int(n))
            }
            (ParamShape::List, Some(p)) => Some(AnnotationParam::List(split_list(p))),
        };

        let annotation = Annotation {
            kind: self,
            parameter,
            scope,
        };
        self.validate(&annotation)
            .map_err(|msg| ctx.error(format!("@{} : {}", name, msg)))?;

        if !self.accepts(scope) {
            return Err(ctx.error(format!("@{} : not applicable to {}", name, scope)));
        }
        Ok(annotation)
    }

    /// Post-build validation of the typed parameter.
    fn validate(self, annotation: &Annotation) -> Result<(), String> {
        use AnnotationKind as K;
        match self {
            K::GeneratedValue => generated_value::validate(annotation.list()),
            K::SizeMin | K::SizeMax | K::MinLen | K::MaxLen => match annotation.int() {
                Some(n) if n < 0 => Err(format!("negative value {}", n)),
                _ => Ok(()),
            },
            K::Min | K::Max => {
                let text = annotation.text().unwrap_or_default();
                Decimal::from_str(text)
                    .map(|_| ())
                    .map_err(|_| format!("invalid number '{}'", text))
            }
            K::Fk => {
                let list = annotation.list();
                if list.is_empty() || list.len() > 2 {
                    return Err(format!(
                        "invalid number of parameters ({} given, 1 or 2 expected)",
                        list.len()
                    ));
                }
                if list.iter().any(|p| p.is_empty()) {
                    return Err("empty parameter".to_owned());
                }
                let (entity, attribute) = split_reference(&list[list.len() - 1]);
                if entity.is_empty() || attribute == Some("") {
                    return Err(format!("invalid reference '{}'", list[list.len() - 1]));
                }
                Ok(())
            }
            K::LinkByAttr => {
                let list = annotation.list();
                if list.is_empty() || list.iter().any(|p| p.is_empty()) {
                    return Err("attribute name(s) expected".to_owned());
                }
                Ok(())
            }
            K::Cascade => {
                let list = annotation.list();
                if list.is_empty() {
                    return Err("cascade option(s) expected".to_owned());
                }
                match list.iter().find(|o| CascadeOption::from_name(o).is_none()) {
                    Some(bad) => Err(format!("invalid cascade option '{}'", bad)),
                    None => Ok(()),
                }
            }
            K::LinkByJoinEntity | K::LinkByFk | K::MappedBy => {
                if annotation.text().unwrap_or_default().is_empty() {
                    Err("name expected".to_owned())
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }
}

/// Split a LIST parameter on [`LIST_DELIMITER`]; a blank parameter is empty.
pub fn split_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(LIST_DELIMITER)
        .map(|s| s.trim().to_owned())
        .collect()
}

/// Split an `Entity` or `Entity.attribute` reference.
pub fn split_reference(reference: &str) -> (&str, Option<&str>) {
    match reference.split_once('.') {
        Some((entity, attribute)) => (entity, Some(attribute)),
        None => (reference, None),
    }
}
