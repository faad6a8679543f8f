//! Apply phase: mutate the model element an annotation is bound to.
//!
//! Errors are returned as bare messages; callers wrap them with the entity
//! and field context.

use super::{generated_value, AnnotationKind};
use crate::model::{
    Annotation, AttributeProps, Cardinality, CascadeOption, EntityProps, FetchType, Link,
};
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn apply_to_entity(annotation: &Annotation, props: &mut EntityProps) -> Result<(), String> {
    use AnnotationKind as K;
    match annotation.kind {
        K::DbTable => props.db_table = text(annotation),
        K::DbSchema => props.db_schema = text(annotation),
        K::DbCatalog => props.db_catalog = text(annotation),
        K::ReadOnly => props.read_only = true,
        K::AggregateRoot => props.aggregate_root = true,
        _ => return Err(not_applicable(annotation, "an entity")),
    }
    Ok(())
}

pub fn apply_to_attribute(
    annotation: &Annotation,
    props: &mut AttributeProps,
) -> Result<(), String> {
    use AnnotationKind as K;
    match annotation.kind {
        K::Id => props.id = true,
        K::NotNull => props.not_null = true,
        K::NotEmpty => props.not_empty = true,
        K::NotBlank => props.not_blank = true,
        K::Unique => props.unique = true,
        K::LongText => props.long_text = true,
        K::Transient => props.transient = true,
        K::Past => props.past = true,
        K::Future => props.future = true,
        K::ObjectType => props.object_type = true,
        K::PrimitiveType => props.primitive_type = true,
        K::UnsignedType => props.unsigned_type = true,
        K::SizeMin => props.size_min = annotation.int(),
        K::SizeMax => props.size_max = annotation.int(),
        K::MinLen => props.min_length = annotation.int(),
        K::MaxLen => props.max_length = annotation.int(),
        K::Min => props.min_value = Some(decimal(annotation)?),
        K::Max => props.max_value = Some(decimal(annotation)?),
        K::DbName => props.db_name = text(annotation),
        K::DbType => props.db_type = text(annotation),
        K::DbDefaultValue => props.db_default_value = text(annotation),
        K::DefaultValue => props.default_value = text(annotation),
        K::InitialValue => props.initial_value = text(annotation),
        K::Label => props.label = text(annotation),
        K::InputType => props.input_type = text(annotation),
        K::Pattern => props.pattern = text(annotation),
        K::GeneratedValue => {
            props.generated_value = Some(generated_value::build(annotation.list())?);
        }
        // foreign keys need the whole model, see pass 4
        K::Fk => {}
        _ => return Err(not_applicable(annotation, "an attribute")),
    }
    Ok(())
}

pub fn apply_to_link(annotation: &Annotation, link: &mut Link) -> Result<(), String> {
    use AnnotationKind as K;
    match annotation.kind {
        K::OneToOne => link.cardinality = single_valued(link, Cardinality::OneToOne)?,
        K::ManyToOne => link.cardinality = single_valued(link, Cardinality::ManyToOne)?,
        K::ManyToMany => {
            if !link.collection {
                return Err("collection type expected".to_owned());
            }
            link.cardinality = Cardinality::ManyToMany;
        }
        K::Optional => link.optional = true,
        K::FetchTypeEager => link.fetch = FetchType::Eager,
        K::FetchTypeLazy => link.fetch = FetchType::Lazy,
        K::OrphanRemoval => link.orphan_removal = true,
        K::LinkByJoinEntity => {
            link.join_entity = text(annotation);
            link.based_on_join_entity = true;
        }
        K::LinkByFk => link.foreign_key = text(annotation),
        K::LinkByAttr => link.by_attributes = annotation.list().to_vec(),
        K::MappedBy => link.mapped_by = text(annotation),
        K::Cascade => {
            link.cascade = annotation
                .list()
                .iter()
                .filter_map(|o| CascadeOption::from_name(o))
                .collect();
        }
        _ => return Err(not_applicable(annotation, "a link")),
    }
    Ok(())
}

fn single_valued(link: &Link, cardinality: Cardinality) -> Result<Cardinality, String> {
    if link.collection {
        Err("not applicable to a collection".to_owned())
    } else {
        Ok(cardinality)
    }
}

fn text(annotation: &Annotation) -> Option<String> {
    annotation.text().map(str::to_owned)
}

fn decimal(annotation: &Annotation) -> Result<Decimal, String> {
    let s = annotation.text().unwrap_or_default();
    Decimal::from_str(s).map_err(|_| format!("invalid number '{}'", s))
}

fn not_applicable(annotation: &Annotation, target: &str) -> String {
    format!("@{} cannot be applied to {}", annotation.name(), target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnnotationParam, GenerationStrategy, Scope};

    fn annotation(kind: AnnotationKind, parameter: Option<AnnotationParam>, scope: Scope) -> Annotation {
        Annotation {
            kind,
            parameter,
            scope,
        }
    }

    fn list(items: &[&str]) -> Option<AnnotationParam> {
        Some(AnnotationParam::List(items.iter().map(|s| s.to_string()).collect()))
    }

    #[test]
    fn one_to_one_sets_cardinality() {
        let mut link = Link::new("computer", "Student", "Computer", false);
        apply_to_link(&annotation(AnnotationKind::OneToOne, None, Scope::Link), &mut link).unwrap();
        assert_eq!(link.cardinality, Cardinality::OneToOne);
    }

    #[test]
    fn one_to_one_rejected_on_collection() {
        let mut link = Link::new("computers", "Student", "Computer", true);
        let err = apply_to_link(&annotation(AnnotationKind::OneToOne, None, Scope::Link), &mut link)
            .unwrap_err();
        assert_eq!(err, "not applicable to a collection");
        assert_eq!(link.cardinality, Cardinality::OneToMany);
    }

    #[test]
    fn join_entity_marks_link() {
        let mut link = Link::new("roles", "User", "Role", true);
        let a = annotation(
            AnnotationKind::LinkByJoinEntity,
            Some(AnnotationParam::Text("UserRole".into())),
            Scope::Link,
        );
        apply_to_link(&a, &mut link).unwrap();
        assert_eq!(link.join_entity.as_deref(), Some("UserRole"));
        assert!(link.based_on_join_entity);
    }

    #[test]
    fn generated_value_applied_to_attribute() {
        let mut props = AttributeProps::default();
        let a = annotation(
            AnnotationKind::GeneratedValue,
            list(&["SEQUENCE", "GEN", "SEQ", "50"]),
            Scope::Attribute,
        );
        apply_to_attribute(&a, &mut props).unwrap();
        let gv = props.generated_value.unwrap();
        assert_eq!(gv.strategy, GenerationStrategy::Sequence);
        assert_eq!(gv.allocation_size, Some(50));
    }

    #[test]
    fn attribute_values() {
        let mut props = AttributeProps::default();
        apply_to_attribute(&annotation(AnnotationKind::Id, None, Scope::Attribute), &mut props).unwrap();
        apply_to_attribute(
            &annotation(AnnotationKind::Max, Some(AnnotationParam::Text("99.5".into())), Scope::Attribute),
            &mut props,
        )
        .unwrap();
        apply_to_attribute(
            &annotation(AnnotationKind::SizeMax, Some(AnnotationParam::Int(30)), Scope::Attribute),
            &mut props,
        )
        .unwrap();
        assert!(props.id);
        assert_eq!(props.max_value, Decimal::from_str("99.5").ok());
        assert_eq!(props.size_max, Some(30));
    }

    #[test]
    fn entity_values() {
        let mut props = EntityProps::default();
        let a = annotation(
            AnnotationKind::DbTable,
            Some(AnnotationParam::Text("PERSON".into())),
            Scope::Entity,
        );
        apply_to_entity(&a, &mut props).unwrap();
        assert_eq!(props.db_table.as_deref(), Some("PERSON"));
        let err = apply_to_entity(&annotation(AnnotationKind::Id, None, Scope::Entity), &mut props)
            .unwrap_err();
        assert_eq!(err, "@Id cannot be applied to an entity");
    }

    #[test]
    fn cascade_options_are_kept_in_order() {
        let mut link = Link::new("items", "Order", "Item", true);
        apply_to_link(
            &annotation(AnnotationKind::Cascade, list(&["REMOVE", "MERGE"]), Scope::Link),
            &mut link,
        )
        .unwrap();
        assert_eq!(link.cascade, vec![CascadeOption::Remove, CascadeOption::Merge]);
    }
}
