//! Pass 5: links -- one link per entity-typed field.
//!
//! Link-scoped annotations are applied first, then the join information is
//! resolved against the whole model:
//!
//! - `@LinkByJoinEntity(E)`: `E` must be an entity of the model
//! - `@LinkByFK(fk)`: `fk` must be a foreign key of the origin referencing the target
//! - `@LinkByAttr(a, b)`: origin attributes paired with the target ids
//! - none of them: the single foreign key of the origin referencing the
//!   target, for single-valued links without `@MappedBy`
//!
//! A link with join information is the owning side.

use crate::annotations::apply;
use crate::error::{ErrorContext, Errors};
use crate::model::{Cardinality, Entity, FieldType, ForeignKey, Link, LinkAttribute, Scope};
use crate::pass1_names::EntityNames;
use std::collections::HashMap;

/// Read-only view of the model, taken before links are built.
struct ModelView {
    ids: HashMap<String, Vec<String>>,
    attributes: HashMap<String, Vec<String>>,
    foreign_keys: HashMap<String, Vec<ForeignKey>>,
    /// (field name, target entity) of every entity-typed field
    references: HashMap<String, Vec<(String, String)>>,
}

impl ModelView {
    fn new(entities: &[Entity]) -> Self {
        let mut view = ModelView {
            ids: HashMap::new(),
            attributes: HashMap::new(),
            foreign_keys: HashMap::new(),
            references: HashMap::new(),
        };
        for e in entities {
            view.ids.insert(e.name.clone(), e.id_attributes());
            view.attributes.insert(
                e.name.clone(),
                e.attributes().map(|f| f.name.clone()).collect(),
            );
            view.foreign_keys.insert(e.name.clone(), e.foreign_keys.clone());
            let refs = e
                .fields
                .iter()
                .filter_map(|f| match &f.field_type {
                    FieldType::Entity { name, .. } => Some((f.name.clone(), name.clone())),
                    FieldType::Neutral(_) => None,
                })
                .collect();
            view.references.insert(e.name.clone(), refs);
        }
        view
    }

    fn foreign_keys_of(&self, entity: &str) -> &[ForeignKey] {
        self.foreign_keys.get(entity).map(Vec::as_slice).unwrap_or_default()
    }
}

pub fn build_links(entities: &mut [Entity], entity_names: &EntityNames, errors: &mut Errors) {
    let view = ModelView::new(entities);

    for entity in entities.iter_mut() {
        let mut links = Vec::new();
        for field in entity.fields.iter().filter(|f| f.scope() == Scope::Link) {
            let FieldType::Entity { name: target, collection } = &field.field_type else {
                continue;
            };
            let ctx = ErrorContext::for_field(&entity.name, &field.name);
            let mut link = Link::new(&field.name, &entity.name, target, *collection);

            for annotation in &field.annotations {
                if let Err(msg) = apply::apply_to_link(annotation, &mut link) {
                    errors.push(ctx.error(format!("@{} : {}", annotation.name(), msg)));
                }
            }

            resolve_join(&mut link, &view, entity_names, &ctx, errors);
            check_mapped_by(&link, &view, &ctx, errors);
            link.owning_side = link.has_join_info();

            tracing::trace!(
                entity = %entity.name,
                field = %field.name,
                target = %link.target_entity,
                cardinality = ?link.cardinality,
                owning = link.owning_side,
                "link"
            );
            links.push(link);
        }
        entity.links = links;
    }
}

fn resolve_join(
    link: &mut Link,
    view: &ModelView,
    entity_names: &EntityNames,
    ctx: &ErrorContext<'_>,
    errors: &mut Errors,
) {
    let defined = [
        link.join_entity.is_some(),
        link.foreign_key.is_some(),
        !link.by_attributes.is_empty(),
    ]
    .iter()
    .filter(|d| **d)
    .count();
    if defined > 1 {
        errors.push(ctx.error(
            "conflicting join definitions (@LinkByJoinEntity, @LinkByFK, @LinkByAttr)",
        ));
        link.join_entity = None;
        link.based_on_join_entity = false;
        link.foreign_key = None;
        return;
    }

    if let Some(join_entity) = &link.join_entity {
        if !entity_names.contains(join_entity) {
            errors.push(ctx.error(format!(
                "@LinkByJoinEntity : unknown join entity '{}'",
                join_entity
            )));
            link.join_entity = None;
            link.based_on_join_entity = false;
        }
        return;
    }

    if let Some(fk_name) = &link.foreign_key {
        let fk = view
            .foreign_keys_of(&link.origin_entity)
            .iter()
            .find(|fk| fk.name() == fk_name);
        match fk {
            Some(fk) if fk.referenced_entity() == link.target_entity => {
                link.attributes = fk.link_attributes();
            }
            Some(_) => {
                errors.push(ctx.error(format!(
                    "@LinkByFK : foreign key '{}' does not reference entity '{}'",
                    fk_name, link.target_entity
                )));
                link.foreign_key = None;
            }
            None => {
                errors.push(ctx.error(format!("@LinkByFK : unknown foreign key '{}'", fk_name)));
                link.foreign_key = None;
            }
        }
        return;
    }

    if !link.by_attributes.is_empty() {
        link.attributes = attributes_link(link, view, ctx, errors).unwrap_or_default();
        return;
    }

    let inferable = !link.collection
        && link.mapped_by.is_none()
        && matches!(link.cardinality, Cardinality::ManyToOne | Cardinality::OneToOne);
    if inferable {
        let mut candidates = view
            .foreign_keys_of(&link.origin_entity)
            .iter()
            .filter(|fk| fk.referenced_entity() == link.target_entity);
        if let (Some(fk), None) = (candidates.next(), candidates.next()) {
            link.foreign_key = Some(fk.name().to_owned());
            link.attributes = fk.link_attributes();
        }
    }
}

/// Pair the `@LinkByAttr` attributes with the target ids, in order.
fn attributes_link(
    link: &Link,
    view: &ModelView,
    ctx: &ErrorContext<'_>,
    errors: &mut Errors,
) -> Option<Vec<LinkAttribute>> {
    let origin_attributes = view.attributes.get(&link.origin_entity)?;
    if let Some(unknown) = link
        .by_attributes
        .iter()
        .find(|a| !origin_attributes.contains(*a))
    {
        errors.push(ctx.error(format!("@LinkByAttr : unknown attribute '{}'", unknown)));
        return None;
    }
    // unparsed target: its own errors are already reported
    let target_ids = view.ids.get(&link.target_entity)?;
    if target_ids.len() != link.by_attributes.len() {
        errors.push(ctx.error(format!(
            "@LinkByAttr : {} attribute(s) given, {} id attribute(s) in entity '{}'",
            link.by_attributes.len(),
            target_ids.len(),
            link.target_entity
        )));
        return None;
    }
    Some(
        link.by_attributes
            .iter()
            .zip(target_ids)
            .map(|(origin, referenced)| LinkAttribute {
                origin_attribute: origin.clone(),
                referenced_attribute: referenced.clone(),
            })
            .collect(),
    )
}

fn check_mapped_by(link: &Link, view: &ModelView, ctx: &ErrorContext<'_>, errors: &mut Errors) {
    let Some(mapped_by) = &link.mapped_by else {
        return;
    };
    if link.has_join_info() {
        errors.push(ctx.error("@MappedBy : cannot be combined with a join definition"));
        return;
    }
    let Some(references) = view.references.get(&link.target_entity) else {
        return;
    };
    let found = references
        .iter()
        .any(|(field, target)| field == mapped_by && *target == link.origin_entity);
    if !found {
        errors.push(ctx.error(format!(
            "@MappedBy : no field '{}' referencing '{}' in entity '{}'",
            mapped_by, link.origin_entity, link.target_entity
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DslError;
    use crate::parser::parse_entity;
    use crate::pass3_annotations::apply_annotations;
    use crate::pass4_foreign_keys::build_foreign_keys;

    fn build(sources: &[(&str, &str)]) -> (Vec<Entity>, Vec<DslError>) {
        let names: EntityNames = sources.iter().map(|(n, _)| *n).collect();
        let mut errors = Errors::new();
        let mut entities: Vec<Entity> = sources
            .iter()
            .map(|(n, src)| {
                let (e, errs) = parse_entity(n, src, &names).unwrap();
                errors.extend(errs);
                e
            })
            .collect();
        apply_annotations(&mut entities, &mut errors);
        build_foreign_keys(&mut entities, &names, &mut errors);
        build_links(&mut entities, &names, &mut errors);
        (entities, errors.into_vec())
    }

    const COUNTRY: (&str, &str) = ("Country", "Country { code : string { @Id } ; persons : Person[] ; }");

    #[test]
    fn inferred_from_single_foreign_key() {
        let (es, errors) = build(&[
            COUNTRY,
            (
                "Person",
                "Person { id : int { @Id } ; cc : string { @FK(Country) } ; country : Country ; }",
            ),
        ]);
        assert!(errors.is_empty(), "{:?}", errors);
        let link = es[1].link("country").unwrap();
        assert_eq!(link.cardinality, Cardinality::ManyToOne);
        assert_eq!(link.foreign_key.as_deref(), Some("FK_Person_Country"));
        assert_eq!(link.attributes[0].origin_attribute, "cc");
        assert!(link.owning_side);

        let inverse = es[0].link("persons").unwrap();
        assert_eq!(inverse.cardinality, Cardinality::OneToMany);
        assert!(inverse.is_inverse_side());
        assert!(inverse.attributes.is_empty());
    }

    #[test]
    fn join_entity_makes_owning_side() {
        let (es, errors) = build(&[
            ("User", "User { id : int { @Id } ; roles : Role[] { @ManyToMany @LinkByJoinEntity(UserRole) } ; }"),
            ("Role", "Role { id : int { @Id } ; }"),
            ("UserRole", "UserRole { userId : int { @Id } ; roleId : int { @Id } ; }"),
        ]);
        assert!(errors.is_empty(), "{:?}", errors);
        let link = es[0].link("roles").unwrap();
        assert_eq!(link.cardinality, Cardinality::ManyToMany);
        assert_eq!(link.join_entity.as_deref(), Some("UserRole"));
        assert!(link.based_on_join_entity);
        assert!(link.owning_side);
    }

    #[test]
    fn unknown_join_entity() {
        let (es, errors) = build(&[
            ("User", "User { roles : Role[] { @LinkByJoinEntity(Nope) } ; }"),
            ("Role", "Role { id : int { @Id } ; }"),
        ]);
        assert_eq!(
            errors[0].to_string(),
            "User.roles : @LinkByJoinEntity : unknown join entity 'Nope'"
        );
        assert!(!es[0].link("roles").unwrap().owning_side);
    }

    #[test]
    fn link_by_fk_must_reference_target() {
        let (_, errors) = build(&[
            COUNTRY,
            ("Town", "Town { id : int { @Id } ; }"),
            (
                "Person",
                "Person {\n t : int { @FK(FK_T, Town) } ;\n country : Country { @LinkByFK(FK_T) } ;\n town : Town { @LinkByFK(FK_Z) } ;\n}",
            ),
        ]);
        assert_eq!(
            errors[0].message(),
            "@LinkByFK : foreign key 'FK_T' does not reference entity 'Country'"
        );
        assert_eq!(errors[1].message(), "@LinkByFK : unknown foreign key 'FK_Z'");
    }

    #[test]
    fn link_by_attributes_pairs_with_ids() {
        let (es, errors) = build(&[
            COUNTRY,
            ("Person", "Person { cc : string ; country : Country { @LinkByAttr(cc) } ; }"),
        ]);
        assert!(errors.is_empty(), "{:?}", errors);
        let link = es[1].link("country").unwrap();
        assert_eq!(link.attributes[0].referenced_attribute, "code");
        assert!(link.owning_side);
    }

    #[test]
    fn link_by_attributes_count_mismatch() {
        let (_, errors) = build(&[
            COUNTRY,
            ("Person", "Person { a : string ; b : string ; country : Country { @LinkByAttr(a,b) } ; }"),
        ]);
        assert_eq!(
            errors[0].message(),
            "@LinkByAttr : 2 attribute(s) given, 1 id attribute(s) in entity 'Country'"
        );
    }

    #[test]
    fn conflicting_join_definitions() {
        let (es, errors) = build(&[
            COUNTRY,
            (
                "Person",
                "Person { cc : string ; country : Country { @LinkByAttr(cc) @LinkByJoinEntity(Country) } ; }",
            ),
        ]);
        assert!(errors[0].message().starts_with("conflicting join definitions"));
        let link = es[1].link("country").unwrap();
        assert!(link.join_entity.is_none());
        assert!(!link.owning_side);
    }

    #[test]
    fn mapped_by_side() {
        let (es, errors) = build(&[
            (
                "Country",
                "Country { code : string { @Id } ; persons : Person[] { @MappedBy(country) } ; }",
            ),
            (
                "Person",
                "Person { id : int { @Id } ; cc : string { @FK(Country) } ; country : Country ; }",
            ),
        ]);
        assert!(errors.is_empty(), "{:?}", errors);
        let inverse = es[0].link("persons").unwrap();
        assert_eq!(inverse.mapped_by.as_deref(), Some("country"));
        assert!(inverse.is_inverse_side());
    }

    #[test]
    fn mapped_by_with_join_info_is_an_error() {
        let (_, errors) = build(&[
            COUNTRY,
            (
                "Person",
                "Person { cc : string ; country : Country { @LinkByAttr(cc) @MappedBy(persons) } ; }",
            ),
        ]);
        assert_eq!(
            errors[0].message(),
            "@MappedBy : cannot be combined with a join definition"
        );
    }

    #[test]
    fn mapped_by_unknown_field() {
        let (_, errors) = build(&[
            ("Country", "Country { code : string { @Id } ; persons : Person[] { @MappedBy(nation) } ; }"),
            ("Person", "Person { id : int { @Id } ; country : Country ; }"),
        ]);
        assert_eq!(
            errors[0].message(),
            "@MappedBy : no field 'nation' referencing 'Country' in entity 'Person'"
        );
    }

    #[test]
    fn cardinality_annotations_checked_against_collection() {
        let (es, errors) = build(&[
            COUNTRY,
            (
                "Person",
                "Person {\n country : Country { @ManyToMany } ;\n countries : Country[] { @OneToOne } ;\n}",
            ),
        ]);
        assert_eq!(errors[0].message(), "@ManyToMany : collection type expected");
        assert_eq!(errors[1].message(), "@OneToOne : not applicable to a collection");
        assert_eq!(es[1].links.len(), 2);
    }
}
