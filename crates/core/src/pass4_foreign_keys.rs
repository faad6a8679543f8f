//! Pass 4: foreign keys -- derived from the `@FK` annotations of attributes.
//!
//! `@FK([fkName,] Entity[.attribute])`: each annotation adds one attribute
//! pair to the foreign key `fkName` (default `FK_<Origin>_<Referenced>`).
//! Pairs without a referenced attribute map positionally to the `@Id`
//! attributes of the referenced entity.

use crate::annotations::{split_reference, AnnotationKind};
use crate::error::{DslError, Errors};
use crate::model::{Entity, ForeignKey};
use crate::pass1_names::EntityNames;
use std::collections::HashMap;

/// One `@FK` annotation, resolved against its attribute.
struct FkDeclaration {
    fk_name: String,
    attribute: String,
    referenced_entity: String,
    referenced_attribute: Option<String>,
}

pub fn build_foreign_keys(entities: &mut [Entity], entity_names: &EntityNames, errors: &mut Errors) {
    // id attributes and attribute names of every parsed entity, read-only here
    let ids: HashMap<String, Vec<String>> = entities
        .iter()
        .map(|e| (e.name.clone(), e.id_attributes()))
        .collect();
    let attributes: HashMap<String, Vec<String>> = entities
        .iter()
        .map(|e| (e.name.clone(), e.attributes().map(|f| f.name.clone()).collect()))
        .collect();

    for entity in entities.iter_mut() {
        let declarations = collect_declarations(entity);
        let mut foreign_keys: Vec<ForeignKey> = Vec::new();

        for decl in declarations {
            let error = |msg: String| DslError::field(&entity.name, &decl.attribute, msg);

            let Some(referenced_ids) = ids.get(&decl.referenced_entity) else {
                // dropped entities already carry their own fatal error
                if !entity_names.contains(&decl.referenced_entity) {
                    errors.push(error(format!(
                        "@FK : unknown referenced entity '{}'",
                        decl.referenced_entity
                    )));
                }
                continue;
            };

            let existing = foreign_keys.iter().position(|fk| fk.name() == decl.fk_name);
            if let Some(i) = existing {
                if foreign_keys[i].referenced_entity() != decl.referenced_entity {
                    errors.push(error(format!(
                        "@FK : foreign key '{}' already references entity '{}'",
                        decl.fk_name,
                        foreign_keys[i].referenced_entity()
                    )));
                    continue;
                }
            }

            let referenced_attribute = match &decl.referenced_attribute {
                Some(name) => {
                    let known = attributes
                        .get(&decl.referenced_entity)
                        .is_some_and(|names| names.contains(name));
                    if !known {
                        errors.push(error(format!(
                            "@FK : unknown attribute '{}' in entity '{}'",
                            name, decl.referenced_entity
                        )));
                        continue;
                    }
                    name.clone()
                }
                None => {
                    let position = existing.map_or(0, |i| foreign_keys[i].attributes().len());
                    match referenced_ids.get(position) {
                        Some(id) => id.clone(),
                        None => {
                            errors.push(error(format!(
                                "@FK : no id attribute #{} in entity '{}'",
                                position + 1,
                                decl.referenced_entity
                            )));
                            continue;
                        }
                    }
                }
            };

            let fk = match existing {
                Some(i) => &mut foreign_keys[i],
                None => {
                    foreign_keys.push(ForeignKey::new(
                        &decl.fk_name,
                        &entity.name,
                        &decl.referenced_entity,
                    ));
                    let last = foreign_keys.len() - 1;
                    &mut foreign_keys[last]
                }
            };
            fk.add_attribute(&decl.attribute, &referenced_attribute);
            tracing::trace!(
                entity = %entity.name,
                fk = %decl.fk_name,
                attribute = %decl.attribute,
                referenced = %referenced_attribute,
                "foreign key attribute"
            );
            if let Some(field) = entity.fields.iter_mut().find(|f| f.name == decl.attribute) {
                field.attribute.foreign_key = true;
            }
        }

        entity.foreign_keys = foreign_keys;
    }
}

fn collect_declarations(entity: &Entity) -> Vec<FkDeclaration> {
    let mut declarations = Vec::new();
    for field in entity.attributes() {
        for annotation in field.annotations.iter().filter(|a| a.kind == AnnotationKind::Fk) {
            let list = annotation.list();
            // shape checked when the annotation was built
            let Some(reference) = list.last() else {
                continue;
            };
            let (referenced_entity, referenced_attribute) = split_reference(reference);
            let fk_name = if list.len() == 2 {
                list[0].clone()
            } else {
                format!("FK_{}_{}", entity.name, referenced_entity)
            };
            declarations.push(FkDeclaration {
                fk_name,
                attribute: field.name.clone(),
                referenced_entity: referenced_entity.to_owned(),
                referenced_attribute: referenced_attribute.map(str::to_owned),
            });
        }
    }
    declarations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_entity;
    use crate::pass3_annotations::apply_annotations;

    fn entities(sources: &[(&str, &str)]) -> (Vec<Entity>, EntityNames) {
        let names: EntityNames = sources.iter().map(|(n, _)| *n).collect();
        let mut entities: Vec<Entity> = sources
            .iter()
            .map(|(n, src)| {
                let (e, errors) = parse_entity(n, src, &names).unwrap();
                assert!(errors.is_empty(), "{:?}", errors.into_vec());
                e
            })
            .collect();
        let mut errors = Errors::new();
        apply_annotations(&mut entities, &mut errors);
        assert!(errors.is_empty());
        (entities, names)
    }

    #[test]
    fn default_name_and_positional_id() {
        let (mut es, names) = entities(&[
            ("Country", "Country { code : string { @Id } ; }"),
            ("Person", "Person { id : int { @Id } ; countryCode : string { @FK(Country) } ; }"),
        ]);
        let mut errors = Errors::new();
        build_foreign_keys(&mut es, &names, &mut errors);
        assert!(errors.is_empty(), "{:?}", errors.into_vec());

        let person = &es[1];
        let fk = person.foreign_key("FK_Person_Country").unwrap();
        assert_eq!(fk.origin_entity(), "Person");
        assert_eq!(fk.referenced_entity(), "Country");
        assert_eq!(fk.attributes()[0].origin_attribute, "countryCode");
        assert_eq!(fk.attributes()[0].referenced_attribute, "code");
        assert!(!fk.is_composite());
        assert!(person.field("countryCode").unwrap().attribute.foreign_key);
        assert!(es[0].foreign_keys.is_empty());
    }

    #[test]
    fn composite_named_foreign_key() {
        let (mut es, names) = entities(&[
            ("Item", "Item { orderId : int { @Id } ; line : int { @Id } ; }"),
            (
                "Detail",
                "Detail {\n a : int { @FK(FK_ITEM, Item) } ;\n b : int { @FK(FK_ITEM, Item.line) } ;\n}",
            ),
        ]);
        let mut errors = Errors::new();
        build_foreign_keys(&mut es, &names, &mut errors);
        assert!(errors.is_empty(), "{:?}", errors.into_vec());
        let fk = es[1].foreign_key("FK_ITEM").unwrap();
        assert!(fk.is_composite());
        assert_eq!(fk.attributes()[0].referenced_attribute, "orderId");
        assert_eq!(fk.attributes()[1].referenced_attribute, "line");
    }

    #[test]
    fn unknown_references_are_reported() {
        let (mut es, names) = entities(&[
            ("Country", "Country { code : string { @Id } ; }"),
            (
                "Person",
                "Person {\n a : int { @FK(Town) } ;\n b : int { @FK(Country.nope) } ;\n}",
            ),
        ]);
        let mut errors = Errors::new();
        build_foreign_keys(&mut es, &names, &mut errors);
        let errors = errors.into_vec();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0].to_string(),
            "Person.a : @FK : unknown referenced entity 'Town'"
        );
        assert_eq!(
            errors[1].to_string(),
            "Person.b : @FK : unknown attribute 'nope' in entity 'Country'"
        );
        assert!(es[1].foreign_keys.is_empty());
    }

    #[test]
    fn missing_id_attribute() {
        let (mut es, names) = entities(&[
            ("Country", "Country { code : string ; }"),
            ("Person", "Person { c : string { @FK(Country) } ; }"),
        ]);
        let mut errors = Errors::new();
        build_foreign_keys(&mut es, &names, &mut errors);
        assert_eq!(
            errors.into_vec()[0].message(),
            "@FK : no id attribute #1 in entity 'Country'"
        );
    }

    #[test]
    fn one_name_two_referenced_entities() {
        let (mut es, names) = entities(&[
            ("A", "A { id : int { @Id } ; }"),
            ("B", "B { id : int { @Id } ; }"),
            ("C", "C {\n a : int { @FK(FK_X, A) } ;\n b : int { @FK(FK_X, B) } ;\n}"),
        ]);
        let mut errors = Errors::new();
        build_foreign_keys(&mut es, &names, &mut errors);
        assert_eq!(
            errors.into_vec()[0].message(),
            "@FK : foreign key 'FK_X' already references entity 'A'"
        );
        assert_eq!(es[2].foreign_keys.len(), 1);
    }
}
