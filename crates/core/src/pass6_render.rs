//! Pass 6: rendering -- a model back to entity texts.
//!
//! Parsing the rendered text of an entity gives back the same fields,
//! annotations and tags, in the same order.

use crate::assemble::EntitySource;
use crate::model::{Annotation, Entity, Field, Model, Tag};

const INDENT: &str = "  ";

pub fn render_model(model: &Model) -> Vec<EntitySource> {
    model
        .entities
        .iter()
        .map(|e| EntitySource::new(&e.name, render_entity(e)))
        .collect()
}

pub fn render_entity(entity: &Entity) -> String {
    let mut out = String::new();
    for annotation in &entity.annotations {
        out.push_str(&render_annotation(annotation));
        out.push('\n');
    }
    for tag in &entity.tags {
        out.push_str(&render_tag(tag));
        out.push('\n');
    }
    out.push_str(&entity.name);
    out.push_str(" {\n");
    for field in &entity.fields {
        out.push_str(INDENT);
        out.push_str(&render_field(field));
        out.push('\n');
    }
    out.push_str("}\n");
    out
}

/// `name : type { decorations } ;`, braces only when decorated.
pub fn render_field(field: &Field) -> String {
    let decorations: Vec<String> = field
        .annotations
        .iter()
        .map(render_annotation)
        .chain(field.tags.iter().map(render_tag))
        .collect();
    if decorations.is_empty() {
        format!("{} : {} ;", field.name, field.field_type)
    } else {
        format!(
            "{} : {} {{ {} }} ;",
            field.name,
            field.field_type,
            decorations.join(" ")
        )
    }
}

pub fn render_annotation(annotation: &Annotation) -> String {
    match &annotation.parameter {
        Some(p) => format!("@{}({})", annotation.name(), p),
        None => format!("@{}", annotation.name()),
    }
}

pub fn render_tag(tag: &Tag) -> String {
    match &tag.parameter {
        Some(p) => format!("#{}({})", tag.name, p),
        None => format!("#{}", tag.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_entity;
    use crate::pass1_names::EntityNames;

    #[test]
    fn field_rendering() {
        let names: EntityNames = ["Car", "Driver"].into_iter().collect();
        let src = "Car {\nid:int{@Id;@GeneratedValue(SEQUENCE,G,S)};\ndriver : Driver ;\n}";
        let (car, _) = parse_entity("Car", src, &names).unwrap();
        assert_eq!(
            render_field(&car.fields[0]),
            "id : int { @Id @GeneratedValue(SEQUENCE, G, S) } ;"
        );
        assert_eq!(render_field(&car.fields[1]), "driver : Driver ;");
    }

    #[test]
    fn annotations_before_tags() {
        let names: EntityNames = ["Car"].into_iter().collect();
        let (car, _) =
            parse_entity("Car", "Car { code : string { #Key @Id #Label(Code) } ; }", &names).unwrap();
        assert_eq!(
            render_field(&car.fields[0]),
            "code : string { @Id #Key #Label(Code) } ;"
        );
    }

    #[test]
    fn entity_rendering_round_trips() {
        let names: EntityNames = ["Car", "Driver"].into_iter().collect();
        let src = "@DbTable(CARS)\n#Fleet\nCar {\n  id : int { @Id } ;\n  drivers : Driver[] { @Cascade(MERGE,REMOVE) } ;\n}\n";
        let (car, errors) = parse_entity("Car", src, &names).unwrap();
        assert!(errors.is_empty());
        let rendered = render_entity(&car);
        assert_eq!(
            rendered,
            "@DbTable(CARS)\n#Fleet\nCar {\n  id : int { @Id } ;\n  drivers : Driver[] { @Cascade(MERGE, REMOVE) } ;\n}\n"
        );
        let (again, errors) = parse_entity("Car", &rendered, &names).unwrap();
        assert!(errors.is_empty());
        assert_eq!(again, car);
    }
}
