use super::block::FieldTokens;
use super::decoration::DecorationParser;
use crate::error::{DslError, ErrorContext, Errors};
use crate::lexer::{Token, TokenKind};
use crate::model::{Field, FieldType, NeutralType};
use crate::pass1_names::EntityNames;

/// Suffix of a collection type, e.g. `Car[]`.
pub const COLLECTION_SUFFIX: &str = "[]";

/// Turns the tokens of one field declaration into a [`Field`]:
/// `name ':' type [ '{' (annotation | tag)* '}' ]`.
pub struct FieldProcessor<'a> {
    entity: &'a str,
    entity_names: &'a EntityNames,
}

impl<'a> FieldProcessor<'a> {
    pub fn new(entity: &'a str, entity_names: &'a EntityNames) -> Self {
        FieldProcessor {
            entity,
            entity_names,
        }
    }

    /// Returns `None` when no field can be built (name, separator or type
    /// invalid). Annotation and tag errors are collected and the field is
    /// still returned.
    pub fn process(&self, group: &FieldTokens, errors: &mut Errors) -> Option<Field> {
        let mut field = errors.collect(self.build_field(&group.tokens))?;

        let decorations = match self.extract_decorations(&field.name, &group.tokens) {
            Ok(d) => d,
            Err(e) => {
                errors.push(e);
                return Some(field);
            }
        };

        for token in decorations {
            errors.collect(self.process_decoration(&mut field, token));
        }
        Some(field)
    }

    fn build_field(&self, tokens: &[Token]) -> Result<Field, DslError> {
        if tokens.len() < 3 {
            let name = tokens.first().map(|t| t.text.as_str()).unwrap_or_default();
            return Err(DslError::field(self.entity, name, "invalid field definition"));
        }
        let name = self.parse_name(&tokens[0])?;
        self.parse_separator(name, &tokens[1])?;
        let field_type = self.parse_type(name, &tokens[2])?;
        Ok(Field::new(name, field_type))
    }

    fn parse_name<'t>(&self, token: &'t Token) -> Result<&'t str, DslError> {
        let name = token.text.as_str();
        match name.chars().find(|c| !(c.is_alphanumeric() || *c == '_')) {
            Some(c) => Err(DslError::field(
                self.entity,
                name,
                format!("invalid field name (char '{}')", c),
            )),
            None => Ok(name),
        }
    }

    fn parse_separator(&self, field_name: &str, token: &Token) -> Result<(), DslError> {
        if token.kind == TokenKind::Colon {
            Ok(())
        } else {
            Err(DslError::field(
                self.entity,
                field_name,
                format!("invalid separator '{}' (':' expected)", token.text),
            ))
        }
    }

    fn parse_type(&self, field_name: &str, token: &Token) -> Result<FieldType, DslError> {
        resolve_type(&token.text, self.entity_names).ok_or_else(|| {
            DslError::field(
                self.entity,
                field_name,
                format!("invalid type '{}'", token.text),
            )
        })
    }

    /// Tokens after the type must all sit inside one `{ ... }` pair.
    fn extract_decorations<'t>(
        &self,
        field_name: &str,
        tokens: &'t [Token],
    ) -> Result<Vec<&'t Token>, DslError> {
        let error = |msg: String| DslError::field(self.entity, field_name, msg);
        let mut selection = Vec::new();
        let mut opened = false;
        let mut closed = false;

        for token in tokens.iter().skip(3) {
            match token.kind {
                TokenKind::LBrace => {
                    if opened {
                        return Err(error("multiple '{'".to_owned()));
                    }
                    opened = true;
                }
                TokenKind::RBrace => {
                    if closed {
                        return Err(error("multiple '}'".to_owned()));
                    }
                    if !opened {
                        return Err(error("'{' missing".to_owned()));
                    }
                    closed = true;
                }
                _ if opened && !closed => selection.push(token),
                _ => {
                    return Err(error(format!(
                        "unexpected element '{}' out of {{...}}",
                        token.text
                    )));
                }
            }
        }
        if opened && !closed {
            return Err(error("'}' missing".to_owned()));
        }
        Ok(selection)
    }

    fn process_decoration(&self, field: &mut Field, token: &Token) -> Result<(), DslError> {
        let ctx = ErrorContext::for_field(self.entity, &field.name);
        let parser = DecorationParser::new(ctx);
        match token.kind {
            TokenKind::Annotation => {
                let annotation = parser.parse_annotation(&token.text, field.scope())?;
                field.annotations.push(annotation);
            }
            TokenKind::Tag => {
                let tag = parser.parse_tag(&token.text)?;
                field.tags.push(tag);
            }
            _ => {
                return Err(ctx.error(format!(
                    "invalid element '{}' (annotation or tag expected)",
                    token.text
                )));
            }
        }
        Ok(())
    }
}

/// Resolve a type name: neutral types first, then entities of the model.
pub fn resolve_type(type_name: &str, entity_names: &EntityNames) -> Option<FieldType> {
    let (base, collection) = match type_name.strip_suffix(COLLECTION_SUFFIX) {
        Some(base) => (base, true),
        None => (type_name, false),
    };
    if let Some(neutral) = NeutralType::from_name(base) {
        return (!collection).then_some(FieldType::Neutral(neutral));
    }
    entity_names.contains(base).then(|| FieldType::Entity {
        name: base.to_owned(),
        collection,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::AnnotationKind;
    use crate::lexer;

    fn names() -> EntityNames {
        ["Person", "Car"].into_iter().collect()
    }

    fn group(src: &str) -> FieldTokens {
        FieldTokens {
            line: 1,
            tokens: lexer::lex_line(src, 1),
        }
    }

    fn process(src: &str) -> (Option<Field>, Vec<DslError>) {
        let names = names();
        let processor = FieldProcessor::new("Person", &names);
        let mut errors = Errors::new();
        let field = processor.process(&group(src), &mut errors);
        (field, errors.into_vec())
    }

    #[test]
    fn simple_field_with_annotation() {
        let (field, errors) = process("firstName : string { @NotNull }");
        assert!(errors.is_empty(), "{:?}", errors);
        let field = field.unwrap();
        assert_eq!(field.name, "firstName");
        assert_eq!(field.field_type, FieldType::Neutral(NeutralType::String));
        assert_eq!(field.annotations.len(), 1);
        assert_eq!(field.annotations[0].kind, AnnotationKind::NotNull);
        assert!(field.annotations[0].parameter.is_none());
    }

    #[test]
    fn field_without_decorations() {
        let (field, errors) = process("age : int");
        assert!(errors.is_empty());
        assert!(field.unwrap().annotations.is_empty());
    }

    #[test]
    fn annotations_and_tags_keep_order() {
        let (field, errors) = process("code : string { @Id #Key(primary) @SizeMax(3) #Flag }");
        assert!(errors.is_empty(), "{:?}", errors);
        let field = field.unwrap();
        let names: Vec<_> = field.annotations.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["Id", "SizeMax"]);
        assert_eq!(field.tags[0].name, "Key");
        assert_eq!(field.tags[0].parameter.as_deref(), Some("primary"));
        assert_eq!(field.tags[1].name, "Flag");
    }

    #[test]
    fn entity_and_collection_types() {
        let (field, _) = process("car : Car");
        assert_eq!(
            field.unwrap().field_type,
            FieldType::Entity {
                name: "Car".into(),
                collection: false
            }
        );
        let (field, _) = process("cars : Car[]");
        assert_eq!(
            field.unwrap().field_type,
            FieldType::Entity {
                name: "Car".into(),
                collection: true
            }
        );
    }

    #[test]
    fn unknown_type_is_a_field_error() {
        let (field, errors) = process("boat : Boat");
        assert!(field.is_none());
        assert_eq!(errors[0].field_name(), Some("boat"));
        assert_eq!(errors[0].message(), "invalid type 'Boat'");

        let (_, errors) = process("names : string[]");
        assert_eq!(errors[0].message(), "invalid type 'string[]'");
    }

    #[test]
    fn invalid_name_and_separator() {
        let (_, errors) = process("first-name : string");
        assert_eq!(errors[0].message(), "invalid field name (char '-')");
        let (_, errors) = process("name = string");
        assert_eq!(errors[0].message(), "invalid separator '=' (':' expected)");
        let (_, errors) = process("name :");
        assert_eq!(errors[0].message(), "invalid field definition");
        assert_eq!(errors[0].field_name(), Some("name"));
    }

    #[test]
    fn element_out_of_braces() {
        let (field, errors) = process("name : string @NotNull");
        assert!(field.is_some());
        assert_eq!(errors[0].message(), "unexpected element '@NotNull' out of {...}");
        let (_, errors) = process("name : string { @Id } #Tag");
        assert_eq!(errors[0].message(), "unexpected element '#Tag' out of {...}");
    }

    #[test]
    fn non_decoration_inside_braces() {
        let (field, errors) = process("name : string { @NotNull oops }");
        assert_eq!(field.unwrap().annotations.len(), 1);
        assert_eq!(
            errors[0].message(),
            "invalid element 'oops' (annotation or tag expected)"
        );
    }

    #[test]
    fn comma_inside_braces_is_not_a_separator() {
        let (field, errors) = process("id : int { @Id, @NotNull }");
        assert_eq!(field.unwrap().annotations.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message(),
            "invalid element ',' (annotation or tag expected)"
        );
    }

    #[test]
    fn every_bad_annotation_is_reported() {
        let (field, errors) = process("name : string { @Foo @SizeMax(x) @NotNull @OneToOne }");
        assert_eq!(field.unwrap().annotations.len(), 1);
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].message(), "@Foo : unknown annotation");
        assert!(errors[1].message().starts_with("@SizeMax : invalid integer"));
        assert_eq!(errors[2].message(), "@OneToOne : not applicable to attribute");
    }

    #[test]
    fn link_scope_for_entity_fields() {
        let (field, errors) = process("car : Car { @OneToOne }");
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(field.unwrap().annotations[0].scope, crate::model::Scope::Link);
        let (_, errors) = process("car : Car { @Id }");
        assert_eq!(errors[0].message(), "@Id : not applicable to link");
    }
}
