//! Field block state machine: groups the tokens of one entity text into field
//! declarations, following brace nesting.
//!
//! ```text
//! @DbTable(CAR)          <- EntityLevel (header)
//! Car {                  <- InFields
//!   id : int { @Id } ;   <- '{' enters InAnnotationBlock, ';' at InFields ends the field
//! }                      <- Closed
//! ```

use crate::error::DslError;
use crate::lexer::{self, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Before the entity body: depth 0
    EntityLevel,
    /// Directly inside the entity body: depth 1
    InFields,
    /// Inside a field's `{...}`: depth >= 2
    InAnnotationBlock { depth: u32 },
    /// After the entity body
    Closed,
}

impl Position {
    pub fn depth(self) -> u32 {
        match self {
            Position::EntityLevel | Position::Closed => 0,
            Position::InFields => 1,
            Position::InAnnotationBlock { depth } => depth,
        }
    }
}

/// What the machine does with the token that caused a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep as entity header
    Header,
    OpenBody,
    /// Append to the current field
    Append,
    /// `;` between decorations: dropped
    Separator,
    EndField,
    CloseBody,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    #[error("unexpected '}}' (unbalanced braces)")]
    ExtraClosingBrace,
    #[error("unexpected element '{0}' after the end of the entity")]
    ContentAfterBody(String),
    #[error("unbalanced braces ({0} '}}' missing)")]
    UnclosedBraces(u32),
    #[error("entity body not found ('{{' expected)")]
    NoBody,
}

/// Pure transition function.
pub fn transition(position: Position, token: &Token) -> Result<(Position, Action), Fault> {
    use Position::*;
    use TokenKind::*;
    let next = match (position, token.kind) {
        (EntityLevel, LBrace) => (InFields, Action::OpenBody),
        (EntityLevel, RBrace) => return Err(Fault::ExtraClosingBrace),
        (EntityLevel, _) => (EntityLevel, Action::Header),

        (InFields, LBrace) => (InAnnotationBlock { depth: 2 }, Action::Append),
        (InFields, RBrace) => (Closed, Action::CloseBody),
        (InFields, Semicolon) => (InFields, Action::EndField),
        (InFields, _) => (InFields, Action::Append),

        (InAnnotationBlock { depth }, LBrace) => {
            (InAnnotationBlock { depth: depth + 1 }, Action::Append)
        }
        (InAnnotationBlock { depth }, RBrace) if depth <= 2 => (InFields, Action::Append),
        (InAnnotationBlock { depth }, RBrace) => {
            (InAnnotationBlock { depth: depth - 1 }, Action::Append)
        }
        (InAnnotationBlock { .. }, Semicolon) => (position, Action::Separator),
        (InAnnotationBlock { .. }, _) => (position, Action::Append),

        (Closed, RBrace) => return Err(Fault::ExtraClosingBrace),
        (Closed, _) => return Err(Fault::ContentAfterBody(token.text.clone())),
    };
    Ok(next)
}

/// Tokens of one field declaration, without the terminating `;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTokens {
    pub line: u32,
    pub tokens: Vec<Token>,
}

impl FieldTokens {
    pub fn texts(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

/// Result of running the machine over a whole entity text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityBlock {
    pub header: Vec<Token>,
    pub fields: Vec<FieldTokens>,
    /// Tokens left without a terminating `;` when the body closed
    pub unterminated: Option<FieldTokens>,
}

/// Owns the single buffer of the field being accumulated.
#[derive(Debug)]
pub struct FieldBlockMachine {
    position: Position,
    header: Vec<Token>,
    current: Vec<Token>,
    unterminated: Option<FieldTokens>,
}

impl Default for FieldBlockMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldBlockMachine {
    pub fn new() -> Self {
        FieldBlockMachine {
            position: Position::EntityLevel,
            header: Vec::new(),
            current: Vec::new(),
            unterminated: None,
        }
    }

    /// Feed one token; returns a field when one is terminated.
    pub fn feed(&mut self, token: Token) -> Result<Option<FieldTokens>, Fault> {
        let (next, action) = transition(self.position, &token)?;
        self.position = next;
        match action {
            Action::Header => self.header.push(token),
            Action::Append => self.current.push(token),
            Action::OpenBody | Action::Separator => {}
            Action::EndField => return Ok(self.take_current()),
            Action::CloseBody => self.unterminated = self.take_current(),
        }
        Ok(None)
    }

    pub fn finish(self) -> Result<(Vec<Token>, Option<FieldTokens>), Fault> {
        match self.position {
            Position::Closed => Ok((self.header, self.unterminated)),
            Position::EntityLevel => Err(Fault::NoBody),
            other => Err(Fault::UnclosedBraces(other.depth())),
        }
    }

    fn take_current(&mut self) -> Option<FieldTokens> {
        if self.current.is_empty() {
            return None;
        }
        let tokens = std::mem::take(&mut self.current);
        let group = FieldTokens {
            line: tokens[0].line,
            tokens,
        };
        tracing::trace!(line = group.line, tokens = ?group.texts(), "field tokens");
        Some(group)
    }
}

/// Run the machine over the tokens of an entity text.
///
/// Any structural fault is fatal for the entity.
pub fn parse_block(entity: &str, content: &str) -> Result<EntityBlock, DslError> {
    let mut machine = FieldBlockMachine::new();
    let mut fields = Vec::new();
    let last_line = content.lines().count() as u32;

    for token in lexer::lex(content) {
        let token_line = token.line;
        if let Some(group) = machine
            .feed(token)
            .map_err(|f| DslError::structure(entity, token_line, f.to_string()))?
        {
            fields.push(group);
        }
    }

    let (header, unterminated) = machine
        .finish()
        .map_err(|f| DslError::structure(entity, last_line, f.to_string()))?;
    Ok(EntityBlock {
        header,
        fields,
        unterminated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text, 1)
    }

    #[test]
    fn transitions_follow_depth() {
        let lbrace = token(TokenKind::LBrace, "{");
        let rbrace = token(TokenKind::RBrace, "}");
        let semi = token(TokenKind::Semicolon, ";");

        let (p, a) = transition(Position::EntityLevel, &lbrace).unwrap();
        assert_eq!((p, a), (Position::InFields, Action::OpenBody));
        let (p, a) = transition(p, &lbrace).unwrap();
        assert_eq!((p, a), (Position::InAnnotationBlock { depth: 2 }, Action::Append));
        let (p2, a) = transition(p, &semi).unwrap();
        assert_eq!((p2, a), (p, Action::Separator));
        let comma = token(TokenKind::Comma, ",");
        assert_eq!(transition(p, &comma).unwrap(), (p, Action::Append));
        let (p, _) = transition(p, &rbrace).unwrap();
        assert_eq!(p, Position::InFields);
        let (p, a) = transition(p, &semi).unwrap();
        assert_eq!((p, a), (Position::InFields, Action::EndField));
        let (p, a) = transition(p, &rbrace).unwrap();
        assert_eq!((p, a), (Position::Closed, Action::CloseBody));
    }

    #[test]
    fn closing_brace_at_entity_level_is_a_fault() {
        let rbrace = token(TokenKind::RBrace, "}");
        assert_eq!(
            transition(Position::EntityLevel, &rbrace),
            Err(Fault::ExtraClosingBrace)
        );
        assert_eq!(transition(Position::Closed, &rbrace), Err(Fault::ExtraClosingBrace));
    }

    #[test]
    fn single_field() {
        let block = parse_block("Person", "Person {\n  firstName : string { @NotNull ; } ;\n}\n")
            .unwrap();
        assert_eq!(block.fields.len(), 1);
        assert_eq!(
            block.fields[0].texts(),
            vec!["firstName", ":", "string", "{", "@NotNull", "}"]
        );
        assert_eq!(block.fields[0].line, 2);
        assert!(block.unterminated.is_none());
        assert_eq!(block.header[0].text, "Person");
    }

    #[test]
    fn field_may_span_lines() {
        let src = "Car {\n id : int {\n   @Id;\n   @NotNull\n } ;\n brand : string ;\n}";
        let block = parse_block("Car", src).unwrap();
        assert_eq!(block.fields.len(), 2);
        assert_eq!(block.fields[0].texts(), vec!["id", ":", "int", "{", "@Id", "@NotNull", "}"]);
        assert_eq!(block.fields[1].texts(), vec!["brand", ":", "string"]);
    }

    #[test]
    fn comma_between_decorations_is_kept_for_the_field_processor() {
        let block = parse_block("Car", "Car { id : int { @Id, @NotNull } ; }").unwrap();
        assert_eq!(
            block.fields[0].texts(),
            vec!["id", ":", "int", "{", "@Id", ",", "@NotNull", "}"]
        );
    }

    #[test]
    fn parameter_split_across_lines_stays_in_one_field() {
        let src = "Person {\n  id : int { @GeneratedValue(SEQUENCE,\n      GEN, SEQ) } ;\n}\n";
        let block = parse_block("Person", src).unwrap();
        assert_eq!(block.fields.len(), 1);
        assert_eq!(
            block.fields[0].texts(),
            vec!["id", ":", "int", "{", "@GeneratedValue(SEQUENCE, GEN, SEQ)", "}"]
        );
        assert_eq!(block.fields[0].line, 2);
    }

    #[test]
    fn empty_statements_are_skipped() {
        let block = parse_block("Car", "Car { ; id : int ;; }").unwrap();
        assert_eq!(block.fields.len(), 1);
    }

    #[test]
    fn missing_semicolon_is_kept_as_unterminated() {
        let block = parse_block("Car", "Car {\n id : int ;\n name : string\n}").unwrap();
        assert_eq!(block.fields.len(), 1);
        let pending = block.unterminated.unwrap();
        assert_eq!(pending.texts(), vec!["name", ":", "string"]);
        assert_eq!(pending.line, 3);
    }

    #[test]
    fn unbalanced_braces_are_fatal() {
        let err = parse_block("Car", "Car {\n id : int { @Id ;\n}\n").unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.message(), "unbalanced braces (1 '}' missing)");
        assert_eq!(err.to_string(), "Car (line 3) : unbalanced braces (1 '}' missing)");
    }

    #[test]
    fn extra_closing_brace_is_fatal() {
        let err = parse_block("Car", "Car {\n id : int ;\n}\n}").unwrap_err();
        assert!(err.is_fatal());
        assert!(err.message().contains("unexpected '}'"));
    }

    #[test]
    fn content_after_body_is_fatal() {
        let err = parse_block("Car", "Car { id : int ; }\nextra").unwrap_err();
        assert_eq!(
            err.message(),
            "unexpected element 'extra' after the end of the entity"
        );
        if let DslError::Structure { line, .. } = err {
            assert_eq!(line, 2);
        }
    }

    #[test]
    fn comments_after_body_are_fine() {
        assert!(parse_block("Car", "Car { id : int ; }\n// end\n  \n").is_ok());
    }

    #[test]
    fn missing_body_is_fatal() {
        let err = parse_block("Car", "Car").unwrap_err();
        assert_eq!(err.message(), "entity body not found ('{' expected)");
    }
}
