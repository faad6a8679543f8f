use crate::annotations;
use crate::error::{DslError, ErrorContext};
use crate::model::{Annotation, Scope, Tag};

/// Lexical parser for one annotation or tag token (`@Max(12)`, `#Label(x)`).
pub struct DecorationParser<'a> {
    ctx: ErrorContext<'a>,
}

impl<'a> DecorationParser<'a> {
    pub fn new(ctx: ErrorContext<'a>) -> Self {
        DecorationParser { ctx }
    }

    /// Name of the decoration: `"@Max(12)"` -> `"Max"`.
    ///
    /// Only letters; layout is tolerated between the name and `(`.
    pub fn name(&self, decoration: &str) -> Result<String, DslError> {
        let mut blank_found = false;
        let mut name = String::new();
        for c in decoration.chars().skip(1) {
            if c.is_alphabetic() {
                if blank_found {
                    return Err(self.invalid_name(decoration));
                }
                name.push(c);
            } else if c.is_whitespace() {
                blank_found = true;
            } else if c == '(' {
                break;
            } else {
                return Err(self.invalid_name(decoration));
            }
        }
        if name.is_empty() {
            return Err(self.invalid_name(decoration));
        }
        Ok(name)
    }

    /// Raw parameter between the first `(` and the last `)`, trimmed.
    /// `None` when the decoration has no parentheses.
    pub fn parameter(&self, decoration: &str) -> Result<Option<String>, DslError> {
        match (decoration.find('('), decoration.rfind(')')) {
            (None, None) => Ok(None),
            (Some(open), Some(close)) if open < close => {
                Ok(Some(decoration[open + 1..close].trim().to_owned()))
            }
            (Some(_), Some(_)) => Err(self
                .ctx
                .error(format!("{} : unbalanced ( and )", decoration))),
            (None, Some(_)) => Err(self.ctx.error(format!("{} : '(' missing", decoration))),
            (Some(_), None) => Err(self.ctx.error(format!("{} : ')' missing", decoration))),
        }
    }

    /// Parse an `@...` token into a registry-validated annotation bound to `scope`.
    pub fn parse_annotation(&self, decoration: &str, scope: Scope) -> Result<Annotation, DslError> {
        let name = self.name(decoration)?;
        let parameter = self.parameter(decoration)?;
        let kind = annotations::lookup(&name)
            .ok_or_else(|| self.ctx.error(format!("{} : unknown annotation", decoration)))?;
        kind.build(&self.ctx, parameter.as_deref(), scope)
    }

    /// Parse a `#...` token. Tags are not validated beyond their syntax.
    pub fn parse_tag(&self, decoration: &str) -> Result<Tag, DslError> {
        let name = self.name(decoration)?;
        let parameter = self.parameter(decoration)?;
        Ok(Tag { name, parameter })
    }

    fn invalid_name(&self, decoration: &str) -> DslError {
        self.ctx.error(format!("{} : invalid name", decoration))
    }
}
