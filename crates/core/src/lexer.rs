//! Element lexer: splits entity text into tokens, line by line.
//!
//! A decoration whose parameter is still open at the end of a line carries
//! on into the next lines until its `)`.

/// Prefix of an annotation token, e.g. `@Id`, `@Max(12)`.
pub const ANNOTATION_PREFIX: char = '@';
/// Prefix of a tag token, e.g. `#Label(Name)`.
pub const TAG_PREFIX: char = '#';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifiers, type names, anything that is not punctuation
    Word,
    Colon,
    Semicolon,
    Comma,
    LBrace,
    RBrace,
    LParen,
    RParen,
    /// `@name` or `@name(...)`
    Annotation,
    /// `#name` or `#name(...)`
    Tag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: u32) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
        }
    }
}

/// Characters up to and including the space are layout.
pub fn is_layout(c: char) -> bool {
    c <= ' '
}

fn punctuation(c: char) -> Option<TokenKind> {
    match c {
        ':' => Some(TokenKind::Colon),
        ';' => Some(TokenKind::Semicolon),
        ',' => Some(TokenKind::Comma),
        '{' => Some(TokenKind::LBrace),
        '}' => Some(TokenKind::RBrace),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        _ => None,
    }
}

fn comment_at(chars: &[char], pos: usize) -> bool {
    chars[pos] == '/' && pos + 1 < chars.len() && chars[pos + 1] == '/'
}

/// Lex a whole entity text, numbering lines from 1.
pub fn lex(src: &str) -> Vec<Token> {
    let mut lexer = Lexer::new();
    let mut tokens: Vec<Token> = src
        .lines()
        .enumerate()
        .flat_map(|(i, line)| lexer.line(line, i as u32 + 1))
        .collect();
    tokens.extend(lexer.finish());
    tokens
}

/// Lex one line on its own. An unclosed parameter runs to the end of the line.
pub fn lex_line(line: &str, line_number: u32) -> Vec<Token> {
    let mut lexer = Lexer::new();
    let mut tokens = lexer.line(line, line_number);
    tokens.extend(lexer.finish());
    tokens
}

/// A decoration waiting for the `)` of its parameter.
#[derive(Debug)]
struct OpenParameter {
    token: Token,
    depth: u32,
}

/// Line lexer; the only state kept between lines is an open parameter.
#[derive(Debug, Default)]
pub struct Lexer {
    open: Option<OpenParameter>,
}

impl Lexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lex one line. A `//` ends the line; tokens seen before it are kept.
    pub fn line(&mut self, line: &str, line_number: u32) -> Vec<Token> {
        let chars: Vec<char> = line.chars().collect();
        let mut tokens = Vec::new();
        let mut pos = 0usize;

        if let Some(mut open) = self.open.take() {
            let start = skip_layout(&chars, 0);
            let (end, stop) = scan_parameter(&chars, start, open.depth);
            let piece: String = chars[start..end].iter().collect();
            let piece = piece.trim_end();
            if !piece.is_empty() {
                open.token.text.push(' ');
                open.token.text.push_str(piece);
            }
            if let ParameterEnd::Open(depth) = stop {
                open.depth = depth;
                self.open = Some(open);
                return tokens;
            }
            tokens.push(open.token);
            pos = end;
        }

        while pos < chars.len() {
            let c = chars[pos];

            if is_layout(c) {
                pos += 1;
                continue;
            }

            if comment_at(&chars, pos) {
                break;
            }

            if let Some(kind) = punctuation(c) {
                tokens.push(Token::new(kind, c.to_string(), line_number));
                pos += 1;
                continue;
            }

            if c == ANNOTATION_PREFIX || c == TAG_PREFIX {
                let kind = if c == ANNOTATION_PREFIX {
                    TokenKind::Annotation
                } else {
                    TokenKind::Tag
                };
                let (end, stop) = scan_decoration(&chars, pos);
                let text: String = chars[pos..end].iter().collect();
                let token = Token::new(kind, text.trim_end(), line_number);
                match stop {
                    DecorationEnd::Done => {
                        tokens.push(token);
                        pos = end;
                        continue;
                    }
                    DecorationEnd::Comment => {
                        tokens.push(token);
                        break;
                    }
                    DecorationEnd::OpenParameter(depth) => {
                        self.open = Some(OpenParameter { token, depth });
                        break;
                    }
                }
            }

            let start = pos;
            while pos < chars.len()
                && !is_layout(chars[pos])
                && punctuation(chars[pos]).is_none()
                && !comment_at(&chars, pos)
            {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            tokens.push(Token::new(TokenKind::Word, word, line_number));
        }

        tokens
    }

    /// The decoration still waiting for its `)` at the end of the text, if any.
    pub fn finish(self) -> Option<Token> {
        self.open.map(|open| open.token)
    }
}

fn skip_layout(chars: &[char], mut pos: usize) -> usize {
    while pos < chars.len() && is_layout(chars[pos]) {
        pos += 1;
    }
    pos
}

enum DecorationEnd {
    Done,
    Comment,
    OpenParameter(u32),
}

enum ParameterEnd {
    Closed,
    /// A brace cuts the parameter short; the brace is not consumed
    Brace,
    /// End of line (or `//`) with this many `(` still open
    Open(u32),
}

/// Scan a decoration starting at `start` (on its `@`/`#`).
///
/// The name part ends at layout (unless only layout separates it from a
/// `(`), a brace, `;` or `,`. The parameter part runs to the matching `)`,
/// and never across a brace.
fn scan_decoration(chars: &[char], start: usize) -> (usize, DecorationEnd) {
    let mut pos = start + 1;

    while pos < chars.len() {
        let c = chars[pos];
        if comment_at(chars, pos) {
            return (pos, DecorationEnd::Comment);
        }
        if c == '(' {
            let (end, stop) = scan_parameter(chars, pos, 0);
            let stop = match stop {
                ParameterEnd::Closed | ParameterEnd::Brace => DecorationEnd::Done,
                ParameterEnd::Open(depth) => DecorationEnd::OpenParameter(depth),
            };
            return (end, stop);
        }
        if is_layout(c) {
            let look = skip_layout(chars, pos);
            if look < chars.len() && chars[look] == '(' {
                pos = look;
                continue;
            }
            break;
        }
        if matches!(c, '{' | '}' | ';' | ',') {
            break;
        }
        pos += 1;
    }
    (pos, DecorationEnd::Done)
}

fn scan_parameter(chars: &[char], from: usize, mut depth: u32) -> (usize, ParameterEnd) {
    let mut pos = from;
    while pos < chars.len() {
        if comment_at(chars, pos) {
            return (pos, ParameterEnd::Open(depth));
        }
        match chars[pos] {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return (pos + 1, ParameterEnd::Closed);
                }
            }
            '{' | '}' => return (pos, ParameterEnd::Brace),
            _ => {}
        }
        pos += 1;
    }
    (pos, ParameterEnd::Open(depth))
}
