//! Static discovery of module requests in JavaScript sources.
//!
//! The scanner tokenises just enough of the language to skip comments,
//! strings, regular expressions and template literals, then looks for
//! `import`, `export … from`, `import()` and `require()` with literal
//! specifiers. Template substitutions are scanned like any other code.
//! Specifiers computed at run time are not seen.

use std::iter::Peekable;
use std::str::Chars;

/// How a module was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `import … from 'x'`, `import 'x'` or `export … from 'x'`.
    Static,
    /// `import('x')`.
    Dynamic,
    /// `require('x')`.
    Require,
}

impl RequestKind {
    /// `true` for requests served by the asynchronous loader.
    #[must_use]
    pub const fn is_async(self) -> bool {
        matches!(self, Self::Static | Self::Dynamic)
    }
}

/// One literal module request found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    /// The specifier as written.
    pub specifier: String,
    /// The syntax that requested it.
    pub kind: RequestKind,
}

impl ModuleRequest {
    fn new(specifier: &str, kind: RequestKind) -> Self {
        Self {
            specifier: specifier.to_owned(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    Num,
    Regex,
    Punct(char),
}

/// Return every literal module request in `source`, in source order.
///
/// # Examples
///
/// ```
/// use shinobi::capture::{RequestKind, scan_requests};
///
/// let found = scan_requests("import a from './a.mjs';\nconst b = require('./b.cjs');");
/// assert_eq!(found.len(), 2);
/// assert_eq!(found[0].specifier, "./a.mjs");
/// assert_eq!(found[1].kind, RequestKind::Require);
/// ```
#[must_use]
pub fn scan_requests(source: &str) -> Vec<ModuleRequest> {
    let tokens = tokenize(source);
    let mut requests = Vec::new();
    let mut index = 0;
    while let Some(token) = tokens.get(index) {
        let after_dot = index
            .checked_sub(1)
            .and_then(|prev| tokens.get(prev))
            .is_some_and(|prev| *prev == Token::Punct('.'));
        if let Token::Ident(word) = token {
            if !after_dot {
                let found = match word.as_str() {
                    "import" => match_import(&tokens, index),
                    "export" => match_export(&tokens, index),
                    "require" => match_call(&tokens, index, RequestKind::Require),
                    _ => None,
                };
                if let Some(request) = found {
                    requests.push(request);
                }
            }
        }
        index += 1;
    }
    requests
}

fn match_call(tokens: &[Token], index: usize, kind: RequestKind) -> Option<ModuleRequest> {
    match (
        tokens.get(index + 1),
        tokens.get(index + 2),
        tokens.get(index + 3),
    ) {
        (Some(Token::Punct('(')), Some(Token::Str(spec)), Some(Token::Punct(')' | ','))) => {
            Some(ModuleRequest::new(spec, kind))
        }
        _ => None,
    }
}

fn match_import(tokens: &[Token], index: usize) -> Option<ModuleRequest> {
    match tokens.get(index + 1)? {
        Token::Punct('(') => match_call(tokens, index, RequestKind::Dynamic),
        Token::Punct('.') => None,
        Token::Str(spec) => Some(ModuleRequest::new(spec, RequestKind::Static)),
        _ => find_from(tokens, index + 1),
    }
}

fn match_export(tokens: &[Token], index: usize) -> Option<ModuleRequest> {
    match tokens.get(index + 1)? {
        Token::Punct('*') => find_from(tokens, index + 2),
        Token::Punct('{') => {
            let close = tokens
                .iter()
                .skip(index + 2)
                .position(|token| *token == Token::Punct('}'))?;
            match_from(tokens, index + 2 + close + 1)
        }
        Token::Ident(word) if word == "type" => match_export(tokens, index + 1),
        _ => None,
    }
}

/// Look for `from '<spec>'` before the clause ends.
fn find_from(tokens: &[Token], start: usize) -> Option<ModuleRequest> {
    let mut index = start;
    while let Some(token) = tokens.get(index) {
        match token {
            Token::Ident(word) if word == "from" => {
                if let Some(request) = match_from(tokens, index) {
                    return Some(request);
                }
            }
            Token::Punct(';') | Token::Str(_) => return None,
            Token::Ident(word) if matches!(word.as_str(), "import" | "export") => return None,
            _ => {}
        }
        index += 1;
    }
    None
}

fn match_from(tokens: &[Token], index: usize) -> Option<ModuleRequest> {
    match (tokens.get(index), tokens.get(index + 1)) {
        (Some(Token::Ident(word)), Some(Token::Str(spec))) if word == "from" => {
            Some(ModuleRequest::new(spec, RequestKind::Static))
        }
        _ => None,
    }
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer {
        chars: source.chars().peekable(),
        tokens: Vec::new(),
    };
    lexer.lex(false);
    lexer.tokens
}

/// Keywords after which a `/` starts a regular expression.
const REGEX_PREFIX_KEYWORDS: &[&str] = &[
    "await", "case", "delete", "do", "else", "in", "instanceof", "new", "of", "return", "throw",
    "typeof", "void", "yield",
];

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    tokens: Vec<Token>,
}

impl Lexer<'_> {
    /// Tokenise until the input ends or, inside a template substitution,
    /// until the brace that closes it.
    fn lex(&mut self, in_substitution: bool) {
        let mut depth = 0_usize;
        while let Some(c) = self.chars.next() {
            match c {
                '/' if self.chars.peek() == Some(&'/') => self.skip_line_comment(),
                '/' if self.chars.peek() == Some(&'*') => self.skip_block_comment(),
                '/' if self.regex_allowed() => {
                    self.skip_regex();
                    self.tokens.push(Token::Regex);
                }
                '\'' | '"' => {
                    let text = read_string(&mut self.chars, c);
                    self.tokens.push(Token::Str(text));
                }
                '`' => self.template(),
                '{' => {
                    depth += 1;
                    self.tokens.push(Token::Punct('{'));
                }
                '}' if in_substitution && depth == 0 => return,
                '}' => {
                    depth = depth.saturating_sub(1);
                    self.tokens.push(Token::Punct('}'));
                }
                _ if c.is_alphabetic() || c == '_' || c == '$' => {
                    let mut word = String::from(c);
                    while let Some(&next) = self.chars.peek() {
                        if next.is_alphanumeric() || next == '_' || next == '$' {
                            word.push(next);
                            self.chars.next();
                        } else {
                            break;
                        }
                    }
                    self.tokens.push(Token::Ident(word));
                }
                _ if c.is_ascii_digit() => {
                    while self
                        .chars
                        .peek()
                        .is_some_and(|next| next.is_ascii_alphanumeric() || *next == '.')
                    {
                        self.chars.next();
                    }
                    self.tokens.push(Token::Num);
                }
                _ if c.is_whitespace() => {}
                _ => self.tokens.push(Token::Punct(c)),
            }
        }
    }

    /// A `/` divides after an operand and opens a regular expression
    /// anywhere else.
    fn regex_allowed(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some(Token::Punct(punct)) => !matches!(punct, ')' | ']' | '}' | '`'),
            Some(Token::Ident(word)) => REGEX_PREFIX_KEYWORDS.contains(&word.as_str()),
            Some(Token::Str(_) | Token::Num | Token::Regex) => false,
        }
    }

    fn skip_line_comment(&mut self) {
        for next in self.chars.by_ref() {
            if next == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.chars.next();
        let mut star = false;
        for next in self.chars.by_ref() {
            if star && next == '/' {
                break;
            }
            star = next == '*';
        }
    }

    /// Consume a regular expression body and its flags.
    fn skip_regex(&mut self) {
        let mut in_class = false;
        while let Some(c) = self.chars.next() {
            match c {
                '\\' => {
                    self.chars.next();
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => break,
                '\n' => return,
                _ => {}
            }
        }
        while self.chars.peek().is_some_and(|next| next.is_alphanumeric()) {
            self.chars.next();
        }
    }

    /// Consume a template literal. Its text becomes a string token when it
    /// has no substitutions; substitutions are tokenised in place.
    fn template(&mut self) {
        let mut text = String::new();
        let mut substituted = false;
        while let Some(c) = self.chars.next() {
            match c {
                '\\' => {
                    if let Some(escaped) = self.chars.next() {
                        text.push(escaped);
                    }
                }
                '`' => break,
                '$' if self.chars.peek() == Some(&'{') => {
                    self.chars.next();
                    substituted = true;
                    self.lex(true);
                }
                other => text.push(other),
            }
        }
        self.tokens.push(if substituted {
            Token::Punct('`')
        } else {
            Token::Str(text)
        });
    }
}

fn read_string<I: Iterator<Item = char>>(chars: &mut I, quote: char) -> String {
    let mut text = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    text.push(escaped);
                }
            }
            '\n' => break,
            _ if c == quote => break,
            other => text.push(other),
        }
    }
    text
}
