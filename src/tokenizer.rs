//! Splitting a command line into a program name and its arguments.
//!
//! This is the one piece of the crate with a real grammar. The accepted
//! language is deliberately narrow: a command line is a program word followed
//! by whitespace-separated arguments, where each argument is either a bare
//! word, a fully single-quoted string, or a fully double-quoted string.
//! There are no escapes, no nesting, and no shell metacharacters; a quoted
//! argument is exactly the text between its delimiters.
//!
//! ```
//! use run_commands::tokenizer::tokenize;
//!
//! let parsed = tokenize("awk 'NR % 2 == 0'").unwrap();
//! assert_eq!(parsed.program(), "awk");
//! assert_eq!(parsed.args().collect::<Vec<_>>(), vec!["NR % 2 == 0"]);
//! ```
//!
//! Known quirk, kept on purpose: the program word must start at offset 0, so
//! a command line with leading whitespace does not parse. Most real shells
//! tolerate it; this grammar never has.

use std::fmt;

/// A parsed word of the command line.
///
/// Carries both the raw span of the word in the input (including any
/// surrounding quotes) and its decoded text (quotes stripped, no escape
/// processing). Tokens are created during parsing and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Byte offset of the first character of the raw word in the input.
    pub offset: usize,
    /// Byte length of the raw word, quotes included.
    pub len: usize,
    /// The decoded text of the word.
    pub text: String,
}

/// The outcome of a successful parse: one program token plus zero or more
/// argument tokens, in left-to-right input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    tokens: Vec<Token>,
}

impl ParseResult {
    /// The program name, i.e. the decoded text of the first token.
    pub fn program(&self) -> &str {
        &self.tokens[0].text
    }

    /// The decoded argument texts, in the order they appeared.
    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.tokens[1..].iter().map(|t| t.text.as_str())
    }

    /// All tokens, program first.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

/// A parse failure: the offset of the first byte the parser could not
/// consume and a description of what it expected there.
///
/// The same type covers both "no production matched" and "input not fully
/// consumed". It keeps a copy of the input so [`fmt::Display`] can frame the
/// failure as a 1-based line number, the full text of that line, and a caret
/// under the offending column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    input: String,
    offset: usize,
    expected: &'static str,
}

impl ParseError {
    /// Byte offset of the first unconsumed character.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// What the parser expected at [`ParseError::offset`].
    pub fn expected(&self) -> &'static str {
        self.expected
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line_no = 1;
        let mut line_start = 0;
        for line in self.input.split('\n') {
            let line_end = line_start + line.len();
            if self.offset <= line_end {
                let column = self.input[line_start..self.offset].chars().count();
                writeln!(f, "Line {}: expected {}", line_no, self.expected)?;
                writeln!(f, "{line}")?;
                return write!(f, "{}^", " ".repeat(column));
            }
            line_start = line_end + 1;
            line_no += 1;
        }
        // Offset past the final newline: nothing left to underline.
        write!(f, "Line {}: expected {}", line_no, self.expected)
    }
}

impl std::error::Error for ParseError {}

/// Split a command line into a program token and argument tokens.
///
/// The whole input must be consumed; any suffix the grammar cannot account
/// for is an error. Parsing is pure and deterministic: the same input always
/// yields the same tokens, and there is no state carried between calls.
pub fn tokenize(input: &str) -> Result<ParseResult, ParseError> {
    let mut cursor = Cursor { input, pos: 0 };
    let mut tokens = vec![cursor.word()?];
    loop {
        cursor.skip_whitespace();
        if cursor.at_end() {
            break;
        }
        tokens.push(cursor.argument()?);
    }
    // The loop above runs to the end of the input, but the contract is
    // "full consumption or error", so keep the check explicit.
    if !cursor.at_end() {
        return Err(cursor.error("end of input"));
    }
    Ok(ParseResult { tokens })
}

/// Byte-offset cursor over the input. One method per grammar production.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos == self.input.len()
    }

    fn error(&self, expected: &'static str) -> ParseError {
        ParseError {
            input: self.input.to_string(),
            offset: self.pos,
            expected,
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// `word := non_whitespace+` — the program name and bare arguments.
    fn word(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if !c.is_whitespace()) {
            self.bump();
        }
        if self.pos == start {
            return Err(self.error("non-whitespace character"));
        }
        Ok(Token {
            offset: start,
            len: self.pos - start,
            text: self.input[start..self.pos].to_string(),
        })
    }

    /// `argument := squoted | dquoted | bare`, ordered choice.
    ///
    /// An opening quote commits to the quoted production: once a `'` or `"`
    /// starts an argument, a missing closing delimiter is a hard failure
    /// rather than a fallback to a bare word. A quote appearing later inside
    /// a bare word stays literal.
    fn argument(&mut self) -> Result<Token, ParseError> {
        match self.peek() {
            Some('\'') => self.quoted('\'', "closing single quote"),
            Some('"') => self.quoted('"', "closing double quote"),
            _ => self.word(),
        }
    }

    /// A fully quoted argument. The decoded text is the literal content
    /// between the delimiters; the delimiter character itself cannot occur
    /// inside (there is no escape mechanism).
    fn quoted(&mut self, delim: char, expected: &'static str) -> Result<Token, ParseError> {
        let start = self.pos;
        self.bump();
        let content_start = self.pos;
        while matches!(self.peek(), Some(c) if c != delim) {
            self.bump();
        }
        if self.peek() != Some(delim) {
            return Err(self.error(expected));
        }
        let text = self.input[content_start..self.pos].to_string();
        self.bump();
        Ok(Token {
            offset: start,
            len: self.pos - start,
            text,
        })
    }
}
