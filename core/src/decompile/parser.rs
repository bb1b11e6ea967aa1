//! Recursive-descent parser for `CREATE VIRTUAL TABLE` statements.
//!
//! The grammar accepted is:
//!
//! ```text
//! statement  := CREATE VIRTUAL TABLE [IF NOT EXISTS] name ['.' name] USING module ['(' args ')']
//! args       := arg (',' arg)*
//! arg        := option | column
//! option     := key '=' value
//! column     := name [UNINDEXED]
//! ```
//!
//! The header and the argument list are parsed independently and each
//! carries its own `Result`: a garbled header does not prevent columns and
//! options from being recovered, and vice versa.

use std::fmt;

use super::lexer::{Token, tokenize};

/// Parsed statement. Header and arguments fail independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualTableAst {
    /// `CREATE VIRTUAL TABLE ... USING module` prefix.
    pub header: Result<TableHeader, ParseError>,
    /// Module arguments between the parentheses.
    pub args: Result<Vec<ModuleArg>, ParseError>,
}

/// Statement prefix up to the module name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    /// `IF NOT EXISTS` was present.
    pub if_not_exists: bool,
    /// Schema qualifier (`main` in `main.t`).
    pub schema: Option<String>,
    /// Table name.
    pub name: String,
    /// Virtual table module (`fts5`).
    pub module: String,
}

/// One module argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleArg {
    /// Column declaration.
    Column {
        /// Column name.
        name: String,
        /// Declared `UNINDEXED`.
        unindexed: bool,
    },
    /// `key=value` table option.
    Option {
        /// Option name as written.
        key: String,
        /// Option value with quoting removed.
        value: String,
    },
}

/// Reason a part of the statement could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Expected something else at token `position`.
    Expected {
        /// Description of what was expected.
        expected: &'static str,
        /// Token index.
        position: usize,
    },
    /// No `USING module (` sequence was found.
    MissingArgumentList,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Expected { expected, position } => {
                write!(f, "expected {expected} at token {position}")
            }
            ParseError::MissingArgumentList => f.write_str("missing module argument list"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses `sql` into a [`VirtualTableAst`].
pub fn parse_virtual_table(sql: &str) -> VirtualTableAst {
    let tokens = tokenize(sql);
    let mut parser = Parser::new(&tokens);

    let header = parser.parse_header();
    if header.is_err() {
        parser.seek_module_arguments();
    }
    let args = parser.parse_arguments();

    VirtualTableAst { header, args }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn expect_keyword(&mut self, keyword: &'static str) -> Result<(), ParseError> {
        match self.peek() {
            Some(token) if token.is_keyword(keyword) => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.expected(keyword)),
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_keyword(keyword)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_name(&mut self, what: &'static str) -> Result<String, ParseError> {
        match self.peek().and_then(Token::name) {
            Some(name) => {
                self.pos += 1;
                Ok(name.to_string())
            }
            None => Err(self.expected(what)),
        }
    }

    fn expected(&self, expected: &'static str) -> ParseError {
        ParseError::Expected {
            expected,
            position: self.pos,
        }
    }

    fn parse_header(&mut self) -> Result<TableHeader, ParseError> {
        self.expect_keyword("CREATE")?;
        self.expect_keyword("VIRTUAL")?;
        self.expect_keyword("TABLE")?;

        let if_not_exists = if self.eat_keyword("IF") {
            self.expect_keyword("NOT")?;
            self.expect_keyword("EXISTS")?;
            true
        } else {
            false
        };

        let first = self.expect_name("table name")?;
        let (schema, name) = if self.peek() == Some(&Token::Dot) {
            self.pos += 1;
            (Some(first), self.expect_name("table name")?)
        } else {
            (None, first)
        };

        self.expect_keyword("USING")?;
        let module = self.expect_name("module name")?;

        Ok(TableHeader {
            if_not_exists,
            schema,
            name,
            module,
        })
    }

    /// Moves to the first `USING <module>` pair after a failed header parse.
    fn seek_module_arguments(&mut self) {
        let found = self.tokens.windows(2).position(|pair| {
            pair[0].is_keyword("USING") && matches!(pair[1], Token::Word(_) | Token::QuotedIdent(_))
        });
        self.pos = match found {
            Some(index) => index + 2,
            None => self.tokens.len(),
        };
    }

    fn parse_arguments(&mut self) -> Result<Vec<ModuleArg>, ParseError> {
        if self.peek() != Some(&Token::LParen) {
            return Err(ParseError::MissingArgumentList);
        }
        self.pos += 1;

        let mut args = Vec::new();
        loop {
            let (segment, terminator) = self.collect_segment();
            if let Some(arg) = classify_segment(segment) {
                args.push(arg);
            }
            match terminator {
                Some(Token::Comma) => continue,
                // Closing parenthesis or end of input ends the list.
                _ => break,
            }
        }
        Ok(args)
    }

    /// Collects tokens up to a top-level `,` or `)`, returning the terminator.
    fn collect_segment(&mut self) -> (&'a [Token], Option<&'a Token>) {
        let tokens = self.tokens;
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token {
                Token::LParen => depth += 1,
                Token::RParen if depth > 0 => depth -= 1,
                Token::RParen | Token::Comma if depth == 0 => {
                    let segment = &tokens[start..self.pos];
                    self.pos += 1;
                    return (segment, Some(token));
                }
                _ => {}
            }
            self.pos += 1;
        }
        (&tokens[start..], None)
    }
}

fn classify_segment(segment: &[Token]) -> Option<ModuleArg> {
    let first = segment.first()?;

    if let Some(eq) = segment.iter().position(|t| *t == Token::Equals) {
        let key = segment[..eq]
            .iter()
            .map(Token::text)
            .collect::<Vec<_>>()
            .join(" ");
        let value = segment[eq + 1..]
            .iter()
            .map(Token::text)
            .collect::<Vec<_>>()
            .join(" ");
        return Some(ModuleArg::Option { key, value });
    }

    let name = first.name().map(str::to_string).unwrap_or_else(|| first.text());
    let unindexed = segment.len() > 1 && segment.last().is_some_and(|t| t.is_keyword("UNINDEXED"));
    Some(ModuleArg::Column { name, unindexed })
}
