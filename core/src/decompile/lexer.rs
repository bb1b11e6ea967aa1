//! Tokenizer for stored `CREATE VIRTUAL TABLE` text.

/// A lexical token of SQL DDL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Bare word: keyword or unquoted identifier.
    Word(String),
    /// `"..."`, `` `...` `` or `[...]` identifier, unquoted.
    QuotedIdent(String),
    /// `'...'` string literal, unquoted.
    Str(String),
    /// Numeric literal, as written.
    Number(String),
    LParen,
    RParen,
    Comma,
    Equals,
    Dot,
    Semicolon,
    /// Any other character.
    Other(char),
}

impl Token {
    /// Returns `true` if this is a bare word matching `keyword` case-insensitively.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(word) if word.eq_ignore_ascii_case(keyword))
    }

    /// Text of a name-like token (word, quoted identifier or string).
    pub fn name(&self) -> Option<&str> {
        match self {
            Token::Word(s) | Token::QuotedIdent(s) | Token::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Source-like text of the token with quoting removed.
    pub fn text(&self) -> String {
        match self {
            Token::Word(s) | Token::QuotedIdent(s) | Token::Str(s) | Token::Number(s) => s.clone(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::Comma => ",".to_string(),
            Token::Equals => "=".to_string(),
            Token::Dot => ".".to_string(),
            Token::Semicolon => ";".to_string(),
            Token::Other(c) => c.to_string(),
        }
    }
}

/// Splits SQL text into tokens.
///
/// Comments (`-- ...` and `/* ... */`) and whitespace are dropped. The lexer
/// never fails: an unterminated quote runs to the end of the input.
pub fn tokenize(sql: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = sql.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '-' => {
                chars.next();
                if chars.peek() == Some(&'-') {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            break;
                        }
                    }
                } else {
                    tokens.push(Token::Other('-'));
                }
            }
            '/' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    let mut prev = '\0';
                    for c in chars.by_ref() {
                        if prev == '*' && c == '/' {
                            break;
                        }
                        prev = c;
                    }
                } else {
                    tokens.push(Token::Other('/'));
                }
            }
            '\'' => {
                chars.next();
                tokens.push(Token::Str(read_quoted(&mut chars, '\'')));
            }
            '"' | '`' => {
                chars.next();
                tokens.push(Token::QuotedIdent(read_quoted(&mut chars, ch)));
            }
            '[' => {
                chars.next();
                let mut ident = String::new();
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                    ident.push(c);
                }
                tokens.push(Token::QuotedIdent(ident));
            }
            '(' | ')' | ',' | '=' | '.' | ';' => {
                chars.next();
                tokens.push(match ch {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    '=' => Token::Equals,
                    '.' => Token::Dot,
                    _ => Token::Semicolon,
                });
            }
            c if c.is_ascii_digit() => {
                let mut number = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '.') {
                        break;
                    }
                    number.push(c);
                    chars.next();
                }
                tokens.push(Token::Number(number));
            }
            c if is_word_char(c) => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if !is_word_char(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
            other => {
                chars.next();
                tokens.push(Token::Other(other));
            }
        }
    }

    tokens
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Reads up to the closing `quote`; a doubled quote is an escaped quote.
fn read_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, quote: char) -> String {
    let mut value = String::new();
    while let Some(c) = chars.next() {
        if c == quote {
            if chars.peek() == Some(&quote) {
                chars.next();
                value.push(quote);
            } else {
                break;
            }
        } else {
            value.push(c);
        }
    }
    value
}
