//! Tokenizer option string codec.
//!
//! FTS5 takes its tokenizer as a single option value such as
//! `porter remove_diacritics 1` or `unicode61 tokenchars '-_'`. Encoding
//! produces that value *unquoted*; the table compiler wraps it in a SQL
//! literal. Decoding is the inverse and is lenient: unknown arguments are
//! skipped so that strings written by newer tools still load.

use tracing::debug;

use crate::{TokenizerConfig, TokenizerParameters, TokenizerType};

/// Encodes a tokenizer configuration as an FTS5 `tokenize` value.
///
/// Parameters are emitted in a fixed order (`remove_diacritics`,
/// `categories`, `tokenchars`, `separators`, `case_sensitive`). String
/// values become FTS5 quoted arguments. For `trigram` only `case_sensitive`
/// is emitted; for every other type `case_sensitive` is never emitted.
///
/// # Examples
///
/// ```
/// use fts_schema_core::{TokenizerConfig, TokenizerType, encode_tokenizer};
///
/// let cfg = TokenizerConfig::new(TokenizerType::Porter).with_remove_diacritics(1);
/// assert_eq!(encode_tokenizer(&cfg), "porter remove_diacritics 1");
///
/// let cfg = TokenizerConfig::new(TokenizerType::Unicode61).with_tokenchars("-_");
/// assert_eq!(encode_tokenizer(&cfg), "unicode61 tokenchars '-_'");
/// ```
pub fn encode_tokenizer(config: &TokenizerConfig) -> String {
    let mut parts = vec![config.kind.as_str().to_string()];

    if let Some(params) = &config.parameters {
        if config.kind == TokenizerType::Trigram {
            if let Some(value) = params.case_sensitive {
                parts.push(format!("case_sensitive {value}"));
            }
        } else {
            if let Some(value) = params.remove_diacritics {
                parts.push(format!("remove_diacritics {value}"));
            }
            for (key, value) in [
                ("categories", &params.categories),
                ("tokenchars", &params.tokenchars),
                ("separators", &params.separators),
            ] {
                if let Some(value) = value {
                    parts.push(format!("{key} {}", quote_argument(value)));
                }
            }
        }
    }

    parts.join(" ")
}

/// Decodes an FTS5 `tokenize` value into a configuration.
///
/// The first argument names the tokenizer; when it is missing or not a
/// known tokenizer the type defaults to `unicode61` and every argument is
/// read as a parameter. For `porter`, an explicit base tokenizer
/// (`porter unicode61 ...`) is skipped. The remaining arguments are read
/// as `key value` pairs; unknown keys and unparseable numbers are skipped.
/// A string with no recognised parameters decodes with `parameters: None`.
///
/// # Examples
///
/// ```
/// use fts_schema_core::{TokenizerType, decode_tokenizer};
///
/// let cfg = decode_tokenizer("porter remove_diacritics 1");
/// assert_eq!(cfg.kind, TokenizerType::Porter);
/// assert_eq!(cfg.parameters.unwrap().remove_diacritics, Some(1));
///
/// let cfg = decode_tokenizer("unicode61 separators ' .,'");
/// assert_eq!(cfg.parameters.unwrap().separators.as_deref(), Some(" .,"));
///
/// assert_eq!(decode_tokenizer("").kind, TokenizerType::Unicode61);
/// ```
pub fn decode_tokenizer(value: &str) -> TokenizerConfig {
    let args = split_arguments(value);
    let mut rest = args.as_slice();

    let kind = match rest.first().and_then(|first| first.parse::<TokenizerType>().ok()) {
        Some(kind) => {
            rest = &rest[1..];
            kind
        }
        None => TokenizerType::Unicode61,
    };

    if kind == TokenizerType::Porter
        && let Some(base) = rest.first()
        && matches!(
            base.parse::<TokenizerType>(),
            Ok(TokenizerType::Unicode61 | TokenizerType::Ascii)
        )
    {
        rest = &rest[1..];
    }

    let mut params = TokenizerParameters::default();
    for pair in rest.chunks(2) {
        let [key, value] = pair else {
            debug!(argument = %pair[0], "Ignoring trailing tokenizer argument");
            continue;
        };
        match key.to_ascii_lowercase().as_str() {
            "remove_diacritics" => params.remove_diacritics = parse_flag(key, value),
            "case_sensitive" => params.case_sensitive = parse_flag(key, value),
            "categories" => params.categories = Some(value.clone()),
            "tokenchars" => params.tokenchars = Some(value.clone()),
            "separators" => params.separators = Some(value.clone()),
            _ => debug!(key = %key, value = %value, "Skipping unknown tokenizer argument"),
        }
    }

    TokenizerConfig {
        kind,
        parameters: (!params.is_empty()).then_some(params),
    }
}

fn parse_flag(key: &str, value: &str) -> Option<u8> {
    match value.parse::<u8>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            debug!(key = %key, value = %value, "Skipping non-numeric tokenizer argument");
            None
        }
    }
}

/// Quotes an FTS5 argument, doubling embedded single quotes.
fn quote_argument(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Splits an FTS5 argument list on whitespace, honouring quoted arguments.
///
/// Arguments may be quoted with `'`, `"` or `` ` `` (doubling the quote
/// escapes it) or with `[...]`. Quotes are removed from the result.
pub(crate) fn split_arguments(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let mut current = String::new();
        match ch {
            '\'' | '"' | '`' => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == ch {
                        if chars.peek() == Some(&ch) {
                            chars.next();
                            current.push(ch);
                        } else {
                            break;
                        }
                    } else {
                        current.push(c);
                    }
                }
            }
            '[' => {
                chars.next();
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                    current.push(c);
                }
            }
            _ => {
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    current.push(c);
                    chars.next();
                }
            }
        }
        out.push(current);
    }

    out
}
