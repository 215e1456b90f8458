//! Driver input/output line format (spec.md §6): `<FEN> [tokens]`, where
//! a token is `<name>: <word> <word> …`. Tokens are a flat ordered list
//! rather than a fixed struct so passthrough lines (`illegal`/`legal`/
//! `fail`) round-trip without the driver needing to understand every
//! token it didn't itself produce.

use crate::error::EngineError;

/// One `name: word word …` token. A bare `name:` with no following
/// words (e.g. `fail:`) has an empty `words`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub name: String,
    pub words: Vec<String>,
}

impl Token {
    #[must_use]
    pub fn new(name: impl Into<String>, words: Vec<String>) -> Self {
        Token { name: name.into(), words }
    }

    #[must_use]
    pub fn marker(name: impl Into<String>) -> Self {
        Token { name: name.into(), words: Vec::new() }
    }

    #[must_use]
    pub fn text(name: impl Into<String>, text: &str) -> Self {
        Token { name: name.into(), words: text.split_whitespace().map(str::to_string).collect() }
    }
}

/// A parsed input line: the goal position's FEN plus any prior-progress
/// tokens carried over from an earlier driver invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputLine {
    pub fen: String,
    pub tokens: Vec<Token>,
}

/// Splits a non-empty, non-blank line into its 6 FEN fields and a
/// trailing list of tokens.
///
/// # Errors
/// Returns [`EngineError::Parse`] if fewer than 6 whitespace-separated
/// fields are present before any tokens.
pub fn parse_line(line: &str) -> Result<InputLine, EngineError> {
    let mut words = line.split_whitespace();
    let fen_fields: Vec<&str> = (&mut words).take(6).collect();
    if fen_fields.len() < 6 {
        return Err(EngineError::Parse(format!(
            "expected 6 FEN fields, found {}: {line:?}",
            fen_fields.len()
        )));
    }
    let fen = fen_fields.join(" ");
    let rest: Vec<&str> = words.collect();
    let tokens = parse_tokens(&rest.join(" "));
    Ok(InputLine { fen, tokens })
}

/// Parses `name: word word name2: word …` into a flat token list. A run
/// of words before the first `name:` is silently dropped (malformed
/// input); this mirrors the driver's general policy of never panicking
/// on an annotation it doesn't recognise.
#[must_use]
pub fn parse_tokens(rest: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current: Option<Token> = None;
    for word in rest.split_whitespace() {
        if let Some(name) = word.strip_suffix(':') {
            if let Some(tok) = current.take() {
                tokens.push(tok);
            }
            current = Some(Token { name: name.to_string(), words: Vec::new() });
        } else if let Some(tok) = current.as_mut() {
            tok.words.push(word.to_string());
        }
    }
    if let Some(tok) = current.take() {
        tokens.push(tok);
    }
    tokens
}

#[must_use]
pub fn format_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| if t.words.is_empty() { format!("{}:", t.name) } else { format!("{}: {}", t.name, t.words.join(" ")) })
        .collect::<Vec<_>>()
        .join(" ")
}

#[must_use]
pub fn format_line(fen: &str, tokens: &[Token]) -> String {
    if tokens.is_empty() {
        fen.to_string()
    } else {
        format!("{fen} {}", format_tokens(tokens))
    }
}

/// Finds the first token named `name`.
#[must_use]
pub fn find<'a>(tokens: &'a [Token], name: &str) -> Option<&'a Token> {
    tokens.iter().find(|t| t.name == name)
}

/// Reads the `status: N=<int>` token's node count, if present.
#[must_use]
pub fn resume_nodes(tokens: &[Token]) -> Option<u64> {
    find(tokens, "status")?.words.iter().find_map(|w| w.strip_prefix("N=")?.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_fresh_startpos_line() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let parsed = parse_line(fen).unwrap();
        assert_eq!(parsed.fen, fen);
        assert!(parsed.tokens.is_empty());
        assert_eq!(format_line(&parsed.fen, &parsed.tokens), fen);
    }

    #[test]
    fn parses_unknown_line_with_status_and_path_tokens() {
        let line = "8/8/8/8/8/8/8/8 w - - 0 1 unknown: path: e2e4 e7e5 status: N=12345 fail:";
        let parsed = parse_line(line).unwrap();
        assert_eq!(parsed.tokens[0], Token::marker("unknown"));
        assert_eq!(parsed.tokens[1], Token::new("path", vec!["e2e4".into(), "e7e5".into()]));
        assert_eq!(resume_nodes(&parsed.tokens), Some(12_345));
        assert_eq!(find(&parsed.tokens, "fail"), Some(&Token::marker("fail")));
        assert_eq!(format_line(&parsed.fen, &parsed.tokens), line);
    }

    #[test]
    fn rejects_a_line_missing_fen_fields() {
        assert!(parse_line("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq").is_err());
    }
}
