//! Extended query syntax.
//!
//! | token      | meaning                    |
//! |------------|----------------------------|
//! | `word`     | fuzzy match                |
//! | `'word`    | contains `word`            |
//! | `=word`    | field is exactly `word`    |
//! | `^word`    | starts with `word`         |
//! | `word$`    | ends with `word`           |
//! | `!word`    | does not contain `word`    |
//! | `!^word`   | does not start with `word` |
//! | `!word$`   | does not end with `word`   |
//!
//! Whitespace separates tokens; all tokens must hold for a field to match.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Fuzzy,
    Include,
    Exact,
    Prefix,
    Suffix,
    InverseInclude,
    InversePrefix,
    InverseSuffix,
}

impl TokenKind {
    /// Inverse tokens restrict matches but never produce highlight ranges.
    pub fn is_inverse(self) -> bool {
        matches!(
            self,
            TokenKind::InverseInclude | TokenKind::InversePrefix | TokenKind::InverseSuffix
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
        }
    }
}

/// Split a query into tokens. Without extended syntax the whole (trimmed)
/// query is one fuzzy token.
pub fn parse(query: &str, extended: bool) -> Vec<Token> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    if !extended {
        return vec![Token::new(TokenKind::Fuzzy, query)];
    }
    query.split_whitespace().map(parse_token).collect()
}

fn parse_token(raw: &str) -> Token {
    let candidates: [(TokenKind, Option<&str>); 7] = [
        (TokenKind::InversePrefix, raw.strip_prefix("!^")),
        (
            TokenKind::InverseSuffix,
            raw.strip_prefix('!').and_then(|s| s.strip_suffix('$')),
        ),
        (TokenKind::InverseInclude, raw.strip_prefix('!')),
        (TokenKind::Prefix, raw.strip_prefix('^')),
        (TokenKind::Suffix, raw.strip_suffix('$')),
        (TokenKind::Include, raw.strip_prefix('\'')),
        (TokenKind::Exact, raw.strip_prefix('=')),
    ];
    candidates
        .into_iter()
        .find_map(|(kind, text)| text.filter(|t| !t.is_empty()).map(|t| Token::new(kind, t)))
        .unwrap_or_else(|| Token::new(TokenKind::Fuzzy, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(query: &str) -> Vec<(TokenKind, String)> {
        parse(query, true)
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn plain_words_are_fuzzy() {
        assert_eq!(
            kinds("quick  fox"),
            vec![
                (TokenKind::Fuzzy, "quick".to_string()),
                (TokenKind::Fuzzy, "fox".to_string())
            ]
        );
    }

    #[test]
    fn operators() {
        assert_eq!(kinds("'exact")[0], (TokenKind::Include, "exact".into()));
        assert_eq!(kinds("=whole")[0], (TokenKind::Exact, "whole".into()));
        assert_eq!(kinds("^start")[0], (TokenKind::Prefix, "start".into()));
        assert_eq!(kinds("end$")[0], (TokenKind::Suffix, "end".into()));
        assert_eq!(kinds("!not")[0], (TokenKind::InverseInclude, "not".into()));
        assert_eq!(kinds("!^pre")[0], (TokenKind::InversePrefix, "pre".into()));
        assert_eq!(kinds("!suf$")[0], (TokenKind::InverseSuffix, "suf".into()));
    }

    #[test]
    fn bare_operators_are_literal() {
        assert_eq!(kinds("$")[0], (TokenKind::Fuzzy, "$".into()));
        assert_eq!(kinds("!")[0], (TokenKind::Fuzzy, "!".into()));
    }

    #[test]
    fn without_extended_syntax_query_is_one_token() {
        assert_eq!(
            parse("  ^quick fox$ ", false),
            vec![Token::new(TokenKind::Fuzzy, "^quick fox$")]
        );
    }

    #[test]
    fn blank_query_has_no_tokens() {
        assert!(parse("   ", true).is_empty());
        assert!(parse("", false).is_empty());
    }

    #[test]
    fn inverse_kinds() {
        assert!(TokenKind::InverseSuffix.is_inverse());
        assert!(!TokenKind::Include.is_inverse());
    }
}
