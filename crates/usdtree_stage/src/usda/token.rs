// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lexer tokens for the usda text format.

use logos::Logos;
use std::borrow::Cow;

fn trim_quotes<'a>(slice: &'a str, len: usize) -> &'a str {
    &slice[len..slice.len() - len]
}

/// A usda token
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token<'a> {
    /// `def`
    #[token("def")]
    Def,

    /// `over`
    #[token("over")]
    Over,

    /// `class`
    #[token("class")]
    Class,

    /// `prepend` list op
    #[token("prepend")]
    Prepend,

    /// `append` list op
    #[token("append")]
    Append,

    /// `add` list op
    #[token("add")]
    Add,

    /// `delete` list op
    #[token("delete")]
    Delete,

    /// `references` metadata key
    #[token("references")]
    References,

    /// Quoted string
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| trim_quotes(lex.slice(), 1))]
    String(&'a str),

    /// Triple-quoted string
    #[regex(r#""""([^"]|"[^"]|""[^"])*""""#, |lex| trim_quotes(lex.slice(), 3))]
    TripleString(&'a str),

    /// `@asset/path@`, or `@@@asset/path@@@` when the path holds an `@`
    #[regex(r"@[^@\n]*@", |lex| trim_quotes(lex.slice(), 1))]
    #[regex(r"@@@([^@\n]|@[^@\n]|@@[^@\n])*@@@", |lex| trim_quotes(lex.slice(), 3))]
    AssetRef(&'a str),

    /// `</prim/path>`
    #[regex(r"<[^>\n]*>", |lex| trim_quotes(lex.slice(), 1))]
    PathRef(&'a str),

    /// Bare identifier (type names, keys, namespaced property names)
    #[regex(r"[A-Za-z_][A-Za-z0-9_:.]*", |lex| lex.slice())]
    Identifier(&'a str),

    /// Numeric literal, kept as text
    #[regex(r"[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    Number(&'a str),

    /// Single punctuation character
    #[regex(r"[=(){}\[\],;:&%]", |lex| lex.slice().chars().next())]
    Punctuation(char),
}

impl<'a> Token<'a> {
    /// Prim specifier keyword
    pub fn is_specifier(&self) -> bool {
        matches!(self, Self::Def | Self::Over | Self::Class)
    }

    /// Unescaped payload of either string form
    pub fn try_as_string(&self) -> Option<Cow<'a, str>> {
        match *self {
            Self::String(s) | Self::TripleString(s) => Some(unescape(s)),
            _ => None,
        }
    }
}

/// Resolve backslash escapes in a string literal's payload
pub fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token<'_>> {
        Token::lexer(source).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn test_lex_prim_header() {
        let tokens = lex(r#"over "ref1" ( prepend references = @/tmp/a.usda@ )"#);
        assert_eq!(
            tokens,
            vec![
                Token::Over,
                Token::String("ref1"),
                Token::Punctuation('('),
                Token::Prepend,
                Token::References,
                Token::Punctuation('='),
                Token::AssetRef("/tmp/a.usda"),
                Token::Punctuation(')'),
            ]
        );
    }

    #[test]
    fn test_lex_skips_header_and_comments() {
        let tokens = lex("#usda 1.0\n# comment\ndef Xform \"a\" {}");
        assert_eq!(tokens[0], Token::Def);
        assert_eq!(tokens[1], Token::Identifier("Xform"));
    }

    #[test]
    fn test_lex_values() {
        let tokens = lex(r#"metersPerUnit = 0.01 doc = """multi "quoted" line""" </a/b>"#);
        assert_eq!(tokens[0], Token::Identifier("metersPerUnit"));
        assert_eq!(tokens[2], Token::Number("0.01"));
        assert_eq!(tokens[5], Token::TripleString(r#"multi "quoted" line"#));
        assert_eq!(tokens[6], Token::PathRef("/a/b"));
    }

    #[test]
    fn test_lex_triple_at_asset_path() {
        let tokens = lex("@@@/srv/user@host/a.usda@@@ @./b.usda@");
        assert_eq!(
            tokens,
            vec![Token::AssetRef("/srv/user@host/a.usda"), Token::AssetRef("./b.usda")]
        );
    }

    #[test]
    fn test_string_escapes_are_resolved() {
        let tokens = lex(r#""say \"hi\" to C:\\temp""#);
        assert_eq!(tokens[0].try_as_string().unwrap(), r#"say "hi" to C:\temp"#);
        assert!(matches!(unescape("plain"), Cow::Borrowed("plain")));
        assert_eq!(unescape(r"a\nb\tc"), "a\nb\tc");
    }

    #[test]
    fn test_keywords_do_not_swallow_identifiers() {
        let tokens = lex("define overs");
        assert_eq!(tokens, vec![Token::Identifier("define"), Token::Identifier("overs")]);
    }
}
