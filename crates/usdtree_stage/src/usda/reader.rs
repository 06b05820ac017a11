// SPDX-License-Identifier: MIT OR Apache-2.0
//! usda reader.

use super::token::{unescape, Token};
use crate::error::{Result, StageError};
use crate::layer::Layer;
use crate::path::PrimPath;
use crate::prim::{PrimSpec, Reference, Specifier};
use logos::Logos;
use std::borrow::Cow;
use std::iter::Peekable;
use std::ops::Range;

type LexResult<'source> = std::result::Result<Token<'source>, ()>;

/// Parse usda text into an anonymous layer
pub fn read_layer(text: &str) -> Result<Layer> {
    Parser::new(text).read_layer()
}

/// Parser translates a list of tokens into a layer.
pub struct Parser<'a> {
    iter: Peekable<logos::SpannedIter<'a, Token<'a>>>,
    last_span: Range<usize>,
}

impl<'a> Parser<'a> {
    /// Create a new parser from source text.
    pub fn new(data: &'a str) -> Self {
        Self {
            iter: Token::lexer(data).spanned().peekable(),
            last_span: 0..0,
        }
    }

    fn error(&self, message: impl Into<String>) -> StageError {
        StageError::Parse {
            offset: self.last_span.start,
            message: message.into(),
        }
    }

    fn fetch_next(&mut self) -> Result<Token<'a>> {
        let Some((token, span)) = self.iter.next() else {
            return Err(self.error("Unexpected end of tokens"));
        };
        self.last_span = span;
        token.map_err(|()| self.error("Unrecognized input"))
    }

    fn peek_next(&mut self) -> Option<&LexResult<'a>> {
        self.iter.peek().map(|(token, _)| token)
    }

    fn is_next(&mut self, expected: Token) -> bool {
        matches!(self.peek_next(), Some(Ok(t)) if *t == expected)
    }

    fn is_next_pun(&mut self, value: char) -> bool {
        self.is_next(Token::Punctuation(value))
    }

    fn ensure_pun(&mut self, value: char) -> Result<()> {
        let token = self.fetch_next()?;
        if token == Token::Punctuation(value) {
            Ok(())
        } else {
            Err(self.error(format!("Expected '{value}', got {token:?}")))
        }
    }

    fn fetch_str(&mut self) -> Result<Cow<'a, str>> {
        let token = self.fetch_next()?;
        token
            .try_as_string()
            .ok_or_else(|| self.error(format!("Expected string, got {token:?}")))
    }

    /// Read a whole layer
    pub fn read_layer(mut self) -> Result<Layer> {
        let mut layer = Layer::anonymous();

        if self.is_next_pun('(') {
            self.read_layer_metadata(&mut layer)?;
        }

        while self.peek_next().is_some() {
            let (name, spec) = self.read_prim()?;
            layer.insert_root_prim(name, spec);
        }

        Ok(layer)
    }

    fn read_layer_metadata(&mut self, layer: &mut Layer) -> Result<()> {
        self.ensure_pun('(')?;

        loop {
            let token = self.fetch_next()?;
            match token {
                Token::Punctuation(')') => break,
                Token::Punctuation(';') => {}
                Token::String(doc) | Token::TripleString(doc) => {
                    layer.doc = Some(unescape(doc).into_owned());
                }
                Token::Identifier(key) => {
                    self.ensure_pun('=')?;
                    match key {
                        "doc" => layer.doc = Some(self.fetch_str()?.into_owned()),
                        "defaultPrim" => layer.default_prim = Some(self.fetch_str()?.into_owned()),
                        "upAxis" => {
                            let axis = self.fetch_str()?;
                            layer.up_axis = Some(axis.parse().map_err(|e: String| self.error(e))?);
                        }
                        "metersPerUnit" => {
                            let token = self.fetch_next()?;
                            let Token::Number(value) = token else {
                                return Err(self.error(format!("Expected number, got {token:?}")));
                            };
                            let value = value
                                .parse::<f64>()
                                .map_err(|e| self.error(format!("Invalid metersPerUnit: {e}")))?;
                            layer.meters_per_unit = Some(value);
                        }
                        _ => self.skip_value()?,
                    }
                }
                other => return Err(self.error(format!("Unexpected token in layer metadata: {other:?}"))),
            }
        }

        Ok(())
    }

    fn read_prim(&mut self) -> Result<(String, PrimSpec)> {
        let specifier = match self.fetch_next()? {
            Token::Def => Specifier::Def,
            Token::Over => Specifier::Over,
            Token::Class => Specifier::Class,
            other => return Err(self.error(format!("Expected prim specifier, got {other:?}"))),
        };

        let mut spec = PrimSpec::new(specifier);

        let name = match self.fetch_next()? {
            Token::Identifier(type_name) => {
                spec.type_name = Some(type_name.to_string());
                self.fetch_str()?
            }
            Token::String(name) => unescape(name),
            other => return Err(self.error(format!("Expected prim name, got {other:?}"))),
        };

        if PrimPath::abs_root().append_child(&name).is_err() {
            return Err(self.error(format!("Invalid prim name {name:?}")));
        }

        if self.is_next_pun('(') {
            self.read_prim_metadata(&mut spec)?;
        }

        self.ensure_pun('{')?;
        loop {
            match self.peek_next().cloned() {
                Some(Ok(Token::Punctuation('}'))) => {
                    self.fetch_next()?;
                    break;
                }
                Some(Ok(token)) if token.is_specifier() => {
                    let (child_name, child) = self.read_prim()?;
                    spec.insert_child(child_name, child);
                }
                Some(_) => self.skip_property()?,
                None => return Err(self.error(format!("Unterminated prim {name:?}"))),
            }
        }

        Ok((name.into_owned(), spec))
    }

    fn read_prim_metadata(&mut self, spec: &mut PrimSpec) -> Result<()> {
        self.ensure_pun('(')?;

        loop {
            let token = self.fetch_next()?;
            let list_op = match token {
                Token::Punctuation(')') => break,
                Token::Punctuation(';') | Token::String(_) | Token::TripleString(_) => continue,
                Token::Prepend | Token::Append | Token::Add | Token::Delete => {
                    Some(token)
                }
                _ => None,
            };

            let key = if list_op.is_some() { self.fetch_next()? } else { token };

            match key {
                Token::References => {
                    self.ensure_pun('=')?;
                    let references = self.read_reference_list()?;
                    if list_op != Some(Token::Delete) {
                        spec.references.extend(references);
                    }
                }
                Token::Identifier(_) => {
                    self.ensure_pun('=')?;
                    self.skip_value()?;
                }
                other => return Err(self.error(format!("Unexpected token in prim metadata: {other:?}"))),
            }
        }

        Ok(())
    }

    fn read_reference_list(&mut self) -> Result<Vec<Reference>> {
        if matches!(self.peek_next(), Some(Ok(Token::Identifier("None")))) {
            self.fetch_next()?;
            return Ok(Vec::new());
        }

        if !self.is_next_pun('[') {
            return Ok(vec![self.read_reference()?]);
        }

        self.ensure_pun('[')?;
        let mut out = Vec::new();
        loop {
            if self.is_next_pun(']') {
                self.fetch_next()?;
                break;
            }
            out.push(self.read_reference()?);
            if self.is_next_pun(',') {
                self.fetch_next()?;
            }
        }
        Ok(out)
    }

    fn read_reference(&mut self) -> Result<Reference> {
        let token = self.fetch_next()?;
        let Token::AssetRef(asset_path) = token else {
            return Err(self.error(format!("Asset reference expected, got {token:?}")));
        };
        let mut reference = Reference::new(asset_path);

        if let Some(Ok(Token::PathRef(path))) = self.peek_next().cloned() {
            self.fetch_next()?;
            reference.prim_path = Some(PrimPath::new(path).map_err(|e| self.error(e.to_string()))?);
        }

        if self.is_next_pun('(') {
            self.skip_value()?;
        }

        Ok(reference)
    }

    /// Skip a property declaration: `[custom] [uniform] type[] name [= value] [(metadata)]`
    fn skip_property(&mut self) -> Result<()> {
        loop {
            match self.peek_next().cloned() {
                Some(Ok(Token::Punctuation('='))) => {
                    self.fetch_next()?;
                    self.skip_value()?;
                    break;
                }
                Some(Ok(Token::Punctuation('('))) => break,
                Some(Ok(Token::Punctuation('}'))) | None => return Ok(()),
                Some(Ok(token)) if token.is_specifier() => return Ok(()),
                Some(_) => {
                    self.fetch_next()?;
                }
            }
        }

        if self.is_next_pun('(') {
            self.skip_value()?;
        }
        Ok(())
    }

    /// Skip one value, balancing brackets
    fn skip_value(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.fetch_next()? {
                Token::Punctuation('(' | '[' | '{') => depth += 1,
                Token::Punctuation(')' | ']' | '}') => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| self.error("Unbalanced brackets"))?;
                }
                _ => {}
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_layer_metadata() {
        let layer = read_layer(
            r#"#usda 1.0
            (
                """Layer doc"""
                defaultPrim = "World"
                metersPerUnit = 0.01
                upAxis = "Z"
                customLayerData = {
                    string creator = "test"
                }
            )
            "#,
        )
        .unwrap();

        assert_eq!(layer.doc.as_deref(), Some("Layer doc"));
        assert_eq!(layer.default_prim.as_deref(), Some("World"));
        assert_eq!(layer.meters_per_unit, Some(0.01));
        assert_eq!(layer.up_axis, Some(crate::layer::UpAxis::Z));
    }

    #[test]
    fn test_read_prims_and_references() {
        let layer = read_layer(
            r#"#usda 1.0

            def Xform "merge" (
                kind = "assembly"
            )
            {
                float3 xformOp:translate = (0, 1, 2)
                uniform token[] xformOpOrder = ["xformOp:translate"]
                rel material:binding = </Looks/Mat>

                over "ref1" (
                    prepend references = @./a.usda@
                )
                {
                }

                over "ref2" (
                    references = [@./b.usda@</Root>, @./c.usda@ (offset = 10; scale = 2)]
                )
                {
                    custom double weight
                    def Mesh "geo"
                    {
                        point3f[] points = [(0, 0, 0), (1, 0, 0)] (
                            interpolation = "vertex"
                        )
                    }
                }
            }
            "#,
        )
        .unwrap();

        let merge = layer.prim_spec(&PrimPath::new("/merge").unwrap()).unwrap();
        assert_eq!(merge.specifier, Specifier::Def);
        assert_eq!(merge.type_name.as_deref(), Some("Xform"));
        assert_eq!(merge.child_names().collect::<Vec<_>>(), vec!["ref1", "ref2"]);

        let ref1 = merge.child("ref1").unwrap();
        assert_eq!(ref1.specifier, Specifier::Over);
        assert_eq!(ref1.references, vec![Reference::new("./a.usda")]);

        let ref2 = merge.child("ref2").unwrap();
        assert_eq!(ref2.references.len(), 2);
        assert_eq!(ref2.references[0].prim_path.as_ref().unwrap().as_str(), "/Root");
        assert_eq!(ref2.references[1].asset_path, "./c.usda");

        let geo = layer
            .prim_spec(&PrimPath::new("/merge/ref2/geo").unwrap())
            .unwrap();
        assert_eq!(geo.type_name.as_deref(), Some("Mesh"));
    }

    #[test]
    fn test_delete_references_are_ignored() {
        let layer = read_layer(
            r#"over "a" ( delete references = @./x.usda@ ) { }"#,
        )
        .unwrap();
        let a = layer.prim_spec(&PrimPath::new("/a").unwrap()).unwrap();
        assert!(a.references.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            read_layer(r#"def Xform "a" {"#),
            Err(StageError::Parse { .. })
        ));
        assert!(matches!(
            read_layer(r#"( upAxis = "X" )"#),
            Err(StageError::Parse { .. })
        ));
        assert!(matches!(
            read_layer(r#"def "bad name" { }"#),
            Err(StageError::Parse { .. })
        ));
    }
}
