//! Type-expression parser
//!
//! Parses the textual form printed by [`Ty`]'s `Display`: `i32`, `String`,
//! `Uuid?`, `Option<i64>`, `List<Address>`, `u8[]`, `Map<String, List<i64>>`.
//! Declared names are resolved through a caller-supplied lookup so objects and
//! enums come out as distinct [`Ty`] variants.

use crate::error::TypeParseError;
use crate::ty::{PrimitiveKind, Ty};

/// Parse a type expression, resolving declared names with `resolve`
///
/// # Errors
/// Returns [`TypeParseError`] on syntax errors, wrong generic arity, or names
/// `resolve` does not know.
pub fn parse_ty(
    input: &str,
    resolve: &dyn Fn(&str) -> Option<Ty>,
) -> Result<Ty, TypeParseError> {
    let mut parser = Parser {
        input,
        chars: input.char_indices().peekable(),
        resolve,
    };
    let ty = parser.ty()?;
    parser.skip_ws();
    match parser.chars.peek() {
        None => Ok(ty),
        Some(&(at, c)) => Err(TypeParseError::Unexpected {
            input: input.to_string(),
            at,
            found: c,
        }),
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    resolve: &'a dyn Fn(&str) -> Option<Ty>,
}

impl Parser<'_> {
    fn skip_ws(&mut self) {
        while self.chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.chars.peek().is_some_and(|&(_, c)| c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), TypeParseError> {
        if self.eat(expected) {
            return Ok(());
        }
        match self.chars.peek() {
            Some(&(at, found)) => Err(TypeParseError::Unexpected {
                input: self.input.to_string(),
                at,
                found,
            }),
            None => Err(TypeParseError::UnexpectedEnd {
                input: self.input.to_string(),
            }),
        }
    }

    fn ident(&mut self) -> Result<&str, TypeParseError> {
        self.skip_ws();
        let start = match self.chars.peek() {
            Some(&(at, c)) if c.is_alphabetic() || c == '_' => at,
            Some(&(at, found)) => {
                return Err(TypeParseError::Unexpected {
                    input: self.input.to_string(),
                    at,
                    found,
                })
            }
            None => {
                return Err(TypeParseError::UnexpectedEnd {
                    input: self.input.to_string(),
                })
            }
        };
        let mut end = start;
        while let Some(&(at, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                end = at + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        Ok(&self.input[start..end])
    }

    fn generic_args(&mut self) -> Result<Vec<Ty>, TypeParseError> {
        let mut args = Vec::new();
        if !self.eat('<') {
            return Ok(args);
        }
        loop {
            args.push(self.ty()?);
            if self.eat(',') {
                continue;
            }
            self.expect('>')?;
            return Ok(args);
        }
    }

    fn ty(&mut self) -> Result<Ty, TypeParseError> {
        let name = self.ident()?.to_string();
        let mut args = self.generic_args()?;
        let mut ty = self.base(&name, &mut args)?;
        loop {
            if self.eat('?') {
                ty = Ty::nullable(ty);
            } else if self.eat('[') {
                self.expect(']')?;
                ty = Ty::array(ty);
            } else {
                return Ok(ty);
            }
        }
    }

    fn base(&self, name: &str, args: &mut Vec<Ty>) -> Result<Ty, TypeParseError> {
        let found = args.len();
        let arity = |expected: usize| -> Result<(), TypeParseError> {
            if found == expected {
                Ok(())
            } else {
                Err(TypeParseError::Arity {
                    name: name.to_string(),
                    expected,
                    found,
                })
            }
        };
        if let Some(kind) = PrimitiveKind::from_name(name) {
            arity(0)?;
            return Ok(Ty::Primitive(kind));
        }
        let ty = match name {
            "String" | "string" | "str" => {
                arity(0)?;
                Ty::String
            }
            "Decimal" | "decimal" => {
                arity(0)?;
                Ty::Decimal
            }
            "DateTime" => {
                arity(0)?;
                Ty::DateTime
            }
            "Duration" => {
                arity(0)?;
                Ty::Duration
            }
            "Uuid" | "Guid" => {
                arity(0)?;
                Ty::Uuid
            }
            "Option" | "Nullable" => {
                arity(1)?;
                Ty::nullable(args.remove(0))
            }
            "List" | "Vec" => {
                arity(1)?;
                Ty::list(args.remove(0))
            }
            "Array" => {
                arity(1)?;
                Ty::array(args.remove(0))
            }
            "Seq" | "Sequence" | "Enumerable" => {
                arity(1)?;
                Ty::sequence(args.remove(0))
            }
            "Map" | "Dictionary" | "HashMap" => {
                arity(2)?;
                let key = args.remove(0);
                let value = args.remove(0);
                Ty::map(key, value)
            }
            declared => {
                arity(0)?;
                (self.resolve)(declared).ok_or_else(|| TypeParseError::UnknownType {
                    name: declared.to_string(),
                })?
            }
        };
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(name: &str) -> Option<Ty> {
        match name {
            "Color" => Some(Ty::enumeration("Color")),
            "Person" | "Address" => Some(Ty::object(name)),
            _ => None,
        }
    }

    fn parse(input: &str) -> Result<Ty, TypeParseError> {
        parse_ty(input, &resolve)
    }

    #[test]
    fn parses_builtins() {
        assert_eq!(parse("i32").unwrap(), Ty::I32);
        assert_eq!(parse("String").unwrap(), Ty::String);
        assert_eq!(parse("Uuid?").unwrap(), Ty::nullable(Ty::Uuid));
        assert_eq!(parse("Option<f64>").unwrap(), Ty::nullable(Ty::F64));
    }

    #[test]
    fn parses_generics() {
        assert_eq!(
            parse("Map<String, List<Address>>").unwrap(),
            Ty::map(Ty::String, Ty::list(Ty::object("Address")))
        );
        assert_eq!(parse("u8[]").unwrap(), Ty::array(Ty::U8));
        assert_eq!(parse(" Seq< Person > ").unwrap(), Ty::sequence(Ty::object("Person")));
    }

    #[test]
    fn resolves_declared_names() {
        assert_eq!(parse("Color?").unwrap(), Ty::nullable(Ty::enumeration("Color")));
        assert!(matches!(parse("Unknown"), Err(TypeParseError::UnknownType { .. })));
    }

    #[test]
    fn rejects_bad_arity() {
        assert!(matches!(parse("List<i32, i32>"), Err(TypeParseError::Arity { .. })));
        assert!(matches!(parse("i32<String>"), Err(TypeParseError::Arity { .. })));
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(matches!(parse("i32 i64"), Err(TypeParseError::Unexpected { .. })));
        assert!(matches!(parse("List<i32"), Err(TypeParseError::UnexpectedEnd { .. })));
    }

    #[test]
    fn round_trips_display() {
        let ty = Ty::map(Ty::String, Ty::sequence(Ty::nullable(Ty::enumeration("Color"))));
        assert_eq!(parse(&ty.to_string()).unwrap(), ty);
    }
}
