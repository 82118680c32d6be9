use log::Level;

use super::lexer::{Spanned, Token, Tokenizer};
use crate::{
    core::{Predicate, ScalarValue, WildcardPattern},
    error::{ParseError, PredicateError},
    logging::predicate_log,
    option::ParserOptions,
};

/// Parses the textual predicate format.
///
/// ```text
/// expr       := or
/// or         := and ("||" and)*
/// and        := unary ("&&" unary)*
/// unary      := "!" unary | "(" expr ")" | "true" | "false"
///             | matches | imatches | contains | comparison | identifier
/// comparison := identifier ("=="|"!="|">"|"<"|">="|"<=") literal
/// matches    := "matches" "(" identifier "," string ")"
/// imatches   := "imatches" "(" identifier "," string ")"
/// contains   := "contains" "(" identifier "," "{" literal ("," literal)* "}" ")"
/// literal    := string | number | "true" | "false" | "null"
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PredicateParser {
    options: ParserOptions,
}

impl PredicateParser {
    /// Creates a parser with the given options.
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Options this parser was built with.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parses `input` into a predicate.
    pub fn parse(&self, input: &str) -> Result<Predicate, ParseError> {
        let parsed = Tokenizer::new(input)
            .tokenize()
            .and_then(|tokens| Parser::new(tokens, self.options).parse());
        if let Err(err) = &parsed {
            predicate_log!(
                Level::Debug,
                "parse_error",
                "position={} error={}",
                err.position(),
                err
            );
        }
        parsed
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    options: ParserOptions,
}

impl Parser {
    fn new(tokens: Vec<Spanned>, options: ParserOptions) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            options,
        }
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .map_or(&Token::End, |spanned| &spanned.token)
    }

    fn position(&self) -> usize {
        match self.tokens.get(self.pos) {
            Some(spanned) => spanned.position,
            None => self.tokens.last().map_or(0, |spanned| spanned.position),
        }
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        ParseError::Expected {
            expected,
            found: self.peek().to_string(),
            position: self.position(),
        }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), ParseError> {
        if *self.peek() == token {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(ParseError::TooDeep {
                limit: self.options.max_depth,
                position: self.position(),
            });
        }
        Ok(())
    }

    fn parse(mut self) -> Result<Predicate, ParseError> {
        let predicate = self.parse_or()?;
        if *self.peek() != Token::End {
            return Err(self.unexpected("end of input"));
        }
        Ok(predicate)
    }

    fn parse_or(&mut self) -> Result<Predicate, ParseError> {
        let position = self.position();
        let mut operands = vec![self.parse_and()?];
        while *self.peek() == Token::Or {
            self.advance();
            operands.push(self.parse_and()?);
        }
        combine(operands, position, Predicate::or)
    }

    fn parse_and(&mut self) -> Result<Predicate, ParseError> {
        let position = self.position();
        let mut operands = vec![self.parse_unary()?];
        while *self.peek() == Token::And {
            self.advance();
            operands.push(self.parse_unary()?);
        }
        combine(operands, position, Predicate::and)
    }

    fn parse_unary(&mut self) -> Result<Predicate, ParseError> {
        let position = self.position();
        match self.peek() {
            Token::Not => {
                self.advance();
                self.descend()?;
                let operand = self.parse_unary()?;
                self.depth -= 1;
                Ok(Predicate::negation(operand))
            }
            Token::LParen => {
                self.advance();
                self.descend()?;
                let inner = self.parse_or()?;
                self.expect(Token::RParen, "')'")?;
                self.depth -= 1;
                Ok(inner)
            }
            Token::True => {
                self.advance();
                Ok(Predicate::constant(true))
            }
            Token::False => {
                self.advance();
                Ok(Predicate::constant(false))
            }
            Token::Matches => {
                self.advance();
                self.parse_matches(position, self.options.case_sensitive)
            }
            Token::IMatches => {
                self.advance();
                self.parse_matches(position, false)
            }
            Token::Contains => {
                self.advance();
                self.parse_contains(position)
            }
            Token::Ident(_) => self.parse_comparison(),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn parse_literal(&mut self) -> Result<ScalarValue, ParseError> {
        let value = match self.peek() {
            Token::Str(text) => ScalarValue::Utf8(text.clone()),
            Token::Int(value) => ScalarValue::Int64(*value),
            Token::Float(value) => ScalarValue::Float64(*value),
            Token::True => ScalarValue::Boolean(true),
            Token::False => ScalarValue::Boolean(false),
            Token::Null => ScalarValue::Null,
            _ => return Err(self.unexpected("literal")),
        };
        self.advance();
        Ok(value)
    }

    fn parse_comparison(&mut self) -> Result<Predicate, ParseError> {
        let position = self.position();
        let attribute = self.parse_identifier()?;
        let operator = match self.peek() {
            Token::Eq | Token::Ne | Token::Gt | Token::Lt | Token::Ge | Token::Le => self.advance(),
            // A bare identifier is a boolean test.
            _ => return Ok(Predicate::equal_to(attribute, true)),
        };
        let value = self.parse_literal()?;
        let built = match operator {
            Token::Eq => Ok(Predicate::equal_to(attribute, value)),
            Token::Ne => Ok(!Predicate::equal_to(attribute, value)),
            Token::Gt => Predicate::greater_than(attribute, value),
            Token::Lt => Predicate::lesser_than(attribute, value),
            Token::Ge => Predicate::greater_than(attribute.clone(), value.clone())
                .and_then(|bound| Predicate::or([bound, Predicate::equal_to(attribute, value)])),
            _ => Predicate::lesser_than(attribute.clone(), value.clone())
                .and_then(|bound| Predicate::or([bound, Predicate::equal_to(attribute, value)])),
        };
        built.map_err(|source| ParseError::Invalid { position, source })
    }

    fn parse_matches(
        &mut self,
        position: usize,
        case_sensitive: bool,
    ) -> Result<Predicate, ParseError> {
        self.expect(Token::LParen, "'('")?;
        let attribute = self.parse_identifier()?;
        self.expect(Token::Comma, "','")?;
        let text = match self.peek() {
            Token::Str(text) => text.clone(),
            _ => return Err(self.unexpected("pattern string")),
        };
        self.advance();
        self.expect(Token::RParen, "')'")?;
        WildcardPattern::new(text, case_sensitive)
            .map(|pattern| Predicate::like(attribute, pattern))
            .map_err(|err| ParseError::Invalid {
                position,
                source: PredicateError::from(err),
            })
    }

    fn parse_contains(&mut self, position: usize) -> Result<Predicate, ParseError> {
        self.expect(Token::LParen, "'('")?;
        let attribute = self.parse_identifier()?;
        self.expect(Token::Comma, "','")?;
        self.expect(Token::LBrace, "'{'")?;
        let mut values = vec![self.parse_literal()?];
        while *self.peek() == Token::Comma {
            self.advance();
            values.push(self.parse_literal()?);
        }
        self.expect(Token::RBrace, "'}'")?;
        self.expect(Token::RParen, "')'")?;
        Predicate::in_set(attribute, values)
            .map_err(|source| ParseError::Invalid { position, source })
    }
}

fn combine(
    mut operands: Vec<Predicate>,
    position: usize,
    build: fn(Vec<Predicate>) -> Result<Predicate, PredicateError>,
) -> Result<Predicate, ParseError> {
    if operands.len() == 1 {
        if let Some(single) = operands.pop() {
            return Ok(single);
        }
    }
    build(operands).map_err(|source| ParseError::Invalid { position, source })
}
