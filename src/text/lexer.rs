use std::fmt;

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    True,
    False,
    Null,
    Matches,
    IMatches,
    Contains,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Not,
    And,
    Or,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "identifier '{name}'"),
            Token::Str(text) => write!(f, "string {text:?}"),
            Token::Int(value) => write!(f, "number {value}"),
            Token::Float(value) => write!(f, "number {value:?}"),
            Token::True => f.write_str("'true'"),
            Token::False => f.write_str("'false'"),
            Token::Null => f.write_str("'null'"),
            Token::Matches => f.write_str("'matches'"),
            Token::IMatches => f.write_str("'imatches'"),
            Token::Contains => f.write_str("'contains'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
            Token::Comma => f.write_str("','"),
            Token::Not => f.write_str("'!'"),
            Token::And => f.write_str("'&&'"),
            Token::Or => f.write_str("'||'"),
            Token::Eq => f.write_str("'=='"),
            Token::Ne => f.write_str("'!='"),
            Token::Gt => f.write_str("'>'"),
            Token::Lt => f.write_str("'<'"),
            Token::Ge => f.write_str("'>='"),
            Token::Le => f.write_str("'<='"),
            Token::End => f.write_str("end of input"),
        }
    }
}

/// Token plus the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub(crate) token: Token,
    pub(crate) position: usize,
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '.'
}

fn keyword(word: &str) -> Option<Token> {
    match word {
        "true" => Some(Token::True),
        "false" => Some(Token::False),
        "null" => Some(Token::Null),
        "matches" => Some(Token::Matches),
        "imatches" => Some(Token::IMatches),
        "contains" => Some(Token::Contains),
        _ => None,
    }
}

pub(crate) struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.input[self.pos..].chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_while<F>(&mut self, predicate: F) -> &'a str
    where
        F: Fn(char) -> bool,
    {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if predicate(ch) {
                self.advance();
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    /// Consumes `second` when it follows, yielding `paired`, else `single`.
    fn pair(&mut self, second: char, paired: Token, single: Token) -> Token {
        if self.peek() == Some(second) {
            self.advance();
            paired
        } else {
            single
        }
    }

    fn string(&mut self, start: usize) -> Result<Token, ParseError> {
        let mut text = String::new();
        loop {
            match self.advance() {
                Some('"') => return Ok(Token::Str(text)),
                Some('\\') => match self.advance() {
                    Some(escaped) => text.push(escaped),
                    None => return Err(ParseError::UnterminatedString { position: start }),
                },
                Some(ch) => text.push(ch),
                None => return Err(ParseError::UnterminatedString { position: start }),
            }
        }
    }

    fn number(&mut self, start: usize) -> Result<Token, ParseError> {
        if self.peek() == Some('-') {
            self.advance();
        }
        self.read_while(|ch| ch.is_ascii_digit());
        let mut float = false;
        if self.peek() == Some('.') && self.peek_second().is_some_and(|ch| ch.is_ascii_digit()) {
            float = true;
            self.advance();
            self.read_while(|ch| ch.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            float = true;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            self.read_while(|ch| ch.is_ascii_digit());
        }
        let text = &self.input[start..self.pos];
        let invalid = || ParseError::InvalidNumber {
            text: text.to_owned(),
            position: start,
        };
        if float {
            match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Token::Float(value)),
                _ => Err(invalid()),
            }
        } else {
            text.parse::<i64>().map(Token::Int).map_err(|_| invalid())
        }
    }

    pub(crate) fn tokenize(mut self) -> Result<Vec<Spanned>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let position = self.pos;
            let Some(ch) = self.peek() else {
                tokens.push(Spanned {
                    token: Token::End,
                    position,
                });
                return Ok(tokens);
            };
            let token = match ch {
                '(' | ')' | '{' | '}' | ',' => {
                    self.advance();
                    match ch {
                        '(' => Token::LParen,
                        ')' => Token::RParen,
                        '{' => Token::LBrace,
                        '}' => Token::RBrace,
                        _ => Token::Comma,
                    }
                }
                '!' => {
                    self.advance();
                    self.pair('=', Token::Ne, Token::Not)
                }
                '>' => {
                    self.advance();
                    self.pair('=', Token::Ge, Token::Gt)
                }
                '<' => {
                    self.advance();
                    self.pair('=', Token::Le, Token::Lt)
                }
                '=' | '&' | '|' => {
                    self.advance();
                    if self.peek() != Some(ch) {
                        return Err(ParseError::UnexpectedChar {
                            found: ch,
                            position,
                        });
                    }
                    self.advance();
                    match ch {
                        '=' => Token::Eq,
                        '&' => Token::And,
                        _ => Token::Or,
                    }
                }
                '"' => {
                    self.advance();
                    self.string(position)?
                }
                '-' if self.peek_second().is_some_and(|next| next.is_ascii_digit()) => {
                    self.number(position)?
                }
                _ if ch.is_ascii_digit() => self.number(position)?,
                _ if is_ident_start(ch) => {
                    let word = self.read_while(is_ident_continue);
                    keyword(word).unwrap_or_else(|| Token::Ident(word.to_owned()))
                }
                _ => {
                    return Err(ParseError::UnexpectedChar {
                        found: ch,
                        position,
                    })
                }
            };
            tokens.push(Spanned { token, position });
        }
    }
}
