use std::{iter::Peekable, str::CharIndices};

use super::errors::LexError;
use super::tokens::{Keyword, Token, TokenKind};

/// Hand-written Cypher scanner.
///
/// A single left-to-right pass over the input producing the token stream the
/// parser consumes. Whitespace and comments (`// …` and `/* … */`) are
/// skipped; the final token is always [`TokenKind::Eof`].
pub struct Lexer<'a> {
    input: &'a str,
    iter: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            iter: input.char_indices().peekable(),
        }
    }

    /// Scans the whole input and returns the token stream, ending in `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;
        let (offset, ch) = match self.iter.peek().copied() {
            Some(pair) => pair,
            None => return Ok(Token::new(TokenKind::Eof, self.input.len())),
        };

        if ch.is_ascii_alphabetic() || ch == '_' {
            return Ok(self.scan_word(offset));
        }
        if ch.is_ascii_digit() {
            return self.scan_number(offset);
        }
        match ch {
            '\'' | '"' => self.scan_string(offset, ch),
            '$' => self.scan_parameter(offset),
            _ => self.scan_symbol(offset, ch),
        }
    }

    /// Skips whitespace, `//` line comments and `/* … */` block comments.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.iter.peek().copied() {
                Some((_, ch)) if ch.is_whitespace() => {
                    self.iter.next();
                }
                Some((offset, '/')) => {
                    match self.peek_second() {
                        Some('/') => {
                            // line comment runs to end of line
                            self.iter.next();
                            self.iter.next();
                            while let Some((_, ch)) = self.iter.peek().copied() {
                                if ch == '\n' {
                                    break;
                                }
                                self.iter.next();
                            }
                        }
                        Some('*') => {
                            self.iter.next();
                            self.iter.next();
                            self.skip_block_comment(offset)?;
                        }
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_block_comment(&mut self, start: usize) -> Result<(), LexError> {
        while let Some((_, ch)) = self.iter.next() {
            if ch == '*' {
                if let Some((_, '/')) = self.iter.peek().copied() {
                    self.iter.next();
                    return Ok(());
                }
            }
        }
        Err(LexError::UnterminatedComment { offset: start })
    }

    fn peek_second(&self) -> Option<char> {
        let mut clone = self.iter.clone();
        clone.next();
        clone.next().map(|(_, ch)| ch)
    }

    /// Identifier or keyword. Keywords match case-insensitively;
    /// identifiers preserve case.
    fn scan_word(&mut self, offset: usize) -> Token {
        let word = self.take_while(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        let kind = match Keyword::lookup(&word) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident(word),
        };
        Token::new(kind, offset)
    }

    fn scan_number(&mut self, offset: usize) -> Result<Token, LexError> {
        let mut text = self.take_while(|ch| ch.is_ascii_digit());
        let mut is_float = false;
        // a fractional part requires a digit after the period, so `n.prop`
        // style accesses never swallow the dot
        if let Some((_, '.')) = self.iter.peek().copied() {
            if self.peek_second().is_some_and(|ch| ch.is_ascii_digit()) {
                is_float = true;
                self.iter.next();
                text.push('.');
                text.push_str(&self.take_while(|ch| ch.is_ascii_digit()));
            }
        }
        let kind = if is_float {
            let value = text
                .parse::<f64>()
                .map_err(|_| LexError::InvalidNumber {
                    text: text.clone(),
                    offset,
                })?;
            TokenKind::Float(value)
        } else {
            let value = text
                .parse::<i64>()
                .map_err(|_| LexError::InvalidNumber {
                    text: text.clone(),
                    offset,
                })?;
            TokenKind::Integer(value)
        };
        Ok(Token::new(kind, offset))
    }

    /// Quoted string with the escapes `\\ \' \" \n \t \r`.
    fn scan_string(&mut self, offset: usize, quote: char) -> Result<Token, LexError> {
        self.iter.next(); // opening quote
        let mut value = String::new();
        loop {
            match self.iter.next() {
                Some((_, ch)) if ch == quote => {
                    return Ok(Token::new(TokenKind::Str(value), offset));
                }
                Some((esc_offset, '\\')) => match self.iter.next() {
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, '\'')) => value.push('\''),
                    Some((_, '"')) => value.push('"'),
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, other)) => {
                        return Err(LexError::UnexpectedChar {
                            ch: other,
                            offset: esc_offset,
                        })
                    }
                    None => return Err(LexError::UnterminatedString { offset }),
                },
                Some((_, ch)) => value.push(ch),
                None => return Err(LexError::UnterminatedString { offset }),
            }
        }
    }

    fn scan_parameter(&mut self, offset: usize) -> Result<Token, LexError> {
        self.iter.next(); // '$'
        match self.iter.peek().copied() {
            Some((_, ch)) if ch.is_ascii_alphabetic() || ch == '_' => {
                let name = self.take_while(|ch| ch.is_ascii_alphanumeric() || ch == '_');
                Ok(Token::new(TokenKind::Parameter(name), offset))
            }
            _ => Err(LexError::EmptyParameter { offset }),
        }
    }

    fn scan_symbol(&mut self, offset: usize, ch: char) -> Result<Token, LexError> {
        self.iter.next();
        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '=' => TokenKind::Eq,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '|' => TokenKind::Pipe,
            '<' => match self.iter.peek().copied() {
                Some((_, '>')) => {
                    self.iter.next();
                    TokenKind::Neq
                }
                Some((_, '=')) => {
                    self.iter.next();
                    TokenKind::Lte
                }
                _ => TokenKind::Lt,
            },
            '>' => match self.iter.peek().copied() {
                Some((_, '=')) => {
                    self.iter.next();
                    TokenKind::Gte
                }
                _ => TokenKind::Gt,
            },
            other => return Err(LexError::UnexpectedChar { ch: other, offset }),
        };
        Ok(Token::new(kind, offset))
    }

    fn take_while<F: Fn(char) -> bool>(&mut self, predicate: F) -> String {
        let mut value = String::new();
        while let Some((_, ch)) = self.iter.peek().copied() {
            if !predicate(ch) {
                break;
            }
            value.push(ch);
            self.iter.next();
        }
        value
    }
}

/// Convenience wrapper producing the token stream for `input`.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).tokenize()
}
