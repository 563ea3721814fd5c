// src/lexer.rs
use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    True,
    False,
    Null,

    // Ident + literals
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),

    // Punct / operators
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Bang,
    Minus,

    AndAnd,
    OrOr,
    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexToken {
    pub kind: Token,
    pub span: Span,
}

// Allow: if current == Token::Dot, etc.
impl PartialEq<Token> for LexToken {
    fn eq(&self, other: &Token) -> bool {
        &self.kind == other
    }
}

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a str,
    i: usize,

    // position tracking
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            i: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.i..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.i..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.i += ch.len_utf8();

        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn current_span(&self) -> Span {
        Span {
            line: self.line,
            col: self.col,
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// Two-char operator if the next char matches, otherwise the one-char fallback
    fn pair(&mut self, next: char, both: Token, single: Option<Token>, span: Span) -> Result<Token, ParseError> {
        if self.peek() == Some(next) {
            self.bump();
            return Ok(both);
        }
        single.ok_or_else(|| {
            let hint = match both {
                Token::AndAnd => "'&' is not supported, use '&&'",
                Token::OrOr => "'|' is not supported, use '||'",
                Token::EqEq => "'=' is not supported, use '=='",
                _ => "unexpected character",
            };
            ParseError::at(span, hint)
        })
    }

    pub fn next_token(&mut self) -> Result<LexToken, ParseError> {
        self.skip_whitespace();
        let span = self.current_span();

        let Some(ch) = self.bump() else {
            return Ok(LexToken {
                kind: Token::Eof,
                span,
            });
        };

        let kind = match ch {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            '.' => Token::Dot,
            '-' => Token::Minus,
            '!' => self.pair('=', Token::Ne, Some(Token::Bang), span)?,
            '<' => self.pair('=', Token::Le, Some(Token::Lt), span)?,
            '>' => self.pair('=', Token::Ge, Some(Token::Gt), span)?,
            '=' => self.pair('=', Token::EqEq, None, span)?,
            '&' => self.pair('&', Token::AndAnd, None, span)?,
            '|' => self.pair('|', Token::OrOr, None, span)?,
            '"' | '\'' => self.lex_string(ch, span)?,
            c if c.is_ascii_digit() => self.lex_number(c, span)?,
            c if c.is_alphabetic() || c == '_' => self.lex_ident(c),
            other => {
                return Err(ParseError::at(
                    span,
                    format!("unexpected character '{other}'"),
                ))
            }
        };

        Ok(LexToken { kind, span })
    }

    fn lex_ident(&mut self, first: char) -> Token {
        let mut ident = String::new();
        ident.push(first);
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            _ => Token::Ident(ident),
        }
    }

    fn lex_number(&mut self, first: char, span: Span) -> Result<Token, ParseError> {
        let mut digits = String::new();
        digits.push(first);
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            digits.push(self.bump().unwrap_or_default());
        }

        // `1.5` is a float, `1.ToString()` is a member access on an int
        let is_float = self.peek() == Some('.') && matches!(self.peek_second(), Some(c) if c.is_ascii_digit());
        if is_float {
            digits.push('.');
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                digits.push(self.bump().unwrap_or_default());
            }
            return digits
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| ParseError::at(span, format!("invalid number literal '{digits}'")));
        }

        digits
            .parse::<i64>()
            .map(Token::Int)
            .map_err(|_| ParseError::at(span, format!("integer literal '{digits}' is out of range")))
    }

    fn lex_string(&mut self, quote: char, span: Span) -> Result<Token, ParseError> {
        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(ParseError::at(span, "unterminated string literal"));
            };
            if c == quote {
                return Ok(Token::Str(out));
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            let escaped = match self.bump() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some('0') => '\0',
                Some('\\') => '\\',
                Some('"') => '"',
                Some('\'') => '\'',
                Some(other) => {
                    return Err(ParseError::at(
                        span,
                        format!("unknown escape sequence '\\{other}'"),
                    ))
                }
                None => return Err(ParseError::at(span, "unterminated string literal")),
            };
            out.push(escaped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            if tok == Token::Eof {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a >= b && !c || d != 1.5"),
            vec![
                Token::Ident("a".into()),
                Token::Ge,
                Token::Ident("b".into()),
                Token::AndAnd,
                Token::Bang,
                Token::Ident("c".into()),
                Token::OrOr,
                Token::Ident("d".into()),
                Token::Ne,
                Token::Float(1.5),
            ]
        );
    }

    #[test]
    fn test_member_on_int_is_not_float() {
        assert_eq!(
            kinds("1.ToString()"),
            vec![
                Token::Int(1),
                Token::Dot,
                Token::Ident("ToString".into()),
                Token::LParen,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            kinds(r#""a\"b" 'c\n'"#),
            vec![Token::Str("a\"b".into()), Token::Str("c\n".into())]
        );
    }

    #[test]
    fn test_errors_carry_position() {
        let mut lexer = Lexer::new("Level\n  = Warning");
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!((err.line, err.col), (2, 3));
        assert!(err.message.contains("'=='"));

        let mut lexer = Lexer::new("\"open");
        assert!(lexer.next_token().unwrap_err().message.contains("unterminated"));
    }
}
