// src/parser.rs
use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{LexToken, Lexer, Span, Token};

type PResult<T> = Result<T, ParseError>;

/// Nesting limit for parentheses, unary operators and postfix chains
const MAX_DEPTH: usize = 128;

/// Height limit of the finished tree; binding and evaluation recurse over it
const MAX_HEIGHT: usize = 256;

/// Parsed subtree and its height
struct Node {
    syntax: Syntax,
    height: usize,
}

impl Node {
    fn leaf(syntax: Syntax) -> Self {
        Self { syntax, height: 1 }
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur: LexToken,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> PResult<Self> {
        let first = lexer.next_token()?;
        Ok(Self {
            lexer,
            cur: first,
            depth: 0,
        })
    }

    /// Parse a whole expression; trailing input is an error
    pub fn parse(src: &'a str) -> PResult<Syntax> {
        let mut parser = Parser::new(Lexer::new(src))?;
        if parser.at(Token::Eof) {
            return parser.err_here("empty expression");
        }
        let expr = parser.parse_expr()?;
        if !parser.at(Token::Eof) {
            return parser.err_here(format!("unexpected {:?} after expression", parser.cur.kind));
        }
        Ok(expr.syntax)
    }

    fn bump(&mut self) -> PResult<LexToken> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.cur, next))
    }

    fn at(&self, t: Token) -> bool {
        self.cur == t
    }

    fn span(&self) -> Span {
        self.cur.span
    }

    fn err_here<T>(&self, msg: impl Into<String>) -> PResult<T> {
        Err(ParseError::at(self.span(), msg))
    }

    fn consume(&mut self, t: Token) -> PResult<Option<Span>> {
        if self.at(t) {
            let sp = self.span();
            self.bump()?;
            Ok(Some(sp))
        } else {
            Ok(None)
        }
    }

    fn expect(&mut self, t: Token) -> PResult<Span> {
        if self.at(t.clone()) {
            let sp = self.span();
            self.bump()?;
            Ok(sp)
        } else if self.at(Token::Eof) {
            self.err_here(format!("expected {t:?} but the expression ended"))
        } else {
            self.err_here(format!("expected {:?} but got {:?}", t, self.cur.kind))
        }
    }

    fn expect_ident(&mut self) -> PResult<(String, Span)> {
        match &self.cur.kind {
            Token::Ident(name) => {
                let name = name.clone();
                let sp = self.span();
                self.bump()?;
                Ok((name, sp))
            }
            other => {
                let msg = format!("expected identifier but got {other:?}");
                self.err_here(msg)
            }
        }
    }

    fn enter(&mut self) -> PResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return self.err_here("expression is nested too deeply");
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Wrap `syntax` whose tallest child is `child_height` high
    fn node(&self, syntax: Syntax, child_height: usize) -> PResult<Node> {
        let height = child_height + 1;
        if height > MAX_HEIGHT {
            return Err(ParseError::at(syntax.span(), "expression is nested too deeply"));
        }
        Ok(Node { syntax, height })
    }

    fn binary(&self, op: BinaryOp, left: Node, right: Node, span: Span) -> PResult<Node> {
        let child_height = left.height.max(right.height);
        self.node(
            Syntax::Binary {
                op,
                left: Box::new(left.syntax),
                right: Box::new(right.syntax),
                span,
            },
            child_height,
        )
    }

    // ---- Expressions (precedence) ----
    fn parse_expr(&mut self) -> PResult<Node> {
        self.enter()?;
        let e = self.parse_or();
        self.leave();
        e
    }

    fn parse_or(&mut self) -> PResult<Node> {
        self.parse_chain(Token::OrOr, BinaryOp::Or, Self::parse_and)
    }

    fn parse_and(&mut self) -> PResult<Node> {
        self.parse_chain(Token::AndAnd, BinaryOp::And, Self::parse_unary)
    }

    /// `operand (op operand)*` as a balanced tree.
    ///
    /// `&&` and `||` are associative and evaluated left to right with
    /// short-circuit, so the shape does not change any result. It keeps long
    /// chains shallow.
    fn parse_chain(
        &mut self,
        token: Token,
        op: BinaryOp,
        operand: fn(&mut Self) -> PResult<Node>,
    ) -> PResult<Node> {
        let mut operands = vec![operand(self)?];
        let mut spans = Vec::new();
        while let Some(span) = self.consume(token.clone())? {
            spans.push(span);
            operands.push(operand(self)?);
        }
        self.fold_balanced(op, operands, &spans)
    }

    /// `spans[i]` is the operator between `operands[i]` and `operands[i + 1]`
    fn fold_balanced(&self, op: BinaryOp, mut operands: Vec<Node>, spans: &[Span]) -> PResult<Node> {
        if operands.len() <= 1 {
            return match operands.pop() {
                Some(node) => Ok(node),
                None => self.err_here("expected an operand"),
            };
        }
        let mid = operands.len() / 2;
        let right = operands.split_off(mid);
        let left = self.fold_balanced(op, operands, &spans[..mid - 1])?;
        let right = self.fold_balanced(op, right, &spans[mid..])?;
        self.binary(op, left, right, spans[mid - 1])
    }

    fn parse_unary(&mut self) -> PResult<Node> {
        let op = if self.at(Token::Bang) {
            UnaryOp::Not
        } else if self.at(Token::Minus) {
            UnaryOp::Neg
        } else {
            return self.parse_comparison();
        };

        let span = self.span();
        self.bump()?;
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();
        self.unary(op, operand?, span)
    }

    fn unary(&self, op: UnaryOp, operand: Node, span: Span) -> PResult<Node> {
        self.node(
            Syntax::Unary {
                op,
                operand: Box::new(operand.syntax),
                span,
            },
            operand.height,
        )
    }

    fn parse_comparison(&mut self) -> PResult<Node> {
        let e = self.parse_postfix()?;
        let op = match self.cur.kind {
            Token::EqEq => BinaryOp::Eq,
            Token::Ne => BinaryOp::Ne,
            Token::Lt => BinaryOp::Lt,
            Token::Le => BinaryOp::Le,
            Token::Gt => BinaryOp::Gt,
            Token::Ge => BinaryOp::Ge,
            _ => return Ok(e),
        };
        let span = self.span();
        self.bump()?;
        let r = self.parse_comparand()?;

        if matches!(
            self.cur.kind,
            Token::EqEq | Token::Ne | Token::Lt | Token::Le | Token::Gt | Token::Ge
        ) {
            return self.err_here("comparison operators cannot be chained, use '&&'");
        }

        self.binary(op, e, r, span)
    }

    /// Right-hand side of a comparison: allows `Level > -1` and `x == !y`
    fn parse_comparand(&mut self) -> PResult<Node> {
        if self.at(Token::Bang) || self.at(Token::Minus) {
            let op = if self.at(Token::Bang) {
                UnaryOp::Not
            } else {
                UnaryOp::Neg
            };
            let span = self.span();
            self.bump()?;
            self.enter()?;
            let operand = self.parse_comparand();
            self.leave();
            return self.unary(op, operand?, span);
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> PResult<Node> {
        let mut e = self.parse_primary()?;
        let mut links = 0usize;

        loop {
            if let Some(span) = self.consume(Token::Dot)? {
                let (name, _) = self.expect_ident()?;
                if self.consume(Token::LParen)?.is_some() {
                    let args = self.parse_args()?;
                    self.expect(Token::RParen)?;
                    e = self.call(e, name, args, span)?;
                } else {
                    let height = e.height;
                    e = self.node(
                        Syntax::Member {
                            target: Box::new(e.syntax),
                            name,
                            span,
                        },
                        height,
                    )?;
                }
            } else if let Some(span) = self.consume(Token::LBracket)? {
                let index = self.parse_expr()?;
                self.expect(Token::RBracket)?;
                let height = e.height.max(index.height);
                e = self.node(
                    Syntax::Index {
                        target: Box::new(e.syntax),
                        index: Box::new(index.syntax),
                        span,
                    },
                    height,
                )?;
            } else {
                break;
            }

            links += 1;
            if links > MAX_DEPTH {
                return self.err_here("member access chain is too long");
            }
        }
        Ok(e)
    }

    fn call(&self, target: Node, name: String, args: Vec<Node>, span: Span) -> PResult<Node> {
        let height = args.iter().map(|a| a.height).fold(target.height, usize::max);
        self.node(
            Syntax::Call {
                target: Box::new(target.syntax),
                name,
                args: args.into_iter().map(|a| a.syntax).collect(),
                span,
            },
            height,
        )
    }

    fn parse_args(&mut self) -> PResult<Vec<Node>> {
        let mut out = Vec::new();
        if self.at(Token::RParen) {
            return Ok(out);
        }
        loop {
            out.push(self.parse_expr()?);
            if self.consume(Token::Comma)?.is_some() {
                continue;
            }
            break;
        }
        Ok(out)
    }

    fn parse_primary(&mut self) -> PResult<Node> {
        let span = self.span();
        let literal = match &self.cur.kind {
            Token::True => Literal::Bool(true),
            Token::False => Literal::Bool(false),
            Token::Null => Literal::Null,
            Token::Int(i) => Literal::Int(*i),
            Token::Float(f) => Literal::Float(*f),
            Token::Str(s) => Literal::String(s.clone()),
            Token::Ident(_) => {
                let (name, _) = self.expect_ident()?;
                // `RenderMessage()` is a call on the implicit event
                if self.consume(Token::LParen)?.is_some() {
                    let args = self.parse_args()?;
                    self.expect(Token::RParen)?;
                    let this = Node::leaf(Syntax::Ident("this".to_string(), span));
                    return self.call(this, name, args, span);
                }
                return Ok(Node::leaf(Syntax::Ident(name, span)));
            }
            Token::LParen => {
                self.bump()?;
                let e = self.parse_expr()?;
                self.expect(Token::RParen)?;
                return Ok(e);
            }
            Token::Eof => return self.err_here("unexpected end of expression"),
            other => {
                let msg = format!("unexpected token in expression: {other:?}");
                return self.err_here(msg);
            }
        };
        self.bump()?;
        Ok(Node::leaf(Syntax::Literal(literal, span)))
    }
}
