// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Token sequence to AST, in one pass.
//!
//! Precedence: quantifier binds tighter than concatenation, which binds
//! tighter than alternation. Group/alternation nesting is tracked with an
//! implicit recursive-descent stack (one Rust call frame per nesting level)
//! rather than an explicit frame vector — small pattern depths make this
//! the natural shape and it mirrors how the lexer itself is structured.

use crate::ast::{AstNode, ByteSet, NodeIdx, NodeKind, RegexAst, Repeat, UNBOUNDED};
use crate::byteclass::PredefinedClass;
use crate::error::Error;
use crate::lexer::{EscapedClass, Lexer, Token};

fn predefined_for_escaped(esc: EscapedClass) -> Option<PredefinedClass> {
    match esc {
        EscapedClass::Digit => Some(PredefinedClass::Digit),
        EscapedClass::Word => Some(PredefinedClass::Word),
        EscapedClass::Space => Some(PredefinedClass::Whitespace),
        EscapedClass::NotDigit | EscapedClass::NotWord | EscapedClass::NotSpace => None,
    }
}

pub fn parse(pattern: &str) -> Result<RegexAst, Error> {
    let mut p = Parser {
        lexer: Lexer::new(pattern),
        lookahead: None,
        ast: RegexAst::new(),
        next_group_index: 1,
    };
    let children = p.parse_body(false)?;
    p.expect_end_of_pattern()?;
    let root = p.ast.push(AstNode { kind: NodeKind::Root, repeat: Repeat::default(), children });
    p.ast.root = root;
    Ok(p.ast)
}

struct Parser<'p> {
    lexer: Lexer<'p>,
    lookahead: Option<Token>,
    ast: RegexAst,
    next_group_index: u32,
}

impl<'p> Parser<'p> {
    fn peek(&mut self) -> Result<&Token, Error> {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.lexer.next()?);
        }
        Ok(self.lookahead.as_ref().unwrap())
    }

    fn bump(&mut self) -> Result<Token, Error> {
        match self.lookahead.take() {
            Some(t) => Ok(t),
            None => self.lexer.next(),
        }
    }

    fn expect_end_of_pattern(&mut self) -> Result<(), Error> {
        match self.bump()? {
            Token::EndOfPattern => Ok(()),
            Token::GroupClose => Err(Error::Syntax("unbalanced ')'".into())),
            other => Err(Error::Syntax(format!("unexpected token after pattern end: {:?}", other))),
        }
    }

    /// Parses a `|`-separated sequence of concatenations, stopping at
    /// `GroupClose` or `EndOfPattern` (the terminator itself is left
    /// unconsumed). Returns the flat child list to attach directly to the
    /// caller (root or group) when there's exactly one branch, or a
    /// single-element list containing one `Alternation` node otherwise.
    fn parse_body(&mut self, in_group: bool) -> Result<Vec<NodeIdx>, Error> {
        let mut branches: Vec<Vec<NodeIdx>> = vec![Vec::new()];
        loop {
            match self.peek()? {
                Token::Alt => {
                    self.bump()?;
                    branches.push(Vec::new());
                }
                Token::GroupClose => {
                    if !in_group {
                        return Err(Error::Syntax("unbalanced ')'".into()));
                    }
                    break;
                }
                Token::EndOfPattern => break,
                _ => {
                    let atom = self.parse_atom()?;
                    branches.last_mut().unwrap().push(atom);
                }
            }
        }
        if branches.len() == 1 {
            Ok(branches.pop().unwrap())
        } else {
            let branch_nodes = branches
                .into_iter()
                .map(|elems| {
                    self.ast.push(AstNode {
                        kind: NodeKind::Concat,
                        repeat: Repeat::default(),
                        children: elems,
                    })
                })
                .collect();
            let alt = self.ast.push(AstNode {
                kind: NodeKind::Alternation,
                repeat: Repeat::default(),
                children: branch_nodes,
            });
            Ok(vec![alt])
        }
    }

    fn parse_atom(&mut self) -> Result<NodeIdx, Error> {
        let tok = self.bump()?;
        let idx = match tok {
            Token::Literal(b) => self.ast.push(AstNode::leaf(NodeKind::Element(b))),
            Token::Wildcard => self.ast.push(AstNode::leaf(NodeKind::Wildcard)),
            Token::StartAnchor => {
                self.ast.push(AstNode::leaf(NodeKind::Anchor(crate::ast::AnchorKind::Start)))
            }
            Token::EndAnchor => {
                self.ast.push(AstNode::leaf(NodeKind::Anchor(crate::ast::AnchorKind::End)))
            }
            Token::EscapedClass(esc) => {
                let mut set = ByteSet::new();
                set.push_escaped(esc);
                // `\d`/`\w`/`\s` line up exactly with a named predefined
                // class and share its process-wide cached matcher; the
                // negated forms (`\D`/`\W`/`\S`) fall back to the generic
                // per-pattern class cache since negation isn't itself a
                // named predefined class.
                let matcher = match predefined_for_escaped(esc) {
                    Some(class) => crate::byteclass::predefined(class),
                    None => crate::byteclass::cached(set.to_dense(false)),
                };
                self.ast.push(AstNode::leaf(NodeKind::Class { set, negated: false, matcher }))
            }
            Token::ClassOpen { negated } => {
                let set = self.parse_class_body()?;
                let matcher = crate::byteclass::cached(set.to_dense(negated));
                self.ast.push(AstNode::leaf(NodeKind::Class { set, negated, matcher }))
            }
            Token::GroupOpen => {
                let index = self.next_group_index;
                self.next_group_index += 1;
                let children = self.parse_body(true)?;
                self.expect_group_close()?;
                self.ast.push(AstNode {
                    kind: NodeKind::Group { capturing: true, index: Some(index) },
                    repeat: Repeat::default(),
                    children,
                })
            }
            Token::NonCapturingOpen => {
                let children = self.parse_body(true)?;
                self.expect_group_close()?;
                self.ast.push(AstNode {
                    kind: NodeKind::Group { capturing: false, index: None },
                    repeat: Repeat::default(),
                    children,
                })
            }
            Token::QuantStar | Token::QuantPlus | Token::QuantQMark | Token::QuantBounded { .. } => {
                return Err(Error::Syntax("quantifier with nothing to repeat".into()));
            }
            other => return Err(Error::Syntax(format!("unexpected token {:?}", other))),
        };
        self.maybe_attach_quantifier(idx)?;
        Ok(idx)
    }

    fn expect_group_close(&mut self) -> Result<(), Error> {
        match self.bump()? {
            Token::GroupClose => Ok(()),
            Token::EndOfPattern => Err(Error::Syntax("unterminated group".into())),
            other => Err(Error::Syntax(format!("expected ')', found {:?}", other))),
        }
    }

    fn maybe_attach_quantifier(&mut self, idx: NodeIdx) -> Result<(), Error> {
        let repeat = match self.peek()? {
            Token::QuantStar => Some(Repeat { min: 0, max: UNBOUNDED }),
            Token::QuantPlus => Some(Repeat { min: 1, max: UNBOUNDED }),
            Token::QuantQMark => Some(Repeat { min: 0, max: 1 }),
            Token::QuantBounded { min, max } => {
                Some(Repeat { min: *min, max: max.unwrap_or(UNBOUNDED) })
            }
            _ => None,
        };
        if let Some(repeat) = repeat {
            self.bump()?;
            self.ast.get_mut(idx).repeat = repeat;
        }
        Ok(())
    }

    fn parse_class_body(&mut self) -> Result<ByteSet, Error> {
        let mut set = ByteSet::new();
        loop {
            match self.lexer.next_in_class()? {
                Token::ClassClose => break,
                Token::ClassByte(b) => set.push_byte(b),
                Token::ClassRange(lo, hi) => set.push_range(lo, hi),
                Token::EscapedClass(esc) => set.push_escaped(esc),
                other => {
                    return Err(Error::Syntax(format!("unexpected token in class: {:?}", other)))
                }
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn simple_literal_concat() {
        let ast = parse("abc").unwrap();
        let root = ast.get(ast.root);
        assert_eq!(root.kind, NodeKind::Root);
        assert_eq!(root.children.len(), 3);
    }

    #[test]
    fn alternation_wraps_in_single_node() {
        let ast = parse("cat|dog").unwrap();
        let root = ast.get(ast.root);
        assert_eq!(root.children.len(), 1);
        let alt = ast.get(root.children[0]);
        assert_eq!(alt.kind, NodeKind::Alternation);
        assert_eq!(alt.children.len(), 2);
    }

    #[test]
    fn capturing_group_indices_assigned_in_open_paren_order() {
        let ast = parse("(a)(b(c))").unwrap();
        let root = ast.get(ast.root);
        let g1 = ast.get(root.children[0]);
        assert_eq!(g1.kind, NodeKind::Group { capturing: true, index: Some(1) });
        let g2 = ast.get(root.children[1]);
        assert_eq!(g2.kind, NodeKind::Group { capturing: true, index: Some(2) });
        let g3 = ast.get(g2.children[1]);
        assert_eq!(g3.kind, NodeKind::Group { capturing: true, index: Some(3) });
    }

    #[test]
    fn non_capturing_group_has_no_index() {
        let ast = parse("(?:ab)+").unwrap();
        let root = ast.get(ast.root);
        let g = ast.get(root.children[0]);
        assert_eq!(g.kind, NodeKind::Group { capturing: false, index: None });
        assert_eq!(g.repeat, Repeat { min: 1, max: UNBOUNDED });
    }

    #[test]
    fn bare_quantifier_is_error() {
        assert!(parse("*abc").is_err());
        assert!(parse("(|+)").is_err());
    }

    #[test]
    fn unbalanced_paren_is_error() {
        assert!(parse("(abc").is_err());
        assert!(parse("abc)").is_err());
    }

    #[test]
    fn class_with_negation_and_ranges() {
        let ast = parse("[^a-z0-9]").unwrap();
        let root = ast.get(ast.root);
        match &ast.get(root.children[0]).kind {
            NodeKind::Class { set, negated, .. } => {
                assert!(*negated);
                assert!(set.contains(b'm'));
                assert!(set.contains(b'5'));
                assert!(!set.contains(b'!'));
            }
            other => panic!("expected class, got {:?}", other),
        }
    }
}
