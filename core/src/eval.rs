//! Two-stack (shunting-yard) evaluation of a boolean token stream.
//!
//! Operators are applied as soon as precedence allows, so no parse tree is
//! built. Precedence, highest first: `!`, `&`, `|`. An open parenthesis sits on
//! the operator stack below every real operator and is only removed by its
//! matching `)`.

use crate::error::{Result, SearchError};
use crate::index::PostingStore;
use crate::tokenizer::{render, Token};
use roaring::RoaringBitmap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Open,
    Or,
    And,
    Not,
}

impl Op {
    fn priority(self) -> i8 {
        match self {
            Op::Open => -1,
            Op::Or => 0,
            Op::And => 1,
            Op::Not => 2,
        }
    }
}

struct Stacks<'a> {
    store: &'a PostingStore,
    ops: Vec<Op>,
    sets: Vec<RoaringBitmap>,
}

impl<'a> Stacks<'a> {
    fn pop_set(&mut self, op: Op) -> Result<RoaringBitmap> {
        self.sets
            .pop()
            .ok_or_else(|| SearchError::malformed(format!("missing operand for {op:?}")))
    }

    /// Pop one operator, apply it to its operands and push the result.
    fn collapse_once(&mut self) -> Result<()> {
        let op = self
            .ops
            .pop()
            .ok_or_else(|| SearchError::malformed("operator stack underflow"))?;
        let result = match op {
            Op::And => {
                let a = self.pop_set(op)?;
                let b = self.pop_set(op)?;
                a & b
            }
            Op::Or => {
                let a = self.pop_set(op)?;
                let b = self.pop_set(op)?;
                a | b
            }
            Op::Not => {
                let a = self.pop_set(op)?;
                self.store.complement(&a)
            }
            Op::Open => return Err(SearchError::malformed("unmatched '('")),
        };
        self.sets.push(result);
        Ok(())
    }

    fn close_group(&mut self) -> Result<()> {
        loop {
            match self.ops.last() {
                Some(Op::Open) => {
                    self.ops.pop();
                    return Ok(());
                }
                Some(_) => self.collapse_once()?,
                None => return Err(SearchError::malformed("unmatched ')'")),
            }
        }
    }

    fn push_operator(&mut self, op: Op) -> Result<()> {
        while let Some(&top) = self.ops.last() {
            if top.priority() < op.priority() {
                break;
            }
            self.collapse_once()?;
        }
        self.ops.push(op);
        Ok(())
    }
}

/// Evaluate `tokens` against `store`, returning the matching id set.
///
/// Every operator, `!` included, first reduces the stack while the top
/// operator's priority is at least its own. A bare `!!a` therefore underflows;
/// nested negation has to be grouped as `!(!a)`.
/// Missing terms evaluate to the empty set. `!` complements against
/// `[0, store.num_docs())`. Any structural problem (unbalanced parentheses,
/// an operator without enough operands, leftover operands) is reported as
/// [`SearchError::MalformedQuery`] and no partial result is returned.
pub fn evaluate(tokens: &[Token], store: &PostingStore) -> Result<RoaringBitmap> {
    evaluate_tokens(tokens, store).map_err(|e| match e {
        SearchError::MalformedQuery(msg) => SearchError::MalformedQuery(format!("{msg} in `{}`", render(tokens))),
        other => other,
    })
}

fn evaluate_tokens(tokens: &[Token], store: &PostingStore) -> Result<RoaringBitmap> {
    let mut stacks = Stacks { store, ops: Vec::new(), sets: Vec::new() };

    for token in tokens {
        match token {
            Token::Term(term) => stacks.sets.push(store.lookup(term)),
            Token::LParen => stacks.ops.push(Op::Open),
            Token::RParen => stacks.close_group()?,
            Token::And => stacks.push_operator(Op::And)?,
            Token::Or => stacks.push_operator(Op::Or)?,
            Token::Not => stacks.push_operator(Op::Not)?,
        }
    }
    while !stacks.ops.is_empty() {
        stacks.collapse_once()?;
    }

    match stacks.sets.len() {
        1 => Ok(stacks.sets.pop().unwrap_or_default()),
        0 => Err(SearchError::malformed("expression produced no operand")),
        n => Err(SearchError::malformed(format!("expression left {n} operands; missing operator?"))),
    }
}
