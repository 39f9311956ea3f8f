#![warn(clippy::all, rust_2018_idioms)]

//! Compiler from single-parameter formulas to point-free card listings.
//!
//! A formula `func(in) := ...` is parsed into an expression tree, its bound
//! parameter is eliminated by bracket abstraction into the combinator basis
//! `{identity, apply, flip, pipeN}`, and the resulting combinator tree is
//! linearised into an ordered, deduplicated card listing for the target card
//! machine. Every card references only cards defined before it.

pub mod abstraction;
pub mod cards;
pub mod language;
pub mod parser;
pub mod prettyprinter;

use thiserror::Error;
use tracing::debug;

use crate::{cards::Deck, prettyprinter::PrettyPrint};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] parser::ParseError),

    #[error(transparent)]
    Abstraction(#[from] abstraction::AbstractionError),

    #[error(transparent)]
    Sequence(#[from] cards::SequenceError),
}

/// Compile a formula into an ordered card deck.
pub fn compile(source: &str) -> Result<Deck, CompileError> {
    let definition = parser::parse_definition(source)?;
    debug!(name = %definition.name, param = %definition.param, "parsed definition");

    let combinator = abstraction::abstract_definition(&definition)?;
    let deck = cards::sequence(&definition.name, &combinator)?;
    debug!(cards = deck.cards.len(), "sequenced deck");

    Ok(deck)
}

/// Compile a formula and render the card listing.
pub fn compile_to_string(source: &str) -> Result<String, CompileError> {
    Ok(compile(source)?.to_pretty())
}
