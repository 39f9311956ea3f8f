//! Linearisation of a combinator tree into an ordered, deduplicated card
//! deck.
//!
//! Cards are materialised in post-order, so every dependency precedes its
//! dependents and back-references are always to strictly smaller indices.
//! Structurally identical subtrees collapse onto a single card through a
//! hash-keyed memo over the immutable [`CombinatorExpr`] tree.

use std::collections::HashMap;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::{abstraction::CombinatorExpr, language::Literal};

/// One emitted instruction, addressable by its 1-based index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    pub index: usize,
    pub name: String,
    pub expr: CardExpr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CardExpr {
    Identity,
    OpByName(String),
    Apply { target: Operand, arg: Operand },
    Flip { target: Operand },
    Pipe { stages: Vec<Operand> },
}

/// An argument position inside a card: a back-reference to an earlier card,
/// an exogenous input, or a literal. Exogenous inputs and literals are never
/// cards of their own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Card { index: usize, name: String },
    Exo(String),
    Literal(Literal),
}

/// The ordered card listing for one compiled formula.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Deck {
    pub cards: Vec<Card>,
}

#[derive(Clone, Debug, Error)]
pub enum SequenceError {
    #[error("card '{name}' would reference a card at or after its own position")]
    Cycle { name: String },

    #[error("bare reference '{0}' cannot form a card of its own")]
    BareReference(String),
}

impl CardExpr {
    /// Indices of the cards this expression depends on.
    pub fn references(&self) -> impl Iterator<Item = usize> + '_ {
        let operands: Vec<&Operand> = match self {
            Self::Identity | Self::OpByName(_) => Vec::new(),
            Self::Apply { target, arg } => vec![target, arg],
            Self::Flip { target } => vec![target],
            Self::Pipe { stages } => stages.iter().collect(),
        };
        operands.into_iter().filter_map(|operand| match operand {
            Operand::Card { index, .. } => Some(*index),
            Operand::Exo(_) | Operand::Literal(_) => None,
        })
    }
}

/// Flatten a combinator tree into a [`Deck`], naming the root card after the
/// declared function.
pub fn sequence(name: &str, root: &CombinatorExpr) -> Result<Deck, SequenceError> {
    let mut sequencer = Sequencer::default();
    let index = sequencer.card(root)?;

    // The root is materialised last, so it is the final card.
    debug_assert_eq!(index, sequencer.cards.len());
    if let Some(card) = sequencer.cards.last_mut() {
        card.name = name.to_owned();
    }

    debug!(cards = sequencer.cards.len(), "materialised deck for '{name}'");
    Ok(Deck {
        cards: sequencer.cards,
    })
}

#[derive(Default)]
struct Sequencer {
    cards: Vec<Card>,
    /// Structural memo: first-materialisation index per distinct subtree.
    memo: IndexMap<CombinatorExpr, usize>,
    /// Serial counters per binding-name prefix, independent of card indices.
    serials: HashMap<String, usize>,
}

impl Sequencer {
    fn operand(&mut self, expr: &CombinatorExpr) -> Result<Operand, SequenceError> {
        match expr {
            CombinatorExpr::ExoRef(name) => Ok(Operand::Exo(name.clone())),
            CombinatorExpr::Literal(lit) => Ok(Operand::Literal(lit.clone())),
            _ => {
                let index = self.card(expr)?;
                Ok(Operand::Card {
                    index,
                    name: self.cards[index - 1].name.clone(),
                })
            }
        }
    }

    fn card(&mut self, expr: &CombinatorExpr) -> Result<usize, SequenceError> {
        if let Some(&index) = self.memo.get(expr) {
            return Ok(index);
        }

        let (prefix, card_expr) = match expr {
            CombinatorExpr::Identity => ("identity".to_owned(), CardExpr::Identity),
            CombinatorExpr::OpRef(name) => {
                (format!("op_{name}"), CardExpr::OpByName(name.clone()))
            }
            CombinatorExpr::Apply(target, arg) => (
                "curried".to_owned(),
                CardExpr::Apply {
                    target: self.operand(target)?,
                    arg: self.operand(arg)?,
                },
            ),
            CombinatorExpr::Flip(target) => (
                "flipped".to_owned(),
                CardExpr::Flip {
                    target: self.operand(target)?,
                },
            ),
            CombinatorExpr::Pipe(stages) => (
                "piped".to_owned(),
                CardExpr::Pipe {
                    stages: stages
                        .iter()
                        .map(|stage| self.operand(stage))
                        .collect::<Result<_, _>>()?,
                },
            ),
            CombinatorExpr::ExoRef(name) => {
                return Err(SequenceError::BareReference(name.clone()));
            }
            CombinatorExpr::Literal(lit) => {
                return Err(SequenceError::BareReference(lit.to_string()));
            }
        };

        let index = self.cards.len() + 1;
        let name = self.fresh_name(&prefix);
        if card_expr.references().any(|dep| dep >= index) {
            return Err(SequenceError::Cycle { name });
        }

        self.memo.insert(expr.clone(), index);
        self.cards.push(Card {
            index,
            name,
            expr: card_expr,
        });
        Ok(index)
    }

    fn fresh_name(&mut self, prefix: &str) -> String {
        let serial = self
            .serials
            .entry(prefix.to_owned())
            .and_modify(|serial| *serial += 1)
            .or_insert(1);
        format!("{prefix}_{serial}")
    }
}

#[cfg(test)]
mod tests {
    use super::{CardExpr, Deck, sequence};
    use crate::{abstraction::abstract_definition, parser::parse_definition};

    fn deck(source: &str) -> Deck {
        let def = parse_definition(source).unwrap();
        sequence(&def.name, &abstract_definition(&def).unwrap()).unwrap()
    }

    #[test]
    fn three_branch_formula_materialises_six_cards() {
        let deck = deck(
            "func(in) := someLogic(var_exogenous, otherLogic(in), thirdLogic(var_exogenous, in))",
        );
        let names: Vec<&str> = deck.cards.iter().map(|card| card.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "op_otherLogic_1",
                "op_thirdLogic_1",
                "curried_1",
                "op_someLogic_1",
                "curried_2",
                "func",
            ]
        );
    }

    #[test]
    fn shared_subtrees_collapse_onto_one_card() {
        let deck = deck("f(x) := both(g(x), g(x))");
        // One lookup card each for `g` and `both`, plus the fan-in.
        assert_eq!(deck.cards.len(), 3);

        let CardExpr::Pipe { stages } = &deck.cards[2].expr else {
            panic!("expected a pipe root");
        };
        assert_eq!(stages[0], stages[1]);
    }

    #[test]
    fn identity_stages_share_a_single_identity_card() {
        let deck = deck("f(x) := both(x, x)");
        assert_eq!(deck.cards.len(), 3);
        assert_eq!(deck.cards[0].expr, CardExpr::Identity);
        assert_eq!(deck.cards[0].name, "identity_1");
    }

    #[test]
    fn references_only_point_backwards() {
        let deck = deck(
            "func(in) := someLogic(var_exogenous, otherLogic(in), thirdLogic(var_exogenous, in))",
        );
        for card in &deck.cards {
            assert!(card.expr.references().all(|dep| dep < card.index));
        }
    }

    #[test]
    fn serials_count_per_name_prefix() {
        let deck = deck("func(in) := someLogic(var_a, thirdLogic(var_b, in))");
        let names: Vec<&str> = deck.cards.iter().map(|card| card.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "op_thirdLogic_1",
                "curried_1",
                "op_someLogic_1",
                "curried_2",
                "func",
            ]
        );
    }

    #[test]
    fn indices_are_one_based_and_dense() {
        let deck = deck("f(x) := g(h(x), k(x))");
        for (position, card) in deck.cards.iter().enumerate() {
            assert_eq!(card.index, position + 1);
        }
    }
}
