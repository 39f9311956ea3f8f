//! Textual rendering of a card deck.
//!
//! Pure formatting: the output is a deterministic function of the card list.
//! One line per card: `NN. <name> := <form>  # <comment>`, with 2-digit
//! zero-padded indices and `[MM]<name>` back-references.

use pretty::RcDoc;

use crate::{
    cards::{Card, CardExpr, Deck, Operand},
    language::Literal,
};

pub trait PrettyPrint {
    fn to_doc(&self) -> RcDoc<'_, ()>;

    fn to_pretty(&self) -> String {
        self.to_doc().pretty(usize::MAX).to_string()
    }
}

/// Comma-separated list.
pub fn list<'a, T: 'a + PrettyPrint>(ts: impl IntoIterator<Item = &'a T>) -> RcDoc<'a, ()> {
    RcDoc::intersperse(
        ts.into_iter().map(PrettyPrint::to_doc),
        RcDoc::text(",").append(RcDoc::space()),
    )
}

impl PrettyPrint for Literal {
    fn to_doc(&self) -> RcDoc<'_, ()> {
        RcDoc::text(self.to_string())
    }
}

impl PrettyPrint for Operand {
    fn to_doc(&self) -> RcDoc<'_, ()> {
        match self {
            Self::Card { index, name } => RcDoc::text(format!("[{index:02}]{name}")),
            Self::Exo(name) => RcDoc::text(name.as_str()),
            Self::Literal(lit) => lit.to_doc(),
        }
    }
}

impl PrettyPrint for CardExpr {
    fn to_doc(&self) -> RcDoc<'_, ()> {
        match self {
            Self::Identity => RcDoc::text("identity()"),
            Self::OpByName(name) => RcDoc::text(format!("op_by_name(\"{name}\")")),
            Self::Apply { target, arg } => RcDoc::text("apply(")
                .append(target.to_doc())
                .append(RcDoc::text(", "))
                .append(arg.to_doc())
                .append(RcDoc::text(")")),
            Self::Flip { target } => RcDoc::text("flip(")
                .append(target.to_doc())
                .append(RcDoc::text(")")),
            Self::Pipe { stages } => RcDoc::text(pipe_name(stages.len()))
                .append(RcDoc::text("("))
                .append(list(stages))
                .append(RcDoc::text(")")),
        }
    }
}

impl PrettyPrint for Card {
    fn to_doc(&self) -> RcDoc<'_, ()> {
        RcDoc::text(format!("{:02}. ", self.index))
            .append(RcDoc::text(self.name.as_str()))
            .append(RcDoc::text(" := "))
            .append(self.expr.to_doc())
    }
}

impl PrettyPrint for Deck {
    fn to_doc(&self) -> RcDoc<'_, ()> {
        RcDoc::intersperse(
            self.cards.iter().map(|card| {
                let mut comment = comment(&card.expr);
                if card.index == self.cards.len() {
                    comment.push_str("; final composite operator");
                }
                card.to_doc().append(RcDoc::text(format!("  # {comment}")))
            }),
            RcDoc::hardline(),
        )
    }
}

/// `pipe` composes one stage into its base; `pipeN` fans N stages in. The
/// trailing base operand is not counted.
fn pipe_name(operands: usize) -> String {
    if operands == 2 {
        "pipe".to_owned()
    } else {
        format!("pipe{}", operands - 1)
    }
}

fn comment(expr: &CardExpr) -> String {
    match expr {
        CardExpr::Identity => "pass the input through unchanged".to_owned(),
        CardExpr::OpByName(name) => format!("look up operator '{name}'"),
        CardExpr::Apply { target, arg } => format!(
            "curry {}: fill the next argument with {}",
            target.to_pretty(),
            arg.to_pretty()
        ),
        CardExpr::Flip { target } => {
            format!("swap the first two arguments of {}", target.to_pretty())
        }
        CardExpr::Pipe { stages } => {
            // Sequencing guarantees a pipe has at least one stage and a base.
            let (base, branches) = stages.split_last().unwrap();
            format!(
                "pipe {} branch(es) into {}",
                branches.len(),
                base.to_pretty()
            )
        }
    }
}
