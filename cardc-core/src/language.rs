use std::fmt::{Display, Write};

/// A parsed formula: one declared name, one formal parameter, one body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Definition {
    pub name: String,
    pub param: String,
    pub body: Expr,
}

/// Body expression of a formula.
///
/// The parser resolves identifiers against the declared parameter, so the
/// bound parameter appears here as `Bound` rather than by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
    /// The formula's single formal parameter.
    Bound,
    /// An externally supplied value, referenced by name.
    Exogenous(String),
    /// A zero-arity opaque term.
    Literal(Literal),
    /// Application of a named operator, arity = `args.len()`.
    Call { op: String, args: Vec<Expr> },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    Str(String),
    Num(String),
}

impl Expr {
    /// Whether the bound parameter occurs anywhere in this subtree.
    pub fn mentions_bound(&self) -> bool {
        match self {
            Self::Bound => true,
            Self::Exogenous(_) | Self::Literal(_) => false,
            Self::Call { args, .. } => args.iter().any(Expr::mentions_bound),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(s) => {
                f.write_char('"')?;
                f.write_str(s)?;
                f.write_char('"')
            }
            Self::Num(n) => f.write_str(n),
        }
    }
}
