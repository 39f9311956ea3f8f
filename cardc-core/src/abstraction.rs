//! Bracket abstraction into the combinator basis `{identity, apply, flip,
//! pipeN}`.
//!
//! The single bound parameter is eliminated bottom-up: subtrees that do not
//! mention it are kept as plain reference trees, static arguments are
//! pre-bound onto their operator with `apply` (through `flip` when the
//! currying order disagrees with the operator's parameter order), and the
//! remaining argument branches fan into a `pipe` whose last stage is the
//! partially applied operator.

use itertools::Itertools;
use thiserror::Error;
use tracing::debug;

use crate::language::{Definition, Expr, Literal};

/// A variable-free expression over the card machine's combinator basis.
///
/// This is the output of abstraction: it never contains the bound parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CombinatorExpr {
    /// The identity combinator.
    Identity,
    /// A named operator, obtained by lookup.
    OpRef(String),
    /// An exogenous input, referenced by name.
    ExoRef(String),
    /// A zero-arity opaque term.
    Literal(Literal),
    /// Partial application of the first expression to the second.
    Apply(Box<CombinatorExpr>, Box<CombinatorExpr>),
    /// The operator with its first two arguments swapped.
    Flip(Box<CombinatorExpr>),
    /// N-ary fan-in: the last element consumes the outputs of the others,
    /// each of which consumes the eventual bound input. Length >= 2.
    Pipe(Vec<CombinatorExpr>),
}

#[derive(Clone, Debug, Error)]
pub enum AbstractionError {
    #[error(
        "cannot curry '{op}': a static argument sits {position} positions deep among the remaining parameters"
    )]
    UnsupportedArity { op: String, position: usize },

    #[error("operator '{op}' is applied to no arguments")]
    NoArguments { op: String },

    #[error("abstraction invariant violated: {0}")]
    Invariant(&'static str),
}

/// Rewrite a definition's body into a [`CombinatorExpr`].
///
/// A body that never mentions the bound parameter still has to become an
/// operator card, so it is routed through the target machine's `constant`
/// operator.
pub fn abstract_definition(def: &Definition) -> Result<CombinatorExpr, AbstractionError> {
    debug!(name = %def.name, "eliminating bound parameter '{}'", def.param);
    if def.body.mentions_bound() {
        abstract_expr(&def.body)
    } else {
        Ok(CombinatorExpr::Apply(
            Box::new(CombinatorExpr::OpRef("constant".to_owned())),
            Box::new(reference(&def.body)?),
        ))
    }
}

/// Abstract a subtree that mentions the bound parameter into a unary operator
/// mapping the bound input to the subtree's value.
fn abstract_expr(expr: &Expr) -> Result<CombinatorExpr, AbstractionError> {
    match expr {
        Expr::Bound => Ok(CombinatorExpr::Identity),
        Expr::Call { op, args } => abstract_call(op, args),
        Expr::Exogenous(_) | Expr::Literal(_) => Err(AbstractionError::Invariant(
            "constant subtree reached the abstractor",
        )),
    }
}

fn abstract_call(op: &str, args: &[Expr]) -> Result<CombinatorExpr, AbstractionError> {
    if args.is_empty() {
        return Err(AbstractionError::NoArguments { op: op.to_owned() });
    }

    // Pre-bind every static argument left to right. Once the statics to its
    // left have been applied, a static argument's position among the
    // operator's remaining parameters equals the number of dynamic arguments
    // before it: position 0 binds directly, position 1 binds through `flip`,
    // anything deeper has no single-swap encoding.
    let mut curried = CombinatorExpr::OpRef(op.to_owned());
    for (idx, arg) in args.iter().enumerate() {
        if arg.mentions_bound() {
            continue;
        }
        let position = args[..idx].iter().filter(|a| a.mentions_bound()).count();
        let target = match position {
            0 => curried,
            1 => CombinatorExpr::Flip(Box::new(curried)),
            _ => {
                return Err(AbstractionError::UnsupportedArity {
                    op: op.to_owned(),
                    position,
                });
            }
        };
        curried = CombinatorExpr::Apply(Box::new(target), Box::new(reference(arg)?));
    }

    let mut stages: Vec<CombinatorExpr> = args
        .iter()
        .filter(|arg| arg.mentions_bound())
        .map(abstract_expr)
        .try_collect()?;

    match stages.as_slice() {
        [] => Err(AbstractionError::Invariant(
            "call without dynamic arguments reached the abstractor",
        )),
        [CombinatorExpr::Identity] => Ok(curried),
        _ => {
            stages.push(curried);
            Ok(CombinatorExpr::Pipe(stages))
        }
    }
}

/// Build the direct reference tree for a subtree with no bound occurrences.
/// Constant calls become left-to-right `apply` chains over their operator.
fn reference(expr: &Expr) -> Result<CombinatorExpr, AbstractionError> {
    match expr {
        Expr::Bound => Err(AbstractionError::Invariant(
            "bound parameter inside a static subtree",
        )),
        Expr::Exogenous(name) => Ok(CombinatorExpr::ExoRef(name.clone())),
        Expr::Literal(lit) => Ok(CombinatorExpr::Literal(lit.clone())),
        Expr::Call { op, args } => {
            args.iter()
                .try_fold(CombinatorExpr::OpRef(op.clone()), |target, arg| {
                    Ok(CombinatorExpr::Apply(
                        Box::new(target),
                        Box::new(reference(arg)?),
                    ))
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AbstractionError, CombinatorExpr, abstract_definition};
    use crate::{language::Literal, parser::parse_definition};

    fn abstracted(source: &str) -> CombinatorExpr {
        abstract_definition(&parse_definition(source).unwrap()).unwrap()
    }

    fn op(name: &str) -> CombinatorExpr {
        CombinatorExpr::OpRef(name.to_owned())
    }

    fn exo(name: &str) -> CombinatorExpr {
        CombinatorExpr::ExoRef(name.to_owned())
    }

    fn apply(target: CombinatorExpr, arg: CombinatorExpr) -> CombinatorExpr {
        CombinatorExpr::Apply(Box::new(target), Box::new(arg))
    }

    fn flip(target: CombinatorExpr) -> CombinatorExpr {
        CombinatorExpr::Flip(Box::new(target))
    }

    #[test]
    fn bound_parameter_becomes_identity() {
        assert_eq!(abstracted("f(x) := x"), CombinatorExpr::Identity);
    }

    #[test]
    fn unary_call_on_the_parameter_collapses_to_a_lookup() {
        assert_eq!(abstracted("f(x) := g(x)"), op("g"));
    }

    #[test]
    fn nested_unary_calls_compose() {
        assert_eq!(
            abstracted("f(x) := g(h(x))"),
            CombinatorExpr::Pipe(vec![op("h"), op("g")])
        );
    }

    #[test]
    fn leading_static_argument_is_curried() {
        assert_eq!(
            abstracted("f(x) := g(var_a, x)"),
            apply(op("g"), exo("var_a"))
        );
    }

    #[test]
    fn trailing_static_argument_curries_through_flip() {
        assert_eq!(
            abstracted("f(x) := g(x, var_a)"),
            apply(flip(op("g")), exo("var_a"))
        );
    }

    #[test]
    fn statics_bind_left_to_right() {
        assert_eq!(
            abstracted("f(x) := g(var_a, var_b, x)"),
            apply(apply(op("g"), exo("var_a")), exo("var_b"))
        );
    }

    #[test]
    fn sibling_branches_fan_into_one_pipe() {
        assert_eq!(
            abstracted("f(x) := g(h(x), k(x))"),
            CombinatorExpr::Pipe(vec![op("h"), op("k"), op("g")])
        );
    }

    #[test]
    fn bare_parameter_branches_stay_as_identity_stages() {
        assert_eq!(
            abstracted("f(x) := g(x, x)"),
            CombinatorExpr::Pipe(vec![
                CombinatorExpr::Identity,
                CombinatorExpr::Identity,
                op("g"),
            ])
        );
    }

    #[test]
    fn three_branch_call_structure() {
        assert_eq!(
            abstracted(
                "func(in) := someLogic(var_exogenous, otherLogic(in), thirdLogic(var_exogenous, in))",
            ),
            CombinatorExpr::Pipe(vec![
                op("otherLogic"),
                apply(op("thirdLogic"), exo("var_exogenous")),
                apply(op("someLogic"), exo("var_exogenous")),
            ])
        );
    }

    #[test]
    fn constant_body_is_routed_through_constant() {
        assert_eq!(
            abstracted("f(x) := var_a"),
            apply(op("constant"), exo("var_a"))
        );
    }

    #[test]
    fn constant_call_arguments_become_apply_chains() {
        assert_eq!(
            abstracted("f(x) := g(h(var_a, 4), x)"),
            apply(
                op("g"),
                apply(
                    apply(op("h"), exo("var_a")),
                    CombinatorExpr::Literal(Literal::Num("4".to_owned())),
                )
            )
        );
    }

    #[test]
    fn static_argument_two_positions_deep_is_rejected() {
        let def = parse_definition("f(x) := g(h(x), k(x), var_a)").unwrap();
        assert!(matches!(
            abstract_definition(&def),
            Err(AbstractionError::UnsupportedArity { position: 2, .. })
        ));
    }
}
