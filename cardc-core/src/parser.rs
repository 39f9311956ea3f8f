use pest::{Parser, iterators::Pair};
use pest_derive::Parser;
use thiserror::Error;

use crate::language::{Definition, Expr, Literal};

#[derive(Parser)]
#[grammar = "parser/formula.pest"]
pub struct FormulaParser;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] Box<pest::error::Error<Rule>>),

    #[error("expected exactly one formal parameter, found {count}")]
    MultipleParameters { count: usize },
}

/// Parse `name(param) := expr` into a [`Definition`].
///
/// Identifiers equal to the declared parameter become [`Expr::Bound`]; every
/// other bare identifier is an exogenous reference.
pub fn parse_definition(source: &str) -> Result<Definition, ParseError> {
    let mut pairs = FormulaParser::parse(Rule::program, source).map_err(Box::new)?;

    // The shape of a successful parse is fixed by the grammar, so the
    // unwraps below cannot fail.
    let mut definition = pairs.next().unwrap().into_inner().next().unwrap().into_inner();
    let name = definition.next().unwrap().as_str().to_owned();
    let parameters: Vec<&str> = definition
        .next()
        .unwrap()
        .into_inner()
        .map(|pair| pair.as_str())
        .collect();
    let &[param] = parameters.as_slice() else {
        return Err(ParseError::MultipleParameters {
            count: parameters.len(),
        });
    };

    let body = expr_from_pair(definition.next().unwrap(), param);
    Ok(Definition {
        name,
        param: param.to_owned(),
        body,
    })
}

fn expr_from_pair(pair: Pair<'_, Rule>, param: &str) -> Expr {
    match pair.as_rule() {
        Rule::expr => expr_from_pair(pair.into_inner().next().unwrap(), param),
        Rule::call => {
            let mut inner = pair.into_inner();
            let op = inner.next().unwrap().as_str().to_owned();
            let args = inner.map(|arg| expr_from_pair(arg, param)).collect();
            Expr::Call { op, args }
        }
        Rule::identifier if pair.as_str() == param => Expr::Bound,
        Rule::identifier => Expr::Exogenous(pair.as_str().to_owned()),
        Rule::string => {
            let quoted = pair.as_str();
            Expr::Literal(Literal::Str(quoted[1..quoted.len() - 1].to_owned()))
        }
        Rule::number => Expr::Literal(Literal::Num(pair.as_str().to_owned())),
        rule => unreachable!("rule {rule:?} cannot appear in expression position"),
    }
}
