use winnow::ascii::{dec_int, digit1, till_line_ending};
use winnow::combinator::{alt, cut_err, delimited, not, opt, preceded, repeat, separated, terminated};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

use crate::types::{is_ident_char, is_ident_start};
use crate::{Criterion, EqRule, Expression, RangeRule, Rule, SetRule, Timestamp, Value};

use super::parser::Statement;

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Identifiers & keywords -------------------------------------------------

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., is_ident_start),
        take_while(0.., is_ident_char),
    )
        .take()
        .parse_next(input)
}

/// `kw` not followed by an identifier character, so `ANDROID` is not `AND`.
fn keyword(kw: &'static str) -> impl FnMut(&mut &str) -> ModalResult<()> {
    move |input: &mut &str| {
        terminated(kw, not(one_of(is_ident_char)))
            .void()
            .parse_next(input)
    }
}

// -- Values -----------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn number(input: &mut &str) -> ModalResult<f64> {
    (opt('-'), digit1, opt(('.', digit1)))
        .take()
        .try_map(str::parse::<f64>)
        .parse_next(input)
}

fn timestamp(input: &mut &str) -> ModalResult<Timestamp> {
    ("ts", ws, '(', ws).parse_next(input)?;
    let seconds = cut_err(dec_int::<_, i64, _>).parse_next(input)?;
    (ws, cut_err(','), ws).parse_next(input)?;
    let nanos = cut_err(dec_int::<_, i32, _>).parse_next(input)?;
    (ws, cut_err(')')).parse_next(input)?;
    Ok(Timestamp::new(seconds, nanos))
}

fn value(input: &mut &str) -> ModalResult<Value> {
    ws.parse_next(input)?;
    alt((
        string_literal.map(Value::String),
        preceded('v', string_literal).map(Value::SemanticVersion),
        timestamp.map(Value::Timestamp),
        keyword("true").value(Value::Bool(true)),
        keyword("false").value(Value::Bool(false)),
        number.map(Value::Number),
    ))
    .context(StrContext::Expected(StrContextValue::Description("value")))
    .parse_next(input)
}

// -- Rules ------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Bound {
    StartInclusive,
    StartExclusive,
    EndInclusive,
    EndExclusive,
}

fn bound(input: &mut &str) -> ModalResult<(Bound, Value)> {
    ws.parse_next(input)?;
    let kind = alt((
        ">=".value(Bound::StartInclusive),
        ">".value(Bound::StartExclusive),
        "<=".value(Bound::EndInclusive),
        "<".value(Bound::EndExclusive),
    ))
    .parse_next(input)?;
    let v = cut_err(value).parse_next(input)?;
    Ok((kind, v))
}

fn range_rule(input: &mut &str) -> ModalResult<Rule> {
    let bounds: Vec<(Bound, Value)> = separated(1.., bound, (ws, ',')).parse_next(input)?;
    let mut range = RangeRule::default();
    for (kind, v) in bounds {
        match kind {
            Bound::StartInclusive => range.start_inclusive = Some(v),
            Bound::StartExclusive => range.start_exclusive = Some(v),
            Bound::EndInclusive => range.end_inclusive = Some(v),
            Bound::EndExclusive => range.end_exclusive = Some(v),
        }
    }
    Ok(Rule::Range(range))
}

fn set_rule(input: &mut &str) -> ModalResult<Rule> {
    (ws, '{').parse_next(input)?;
    let values: Vec<Value> = separated(0.., value, (ws, ',')).parse_next(input)?;
    (ws, cut_err('}')).parse_next(input)?;
    Ok(Rule::Set(SetRule { values }))
}

fn rule(input: &mut &str) -> ModalResult<Rule> {
    ws.parse_next(input)?;
    alt((
        preceded("==", cut_err(value)).map(|value| Rule::Eq(EqRule { value })),
        preceded(keyword("in"), cut_err(set_rule)),
        keyword("exists").value(Rule::Range(RangeRule::default())),
        range_rule,
    ))
    .context(StrContext::Expected(StrContextValue::Description("rule")))
    .parse_next(input)
}

// -- Criteria ---------------------------------------------------------------

fn name_or_string(input: &mut &str) -> ModalResult<String> {
    alt((string_literal, ident.map(str::to_owned))).parse_next(input)
}

fn segment_criterion(input: &mut &str) -> ModalResult<Criterion> {
    keyword("segment").parse_next(input)?;
    ws.parse_next(input)?;
    let name = cut_err(name_or_string)
        .context(StrContext::Expected(StrContextValue::Description(
            "segment name",
        )))
        .parse_next(input)?;
    Ok(Criterion::segment(&name))
}

fn attribute_criterion(input: &mut &str) -> ModalResult<Criterion> {
    keyword("attribute").parse_next(input)?;
    ws.parse_next(input)?;
    let attribute = cut_err(name_or_string)
        .context(StrContext::Expected(StrContextValue::Description(
            "attribute name",
        )))
        .parse_next(input)?;
    let rule = cut_err(rule).parse_next(input)?;
    Ok(Criterion::attribute(&attribute, rule))
}

fn criterion_def(input: &mut &str) -> ModalResult<Statement> {
    ws.parse_next(input)?;
    keyword("criterion").parse_next(input)?;
    ws.parse_next(input)?;

    let name = cut_err(name_or_string)
        .context(StrContext::Expected(StrContextValue::Description(
            "criterion name",
        )))
        .parse_next(input)?;

    (ws, cut_err('='), ws).parse_next(input)?;

    let criterion = cut_err(alt((segment_criterion, attribute_criterion)))
        .context(StrContext::Expected(StrContextValue::Description(
            "criterion body",
        )))
        .parse_next(input)?;

    Ok(Statement::Criterion(name, criterion))
}

// -- Expressions (precedence: OR < AND < NOT < primary) ---------------------

fn primary(input: &mut &str) -> ModalResult<Expression> {
    ws.parse_next(input)?;
    alt((
        delimited('(', expr, (ws, cut_err(')'))),
        keyword("true").value(Expression::And(Vec::new())),
        keyword("false").value(Expression::Or(Vec::new())),
        ident.map(Expression::reference),
        string_literal.map(Expression::Ref),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "expression",
    )))
    .parse_next(input)
}

fn unary(input: &mut &str) -> ModalResult<Expression> {
    ws.parse_next(input)?;
    let negated = opt(alt((keyword("NOT"), keyword("not"), '!'.void())))
        .parse_next(input)?
        .is_some();
    if negated {
        let inner = cut_err(unary).parse_next(input)?;
        Ok(!inner)
    } else {
        primary(input)
    }
}

fn and_expr(input: &mut &str) -> ModalResult<Expression> {
    let first = unary(input)?;
    let rest: Vec<Expression> = repeat(
        0..,
        preceded(
            (ws, alt((keyword("AND"), keyword("and"), '&'.void()))),
            cut_err(unary),
        ),
    )
    .parse_next(input)?;
    Ok(join(first, rest, Expression::And))
}

fn or_expr(input: &mut &str) -> ModalResult<Expression> {
    let first = and_expr(input)?;
    let rest: Vec<Expression> = repeat(
        0..,
        preceded(
            (ws, alt((keyword("OR"), keyword("or"), '|'.void()))),
            cut_err(and_expr),
        ),
    )
    .parse_next(input)?;
    Ok(join(first, rest, Expression::Or))
}

fn join(
    first: Expression,
    rest: Vec<Expression>,
    connective: fn(Vec<Expression>) -> Expression,
) -> Expression {
    if rest.is_empty() {
        return first;
    }
    let mut operands = Vec::with_capacity(rest.len() + 1);
    operands.push(first);
    operands.extend(rest);
    connective(operands)
}

fn expr(input: &mut &str) -> ModalResult<Expression> {
    ws.parse_next(input)?;
    or_expr(input)
}

fn match_def(input: &mut &str) -> ModalResult<Statement> {
    ws.parse_next(input)?;
    keyword("match").parse_next(input)?;
    let expression = cut_err(expr)
        .context(StrContext::Expected(StrContextValue::Description(
            "match expression",
        )))
        .parse_next(input)?;
    Ok(Statement::Match(expression))
}

// -- Top-level parser -------------------------------------------------------

pub(crate) fn parse_statements(input: &mut &str) -> ModalResult<Vec<Statement>> {
    let statements: Vec<Statement> =
        repeat(0.., alt((criterion_def, match_def))).parse_next(input)?;
    ws.parse_next(input)?;
    Ok(statements)
}
