//! Leaf kinds: scalars, literals and enums.
use chrono::{DateTime, Utc};

use crate::context::ParseContext;
use crate::error_map::SchemaMessages;
use crate::issue::{Bound, IssueData, IssueKind, SizeOrigin, StringValidation};
use crate::schema::{
    BigIntCheckKind, BigIntDef, Check, DateCheckKind, DateDef, EnumDef, NativeEnumDef, NumberCheckKind, NumberDef,
    StringCheckKind, StringDef,
};
use crate::status::{ParseStatus, Parsed};
use crate::value::{format_number, Literal, Value, ValueType};

use super::formats;
use super::reject_type;

/// Record a failed check. Returns `true` when the check was fatal.
fn fail<K>(
    check: &Check<K>,
    kind: IssueKind,
    messages: &SchemaMessages,
    input: &Value,
    status: &mut ParseStatus,
    ctx: &mut ParseContext,
) -> bool {
    let mut data = IssueData::new(kind);
    data.message = check.message.clone();
    ctx.add_issue(messages, data, input);
    if check.fatal {
        status.abort();
    } else {
        status.dirty();
    }
    check.fatal
}

fn too_small(minimum: Bound, inclusive: bool, exact: bool, origin: SizeOrigin) -> IssueKind {
    IssueKind::TooSmall { minimum, inclusive, exact, origin }
}

fn too_big(maximum: Bound, inclusive: bool, exact: bool, origin: SizeOrigin) -> IssueKind {
    IssueKind::TooBig { maximum, inclusive, exact, origin }
}

// ------------------------------- String ----------------------------------- //

pub(super) fn string(def: &StringDef, messages: &SchemaMessages, input: Value, ctx: &mut ParseContext) -> Parsed {
    let input = if def.coerce { Value::String(input.coerce_to_string()) } else { input };
    let Value::String(mut s) = input else {
        return reject_type(ctx, messages, ValueType::String, &input);
    };

    let mut status = ParseStatus::Valid;
    for check in &def.checks {
        let len = s.chars().count();
        let failed = match &check.kind {
            StringCheckKind::Min(n) => {
                (len < *n).then(|| too_small(Bound::from(*n), true, false, SizeOrigin::String))
            }
            StringCheckKind::Max(n) => (len > *n).then(|| too_big(Bound::from(*n), true, false, SizeOrigin::String)),
            StringCheckKind::Length(n) => {
                if len > *n {
                    Some(too_big(Bound::from(*n), true, true, SizeOrigin::String))
                } else if len < *n {
                    Some(too_small(Bound::from(*n), true, true, SizeOrigin::String))
                } else {
                    None
                }
            }
            StringCheckKind::Email => invalid_unless(formats::is_email(&s), StringValidation::Email),
            StringCheckKind::Url => invalid_unless(formats::is_url(&s), StringValidation::Url),
            StringCheckKind::Emoji => invalid_unless(formats::is_emoji(&s), StringValidation::Emoji),
            StringCheckKind::Uuid => invalid_unless(formats::is_uuid(&s), StringValidation::Uuid),
            StringCheckKind::Cuid => invalid_unless(formats::is_cuid(&s), StringValidation::Cuid),
            StringCheckKind::Cuid2 => invalid_unless(formats::is_cuid2(&s), StringValidation::Cuid2),
            StringCheckKind::Ulid => invalid_unless(formats::is_ulid(&s), StringValidation::Ulid),
            StringCheckKind::Regex(re) => invalid_unless(re.is_match(&s), StringValidation::Regex),
            StringCheckKind::Datetime(options) => {
                invalid_unless(formats::is_datetime(&s, *options), StringValidation::Datetime)
            }
            StringCheckKind::Ip(version) => invalid_unless(formats::is_ip(&s, *version), StringValidation::Ip),
            StringCheckKind::Includes { value, position } => {
                let found = match position {
                    Some(p) => s.chars().skip(*p).collect::<String>().contains(value.as_str()),
                    None => s.contains(value.as_str()),
                };
                invalid_unless(
                    found,
                    StringValidation::Includes { includes: value.clone(), position: *position },
                )
            }
            StringCheckKind::StartsWith(prefix) => {
                invalid_unless(s.starts_with(prefix.as_str()), StringValidation::StartsWith(prefix.clone()))
            }
            StringCheckKind::EndsWith(suffix) => {
                invalid_unless(s.ends_with(suffix.as_str()), StringValidation::EndsWith(suffix.clone()))
            }
            StringCheckKind::Trim => {
                s = s.trim().to_string();
                None
            }
            StringCheckKind::ToLowerCase => {
                s = s.to_lowercase();
                None
            }
            StringCheckKind::ToUpperCase => {
                s = s.to_uppercase();
                None
            }
        };
        if let Some(kind) = failed {
            let current = Value::String(s.clone());
            if fail(check, kind, messages, &current, &mut status, ctx) {
                return Parsed::Aborted;
            }
        }
    }
    Parsed::new(status, Value::String(s))
}

fn invalid_unless(ok: bool, validation: StringValidation) -> Option<IssueKind> {
    (!ok).then_some(IssueKind::InvalidString { validation })
}

// ------------------------------- Number ----------------------------------- //

/// Remainder computed on scaled integers so decimal steps such as `0.1`
/// divide their own multiples exactly.
pub(crate) fn float_safe_remainder(value: f64, step: f64) -> f64 {
    let decimals = |n: f64| format_number(n).split_once('.').map_or(0, |(_, frac)| frac.len());
    let count = decimals(value).max(decimals(step));
    let scaled = |n: f64| format!("{n:.count$}").replace('.', "").parse::<i128>().ok();
    match (scaled(value), scaled(step)) {
        (Some(v), Some(s)) if s != 0 => (v % s) as f64 / 10f64.powi(count as i32),
        _ => value % step,
    }
}

pub(super) fn number(def: &NumberDef, messages: &SchemaMessages, input: Value, ctx: &mut ParseContext) -> Parsed {
    let input = if def.coerce { Value::Number(input.coerce_to_number()) } else { input };
    let n = match input {
        Value::Number(n) if !n.is_nan() => n,
        other => return reject_type(ctx, messages, ValueType::Number, &other),
    };

    let mut status = ParseStatus::Valid;
    for check in &def.checks {
        let failed = match check.kind {
            NumberCheckKind::Int => (n.fract() != 0.0 || !n.is_finite())
                .then_some(IssueKind::invalid_type(ValueType::Integer, ValueType::Float)),
            NumberCheckKind::Min { value, inclusive } => {
                let below = if inclusive { n < value } else { n <= value };
                below.then(|| too_small(Bound::Number(value), inclusive, false, SizeOrigin::Number))
            }
            NumberCheckKind::Max { value, inclusive } => {
                let above = if inclusive { n > value } else { n >= value };
                above.then(|| too_big(Bound::Number(value), inclusive, false, SizeOrigin::Number))
            }
            NumberCheckKind::MultipleOf(step) => (float_safe_remainder(n, step) != 0.0)
                .then(|| IssueKind::NotMultipleOf { multiple_of: Bound::Number(step) }),
            NumberCheckKind::Finite => (!n.is_finite()).then_some(IssueKind::NotFinite),
        };
        if let Some(kind) = failed {
            if fail(check, kind, messages, &input, &mut status, ctx) {
                return Parsed::Aborted;
            }
        }
    }
    Parsed::new(status, Value::Number(n))
}

pub(super) fn bigint(def: &BigIntDef, messages: &SchemaMessages, input: Value, ctx: &mut ParseContext) -> Parsed {
    let input = match (def.coerce, input.coerce_to_bigint()) {
        (true, Some(i)) => Value::BigInt(i),
        _ => input,
    };
    let Value::BigInt(n) = input else {
        return reject_type(ctx, messages, ValueType::BigInt, &input);
    };

    let mut status = ParseStatus::Valid;
    for check in &def.checks {
        let failed = match check.kind {
            BigIntCheckKind::Min { value, inclusive } => {
                let below = if inclusive { n < value } else { n <= value };
                below.then(|| too_small(Bound::BigInt(value), inclusive, false, SizeOrigin::BigInt))
            }
            BigIntCheckKind::Max { value, inclusive } => {
                let above = if inclusive { n > value } else { n >= value };
                above.then(|| too_big(Bound::BigInt(value), inclusive, false, SizeOrigin::BigInt))
            }
            BigIntCheckKind::MultipleOf(step) => (step == 0 || n.wrapping_rem(step) != 0)
                .then(|| IssueKind::NotMultipleOf { multiple_of: Bound::BigInt(step) }),
        };
        if let Some(kind) = failed {
            if fail(check, kind, messages, &input, &mut status, ctx) {
                return Parsed::Aborted;
            }
        }
    }
    Parsed::new(status, Value::BigInt(n))
}

// ------------------------------ Boolean/Date ------------------------------ //

pub(super) fn boolean(coerce: bool, messages: &SchemaMessages, input: Value, ctx: &mut ParseContext) -> Parsed {
    let input = if coerce { Value::Bool(input.is_truthy()) } else { input };
    match input {
        Value::Bool(b) => Parsed::Valid(Value::Bool(b)),
        other => reject_type(ctx, messages, ValueType::Boolean, &other),
    }
}

fn millis(at: &DateTime<Utc>) -> Bound {
    Bound::Number(at.timestamp_millis() as f64)
}

pub(super) fn date(def: &DateDef, messages: &SchemaMessages, input: Value, ctx: &mut ParseContext) -> Parsed {
    let input = if def.coerce { Value::Date(input.coerce_to_date()) } else { input };
    let at = match input {
        Value::Date(Some(at)) => at,
        Value::Date(None) => {
            ctx.add_issue(messages, IssueData::new(IssueKind::InvalidDate), &input);
            return Parsed::Aborted;
        }
        other => return reject_type(ctx, messages, ValueType::Date, &other),
    };

    let mut status = ParseStatus::Valid;
    for check in &def.checks {
        let failed = match &check.kind {
            DateCheckKind::Min(min) => (at < *min).then(|| too_small(millis(min), true, false, SizeOrigin::Date)),
            DateCheckKind::Max(max) => (at > *max).then(|| too_big(millis(max), true, false, SizeOrigin::Date)),
        };
        if let Some(kind) = failed {
            if fail(check, kind, messages, &input, &mut status, ctx) {
                return Parsed::Aborted;
            }
        }
    }
    Parsed::new(status, Value::Date(Some(at)))
}

/// Kinds that only compare the runtime tag.
pub(super) fn tagged(expected: ValueType, messages: &SchemaMessages, input: Value, ctx: &mut ParseContext) -> Parsed {
    let received = input.value_type();
    let ok = match expected {
        ValueType::Void => received == ValueType::Undefined,
        other => received == other,
    };
    if ok { Parsed::Valid(input) } else { reject_type(ctx, messages, expected, &input) }
}

// ------------------------------ Literal/Enum ------------------------------ //

pub(super) fn literal(expected: &Literal, messages: &SchemaMessages, input: Value, ctx: &mut ParseContext) -> Parsed {
    if expected.to_value() == input {
        return Parsed::Valid(input);
    }
    let kind = IssueKind::InvalidLiteral { expected: expected.clone(), received: input.clone() };
    ctx.add_issue(messages, IssueData::new(kind), &input);
    Parsed::Aborted
}

pub(super) fn enumeration(def: &EnumDef, messages: &SchemaMessages, input: Value, ctx: &mut ParseContext) -> Parsed {
    let Value::String(s) = &input else {
        return reject_type(ctx, messages, ValueType::String, &input);
    };
    if def.values.contains(s) {
        return Parsed::Valid(input);
    }
    let options = def.values.iter().cloned().map(Literal::String).collect();
    let kind = IssueKind::InvalidEnumValue { options, received: input.clone() };
    ctx.add_issue(messages, IssueData::new(kind), &input);
    Parsed::Aborted
}

pub(super) fn native_enum(
    def: &NativeEnumDef,
    messages: &SchemaMessages,
    input: Value,
    ctx: &mut ParseContext,
) -> Parsed {
    let options = def.values();
    if !matches!(input, Value::String(_) | Value::Number(_)) {
        let expected = options.first().map_or(ValueType::String, Literal::value_type);
        return reject_type(ctx, messages, expected, &input);
    }
    if options.iter().any(|o| o.to_value() == input) {
        return Parsed::Valid(input);
    }
    let kind = IssueKind::InvalidEnumValue { options, received: input.clone() };
    ctx.add_issue(messages, IssueData::new(kind), &input);
    Parsed::Aborted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_steps_divide_their_multiples() {
        assert_eq!(float_safe_remainder(0.3, 0.1), 0.0);
        assert_eq!(float_safe_remainder(10.0, 5.0), 0.0);
        assert!(float_safe_remainder(0.35, 0.1) != 0.0);
        assert!(float_safe_remainder(7.0, 2.0) != 0.0);
    }

    #[test]
    fn bigint_step_of_minus_one_divides_the_minimum() {
        let def = BigIntDef { checks: vec![Check::new(BigIntCheckKind::MultipleOf(-1))], coerce: false };
        let mut ctx = ParseContext::new(&Default::default(), crate::context::ParseMode::Sync);
        let out = bigint(&def, &SchemaMessages::default(), Value::BigInt(i128::MIN), &mut ctx);
        assert_eq!(out.status(), ParseStatus::Valid);
        assert!(ctx.issues.is_empty());
    }
}
