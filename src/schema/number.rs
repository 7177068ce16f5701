//! Number, bigint and date builders.
use chrono::{DateTime, Utc};

use super::{Check, Schema, SchemaKind};

pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
pub const MIN_SAFE_INTEGER: f64 = -9_007_199_254_740_991.0;

// ------------------------------- Number ----------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberCheckKind {
    Min { value: f64, inclusive: bool },
    Max { value: f64, inclusive: bool },
    Int,
    MultipleOf(f64),
    Finite,
}

pub type NumberCheck = Check<NumberCheckKind>;

#[derive(Debug, Clone, Default)]
pub struct NumberDef {
    pub checks: Vec<NumberCheck>,
    pub coerce: bool,
}

impl NumberDef {
    pub fn is_int(&self) -> bool {
        self.checks.iter().any(|c| c.kind == NumberCheckKind::Int)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NumberSchema {
    def: NumberDef,
}

pub fn number() -> NumberSchema {
    NumberSchema::default()
}

impl NumberSchema {
    pub fn check(mut self, check: impl Into<NumberCheck>) -> Self {
        self.def.checks.push(check.into());
        self
    }

    pub(crate) fn coerce(mut self) -> Self {
        self.def.coerce = true;
        self
    }

    pub fn gt(self, value: f64) -> Self {
        self.check(NumberCheckKind::Min { value, inclusive: false })
    }

    pub fn gte(self, value: f64) -> Self {
        self.check(NumberCheckKind::Min { value, inclusive: true })
    }

    pub fn min(self, value: f64) -> Self {
        self.gte(value)
    }

    pub fn lt(self, value: f64) -> Self {
        self.check(NumberCheckKind::Max { value, inclusive: false })
    }

    pub fn lte(self, value: f64) -> Self {
        self.check(NumberCheckKind::Max { value, inclusive: true })
    }

    pub fn max(self, value: f64) -> Self {
        self.lte(value)
    }

    pub fn int(self) -> Self {
        self.check(NumberCheckKind::Int)
    }

    pub fn positive(self) -> Self {
        self.gt(0.0)
    }

    pub fn nonnegative(self) -> Self {
        self.gte(0.0)
    }

    pub fn negative(self) -> Self {
        self.lt(0.0)
    }

    pub fn nonpositive(self) -> Self {
        self.lte(0.0)
    }

    pub fn multiple_of(self, step: f64) -> Self {
        self.check(NumberCheckKind::MultipleOf(step))
    }

    pub fn step(self, step: f64) -> Self {
        self.multiple_of(step)
    }

    pub fn finite(self) -> Self {
        self.check(NumberCheckKind::Finite)
    }

    /// Integer-representable range of a double.
    pub fn safe(self) -> Self {
        self.gte(MIN_SAFE_INTEGER).lte(MAX_SAFE_INTEGER)
    }

    pub fn def(&self) -> &NumberDef {
        &self.def
    }
}

impl From<NumberSchema> for Schema {
    fn from(s: NumberSchema) -> Schema {
        Schema::new(SchemaKind::Number(s.def))
    }
}

// ------------------------------- BigInt ----------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BigIntCheckKind {
    Min { value: i128, inclusive: bool },
    Max { value: i128, inclusive: bool },
    MultipleOf(i128),
}

pub type BigIntCheck = Check<BigIntCheckKind>;

#[derive(Debug, Clone, Default)]
pub struct BigIntDef {
    pub checks: Vec<BigIntCheck>,
    pub coerce: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BigIntSchema {
    def: BigIntDef,
}

pub fn bigint() -> BigIntSchema {
    BigIntSchema::default()
}

impl BigIntSchema {
    pub fn check(mut self, check: impl Into<BigIntCheck>) -> Self {
        self.def.checks.push(check.into());
        self
    }

    pub(crate) fn coerce(mut self) -> Self {
        self.def.coerce = true;
        self
    }

    pub fn gt(self, value: i128) -> Self {
        self.check(BigIntCheckKind::Min { value, inclusive: false })
    }

    pub fn gte(self, value: i128) -> Self {
        self.check(BigIntCheckKind::Min { value, inclusive: true })
    }

    pub fn lt(self, value: i128) -> Self {
        self.check(BigIntCheckKind::Max { value, inclusive: false })
    }

    pub fn lte(self, value: i128) -> Self {
        self.check(BigIntCheckKind::Max { value, inclusive: true })
    }

    pub fn positive(self) -> Self {
        self.gt(0)
    }

    pub fn nonnegative(self) -> Self {
        self.gte(0)
    }

    pub fn negative(self) -> Self {
        self.lt(0)
    }

    pub fn nonpositive(self) -> Self {
        self.lte(0)
    }

    pub fn multiple_of(self, step: i128) -> Self {
        self.check(BigIntCheckKind::MultipleOf(step))
    }

    pub fn def(&self) -> &BigIntDef {
        &self.def
    }
}

impl From<BigIntSchema> for Schema {
    fn from(s: BigIntSchema) -> Schema {
        Schema::new(SchemaKind::BigInt(s.def))
    }
}

// -------------------------------- Date ------------------------------------ //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCheckKind {
    Min(DateTime<Utc>),
    Max(DateTime<Utc>),
}

pub type DateCheck = Check<DateCheckKind>;

#[derive(Debug, Clone, Default)]
pub struct DateDef {
    pub checks: Vec<DateCheck>,
    pub coerce: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DateSchema {
    def: DateDef,
}

pub fn date() -> DateSchema {
    DateSchema::default()
}

impl DateSchema {
    pub fn check(mut self, check: impl Into<DateCheck>) -> Self {
        self.def.checks.push(check.into());
        self
    }

    pub(crate) fn coerce(mut self) -> Self {
        self.def.coerce = true;
        self
    }

    pub fn min(self, at: DateTime<Utc>) -> Self {
        self.check(DateCheckKind::Min(at))
    }

    pub fn max(self, at: DateTime<Utc>) -> Self {
        self.check(DateCheckKind::Max(at))
    }

    pub fn def(&self) -> &DateDef {
        &self.def
    }
}

impl From<DateSchema> for Schema {
    fn from(s: DateSchema) -> Schema {
        Schema::new(SchemaKind::Date(s.def))
    }
}
