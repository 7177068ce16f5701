use regex::Regex;

use crate::error::SchemaError;

use super::{Check, Schema, SchemaKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

/// Shape accepted by the `datetime` check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatetimeOptions {
    /// Exact number of fractional-second digits; `None` accepts any.
    pub precision: Option<u32>,
    /// Accept `+hh:mm` offsets in addition to `Z`.
    pub offset: bool,
}

#[derive(Debug, Clone)]
pub enum StringCheckKind {
    Min(usize),
    Max(usize),
    Length(usize),
    Email,
    Url,
    Emoji,
    Uuid,
    Cuid,
    Cuid2,
    Ulid,
    Regex(Regex),
    Includes { value: String, position: Option<usize> },
    StartsWith(String),
    EndsWith(String),
    Datetime(DatetimeOptions),
    Ip(Option<IpVersion>),
    Trim,
    ToLowerCase,
    ToUpperCase,
}

pub type StringCheck = Check<StringCheckKind>;

#[derive(Debug, Clone, Default)]
pub struct StringDef {
    pub checks: Vec<StringCheck>,
    pub coerce: bool,
}

impl StringDef {
    pub fn min_length(&self) -> Option<usize> {
        self.checks
            .iter()
            .filter_map(|c| match c.kind {
                StringCheckKind::Min(n) | StringCheckKind::Length(n) => Some(n),
                _ => None,
            })
            .max()
    }

    pub fn max_length(&self) -> Option<usize> {
        self.checks
            .iter()
            .filter_map(|c| match c.kind {
                StringCheckKind::Max(n) | StringCheckKind::Length(n) => Some(n),
                _ => None,
            })
            .min()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    def: StringDef,
}

pub fn string() -> StringSchema {
    StringSchema::default()
}

impl StringSchema {
    pub fn check(mut self, check: impl Into<StringCheck>) -> Self {
        self.def.checks.push(check.into());
        self
    }

    pub(crate) fn coerce(mut self) -> Self {
        self.def.coerce = true;
        self
    }

    pub fn min(self, n: usize) -> Self {
        self.check(StringCheckKind::Min(n))
    }

    pub fn max(self, n: usize) -> Self {
        self.check(StringCheckKind::Max(n))
    }

    pub fn length(self, n: usize) -> Self {
        self.check(StringCheckKind::Length(n))
    }

    pub fn nonempty(self) -> Self {
        self.min(1)
    }

    pub fn email(self) -> Self {
        self.check(StringCheckKind::Email)
    }

    pub fn url(self) -> Self {
        self.check(StringCheckKind::Url)
    }

    pub fn emoji(self) -> Self {
        self.check(StringCheckKind::Emoji)
    }

    pub fn uuid(self) -> Self {
        self.check(StringCheckKind::Uuid)
    }

    pub fn cuid(self) -> Self {
        self.check(StringCheckKind::Cuid)
    }

    pub fn cuid2(self) -> Self {
        self.check(StringCheckKind::Cuid2)
    }

    pub fn ulid(self) -> Self {
        self.check(StringCheckKind::Ulid)
    }

    pub fn regex(self, re: Regex) -> Self {
        self.check(StringCheckKind::Regex(re))
    }

    /// Compile `pattern` and add it as a regex check.
    pub fn pattern(self, pattern: &str) -> Result<Self, SchemaError> {
        let re = Regex::new(pattern)
            .map_err(|e| SchemaError::Regex { pattern: pattern.to_string(), reason: e.to_string() })?;
        Ok(self.regex(re))
    }

    pub fn includes(self, value: impl Into<String>) -> Self {
        self.check(StringCheckKind::Includes { value: value.into(), position: None })
    }

    /// Substring must occur at or after char index `position`.
    pub fn includes_at(self, value: impl Into<String>, position: usize) -> Self {
        self.check(StringCheckKind::Includes { value: value.into(), position: Some(position) })
    }

    pub fn starts_with(self, prefix: impl Into<String>) -> Self {
        self.check(StringCheckKind::StartsWith(prefix.into()))
    }

    pub fn ends_with(self, suffix: impl Into<String>) -> Self {
        self.check(StringCheckKind::EndsWith(suffix.into()))
    }

    pub fn datetime(self) -> Self {
        self.datetime_with(DatetimeOptions::default())
    }

    pub fn datetime_with(self, options: DatetimeOptions) -> Self {
        self.check(StringCheckKind::Datetime(options))
    }

    pub fn ip(self) -> Self {
        self.check(StringCheckKind::Ip(None))
    }

    pub fn ip_version(self, version: IpVersion) -> Self {
        self.check(StringCheckKind::Ip(Some(version)))
    }

    pub fn trim(self) -> Self {
        self.check(StringCheckKind::Trim)
    }

    pub fn to_lowercase(self) -> Self {
        self.check(StringCheckKind::ToLowerCase)
    }

    pub fn to_uppercase(self) -> Self {
        self.check(StringCheckKind::ToUpperCase)
    }

    pub fn def(&self) -> &StringDef {
        &self.def
    }
}

impl From<StringSchema> for Schema {
    fn from(s: StringSchema) -> Schema {
        Schema::new(SchemaKind::String(s.def))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_bounds_fold_over_checks() {
        let s = string().min(2).length(5).max(9);
        assert_eq!(s.def().min_length(), Some(5));
        assert_eq!(s.def().max_length(), Some(5));
        assert_eq!(string().def().min_length(), None);
    }

    #[test]
    fn bad_pattern_is_a_schema_error() {
        let err = string().pattern("(").unwrap_err();
        assert!(matches!(err, SchemaError::Regex { .. }));
        assert!(string().pattern("^a+$").is_ok());
    }
}
