//! Per-call state threaded through validation.
use std::sync::{Arc, Mutex};

use crate::error_map::{make_issue, ErrorMap, Resolvers, SchemaMessages};
use crate::issue::{Issue, IssueData, PathSegment};
use crate::value::Value;

/// Options for one top-level call.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Prefix for every reported issue path.
    pub path: Vec<PathSegment>,
    /// Per-call message override, applied after every other resolver.
    pub error_map: Option<ErrorMap>,
    /// Locale table applied on top of the built-in English messages.
    pub locale: Option<ErrorMap>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_error_map(mut self, map: ErrorMap) -> Self {
        self.error_map = Some(map);
        self
    }

    pub fn with_locale(mut self, map: ErrorMap) -> Self {
        self.locale = Some(map);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Sync,
    Async,
}

/// Mutable state for one top-level call. Forks share path and resolvers but
/// start with an empty issue list.
#[derive(Debug)]
pub struct ParseContext {
    pub(crate) path: Vec<PathSegment>,
    pub(crate) issues: Vec<Issue>,
    pub(crate) mode: ParseMode,
    pub(crate) contextual: Option<ErrorMap>,
    pub(crate) locale: Option<ErrorMap>,
}

impl ParseContext {
    pub(crate) fn new(options: &ParseOptions, mode: ParseMode) -> Self {
        Self {
            path: options.path.clone(),
            issues: Vec::new(),
            mode,
            contextual: options.error_map.clone(),
            locale: options.locale.clone(),
        }
    }

    pub(crate) fn fork(&self) -> Self {
        Self {
            path: self.path.clone(),
            issues: Vec::new(),
            mode: self.mode,
            contextual: self.contextual.clone(),
            locale: self.locale.clone(),
        }
    }

    /// Fork with `segments` appended to the path.
    pub(crate) fn child(&self, segments: &[PathSegment]) -> Self {
        let mut child = self.fork();
        child.path.extend_from_slice(segments);
        child
    }

    /// Take over a fork's issues, keeping them after the ones already here.
    pub(crate) fn absorb(&mut self, child: ParseContext) {
        self.issues.extend(child.issues);
    }

    pub(crate) fn add_issue(&mut self, messages: &SchemaMessages, data: IssueData, input: &Value) {
        let resolvers = Resolvers {
            locale: self.locale.as_ref(),
            schema: (!messages.is_empty()).then_some(messages),
            contextual: self.contextual.as_ref(),
        };
        let issue = make_issue(data, &self.path, input, &resolvers);
        self.issues.push(issue);
    }

    pub(crate) fn options(&self) -> ParseOptions {
        ParseOptions {
            path: self.path.clone(),
            error_map: self.contextual.clone(),
            locale: self.locale.clone(),
        }
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

/// Handle given to refinements for raising issues. Cloneable so asynchronous
/// refinements can carry it across await points.
#[derive(Debug, Clone)]
pub struct RefinementCtx {
    path: Arc<[PathSegment]>,
    raised: Arc<Mutex<Vec<IssueData>>>,
}

impl RefinementCtx {
    pub(crate) fn new(path: &[PathSegment]) -> Self {
        Self { path: Arc::from(path), raised: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn add_issue(&self, issue: impl Into<IssueData>) {
        let mut raised = self.raised.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        raised.push(issue.into());
    }

    /// Path of the value being refined.
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    pub(crate) fn take_issues(&self) -> Vec<IssueData> {
        let mut raised = self.raised.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *raised)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forks_start_clean_and_absorb_in_order() {
        let mut root = ParseContext::new(&ParseOptions::new().with_path(["root"]), ParseMode::Sync);
        let messages = SchemaMessages::default();
        root.add_issue(&messages, IssueData::custom("first"), &Value::Null);

        let mut child = root.child(&[PathSegment::from("a")]);
        assert!(child.issues.is_empty());
        child.add_issue(&messages, IssueData::custom("second"), &Value::Null);
        root.absorb(child);

        let paths: Vec<_> = root.issues.iter().map(|i| i.path.len()).collect();
        assert_eq!(paths, vec![1, 2]);
        assert_eq!(root.issues[1].message, "second");
    }

    #[test]
    fn refinement_ctx_collects_across_clones() {
        let ctx = RefinementCtx::new(&[PathSegment::from(0usize)]);
        let other = ctx.clone();
        other.add_issue(IssueData::custom("boom").fatal());
        let taken = ctx.take_issues();
        assert_eq!(taken.len(), 1);
        assert!(taken[0].fatal);
        assert!(ctx.take_issues().is_empty());
    }
}
