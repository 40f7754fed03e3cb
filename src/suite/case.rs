use crate::client::PetStoreClient;
use crate::config::RunConfig;
use crate::error::CaseError;
use futures::future::BoxFuture;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Whether a case expects the service to accept or reject its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseKind {
    Positive,
    Negative,
}

impl CaseKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            CaseKind::Positive => "positive",
            CaseKind::Negative => "negative",
        }
    }
}

/// Selection mode: `Only` focuses a case, `Skip` reports it without running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMode {
    #[default]
    Normal,
    Only,
    Skip,
}

/// What a case body gets for one attempt.
#[derive(Debug, Clone)]
pub struct CaseContext {
    /// Fresh per attempt; traced when the attempt records a trace.
    pub client: PetStoreClient,
    pub config: Arc<RunConfig>,
    /// 0 for the first attempt, 1 for the first retry.
    pub attempt: u32,
}

pub type CaseFn = dyn Fn(CaseContext) -> BoxFuture<'static, Result<(), CaseError>> + Send + Sync;

/// One independent scenario.
#[derive(Clone)]
pub struct Case {
    pub id: u16,
    pub title: &'static str,
    pub kind: CaseKind,
    pub group: &'static str,
    pub mode: CaseMode,
    body: Arc<CaseFn>,
}

impl Case {
    pub fn new<F, Fut>(id: u16, title: &'static str, kind: CaseKind, body: F) -> Self
    where
        F: Fn(CaseContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CaseError>> + Send + 'static,
    {
        Self {
            id,
            title,
            kind,
            group: kind.as_str(),
            mode: CaseMode::Normal,
            body: Arc::new(move |ctx| Box::pin(body(ctx))),
        }
    }

    #[must_use]
    pub fn in_group(mut self, group: &'static str) -> Self {
        self.group = group;
        self
    }

    #[must_use]
    pub fn only(mut self) -> Self {
        self.mode = CaseMode::Only;
        self
    }

    #[must_use]
    pub fn skip(mut self) -> Self {
        self.mode = CaseMode::Skip;
        self
    }

    /// `TestId: <id>. <title>`, the string grep patterns match against.
    pub fn full_title(&self) -> String {
        format!("TestId: {}. {}", self.id, self.title)
    }

    pub fn run(&self, ctx: CaseContext) -> BoxFuture<'static, Result<(), CaseError>> {
        (self.body)(ctx)
    }
}

impl fmt::Debug for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Case")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("kind", &self.kind)
            .field("group", &self.group)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
