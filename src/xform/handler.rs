//! Ordered transform handler lookup.
//!
//! Each handler is a named matcher that either claims a prim (returning a
//! [`Transform3d`] for it) or declines. The first handler that claims a
//! prim wins. The default order is matrix op, primary Maya stack, then the
//! fallback Maya stack.

use super::{MatrixOpStack, MayaXformStack, StackFlavor, Transform3d};
use crate::config::Settings;
use crate::core::{Host, Prim};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Outcome of matching a prim against one handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchResult<T> {
    NoMatch,
    Matched(T),
}

impl<T> MatchResult<T> {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MatchResult<U> {
        match self {
            Self::Matched(t) => MatchResult::Matched(f(t)),
            Self::NoMatch => MatchResult::NoMatch,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Matched(t) => Some(t),
            Self::NoMatch => None,
        }
    }
}

impl<T> From<Option<T>> for MatchResult<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(t) => Self::Matched(t),
            None => Self::NoMatch,
        }
    }
}

/// What every matcher gets to decide with.
#[derive(Clone)]
pub struct HandlerContext {
    pub settings: Settings,
    pub host: Arc<dyn Host>,
}

/// Handler body: claim a prim or decline.
pub type Matcher = Box<dyn Fn(&Prim, &HandlerContext) -> MatchResult<Box<dyn Transform3d>> + Send + Sync>;

/// First-match-wins list of transform handlers.
pub struct HandlerChain {
    context: HandlerContext,
    handlers: Vec<(String, Matcher)>,
}

impl HandlerChain {
    /// Empty chain.
    pub fn new(settings: Settings, host: Arc<dyn Host>) -> Self {
        Self {
            context: HandlerContext { settings, host },
            handlers: Vec::new(),
        }
    }

    /// Chain with the matrix, primary and fallback handlers.
    pub fn with_defaults(settings: Settings, host: Arc<dyn Host>) -> Self {
        let mut chain = Self::new(settings, host);
        chain.push(
            "matrix",
            Box::new(|prim: &Prim, ctx: &HandlerContext| {
                MatrixOpStack::match_prim(prim, ctx.host.clone(), &ctx.settings)
                    .map(|s| Box::new(s) as Box<dyn Transform3d>)
            }),
        );
        for flavor in [StackFlavor::Primary, StackFlavor::Fallback] {
            chain.push(
                flavor.name(),
                Box::new(move |prim: &Prim, ctx: &HandlerContext| {
                    MayaXformStack::match_prim(prim, ctx.host.clone(), &ctx.settings, flavor)
                        .map(|s| Box::new(s) as Box<dyn Transform3d>)
                }),
            );
        }
        chain
    }

    /// Append a handler; it is consulted after all existing ones.
    pub fn push(&mut self, name: impl Into<String>, matcher: Matcher) {
        self.handlers.push((name.into(), matcher));
    }

    /// Insert a handler ahead of all existing ones.
    pub fn push_front(&mut self, name: impl Into<String>, matcher: Matcher) {
        self.handlers.insert(0, (name.into(), matcher));
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn context(&self) -> &HandlerContext {
        &self.context
    }

    /// Transform interface from the first handler that claims `prim`.
    pub fn transform3d(&self, prim: &Prim) -> Option<Box<dyn Transform3d>> {
        for (name, matcher) in &self.handlers {
            if let MatchResult::Matched(t) = matcher(prim, &self.context) {
                debug!(path = prim.path(), handler = %name, "transform handler matched");
                return Some(t);
            }
        }
        debug!(path = prim.path(), "no transform handler matched");
        None
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("handlers", &self.names())
            .field("settings", &self.context.settings)
            .finish()
    }
}
