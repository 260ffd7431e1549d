//! Path matchers used by [`Application::mount`](crate::Application::mount).
//!
//! Three flavours:
//!
//! - a literal prefix, `"/about/"`, satisfied by any pathname starting with it
//! - a [`Regex`], satisfied according to its own anchoring
//! - a route template, `"/users/{id}"`, matched exactly with [`matchit`];
//!   captured parameters are stored on the context

use std::fmt;

use matchit::Router as MatchitRouter;
use regex::Regex;

use crate::context::Context;
use crate::error::Error;

/// Decides whether a mount group applies to the current pathname.
pub enum PathMatcher {
    Prefix(String),
    Pattern(Regex),
    Route(MatchitRouter<()>),
}

impl PathMatcher {
    /// Route template with `{name}` / `{*rest}` parameters.
    ///
    /// ```rust
    /// use tsugi::PathMatcher;
    ///
    /// assert!(PathMatcher::route("/users/{id}").is_ok());
    /// assert!(PathMatcher::route("/files/{*rest}/raw").is_err());
    /// ```
    pub fn route(template: &str) -> Result<Self, Error> {
        let mut tree = MatchitRouter::new();
        tree.insert(template, ())
            .map_err(|e| Error::msg(format!("invalid route `{template}`: {e}")))?;
        Ok(Self::Route(tree))
    }

    /// `None` when the context carries no pathname, or an empty one.
    pub(crate) fn test(&self, ctx: &mut Context) -> Option<bool> {
        let path = ctx.pathname().filter(|p| !p.is_empty())?;
        let matched = match self {
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
            Self::Pattern(re) => re.is_match(path),
            Self::Route(tree) => match tree.at(path) {
                Ok(found) => {
                    let params: Vec<(String, String)> = found
                        .params
                        .iter()
                        .map(|(k, v)| (k.to_owned(), v.to_owned()))
                        .collect();
                    ctx.params.extend(params);
                    true
                }
                Err(_) => false,
            },
        };
        Some(matched)
    }
}

impl fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(prefix) => f.debug_tuple("Prefix").field(prefix).finish(),
            Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Self::Route(_) => f.write_str("Route(..)"),
        }
    }
}

impl From<&str> for PathMatcher {
    fn from(prefix: &str) -> Self {
        Self::Prefix(prefix.to_owned())
    }
}

impl From<String> for PathMatcher {
    fn from(prefix: String) -> Self {
        Self::Prefix(prefix)
    }
}

impl From<Regex> for PathMatcher {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}
