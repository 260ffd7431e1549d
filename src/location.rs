//! Location, query-string and fragment accessors.
//!
//! All three are plain middleware and idempotent within a run: install them
//! as often as convenient, only the first one to find something does work.
//!
//! ```rust
//! use tsugi::{Application, Location, ParseHash, ParseQuery, location};
//!
//! let app = Application::new()
//!     .install(location(Some(Location::parse("/about?lang=en"))))
//!     .install(ParseQuery::new())
//!     .install(ParseHash::new().defaults("#!?tab=info").root("hash"));
//! # let _ = app;
//! ```

use serde_json::{Map, Value};
use tracing::trace;

use crate::buffer::Buffer;
use crate::context::{Context, Location, Params};
use crate::middleware::{BoxFuture, Middleware, Outcome};
use crate::query::parse_params;

/// Populates `ctx.location` when it is missing.
///
/// Resolution order: the host capability injected with
/// [`Context::with_host`], then `defaults`, then an empty [`Location`].
pub fn location(defaults: Option<Location>) -> SetLocation {
    SetLocation { defaults }
}

/// Middleware returned by [`location`].
#[derive(Clone, Debug, Default)]
pub struct SetLocation {
    defaults: Option<Location>,
}

impl Middleware for SetLocation {
    fn call<'a>(&'a self, ctx: &'a mut Context, _buf: &'a mut dyn Buffer) -> BoxFuture<'a, Outcome> {
        ensure_location(ctx, self.defaults.as_ref());
        Box::pin(std::future::ready(Ok(())))
    }
}

fn ensure_location(ctx: &mut Context, defaults: Option<&Location>) {
    if ctx.location.is_some() {
        return;
    }
    let location = ctx
        .host_location()
        .or_else(|| defaults.cloned())
        .unwrap_or_default();
    trace!(pathname = ?location.pathname, "location populated");
    ctx.location = Some(location);
}

/// Decodes `location.search` (`?k=v&...`) into the context.
#[derive(Clone, Debug, Default)]
pub struct ParseQuery {
    defaults: Option<String>,
    root: Option<String>,
}

impl ParseQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query string used when the location has none, e.g. `"?page=1"`.
    pub fn defaults(mut self, search: impl Into<String>) -> Self {
        self.defaults = Some(search.into());
        self
    }

    /// Store the pairs as one object under `key` instead of at the top level.
    pub fn root(mut self, key: impl Into<String>) -> Self {
        self.root = Some(key.into());
        self
    }
}

impl Middleware for ParseQuery {
    fn call<'a>(&'a self, ctx: &'a mut Context, _buf: &'a mut dyn Buffer) -> BoxFuture<'a, Outcome> {
        if ctx.location_search.is_none() {
            ensure_location(ctx, None);
            let search = ctx
                .location
                .as_ref()
                .and_then(|l| l.search.clone())
                .filter(|s| !s.is_empty())
                .or_else(|| self.defaults.clone());
            let query = search.as_deref().and_then(|s| s.strip_prefix('?'));
            if let Some(query) = query.filter(|q| !q.is_empty()) {
                let params = parse_params(query);
                trace!(count = params.len(), "query string parsed");
                copy_params(ctx, &params, self.root.as_deref());
                ctx.location_search = Some(params);
            }
        }
        Box::pin(std::future::ready(Ok(())))
    }
}

/// Decodes a `#!...?k=v&...` fragment into the context.
#[derive(Clone, Debug, Default)]
pub struct ParseHash {
    defaults: Option<String>,
    root: Option<String>,
}

impl ParseHash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragment used when the location has none, e.g. `"#!?tab=2"`.
    pub fn defaults(mut self, hash: impl Into<String>) -> Self {
        self.defaults = Some(hash.into());
        self
    }

    /// Store the pairs as one object under `key` instead of at the top level.
    pub fn root(mut self, key: impl Into<String>) -> Self {
        self.root = Some(key.into());
        self
    }
}

impl Middleware for ParseHash {
    fn call<'a>(&'a self, ctx: &'a mut Context, _buf: &'a mut dyn Buffer) -> BoxFuture<'a, Outcome> {
        if ctx.location_hash.is_none() {
            ensure_location(ctx, None);
            let hash = ctx
                .location
                .as_ref()
                .and_then(|l| l.hash.clone())
                .filter(|h| !h.is_empty())
                .or_else(|| self.defaults.clone());
            if let Some(query) = hash.as_deref().and_then(hashbang_query) {
                let params = parse_params(query);
                trace!(count = params.len(), "fragment parsed");
                copy_params(ctx, &params, self.root.as_deref());
                ctx.location_hash = Some(params);
            }
        }
        Box::pin(std::future::ready(Ok(())))
    }
}

/// Everything after the last `?` of a `#!` fragment.
fn hashbang_query(hash: &str) -> Option<&str> {
    let (_, query) = hash.strip_prefix("#!")?.rsplit_once('?')?;
    Some(query)
}

fn copy_params(ctx: &mut Context, params: &Params, root: Option<&str>) {
    match root {
        Some(root) => {
            let object: Map<String, Value> = params
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect();
            ctx.insert(root, object);
        }
        None => {
            for (k, v) in params {
                ctx.insert(k.as_str(), v.as_str());
            }
        }
    }
}
