//! The mutable context threaded through a run.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded key/value pairs from a query string, a fragment or a route.
pub type Params = HashMap<String, String>;

/// A navigation location, shaped like the browser's `window.location`.
///
/// Every part is optional: a location built by the accessor middleware when
/// no host is present is entirely empty.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Location {
    pub href: Option<String>,
    pub pathname: Option<String>,
    /// Query string including the leading `?`.
    pub search: Option<String>,
    /// Fragment including the leading `#`.
    pub hash: Option<String>,
}

impl Location {
    /// Splits `/path?query#fragment` into its parts.
    ///
    /// An absolute `scheme://host` origin is dropped from the pathname, which
    /// then defaults to `/` like a browser's.
    ///
    /// ```rust
    /// use tsugi::Location;
    ///
    /// let loc = Location::parse("/foo/?a=1#!?b=2");
    /// assert_eq!(loc.pathname.as_deref(), Some("/foo/"));
    /// assert_eq!(loc.search.as_deref(), Some("?a=1"));
    /// assert_eq!(loc.hash.as_deref(), Some("#!?b=2"));
    /// ```
    pub fn parse(href: &str) -> Self {
        let (rest, hash) = match href.find('#') {
            Some(pos) => (&href[..pos], Some(href[pos..].to_owned())),
            None => (href, None),
        };
        let (pathname, search) = match rest.find('?') {
            Some(pos) => (&rest[..pos], Some(rest[pos..].to_owned())),
            None => (rest, None),
        };
        Self {
            href: Some(href.to_owned()),
            pathname: Some(strip_origin(pathname).to_owned()),
            search,
            hash,
        }
    }

    pub fn with_pathname(pathname: impl Into<String>) -> Self {
        Self { pathname: Some(pathname.into()), ..Self::default() }
    }
}

fn strip_origin(path: &str) -> &str {
    let Some((scheme, rest)) = path.split_once("://") else {
        return path;
    };
    let is_scheme = !scheme.is_empty()
        && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !is_scheme {
        return path;
    }
    match rest.find('/') {
        Some(pos) => &rest[pos..],
        None => "/",
    }
}

/// The host's ambient navigation location, injected rather than looked up.
///
/// Implemented for any `Fn() -> Option<Location>`.
pub trait LocationSource: Send + Sync {
    fn current(&self) -> Option<Location>;
}

impl<F> LocationSource for F
where
    F: Fn() -> Option<Location> + Send + Sync,
{
    fn current(&self) -> Option<Location> {
        self()
    }
}

/// Caller-supplied mutable state for one run.
///
/// Free-form values live in a JSON map ([`Context::get`], [`Context::insert`]).
/// The engine itself only touches the location fields, the parsed query and
/// fragment markers, and route parameters captured by `mount`.
#[derive(Default)]
pub struct Context {
    locals: Map<String, Value>,
    pub(crate) location: Option<Location>,
    pub(crate) location_search: Option<Params>,
    pub(crate) location_hash: Option<Params>,
    pub(crate) params: Params,
    host: Option<Arc<dyn LocationSource>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presets the location so the accessors leave it untouched.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Injects the host's location capability.
    pub fn with_host(mut self, host: impl LocationSource + 'static) -> Self {
        self.host = Some(Arc::new(host));
        self
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = Some(location);
    }

    /// The current pathname, if a location with one is present.
    pub fn pathname(&self) -> Option<&str> {
        self.location.as_ref()?.pathname.as_deref()
    }

    /// Pairs decoded from the query string, once parsed.
    pub fn location_search(&self) -> Option<&Params> {
        self.location_search.as_ref()
    }

    /// Pairs decoded from the `#!...?` fragment, once parsed.
    pub fn location_hash(&self) -> Option<&Params> {
        self.location_hash.as_ref()
    }

    /// A route parameter captured by a `mount` template such as `/users/{id}`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.locals.get(key)
    }

    /// Shorthand for a string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.locals.get(key)?.as_str()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.locals.contains_key(key)
    }

    /// Stores a value, returning the one it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.locals.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.locals.remove(key)
    }

    pub fn locals(&self) -> &Map<String, Value> {
        &self.locals
    }

    pub(crate) fn host_location(&self) -> Option<Location> {
        self.host.as_ref()?.current()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("locals", &self.locals)
            .field("location", &self.location)
            .field("location_search", &self.location_search)
            .field("location_hash", &self.location_hash)
            .field("params", &self.params)
            .field("host", &self.host.is_some())
            .finish()
    }
}
