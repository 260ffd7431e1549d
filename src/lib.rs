//! # tsugi
//!
//! A minimal async middleware-composition engine. No transport, no server.
//!
//! ## The contract
//!
//! An [`Application`] is an ordered list of middleware. Running it threads one
//! mutable [`Context`] and one output [`Buffer`] through every middleware in
//! insertion order. Each middleware resolves to an [`Outcome`]:
//!
//! - `Ok(())`: carry on with the next entry
//! - [`Halt::Skip`]: stop the chain it was raised in; the enclosing chain continues
//! - [`Halt::End`]: stop everything, reported to the caller as success
//! - [`Halt::Error`]: abort, the error reaches the caller verbatim
//!
//! On top of that sit three composition operators:
//!
//! - [`Application::install`]: append a middleware or a nested application
//! - [`Application::install_if`]: run a group when a condition holds, then end
//! - [`Application::mount`]: run a group when the location pathname matches
//!
//! ## Quick start
//!
//! ```rust
//! use tsugi::{Application, Buffer, Context, Location, ParseQuery, entries, from_fn, from_sync_fn};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let app = Application::new()
//!     .install(ParseQuery::new())
//!     .mount("/hello/", entries![from_fn(|ctx, buf| Box::pin(async move {
//!         let name = ctx.get_str("name").unwrap_or("world").to_owned();
//!         buf.append(format!("hello, {name}").into());
//!         Ok(())
//!     }))])
//!     .install(from_sync_fn(|_, buf| {
//!         buf.set_html("not found".into());
//!         Ok(())
//!     }));
//!
//! let ctx = Context::new().with_location(Location::parse("/hello/?name=tsugi"));
//! let done = app.run_with(ctx).await;
//! assert!(done.result.is_ok());
//! assert_eq!(done.canvas.html(), "hello, tsugi");
//! # }
//! ```

mod application;
mod buffer;
mod canvas;
mod chain;
mod context;
mod error;
mod location;
mod middleware;
mod query;
mod router;

pub use application::{Application, Completion, IntoVerdict};
pub use buffer::{Buffer, Item, Markup};
pub use canvas::Canvas;
pub use chain::{Chain, merge};
pub use context::{Context, Location, LocationSource, Params};
pub use error::Error;
pub use location::{ParseHash, ParseQuery, SetLocation, location};
pub use middleware::{
    BoxFuture, BoxedMiddleware, Entry, FromFn, FromSyncFn, Halt, IntoEntry, Middleware, Outcome,
    from_fn, from_sync_fn,
};
pub use query::parse_params;
pub use router::PathMatcher;
