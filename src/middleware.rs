//! Middleware trait, control signals and type erasure.
//!
//! # How middleware are stored
//!
//! An [`Application`](crate::Application) holds middleware of *different*
//! concrete types in one ordered list, so every unit is erased behind
//! `Arc<dyn Middleware>` and wrapped in an [`Entry`]:
//!
//! ```text
//! |ctx, buf| Box::pin(async move { … })    ← user writes this
//!        ↓ from_fn(…)
//! FromFn(closure)                          ← implements Middleware
//!        ↓ app.install(…)
//! Entry::Leaf(Arc::new(FromFn(closure)))   ← stored in insertion order
//!        ↓ at start
//! mw.call(ctx, buf)                        ← one vtable dispatch per step
//! ```
//!
//! # The continuation protocol
//!
//! A middleware hands control onward by resolving to an [`Outcome`]:
//!
//! | Outcome | Meaning |
//! |---|---|
//! | `Ok(())` | continue with the next entry |
//! | `Err(Halt::Skip)` | stop the current chain, absorbed at its boundary |
//! | `Err(Halt::End)` | stop the current chain and every enclosing one |
//! | `Err(Halt::Error(e))` | abort, `e` reaches the caller of `start` |

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::application::Application;
use crate::buffer::Buffer;
use crate::context::Context;
use crate::error::Error;

// ── Signals ───────────────────────────────────────────────────────────────────

/// Why a middleware did not simply continue.
#[derive(Debug)]
pub enum Halt {
    /// Terminate the whole remaining pipeline, outer scopes included.
    /// Reported as success by [`Application::start`].
    End,
    /// Terminate only the chain that is currently running; the enclosing
    /// chain carries on with its next entry.
    Skip,
    /// Abort with an application error.
    Error(Error),
}

impl From<Error> for Halt {
    fn from(e: Error) -> Self {
        Self::Error(e)
    }
}

/// What a middleware resolves to. See the module docs for the protocol.
pub type Outcome = Result<(), Halt>;

/// A heap-allocated, type-erased future borrowing the run's context and buffer.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ── Middleware trait ──────────────────────────────────────────────────────────

/// A unit of work run against the shared context and output buffer.
///
/// Implement it on your own types for stateful middleware. For closures use
/// [`from_fn`] or [`from_sync_fn`].
pub trait Middleware: Send + Sync + 'static {
    fn call<'a>(&'a self, ctx: &'a mut Context, buf: &'a mut dyn Buffer) -> BoxFuture<'a, Outcome>;
}

/// A middleware shared between every chain compiled from the same entry.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Adapts an async closure into a [`Middleware`].
///
/// The closure returns a boxed future so it may borrow the context and buffer
/// across `.await` points:
///
/// ```rust
/// use tsugi::{Application, from_fn};
///
/// let app = Application::new().install(from_fn(|ctx, buf| Box::pin(async move {
///     ctx.insert("greeting", "hello");
///     buf.append("hello".into());
///     Ok(())
/// })));
/// # let _ = app;
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: for<'a> Fn(&'a mut Context, &'a mut dyn Buffer) -> BoxFuture<'a, Outcome> + Send + Sync + 'static,
{
    FromFn(f)
}

/// Adapts a synchronous closure into a [`Middleware`].
pub fn from_sync_fn<F>(f: F) -> FromSyncFn<F>
where
    F: Fn(&mut Context, &mut dyn Buffer) -> Outcome + Send + Sync + 'static,
{
    FromSyncFn(f)
}

/// Newtype bridging an async closure to the trait-object world.
pub struct FromFn<F>(F);

impl<F> Middleware for FromFn<F>
where
    F: for<'a> Fn(&'a mut Context, &'a mut dyn Buffer) -> BoxFuture<'a, Outcome> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context, buf: &'a mut dyn Buffer) -> BoxFuture<'a, Outcome> {
        (self.0)(ctx, buf)
    }
}

/// Newtype bridging a synchronous closure to the trait-object world.
pub struct FromSyncFn<F>(F);

impl<F> Middleware for FromSyncFn<F>
where
    F: Fn(&mut Context, &mut dyn Buffer) -> Outcome + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context, buf: &'a mut dyn Buffer) -> BoxFuture<'a, Outcome> {
        let outcome = (self.0)(ctx, buf);
        Box::pin(std::future::ready(outcome))
    }
}

// ── Entries ───────────────────────────────────────────────────────────────────

/// One slot of an application: a single middleware or a nested sequence.
///
/// A composite is compiled into its own chain each time it runs, so from the
/// outside it behaves like one middleware reporting a single outcome.
#[derive(Clone)]
pub enum Entry {
    Leaf(BoxedMiddleware),
    Composite(Arc<[Entry]>),
}

impl Entry {
    pub fn leaf(mw: impl Middleware) -> Self {
        Self::Leaf(Arc::new(mw))
    }

    pub fn composite(entries: impl IntoIterator<Item = Entry>) -> Self {
        Self::Composite(entries.into_iter().collect())
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf(_) => f.write_str("Leaf(..)"),
            Self::Composite(children) => f.debug_tuple("Composite").field(children).finish(),
        }
    }
}

/// Anything that can be installed into an [`Application`].
pub trait IntoEntry {
    fn into_entry(self) -> Entry;
}

impl<M: Middleware> IntoEntry for M {
    fn into_entry(self) -> Entry {
        Entry::leaf(self)
    }
}

impl IntoEntry for Application {
    fn into_entry(self) -> Entry {
        Entry::composite(self.into_entries())
    }
}

impl IntoEntry for Entry {
    fn into_entry(self) -> Entry {
        self
    }
}

/// Builds a `Vec<Entry>` from a mixed list of middleware and applications.
///
/// ```rust
/// use tsugi::{Application, entries, from_sync_fn};
///
/// let nested = Application::new();
/// let list = entries![from_sync_fn(|_, _| Ok(())), nested];
/// assert_eq!(list.len(), 2);
/// ```
#[macro_export]
macro_rules! entries {
    ($($entry:expr),* $(,)?) => {
        vec![$($crate::IntoEntry::into_entry($entry)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;

    #[tokio::test]
    async fn sync_closure_sees_context_and_buffer() {
        let mw = from_sync_fn(|ctx, buf| {
            ctx.insert("seen", true);
            buf.append("x".into());
            Ok(())
        });
        let mut ctx = Context::new();
        let mut canvas = Canvas::new();
        assert!(mw.call(&mut ctx, &mut canvas).await.is_ok());
        assert_eq!(ctx.get("seen"), Some(&serde_json::Value::Bool(true)));
        assert_eq!(canvas.html(), "x");
    }

    #[tokio::test]
    async fn errors_convert_into_halt() {
        let mw = from_fn(|_, _| {
            Box::pin(async move {
                let failed: Result<(), Error> = Err(Error::msg("boom"));
                failed?;
                Ok::<(), Halt>(())
            })
        });
        let mut ctx = Context::new();
        let mut canvas = Canvas::new();
        match mw.call(&mut ctx, &mut canvas).await {
            Err(Halt::Error(e)) => assert_eq!(e.to_string(), "boom"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn applications_become_composites() {
        let app = Application::new()
            .install(from_sync_fn(|_, _| Ok(())))
            .install(from_sync_fn(|_, _| Ok(())));
        match app.into_entry() {
            Entry::Composite(children) => assert_eq!(children.len(), 2),
            Entry::Leaf(_) => panic!("expected a composite entry"),
        }
    }
}
