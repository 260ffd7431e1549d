//! The chain compiler.
//!
//! [`merge`] turns an ordered entry list into one [`Chain`], itself a
//! [`Middleware`]. Running a chain walks the entries strictly in order: an
//! entry starts only once the previous one has resolved. Composite entries
//! are compiled into a chain of their own when their turn comes, so nesting
//! is flattened depth first.
//!
//! Outcome handling at the chain boundary:
//!
//! - `Ok(())` from every entry → `Ok(())`
//! - `Halt::Skip` → stop, reported upward as `Ok(())`
//! - `Halt::End` or `Halt::Error` → stop, reported upward unchanged

use std::sync::Arc;

use tracing::trace;

use crate::buffer::Buffer;
use crate::context::Context;
use crate::middleware::{BoxFuture, Entry, Halt, Middleware, Outcome};

/// Compiles `entries` into a single middleware.
///
/// ```rust
/// use tsugi::{Application, from_sync_fn, merge, entries};
///
/// let both = merge(entries![
///     from_sync_fn(|ctx, _| { ctx.insert("a", 1); Ok(()) }),
///     from_sync_fn(|ctx, _| { ctx.insert("b", 2); Ok(()) }),
/// ]);
/// let app = Application::new().install(both);
/// # let _ = app;
/// ```
pub fn merge(entries: impl IntoIterator<Item = Entry>) -> Chain {
    Chain { entries: entries.into_iter().collect() }
}

/// A compiled sequence of entries.
#[derive(Clone, Debug)]
pub struct Chain {
    entries: Arc<[Entry]>,
}

impl Chain {
    pub(crate) fn from_shared(entries: Arc<[Entry]>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn run(&self, ctx: &mut Context, buf: &mut dyn Buffer) -> Outcome {
        for (index, entry) in self.entries.iter().enumerate() {
            trace!(index, "entering middleware");
            let outcome = match entry {
                Entry::Leaf(mw) => mw.call(ctx, buf).await,
                Entry::Composite(children) => {
                    Chain::from_shared(Arc::clone(children)).call(ctx, buf).await
                }
            };
            match outcome {
                Ok(()) => {}
                Err(Halt::Skip) => {
                    trace!(index, "skip absorbed at chain boundary");
                    return Ok(());
                }
                Err(halt) => return Err(halt),
            }
        }
        Ok(())
    }
}

impl Middleware for Chain {
    fn call<'a>(&'a self, ctx: &'a mut Context, buf: &'a mut dyn Buffer) -> BoxFuture<'a, Outcome> {
        Box::pin(self.run(ctx, buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::entries;
    use crate::error::Error;
    use crate::middleware::from_sync_fn;

    fn mark(tag: &'static str) -> Entry {
        Entry::leaf(from_sync_fn(move |_, buf| {
            buf.append(tag.into());
            Ok(())
        }))
    }

    fn signal(make: fn() -> Halt) -> Entry {
        Entry::leaf(from_sync_fn(move |_, _| Err(make())))
    }

    async fn run(chain: &Chain) -> (Outcome, String) {
        let mut ctx = Context::new();
        let mut canvas = Canvas::new();
        let outcome = chain.call(&mut ctx, &mut canvas).await;
        (outcome, canvas.html())
    }

    #[tokio::test]
    async fn runs_in_insertion_order() {
        let (outcome, html) = run(&merge([mark("a"), mark("b"), mark("c")])).await;
        assert!(outcome.is_ok());
        assert_eq!(html, "abc");
    }

    #[tokio::test]
    async fn empty_chain_completes() {
        let (outcome, html) = run(&merge(entries![])).await;
        assert!(outcome.is_ok());
        assert_eq!(html, "");
    }

    #[tokio::test]
    async fn skip_is_absorbed_by_its_own_chain() {
        let inner = Entry::composite([mark("a"), signal(|| Halt::Skip), mark("x")]);
        let (outcome, html) = run(&merge([inner, mark("b")])).await;
        assert!(outcome.is_ok());
        assert_eq!(html, "ab");
    }

    #[tokio::test]
    async fn end_escapes_every_enclosing_chain() {
        let inner = Entry::composite([mark("a"), signal(|| Halt::End), mark("x")]);
        let outer = Entry::composite([inner, mark("y")]);
        let (outcome, html) = run(&merge([outer, mark("z")])).await;
        assert!(matches!(outcome, Err(Halt::End)));
        assert_eq!(html, "a");
    }

    #[tokio::test]
    async fn errors_propagate_unchanged() {
        let fail = Entry::leaf(from_sync_fn(|_, _| Err(Error::msg("third").into())));
        let inner = Entry::composite([mark("1"), mark("2"), fail, mark("4")]);
        let (outcome, html) = run(&merge([inner, mark("5")])).await;
        match outcome {
            Err(Halt::Error(e)) => assert_eq!(e.to_string(), "third"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(html, "12");
    }

    #[tokio::test]
    async fn chains_are_reusable() {
        let chain = merge([mark("a")]);
        assert_eq!(run(&chain).await.1, "a");
        assert_eq!(run(&chain).await.1, "a");
        assert_eq!(chain.len(), 1);
    }
}
