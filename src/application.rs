//! The application: an append-only list of entries plus composition operators.

use tracing::debug;

use crate::buffer::Buffer;
use crate::canvas::Canvas;
use crate::chain::merge;
use crate::context::Context;
use crate::error::Error;
use crate::location::location;
use crate::middleware::{BoxFuture, Entry, Halt, IntoEntry, Middleware, Outcome};
use crate::router::PathMatcher;

/// An ordered sequence of middleware and nested applications.
///
/// Entries run in insertion order. Each composition method returns `self`
/// so registrations chain naturally; nothing is ever reordered or removed.
///
/// ```rust
/// use tsugi::{Application, Buffer, entries, from_sync_fn};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let app = Application::new()
///     .install(from_sync_fn(|ctx, buf| {
///         let text = if ctx.get_str("ok").is_some() { "OK" } else { "NG" };
///         buf.append(text.into());
///         Ok(())
///     }));
///
/// let done = app.run().await;
/// assert!(done.result.is_ok());
/// assert_eq!(done.canvas.html(), "NG");
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Application {
    entries: Vec<Entry>,
    mounts: usize,
}

impl Application {
    pub fn new() -> Self {
        Self { entries: Vec::new(), mounts: 0 }
    }

    /// Number of installed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of `mount` groups installed so far.
    pub fn mounts(&self) -> usize {
        self.mounts
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub(crate) fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    /// Appends a middleware or a nested application. Returns `self` for chaining.
    pub fn install(mut self, entry: impl IntoEntry) -> Self {
        self.entries.push(entry.into_entry());
        self
    }

    /// Appends several entries at once, in order. See [`entries!`](crate::entries).
    pub fn install_all(mut self, entries: impl IntoIterator<Item = Entry>) -> Self {
        self.entries.extend(entries);
        self
    }

    /// Installs `body` behind a condition.
    ///
    /// When `condition` holds, `body` runs and then the **whole** pipeline
    /// ends: entries installed after this call do not run. When it does not
    /// hold, `body` is skipped and the pipeline carries on. A condition that
    /// returns an error aborts the run with it.
    ///
    /// `condition` may return `bool`, `Option<bool>` (`None` counts as false)
    /// or `Result<bool, Error>`.
    ///
    /// ```rust
    /// use tsugi::{Application, entries, from_sync_fn};
    ///
    /// let app = Application::new()
    ///     .install_if(|ctx| ctx.contains_key("admin"), entries![
    ///         from_sync_fn(|_, buf| { buf.append("dashboard".into()); Ok(()) }),
    ///     ])
    ///     .install(from_sync_fn(|_, buf| { buf.append("login".into()); Ok(()) }));
    /// # let _ = app;
    /// ```
    pub fn install_if<C, V>(self, condition: C, body: Vec<Entry>) -> Self
    where
        C: Fn(&Context) -> V + Send + Sync + 'static,
        V: IntoVerdict,
    {
        self.guarded(Guard::new(move |ctx| condition(&*ctx).into_verdict()), body)
    }

    /// Installs `body` for pathnames matched by `path`.
    ///
    /// The first mount also installs the [`location`] accessor right before
    /// its group, so the pathname is available to every matcher. Since a
    /// satisfied group ends the pipeline, the first matching mount wins.
    ///
    /// ```rust
    /// use regex::Regex;
    /// use tsugi::{Application, PathMatcher, entries, from_sync_fn};
    ///
    /// let page = |name: &'static str| from_sync_fn(move |_, buf| { buf.append(name.into()); Ok(()) });
    ///
    /// let app = Application::new()
    ///     .mount("/about/", entries![page("about")])
    ///     .mount(Regex::new(r"^/contact/").unwrap(), entries![page("contact")])
    ///     .mount(PathMatcher::route("/users/{id}").unwrap(), entries![page("user")]);
    /// assert_eq!(app.mounts(), 3);
    /// ```
    pub fn mount(mut self, path: impl Into<PathMatcher>, body: Vec<Entry>) -> Self {
        if self.mounts == 0 {
            self = self.install(location(None));
        }
        self.mounts += 1;
        let matcher = path.into();
        self.guarded(Guard::new(move |ctx| Ok(matcher.test(ctx).unwrap_or(false))), body)
    }

    fn guarded(self, guard: Guard, body: Vec<Entry>) -> Self {
        let mut group = Vec::with_capacity(body.len() + 2);
        group.push(Entry::leaf(guard));
        group.extend(body);
        group.push(Entry::leaf(Terminate));
        self.install(Entry::composite(group))
    }

    /// Compiles the current entries and runs them once.
    ///
    /// `END` and `SKIP` are reported as success; only application errors
    /// come back as `Err`. Both `ctx` and `buf` stay with the caller.
    pub async fn start(&self, ctx: &mut Context, buf: &mut dyn Buffer) -> Result<(), Error> {
        let chain = merge(self.entries.iter().cloned());
        debug!(entries = chain.len(), "application started");
        match chain.call(ctx, buf).await {
            Ok(()) => {
                debug!("application finished");
                Ok(())
            }
            Err(Halt::End) | Err(Halt::Skip) => {
                debug!("application ended by signal");
                Ok(())
            }
            Err(Halt::Error(e)) => {
                debug!(error = %e, "application aborted");
                Err(e)
            }
        }
    }

    /// Runs with a fresh context and a fresh [`Canvas`].
    pub async fn run(&self) -> Completion {
        self.run_with(Context::new()).await
    }

    /// Runs with the given context and a fresh [`Canvas`].
    pub async fn run_with(&self, mut context: Context) -> Completion {
        let mut canvas = Canvas::new();
        let result = self.start(&mut context, &mut canvas).await;
        Completion { context, canvas, result }
    }
}

/// What [`Application::run`] hands back once the run is over.
#[derive(Debug)]
pub struct Completion {
    pub context: Context,
    pub canvas: Canvas,
    pub result: Result<(), Error>,
}

// ── Conditions ────────────────────────────────────────────────────────────────

/// A condition result: proceed, skip, or fail.
pub trait IntoVerdict {
    fn into_verdict(self) -> Result<bool, Error>;
}

impl IntoVerdict for bool {
    fn into_verdict(self) -> Result<bool, Error> {
        Ok(self)
    }
}

impl IntoVerdict for Option<bool> {
    fn into_verdict(self) -> Result<bool, Error> {
        Ok(self.unwrap_or(false))
    }
}

impl IntoVerdict for Result<bool, Error> {
    fn into_verdict(self) -> Result<bool, Error> {
        self
    }
}

type Predicate = Box<dyn Fn(&mut Context) -> Result<bool, Error> + Send + Sync>;

/// First entry of a conditional group.
struct Guard(Predicate);

impl Guard {
    fn new(predicate: impl Fn(&mut Context) -> Result<bool, Error> + Send + Sync + 'static) -> Self {
        Self(Box::new(predicate))
    }
}

impl Middleware for Guard {
    fn call<'a>(&'a self, ctx: &'a mut Context, _buf: &'a mut dyn Buffer) -> BoxFuture<'a, Outcome> {
        let outcome = match (self.0)(ctx) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Halt::Skip),
            Err(e) => Err(Halt::Error(e)),
        };
        Box::pin(std::future::ready(outcome))
    }
}

/// Last entry of a conditional group.
struct Terminate;

impl Middleware for Terminate {
    fn call<'a>(&'a self, _ctx: &'a mut Context, _buf: &'a mut dyn Buffer) -> BoxFuture<'a, Outcome> {
        Box::pin(std::future::ready(Err(Halt::End)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Location;
    use crate::entries;
    use crate::middleware::from_sync_fn;

    fn mark(tag: &'static str) -> impl Middleware {
        from_sync_fn(move |_, buf| {
            buf.append(tag.into());
            Ok(())
        })
    }

    #[test]
    fn install_keeps_counts() {
        let app = Application::new().install(mark("a")).install_all(entries![mark("b"), mark("c")]);
        assert_eq!(app.len(), 3);
        assert_eq!(app.mounts(), 0);
    }

    #[test]
    fn first_mount_adds_location_accessor_once() {
        let app = Application::new()
            .mount("/a", entries![mark("a")])
            .mount("/b", entries![mark("b")]);
        // location accessor + two groups
        assert_eq!(app.len(), 3);
        assert_eq!(app.mounts(), 2);
    }

    #[tokio::test]
    async fn empty_application_leaves_canvas_untouched() {
        let done = Application::new().run().await;
        assert!(done.result.is_ok());
        assert!(done.canvas.is_empty());
    }

    #[tokio::test]
    async fn satisfied_condition_ends_the_pipeline() {
        let app = Application::new()
            .install_if(|_| true, entries![mark("A"), mark("B")])
            .install(mark("C"));
        let done = app.run().await;
        assert!(done.result.is_ok());
        assert_eq!(done.canvas.html(), "AB");
    }

    #[tokio::test]
    async fn unsatisfied_condition_skips_its_body() {
        let app = Application::new()
            .install_if(|_| false, entries![mark("A"), mark("B")])
            .install(mark("C"));
        assert_eq!(app.run().await.canvas.html(), "C");
    }

    #[tokio::test]
    async fn undecided_condition_counts_as_false() {
        let app = Application::new()
            .install_if(|ctx| ctx.get("flag").and_then(|v| v.as_bool()), entries![mark("A")])
            .install(mark("C"));
        assert_eq!(app.run().await.canvas.html(), "C");
    }

    #[tokio::test]
    async fn failing_condition_aborts() {
        let app = Application::new()
            .install_if(|_| Err::<bool, _>(Error::msg("no session")), entries![mark("A")])
            .install(mark("C"));
        let done = app.run().await;
        assert_eq!(done.result.unwrap_err().to_string(), "no session");
        assert_eq!(done.canvas.html(), "");
    }

    #[tokio::test]
    async fn skip_inside_body_resumes_outer_pipeline() {
        let app = Application::new()
            .install_if(|_| true, entries![mark("A"), from_sync_fn(|_, _| Err(Halt::Skip)), mark("B")])
            .install(mark("C"));
        assert_eq!(app.run().await.canvas.html(), "AC");
    }

    #[tokio::test]
    async fn nested_application_runs_inline() {
        let sub = Application::new().install(mark("b")).install(mark("c"));
        let app = Application::new().install(mark("a")).install(sub).install(mark("d"));
        assert_eq!(app.run().await.canvas.html(), "abcd");
    }

    #[tokio::test]
    async fn first_matching_mount_wins() {
        let app = Application::new()
            .mount("/foo/", entries![mark("A")])
            .mount("/", entries![mark("B")]);

        let ctx = Context::new().with_location(Location::with_pathname("/foo/x"));
        assert_eq!(app.run_with(ctx).await.canvas.html(), "A");

        let ctx = Context::new().with_location(Location::with_pathname("/bar"));
        assert_eq!(app.run_with(ctx).await.canvas.html(), "B");
    }

    #[tokio::test]
    async fn mount_without_pathname_falls_through() {
        let app = Application::new()
            .mount("/", entries![mark("A")])
            .install(mark("fallback"));
        assert_eq!(app.run().await.canvas.html(), "fallback");
    }

    #[tokio::test]
    async fn empty_pathname_never_mounts() {
        let app = Application::new()
            .mount("", entries![mark("mounted")])
            .install(mark("fallback"));
        let ctx = Context::new().with_location(Location::with_pathname(""));
        assert_eq!(app.run_with(ctx).await.canvas.html(), "fallback");
    }

    #[tokio::test]
    async fn mount_reads_host_location() {
        let app = Application::new().mount("/docs/", entries![mark("docs")]);
        let ctx = Context::new().with_host(|| Some(Location::parse("/docs/intro?v=2")));
        assert_eq!(app.run_with(ctx).await.canvas.html(), "docs");
    }

    #[tokio::test]
    async fn start_uses_caller_buffer() {
        let app = Application::new().install(mark("x"));
        let mut ctx = Context::new();
        let mut canvas = Canvas::new();
        canvas.append("pre-".into());
        app.start(&mut ctx, &mut canvas).await.unwrap();
        assert_eq!(canvas.html(), "pre-x");
    }
}
