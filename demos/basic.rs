//! Minimal tsugi example: a tiny client-side page router.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic -- /users/42?tab=posts
//!
//! Try:
//!   cargo run --example basic -- /
//!   cargo run --example basic -- /about/
//!   cargo run --example basic -- '/search#!?q=rust+async'

use tsugi::{
    Application, Buffer, Context, Halt, Location, ParseHash, ParseQuery, PathMatcher, entries,
    from_fn, from_sync_fn,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let href = std::env::args().nth(1).unwrap_or_else(|| "/".to_owned());

    let app = Application::new()
        .install(ParseQuery::new())
        .install(ParseHash::new().root("hash"))
        .install(layout())
        .mount(PathMatcher::route("/users/{id}").expect("valid route"), entries![user()])
        .mount("/about/", entries![about()])
        .mount("/search", entries![search()])
        .mount("/", entries![home()]);

    // The host owns the location; here it is the first CLI argument.
    let ctx = Context::new().with_host(move || Some(Location::parse(&href)));

    let done = app.run_with(ctx).await;
    match done.result {
        Ok(()) => println!("{}", done.canvas.html()),
        Err(e) => eprintln!("error: {e}"),
    }
}

// Shared header, then continue into the routes.
fn layout() -> impl tsugi::Middleware {
    from_sync_fn(|_, buf| {
        buf.append("<header>tsugi</header>".into());
        Ok(())
    })
}

// /users/{id}
//
// An async middleware: the boxed future borrows the context and the buffer.
fn user() -> impl tsugi::Middleware {
    from_fn(|ctx, buf| {
        Box::pin(async move {
            let id = ctx.param("id").unwrap_or("unknown").to_owned();
            let tab = ctx.get_str("tab").unwrap_or("profile").to_owned();
            buf.append(format!("<main>user {id}, {tab}</main>").into());
            Ok(())
        })
    })
}

fn about() -> impl tsugi::Middleware {
    from_sync_fn(|_, buf| {
        buf.append("<main>about</main>".into());
        Ok(())
    })
}

// /search#!?q=...
fn search() -> impl tsugi::Middleware {
    from_sync_fn(|ctx, buf| {
        let Some(q) = ctx.get("hash").and_then(|h| h["q"].as_str()) else {
            return Err(Halt::Error("missing query".into()));
        };
        let html = format!("<main>results for {q}</main>");
        buf.append(html.into());
        Ok(())
    })
}

fn home() -> impl tsugi::Middleware {
    from_sync_fn(|_, buf| {
        buf.append("<main>home</main>".into());
        Ok(())
    })
}
