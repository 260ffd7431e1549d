//! The abstract output buffer.
//!
//! Middleware never see a concrete buffer type, only `&mut dyn Buffer`. The
//! in-memory [`Canvas`](crate::Canvas) is the default; any host object with
//! the same four operations (a DOM wrapper, a terminal pane, a test spy) can
//! be handed to [`Application::start`](crate::Application::start) instead.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A renderable node that knows its own outer markup.
pub trait Markup: Send + Sync {
    fn outer_html(&self) -> String;
}

/// One opaque item held by a buffer.
#[derive(Clone)]
pub enum Item {
    /// Used as-is when serialized.
    Text(String),
    /// Rendered through [`Markup::outer_html`].
    Node(Arc<dyn Markup>),
}

impl Item {
    pub fn node(markup: impl Markup + 'static) -> Self {
        Self::Node(Arc::new(markup))
    }

    /// The serialized form of this item.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Node(node) => Cow::Owned(node.outer_html()),
        }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Node(node) => f.debug_tuple("Node").field(&node.outer_html()).finish(),
        }
    }
}

impl From<&str> for Item {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Item {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Arc<dyn Markup>> for Item {
    fn from(node: Arc<dyn Markup>) -> Self {
        Self::Node(node)
    }
}

/// The response contract every buffer satisfies.
pub trait Buffer: Send {
    /// Always 1: a buffer presents itself as a single-element, array-like
    /// container.
    fn length(&self) -> usize {
        1
    }

    /// Flushes every item.
    fn empty(&mut self);

    /// Pushes one item at the end.
    fn append(&mut self, item: Item);

    /// Serializes every item in order, with no separator.
    fn html(&self) -> String;

    /// Replaces the whole content with a single item.
    fn set_html(&mut self, item: Item) {
        self.empty();
        self.append(item);
    }

    /// Pushes several items, preserving their order.
    fn append_all(&mut self, items: Vec<Item>) {
        for item in items {
            self.append(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tag(&'static str);

    impl Markup for Tag {
        fn outer_html(&self) -> String {
            format!("<{0}></{0}>", self.0)
        }
    }

    /// A host buffer that only keeps the latest serialized string.
    #[derive(Default)]
    struct Flat(String);

    impl Buffer for Flat {
        fn empty(&mut self) {
            self.0.clear();
        }

        fn append(&mut self, item: Item) {
            self.0.push_str(&item.render());
        }

        fn html(&self) -> String {
            self.0.clone()
        }
    }

    #[test]
    fn nodes_render_their_outer_markup() {
        assert_eq!(Item::node(Tag("p")).render(), "<p></p>");
        assert_eq!(Item::from("plain").render(), "plain");
    }

    #[test]
    fn default_operations_work_on_host_buffers() {
        let mut flat = Flat::default();
        let buf: &mut dyn Buffer = &mut flat;
        buf.append_all(vec!["FOO".into(), Item::node(Tag("hr"))]);
        assert_eq!(buf.html(), "FOO<hr></hr>");
        buf.set_html("BAR".into());
        assert_eq!(buf.html(), "BAR");
        assert_eq!(buf.length(), 1);
    }
}
