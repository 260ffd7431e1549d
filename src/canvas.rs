//! The reference in-memory buffer.
//!
//! You should not need to think about this type much. Append to it in your
//! middleware, read [`Canvas::html`] once the run has finished.

use std::fmt;

use crate::buffer::{Buffer, Item};

/// An ordered list of renderable items.
///
/// Used by [`Application::run`](crate::Application::run) when the host does
/// not provide a buffer of its own.
///
/// ```rust
/// use tsugi::{Buffer, Canvas};
///
/// let mut canvas = Canvas::new();
/// canvas.append("FOO".into());
/// canvas.append("BAR".into());
/// assert_eq!(canvas.html(), "FOOBAR");
///
/// canvas.empty();
/// assert_eq!(canvas.html(), "");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Canvas {
    items: Vec<Item>,
}

impl Canvas {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The items appended so far, in order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Buffer for Canvas {
    fn empty(&mut self) {
        self.items.clear();
    }

    fn append(&mut self, item: Item) {
        self.items.push(item);
    }

    fn html(&self) -> String {
        self.items.iter().map(Item::render).collect()
    }
}

impl fmt::Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            f.write_str(&item.render())?;
        }
        Ok(())
    }
}
