//! Cursor over the drill items of one module.

use crate::types::{DialogItem, ModuleContent};

/// Walks a module's items in order.
///
/// The cursor only moves through the explicit operations below and always
/// stays within `[0, total_questions()]`. Nothing here is persisted; a new
/// session is built every time a module is opened.
#[derive(Debug, Clone)]
pub struct DialogSession {
    content: ModuleContent,
    cursor: usize,
}

impl DialogSession {
    pub fn new(content: ModuleContent) -> Self {
        Self { content, cursor: 0 }
    }

    pub fn module_id(&self) -> &str {
        &self.content.module_id
    }

    pub fn content(&self) -> &ModuleContent {
        &self.content
    }

    /// Return the item at the cursor and step past it, or `None` at the end.
    pub fn get_next(&mut self) -> Option<&DialogItem> {
        if self.cursor < self.content.len() {
            let item = &self.content.items[self.cursor];
            self.cursor += 1;
            Some(item)
        } else {
            None
        }
    }

    /// Move the cursor to `n`, clamped to the module length.
    pub fn skip_to_question(&mut self, n: usize) {
        self.cursor = n.min(self.content.len());
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Items consumed so far. After a `get_next` this is the 1-based number
    /// of the item just returned.
    pub fn current_question_number(&self) -> usize {
        self.cursor
    }

    pub fn total_questions(&self) -> usize {
        self.content.len()
    }

    pub fn remaining(&self) -> usize {
        self.content.len() - self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.content.len()
    }
}
