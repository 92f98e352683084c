use std::{
    rc::Rc,
    sync::atomic::{AtomicUsize, Ordering},
};

static NEXT_SHEET: AtomicUsize = AtomicUsize::new(0);

/// A constructed stylesheet that can be adopted by any number of shadow roots or documents.
///
/// Clones share identity: two sheets compare equal only if one was cloned from the other.
#[derive(Clone, Debug)]
pub struct StyleSheet {
    id: usize,
    text: Rc<str>,
}

impl StyleSheet {
    pub fn new(text: impl Into<Rc<str>>) -> Self {
        Self {
            id: NEXT_SHEET.fetch_add(1, Ordering::Relaxed),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl PartialEq for StyleSheet {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for StyleSheet {}
