use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use arboard::Clipboard;
use shared::domain::ThemeMode;
use tracing::{debug, warn};

use crate::reactive::Sink;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps every value it is fed. Clones share the same history.
#[derive(Debug)]
pub struct RecordingSink<T> {
    values: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for RecordingSink<T> {
    fn clone(&self) -> Self {
        Self {
            values: Arc::clone(&self.values),
        }
    }
}

impl<T> Default for RecordingSink<T> {
    fn default() -> Self {
        Self {
            values: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> RecordingSink<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<T> {
        lock(&self.values).clone()
    }

    pub fn last(&self) -> Option<T> {
        lock(&self.values).last().cloned()
    }
}

impl<T: Clone + Send> Sink<T> for RecordingSink<T> {
    fn sync(&mut self, value: &T) {
        lock(&self.values).push(value.clone());
    }
}

/// Process-local clipboard. Empty text never overwrites it.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        lock(&self.contents).clone()
    }
}

impl Sink<String> for MemoryClipboard {
    fn sync(&mut self, value: &String) {
        if value.is_empty() {
            return;
        }
        *lock(&self.contents) = Some(value.clone());
    }
}

/// Writes text to the system clipboard. Failures are logged and dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl Sink<String> for SystemClipboard {
    fn sync(&mut self, value: &String) {
        if value.is_empty() {
            return;
        }
        let result = Clipboard::new().and_then(|mut clipboard| clipboard.set_text(value.clone()));
        match result {
            Ok(()) => debug!(chars = value.chars().count(), "clipboard: text copied"),
            Err(err) => warn!("clipboard: copy failed: {err}"),
        }
    }
}

/// Class list of a document's root element.
///
/// Syncing a [`ThemeMode`] removes both theme classes and adds the current one,
/// leaving every other class alone.
#[derive(Debug, Clone, Default)]
pub struct DocumentClassList {
    classes: Arc<Mutex<BTreeSet<String>>>,
}

impl DocumentClassList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, class: &str) {
        lock(&self.classes).insert(class.to_string());
    }

    pub fn remove(&self, class: &str) {
        lock(&self.classes).remove(class);
    }

    pub fn contains(&self, class: &str) -> bool {
        lock(&self.classes).contains(class)
    }

    pub fn classes(&self) -> Vec<String> {
        lock(&self.classes).iter().cloned().collect()
    }
}

impl Sink<ThemeMode> for DocumentClassList {
    fn sync(&mut self, value: &ThemeMode) {
        let mut classes = lock(&self.classes);
        for mode in ThemeMode::ALL {
            classes.remove(mode.as_str());
        }
        classes.insert(value.as_str().to_string());
    }
}
