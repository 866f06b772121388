//! Conversation store: the ordered chat log and its persistence mirror.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Synthetic greeting shown whenever the log starts out empty.
pub const GREETING: &str = "How can I help you?";

const HISTORY_FILE: &str = "chat_history.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
    Error,
}

/// One chat entry. Immutable once created; entries are only appended, or the
/// whole log cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub sender: Sender,
    pub text: String,
}

impl ChatEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Error,
            text: text.into(),
        }
    }
}

/// External persistence collaborator for the conversation log. Writes are
/// fire-and-forget; chat history is not safety-critical.
pub trait HistoryStore {
    fn read(&self) -> Option<String>;
    fn write(&mut self, value: &str);
    fn delete(&mut self);
}

/// History persisted as one JSON file under the user config directory.
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn open() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?
            .join("monchat");
        fs::create_dir_all(&dir)?;
        Ok(Self {
            path: dir.join(HISTORY_FILE),
        })
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl HistoryStore for FileHistoryStore {
    fn read(&self) -> Option<String> {
        fs::read_to_string(&self.path).ok()
    }

    fn write(&mut self, value: &str) {
        let _ = fs::write(&self.path, value);
    }

    fn delete(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Append-only conversation log mirrored to a [`HistoryStore`] after every
/// mutation. Insertion order is display order, oldest first.
pub struct Conversation {
    entries: Vec<ChatEntry>,
    store: Box<dyn HistoryStore>,
    pending_scroll: bool,
}

impl Conversation {
    /// Hydrate the log from the store. Malformed persisted data falls back
    /// silently to an empty log; an empty log gets the greeting seeded.
    pub fn initialize(store: Box<dyn HistoryStore>) -> Self {
        let entries = store
            .read()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        let mut log = Self {
            entries,
            store,
            pending_scroll: false,
        };
        log.seed_greeting();
        log
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append one entry, persist the log, and signal scroll-to-bottom.
    pub fn append(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
        self.pending_scroll = true;
        self.persist();
    }

    /// Empty the log and remove the persisted mirror.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.store.delete();
    }

    /// Append the greeting if the log is empty. A no-op once any entry
    /// exists, so the greeting never appears twice.
    pub fn seed_greeting(&mut self) {
        if self.entries.is_empty() {
            self.append(ChatEntry::bot(GREETING));
        }
    }

    /// Consume the scroll-to-bottom signal raised by the latest append.
    pub fn take_scroll_signal(&mut self) -> bool {
        std::mem::take(&mut self.pending_scroll)
    }

    fn persist(&mut self) {
        if let Ok(json) = serde_json::to_string(&self.entries) {
            self.store.write(&json);
        }
    }
}

/// In-memory store for tests; hands out linked snapshots so a test can watch
/// the mirror while the conversation owns the store.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemoryHistoryStore {
    value: std::rc::Rc<std::cell::RefCell<Option<String>>>,
}

#[cfg(test)]
impl MemoryHistoryStore {
    pub fn preloaded(raw: &str) -> Self {
        let store = Self::default();
        *store.value.borrow_mut() = Some(raw.to_string());
        store
    }

    pub fn snapshot(&self) -> Option<String> {
        self.value.borrow().clone()
    }
}

#[cfg(test)]
impl HistoryStore for MemoryHistoryStore {
    fn read(&self) -> Option<String> {
        self.value.borrow().clone()
    }

    fn write(&mut self, value: &str) {
        *self.value.borrow_mut() = Some(value.to_string());
    }

    fn delete(&mut self) {
        *self.value.borrow_mut() = None;
    }
}
