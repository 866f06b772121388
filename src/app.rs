//! Application state: the conversation log, the pending input, the single
//! in-flight request, and the transient presentation state around them.

use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::task::JoinHandle;

use crate::client::AssistantClient;
use crate::config::Config;
use crate::render::{render_message, DisplaySegment};
use crate::store::{ChatEntry, Conversation, FileHistoryStore, HistoryStore};

/// Fixed user-facing text for any failed submission. Transport details never
/// reach the log.
pub const ERROR_REPLY: &str = "Something went wrong. Please try again.";

/// How long the copy label reads "Copied" before reverting.
const COPY_LABEL_REVERT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyLabel {
    Copy,
    Copied,
}

impl CopyLabel {
    pub fn text(self) -> &'static str {
        match self {
            CopyLabel::Copy => "copy",
            CopyLabel::Copied => "Copied",
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub log: Conversation,
    pub client: AssistantClient,

    // Pending input
    pub input: String,
    pub input_cursor: usize, // char index, not byte index

    // In-flight request; Some(..) from submission until completion. The sole
    // mutual-exclusion mechanism: no second submission while this is set.
    pub ask_task: Option<JoinHandle<Result<String>>>,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Chat scroll state (updated during render for wrap-aware follow)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub total_chat_lines: u16,
    pub follow_bottom: bool,

    // Code block copy affordance
    pub selected_block: Option<usize>,
    pub copy_label: CopyLabel,
    copy_reverts_at: Option<Instant>,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let store = FileHistoryStore::open()?;
        Ok(Self::with_store(
            AssistantClient::new(config.endpoint_url()),
            Box::new(store),
        ))
    }

    pub fn with_store(client: AssistantClient, store: Box<dyn HistoryStore>) -> Self {
        Self {
            should_quit: false,
            log: Conversation::initialize(store),
            client,
            input: String::new(),
            input_cursor: 0,
            ask_task: None,
            animation_frame: 0,
            chat_scroll: 0,
            chat_height: 0,
            total_chat_lines: 0,
            follow_bottom: true,
            selected_block: None,
            copy_label: CopyLabel::Copy,
            copy_reverts_at: None,
        }
    }

    pub fn is_generating(&self) -> bool {
        self.ask_task.is_some()
    }

    /// Begin a submission. Rejects (returning `None`) while a request is in
    /// flight or when the input is blank; otherwise appends the user entry,
    /// clears the input, and hands back the message for the caller to send.
    pub fn submit(&mut self) -> Option<String> {
        if self.ask_task.is_some() || self.input.trim().is_empty() {
            return None;
        }
        let message = std::mem::take(&mut self.input);
        self.input_cursor = 0;
        self.log.append(ChatEntry::user(message.clone()));
        Some(message)
    }

    /// Finish a submission: exactly one Bot or Error entry, and the in-flight
    /// flag cleared, whatever the outcome.
    pub fn complete(&mut self, result: Result<String>) {
        self.ask_task = None;
        match result {
            Ok(answer) => self.log.append(ChatEntry::bot(answer)),
            Err(_) => self.log.append(ChatEntry::error(ERROR_REPLY)),
        }
    }

    /// Reap the in-flight task once it has finished. Called on every loop
    /// iteration; a panicked task counts as a transport failure.
    pub async fn poll_response(&mut self) {
        let finished = self
            .ask_task
            .as_ref()
            .map_or(false, JoinHandle::is_finished);
        if !finished {
            return;
        }
        if let Some(task) = self.ask_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(join_error) => Err(anyhow::anyhow!(join_error)),
            };
            self.complete(result);
        }
    }

    /// Clear the chat. Disabled while a reply is generating; afterwards the
    /// log is re-seeded with the greeting, like a fresh start.
    pub fn clear_chat(&mut self) {
        if self.ask_task.is_some() {
            return;
        }
        self.log.clear();
        self.log.seed_greeting();
        self.selected_block = None;
        self.chat_scroll = 0;
        self.follow_bottom = true;
    }

    /// Advance animation and timers; driven by the tick event.
    pub fn tick(&mut self) {
        if self.ask_task.is_some() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if let Some(deadline) = self.copy_reverts_at {
            if Instant::now() >= deadline {
                self.copy_label = CopyLabel::Copy;
                self.copy_reverts_at = None;
            }
        }
    }

    /// Code payloads of every code block in the log, in display order.
    pub fn code_blocks(&self) -> Vec<String> {
        let mut blocks = Vec::new();
        for entry in self.log.entries() {
            for segment in render_message(&entry.text) {
                if let DisplaySegment::CodeBlock { code, .. } = segment {
                    blocks.push(code);
                }
            }
        }
        blocks
    }

    pub fn select_next_block(&mut self) {
        let count = self.code_blocks().len();
        if count == 0 {
            self.selected_block = None;
            return;
        }
        self.selected_block = Some(match self.selected_block {
            Some(i) => (i + 1) % count,
            None => 0,
        });
    }

    pub fn select_prev_block(&mut self) {
        let count = self.code_blocks().len();
        if count == 0 {
            self.selected_block = None;
            return;
        }
        self.selected_block = Some(match self.selected_block {
            Some(i) => (i + count - 1) % count,
            None => count - 1,
        });
    }

    pub fn selected_block_code(&self) -> Option<String> {
        let idx = self.selected_block?;
        self.code_blocks().into_iter().nth(idx)
    }

    /// Flip the copy label to "Copied" for one second.
    pub fn mark_copied(&mut self) {
        self.copy_label = CopyLabel::Copied;
        self.copy_reverts_at = Some(Instant::now() + COPY_LABEL_REVERT);
    }

    // Manual scrolling disengages follow-to-bottom; scrolling back to the
    // end re-engages it.
    pub fn scroll_up(&mut self) {
        self.follow_bottom = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max = self.max_chat_scroll();
        self.chat_scroll = (self.chat_scroll + 1).min(max);
        if self.chat_scroll >= max {
            self.follow_bottom = true;
        }
    }

    pub fn max_chat_scroll(&self) -> u16 {
        self.total_chat_lines.saturating_sub(self.chat_height)
    }
}
