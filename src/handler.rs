use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.should_quit = true,
            // Clear chat (disabled while generating)
            KeyCode::Char('l') => app.clear_chat(),
            // Copy the selected code block
            KeyCode::Char('y') => copy_selected_block(app),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,

        // Shift+Enter inserts a newline; plain Enter submits. Some terminals
        // report shifted Enter as Alt+Enter, accept both.
        KeyCode::Enter
            if key.modifiers.contains(KeyModifiers::SHIFT)
                || key.modifiers.contains(KeyModifiers::ALT) =>
        {
            insert_char(app, '\n');
        }
        KeyCode::Enter => submit(app),

        // Input editing
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }

        // History scrolling
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::PageUp => {
            for _ in 0..10 {
                app.scroll_up();
            }
        }
        KeyCode::PageDown => {
            for _ in 0..10 {
                app.scroll_down();
            }
        }

        // Code block selection for the copy action
        KeyCode::Tab => app.select_next_block(),
        KeyCode::BackTab => app.select_prev_block(),

        KeyCode::Char(c) => insert_char(app, c),
        _ => {}
    }
}

fn insert_char(app: &mut App, c: char) {
    let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
    app.input.insert(byte_pos, c);
    app.input_cursor += 1;
}

/// Kick off one outbound request for a submission the controller accepted.
fn submit(app: &mut App) {
    if let Some(message) = app.submit() {
        let client = app.client.clone();
        app.ask_task = Some(tokio::spawn(async move { client.ask(&message).await }));
    }
}

fn copy_selected_block(app: &mut App) {
    if let Some(code) = app.selected_block_code() {
        copy_to_clipboard(&code);
        app.mark_copied();
    }
}

fn copy_to_clipboard(text: &str) {
    // Try the common clipboard commands in turn; quietly give up if none
    // works. A command can spawn fine and still exit non-zero (e.g. xclip
    // without a display), so keep going until one succeeds.
    for cmd in [
        &["pbcopy"][..],
        &["wl-copy"][..],
        &["xclip", "-selection", "clipboard"][..],
    ] {
        if pipe_to_command(cmd, text) {
            return;
        }
    }
}

/// Spawn `cmd`, write `text` to its stdin, and wait for it to exit. True
/// only if the whole write landed and the command exited zero.
fn pipe_to_command(cmd: &[&str], text: &str) -> bool {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let Ok(mut child) = Command::new(cmd[0])
        .args(&cmd[1..])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    else {
        return false;
    };
    let wrote = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(text.as_bytes()).is_ok(),
        None => false,
    };
    // stdin is closed at this point, so the command sees EOF and exits.
    match child.wait() {
        Ok(status) => wrote && status.success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AssistantClient;
    use crate::store::MemoryHistoryStore;

    fn test_app() -> App {
        App::with_store(
            AssistantClient::new("http://localhost:1"),
            Box::new(MemoryHistoryStore::default()),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn typing_inserts_at_cursor() {
        let mut app = test_app();
        for c in "hello".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Left));
        handle_key(&mut app, key(KeyCode::Left));
        handle_key(&mut app, key(KeyCode::Char('!')));
        assert_eq!(app.input, "hel!lo");
        assert_eq!(app.input_cursor, 4);
    }

    #[tokio::test]
    async fn backspace_is_utf8_safe() {
        let mut app = test_app();
        for c in "héllo".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Home));
        handle_key(&mut app, key(KeyCode::Right));
        handle_key(&mut app, key(KeyCode::Right));
        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.input, "hllo");
        assert_eq!(app.input_cursor, 1);
    }

    #[tokio::test]
    async fn shifted_enter_inserts_newline_instead_of_submitting() {
        let mut app = test_app();
        handle_key(&mut app, key(KeyCode::Char('a')));
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT),
        );
        handle_key(&mut app, key(KeyCode::Char('b')));
        assert_eq!(app.input, "a\nb");
        assert!(!app.is_generating());
    }

    #[tokio::test]
    async fn enter_on_blank_input_does_nothing() {
        let mut app = test_app();
        app.input = "  ".to_string();
        app.input_cursor = 2;
        handle_key(&mut app, key(KeyCode::Enter));
        assert!(!app.is_generating());
        assert_eq!(app.log.entries().len(), 1); // greeting only
    }

    #[tokio::test]
    async fn enter_submits_and_sets_in_flight() {
        let mut app = test_app();
        app.input = "hi".to_string();
        app.input_cursor = 2;
        handle_key(&mut app, key(KeyCode::Enter));
        assert!(app.is_generating());
        assert_eq!(app.log.entries().len(), 2);
        if let Some(task) = app.ask_task.take() {
            task.abort();
        }
    }

    #[test]
    fn pipe_to_command_reports_exit_status() {
        assert!(pipe_to_command(&["cat"], "hello"));
        // spawn failure
        assert!(!pipe_to_command(&["definitely-not-a-real-command"], "hello"));
        // spawns fine but exits non-zero
        assert!(!pipe_to_command(&["false"], "hello"));
    }

    #[tokio::test]
    async fn tab_cycles_code_block_selection() {
        let mut app = test_app();
        app.complete(Ok("```rust\nalpha\n```\n```python\nbeta\n```".to_string()));

        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.selected_block_code().as_deref(), Some("alpha"));
        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.selected_block_code().as_deref(), Some("beta"));
        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.selected_block_code().as_deref(), Some("alpha"));
        handle_key(&mut app, key(KeyCode::BackTab));
        assert_eq!(app.selected_block_code().as_deref(), Some("beta"));
    }

    #[tokio::test]
    async fn brackets_are_typed_into_the_input() {
        let mut app = test_app();
        app.complete(Ok("```rust\nalpha\n```".to_string()));
        handle_key(&mut app, key(KeyCode::Char('[')));
        handle_key(&mut app, key(KeyCode::Char(']')));
        assert_eq!(app.input, "[]");
        assert_eq!(app.selected_block, None);
    }

    #[tokio::test]
    async fn ctrl_l_clears_chat() {
        let mut app = test_app();
        app.input = "hi".to_string();
        app.submit().unwrap();
        app.complete(Ok("yo".to_string()));
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL),
        );
        assert_eq!(app.log.entries().len(), 1); // greeting re-seeded
    }
}
