use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use parley_core::ViewMode;
use ratatui::layout::Rect;

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Apply one event. Returns whether anything visible changed, so the caller
/// can skip redrawing on idle ticks.
pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<bool> {
    let changed = match event {
        AppEvent::Key(key) => {
            handle_key(app, key);
            true
        }
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => true,
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reveal => app.tick_reveal(),
    };
    let finished = app.poll_pending().await;
    Ok(changed || finished)
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match (app.view(), app.input_mode) {
        (ViewMode::Welcome, _) => handle_welcome(app, key),
        (ViewMode::Chat, InputMode::Normal) => handle_chat_normal(app, key),
        (ViewMode::Chat, InputMode::Editing) => handle_chat_editing(app, key),
    }
}

fn handle_welcome(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('s') => app.start_chat(),
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        _ => {}
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Back to the welcome screen
        KeyCode::Esc | KeyCode::Char('b') => app.back_to_welcome(),

        // Start typing
        KeyCode::Char('i') | KeyCode::Tab | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        // Scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::Char('G') => app.scroll_to_bottom(),

        // Code blocks
        KeyCode::Char('n') | KeyCode::Char(']') => app.select_next_code(),
        KeyCode::Char('p') | KeyCode::Char('[') => app.select_prev_code(),
        KeyCode::Char('y') => app.copy_selected_code(),

        // Skip the typewriter
        KeyCode::Char('f') => app.finish_reveals(),

        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.input_mode = InputMode::Normal;
        return;
    }

    // Input is disabled while waiting for a reply
    if !app.input_enabled() {
        return;
    }

    match key.code {
        KeyCode::Enter => app.submit_input(),
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
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) -> bool {
    let in_chat = app
        .chat_area
        .is_some_and(|r| point_in_rect(mouse.column, mouse.row, r));
    if !in_chat || app.view() != ViewMode::Chat {
        return false;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;
    use parley_core::{Backend, MockClient};

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn app() -> App {
        App::new(Backend::Mock(MockClient::instant()))
    }

    #[test]
    fn enter_on_welcome_starts_chat_in_editing_mode() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view(), ViewMode::Chat);
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[test]
    fn esc_then_b_returns_to_welcome() {
        let mut app = app();
        app.start_chat();
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.view(), ViewMode::Welcome);
    }

    #[test]
    fn editing_handles_multibyte_cursor_moves() {
        let mut app = app();
        app.start_chat();
        type_text(&mut app, "héllo");
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.input, "hélo");
        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Delete);
        assert_eq!(app.input, "élo");
    }

    #[test]
    fn ctrl_c_quits_from_anywhere() {
        let mut app = app();
        let mut key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        key.kind = KeyEventKind::Press;
        handle_key(&mut app, key);
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn idle_ticks_do_not_ask_for_a_redraw() {
        let mut app = app();
        app.start_chat();
        assert!(!handle_event(&mut app, AppEvent::Reveal).await.unwrap());
        assert!(!handle_event(&mut app, AppEvent::Tick).await.unwrap());

        app.conversation.begin_send("hi").unwrap();
        app.finish_send(Ok("ok".to_string()));
        assert!(handle_event(&mut app, AppEvent::Reveal).await.unwrap());
        assert!(handle_event(&mut app, AppEvent::Tick).await.unwrap());
        assert!(handle_event(&mut app, AppEvent::Reveal).await.unwrap());
        assert!(!handle_event(&mut app, AppEvent::Reveal).await.unwrap());
    }

    #[tokio::test]
    async fn typing_is_ignored_while_loading() {
        let mut app = app();
        app.start_chat();
        type_text(&mut app, "hello");
        press(&mut app, KeyCode::Enter);
        assert!(!app.input_enabled());

        type_text(&mut app, "more");
        assert!(app.input.is_empty());
    }
}
