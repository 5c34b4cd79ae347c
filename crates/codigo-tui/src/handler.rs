use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, CompareField, FocusPane, InputMode};
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
        AppEvent::Resize => app.scroll_query_to_bottom(),
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_tasks().await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Popups take every key while open
    if app.notice.is_some() {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
            app.notice = None;
        }
        return;
    }
    if app.compare_popup.is_some() {
        handle_compare_popup(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') => {
            app.focus = FocusPane::Input;
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Enter => match app.focus {
            FocusPane::References => app.open_selected_reference(),
            FocusPane::Input | FocusPane::Chat => {
                app.focus = FocusPane::Input;
                app.input_mode = InputMode::Editing;
            }
        },
        KeyCode::Tab => app.cycle_focus(),

        KeyCode::Char('j') | KeyCode::Down => {
            if app.focus == FocusPane::References {
                app.references_down();
            } else {
                app.scroll_down(1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if app.focus == FocusPane::References {
                app.references_up();
            } else {
                app.scroll_up(1);
            }
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(app.query_chat_height / 2);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(app.query_chat_height / 2);
        }
        KeyCode::Char('G') => app.scroll_query_to_bottom(),
        KeyCode::Char('g') => app.query_scroll = 0,

        KeyCode::Char('c') => app.open_compare_popup(),
        KeyCode::Char('r') => app.reset_chat(),
        KeyCode::Char('e') => app.export_chat(),
        KeyCode::Char('s') => app.show_stats(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            // Shift+Enter is not a newline here; questions are single-line
            app.submit_question();
        }
        KeyCode::Backspace => {
            if app.query_cursor > 0 {
                app.query_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.query_input, app.query_cursor);
                app.query_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.query_input.chars().count();
            if app.query_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.query_input, app.query_cursor);
                app.query_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.query_cursor = app.query_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.query_input.chars().count();
            app.query_cursor = (app.query_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.query_cursor = 0;
        }
        KeyCode::End => {
            app.query_cursor = app.query_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.query_input, app.query_cursor);
            app.query_input.insert(byte_pos, c);
            app.query_cursor += 1;
        }
        _ => {}
    }
}

fn handle_compare_popup(app: &mut App, key: KeyEvent) {
    let Some(popup) = app.compare_popup.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Esc => app.close_compare_popup(),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            popup.field = match popup.field {
                CompareField::First => CompareField::Second,
                CompareField::Second => CompareField::First,
            };
        }
        // Enter on the first field moves on; on the second it submits
        KeyCode::Enter => match popup.field {
            CompareField::First => popup.field = CompareField::Second,
            CompareField::Second => app.submit_comparison(),
        },
        KeyCode::Backspace => {
            popup.active_input().pop();
            popup.error = None;
        }
        KeyCode::Char(c) => {
            popup.active_input().push(c);
            popup.error = None;
        }
        _ => {}
    }
}
