use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, Focus};
use crate::tui::AppEvent;

/// Lines moved per PageUp/PageDown or wheel notch.
const SCROLL_STEP: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work with any focus
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.should_quit = true;
            return;
        }
        KeyCode::Tab => {
            app.focus_next();
            return;
        }
        KeyCode::BackTab => {
            app.focus_previous();
            return;
        }
        KeyCode::PageUp => {
            app.controller.log_mut().scroll_up(SCROLL_STEP);
            return;
        }
        KeyCode::PageDown => {
            app.controller.log_mut().scroll_down(SCROLL_STEP);
            return;
        }
        _ => {}
    }

    match app.focus {
        Focus::Input => handle_input_key(app, key),
        Focus::Endpoint => match key.code {
            KeyCode::Left | KeyCode::Up => app.controller.selector_mut().select_previous(),
            KeyCode::Right | KeyCode::Down | KeyCode::Enter | KeyCode::Char(' ') => {
                app.controller.selector_mut().select_next()
            }
            _ => {}
        },
        Focus::Send => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                app.send();
            }
        }
        Focus::Clear => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                app.clear();
            }
        }
    }
}

/// Editing keys for the message field. Enter does not submit; the Send
/// control does.
fn handle_input_key(app: &mut App, key: KeyEvent) {
    let input = app.controller.input_mut();
    match key.code {
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.insert_char(c),
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;
    let hit = |area: Option<Rect>| area.is_some_and(|r| point_in_rect(x, y, r));

    match mouse.kind {
        MouseEventKind::ScrollDown if hit(app.areas.chat) => {
            app.controller.log_mut().scroll_down(SCROLL_STEP);
        }
        MouseEventKind::ScrollUp if hit(app.areas.chat) => {
            app.controller.log_mut().scroll_up(SCROLL_STEP);
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if hit(app.areas.send) {
                app.focus = Focus::Send;
                app.send();
            } else if hit(app.areas.clear) {
                app.focus = Focus::Clear;
                app.clear();
            } else if hit(app.areas.endpoint) {
                app.focus = Focus::Endpoint;
                app.controller.selector_mut().select_next();
            } else if hit(app.areas.input) {
                app.focus = Focus::Input;
            }
        }
        _ => {}
    }
}
