//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use docve_core::models::DocumentStatus;
use docve_core::Route;

use crate::app::{
    can_add_field_char, can_add_password_char, can_add_username_char, App, AppState, ChatFocus,
    LoginFocus, ShelfField, SignupFocus, Tab, PAGE_SCROLL_SIZE,
};

/// Apply a text-editing key to `buffer`. Returns false for keys that are not
/// editing keys.
fn edit_text(buffer: &mut String, key: KeyEvent, accept: fn(usize, char) -> bool) -> bool {
    match key.code {
        KeyCode::Backspace => {
            buffer.pop();
            true
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if accept(buffer.chars().count(), c) {
                buffer.push(c);
            }
            true
        }
        _ => false,
    }
}

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return false;
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return true;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return false;
        }
        AppState::ConfirmingDelete(_) => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return false;
        }
        AppState::Searching => {
            handle_search_input(app, key);
            return false;
        }
        AppState::EditingShelf => {
            handle_shelf_form_input(app, key);
            return false;
        }
        AppState::ManagingAccess => {
            handle_access_input(app, key);
            return false;
        }
        AppState::GrantingAccess => {
            handle_grant_input(app, key);
            return false;
        }
        AppState::EnteringUploadPath => {
            handle_upload_input(app, key);
            return false;
        }
        AppState::Quitting => return true,
        AppState::Normal => {}
    }

    match app.route {
        Route::Login => return handle_login_input(app, key),
        Route::Signup => {
            handle_signup_input(app, key);
            return false;
        }
        Route::Chat if app.chat_focus == ChatFocus::Input => {
            handle_chat_input(app, key);
            return false;
        }
        _ => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return false;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return false;
        }
        KeyCode::Char('L') => {
            app.logout();
            return false;
        }
        KeyCode::Char('r') => {
            app.refresh();
            return false;
        }
        KeyCode::Char(c @ '1'..='5') => {
            let index = c as usize - '1' as usize;
            app.switch_tab(Tab::ALL[index]);
            return false;
        }
        KeyCode::Left => {
            if let Some(tab) = app.current_tab() {
                app.switch_tab(tab.prev());
            }
            return false;
        }
        KeyCode::Right => {
            if let Some(tab) = app.current_tab() {
                app.switch_tab(tab.next());
            }
            return false;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.move_selection(-1);
            return false;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.move_selection(1);
            return false;
        }
        KeyCode::PageUp => {
            app.move_selection(-(PAGE_SCROLL_SIZE as isize));
            return false;
        }
        KeyCode::PageDown => {
            app.move_selection(PAGE_SCROLL_SIZE as isize);
            return false;
        }
        KeyCode::Home => {
            app.select_first();
            return false;
        }
        KeyCode::End => {
            app.select_last();
            return false;
        }
        _ => {}
    }

    match app.route {
        Route::Shelves | Route::MyShelves => handle_shelves_keys(app, key),
        Route::ShelfDocuments(_) => handle_documents_keys(app, key),
        Route::Chat => handle_chat_keys(app, key),
        Route::SuperAdmin => handle_admin_keys(app, key),
        Route::Dashboard | Route::Login | Route::Signup => {}
    }
    false
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('r') {
        app.navigate(Route::Signup);
        return false;
    }
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = app.login_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = app.login_focus.prev();
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                app.login_focus = LoginFocus::Button;
                app.submit_login();
            }
        },
        _ => match app.login_focus {
            LoginFocus::Username => {
                edit_text(&mut app.login_username, key, can_add_username_char);
            }
            LoginFocus::Password => {
                edit_text(&mut app.login_password, key, can_add_password_char);
            }
            LoginFocus::Button => {}
        },
    }
    false
}

fn handle_signup_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.navigate(Route::Login),
        KeyCode::Down | KeyCode::Tab => {
            app.signup_focus = app.signup_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.signup_focus = app.signup_focus.prev();
        }
        KeyCode::Enter => match app.signup_focus {
            SignupFocus::Button | SignupFocus::Confirm => {
                app.signup_focus = SignupFocus::Button;
                app.submit_signup();
            }
            other => app.signup_focus = other.next(),
        },
        _ => {
            let form = &mut app.signup;
            match app.signup_focus {
                SignupFocus::Username => {
                    edit_text(&mut form.username, key, can_add_username_char);
                }
                SignupFocus::Email => {
                    edit_text(&mut form.email, key, can_add_field_char);
                }
                SignupFocus::Password => {
                    edit_text(&mut form.password, key, can_add_password_char);
                }
                SignupFocus::Confirm => {
                    edit_text(&mut form.confirm_password, key, can_add_password_char);
                }
                SignupFocus::Button => {}
            }
        }
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.search_query.clear();
            app.state = AppState::Normal;
            app.search_shelves();
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
            app.search_shelves();
        }
        _ => {
            if edit_text(&mut app.search_query, key, can_add_field_char) {
                app.shelf_selection = 0;
            }
        }
    }
}

fn handle_shelves_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('/') => app.state = AppState::Searching,
        KeyCode::Enter => app.open_selected_shelf(),
        KeyCode::Char('n') => app.open_create_shelf(),
        KeyCode::Char('e') => app.open_edit_shelf(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete_shelf(),
        KeyCode::Char('a') => app.open_access(),
        KeyCode::Esc if !app.search_query.is_empty() => {
            app.search_query.clear();
            app.search_shelves();
        }
        _ => {}
    }
}

fn handle_shelf_form_input(app: &mut App, key: KeyEvent) {
    let form = &mut app.shelf_form;
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
        }
        KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
        KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.prev(),
        KeyCode::Enter => match form.focus {
            ShelfField::Button => app.submit_shelf_form(),
            other => form.focus = other.next(),
        },
        KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right if form.focus == ShelfField::Type => {
            form.shelf_type = form.shelf_type.toggle();
        }
        _ => match form.focus {
            ShelfField::Name => {
                edit_text(&mut form.name, key, can_add_field_char);
            }
            ShelfField::Description => {
                edit_text(&mut form.description, key, can_add_field_char);
            }
            ShelfField::Type | ShelfField::Button => {}
        },
    }
}

fn handle_access_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            app.state = AppState::Normal;
            app.access_shelf = None;
        }
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::Char('a') => app.state = AppState::GrantingAccess,
        KeyCode::Char('d') | KeyCode::Delete => app.revoke_selected_access(),
        _ => {}
    }
}

fn handle_grant_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.state = AppState::ManagingAccess,
        KeyCode::Tab => app.grant_form.cycle_permission(),
        KeyCode::Enter => app.submit_grant(),
        _ => {
            edit_text(&mut app.grant_form.user_id, key, can_add_field_char);
        }
    }
}

fn handle_documents_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace => app.navigate(Route::Shelves),
        KeyCode::Char('u') => app.open_upload(),
        KeyCode::Char('i') => app.mark_selected(DocumentStatus::Indexed),
        KeyCode::Char('f') => app.mark_selected(DocumentStatus::Failed),
        KeyCode::Char('x') => app.mark_selected(DocumentStatus::Removed),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete_document(),
        KeyCode::Char('c') | KeyCode::Enter => app.chat_about_selected(),
        _ => {}
    }
}

fn handle_upload_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.state = AppState::Normal,
        KeyCode::Enter => app.start_upload(),
        _ => {
            edit_text(&mut app.upload_path, key, can_add_field_char);
        }
    }
}

fn handle_chat_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.select_chat_document(),
        KeyCode::Tab => app.chat_focus = ChatFocus::Input,
        KeyCode::Char('n') => app.new_chat(),
        _ => {}
    }
}

fn handle_chat_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Tab => app.chat_focus = ChatFocus::Documents,
        KeyCode::Enter => app.send_chat_message(),
        _ => {
            edit_text(&mut app.chat_input, key, can_add_field_char);
        }
    }
}

fn handle_admin_keys(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Char('d') | KeyCode::Delete) {
        app.request_delete_user();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_edit_text_appends_and_deletes() {
        let mut buffer = String::new();
        assert!(edit_text(&mut buffer, key(KeyCode::Char('a')), can_add_field_char));
        assert!(edit_text(&mut buffer, key(KeyCode::Char('é')), can_add_field_char));
        assert_eq!(buffer, "aé");
        assert!(edit_text(&mut buffer, key(KeyCode::Backspace), can_add_field_char));
        assert_eq!(buffer, "a");
        assert!(!edit_text(&mut buffer, key(KeyCode::Enter), can_add_field_char));
    }

    #[test]
    fn test_edit_text_respects_limit() {
        let mut buffer = "x".repeat(crate::app::MAX_USERNAME_LENGTH);
        edit_text(&mut buffer, key(KeyCode::Char('y')), can_add_username_char);
        assert_eq!(buffer.len(), crate::app::MAX_USERNAME_LENGTH);
    }

    #[test]
    fn test_edit_text_ignores_control_chords() {
        let mut buffer = String::new();
        let chord = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert!(!edit_text(&mut buffer, chord, can_add_field_char));
        assert!(buffer.is_empty());
    }
}
