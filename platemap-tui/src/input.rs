use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Screen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Run `service.start_load`(...) for the selected source
    StartLoad,
    /// Cancel the running load
    CancelLoad,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Char, Down, Enter, Esc, Left, Up};

    // Global quit shortcuts
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if key.code == Char('q') && key.modifiers.is_empty() {
        return Action::Quit;
    }

    // The error popup swallows input until it is dismissed or retried.
    if app.failure.is_some() {
        return match key.code {
            Char('r') => Action::StartLoad,
            Esc | Enter => {
                app.dismiss_failure();
                Action::None
            }
            _ => Action::None,
        };
    }

    // Any key closes the detail popup; Esc and Enter are the advertised ones.
    if app.detail.is_some() {
        app.close_detail();
        return Action::None;
    }

    let mut action = Action::None;

    match app.screen {
        Screen::SourceSelect => match key.code {
            Up | Char('k') => {
                if app.source_list_index > 0 {
                    app.source_list_index -= 1;
                }
            }
            Down | Char('j') => {
                if app.source_list_index + 1 < app.sources.len() {
                    app.source_list_index += 1;
                }
            }
            Enter | Char(' ') => {
                if app.select_current_source().is_some() {
                    action = Action::StartLoad;
                }
            }
            _ => {}
        },

        Screen::Loading => {
            if matches!(key.code, Esc | Char('x')) {
                action = Action::CancelLoad;
            }
        }

        Screen::Map => match key.code {
            Up | Char('k') => {
                if app.region_index > 0 {
                    app.region_index -= 1;
                }
            }
            Down | Char('j') => {
                if app.region_index + 1 < app.regions.len() {
                    app.region_index += 1;
                }
            }
            Enter | Char(' ') => {
                app.click_current_region();
            }
            Char('r') => {
                action = Action::StartLoad;
            }
            Left | Esc | Char('b') => {
                app.screen = Screen::SourceSelect;
            }
            _ => {}
        },
    }
    action
}
