use crate::app::actions::{open_external, photo_status, PhotoStatus};
use crate::app::state::{App, AppScreen};
use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};

/// Map pixels moved per arrow key press.
const PAN_STEP: f64 = 24.0;
const KEY_ZOOM_STEP: f64 = 1.0;
const SCROLL_ZOOM_STEP: f64 = 0.5;

pub fn handle_input(app: &mut App, key: KeyCode) {
    if app.permission_prompt {
        handle_permission_input(app, key);
        return;
    }

    if handle_help_toggle(app, key) {
        return;
    }

    match app.screen {
        AppScreen::Map => handle_map_input(app, key),
        AppScreen::Upload => handle_upload_input(app, key),
        AppScreen::Details => handle_details_input(app, key),
    }
}

fn handle_help_toggle(app: &mut App, key: KeyCode) -> bool {
    if key == KeyCode::F(1) {
        app.show_help = !app.show_help;
        return true;
    }

    if app.show_help {
        if key == KeyCode::Esc {
            app.show_help = false;
        }
        return true;
    }

    false
}

fn handle_permission_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Char('y' | 'Y') => app.answer_permission(true),
        KeyCode::Char('n' | 'N') | KeyCode::Esc => app.answer_permission(false),
        _ => {}
    }
}

fn handle_map_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Char('q') | KeyCode::Esc => app.running = false,
        KeyCode::Left => app.heatmap.nudge(PAN_STEP, 0.0),
        KeyCode::Right => app.heatmap.nudge(-PAN_STEP, 0.0),
        KeyCode::Up => app.heatmap.nudge(0.0, PAN_STEP),
        KeyCode::Down => app.heatmap.nudge(0.0, -PAN_STEP),
        KeyCode::Char('+' | '=') => app.heatmap.zoom(KEY_ZOOM_STEP),
        KeyCode::Char('-' | '_') => app.heatmap.zoom(-KEY_ZOOM_STEP),
        KeyCode::Char('0') => app.heatmap.reset_camera(),
        KeyCode::Enter => app.pick_center(),
        KeyCode::Char('u') => app.open_upload(),
        KeyCode::Char('r') => app.retry(),
        _ => {}
    }
}

fn handle_upload_input(app: &mut App, key: KeyCode) {
    if app.upload.is_uploading() {
        return;
    }

    match key {
        KeyCode::Esc => app.close_upload(),
        KeyCode::Enter => {
            // First Enter validates the typed path, the next one submits it
            let typed = app.upload.path_input.trim().to_string();
            let already_selected = app
                .upload
                .selected()
                .is_some_and(|photo| photo.path.as_os_str() == typed.as_str());
            if already_selected {
                app.request_submit();
            } else {
                app.upload.select_typed_path();
            }
        }
        KeyCode::Backspace => {
            app.upload.path_input.pop();
        }
        KeyCode::Char(c) => app.upload.path_input.push(c),
        _ => {}
    }
}

fn handle_details_input(app: &mut App, key: KeyCode) {
    let Some(report) = app.selected_report.as_ref() else {
        app.close_details();
        return;
    };

    match key {
        KeyCode::Esc | KeyCode::Char('q') => app.close_details(),
        KeyCode::Char('o') => {
            let url = report.external_map_url();
            app.status_message = match open_external(&url) {
                Ok(()) => format!("Opened {url}"),
                Err(e) => format!("Could not open map link: {e}"),
            };
        }
        KeyCode::Char('p') => {
            app.status_message = match photo_status(&report.photo_url) {
                PhotoStatus::Available(url) => match open_external(&url) {
                    Ok(()) => "Opened photo".to_string(),
                    Err(e) => format!("Could not open photo: {e}"),
                },
                PhotoStatus::Broken => "Photo unavailable".to_string(),
            };
        }
        _ => {}
    }
}

/// Click picks, drag pans, wheel zooms. Only the bare map takes the mouse.
pub fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.screen != AppScreen::Map || app.show_help || app.permission_prompt {
        return;
    }

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.press(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.drag_to(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.release(mouse.column, mouse.row),
        MouseEventKind::ScrollUp => {
            if app.cell_to_pixel(mouse.column, mouse.row).is_some() {
                app.heatmap.zoom(SCROLL_ZOOM_STEP);
            }
        }
        MouseEventKind::ScrollDown => {
            if app.cell_to_pixel(mouse.column, mouse.row).is_some() {
                app.heatmap.zoom(-SCROLL_ZOOM_STEP);
            }
        }
        _ => {}
    }
}
