// UI module: map screen plus modal overlays

pub mod screens;
pub mod widgets;

use crate::app::state::AppScreen;
use crate::app::App;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

pub fn ui(app: &App, f: &mut Frame<'_>) {
    screens::map::render_map_screen(app, f);

    match app.screen {
        AppScreen::Map => {}
        AppScreen::Upload => screens::upload::render_upload(app, f),
        AppScreen::Details => screens::details::render_details(app, f),
    }

    if app.permission_prompt {
        screens::permission::render_permission_prompt(f);
    }

    if app.show_help {
        screens::help::render_help(app, f);
    }
}

/// Header, map body and footer rows of the main screen.
pub fn main_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title and counters
            Constraint::Min(3),    // Map
            Constraint::Length(3), // Status and shortcuts
        ])
        .split(area)
        .to_vec()
}

pub fn map_block() -> Block<'static> {
    Block::default().borders(Borders::ALL)
}

/// Drawable cells of the map for a given frame size. Input uses the same
/// rectangle to turn mouse cells into map pixels.
pub fn map_area(area: Rect) -> Rect {
    map_block().inner(main_layout(area)[1])
}
