use crate::app::App;
use crate::store::photo::MAX_PHOTO_BYTES;
use crate::ui::widgets::popup::{centered_box, open_popup};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;
use throbber_widgets_tui::{Throbber, WhichUse, BRAILLE_SIX};

#[allow(clippy::cast_precision_loss)]
fn size_label(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

pub fn render_upload(app: &App, f: &mut Frame<'_>) {
    let area = centered_box(72, 13, f.area());
    let block = open_popup(f, area, "Report a waste site", Color::Cyan);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Intro
            Constraint::Length(1), // Path input
            Constraint::Length(2), // Selection
            Constraint::Min(2),    // Error / progress
            Constraint::Length(1), // Keys
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(format!(
            "Attach a photo of the site (image, up to {}). \
             Your current location is added on submit.",
            size_label(MAX_PHOTO_BYTES)
        ))
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true }),
        rows[0],
    );

    let form = &app.upload;
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Photo: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(form.path_input.as_str()),
            Span::styled("_", Style::default().fg(Color::Yellow)),
        ])),
        rows[1],
    );

    let selection = form.selected().map_or_else(
        || Line::from(Span::styled("No photo selected", Style::default().fg(Color::DarkGray))),
        |photo| {
            let name = photo
                .path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("photo");
            Line::from(vec![
                Span::styled("✓ ", Style::default().fg(Color::Green)),
                Span::raw(format!("{name} ({}, {})", size_label(photo.size), photo.content_type)),
            ])
        },
    );
    f.render_widget(Paragraph::new(selection), rows[2]);

    if form.is_uploading() {
        render_progress(app, f, rows[3]);
    } else if let Some(error) = form.error() {
        f.render_widget(
            Paragraph::new(Span::styled(error, Style::default().fg(Color::Red)))
                .wrap(Wrap { trim: true }),
            rows[3],
        );
    }

    f.render_widget(Paragraph::new(keys_line(app)), rows[4]);
}

fn render_progress(app: &App, f: &mut Frame<'_>, area: Rect) {
    let throbber = Throbber::default()
        .label("Submitting report...")
        .throbber_style(Style::default().fg(Color::Yellow))
        .throbber_set(BRAILLE_SIX)
        .use_type(WhichUse::Spin);
    let mut state = app.throbber.clone();
    f.render_stateful_widget(throbber, Rect { height: 1, ..area }, &mut state);
}

fn keys_line(app: &App) -> Line<'static> {
    let key = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let submit = if app.upload.can_submit() {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Line::from(vec![
        Span::styled("Enter", key),
        Span::raw(" choose file, again to "),
        Span::styled("submit", submit),
        Span::raw("   "),
        Span::styled("Esc", key),
        Span::raw(" cancel"),
    ])
}
