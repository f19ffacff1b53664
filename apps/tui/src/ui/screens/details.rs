use crate::app::actions::{photo_status, PhotoStatus};
use crate::app::App;
use crate::ui::widgets::popup::{centered_box, open_popup};
use chrono::Local;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

pub fn render_details(app: &App, f: &mut Frame<'_>) {
    let Some(report) = app.selected_report.as_ref() else {
        return;
    };

    let area = centered_box(76, 12, f.area());
    let block = open_popup(f, area, &format!("Report {}", report.id), Color::Yellow);

    let label = Style::default().add_modifier(Modifier::BOLD);
    let key = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let photo = match photo_status(&report.photo_url) {
        PhotoStatus::Available(url) => Span::styled(url, Style::default().fg(Color::Cyan)),
        PhotoStatus::Broken => Span::styled(
            "[photo unavailable]",
            Style::default().fg(Color::DarkGray),
        ),
    };

    let text = vec![
        Line::from(vec![
            Span::styled("Reported: ", label),
            Span::raw(
                report
                    .created_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
            ),
        ]),
        Line::from(vec![
            Span::styled("Location: ", label),
            Span::raw(format!("{:.6}, {:.6}", report.latitude, report.longitude)),
        ]),
        Line::from(vec![Span::styled("Photo:    ", label), photo]),
        Line::from(vec![
            Span::styled("Map:      ", label),
            Span::styled(
                report.external_map_url(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("o", key),
            Span::raw(" open in map   "),
            Span::styled("p", key),
            Span::raw(" open photo   "),
            Span::styled("Esc", key),
            Span::raw(" close"),
        ]),
    ];

    f.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
