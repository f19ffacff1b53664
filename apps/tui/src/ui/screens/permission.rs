use crate::ui::widgets::popup::{centered_box, open_popup};
use ratatui::layout::Alignment;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

pub fn render_permission_prompt(f: &mut Frame<'_>) {
    let area = centered_box(56, 8, f.area());
    let block = open_popup(f, area, "Location", Color::Yellow);

    let key = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let text = vec![
        Line::from("A report is pinned to where you are now."),
        Line::from("Allow access to your location for this session?"),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", key),
            Span::raw(" allow    "),
            Span::styled("n", key),
            Span::raw(" deny"),
        ]),
    ];

    f.render_widget(
        Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}
