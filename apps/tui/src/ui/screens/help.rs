use crate::app::App;
use crate::ui::widgets::popup::{centered_box, open_popup};
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

pub fn render_help(app: &App, f: &mut Frame<'_>) {
    let area = centered_box(64, 24, f.area());
    let block = open_popup(f, area, "Help & Keyboard Shortcuts", Color::Yellow);

    f.render_widget(
        Paragraph::new(Text::from(build_help_lines(app)))
            .block(block)
            .wrap(Wrap { trim: true }),
        area,
    );

    let hint = Paragraph::new(Span::styled(
        "Press F1 or Esc to close",
        Style::default().fg(Color::Gray),
    ))
    .alignment(Alignment::Center);
    let hint_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(2),
        width: area.width,
        height: 1,
    };
    f.render_widget(hint, hint_area);
}

fn shortcut(keys: &'static str, text: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {keys:<10}"),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(text),
    ])
}

fn build_help_lines(app: &App) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            "Waste Watch",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from("Density of reported waste sites, updated live as new reports arrive."),
        Line::from(format!(
            "Backend: {}   Map style: {}",
            app.actions.backend_name(),
            app.map_style.as_str()
        )),
        Line::from(""),
        Line::from(Span::styled("Map", Style::default().add_modifier(Modifier::BOLD))),
        shortcut("Arrows", "Pan"),
        shortcut("Drag", "Pan with the mouse"),
        shortcut("+ / -", "Zoom in / out (mouse wheel too)"),
        shortcut("0", "Back to the default view"),
        shortcut("Enter", "Inspect the hotspot under the crosshair"),
        shortcut("Click", "Inspect the hotspot under the pointer"),
        shortcut("r", "Retry after a failed load"),
        Line::from(""),
        Line::from(Span::styled("Reporting", Style::default().add_modifier(Modifier::BOLD))),
        shortcut("u", "Open the report form"),
        shortcut("Enter", "Choose the typed photo path, then submit"),
        shortcut("y / n", "Answer the location prompt"),
        Line::from(""),
        Line::from(Span::styled("Details", Style::default().add_modifier(Modifier::BOLD))),
        shortcut("o / p", "Open map link / photo"),
        shortcut("q", "Quit (from the map)"),
    ]
}
