use crate::app::App;
use crate::heatmap::MapPhase;
use crate::ui::widgets::heatmap::{legend_spans, render_heatmap};
use crate::ui::{main_layout, map_block};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render_map_screen(app: &App, f: &mut Frame<'_>) {
    let layout = main_layout(f.area());

    render_header(app, f, layout[0]);

    let block = map_block()
        .title(format!(
            " {:.4}, {:.4}  z{:.1} ",
            app.heatmap.view.latitude, app.heatmap.view.longitude, app.heatmap.view.zoom
        ))
        .border_style(Style::default().fg(phase_color(app.heatmap.phase())));
    let inner = block.inner(layout[1]);
    f.render_widget(block, layout[1]);
    render_heatmap(app, f, inner);

    render_footer(app, f, layout[2]);
}

const fn phase_color(phase: MapPhase) -> Color {
    match phase {
        MapPhase::Loading => Color::Yellow,
        MapPhase::Ready => Color::Cyan,
        MapPhase::Interacting => Color::LightCyan,
        MapPhase::Error => Color::Red,
    }
}

fn render_header(app: &App, f: &mut Frame<'_>, area: Rect) {
    let live = if app.is_live() {
        Span::styled("● live", Style::default().fg(Color::Green))
    } else {
        Span::styled("○ offline", Style::default().fg(Color::DarkGray))
    };

    let header = Line::from(vec![
        Span::styled(
            "Waste Watch ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{} reports  ", app.reports.len()),
            Style::default().fg(Color::White),
        ),
        live,
        Span::styled(
            format!("  {}", app.map_style.as_str()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    f.render_widget(Paragraph::new(header), area);
}

fn render_footer(app: &App, f: &mut Frame<'_>, area: Rect) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(16)])
        .split(rows[0]);

    let status_style = if app.status_message.starts_with("Error")
        || app.status_message.starts_with("Upload failed")
    {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };
    f.render_widget(
        Paragraph::new(Span::styled(app.status_message.as_str(), status_style)),
        columns[0],
    );
    f.render_widget(
        Paragraph::new(Line::from(legend_spans(&app.heatmap.style.ramp)))
            .alignment(Alignment::Right),
        columns[1],
    );

    f.render_widget(
        Paragraph::new(shortcuts_line()).alignment(Alignment::Center),
        rows[1],
    );
}

fn shortcuts_line() -> Line<'static> {
    let key = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    Line::from(vec![
        Span::styled("←↑↓→", key),
        Span::raw(" pan  "),
        Span::styled("+/-", key),
        Span::raw(" zoom  "),
        Span::styled("Enter", key),
        Span::raw(" inspect  "),
        Span::styled("u", key),
        Span::raw(" report  "),
        Span::styled("F1", key),
        Span::raw(" help  "),
        Span::styled("q", key),
        Span::raw(" quit"),
    ])
}
