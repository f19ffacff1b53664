use crate::app::App;
use crate::config::MapStyle;
use crate::heatmap::{ColorRamp, MapPhase, Rgb, Viewport, RAMP_STOPS};
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Map, MapResolution, Points};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;
use throbber_widgets_tui::{Throbber, WhichUse, BRAILLE_SIX};

pub const fn ramp_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

struct Palette {
    background: Color,
    coastline: Color,
    crosshair: Color,
}

const fn palette(style: MapStyle) -> Palette {
    if style.is_dark() {
        Palette {
            background: Color::Rgb(18, 18, 24),
            coastline: Color::DarkGray,
            crosshair: Color::Gray,
        }
    } else {
        Palette {
            background: Color::Rgb(242, 240, 236),
            coastline: Color::Rgb(150, 150, 150),
            crosshair: Color::Rgb(90, 90, 90),
        }
    }
}

/// Base map, heat layer and crosshair, or the loading / error state.
pub fn render_heatmap(app: &App, f: &mut Frame<'_>, area: Rect) {
    if area.width < 2 || area.height < 2 {
        return;
    }

    match app.heatmap.phase() {
        MapPhase::Loading => render_loading(app, f, area),
        MapPhase::Error => render_error(app, f, area),
        MapPhase::Ready | MapPhase::Interacting => render_density(app, f, area),
    }
}

fn render_loading(app: &App, f: &mut Frame<'_>, area: Rect) {
    let throbber = Throbber::default()
        .label("Loading reports...")
        .style(Style::default().fg(Color::Gray))
        .throbber_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .throbber_set(BRAILLE_SIX)
        .use_type(WhichUse::Spin);

    let line_area = Rect {
        x: area.x + area.width.saturating_sub(22) / 2,
        y: area.y + area.height / 2,
        width: area.width.min(22),
        height: 1,
    };
    let mut state = app.throbber.clone();
    f.render_stateful_widget(throbber, line_area, &mut state);
}

fn render_error(app: &App, f: &mut Frame<'_>, area: Rect) {
    let message = app.heatmap.error().unwrap_or("Unknown error");
    let text = vec![
        Line::from(Span::styled(
            "Could not load reports",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(vec![
            Span::raw("Press "),
            Span::styled(
                "r",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" to retry"),
        ]),
    ];

    let top = area.y + area.height.saturating_sub(5) / 2;
    let text_area = Rect {
        y: top,
        height: area.height.saturating_sub(top - area.y),
        ..area
    };
    f.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        text_area,
    );
}

#[allow(clippy::cast_precision_loss)]
fn render_density(app: &App, f: &mut Frame<'_>, area: Rect) {
    let viewport = Viewport::new(u32::from(area.width) * 2, u32::from(area.height) * 4);
    let view = app.heatmap.view;
    let surface = app.heatmap.render(&app.reports, viewport);
    let bounds = view.bounds(viewport);
    let colors = palette(app.map_style);

    // One point layer per ramp stop, drawn pale to deep so the densest
    // colour wins a shared cell.
    let mut layers: Vec<Vec<(f64, f64)>> = vec![Vec::new(); RAMP_STOPS];
    for pixel in surface.lit_pixels() {
        let (lng, lat) = view.unproject(pixel.x as f64 + 0.5, pixel.y as f64 + 0.5, viewport);
        layers[pixel.stop].push((lng, lat));
    }
    let ramp = *surface.ramp();

    let resolution = if app.map_style.is_high_resolution() {
        MapResolution::High
    } else {
        MapResolution::Low
    };

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .background_color(colors.background)
        .x_bounds([bounds.west, bounds.east])
        .y_bounds([bounds.south, bounds.north])
        .paint(move |ctx| {
            ctx.draw(&Map {
                color: colors.coastline,
                resolution,
            });
            ctx.layer();

            for (stop, coords) in layers.iter().enumerate() {
                if coords.is_empty() {
                    continue;
                }
                ctx.draw(&Points {
                    coords,
                    color: ramp_color(ramp.stop(stop)),
                });
            }
            ctx.layer();

            ctx.print(
                view.longitude,
                view.latitude,
                Span::styled("+", Style::default().fg(colors.crosshair)),
            );
        });

    f.render_widget(canvas, area);
}

/// Pale-to-deep swatches for the footer.
pub fn legend_spans(ramp: &ColorRamp) -> Vec<Span<'static>> {
    let mut spans = vec![Span::styled("low ", Style::default().fg(Color::Gray))];
    spans.extend(
        ramp.stops()
            .iter()
            .map(|&rgb| Span::styled("█", Style::default().fg(ramp_color(rgb)))),
    );
    spans.push(Span::styled(" high", Style::default().fg(Color::Gray)));
    spans
}
