use color_eyre::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use serde::Serialize;
use std::io::Stdout;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use crate::app::{handle_input, handle_mouse, App, AppEvent};
use crate::heatmap::{hotspots, Hotspot, ReportCollection};
use crate::store::ReportStore;
use crate::ui;

const HOTSPOT_LIMIT: usize = 5;

/// Run in headless mode (no UI): one listing, printed as text or JSON.
pub async fn run_headless(store: &dyn ReportStore, json: bool) -> Result<()> {
    let reports = ReportCollection::from_newest_first(store.list_reports().await?);
    let stats = build_headless_stats(&reports, store.backend_name());

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        render_headless_stats(&stats);
    }

    Ok(())
}

fn render_headless_stats(stats: &HeadlessStats) {
    println!("\nWaste Watch Stats");
    println!("=================");
    println!("Backend: {}", stats.backend);
    println!("Total reports: {}", stats.total_reports);

    if let Some(newest) = &stats.newest {
        println!(
            "Newest report: {} at {:.5}, {:.5} ({})",
            newest.id, newest.latitude, newest.longitude, newest.created_at
        );
    }

    println!("\nHotspots (0.01° cells):");
    if stats.hotspots.is_empty() {
        println!("- none");
    }
    for spot in &stats.hotspots {
        println!(
            "- {:.2}, {:.2}: {} reports",
            spot.latitude, spot.longitude, spot.count
        );
    }
}

fn build_headless_stats(reports: &ReportCollection, backend: &'static str) -> HeadlessStats {
    HeadlessStats {
        backend,
        total_reports: reports.len(),
        newest: reports.newest().map(|report| HeadlessReport {
            id: report.id.to_string(),
            latitude: report.latitude,
            longitude: report.longitude,
            created_at: report.created_at.to_rfc3339(),
        }),
        hotspots: hotspots(reports, HOTSPOT_LIMIT),
    }
}

#[derive(Debug, Serialize)]
struct HeadlessStats {
    backend: &'static str,
    total_reports: usize,
    newest: Option<HeadlessReport>,
    hotspots: Vec<Hotspot>,
}

#[derive(Debug, Serialize)]
struct HeadlessReport {
    id: String,
    latitude: f64,
    longitude: f64,
    created_at: String,
}

/// Run the main application event loop
pub async fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    events: &mut UnboundedReceiver<AppEvent>,
) -> Result<()> {
    // Configure event poll timeout
    const EVENT_POLL_TIMEOUT: Duration = Duration::from_millis(50);

    app.start();

    loop {
        app.update();

        let size = terminal.size()?;
        app.set_frame_area(Rect::new(0, 0, size.width, size.height));

        if let Err(e) = terminal.draw(|f| ui::ui(app, f)) {
            return Err(color_eyre::eyre::eyre!("Terminal draw error: {e}"));
        }

        if event::poll(EVENT_POLL_TIMEOUT)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_input(app, key.code),
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(width, height) => debug!(width, height, "terminal resized"),
                _ => {}
            }
        }

        // Background results never block drawing
        while let Ok(event) = events.try_recv() {
            app.handle_event(event);
        }
        app.drain_feed();

        if !app.running {
            info!("quitting");
            break;
        }
    }

    Ok(())
}
