//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).  This makes it easy to change the
//! visual layout without touching business logic.
//!
//! ## For contributors
//!
//! * The layout is a two-row split: the main area on top and a one-line
//!   status bar at the bottom.  The main area is either the feed list plus
//!   the preview pane, or the article overlay while one is open.
//! * Thumbnails are drawn with the upper-half-block glyph: one terminal
//!   cell carries two image rows (foreground paints the top pixel,
//!   background the bottom), see [`thumbnail_lines`].
//! * Colours and styles are defined inline — feel free to extract them into
//!   constants or a theme struct if the palette grows.
//! * [`ratatui`] is the TUI framework; see its docs for widget details.

use image::{imageops, RgbaImage};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::reader::ReaderState;

/// Width of the preview pane, borders included.
const PREVIEW_COLS: u16 = 36;

/// Terminal rows the thumbnail may occupy inside the preview pane.
const THUMB_MAX_ROWS: u16 = 9;

/// Draw the complete UI for one frame.
///
/// Called once per tick from the main loop.  Delegates to helper functions
/// for each screen region.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    if app.reader.is_some() {
        draw_reader(app, frame, main_area);
    } else {
        let [list_area, preview_area] = Layout::horizontal([
            Constraint::Min(40),
            Constraint::Length(PREVIEW_COLS),
        ])
        .areas(main_area);

        draw_feed_list(app, frame, list_area);
        draw_preview(app, frame, preview_area);
    }

    draw_status_bar(app, frame, status_area);
}

/// Render the scrollable feed item list.
fn draw_feed_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let list_items: Vec<ListItem> = app
        .feed
        .items()
        .iter()
        .map(|item| {
            let date_str = item.published.format("%Y-%m-%d %H:%M").to_string();

            let mut spans = vec![
                Span::styled(
                    format!("{date_str:<17}"),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(" "),
                Span::styled(&item.title, Style::default().fg(Color::White)),
            ];
            if let Some(category) = &item.category_type {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(
                    format!("[{category}]"),
                    Style::default().fg(Color::Cyan),
                ));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(list_items)
        .block(
            Block::default()
                .title(" News ")
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);

    // The paging trigger keys off what is actually on screen, not just the
    // selection.  Offset is accurate now that the list has rendered.
    let visible_rows = usize::from(area.height.saturating_sub(2));
    let len = app.feed.len();
    if len > 0 && visible_rows > 0 {
        let last_visible = (app.list_state.offset() + visible_rows).min(len) - 1;
        app.note_visible_bottom(last_visible);
    }
}

/// Render the preview pane: thumbnail plus metadata for the selection.
fn draw_preview(app: &App, frame: &mut Frame, area: Rect) {
    let inner_width = area.width.saturating_sub(2);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(image) = app.thumb.image() {
        lines.extend(thumbnail_lines(image, inner_width, THUMB_MAX_ROWS));
        lines.push(Line::default());
    } else if app.is_thumb_fetching() {
        lines.push(Line::styled(
            "fetching thumbnail…",
            Style::default().fg(Color::DarkGray),
        ));
        lines.push(Line::default());
    }

    match app.selected_item() {
        Some(item) => {
            lines.push(Line::styled(
                item.title.as_str(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ));

            let mut meta = vec![Span::styled(
                item.published.format("%Y-%m-%d %H:%M").to_string(),
                Style::default().fg(Color::DarkGray),
            )];
            if let Some(category) = &item.category_type {
                meta.push(Span::raw("  "));
                meta.push(Span::styled(
                    format!("[{category}]"),
                    Style::default().fg(Color::Cyan),
                ));
            }
            lines.push(Line::from(meta));

            if let Some(description) = &item.description {
                lines.push(Line::default());
                lines.push(Line::raw(description.as_str()));
            }
        }
        None => lines.push(Line::styled(
            "nothing selected",
            Style::default().fg(Color::DarkGray),
        )),
    }

    let preview = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Preview ")
                .borders(Borders::ALL),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(preview, area);
}

/// Render the article overlay in place of the list.
fn draw_reader(app: &App, frame: &mut Frame, area: Rect) {
    let Some(reader) = &app.reader else {
        return;
    };
    let block = Block::default()
        .title(format!(" {} ", reader.title))
        .borders(Borders::ALL);

    match &reader.state {
        ReaderState::Loading => {
            let body = Paragraph::new(Line::styled(
                "Fetching article…",
                Style::default().fg(Color::DarkGray),
            ))
            .block(block);
            frame.render_widget(body, area);
        }
        ReaderState::Ready { paragraphs, scroll } => {
            let mut lines = Vec::with_capacity(paragraphs.len() * 2);
            for paragraph in paragraphs {
                lines.push(Line::raw(paragraph.as_str()));
                lines.push(Line::default());
            }
            let body = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((*scroll, 0));
            frame.render_widget(body, area);
        }
        ReaderState::Failed { message } => {
            let lines = vec![
                Line::styled(message.as_str(), Style::default().fg(Color::Red)),
                Line::default(),
                Line::styled("Esc: back to the list", Style::default().fg(Color::DarkGray)),
            ];
            frame.render_widget(Paragraph::new(lines).block(block), area);
        }
    }
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::raw(" "),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} / {} items", app.feed.len(), app.feed.total()),
            Style::default().fg(Color::Green),
        ),
    ];
    if app.feed.is_loading() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("fetching…", Style::default().fg(Color::Magenta)));
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("open: {}", app.open_mode.label()),
        Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::raw(if app.reader.is_some() {
        "  Esc: back  j/k: scroll  q: quit"
    } else {
        "  q: quit  j/k: move  Enter: open  o: mode  r: reload"
    }));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Turn a decoded image into terminal lines, two pixel rows per line.
///
/// The image is shrunk to fit `max_width` columns by `max_rows * 2` pixel
/// rows, preserving aspect ratio and never upscaling.  Each cell is the
/// upper-half-block glyph with the foreground colouring the top pixel and
/// the background the bottom one, which is what makes a cell square-ish.
fn thumbnail_lines(image: &RgbaImage, max_width: u16, max_rows: u16) -> Vec<Line<'static>> {
    if max_width == 0 || max_rows == 0 {
        return Vec::new();
    }
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let target_w = f64::from(max_width);
    let target_h = f64::from(max_rows) * 2.0;
    let scale = f64::min(target_w / f64::from(width), target_h / f64::from(height)).min(1.0);
    let out_w = ((f64::from(width) * scale).round() as u32).max(1);
    let out_h = ((f64::from(height) * scale).round() as u32).max(1);
    let small = imageops::thumbnail(image, out_w, out_h);

    let mut lines = Vec::with_capacity(out_h.div_ceil(2) as usize);
    for y in (0..out_h).step_by(2) {
        let mut spans = Vec::with_capacity(out_w as usize);
        for x in 0..out_w {
            let top = small.get_pixel(x, y).0;
            let bottom = if y + 1 < out_h {
                small.get_pixel(x, y + 1).0
            } else {
                [0, 0, 0, 0]
            };
            spans.push(Span::styled(
                "▀",
                Style::default()
                    .fg(Color::Rgb(top[0], top[1], top[2]))
                    .bg(Color::Rgb(bottom[0], bottom[1], bottom[2])),
            ));
        }
        lines.push(Line::from(spans));
    }
    lines
}
