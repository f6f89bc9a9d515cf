use std::borrow::Cow;

use super::state::{AppState, DetailsPane, DetailsView};
use super::{InputLine, InputMode};
use crate::engine::StatusKind;
use crate::feed::types::POSTER_BASE_URL;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const LOG_PANE_HEIGHT: u16 = 6;
const REVIEWS_SHOWN: usize = 2;
const REVIEW_EXCERPT_CHARS: usize = 160;

pub fn draw(f: &mut Frame, state: &AppState, spinner_frame: u8, input: Option<&InputLine>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(LOG_PANE_HEIGHT),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, state, chunks[0]);
    match &state.details {
        Some(view) => draw_details(f, view, chunks[1], spinner_frame),
        None => draw_movies(f, state, chunks[1]),
    }
    draw_status(f, state, chunks[2], spinner_frame, input);
    draw_logs(f, state, chunks[3]);
    draw_footer(f, chunks[4]);
}

fn draw_header(f: &mut Frame, state: &AppState, area: Rect) {
    let titles: Vec<Line> = state
        .categories
        .iter()
        .map(|c| Line::from(c.label().to_string()))
        .collect();

    let mut title = format!(" cinefeed [{}] ", state.source_name);
    if !state.query.trim().is_empty() {
        title.push_str(&format!("search: \"{}\" ", state.query.trim()));
    }
    title.push_str(&format!("| up {} ", state.uptime()));

    let tabs = Tabs::new(titles)
        .select(state.category_index)
        .block(Block::default().title(title).borders(Borders::ALL))
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

fn draw_movies(f: &mut Frame, state: &AppState, area: Rect) {
    let inner_width = area.width.saturating_sub(2) as usize;
    let visible = state.visible_movies();

    if visible.is_empty() {
        let text = if state.loading {
            "Loading..."
        } else if state.filter.is_active() && !state.movies.is_empty() {
            "No loaded movies match the filter"
        } else {
            "No movies"
        };
        let para = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(text, Style::default().fg(Color::DarkGray))),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().title(" Movies ").borders(Borders::ALL));
        f.render_widget(para, area);
        return;
    }

    let fixed_cols = 4 + 6 + 6; // rank + year + rating
    let title_w = inner_width.saturating_sub(fixed_cols + 3).max(4);

    let visible_lines = area.height.saturating_sub(3) as usize; // borders + header row
    let total = visible.len();
    let selected = state.selected.min(total.saturating_sub(1));
    // Keep the active item on screen.
    let offset = if visible_lines == 0 {
        0
    } else {
        (selected + 1).saturating_sub(visible_lines)
    };

    let rows: Vec<Row> = visible
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible_lines)
        .map(|(i, m)| {
            let rating = m
                .vote_average
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "--".to_string());
            let rating_color = match m.vote_average {
                Some(v) if v >= 7.5 => Color::Green,
                Some(v) if v >= 6.0 => Color::Yellow,
                Some(_) => Color::Red,
                None => Color::DarkGray,
            };
            let year = m
                .release_year()
                .map(|y| y.to_string())
                .unwrap_or_else(|| "\u{2014}".to_string());
            let row = Row::new(vec![
                Cell::from(format!("{:>3}", i + 1)),
                Cell::from(truncate_with_ellipsis(&m.title, title_w).into_owned()),
                Cell::from(year),
                Cell::from(rating).style(Style::default().fg(rating_color)),
            ]);
            if i == selected {
                row.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        })
        .collect();

    let header = Row::new(vec!["#", "Title", "Year", "Rating"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let title = if state.filter.is_active() {
        format!(
            " Movies [{}/{} filter: {}] ",
            total,
            state.movies.len(),
            state.filter.needle()
        )
    } else {
        format!(" Movies [{}/{}] ", selected + 1, total)
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(title_w as u16),
            Constraint::Length(6),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(table, area);
}

fn draw_details(f: &mut Frame, view: &DetailsView, area: Rect, spinner_frame: u8) {
    let movie = &view.movie;
    let label = Style::default().fg(Color::DarkGray);
    let mut lines = Vec::new();

    let mut heading = vec![Span::styled(
        movie.title.clone(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if let Some(year) = movie.release_year() {
        heading.push(Span::raw(format!(" ({})", year)));
    }
    if let Some(v) = movie.vote_average {
        heading.push(Span::styled(format!("  {:.1}/10", v), Style::default().fg(Color::Yellow)));
    }
    lines.push(Line::from(heading));

    match &view.pane {
        DetailsPane::Loading => {
            let ch = SPINNER_FRAMES[(spinner_frame as usize) % SPINNER_FRAMES.len()];
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("{} Loading details...", ch),
                Style::default().fg(Color::Cyan),
            )));
        }
        DetailsPane::Failed(message) => {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled(format!(" ! {}", message), Style::default().fg(Color::Red)),
                Span::styled("  [r] retry", Style::default().fg(Color::Yellow)),
            ]));
        }
        DetailsPane::Ready { details, recommendations } => {
            if let Some(tagline) = details.tagline.as_deref().filter(|t| !t.is_empty()) {
                lines.push(Line::from(Span::styled(
                    tagline.to_string(),
                    Style::default().add_modifier(Modifier::ITALIC),
                )));
            }
            let mut facts = Vec::new();
            if let Some(runtime) = details.runtime.filter(|r| *r > 0) {
                facts.push(format!("{}h {:02}m", runtime / 60, runtime % 60));
            }
            let genres = details.genre_names();
            if !genres.is_empty() {
                facts.push(genres);
            }
            if !facts.is_empty() {
                lines.push(Line::from(Span::styled(facts.join("  |  "), label)));
            }
            lines.push(Line::from(""));
            let overview = details
                .movie
                .overview
                .as_deref()
                .or(movie.overview.as_deref())
                .unwrap_or("No overview available.");
            lines.push(Line::from(overview.to_string()));
            lines.push(Line::from(""));

            if let Some(url) = details.trailer_url() {
                lines.push(Line::from(vec![Span::styled("Trailer  ", label), Span::raw(url)]));
            }
            if let Some(url) = details.movie.poster_url(POSTER_BASE_URL) {
                lines.push(Line::from(vec![Span::styled("Poster   ", label), Span::raw(url)]));
            }

            if !details.reviews.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("Reviews ({})", details.reviews.len()),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                for review in details.reviews.iter().take(REVIEWS_SHOWN) {
                    let excerpt = review.content.split_whitespace().collect::<Vec<_>>().join(" ");
                    lines.push(Line::from(vec![
                        Span::styled(format!("{}: ", review.author), Style::default().fg(Color::Yellow)),
                        Span::raw(truncate_with_ellipsis(&excerpt, REVIEW_EXCERPT_CHARS).into_owned()),
                    ]));
                }
            }

            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "You might also like",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            if recommendations.is_empty() {
                lines.push(Line::from(Span::styled("  none", label)));
            }
            for rec in recommendations {
                let year = rec.release_year().map(|y| format!(" ({})", y)).unwrap_or_default();
                lines.push(Line::from(format!("  - {}{}", rec.title, year)));
            }
        }
    }

    let para = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().title(" Details  [Esc] back ").borders(Borders::ALL));
    f.render_widget(para, area);
}

fn draw_status(f: &mut Frame, state: &AppState, area: Rect, spinner_frame: u8, input: Option<&InputLine>) {
    let line = if let Some(input) = input {
        let prompt = match input.mode {
            InputMode::Search => " search> ",
            InputMode::Filter => " filter> ",
        };
        Line::from(vec![
            Span::styled(prompt, Style::default().fg(Color::Yellow)),
            Span::raw(input.buffer.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ])
    } else {
        match &state.status {
            Some(status) => {
                let (prefix, color) = match status.kind {
                    StatusKind::Info => {
                        let ch = SPINNER_FRAMES[(spinner_frame as usize) % SPINNER_FRAMES.len()];
                        (format!(" {} ", ch), Color::Cyan)
                    }
                    StatusKind::Empty => (" \u{2014} ".to_string(), Color::DarkGray),
                    StatusKind::Error => (" ! ".to_string(), Color::Red),
                };
                let mut spans = vec![
                    Span::styled(prefix, Style::default().fg(color)),
                    Span::styled(status.text.clone(), Style::default().fg(color)),
                ];
                if status.kind == StatusKind::Error {
                    spans.push(Span::styled("  [r] retry", Style::default().fg(Color::Yellow)));
                }
                Line::from(spans)
            }
            None => Line::from(""),
        }
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_logs(f: &mut Frame, state: &AppState, area: Rect) {
    let max_width = area.width.saturating_sub(2) as usize; // borders
    let visible_lines = area.height.saturating_sub(2) as usize;

    let lines: Vec<Line> = state
        .logs
        .iter()
        .rev()
        .take(visible_lines)
        .map(|l| {
            let color = match l.level.as_str() {
                "ERROR" => Color::Red,
                "EMPTY" => Color::Yellow,
                _ => Color::DarkGray,
            };
            let prefix = format!(" {} [{}] ", l.time, l.level);
            let msg_max = max_width.saturating_sub(prefix.len());
            let msg = truncate_with_ellipsis(&l.message, msg_max);
            Line::from(vec![
                Span::styled(prefix, Style::default().fg(color)),
                Span::raw(msg.into_owned()),
            ])
        })
        .collect();

    let para = Paragraph::new(lines).block(Block::default().title(" Feed Log ").borders(Borders::ALL));
    f.render_widget(para, area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    let line = Line::from(vec![
        key("  [q]"),
        Span::raw("uit  "),
        key("[j/k]"),
        Span::raw(" move  "),
        key("[Tab]"),
        Span::raw(" category  "),
        key("[Enter]"),
        Span::raw(" details  "),
        key("[/]"),
        Span::raw(" search  "),
        key("[f]"),
        Span::raw("ilter  "),
        key("[r]"),
        Span::raw("etry  "),
        key("[Esc]"),
        Span::raw(" back"),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn truncate_with_ellipsis(s: &str, max_width: usize) -> Cow<'_, str> {
    let char_count = s.chars().count();
    if char_count <= max_width {
        Cow::Borrowed(s)
    } else if max_width <= 3 {
        Cow::Owned(".".repeat(max_width))
    } else {
        let end = s
            .char_indices()
            .nth(max_width - 3)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        Cow::Owned(format!("{}...", &s[..end]))
    }
}
