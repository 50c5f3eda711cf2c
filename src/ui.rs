mod charting;

use itertools::{EitherOrBoth, Itertools};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Widget, Wrap},
};
use termtypr::{
    history::HistorySummary,
    preferences::{MAX_WORD_COUNT, MIN_WORD_COUNT},
    router::FinishedGame,
    session::DisplayData,
};
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const TREND_LENGTH: usize = 30;
const RECENT_ROWS: usize = 8;

struct Palette {
    bold: Style,
    green: Style,
    red: Style,
    dim: Style,
    underlined_dim: Style,
    italic: Style,
    magenta: Style,
    yellow: Style,
}

impl Palette {
    fn new() -> Self {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let dim = Style::default().patch(bold).add_modifier(Modifier::DIM);
        Self {
            bold,
            green: Style::default().patch(bold).fg(Color::Green),
            red: Style::default().patch(bold).fg(Color::Red),
            dim,
            underlined_dim: Style::default().patch(dim).add_modifier(Modifier::UNDERLINED),
            italic: Style::default().add_modifier(Modifier::ITALIC),
            magenta: Style::default().patch(bold).fg(Color::Magenta),
            yellow: Style::default().patch(bold).fg(Color::Yellow),
        }
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = Palette::new();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);

        match self.state {
            AppState::Menu => render_menu(self, chunks[0], buf, &p),
            AppState::Typing => render_typing(self, chunks[0], buf, &p),
            AppState::Results => render_results(self, chunks[0], buf, &p),
            AppState::Stats => render_stats(self, chunks[0], buf, &p),
            AppState::Settings => render_settings(self, chunks[0], buf, &p),
        }

        if let Some(message) = &self.message {
            Paragraph::new(Span::styled(message.as_str(), p.yellow))
                .alignment(Alignment::Center)
                .render(chunks[1], buf);
        }
    }
}

/// A full-width strip of `height` rows in the vertical middle of `area`.
fn centered(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    Rect {
        y: area.y + (area.height - height) / 2,
        height,
        ..area
    }
}

fn render_lines(lines: Vec<Line>, area: Rect, buf: &mut Buffer) {
    let rect = centered(area, lines.len() as u16);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(rect, buf);
}

fn render_menu(app: &App, area: Rect, buf: &mut Buffer, p: &Palette) {
    let mut lines = vec![
        Line::from(Span::styled("TermTypr", p.magenta)),
        Line::default(),
    ];

    for game in app.router.available_games() {
        let (marker, style) = if game.is_selected {
            ("> ", p.magenta)
        } else {
            ("  ", p.bold)
        };
        lines.push(Line::from(Span::styled(
            format!("{marker}{}. {}", game.index + 1, game.kind),
            style,
        )));
        lines.push(Line::from(Span::styled(game.description, p.italic)));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("Words per game: {}", app.router.preferences().word_count),
        p.dim,
    )));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "↑/↓ choose · enter start · (s)tats · (w)ord count · (q)uit",
        p.italic,
    )));

    render_lines(lines, area, buf);
}

fn current_word_spans(target: &str, input: &str, p: &Palette) -> Vec<Span<'static>> {
    let mut next_char = true;
    target
        .chars()
        .zip_longest(input.chars())
        .map(|pair| match pair {
            EitherOrBoth::Both(t, i) if t == i => Span::styled(t.to_string(), p.green),
            EitherOrBoth::Both(_, i) | EitherOrBoth::Right(i) => Span::styled(i.to_string(), p.red),
            EitherOrBoth::Left(t) => {
                let style = if std::mem::take(&mut next_char) {
                    p.underlined_dim
                } else {
                    p.dim
                };
                Span::styled(t.to_string(), style)
            }
        })
        .collect()
}

fn prompt_spans(data: &DisplayData, p: &Palette) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, target) in data.target_words.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }

        if i < data.current_index {
            let typed = data.typed_words.get(i).map(String::as_str).unwrap_or("");
            let style = if typed == target.as_str() { p.green } else { p.red };
            spans.push(Span::styled(target.clone(), style));
        } else if i == data.current_index {
            spans.extend(current_word_spans(target, data.current_input, p));
        } else {
            spans.push(Span::styled(target.clone(), p.dim));
        }
    }
    spans
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer, p: &Palette) {
    let Some(data) = app.router.display_data() else {
        return;
    };

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_width = data.target_words.iter().map(|w| w.width()).sum::<usize>()
        + data.target_words.len().saturating_sub(1);
    let prompt_lines = prompt_width.div_ceil(max_chars_per_line as usize).max(1) as u16;
    let padding = area.height.saturating_sub(prompt_lines.saturating_add(5)) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(1), // live stats
            Constraint::Length(1),
            Constraint::Length(prompt_lines),
            Constraint::Length(1),
            Constraint::Length(1), // input
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    if let Some(live) = app.live {
        let mut stats = format!(
            "{:.1} wpm   {:.1}% acc   {:.1}s   word {}/{}",
            live.wpm,
            live.accuracy,
            live.elapsed_secs,
            (data.current_index + 1).min(live.total_words),
            live.total_words
        );
        if let Some(best) = app.best_wpm {
            stats.push_str(&format!("   best {best:.1}"));
        }
        Paragraph::new(Span::styled(stats, p.bold))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
    }

    Paragraph::new(Line::from(prompt_spans(&data, p)))
        .alignment(if prompt_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[3], buf);

    Paragraph::new(Line::from(vec![
        Span::styled("> ", p.magenta),
        Span::styled(app.input.as_str(), p.bold),
        Span::styled("_", p.dim),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);

    Paragraph::new(Span::styled(
        "space submit · ← same text · → new text · esc restart/menu",
        p.italic,
    ))
    .render(chunks[7], buf);
}

fn record_lines(outcome: &FinishedGame, p: &Palette) -> Vec<Line<'static>> {
    let wpm = outcome.result.wpm;
    let mut lines = Vec::new();
    match (outcome.record.is_new_record, outcome.record.previous_best) {
        (true, previous) => {
            lines.push(Line::from(Span::styled("NEW RECORD!", p.yellow)));
            if let Some(previous) = previous {
                lines.push(Line::from(Span::styled(
                    format!("Previous best: {previous:.1} WPM"),
                    p.dim,
                )));
                lines.push(Line::from(Span::styled(
                    format!("Improvement: +{:.1} WPM", wpm - previous),
                    p.green,
                )));
            }
        }
        (false, Some(previous)) => {
            lines.push(Line::from(Span::styled(
                format!("Your best: {previous:.1} WPM"),
                p.dim,
            )));
            lines.push(Line::from(Span::styled(
                format!("Difference: -{:.1} WPM", previous - wpm),
                p.red,
            )));
        }
        (false, None) => {}
    }
    lines
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer, p: &Palette) {
    let Some(outcome) = &app.outcome else {
        return;
    };
    let result = &outcome.result;

    let mut lines = vec![
        Line::from(Span::styled(result.game_type.clone(), p.magenta)),
        Line::default(),
        Line::from(Span::styled(
            format!("Words Per Minute: {:.1} WPM", result.wpm),
            p.bold,
        )),
        Line::from(Span::styled(
            format!("Accuracy: {:.1}%", result.accuracy),
            p.bold,
        )),
        Line::from(Span::styled(
            format!("Time: {:.1} seconds", result.duration),
            p.bold,
        )),
        Line::from(Span::styled(
            format!(
                "{}/{} characters correct, {} typos",
                result.correct_characters, result.total_characters, result.error_count
            ),
            p.dim,
        )),
        Line::default(),
    ];
    lines.extend(record_lines(outcome, p));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "(enter) new text / (r)etry same text / (s)tats / (esc) menu",
        p.italic,
    )));

    render_lines(lines, area, buf);
}

fn render_stats(app: &App, area: Rect, buf: &mut Buffer, p: &Palette) {
    if app.records.is_empty() {
        render_lines(
            vec![
                Line::from(Span::styled("No typing test records found.", p.bold)),
                Line::default(),
                Line::from(Span::styled("(esc) back", p.italic)),
            ],
            area,
            buf,
        );
        return;
    }

    let summary = HistorySummary::from_results(&app.records);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2), // summary
            Constraint::Min(6),    // trend
            Constraint::Length(RECENT_ROWS as u16 + 2),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let mut summary_lines = vec![Line::from(Span::styled(
        format!(
            "Tests: {}   Average: {:.1} WPM, {:.1}% accuracy",
            summary.total, summary.average_wpm, summary.average_accuracy
        ),
        p.bold,
    ))];
    if let Some(best) = &summary.best {
        summary_lines.push(Line::from(Span::styled(
            format!(
                "Best: {:.1} WPM, {:.1}% accuracy · {} · {}",
                best.wpm,
                best.accuracy,
                best.game_type,
                best.timestamp.format("%Y-%m-%d")
            ),
            p.yellow,
        )));
    }
    Paragraph::new(summary_lines)
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    if chunks[1].height >= 3 && chunks[1].width >= 10 {
        render_trend(app, chunks[1], buf, p);
    }

    let rows = app.records.iter().rev().take(RECENT_ROWS).map(|r| {
        Row::new(vec![
            Cell::from(r.timestamp.format("%Y-%m-%d %H:%M").to_string()),
            Cell::from(r.game_type.clone()),
            Cell::from(format!("{:.1}", r.wpm)),
            Cell::from(format!("{:.1}%", r.accuracy)),
            Cell::from(format!("{:.1}s", r.duration)),
        ])
    });
    Table::new(
        rows,
        [
            Constraint::Length(17),
            Constraint::Length(14),
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Length(8),
        ],
    )
    .header(Row::new(["Date", "Game", "WPM", "Accuracy", "Time"]).style(p.bold))
    .render(chunks[2], buf);

    Paragraph::new(Span::styled("(esc) back", p.italic)).render(chunks[3], buf);
}

fn render_trend(app: &App, area: Rect, buf: &mut Buffer, p: &Palette) {
    let points = charting::trend_points(&app.records, TREND_LENGTH);
    let (x_bounds, highest_wpm) = charting::chart_bounds(&points);
    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(p.magenta)
        .graph_type(GraphType::Line)
        .data(&points)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("test")
                .bounds(x_bounds)
                .labels(vec![
                    Span::styled(charting::format_label(x_bounds[0]), p.bold),
                    Span::styled(charting::format_label(x_bounds[1]), p.bold),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", p.bold),
                    Span::styled(charting::format_label(highest_wpm), p.bold),
                ]),
        )
        .render(area, buf);
}

fn render_settings(app: &App, area: Rect, buf: &mut Buffer, p: &Palette) {
    render_lines(
        vec![
            Line::from(Span::styled("Words per game", p.bold)),
            Line::default(),
            Line::from(Span::styled(format!("< {} >", app.word_count_draft), p.magenta)),
            Line::from(Span::styled(
                format!("between {MIN_WORD_COUNT} and {MAX_WORD_COUNT}"),
                p.dim,
            )),
            Line::default(),
            Line::from(Span::styled(
                "↑/↓ ±1 · PgUp/PgDn ±10 · enter save · esc cancel",
                p.italic,
            )),
        ],
        area,
        buf,
    );
}
