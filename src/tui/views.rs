//! TUI Views
//!
//! Rendering for the login screen, the sidebar and each page. Views only
//! read `AppState`; they never change it.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span, Text},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph, Wrap},
};

use super::colors;
use super::state::{AFFORD_FIELDS, AppState, Focus};
use crate::content::{self, Page};
use crate::data::PriceTrend;
use crate::format;
use crate::query::Answer;

/// Render the whole screen.
pub fn render(state: &AppState, frame: &mut Frame) {
    if !state.session.authenticated {
        render_login(state, frame, frame.area());
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(5), Constraint::Length(1)])
        .split(frame.area());

    render_header(state, frame, rows[0]);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(20)])
        .split(rows[1]);

    render_sidebar(state, frame, cols[0]);
    match state.page {
        Page::Main => render_main(state, frame, cols[1]),
        Page::Affordability => render_afford(state, frame, cols[1]),
        Page::GeneralQuery => render_query(state, frame, cols[1]),
        Page::AboutUs | Page::Methodology => render_static(state, frame, cols[1]),
    }

    render_footer(state, frame, rows[2]);
}

fn focused_block(title: &str, focused: bool) -> Block<'static> {
    let border = if focused { colors::FOCUS } else { colors::DIM };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(format!(" {} ", title))
}

fn render_login(state: &AppState, frame: &mut Frame, area: Rect) {
    let popup = centered(area, 50, 9);
    let mut lines = vec![
        Line::from(Span::styled(
            "HDB Resale Advisor",
            Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(vec![
            Span::raw("Enter password: "),
            Span::raw(state.login.password.masked()),
            Span::styled("_", Style::default().fg(colors::DIM)),
        ]),
        Line::raw(""),
    ];
    if let Some(error) = &state.login.error {
        lines.push(Line::from(Span::styled(error.as_str(), Style::default().fg(colors::ERROR))));
    }
    lines.push(Line::from(Span::styled(
        "Enter login  Esc clear  Ctrl-C quit",
        Style::default().fg(colors::DIM),
    )));

    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(focused_block("Login", true));
    frame.render_widget(widget, popup);
}

fn render_header(state: &AppState, frame: &mut Frame, area: Rect) {
    let llm = if state.llm_available { "LLM ready" } else { "LLM offline" };
    let line = Line::from(vec![
        Span::styled(
            " HDB Resale Advisor ",
            Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("│ {} rows │ {}", format::thousands(state.rows_loaded as u64), llm),
            Style::default().fg(colors::DIM),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_sidebar(state: &AppState, frame: &mut Frame, area: Rect) {
    let items: Vec<ListItem> = Page::ALL
        .iter()
        .map(|page| {
            let selected = *page == state.page;
            let style = if selected {
                Style::default().fg(colors::SELECTED).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let marker = if selected { "▸ " } else { "  " };
            ListItem::new(Line::from(vec![Span::raw(marker), Span::raw(page.title())])).style(style)
        })
        .collect();

    let list = List::new(items).block(focused_block("Navigation", state.focus == Focus::Sidebar));
    frame.render_widget(list, area);
}

fn render_footer(state: &AppState, frame: &mut Frame, area: Rect) {
    let line = match &state.status_message {
        Some(message) => Line::from(Span::styled(message.as_str(), Style::default().fg(colors::STATUS))),
        None => {
            let hint = match (state.focus, state.page) {
                (Focus::Sidebar, _) => "↑↓ page  Enter open  Tab focus  q quit",
                (Focus::Content, Page::Affordability) => "↑↓ field  Space toggle advice  Enter calculate  Esc back",
                (Focus::Content, Page::GeneralQuery) => "Enter ask  ↑↓ scroll  Esc back  Ctrl-C quit",
                (Focus::Content, _) => "↑↓ scroll  Esc back  q quit",
            };
            Line::from(Span::styled(hint, Style::default().fg(colors::KEYBIND)))
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_main(state: &AppState, frame: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            content::DISCLAIMER,
            Style::default().fg(colors::WARNING).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw(content::DISCLAIMER_DETAIL),
        Line::raw(""),
    ];
    lines.extend(styled_sections(&content::buying_guide()));
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((state.scroll, 0))
        .block(focused_block("Main", state.focus == Focus::Content));
    frame.render_widget(widget, area);
}

fn render_static(state: &AppState, frame: &mut Frame, area: Rect) {
    let body = state.page.static_text().unwrap_or_default();
    let widget = Paragraph::new(styled_sections(body))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll, 0))
        .block(focused_block(state.page.title(), state.focus == Focus::Content));
    frame.render_widget(widget, area);
}

/// One line per text line, with `## ` headings highlighted.
fn styled_sections(body: &str) -> Vec<Line<'static>> {
    body.lines()
        .map(|line| match line.strip_prefix("## ") {
            Some(heading) => Line::from(Span::styled(
                heading.to_string(),
                Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
            )),
            None => Line::raw(line.to_string()),
        })
        .collect()
}

fn render_afford(state: &AppState, frame: &mut Frame, area: Rect) {
    let form = &state.afford;
    let focused = state.focus == Focus::Content;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(form.rows() as u16 + 2), Constraint::Min(3)])
        .split(area);

    let mut lines: Vec<Line> = AFFORD_FIELDS
        .iter()
        .zip(form.fields.iter())
        .enumerate()
        .map(|(i, (label, field))| {
            let selected = focused && form.selected == i;
            let style = if selected {
                Style::default().fg(colors::SELECTED).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let cursor = if selected { "_" } else { "" };
            Line::from(vec![
                Span::styled(format!("{:<30}", label), style),
                Span::raw(field.content().to_string()),
                Span::styled(cursor, Style::default().fg(colors::DIM)),
            ])
        })
        .collect();
    let toggle_style = if focused && form.on_toggle() {
        Style::default().fg(colors::SELECTED).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    lines.push(Line::from(Span::styled(
        format!("{:<30}[{}]", "Ask for advice", if form.want_advice { "x" } else { " " }),
        toggle_style,
    )));

    frame.render_widget(
        Paragraph::new(lines).block(focused_block("HDB Resale Housing Affordability Calculator", focused)),
        chunks[0],
    );

    let mut out: Vec<Line> = Vec::new();
    if let Some(error) = &form.error {
        out.push(Line::from(Span::styled(error.as_str(), Style::default().fg(colors::ERROR))));
    }
    if let Some(result) = &form.result {
        out.push(Line::from(Span::styled(
            result.headline(),
            Style::default().fg(colors::SUCCESS).add_modifier(Modifier::BOLD),
        )));
        out.push(Line::raw(format!("Maximum loan: {}", format::currency(result.max_loan))));
    }
    if let Some(market) = &form.market {
        out.push(Line::raw(""));
        out.push(Line::raw(market.summary_line()));
    }
    if let Some(advice) = &form.advice {
        out.push(Line::raw(""));
        out.extend(advice.lines().map(|l| Line::raw(l.to_string())));
    }
    frame.render_widget(
        Paragraph::new(out)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" Result ")),
        chunks[1],
    );
}

fn render_query(state: &AppState, frame: &mut Frame, area: Rect) {
    let page = &state.query;
    let focused = state.focus == Focus::Content;
    let trend = match &page.answer {
        Some(Answer::Trend { trend, .. }) => Some(trend),
        _ => None,
    };

    let mut constraints = vec![Constraint::Length(3), Constraint::Min(3)];
    if trend.is_some() {
        constraints.push(Constraint::Percentage(50));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let input = Paragraph::new(Line::from(vec![
        Span::raw(page.input.content().to_string()),
        Span::styled(if focused { "_" } else { "" }, Style::default().fg(colors::DIM)),
    ]))
    .block(focused_block("Enter your query about the HDB resale market", focused));
    frame.render_widget(input, chunks[0]);

    let body: Text = match (&page.error, &page.answer) {
        (Some(error), _) => Text::from(Line::from(Span::styled(error.as_str(), Style::default().fg(colors::ERROR)))),
        (None, Some(answer)) => Text::from(answer.to_string()),
        (None, None) => Text::from(Span::styled(
            "Ask about average prices, price trends, towns or flat types.",
            Style::default().fg(colors::DIM),
        )),
    };
    let title = match (&page.answer, &page.last_query) {
        (Some(Answer::Llm { .. }), _) => "Response".to_string(),
        (Some(Answer::Rows { .. }), _) => "Search Results".to_string(),
        (Some(_), Some(query)) => format!("Answer: {}", query),
        _ => "Answer".to_string(),
    };
    frame.render_widget(
        Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .scroll((page.scroll, 0))
            .block(Block::default().borders(Borders::ALL).title(format!(" {} ", title))),
        chunks[1],
    );

    if let Some(trend) = trend {
        render_trend_chart(trend, frame, chunks[2]);
    }
}

/// Points for the trend chart: x is months since the first point.
pub fn chart_points(trend: &PriceTrend) -> Vec<(f64, f64)> {
    let Some(first) = trend.points.first() else {
        return Vec::new();
    };
    let origin = month_index(first.month);
    trend
        .points
        .iter()
        .map(|p| ((month_index(p.month) - origin) as f64, p.mean_price))
        .collect()
}

fn month_index(month: chrono::NaiveDate) -> i32 {
    use chrono::Datelike;
    month.year() * 12 + month.month0() as i32
}

fn render_trend_chart(trend: &PriceTrend, frame: &mut Frame, area: Rect) {
    let points = chart_points(trend);
    let (Some(first), Some(last)) = (trend.points.first(), trend.points.last()) else {
        return;
    };
    let x_max = points.last().map(|p| p.0).unwrap_or(0.0).max(1.0);
    let (y_min, y_max) = points
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
    let pad = ((y_max - y_min) * 0.05).max(1000.0);

    let dataset = Dataset::default()
        .name("mean resale price")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(Block::default().borders(Borders::ALL).title(" Price Trend "))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(colors::DIM))
                .bounds([0.0, x_max])
                .labels([
                    first.month.format("%Y-%m").to_string(),
                    last.month.format("%Y-%m").to_string(),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(colors::DIM))
                .bounds([y_min - pad, y_max + pad])
                .labels([format::currency_whole(y_min), format::currency_whole(y_max)]),
        );
    frame.render_widget(chart, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
