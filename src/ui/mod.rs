// UI module for rendering the TUI.
// Contains widgets for tabs, leaderboard and run lists, and the help overlay.

mod list;
mod tabs;

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, Tab};
use crate::cache::RunOutcome;
use crate::state::LeaderboardTabState;

/// Main draw function that renders the entire UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Length(1), // Artifact summary
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    tabs::draw_tabs(frame, app, chunks[0]);
    draw_summary_line(frame, app, chunks[1]);

    match app.active_tab {
        Tab::Artifact(i) => draw_leaderboard_tab(frame, &mut app.artifacts[i], chunks[2]),
        Tab::Runs => draw_runs_tab(frame, app, chunks[2]),
    }

    draw_status_bar(frame, app, chunks[3]);

    // Help overlay (rendered last, on top of everything)
    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// One line describing the active artifact or the latest run.
fn draw_summary_line(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let spans = match app.active_tab {
        Tab::Artifact(i) => {
            let tab = &app.artifacts[i];
            vec![
                Span::styled(" file ", dim),
                Span::raw(tab.path.display().to_string()),
                Span::styled("  size ", dim),
                Span::raw(tab.file_size.map_or("-".to_string(), format_size)),
                Span::styled("  updated ", dim),
                Span::raw(tab.last_update.clone().unwrap_or_else(|| "never".to_string())),
                Span::styled("  sort ", dim),
                Span::styled(tab.sort.title(), Style::default().fg(Color::Yellow)),
            ]
        }
        Tab::Runs => match app.runs.runs.data.data().and_then(|runs| runs.first()) {
            Some(last) => vec![
                Span::styled(" last run ", dim),
                Span::raw(list::format_relative_time(&last.finished_at)),
                Span::styled("  outcome ", dim),
                Span::raw(last.outcome.label()),
            ],
            None => vec![Span::styled(" no runs yet", dim)],
        },
    };
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_leaderboard_tab(frame: &mut Frame, tab: &mut LeaderboardTabState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(area);

    let title = format!("{} by {}", tab.title, tab.sort.title());
    list::render_leaderboard_list(frame, &mut tab.rows, &title, chunks[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    draw_model_detail(frame, tab, right[0]);
    draw_best_metrics(frame, tab, right[1]);
}

/// Benchmarks of the selected model.
fn draw_model_detail(frame: &mut Frame, tab: &LeaderboardTabState, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Model ");

    let Some(row) = tab.rows.selected_item() else {
        let text = Paragraph::new("No model selected")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(text, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            row.name.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("parent ", Style::default().fg(Color::DarkGray)),
            Span::raw(row.parent.clone().unwrap_or_else(|| "-".to_string())),
        ]),
        Line::from(""),
    ];
    lines.extend(row.benchmarks.iter().map(|(name, value)| {
        let value = match value.as_f64() {
            Some(v) => format!("{:.4}", v),
            None => format!("{:?}", value),
        };
        Line::from(vec![
            Span::styled(format!("{:<16}", name), Style::default().fg(Color::DarkGray)),
            Span::raw(value),
        ])
    }));

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_best_metrics(frame: &mut Frame, tab: &LeaderboardTabState, area: Rect) {
    let rows: Vec<Row> = tab
        .best
        .iter()
        .map(|best| {
            Row::new(vec![
                Cell::from(format!("{} {}", best.metric, best.direction())),
                Cell::from(best.formatted_value()).style(Style::default().fg(Color::Yellow)),
                Cell::from(best.model.clone()).style(Style::default().fg(Color::Cyan)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Min(8),
        ],
    )
    .block(Block::default().borders(Borders::ALL).title(" Best "));

    frame.render_widget(table, area);
}

fn draw_runs_tab(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(5)])
        .split(area);

    list::render_runs_list(frame, &mut app.runs.runs, chunks[0]);

    let detail = match app.runs.runs.selected_item() {
        Some(run) => {
            let outcome = match &run.outcome {
                RunOutcome::Published { commit } => format!("published {}", commit),
                RunOutcome::Unchanged => "no changes to publish".to_string(),
                RunOutcome::Failed { error } => error.clone(),
            };
            format!(
                "{} run started {}\n{}",
                run.trigger.label(),
                run.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
                outcome
            )
        }
        None => String::new(),
    };

    frame.render_widget(
        Paragraph::new(detail)
            .block(Block::default().borders(Borders::ALL).title(" Detail "))
            .wrap(Wrap { trim: true }),
        chunks[1],
    );
}

/// Draw the status bar with keybinding hints.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut hints = vec![
        Span::raw(" ↑↓ "),
        Span::styled("Navigate", Style::default().fg(Color::DarkGray)),
        Span::raw("  Tab "),
        Span::styled("Switch", Style::default().fg(Color::DarkGray)),
    ];
    if matches!(app.active_tab, Tab::Artifact(_)) {
        hints.push(Span::raw("  s "));
        hints.push(Span::styled("Sort", Style::default().fg(Color::DarkGray)));
    }
    hints.extend([
        Span::raw("  r "),
        Span::styled("Reload", Style::default().fg(Color::DarkGray)),
        Span::raw("  ? "),
        Span::styled("Help", Style::default().fg(Color::DarkGray)),
        Span::raw("  q "),
        Span::styled("Quit", Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

/// Draw the help overlay.
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    let popup_width = 50;
    let popup_height = 14;
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(
        popup_x,
        popup_y,
        popup_width.min(area.width),
        popup_height.min(area.height),
    );

    frame.render_widget(Clear, popup_area);

    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<14}", k), Style::default().fg(Color::Cyan)),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        key("↑/↓ or j/k", "Navigate list"),
        key("Home/End g/G", "Jump to first/last"),
        key("Tab ←/→ h/l", "Switch tabs"),
        key("s", "Cycle leaderboard sort"),
        key("r", "Reload from disk"),
        key("?", "Show/hide this help"),
        key("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::styled(" or ", Style::default().fg(Color::DarkGray)),
            Span::styled("?", Style::default().fg(Color::Yellow)),
            Span::styled(" to close", Style::default().fg(Color::DarkGray)),
        ]),
    ];

    let help_paragraph = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Help ")
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
    );

    frame.render_widget(help_paragraph, popup_area);
}
