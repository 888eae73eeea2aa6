// List rendering for leaderboard rows and run history.
// Provides styled list views with error and empty states.

use chrono::{DateTime, Utc};
use ratatui::{prelude::*, widgets::*};

use crate::cache::{RunOutcome, RunRecord};
use crate::report::LeaderboardRow;
use crate::schedule::Trigger;
use crate::state::{LoadingState, SelectableList};

/// Format a timestamp as relative time (e.g., "2h ago").
pub fn format_relative_time(dt: &DateTime<Utc>) -> String {
    format_relative_time_from(dt, Utc::now())
}

fn format_relative_time_from(dt: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(*dt);

    if duration.num_days() > 0 {
        format!("{}d ago", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m ago", duration.num_minutes())
    } else {
        "just now".to_string()
    }
}

fn format_metric(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

fn outcome_color(outcome: &RunOutcome) -> Color {
    match outcome {
        RunOutcome::Published { .. } => Color::Green,
        RunOutcome::Unchanged => Color::Gray,
        RunOutcome::Failed { .. } => Color::Red,
    }
}

/// Render an error message.
pub fn render_error(frame: &mut Frame, area: Rect, error: &str) {
    let text = Paragraph::new(format!("❌ {}", error))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Red))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(text, area);
}

/// Render an empty state message.
pub fn render_empty(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(text, area);
}

fn highlighted(list: List<'_>) -> List<'_> {
    list.highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ")
}

/// Render leaderboard rows.
pub fn render_leaderboard_list(
    frame: &mut Frame,
    list: &mut SelectableList<LeaderboardRow>,
    title: &str,
    area: Rect,
) {
    match &list.data {
        LoadingState::Idle => render_empty(frame, area, "Press r to load"),
        LoadingState::Error(e) => render_error(frame, area, e),
        LoadingState::Loaded(rows) => {
            if rows.is_empty() {
                render_empty(frame, area, "No models cached yet");
                return;
            }

            let items: Vec<ListItem> = rows
                .iter()
                .map(|row| {
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            format!("{:>5} ", row.index),
                            Style::default().fg(Color::DarkGray),
                        ),
                        Span::styled(
                            format!("{:<28}", row.name),
                            Style::default().fg(Color::Cyan),
                        ),
                        Span::raw(format!(" score {:>10}", format_metric(row.score, 6))),
                        Span::styled(
                            format!("  loss {:>8}", format_metric(row.loss, 4)),
                            Style::default().fg(Color::Yellow),
                        ),
                        Span::raw(format!("  test {:>7}", format_metric(row.test_mean, 4))),
                    ]))
                })
                .collect();

            let list_widget =
                highlighted(List::new(items).block(Block::default().borders(Borders::ALL).title(
                    format!(" {} ({}) ", title, rows.len()),
                )));

            frame.render_stateful_widget(list_widget, area, &mut list.list_state);
        }
    }
}

fn trigger_icon(trigger: Trigger) -> &'static str {
    match trigger {
        Trigger::Scheduled => "⏰",
        Trigger::Manual => "▶",
    }
}

/// Render run history, newest first.
pub fn render_runs_list(frame: &mut Frame, list: &mut SelectableList<RunRecord>, area: Rect) {
    match &list.data {
        LoadingState::Idle => render_empty(frame, area, "Press r to load"),
        LoadingState::Error(e) => render_error(frame, area, e),
        LoadingState::Loaded(runs) => {
            if runs.is_empty() {
                render_empty(frame, area, "No runs recorded");
                return;
            }

            let items: Vec<ListItem> = runs
                .iter()
                .map(|run| {
                    let detail = match &run.outcome {
                        RunOutcome::Published { commit } => {
                            commit.chars().take(7).collect::<String>()
                        }
                        RunOutcome::Unchanged => String::new(),
                        RunOutcome::Failed { error } => error.clone(),
                    };
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("{} ", trigger_icon(run.trigger))),
                        Span::styled(
                            format!("{:<10}", run.outcome.label()),
                            Style::default().fg(outcome_color(&run.outcome)),
                        ),
                        Span::styled(
                            format!(
                                " {:>9}  {:>4}s  ",
                                format_relative_time(&run.finished_at),
                                run.duration().num_seconds()
                            ),
                            Style::default().fg(Color::DarkGray),
                        ),
                        Span::raw(detail),
                    ]))
                })
                .collect();

            let list_widget = highlighted(
                List::new(items).block(Block::default().borders(Borders::ALL).title(" Runs ")),
            );

            frame.render_stateful_widget(list_widget, area, &mut list.list_state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_relative_time() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();

        assert_eq!(format_relative_time_from(&now, now), "just now");
        assert_eq!(
            format_relative_time_from(&(now - Duration::minutes(5)), now),
            "5m ago"
        );
        assert_eq!(
            format_relative_time_from(&(now - Duration::hours(3)), now),
            "3h ago"
        );
        assert_eq!(
            format_relative_time_from(&(now - Duration::days(2)), now),
            "2d ago"
        );
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(Some(0.5), 4), "0.5000");
        assert_eq!(format_metric(None, 4), "-");
    }
}
