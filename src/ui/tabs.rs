// Header bar listing one tab per artifact plus the run history.
// The Runs tab carries a red failure count while any recorded run failed.

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, Tab};

/// Label and style for one tab header.
fn tab_label(app: &App, tab: Tab, failed: usize) -> Line<'static> {
    let active = tab == app.active_tab;
    let mut spans = vec![Span::raw(app.tab_title(tab))];

    if tab == Tab::Runs && failed > 0 {
        spans.push(Span::styled(
            format!(" !{}", failed),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let style = if active {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Line::from(spans).style(style)
}

pub fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tabs = app.tabs();
    let failed = app.runs.failed_count();

    let header = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Line::from(" cache-sync ").cyan().bold());

    let widget = Tabs::new(tabs.iter().map(|tab| tab_label(app, *tab, failed)))
        .block(header)
        .select(tabs.iter().position(|t| *t == app.active_tab).unwrap_or(0))
        .highlight_style(Style::default().fg(Color::Yellow))
        .divider(Span::styled(" · ", Style::default().fg(Color::DarkGray)));

    frame.render_widget(widget, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_label_shows_failures() {
        let app = App::new(Vec::new(), None);

        let line = tab_label(&app, Tab::Runs, 2);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "Runs !2");

        let quiet = tab_label(&app, Tab::Runs, 0);
        assert_eq!(quiet.spans.len(), 1);
    }
}
