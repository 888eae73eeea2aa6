// Browser app state and main event loop.
// Manages artifact tabs, the run history tab, and keyboard input handling.

use std::io;
use std::path::PathBuf;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::prelude::*;

use crate::state::{LeaderboardTabState, RunsTabState, SelectableList};
use crate::ui;

/// Active tab in the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Artifact(usize),
    Runs,
}

/// Main application state.
pub struct App {
    /// One tab per artifact file.
    pub artifacts: Vec<LeaderboardTabState>,
    /// Run history tab.
    pub runs: RunsTabState,
    /// Currently active tab.
    pub active_tab: Tab,
    /// Whether the help overlay is visible.
    pub show_help: bool,
    /// Whether the app should exit.
    pub should_quit: bool,
}

impl App {
    pub fn new(artifacts: Vec<(String, PathBuf)>, history_path: Option<PathBuf>) -> Self {
        let artifacts: Vec<LeaderboardTabState> = artifacts
            .into_iter()
            .map(|(title, path)| LeaderboardTabState::new(title, path))
            .collect();
        let active_tab = if artifacts.is_empty() {
            Tab::Runs
        } else {
            Tab::Artifact(0)
        };

        let mut app = Self {
            artifacts,
            runs: RunsTabState::new(history_path),
            active_tab,
            show_help: false,
            should_quit: false,
        };
        app.reload();
        app
    }

    /// All tabs in display order.
    pub fn tabs(&self) -> Vec<Tab> {
        (0..self.artifacts.len())
            .map(Tab::Artifact)
            .chain(std::iter::once(Tab::Runs))
            .collect()
    }

    pub fn tab_title(&self, tab: Tab) -> String {
        match tab {
            Tab::Artifact(i) => self.artifacts[i].title.clone(),
            Tab::Runs => "Runs".to_string(),
        }
    }

    pub fn next_tab(&mut self) {
        let tabs = self.tabs();
        let pos = tabs.iter().position(|t| *t == self.active_tab).unwrap_or(0);
        self.active_tab = tabs[(pos + 1) % tabs.len()];
    }

    pub fn prev_tab(&mut self) {
        let tabs = self.tabs();
        let pos = tabs.iter().position(|t| *t == self.active_tab).unwrap_or(0);
        self.active_tab = tabs[(pos + tabs.len() - 1) % tabs.len()];
    }

    /// Reload every tab from disk.
    pub fn reload(&mut self) {
        for tab in &mut self.artifacts {
            tab.load();
        }
        self.runs.load();
    }

    /// Main event loop.
    pub fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| ui::draw(frame, self))?;
            self.handle_events()?;
        }
        Ok(())
    }

    /// Handle keyboard and other events.
    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(std::time::Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code);
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        if self.show_help {
            if matches!(code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return;
        }

        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => self.next_tab(),
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => self.prev_tab(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('s') => {
                if let Tab::Artifact(i) = self.active_tab {
                    self.artifacts[i].cycle_sort();
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(ListMove::Next),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(ListMove::Prev),
            KeyCode::Home | KeyCode::Char('g') => self.move_selection(ListMove::First),
            KeyCode::End | KeyCode::Char('G') => self.move_selection(ListMove::Last),
            _ => {}
        }
    }

    fn move_selection(&mut self, movement: ListMove) {
        match self.active_tab {
            Tab::Artifact(i) => movement.apply(&mut self.artifacts[i].rows),
            Tab::Runs => movement.apply(&mut self.runs.runs),
        }
    }
}

/// A cursor movement applied to whichever list is active.
#[derive(Debug, Clone, Copy)]
enum ListMove {
    Next,
    Prev,
    First,
    Last,
}

impl ListMove {
    fn apply<T>(self, list: &mut SelectableList<T>) {
        match self {
            ListMove::Next => list.select_next(),
            ListMove::Prev => list.select_prev(),
            ListMove::First => list.select_first(),
            ListMove::Last => list.select_last(),
        }
    }
}
