use std::{io, time::Duration};

use color_eyre::Result;
use compvault_core::component::Component;
use crossterm::{
    event::{self, DisableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Terminal,
};

/// Read-only browser over the decrypted collection.
/// `j`/`k` or the arrow keys move, `q` or `Esc` exits.
pub fn launch(components: &[Component], location: &str) -> Result<()> {
    // Guard restores the terminal even if we early-return.
    let _guard = TerminalGuard::enter()?;
    let mut terminal = _guard.terminal()?;
    let mut state = ListState::default();
    if !components.is_empty() {
        state.select(Some(0));
    }

    loop {
        terminal.draw(|frame| {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(3),
                ])
                .split(frame.area());
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(rows[1]);

            let header = Paragraph::new(Line::from(vec![
                Span::styled(
                    "compvault",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("  {location}  ({} components)", components.len())),
            ]))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title(Span::styled(
                        "Encrypted catalogue",
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    )),
            );
            frame.render_widget(header, rows[0]);

            let items: Vec<ListItem> = components
                .iter()
                .map(|c| {
                    ListItem::new(Line::from(vec![
                        Span::styled(format!("[{}] ", c.kind), Style::default().fg(Color::Yellow)),
                        Span::styled(&c.name, Style::default().add_modifier(Modifier::BOLD)),
                    ]))
                })
                .collect();
            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title("Components"))
                .highlight_style(Style::default().bg(Color::DarkGray))
                .highlight_symbol("> ");
            frame.render_stateful_widget(list, columns[0], &mut state);

            let detail = state
                .selected()
                .and_then(|i| components.get(i))
                .map(detail_lines)
                .unwrap_or_else(|| vec![Line::from("No components yet.")]);
            let detail = Paragraph::new(detail)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("Details"));
            frame.render_widget(detail, columns[1]);

            let footer = Paragraph::new(Line::from(vec![
                Span::styled("j/k", Style::default().fg(Color::Cyan)),
                Span::raw(" move  "),
                Span::styled("q", Style::default().fg(Color::Cyan)),
                Span::raw("/"),
                Span::styled("Esc", Style::default().fg(Color::Cyan)),
                Span::raw(" quit"),
            ]))
            .block(Block::default().borders(Borders::ALL).title("Controls"));
            frame.render_widget(footer, rows[2]);
        })?;

        if event::poll(Duration::from_millis(150))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char('j') | KeyCode::Down => {
                        state.select(step(state.selected(), components.len(), 1))
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        state.select(step(state.selected(), components.len(), -1))
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

/// Move the selection by `delta`, wrapping at both ends.
fn step(selected: Option<usize>, len: usize, delta: isize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let current = selected.unwrap_or(0) as isize;
    Some((current + delta).rem_euclid(len as isize) as usize)
}

fn detail_lines(c: &Component) -> Vec<Line<'_>> {
    let field = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, Style::default().fg(Color::Cyan)),
            Span::raw(value),
        ])
    };
    vec![
        Line::from(Span::styled(
            c.name.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        field("Type:    ", c.kind.clone()),
        field("Version: ", c.version.clone().unwrap_or_else(|| "N/A".into())),
        field("Author:  ", c.author.clone().unwrap_or_else(|| "Unknown".into())),
        field("Created: ", c.created_at.format("%Y-%m-%d %H:%M").to_string()),
        field("Updated: ", c.updated_at.format("%Y-%m-%d %H:%M").to_string()),
        field("Id:      ", c.id.clone()),
        Line::from(""),
        Line::from(
            c.description
                .clone()
                .unwrap_or_else(|| "No description provided".into()),
        ),
    ]
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }

    fn terminal(&self) -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
        let backend = CrosstermBackend::new(io::stdout());
        Ok(Terminal::new(backend)?)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Errors are reported but not propagated from Drop.
        if let Err(err) = disable_raw_mode() {
            eprintln!("failed to disable raw mode: {err}");
        }
        if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture) {
            eprintln!("failed to restore terminal: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use compvault_core::component::ComponentDraft;

    use super::*;

    #[test]
    fn selection_wraps_in_both_directions() {
        assert_eq!(step(Some(0), 3, -1), Some(2));
        assert_eq!(step(Some(2), 3, 1), Some(0));
        assert_eq!(step(None, 3, 1), Some(1));
        assert_eq!(step(Some(0), 0, 1), None);
    }

    #[test]
    fn details_show_placeholders() {
        let c = Component::new(ComponentDraft::new("Case Table", "LWC")).expect("component");
        let text: Vec<String> = detail_lines(&c).iter().map(|l| l.to_string()).collect();
        assert_eq!(text[0], "Case Table");
        assert!(text.iter().any(|l| l == "Version: N/A"));
        assert!(text.iter().any(|l| l == "No description provided"));
    }
}
