/*
[INPUT]:  Published backlog view and selection state
[OUTPUT]: Backlog list panel with completion overlay
[POS]:    TUI backlog renderer
[UPDATE]: When row layout or selection styling changes
*/

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use super::super::app::AppState;
use super::{border_style, header_style, urgent_style};

pub(super) fn draw_backlog(frame: &mut ratatui::Frame, area: Rect, app: &mut AppState) {
    let area = if let Some(note) = app.completion_note.clone() {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(5)])
            .split(area);
        let banner = Paragraph::new(note)
            .style(header_style())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Done"));
        frame.render_widget(banner, split[0]);
        split[1]
    } else {
        area
    };

    let items: Vec<ListItem> = app
        .backlog
        .rows
        .iter()
        .map(|row| {
            let title_style = if row.urgent {
                urgent_style()
            } else {
                Style::default()
            };
            let line = Line::from(vec![
                Span::styled(format!("{:<14}", row.title), title_style),
                Span::raw(format!("{:<26}", row.detail)),
                Span::raw(row.status_label.clone()),
            ]);
            ListItem::new(line)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title(format!("Backlog ({})", app.backlog.rows.len()));

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    if !app.backlog.rows.is_empty() {
        state.select(Some(app.selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
