/*
[INPUT]:  AppState status message, badge counter, active view
[OUTPUT]: Footer with hotkeys and status line
[POS]:    TUI footer renderer
[UPDATE]: When hotkeys or footer content change
*/

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::super::app::{AppState, View};
use super::border_style;

pub(super) fn draw_footer(frame: &mut ratatui::Frame, area: Rect, app: &AppState) {
    let key_style = Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let line1 = match app.view {
        View::Backlog => Line::from(vec![
            Span::styled("[Up/Down]", key_style),
            Span::raw(" Select  "),
            Span::styled("[Enter]", key_style),
            Span::raw(" Open  "),
            Span::styled("[v]", key_style),
            Span::raw(" Relocations  "),
            Span::styled("[r]", key_style),
            Span::raw(" Refresh  "),
            Span::styled("[l]", key_style),
            Span::raw(" Logs  "),
            Span::styled("[q]", key_style),
            Span::raw(" Quit"),
        ]),
        View::Task => Line::from(vec![
            Span::styled("[Tab]", key_style),
            Span::raw(" Entry mode  "),
            Span::styled("[Enter]", key_style),
            Span::raw(" Submit/confirm  "),
            Span::styled("[Esc]", key_style),
            Span::raw(" Abandon"),
        ]),
        View::Logs => Line::from(vec![
            Span::styled("[q/Esc]", key_style),
            Span::raw(" Back"),
        ]),
    };

    let line2 = Line::from(vec![
        Span::raw(format!("confirmed: {}  ", app.confirmed_count)),
        Span::raw(format!("status: {}", app.status_message)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title("Hotkeys");
    let widget = Paragraph::new(Text::from(vec![line1, line2]))
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}
