/*
[INPUT]:  AppState and log buffer
[OUTPUT]: Frame rendering dispatch and shared styles
[POS]:    TUI panel renderers
[UPDATE]: When adding panels or changing the layout split
*/

mod backlog;
mod logs;
mod status_bar;
mod task_panel;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};

use super::app::{AppState, View};
use super::runtime::LogBufferHandle;

pub(super) fn draw_ui(frame: &mut ratatui::Frame, app: &mut AppState, log_buffer: &LogBufferHandle) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(4)])
        .split(area);

    match app.view {
        View::Backlog => backlog::draw_backlog(frame, layout[0], app),
        View::Task => task_panel::draw_task(frame, layout[0], app),
        View::Logs => logs::draw_logs(frame, layout[0], log_buffer),
    }

    status_bar::draw_footer(frame, layout[1], app);
}

pub(crate) fn border_style() -> Style {
    Style::default().fg(Color::Cyan)
}

pub(crate) fn header_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

pub(crate) fn urgent_style() -> Style {
    Style::default()
        .fg(Color::LightRed)
        .add_modifier(Modifier::BOLD)
}
