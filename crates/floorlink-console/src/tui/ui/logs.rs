/*
[INPUT]:  In-memory log buffer
[OUTPUT]: Logs panel with the newest lines visible
[POS]:    TUI logs renderer
[UPDATE]: When log presentation changes
*/

use ratatui::layout::Rect;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::super::runtime::LogBufferHandle;
use super::border_style;

pub(super) fn draw_logs(frame: &mut ratatui::Frame, area: Rect, log_buffer: &LogBufferHandle) {
    let lines = log_buffer
        .lock()
        .map(|buffer| buffer.snapshot())
        .unwrap_or_default();

    let visible = area.height.saturating_sub(2) as usize;
    let start = lines.len().saturating_sub(visible);
    let text = lines[start..].join("\n");

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title("Logs");
    frame.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), area);
}
