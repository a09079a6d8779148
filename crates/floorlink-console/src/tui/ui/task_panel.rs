/*
[INPUT]:  Active task state, capture buffers, quantity input
[OUTPUT]: Step checklist and the prompt/input area
[POS]:    TUI active task renderer
[UPDATE]: When step presentation or the prompt area changes
*/

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use floorlink_adapter::{StepKind, TaskKind};

use crate::capture::InputMode;
use crate::engine::{EngineStatus, Prompt, Step};

use super::super::app::AppState;
use super::border_style;

fn step_title(step: &Step) -> String {
    if let Some(label) = &step.label {
        return label.clone();
    }
    match step.kind {
        StepKind::SelectSource => String::from("select source"),
        StepKind::ScanLocation => format!("scan location {}", step.expected),
        StepKind::ScanProduct => format!("scan product {}", step.expected),
        StepKind::ConfirmQuantity => String::from("confirm quantity"),
    }
}

pub(super) fn draw_task(frame: &mut ratatui::Frame, area: Rect, app: &mut AppState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(5)])
        .split(area);

    draw_checklist(frame, layout[0], app);
    draw_prompt(frame, layout[1], app);
}

fn draw_checklist(frame: &mut ratatui::Frame, area: Rect, app: &AppState) {
    let engine = app.session.engine();
    let Some(task) = engine.task() else {
        let widget = Paragraph::new("no active task").block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style())
                .title("Task"),
        );
        frame.render_widget(widget, area);
        return;
    };

    let kind_label = match task.kind {
        TaskKind::Pick => "pick",
        TaskKind::Relocate => "relocate",
    };
    let title = match &task.description {
        Some(description) => format!("{kind_label} {} - {description}", task.id),
        None => format!("{kind_label} {}", task.id),
    };

    let items: Vec<ListItem> = task
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let (marker, style) = if step.satisfied {
                ("[x]", Style::default().fg(Color::LightGreen))
            } else if index == task.current {
                ("[>]", Style::default().add_modifier(Modifier::BOLD))
            } else {
                ("[ ]", Style::default().fg(Color::DarkGray))
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{marker} "), style),
                Span::styled(step_title(step), style),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title(title);
    frame.render_widget(List::new(items).block(block), area);
}

fn draw_prompt(frame: &mut ratatui::Frame, area: Rect, app: &AppState) {
    let engine = app.session.engine();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title("Input");

    let lines: Vec<Line> = if engine.status() == EngineStatus::Confirming
        || app.session.confirm_in_flight()
    {
        vec![Line::from("confirming...")]
    } else {
        match engine.prompt() {
            Prompt::Scan(_) => {
                let mode = match engine.capture().mode() {
                    InputMode::Scan => "scanner",
                    InputMode::Manual => "manual",
                };
                vec![
                    Line::from(format!("{mode}> {}", engine.capture().pending())),
                    Line::from(Span::styled(
                        "[Tab] entry mode  [Enter] submit (manual)  [<-] back  [Esc] abandon",
                        Style::default().fg(Color::DarkGray),
                    )),
                ]
            }
            Prompt::ChooseSource => {
                let source = engine
                    .task()
                    .map(|task| task.source_id.clone())
                    .unwrap_or_default();
                vec![
                    Line::from(format!("source: {source}")),
                    Line::from(Span::styled(
                        "[Enter] take from this source  [Esc] abandon",
                        Style::default().fg(Color::DarkGray),
                    )),
                ]
            }
            Prompt::Quantity => {
                let max = engine.task().map(|task| task.max_quantity).unwrap_or(0);
                vec![
                    Line::from(format!("quantity (1-{max}): {}", app.quantity.value())),
                    Line::from(Span::styled(
                        "[Enter] confirm  [Esc] abandon",
                        Style::default().fg(Color::DarkGray),
                    )),
                ]
            }
            Prompt::None => vec![Line::from("...")],
        }
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
