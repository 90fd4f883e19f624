use chrono::Utc;
use tuirealm::ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

use crate::activity::format::relative_time;
use crate::api::BoardApi;
use crate::app::{App, HitTarget, InteractionLayer};
use crate::drag::{DragSession, DropTargets};
use crate::geometry::Region;
use crate::notification::ToastLevel;
use crate::panel::PanelMode;
use crate::theme::Theme;
use crate::types::{Task, TaskStatus};

const CARD_HEIGHT: u16 = 4;
const PANEL_WIDTH: u16 = 44;
const PANEL_HEIGHT: u16 = 18;
const LIVE_BUTTON: &str = "[LIVE]";
const PANEL_BUTTONS: &str = "[_][x]";

pub fn render<A: BoardApi>(frame: &mut Frame<'_>, app: &mut App<A>) {
    app.interaction_map.clear();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);
    render_columns(frame, chunks[1], app);
    render_drag_ghost(frame, chunks[1], app);
    render_activity_panel(frame, chunks[1], app);
    render_footer(frame, chunks[2], app);
}

fn render_header<A: BoardApi>(frame: &mut Frame<'_>, area: Rect, app: &App<A>) {
    let theme = app.theme();
    let board = app.board();
    let title = board.project_name().unwrap_or("Loading...");

    let mut left = vec![
        Span::styled(" teamboard ", Style::default().fg(theme.base.accent)),
        Span::styled(
            title.to_string(),
            Style::default()
                .fg(theme.base.header)
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if app.is_read_only() {
        left.push(Span::styled(
            "  read-only",
            Style::default().fg(theme.base.text_muted),
        ));
    }
    if board.last_error().is_some() {
        left.push(Span::styled(
            "  sync failed",
            Style::default().fg(theme.base.danger),
        ));
    }

    let summary = board.summary();
    let right = format!(
        "{} to do · {} doing · {} done · {:.1}% complete ",
        summary.todo, summary.in_progress, summary.done, summary.completion_rate
    );

    frame.render_widget(Paragraph::new(Line::from(left)), area);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            right,
            Style::default().fg(theme.base.text_muted),
        )))
        .alignment(Alignment::Right),
        area,
    );
}

fn render_columns<A: BoardApi>(frame: &mut Frame<'_>, area: Rect, app: &mut App<A>) {
    let column_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(area);

    let targets = TaskStatus::ALL
        .iter()
        .zip(column_areas.iter())
        .map(|(status, rect)| (*status, Region::from(*rect)))
        .collect();
    app.board.drag_mut().set_drop_targets(DropTargets::new(targets));

    let theme = *app.theme();
    let selected = app.selected_task;
    let session = app.board.drag().session().cloned();
    let hovered_column = session.as_ref().and_then(|session| session.over);

    for (status, tasks) in app.board.columns().iter() {
        let column_area = column_areas[status.index()];
        let is_hovered = hovered_column == Some(status);
        let accent = theme.column_accent(status);

        let (border_type, border_color) = if is_hovered {
            (BorderType::Double, theme.interactive.drop_target)
        } else {
            (BorderType::Rounded, theme.interactive.border)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(border_type)
            .border_style(Style::default().fg(border_color))
            .title(Line::from(Span::styled(
                format!(" {} ({}) ", status.label(), tasks.len()),
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            )))
            .title_alignment(Alignment::Center);
        let inner = block.inner(column_area);

        let capacity = usize::from(inner.height / CARD_HEIGHT);
        let offset = app.column_scroll[status.index()].min(tasks.len().saturating_sub(capacity));
        app.column_scroll[status.index()] = offset;
        let below = tasks.len().saturating_sub(offset + capacity);
        let block = if offset > 0 || below > 0 {
            block.title_bottom(
                Line::from(Span::styled(
                    format!(" {offset} above · {below} below "),
                    Style::default().fg(theme.base.text_muted),
                ))
                .centered(),
            )
        } else {
            block
        };

        frame.render_widget(block, column_area);
        app.interaction_map
            .register(InteractionLayer::Base, column_area, HitTarget::Column(status));

        if tasks.is_empty() {
            let (label, color) = if is_hovered {
                ("DROP HERE", theme.interactive.drop_target)
            } else {
                ("EMPTY", theme.base.text_muted)
            };
            let middle = Rect {
                y: inner.y + inner.height / 2,
                height: inner.height.min(1),
                ..inner
            };
            frame.render_widget(
                Paragraph::new(label)
                    .style(Style::default().fg(color))
                    .alignment(Alignment::Center),
                middle,
            );
            continue;
        }

        for (index, task) in tasks.iter().skip(offset).take(capacity).enumerate() {
            let card = Rect::new(
                inner.x,
                inner.y + index as u16 * CARD_HEIGHT,
                inner.width,
                CARD_HEIGHT,
            );
            let style = CardStyle {
                selected: selected == Some(task.id),
                pending: app.board.is_pending(task.id),
                lifted: session.as_ref().is_some_and(|s| s.task_id == task.id),
            };
            render_card(frame, card, task, &theme, style);
            app.interaction_map.register(
                InteractionLayer::Base,
                card,
                HitTarget::TaskCard {
                    task_id: task.id,
                    origin: (card.x, card.y),
                },
            );
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CardStyle {
    selected: bool,
    pending: bool,
    /// Source of an active drag; drawn dimmed while the ghost moves.
    lifted: bool,
}

fn render_card(frame: &mut Frame<'_>, area: Rect, task: &Task, theme: &Theme, style: CardStyle) {
    let colors = theme.tile_colors(style.selected);
    let mut title = task.title.clone();
    if style.pending {
        title.push_str(" …");
    }

    let mut text_style = Style::default().fg(theme.base.text).bg(colors.background);
    let mut border_style = Style::default().fg(colors.border);
    if style.lifted {
        text_style = text_style.add_modifier(Modifier::DIM);
        border_style = border_style.add_modifier(Modifier::DIM);
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border_style)
        .style(text_style);
    let lines = vec![
        Line::from(Span::styled(title, text_style.add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(
            task.assignee_summary(),
            text_style.fg(theme.base.text_muted),
        )),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_drag_ghost<A: BoardApi>(frame: &mut Frame<'_>, bounds: Rect, app: &App<A>) {
    let Some(session) = app.board().drag().session() else {
        return;
    };
    let Some(task) = app.board().task(session.task_id) else {
        return;
    };

    let width = (bounds.width / 3).saturating_sub(2).max(1);
    let ghost = ghost_rect(session, width, bounds);
    if ghost.is_empty() {
        return;
    }

    let theme = app.theme();
    frame.render_widget(Clear, ghost);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(theme.interactive.drop_target));
    let lines = vec![
        Line::from(Span::styled(
            task.title.clone(),
            Style::default()
                .fg(theme.base.text)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            task.assignee_summary(),
            Style::default().fg(theme.base.text_muted),
        )),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), ghost);
}

fn ghost_rect(session: &DragSession, width: u16, bounds: Rect) -> Rect {
    let position = session.card_position();
    region_to_rect(
        Region::new(position.x, position.y, f32::from(width), f32::from(CARD_HEIGHT)),
        bounds,
    )
}

fn render_activity_panel<A: BoardApi>(frame: &mut Frame<'_>, area: Rect, app: &mut App<A>) {
    let theme = *app.theme();
    let width = PANEL_WIDTH.min(area.width);
    let expanded_height = PANEL_HEIGHT.min(area.height);

    let Some(region) = app.panel.frame(
        Region::from(area),
        f32::from(width),
        f32::from(expanded_height),
    ) else {
        app.panel_origin = None;
        render_live_button(frame, area, app, &theme);
        return;
    };
    app.panel_origin = Some(region.origin());
    let rect = region_to_rect(region, area);
    if rect.is_empty() {
        return;
    }

    let activity = app.activity();
    let offline = activity.last_error().is_some();
    let mut title = vec![Span::styled(
        " Live Activity ",
        Style::default()
            .fg(theme.base.header)
            .add_modifier(Modifier::BOLD),
    )];
    if offline {
        title.push(Span::styled(
            "offline ",
            Style::default()
                .fg(theme.base.text_muted)
                .add_modifier(Modifier::DIM),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.interactive.focus))
        .style(Style::default().bg(theme.base.surface))
        .title(Line::from(title))
        .title(
            Line::from(Span::styled(
                PANEL_BUTTONS,
                Style::default().fg(theme.base.text_muted),
            ))
            .alignment(Alignment::Right),
        );
    let inner = block.inner(rect);

    frame.render_widget(Clear, rect);
    frame.render_widget(block, rect);

    let body = match app.panel().mode() {
        PanelMode::Expanded => activity_lines(app, &theme),
        PanelMode::Minimized => minimized_line(app, &theme),
        PanelMode::Hidden => Vec::new(),
    };
    frame.render_widget(Paragraph::new(body).wrap(Wrap { trim: true }), inner);

    // Body first so the header and its buttons resolve above it.
    let map = &mut app.interaction_map;
    map.register(InteractionLayer::Overlay, rect, HitTarget::PanelBody);
    map.register(
        InteractionLayer::Overlay,
        Rect { height: 1, ..rect },
        HitTarget::PanelHeader,
    );
    let buttons_x = rect
        .right()
        .saturating_sub(1 + PANEL_BUTTONS.len() as u16)
        .max(rect.x);
    map.register(
        InteractionLayer::Overlay,
        Rect::new(buttons_x, rect.y, 3, 1).intersection(rect),
        HitTarget::PanelMinimize,
    );
    map.register(
        InteractionLayer::Overlay,
        Rect::new(buttons_x + 3, rect.y, 3, 1).intersection(rect),
        HitTarget::PanelHide,
    );
}

fn activity_lines<A: BoardApi>(app: &App<A>, theme: &Theme) -> Vec<Line<'static>> {
    let activity = app.activity();
    let muted = Style::default().fg(theme.base.text_muted);

    if !activity.is_loaded() {
        return vec![Line::from(Span::styled("Loading...", muted))];
    }
    if activity.events().is_empty() {
        return vec![Line::from(Span::styled("No activity yet", muted))];
    }

    let now = Utc::now();
    let mut lines = Vec::with_capacity(activity.events().len() * 2);
    for event in activity.events() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", event.action.glyph()),
                Style::default().fg(theme.activity_color(event.action)),
            ),
            Span::styled(
                event.user_name.clone(),
                Style::default()
                    .fg(theme.base.text)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {}", event.description),
                Style::default().fg(theme.base.text),
            ),
        ]));
        lines.push(Line::from(Span::styled(
            format!("  {}", relative_time(event.created_at, now)),
            muted,
        )));
    }
    lines
}

fn minimized_line<A: BoardApi>(app: &App<A>, theme: &Theme) -> Vec<Line<'static>> {
    let muted = Style::default().fg(theme.base.text_muted);
    let text = match app.activity().events().first() {
        Some(latest) => format!("{} {}", latest.user_name, latest.description),
        None if app.activity().is_loaded() => "No activity yet".to_string(),
        None => "Loading...".to_string(),
    };
    vec![Line::from(Span::styled(text, muted))]
}

fn render_live_button<A: BoardApi>(
    frame: &mut Frame<'_>,
    area: Rect,
    app: &mut App<A>,
    theme: &Theme,
) {
    let width = (LIVE_BUTTON.len() as u16).min(area.width);
    if width == 0 || area.height == 0 {
        return;
    }
    let rect = Rect::new(
        area.right().saturating_sub(width + 1).max(area.x),
        area.bottom() - 1,
        width,
        1,
    );
    let hovered = app.hovered() == Some(HitTarget::PanelShow);
    let color = if hovered {
        theme.interactive.focus
    } else {
        theme.base.accent
    };
    frame.render_widget(
        Paragraph::new(LIVE_BUTTON).style(Style::default().fg(color).add_modifier(Modifier::BOLD)),
        rect,
    );
    app.interaction_map
        .register(InteractionLayer::Overlay, rect, HitTarget::PanelShow);
}

fn render_footer<A: BoardApi>(frame: &mut Frame<'_>, area: Rect, app: &App<A>) {
    let theme = app.theme();

    let line = if let Some(toast) = app.toast() {
        let color = match toast.level {
            ToastLevel::Success => theme.base.success,
            ToastLevel::Error => theme.base.danger,
        };
        Line::from(vec![
            Span::styled(
                format!(" {} ", toast.title),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(toast.message.clone(), Style::default().fg(theme.base.text)),
        ])
    } else if let Some(task) = app.selected_task().and_then(|id| app.board().task(id)) {
        let status = task.status.map_or("Unknown", TaskStatus::label);
        Line::from(vec![
            Span::styled(
                format!(" #{} ", task.id),
                Style::default().fg(theme.base.accent),
            ),
            Span::styled(
                task.title.clone(),
                Style::default()
                    .fg(theme.base.text)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" · {status} · {}", task.assignee_summary()),
                Style::default().fg(theme.base.text_muted),
            ),
        ])
    } else {
        Line::from(Span::styled(
            " drag: move task  a: activity  m: minimize  r: refresh  esc: cancel  q: quit",
            Style::default().fg(theme.base.text_muted),
        ))
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// Snaps a floating region to whole cells inside `bounds`.
fn region_to_rect(region: Region, bounds: Rect) -> Rect {
    let x = region.x.round().max(0.0) as u16;
    let y = region.y.round().max(0.0) as u16;
    let width = region.width.round().max(0.0) as u16;
    let height = region.height.round().max(0.0) as u16;
    Rect::new(x, y, width, height).intersection(bounds)
}
