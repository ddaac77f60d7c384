//! Rendering of every lifecycle state.

use super::controller::{Lifecycle, Session};
use super::theme::Theme;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};
use sshkg_core::list_algorithms;
use sshkg_core::persist::{PRIVATE_KEY_MODE, PUBLIC_KEY_MODE};
use sshkg_core::progress::describe_key;
use std::path::PathBuf;

const APP_NAME: &str = "sshkg";
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Draw the whole screen for the current session.
pub fn render_frame(frame: &mut Frame, session: &Session, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_title(frame, chunks[0], theme);

    match session.lifecycle {
        Lifecycle::AlgorithmSelection => render_selection(frame, chunks[1], session, theme),
        Lifecycle::Confirm => render_confirm(frame, chunks[1], session, theme),
        Lifecycle::Generating | Lifecycle::ProgressComplete => {
            render_progress(frame, chunks[1], session, theme);
        }
        Lifecycle::Complete => render_complete(frame, chunks[1], session, theme),
        Lifecycle::Error => render_error(frame, chunks[1], session, theme),
    }

    let help = Paragraph::new(help_text(session.lifecycle))
        .style(Style::default().fg(theme.help));
    frame.render_widget(help, chunks[2]);
}

fn render_title(frame: &mut Frame, area: Rect, theme: &Theme) {
    let title = Line::from(vec![
        Span::styled(
            format!("{APP_NAME} v{APP_VERSION}"),
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  SSH key pair generator", Style::default().fg(theme.help)),
    ]);
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(theme.help));
    frame.render_widget(Paragraph::new(title).block(block), area);
}

fn render_selection(frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
    let mut lines = vec![
        Line::styled("Select a key algorithm:", Style::default().fg(theme.text)),
        Line::default(),
    ];

    for (i, spec) in list_algorithms().iter().enumerate() {
        let selected = i == session.cursor;
        let (marker, style) = if selected {
            (
                "▶ ",
                Style::default().fg(theme.success).add_modifier(Modifier::BOLD),
            )
        } else {
            ("  ", Style::default().fg(theme.text))
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}{:<8}", spec.algorithm.name()), style),
            Span::styled(spec.description, Style::default().fg(theme.help)),
        ]));
    }

    if !session.message.is_empty() {
        lines.push(Line::default());
        lines.push(Line::styled(
            session.message.clone(),
            Style::default().fg(theme.error),
        ));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_confirm(frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
    let warning = Style::default().fg(theme.warning);
    let mut lines = vec![
        Line::styled(
            "⚠ Key files already exist and will be overwritten:",
            warning.add_modifier(Modifier::BOLD),
        ),
        Line::default(),
    ];
    for path in [&session.private_path, &session.public_path] {
        let exists = path
            .as_ref()
            .is_some_and(|p| session.conflicts.contains(p));
        let note = if exists { "  (exists)" } else { "" };
        lines.push(Line::styled(format!("  {}{note}", display(path)), warning));
    }
    lines.push(Line::default());
    lines.push(Line::styled(
        "Overwrite? (y/n)",
        Style::default().fg(theme.text),
    ));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_progress(frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(area);

    let heading = match session.algorithm {
        Some(algorithm) => format!("Generating {}...", describe_key(algorithm, session.bits)),
        None => "Generating key...".to_string(),
    };
    frame.render_widget(
        Paragraph::new(Line::styled(
            heading,
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        )),
        chunks[0],
    );

    let ratio = session.animation.shown().clamp(0.0, 1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = (ratio * 100.0).round() as u16;
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(theme.success).bg(theme.track))
        .ratio(ratio)
        .label(format!("{percent}%"));
    frame.render_widget(gauge, chunks[1]);

    frame.render_widget(
        Paragraph::new(Line::styled(
            session.message.clone(),
            Style::default().fg(theme.help),
        )),
        chunks[3],
    );
}

fn render_complete(frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
    let label = Style::default().fg(theme.help);
    let value = Style::default().fg(theme.text);

    let mut lines = vec![
        Line::styled(
            "✔ Key pair generated successfully",
            Style::default().fg(theme.success).add_modifier(Modifier::BOLD),
        ),
        Line::default(),
        Line::from(vec![
            Span::styled("Private key: ", label),
            Span::styled(
                format!("{} (permissions {PRIVATE_KEY_MODE:04o})", display(&session.private_path)),
                value,
            ),
        ]),
        Line::from(vec![
            Span::styled("Public key:  ", label),
            Span::styled(
                format!("{} (permissions {PUBLIC_KEY_MODE:04o})", display(&session.public_path)),
                value,
            ),
        ]),
    ];
    if !session.comment.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Comment:     ", label),
            Span::styled(session.comment.clone(), value),
        ]));
    }
    if let Some(result) = &session.result {
        lines.push(Line::from(vec![
            Span::styled("Fingerprint: ", label),
            Span::styled(result.fingerprint.clone(), value),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_error(frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
    let lines = vec![
        Line::styled(
            "✖ Error occurred:",
            Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
        ),
        Line::default(),
        Line::styled(session.message.clone(), Style::default().fg(theme.error)),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn help_text(lifecycle: Lifecycle) -> &'static str {
    match lifecycle {
        Lifecycle::AlgorithmSelection => "↑/k up • ↓/j down • enter select • q quit",
        Lifecycle::Confirm => "y overwrite • n cancel",
        Lifecycle::Generating | Lifecycle::ProgressComplete => "generating, please wait...",
        Lifecycle::Complete | Lifecycle::Error => "press any key to exit",
    }
}

fn display(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map_or_else(|| "-".to_string(), |p| p.display().to_string())
}
