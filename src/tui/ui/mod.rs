//! UI module: View components for the TUI.

pub mod form;
pub mod results;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::MedicalTheme;

/// Shown under every screen, whether or not the backend sent its own.
pub const APP_DISCLAIMER: &str = "DISCLAIMER: This tool provides general health information only and does not replace professional medical evaluation.";
pub const EMERGENCY_NOTICE: &str =
    "If you are experiencing a medical emergency, contact your local emergency services immediately.";

/// Placeholder for any empty list or missing section.
pub const NO_DATA: &str = "No data for this section";

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(APP_DISCLAIMER, MedicalTheme::text_muted())]),
        Line::from(vec![Span::styled(EMERGENCY_NOTICE, MedicalTheme::text_muted())]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}

/// Footer line of `[key] description` pairs.
pub(crate) fn key_hints(pairs: &[(&'static str, &'static str)]) -> Line<'static> {
    let spans = pairs
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(format!("[{key}] "), MedicalTheme::key_hint()),
                Span::styled(format!("{desc} "), MedicalTheme::key_desc()),
            ]
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}
