//! Symptom input form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::{Choice, DurationBucket, Gender, Session, Severity, SymptomForm};
use crate::tui::styles::MedicalTheme;
use crate::tui::worker::BackendStatus;

use super::key_hints;

/// Form field definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Symptom,
    Duration,
    Severity,
    AdditionalInfo,
    Age,
    Gender,
    MedicalHistory,
}

impl FormField {
    const BASIC: &'static [Self] = &[
        Self::Symptom,
        Self::Duration,
        Self::Severity,
        Self::AdditionalInfo,
    ];

    const ENHANCED: &'static [Self] = &[
        Self::Symptom,
        Self::Duration,
        Self::Severity,
        Self::AdditionalInfo,
        Self::Age,
        Self::Gender,
        Self::MedicalHistory,
    ];

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Symptom => "Symptom *",
            Self::Duration => "Duration",
            Self::Severity => "Severity",
            Self::AdditionalInfo => "Additional Information",
            Self::Age => "Age",
            Self::Gender => "Gender",
            Self::MedicalHistory => "Medical History",
        }
    }

    #[must_use]
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Symptom => "e.g. headache, sore throat, fatigue",
            Self::Duration | Self::Severity | Self::Gender => "◀ ▶ to choose",
            Self::AdditionalInfo => "anything else worth mentioning",
            Self::Age => "years (1-120, optional)",
            Self::MedicalHistory => "conditions, medications (optional)",
        }
    }

    #[must_use]
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Duration | Self::Severity | Self::Gender)
    }
}

/// Form navigation state. Values live in the session's `SymptomForm`.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub selected_field: usize,
    /// Show the optional personal fields.
    pub enhanced: bool,
}

impl FormState {
    #[must_use]
    pub fn fields(&self) -> &'static [FormField] {
        if self.enhanced {
            FormField::ENHANCED
        } else {
            FormField::BASIC
        }
    }

    #[must_use]
    pub fn current(&self) -> FormField {
        let fields = self.fields();
        fields[self.selected_field.min(fields.len() - 1)]
    }

    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields().len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields().len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Switch between the basic and enhanced layouts.
    ///
    /// Hidden fields keep their values and are still sent.
    pub fn toggle_enhanced(&mut self) {
        self.enhanced = !self.enhanced;
        if self.selected_field >= self.fields().len() {
            self.selected_field = 0;
        }
    }

    /// Add a character to the current field
    pub fn input_char(&self, form: &mut SymptomForm, c: char) {
        match self.current() {
            FormField::Symptom => form.symptom.push(c),
            FormField::AdditionalInfo => form.additional_info.push(c),
            FormField::MedicalHistory => form.medical_history.push(c),
            FormField::Age => {
                if c.is_ascii_digit() && form.age.len() < 3 {
                    form.age.push(c);
                }
            }
            FormField::Duration | FormField::Severity | FormField::Gender => {}
        }
    }

    /// Delete the last character
    pub fn delete_char(&self, form: &mut SymptomForm) {
        if let Some(buf) = text_buffer(form, self.current()) {
            buf.pop();
        }
    }

    /// Clear the current field
    pub fn clear_field(&self, form: &mut SymptomForm) {
        match self.current() {
            FormField::Duration => form.duration = None,
            FormField::Severity => form.severity = None,
            FormField::Gender => form.gender = None,
            field => {
                if let Some(buf) = text_buffer(form, field) {
                    buf.clear();
                }
            }
        }
    }

    pub fn cycle_next(&self, form: &mut SymptomForm) {
        match self.current() {
            FormField::Duration => form.duration = DurationBucket::cycle_next(form.duration),
            FormField::Severity => form.severity = Severity::cycle_next(form.severity),
            FormField::Gender => form.gender = Gender::cycle_next(form.gender),
            _ => {}
        }
    }

    pub fn cycle_prev(&self, form: &mut SymptomForm) {
        match self.current() {
            FormField::Duration => form.duration = DurationBucket::cycle_prev(form.duration),
            FormField::Severity => form.severity = Severity::cycle_prev(form.severity),
            FormField::Gender => form.gender = Gender::cycle_prev(form.gender),
            _ => {}
        }
    }
}

fn text_buffer(form: &mut SymptomForm, field: FormField) -> Option<&mut String> {
    match field {
        FormField::Symptom => Some(&mut form.symptom),
        FormField::AdditionalInfo => Some(&mut form.additional_info),
        FormField::Age => Some(&mut form.age),
        FormField::MedicalHistory => Some(&mut form.medical_history),
        FormField::Duration | FormField::Severity | FormField::Gender => None,
    }
}

fn display_value(form: &SymptomForm, field: FormField) -> Option<String> {
    let choice = |label: Option<&'static str>| label.map(|l| format!("◀ {l} ▶"));
    let text = |s: &str| (!s.is_empty()).then(|| s.to_string());
    match field {
        FormField::Symptom => text(&form.symptom),
        FormField::Duration => choice(form.duration.map(|c| c.label())),
        FormField::Severity => choice(form.severity.map(|c| c.label())),
        FormField::AdditionalInfo => text(&form.additional_info),
        FormField::Age => text(&form.age),
        FormField::Gender => choice(form.gender.map(|c| c.label())),
        FormField::MedicalHistory => text(&form.medical_history),
    }
}

/// Keep the end of long input visible, where the cursor is.
fn tail(value: &str, width: usize) -> &str {
    let count = value.chars().count();
    if count <= width {
        return value;
    }
    let skip = count - width;
    value
        .char_indices()
        .nth(skip)
        .map_or(value, |(idx, _)| &value[idx..])
}

/// Render the symptom form
pub fn render_form(
    f: &mut Frame,
    area: Rect,
    state: &FormState,
    session: &Session,
    status: &BackendStatus,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0], state, status);
    render_form_fields(f, chunks[1], state, &session.form);
    render_form_footer(f, chunks[2], state, session);
}

fn status_span(status: &BackendStatus) -> Span<'static> {
    match status {
        BackendStatus::Checking => Span::styled("backend: checking…", MedicalTheme::text_muted()),
        BackendStatus::Online { ai_enhanced: true } => {
            Span::styled("backend: online (AI enhanced)", MedicalTheme::success())
        }
        BackendStatus::Online { ai_enhanced: false } => {
            Span::styled("backend: online", MedicalTheme::success())
        }
        BackendStatus::Degraded(s) => {
            Span::styled(format!("backend: {s}"), MedicalTheme::warning())
        }
        BackendStatus::Offline => Span::styled("backend: unreachable", MedicalTheme::danger()),
    }
}

fn render_form_header(f: &mut Frame, area: Rect, state: &FormState, status: &BackendStatus) {
    let mode = if state.enhanced {
        " │ Enhanced form "
    } else {
        " │ Basic form "
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("AI Symptom Analysis", MedicalTheme::title()),
        Span::styled(mode, MedicalTheme::text_secondary()),
        Span::styled("│ ", MedicalTheme::text_secondary()),
        status_span(status),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &FormState, form: &SymptomForm) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let fields = state.fields();
    let mid = (fields.len() + 1) / 2;

    render_field_column(f, columns[0], &fields[..mid], 0, state.selected_field, form);
    render_field_column(f, columns[1], &fields[mid..], mid, state.selected_field, form);
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
    form: &SymptomForm,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label()), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let width = usize::from(chunks[i].width.saturating_sub(4));
        let value = display_value(form, *field);
        let value_display = match &value {
            Some(v) if field.is_choice() => Span::styled(v.clone(), MedicalTheme::text()),
            Some(v) => Span::styled(tail(v, width).to_string(), MedicalTheme::text()),
            None => Span::styled(field.hint(), MedicalTheme::text_muted()),
        };

        let cursor = if is_selected && !field.is_choice() {
            Span::styled("▌", MedicalTheme::cursor())
        } else {
            Span::raw("")
        };

        let content = Paragraph::new(Line::from(vec![Span::raw(" "), value_display, cursor]))
            .block(block);

        f.render_widget(content, chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &FormState, session: &Session) {
    let content = if let Some(err) = session.validation_error() {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.to_string(), MedicalTheme::danger()),
        ])
    } else if session.is_busy() {
        Line::from(vec![
            Span::styled("Analyzing… ", MedicalTheme::warning()),
            Span::styled("[Enter] ", MedicalTheme::text_muted()),
            Span::styled("disabled until the result arrives ", MedicalTheme::text_muted()),
            Span::styled("[Ctrl+R] ", MedicalTheme::key_hint()),
            Span::styled("Cancel & Reset", MedicalTheme::key_desc()),
        ])
    } else {
        let toggle = if state.enhanced {
            "Basic Form"
        } else {
            "Enhanced Form"
        };
        key_hints(&[
            ("↑↓", "Navigate"),
            ("◀▶", "Choose"),
            ("Enter", "Analyze"),
            ("Ctrl+E", toggle),
            ("Ctrl+S", "Sample"),
            ("Ctrl+R", "Reset"),
            ("Ctrl+Q", "Quit"),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
