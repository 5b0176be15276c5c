//! Analysis results view.
//!
//! Layout while a response is shown:
//! - header with the generation timestamp
//! - tab bar (AI Analysis, Diet Plan, Possible Causes, AI Insights)
//! - scrollable tab body
//! - red flags and the backend's disclaimer, rendered with every tab

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::domain::response::humanize_key;
use crate::domain::{AiInsight, AnalysisResponse, Phase, PossibleCause, ResultTab, Session};
use crate::tui::styles::MedicalTheme;

use super::{key_hints, NO_DATA};

/// Marker that opens each insight card.
const CARD_MARKER: &str = "◆ ";

/// Tab body keeps at least this many rows when the safety panels grow.
const MIN_BODY_ROWS: u16 = 3;

/// Results view state
#[derive(Debug, Clone, Default)]
pub struct ResultsState {
    /// Vertical scroll offset of the tab body
    pub scroll: u16,
    /// Largest useful offset, refreshed on every render
    max_scroll: u16,
}

impl ResultsState {
    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1).min(self.max_scroll);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn reset_scroll(&mut self) {
        self.scroll = 0;
    }
}

/// Render whatever the session currently holds
pub fn render_results(
    f: &mut Frame,
    area: Rect,
    session: &Session,
    state: &mut ResultsState,
    progress: f64,
) {
    match session.phase() {
        Phase::Idle => render_idle(f, area),
        Phase::Submitting { .. } => render_progress(f, area, progress),
        Phase::Success { response, tab } => render_response(f, area, response, *tab, state),
        Phase::Error { message } => render_error(f, area, message),
    }
}

fn render_header(f: &mut Frame, area: Rect, subtitle: String) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Analysis Results", MedicalTheme::title()),
        Span::styled(format!(" │ {subtitle}"), MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_footer(f: &mut Frame, area: Rect, content: Line<'static>) {
    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(footer, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No analysis yet",
            MedicalTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Describe a symptom in the form to begin",
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_progress(f: &mut Frame, area: Rect, progress: f64) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(f, outer[0], "Waiting for the backend".to_string());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .margin(2)
        .split(outer[1]);

    let stage_text = Paragraph::new(Line::from(vec![
        Span::styled("Stage: ", MedicalTheme::text_secondary()),
        Span::styled("Analyzing symptom", MedicalTheme::focused()),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(stage_text, chunks[0]);

    let progress = progress.clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::info())
        .ratio(progress)
        .label(format!("{:.0}%", progress * 100.0));
    f.render_widget(gauge, chunks[1]);

    let desc = Paragraph::new(Line::from(Span::styled(
        "Running AI analysis and medical research, this can take up to a minute...",
        MedicalTheme::text_muted(),
    )))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(desc, chunks[2]);

    render_footer(
        f,
        outer[2],
        key_hints(&[("Esc", "Back to Form"), ("Ctrl+R", "Cancel & Reset")]),
    );
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(f, outer[0], "Analysis failed".to_string());

    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "! Error",
            MedicalTheme::danger().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );
    f.render_widget(content, outer[1]);

    render_footer(
        f,
        outer[2],
        key_hints(&[("Enter", "Edit & Retry"), ("Ctrl+R", "Start Over")]),
    );
}

fn render_response(
    f: &mut Frame,
    area: Rect,
    response: &AnalysisResponse,
    tab: ResultTab,
    state: &mut ResultsState,
) {
    let inner_width = area.width.saturating_sub(2);
    let body_lines = tab_lines(response, tab);
    let red_flags = red_flag_lines(response);
    let disclaimer = disclaimer_lines(response);

    // Red flags and the disclaimer are never clipped; the body scrolls instead.
    let red_flag_rows = wrapped_rows(&red_flags, inner_width).saturating_add(2);
    let disclaimer_rows = wrapped_rows(&disclaimer, inner_width).saturating_add(2);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),               // Header
            Constraint::Length(3),               // Tabs
            Constraint::Min(MIN_BODY_ROWS + 2),  // Body
            Constraint::Length(red_flag_rows),   // Red flags
            Constraint::Length(disclaimer_rows), // Disclaimer
            Constraint::Length(3),               // Footer
        ])
        .split(area);

    let body_rows = wrapped_rows(&body_lines, inner_width);
    state.max_scroll = body_rows.saturating_sub(chunks[2].height.saturating_sub(2));
    state.scroll = state.scroll.min(state.max_scroll);

    render_header(
        f,
        chunks[0],
        format!("Generated {}", response.search_timestamp.display()),
    );
    render_tab_bar(f, chunks[1], tab);

    let body = Paragraph::new(body_lines)
        .block(
            Block::default()
                .title(Span::styled(format!(" {} ", tab.title()), MedicalTheme::subtitle()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border_focused()),
        )
        .wrap(Wrap { trim: false })
        .scroll((state.scroll, 0));
    f.render_widget(body, chunks[2]);

    let red_flags = Paragraph::new(red_flags)
        .block(
            Block::default()
                .title(Span::styled(
                    " Seek Immediate Care If ",
                    MedicalTheme::danger().add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::danger()),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(red_flags, chunks[3]);

    let disclaimer = Paragraph::new(disclaimer)
        .block(
            Block::default()
                .title(Span::styled(" Medical Disclaimer ", MedicalTheme::warning()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::warning()),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(disclaimer, chunks[4]);

    render_footer(
        f,
        chunks[5],
        key_hints(&[
            ("Tab/◀▶", "Switch Tab"),
            ("1-4", "Jump"),
            ("↑↓", "Scroll"),
            ("Esc", "Edit Form"),
            ("Ctrl+R", "New Analysis"),
        ]),
    );
}

fn render_tab_bar(f: &mut Frame, area: Rect, active: ResultTab) {
    let titles: Vec<Line> = ResultTab::ALL
        .iter()
        .map(|t| Line::from(format!("{} {}", t.index() + 1, t.title())))
        .collect();

    let tabs = Tabs::new(titles)
        .select(active.index())
        .style(MedicalTheme::text_secondary())
        .highlight_style(MedicalTheme::selected())
        .divider(Span::styled("│", MedicalTheme::border()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        );
    f.render_widget(tabs, area);
}

/// Body lines for one tab.
#[must_use]
pub fn tab_lines(response: &AnalysisResponse, tab: ResultTab) -> Vec<Line<'static>> {
    match tab {
        ResultTab::Analysis => analysis_lines(response),
        ResultTab::Diet => diet_lines(response),
        ResultTab::Causes => causes_lines(response),
        ResultTab::Insights => insights_lines(&response.ai_insights),
    }
}

fn heading(title: &str) -> Line<'static> {
    Line::from(Span::styled(title.to_string(), MedicalTheme::subtitle()))
}

fn placeholder() -> Line<'static> {
    Line::from(Span::styled(format!("  {NO_DATA}"), MedicalTheme::text_muted()))
}

fn paragraph(lines: &mut Vec<Line<'static>>, text: &str) {
    if text.trim().is_empty() {
        lines.push(placeholder());
        return;
    }
    for line in text.lines() {
        lines.push(Line::from(Span::styled(
            format!("  {}", line.trim_end()),
            MedicalTheme::text(),
        )));
    }
}

fn bullets(lines: &mut Vec<Line<'static>>, items: &[String]) {
    if items.is_empty() {
        lines.push(placeholder());
        return;
    }
    for item in items {
        lines.push(Line::from(vec![
            Span::styled("  • ", MedicalTheme::focused()),
            Span::styled(item.clone(), MedicalTheme::text()),
        ]));
    }
}

fn section(lines: &mut Vec<Line<'static>>, title: &str) {
    if !lines.is_empty() {
        lines.push(Line::from(""));
    }
    lines.push(heading(title));
}

fn analysis_lines(response: &AnalysisResponse) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    section(&mut lines, "Symptom Analysis");
    paragraph(&mut lines, &response.symptom_analysis);

    section(&mut lines, "AI Web Research");
    paragraph(&mut lines, &response.ai_web_research);

    section(&mut lines, "Risk Assessment");
    if response.risk_assessment.is_empty() {
        lines.push(placeholder());
    }
    for (key, value) in response.risk_assessment.iter() {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}: ", humanize_key(key)), MedicalTheme::text_secondary()),
            Span::styled(value.to_string(), MedicalTheme::text()),
        ]));
    }

    section(&mut lines, "Personalized Tips");
    bullets(&mut lines, &response.personalized_tips);

    lines
}

fn diet_lines(response: &AnalysisResponse) -> Vec<Line<'static>> {
    let diet = &response.diet_plan;
    let mut lines = Vec::new();

    for (title, items) in [
        ("Foods to Consume", &diet.foods_to_consume),
        ("Foods to Avoid", &diet.foods_to_avoid),
        ("Nutritional Focus", &diet.nutritional_focus),
        ("Supplements", &diet.supplements),
        ("Meal Suggestions", &diet.meal_suggestions),
    ] {
        section(&mut lines, title);
        bullets(&mut lines, items);
    }

    lines
}

fn cause_lines(lines: &mut Vec<Line<'static>>, cause: &PossibleCause) {
    let mut title = vec![
        Span::styled("  ", MedicalTheme::text()),
        Span::styled(
            cause.condition.clone(),
            MedicalTheme::text().add_modifier(Modifier::BOLD),
        ),
    ];
    if !cause.urgency_level.as_str().is_empty() {
        title.push(Span::styled(
            format!("  [{} urgency]", cause.urgency_level.as_str()),
            MedicalTheme::urgency(&cause.urgency_level),
        ));
    }
    lines.push(Line::from(title));

    let mut meta = Vec::new();
    if !cause.probability.is_empty() {
        meta.push(format!("Probability: {}", cause.probability));
    }
    if !cause.ai_confidence.is_empty() {
        meta.push(format!("AI confidence: {}", cause.ai_confidence));
    }
    if !meta.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("    {}", meta.join(" · ")),
            MedicalTheme::text_secondary(),
        )));
    }
    if !cause.description.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("    {}", cause.description),
            MedicalTheme::text(),
        )));
    }
}

fn causes_lines(response: &AnalysisResponse) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    section(&mut lines, "Possible Causes");
    if response.possible_causes.is_empty() {
        lines.push(placeholder());
    }
    for cause in &response.possible_causes {
        cause_lines(&mut lines, cause);
    }

    section(&mut lines, "Lifestyle Suggestions");
    bullets(&mut lines, &response.lifestyle_suggestions);

    lines
}

fn insight_card(lines: &mut Vec<Line<'static>>, insight: &AiInsight) {
    let title = if insight.title.is_empty() {
        "Insight".to_string()
    } else {
        insight.title.clone()
    };
    let mut head = vec![
        Span::styled(CARD_MARKER, MedicalTheme::focused()),
        Span::styled(title, MedicalTheme::text().add_modifier(Modifier::BOLD)),
    ];
    if !insight.insight_type.is_empty() {
        head.push(Span::styled(
            format!("  ({})", insight.insight_type),
            MedicalTheme::text_secondary(),
        ));
    }
    lines.push(Line::from(head));

    for (label, value) in [
        ("", &insight.description),
        ("Recommendation: ", &insight.recommendation),
        ("Evidence level: ", &insight.evidence_level),
    ] {
        if value.is_empty() {
            continue;
        }
        lines.push(Line::from(vec![
            Span::styled(format!("  {label}"), MedicalTheme::text_secondary()),
            Span::styled(value.clone(), MedicalTheme::text()),
        ]));
    }
}

fn insights_lines(insights: &[AiInsight]) -> Vec<Line<'static>> {
    if insights.is_empty() {
        return vec![placeholder()];
    }
    let mut lines = Vec::new();
    for (i, insight) in insights.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        insight_card(&mut lines, insight);
    }
    lines
}

fn red_flag_lines(response: &AnalysisResponse) -> Vec<Line<'static>> {
    if response.red_flags.is_empty() {
        return vec![placeholder()];
    }
    response
        .red_flags
        .iter()
        .map(|flag| {
            Line::from(vec![
                Span::styled("  ! ", MedicalTheme::danger()),
                Span::styled(flag.clone(), MedicalTheme::text()),
            ])
        })
        .collect()
}

fn disclaimer_lines(response: &AnalysisResponse) -> Vec<Line<'static>> {
    if response.medical_disclaimer.trim().is_empty() {
        return vec![placeholder()];
    }
    response
        .medical_disclaimer
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| Line::from(Span::styled(l.trim().to_string(), MedicalTheme::text_secondary())))
        .collect()
}

/// Rows `lines` occupy once word-wrapped to `width` columns.
fn wrapped_rows(lines: &[Line], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| {
            let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
            let mut rows = 1;
            let mut used = 0;
            for (i, word) in text.split(' ').enumerate() {
                let w = Span::raw(word).width();
                if i == 0 {
                    used = w;
                } else if used + 1 + w <= width {
                    used += 1 + w;
                } else {
                    rows += 1;
                    used = w;
                }
                while used > width {
                    rows += 1;
                    used -= width;
                }
            }
            rows
        })
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}
