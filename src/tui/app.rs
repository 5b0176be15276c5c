//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Session transitions (submit, outcome, tab switch, reset)
//! - Async analysis via background worker

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};

use crate::application::AnalysisService;
use crate::domain::{Phase, ResultTab, Session, SubmitRejected, SymptomForm};
use crate::ports::AnalysisBackend;

use super::ui::{
    form::{render_form, FormState},
    render_disclaimer,
    results::{render_results, ResultsState},
};
use super::worker::{AnalysisProgress, AnalysisWorker, AnalysisWorkerHandle, BackendStatus, HealthProbe};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Form,
    Results,
}

/// Fake progress curve: starts at `FLOOR`, approaches `CEILING` with time
/// constant `TAU_SECS`. The backend gives no real progress signal.
const PROGRESS_FLOOR: f64 = 0.02;
const PROGRESS_CEILING: f64 = 0.95;
const PROGRESS_TAU_SECS: f64 = 8.0;

/// Main application state
pub struct App<B>
where
    B: AnalysisBackend + 'static,
{
    /// Current screen
    screen: Screen,

    /// Whether the app should quit
    should_quit: bool,

    service: AnalysisService<B>,

    /// Hard upper bound for one submission, deadline included
    request_timeout: Duration,

    /// Form input plus idle/submitting/success/error
    session: Session,

    form_state: FormState,

    results_state: ResultsState,

    /// Pending analysis worker (if running)
    pending_worker: Option<AnalysisWorkerHandle>,

    /// Animated gauge value while submitting
    progress: f64,

    progress_started_at: Option<Instant>,

    backend_status: BackendStatus,

    health_probe: Option<HealthProbe>,
}

impl<B> App<B>
where
    B: AnalysisBackend + 'static,
{
    /// Create application with an injected service (Composition Root pattern).
    pub fn new(service: AnalysisService<B>, request_timeout: Duration) -> Self {
        Self {
            screen: Screen::Form,
            should_quit: false,
            service,
            request_timeout,
            session: Session::new(),
            form_state: FormState::default(),
            results_state: ResultsState::default(),
            pending_worker: None,
            progress: 0.0,
            progress_started_at: None,
            backend_status: BackendStatus::default(),
            health_probe: None,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        // Probe the backend in the background; the form is usable meanwhile.
        self.health_probe = Some(HealthProbe::spawn(self.service.clone()));

        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main loop
        let result = self.main_loop(&mut terminal);

        // Abandon anything in flight before tearing down.
        if let Some(worker) = self.pending_worker.take() {
            worker.cancel();
        }
        self.session.form.clear();

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop<T: Backend>(&mut self, terminal: &mut Terminal<T>) -> Result<()> {
        loop {
            // Poll background work
            self.poll_worker();
            self.poll_health();

            // Animate analysis progress (fake loading bar)
            self.tick_progress();

            terminal.draw(|f| self.draw(f))?;

            // Handle input (short poll to stay responsive)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn draw(&mut self, f: &mut Frame) {
        let area = f.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(area);

        match self.screen {
            Screen::Form => render_form(
                f,
                chunks[0],
                &self.form_state,
                &self.session,
                &self.backend_status,
            ),
            Screen::Results => render_results(
                f,
                chunks[0],
                &self.session,
                &mut self.results_state,
                self.progress,
            ),
        }

        render_disclaimer(f, chunks[1]);
    }

    /// Poll the background worker for progress updates.
    fn poll_worker(&mut self) {
        // NOTE: We must not hold an immutable borrow of `pending_worker` while mutating `self`.
        loop {
            let Some(worker) = self.pending_worker.as_ref() else {
                return;
            };
            let ticket = worker.ticket;

            let progress = match worker.try_recv() {
                Some(p) => p,
                None => {
                    if worker.is_finished() {
                        // Thread exited without reporting; drain once more
                        // in case the final message raced the check.
                        match worker.try_recv() {
                            Some(p) => p,
                            None => {
                                tracing::error!("Analysis worker #{} exited without a result", ticket);
                                AnalysisProgress::Failed(String::new())
                            }
                        }
                    } else {
                        return;
                    }
                }
            };

            match progress {
                AnalysisProgress::Sending => {}
                AnalysisProgress::Complete(response) => {
                    if self.session.succeed(ticket, *response) {
                        self.results_state.reset_scroll();
                    } else {
                        tracing::debug!("Dropped stale result for ticket #{}", ticket);
                    }
                    self.finish_worker();
                }
                AnalysisProgress::Failed(_) => {
                    if !self.session.fail(ticket) {
                        tracing::debug!("Dropped stale failure for ticket #{}", ticket);
                    }
                    self.finish_worker();
                }
                AnalysisProgress::Cancelled => {
                    // Reset already moved the session on; otherwise the
                    // deadline fired and the submission must not stay open.
                    if self.session.fail(ticket) {
                        tracing::warn!("Analysis #{} cancelled before completing", ticket);
                    }
                    self.finish_worker();
                }
            }
        }
    }

    fn finish_worker(&mut self) {
        self.pending_worker = None;
        self.progress_started_at = None;
    }

    fn poll_health(&mut self) {
        if let Some(status) = self.health_probe.as_ref().and_then(HealthProbe::try_recv) {
            self.backend_status = status;
            self.health_probe = None;
        }
    }

    fn tick_progress(&mut self) {
        // Only animate while a worker is running.
        if self.pending_worker.is_none() {
            return;
        }
        let Some(started_at) = self.progress_started_at else {
            return;
        };

        let elapsed = Instant::now()
            .saturating_duration_since(started_at)
            .as_secs_f64();

        // Smooth, monotonic fake progress: asymptotically approaches the ceiling.
        let k = 1.0 - (-elapsed / PROGRESS_TAU_SECS).exp();
        let desired = PROGRESS_FLOOR + (PROGRESS_CEILING - PROGRESS_FLOOR) * k;
        self.progress = desired.max(self.progress).min(PROGRESS_CEILING);
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);

        // Global handling
        if ctrl {
            match key {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('r') => {
                    self.reset();
                    return;
                }
                _ => {}
            }
        }

        match self.screen {
            Screen::Form => self.handle_form_key(key, ctrl),
            Screen::Results => self.handle_results_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyCode, ctrl: bool) {
        if ctrl {
            match key {
                KeyCode::Char('e') => self.form_state.toggle_enhanced(),
                KeyCode::Char('s') => {
                    self.session.form.clear();
                    self.session.form = SymptomForm::sample();
                    self.session.clear_validation_error();
                }
                _ => {}
            }
            return;
        }

        match key {
            KeyCode::Esc => {
                if !matches!(self.session.phase(), Phase::Idle) {
                    self.screen = Screen::Results;
                }
            }
            KeyCode::Up | KeyCode::BackTab => {
                self.form_state.prev_field();
            }
            KeyCode::Down | KeyCode::Tab => {
                self.form_state.next_field();
            }
            KeyCode::Left => {
                self.form_state.cycle_prev(&mut self.session.form);
            }
            KeyCode::Right => {
                self.form_state.cycle_next(&mut self.session.form);
            }
            KeyCode::Char(c) => {
                self.form_state.input_char(&mut self.session.form, c);
                self.session.clear_validation_error();
            }
            KeyCode::Backspace => {
                self.form_state.delete_char(&mut self.session.form);
                self.session.clear_validation_error();
            }
            KeyCode::Delete => {
                self.form_state.clear_field(&mut self.session.form);
                self.session.clear_validation_error();
            }
            KeyCode::Enter => {
                self.submit();
            }
            _ => {}
        }
    }

    fn handle_results_key(&mut self, key: KeyCode) {
        match self.session.phase() {
            Phase::Success { .. } => match key {
                KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
                    self.session.next_tab();
                    self.results_state.reset_scroll();
                }
                KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
                    self.session.prev_tab();
                    self.results_state.reset_scroll();
                }
                KeyCode::Char(c @ '1'..='4') => {
                    let index = c as usize - '1' as usize;
                    if let Some(tab) = ResultTab::from_index(index) {
                        self.session.select_tab(tab);
                        self.results_state.reset_scroll();
                    }
                }
                KeyCode::Down | KeyCode::Char('j') => self.results_state.scroll_down(),
                KeyCode::Up | KeyCode::Char('k') => self.results_state.scroll_up(),
                KeyCode::Esc | KeyCode::Char('e') => self.screen = Screen::Form,
                _ => {}
            },
            Phase::Error { .. } => {
                if matches!(key, KeyCode::Enter | KeyCode::Esc) {
                    self.screen = Screen::Form;
                }
            }
            Phase::Submitting { .. } | Phase::Idle => {
                if key == KeyCode::Esc {
                    self.screen = Screen::Form;
                }
            }
        }
    }

    fn submit(&mut self) {
        match self.session.submit() {
            Ok(submission) => {
                tracing::info!("Submitting analysis #{}", submission.ticket);

                self.screen = Screen::Results;
                self.results_state.reset_scroll();
                self.progress = 0.0;
                self.progress_started_at = Some(Instant::now());

                // Spawn background worker for the blocking HTTP call
                let worker =
                    AnalysisWorker::spawn(self.service.clone(), submission, self.request_timeout);
                self.pending_worker = Some(worker);
            }
            Err(SubmitRejected::Busy) => {
                tracing::debug!("Submit ignored: analysis already in progress");
            }
            Err(SubmitRejected::Invalid(e)) => {
                // Shown inline by the form footer
                tracing::debug!("Submit rejected: {}", e);
            }
        }
    }

    /// Back to a blank form, abandoning any in-flight request.
    fn reset(&mut self) {
        if let Some(worker) = self.pending_worker.take() {
            worker.cancel();
        }
        if let Some(ticket) = self.session.reset() {
            tracing::info!("Abandoned in-flight analysis #{}", ticket);
        }

        self.form_state = FormState {
            enhanced: self.form_state.enhanced,
            ..FormState::default()
        };
        self.results_state.reset_scroll();
        self.progress = 0.0;
        self.progress_started_at = None;
        self.screen = Screen::Form;
    }
}
