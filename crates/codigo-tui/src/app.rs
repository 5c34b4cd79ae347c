use std::path::PathBuf;

use codigo_core::messages::{self, ASK_APOLOGY};
use codigo_core::{
    highlight_references, ArticleComparator, ArticleReference, ChatError, ChatSession,
    ComparisonRequest, ComparisonResult, Config, Transcript,
};
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    References,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareField {
    First,
    Second,
}

/// State of the "compare two articles" popup.
#[derive(Debug, Clone)]
pub struct ComparePopup {
    pub first: String,
    pub second: String,
    pub field: CompareField,
    pub error: Option<String>,
}

impl ComparePopup {
    fn new() -> Self {
        Self {
            first: String::new(),
            second: String::new(),
            field: CompareField::First,
            error: None,
        }
    }

    pub fn active_input(&mut self) -> &mut String {
        match self.field {
            CompareField::First => &mut self.first,
            CompareField::Second => &mut self.second,
        }
    }
}

/// An exchange in flight. The session travels with the task and comes back
/// with its result, so a second question can't start meanwhile.
pub type AskTask = JoinHandle<(ChatSession, Result<String, ChatError>)>;
pub type CompareTask = JoinHandle<Result<ComparisonResult, ChatError>>;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Chat state
    pub query_input: String,
    pub query_cursor: usize, // cursor position in query_input, in chars
    pub transcript: Transcript,
    pub query_scroll: u16,
    pub query_chat_height: u16,
    pub query_chat_width: u16,

    // Requests
    pub session: Option<ChatSession>,
    pub query_task: Option<AskTask>,
    pub comparator: ArticleComparator,
    pub compare_task: Option<CompareTask>,

    // References found in the latest bot message
    pub extracted_references: Vec<ArticleReference>,
    pub references_state: ListState,

    // Popups and status
    pub compare_popup: Option<ComparePopup>,
    pub notice: Option<String>,
    pub status_line: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub config: Config,
    pub export_dir: PathBuf,
}

impl App {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let session = ChatSession::from_config(&config)?;
        let comparator = ArticleComparator::from_config(&config)?;

        let export_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut transcript = Transcript::new();
        if config.uses_default_chat_url() {
            warn!(endpoint = %session.endpoint(), "chat endpoint not configured");
            transcript.push_warning(messages::default_endpoint_warning(session.endpoint()));
        }

        Ok(Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,

            query_input: String::new(),
            query_cursor: 0,
            transcript,
            query_scroll: 0,
            query_chat_height: 0,
            query_chat_width: 0,

            session: Some(session),
            query_task: None,
            comparator,
            compare_task: None,

            extracted_references: Vec::new(),
            references_state: ListState::default(),

            compare_popup: None,
            notice: None,
            status_line: None,

            animation_frame: 0,

            config,
            export_dir,
        })
    }

    /// True while a question or a comparison is waiting on the network.
    pub fn is_busy(&self) -> bool {
        self.query_task.is_some() || self.compare_task.is_some()
    }

    /// Send the input box contents. Ignored while busy or when blank.
    pub fn submit_question(&mut self) {
        let question = self.query_input.trim().to_string();
        if question.is_empty() || self.is_busy() {
            return;
        }
        let Some(mut session) = self.session.take() else {
            return;
        };

        info!(chars = question.chars().count(), "submitting question");
        self.transcript.push_user(question.clone());
        self.query_input.clear();
        self.query_cursor = 0;
        self.status_line = None;
        self.scroll_query_to_bottom();

        self.query_task = Some(tokio::spawn(async move {
            let result = session.ask(&question).await;
            (session, result)
        }));
    }

    pub fn open_compare_popup(&mut self) {
        if self.compare_popup.is_none() {
            self.compare_popup = Some(ComparePopup::new());
        }
    }

    pub fn close_compare_popup(&mut self) {
        self.compare_popup = None;
    }

    /// Validate the popup fields and start the comparison.
    ///
    /// Invalid input keeps the popup open with a message and sends nothing.
    pub fn submit_comparison(&mut self) {
        if self.is_busy() {
            return;
        }
        let Some(popup) = self.compare_popup.as_mut() else {
            return;
        };

        let request = match ComparisonRequest::parse(&popup.first, &popup.second) {
            Ok(request) => request,
            Err(reason) => {
                popup.error = Some(messages::invalid_pair(reason).to_string());
                return;
            }
        };

        self.compare_popup = None;
        self.transcript
            .push_user(messages::compare_request_line(&request.first_id, &request.second_id));
        self.scroll_query_to_bottom();

        let comparator = self.comparator.clone();
        self.compare_task = Some(tokio::spawn(async move {
            comparator.compare(&request.first_id, &request.second_id).await
        }));
    }

    /// Collect finished requests. Called on every tick.
    pub async fn poll_tasks(&mut self) {
        if self.query_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.query_task.take() {
                self.finish_question(task.await);
            }
        }

        if self.compare_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.compare_task.take() {
                self.finish_comparison(task.await);
            }
        }
    }

    fn finish_question(
        &mut self,
        joined: Result<(ChatSession, Result<String, ChatError>), tokio::task::JoinError>,
    ) {
        match joined {
            Ok((session, result)) => {
                self.session = Some(session);
                match result {
                    Ok(answer) => self.show_bot_answer(answer),
                    Err(e) => {
                        warn!(error = %e, "question failed");
                        self.transcript.push_error(ASK_APOLOGY);
                    }
                }
            }
            Err(e) => {
                // The session went down with the task; start a fresh one.
                error!(error = %e, "question task aborted");
                self.transcript.push_error(ASK_APOLOGY);
                match ChatSession::from_config(&self.config) {
                    Ok(session) => self.session = Some(session),
                    Err(e) => self.status_line = Some(e.to_string()),
                }
            }
        }
        self.scroll_query_to_bottom();
    }

    fn finish_comparison(
        &mut self,
        joined: Result<Result<ComparisonResult, ChatError>, tokio::task::JoinError>,
    ) {
        match joined {
            Ok(Ok(ComparisonResult::Success { text })) => self.show_bot_answer(text),
            Ok(Ok(ComparisonResult::Failure { message, .. })) => {
                self.transcript.push_error(messages::compare_failure_line(&message));
            }
            Ok(Err(e)) => {
                self.transcript.push_error(messages::compare_failure_line(&e.to_string()));
            }
            Err(e) => {
                error!(error = %e, "comparison task aborted");
                self.transcript.push_error(messages::compare_failure_line(&e.to_string()));
            }
        }
        self.scroll_query_to_bottom();
    }

    fn show_bot_answer(&mut self, text: String) {
        let mut refs = highlight_references(&text);
        let mut seen = std::collections::HashSet::new();
        refs.retain(|r| seen.insert(r.number.clone()));

        self.references_state
            .select(if refs.is_empty() { None } else { Some(0) });
        self.extracted_references = refs;
        self.transcript.push_bot(text);
    }

    /// Clear both the visible chat and the history window.
    pub fn reset_chat(&mut self) {
        let Some(session) = self.session.as_mut() else {
            self.status_line = Some("Espera a que termine la consulta en curso".to_string());
            return;
        };
        session.reset();
        self.transcript.clear();
        self.extracted_references.clear();
        self.references_state.select(None);
        self.query_scroll = 0;
        if self.focus == FocusPane::References {
            self.focus = FocusPane::Chat;
        }
        self.status_line = Some("Chat e historial limpiados".to_string());
        info!("chat and history cleared");
    }

    pub fn export_chat(&mut self) {
        self.status_line = Some(match self.transcript.export_to(&self.export_dir) {
            Ok(path) => {
                info!(path = %path.display(), "conversation exported");
                format!("Conversación exportada a {}", path.display())
            }
            Err(e) => {
                warn!(error = %e, "export failed");
                format!("No se pudo exportar: {}", e)
            }
        });
    }

    pub fn show_stats(&mut self) {
        let stats = self.transcript.stats();
        self.status_line = Some(format!(
            "{} mensajes de usuario, {} del bot, {} en total",
            stats.user_messages, stats.bot_messages, stats.total_messages
        ));
    }

    /// Surface the selected reference. Navigation itself is not implemented.
    pub fn open_selected_reference(&mut self) {
        let selected = self
            .references_state
            .selected()
            .and_then(|i| self.extracted_references.get(i));
        if let Some(reference) = selected {
            info!(article = %reference.number, "article reference activated");
            self.notice = Some(messages::article_notice(&reference.number));
        }
    }

    pub fn references_down(&mut self) {
        let len = self.extracted_references.len();
        if len > 0 {
            let i = self.references_state.selected().unwrap_or(0);
            self.references_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn references_up(&mut self) {
        let i = self.references_state.selected().unwrap_or(0);
        self.references_state.select(Some(i.saturating_sub(1)));
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Input => FocusPane::Chat,
            FocusPane::Chat if !self.extracted_references.is_empty() => FocusPane::References,
            FocusPane::Chat | FocusPane::References => FocusPane::Input,
        };
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.query_scroll = self.query_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.total_chat_lines().saturating_sub(self.query_chat_height);
        self.query_scroll = self.query_scroll.saturating_add(lines).min(max);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Scroll chat to bottom so the latest message is visible
    pub fn scroll_query_to_bottom(&mut self) {
        let total = self.total_chat_lines();
        self.query_scroll = total.saturating_sub(self.query_chat_height);
    }

    /// Rendered height of the chat, estimated from the wrap width.
    fn total_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.query_chat_width > 0 {
            self.query_chat_width as usize
        } else {
            50
        };

        let mut total_lines: usize = 0;
        for entry in self.transcript.entries() {
            total_lines += 2; // speaker line + trailing blank
            for line in entry.text.lines() {
                let char_count = line.chars().count();
                total_lines += char_count / wrap_width + 1;
            }
        }
        if self.is_busy() {
            total_lines += 2;
        }
        total_lines.min(u16::MAX as usize) as u16
    }
}
