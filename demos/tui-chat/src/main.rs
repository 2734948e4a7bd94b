//! Terminal chat client for a streaming chat backend.
//!
//! Run with: cargo run -p tui-chat
//!
//! Set `STREAMCHAT_URL` to pick the backend and `STREAMCHAT_LOG` to a file
//! path to capture logs (the terminal itself is busy drawing).

use std::{fs::File, io, sync::Mutex, time::Duration};

use crossterm::{
    event, execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use streamchat_core::{BubbleId, BubbleKind, ChatView, ClientConfig};
use streamchat_render::{Bubble, ChatDocument, TemplateSet, USER_INPUT_ID};
use streamchat_session::{ChatPage, bootstrap};
use streamchat_transport::{
    tui::{TuiBridge, TuiInput},
    websocket::{EventReceiver, WsConnection},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = ClientConfig::from_env()?;
    let view = ChatDocument::new(TemplateSet::default())?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, view, &config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result.map_err(Into::into)
}

fn init_logging() -> anyhow::Result<()> {
    let Ok(path) = std::env::var("STREAMCHAT_LOG") else {
        return Ok(());
    };
    let file = File::create(path)?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
    Ok(())
}

struct App {
    page: ChatPage<ChatDocument, WsConnection>,
    events: EventReceiver,
    selected_source: Option<BubbleId>,
    scroll: u16,
    follow: bool,
}

impl App {
    fn new(page: ChatPage<ChatDocument, WsConnection>, events: EventReceiver) -> Self {
        Self {
            page,
            events,
            selected_source: None,
            scroll: 0,
            follow: true,
        }
    }

    fn source_ids(&self) -> Vec<BubbleId> {
        self.page
            .view()
            .bubbles()
            .filter(|b| b.kind() == BubbleKind::Source)
            .map(Bubble::id)
            .collect()
    }

    fn select_source(&mut self, forward: bool) {
        let ids = self.source_ids();
        if ids.is_empty() {
            return;
        }
        let current = self
            .selected_source
            .and_then(|id| ids.iter().position(|s| *s == id));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => ids.len() - 1,
            (Some(i), true) => (i + 1) % ids.len(),
            (Some(i), false) => (i + ids.len() - 1) % ids.len(),
        };
        self.selected_source = Some(ids[next]);
    }

    fn toggle_selected_source(&mut self) {
        if let Some(id) = self.selected_source {
            if let Err(e) = self.page.source_clicked(id) {
                tracing::warn!("toggle failed: {e}");
            }
        }
    }

    fn scroll_by(&mut self, delta: i16) {
        if delta < 0 {
            self.follow = false;
            self.scroll = self.scroll.saturating_sub(delta.unsigned_abs());
        } else {
            self.scroll = self.scroll.saturating_add(delta.unsigned_abs());
        }
    }

    /// Handle one terminal input. Returns false when the app should quit.
    fn handle_input(&mut self, input: TuiInput) -> bool {
        match input {
            TuiInput::Quit => return false,
            TuiInput::Key(key) => {
                if self.page.key_down(key).is_some() {
                    self.follow = true;
                }
            }
            TuiInput::SelectNextSource => self.select_source(true),
            TuiInput::SelectPreviousSource => self.select_source(false),
            TuiInput::ToggleSelectedSource => self.toggle_selected_source(),
            TuiInput::Scroll(delta) => self.scroll_by(delta),
            TuiInput::Resize { .. } => {}
        }
        true
    }

    fn status(&self) -> (String, Style) {
        let context = self.page.context();
        let endpoint = context.endpoint().unwrap_or("-");
        if context.is_connected() {
            (
                format!("Connected ({endpoint})"),
                Style::default().fg(Color::Green),
            )
        } else {
            (
                format!("Disconnected ({endpoint})"),
                Style::default().fg(Color::Red),
            )
        }
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    view: ChatDocument,
    config: &ClientConfig,
) -> io::Result<()> {
    let (page, events) = bootstrap(view, config);
    let mut app = App::new(page, events);

    loop {
        // Connection events first, in delivery order
        if app.page.drain_events(&mut app.events) > 0 {
            app.follow = true;
        }

        terminal.draw(|f| ui(f, &mut app))?;

        if event::poll(Duration::from_millis(50))? {
            let ev = event::read()?;
            if let Some(input) = TuiBridge::handle_event(&ev) {
                if !app.handle_input(input) {
                    return Ok(());
                }
            }
        }
    }
}

fn bubble_lines(bubble: &Bubble, selected: bool) -> Vec<Line<'static>> {
    let (label, color) = match bubble.kind() {
        BubbleKind::User => ("you", Color::Cyan),
        BubbleKind::Bot => ("bot", Color::White),
        BubbleKind::Source => ("source", Color::Magenta),
    };
    let mut label_style = Style::default().fg(color).add_modifier(Modifier::BOLD);
    if selected {
        label_style = label_style.add_modifier(Modifier::REVERSED);
    }

    if bubble.is_minimized() {
        return vec![Line::from(vec![
            Span::styled(format!("{label}> "), label_style),
            Span::styled("[collapsed]", Style::default().fg(Color::DarkGray)),
        ])];
    }

    let text = bubble.display_text();
    let mut lines: Vec<Line> = text
        .split('\n')
        .enumerate()
        .map(|(i, line)| {
            let prefix = if i == 0 {
                Span::styled(format!("{label}> "), label_style)
            } else {
                Span::raw(" ".repeat(label.len() + 2))
            };
            Line::from(vec![prefix, Span::styled(line.to_string(), Style::default().fg(color))])
        })
        .collect();
    lines.push(Line::from(""));
    lines
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Messages
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status
        ])
        .split(f.area());

    // Messages area
    let lines: Vec<Line> = app
        .page
        .view()
        .bubbles()
        .flat_map(|b| bubble_lines(b, app.selected_source == Some(b.id())))
        .collect();

    let visible = chunks[0].height.saturating_sub(2);
    let max_scroll = u16::try_from(lines.len())
        .unwrap_or(u16::MAX)
        .saturating_sub(visible);
    if app.follow || app.scroll >= max_scroll {
        app.follow = true;
        app.scroll = max_scroll;
    }

    let messages = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Chat"))
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0));
    f.render_widget(messages, chunks[0]);

    // Input area
    let value = app.page.view().input_value();
    let input = Paragraph::new(value)
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(USER_INPUT_ID));
    f.render_widget(input, chunks[1]);

    // Set cursor
    let cursor = u16::try_from(value.chars().count()).unwrap_or(u16::MAX);
    f.set_cursor_position((
        chunks[1].x.saturating_add(cursor).saturating_add(1),
        chunks[1].y + 1,
    ));

    // Status bar
    let (status, status_style) = app.status();
    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(status, status_style),
        Span::raw(" | "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" send | "),
        Span::styled("Tab/Ctrl+O", Style::default().fg(Color::Yellow)),
        Span::raw(" select/toggle source | "),
        Span::styled("Ctrl+C", Style::default().fg(Color::Yellow)),
        Span::raw(" quit "),
    ]));
    f.render_widget(status, chunks[2]);
}
