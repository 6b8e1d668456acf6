//! Async event loop for the TUI: crossterm input, backend completions and the spinner timer.

use std::sync::Arc;

use client::{ChatGateway, Completion, SessionController};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
    },
};
use futures_util::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::action::{Action, Command};
use super::app::TuiApp;
use crate::config::TuiState;

/// RAII guard that restores the terminal on drop (even on panic).
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
    }
}

/// Runs commands returned by `TuiApp::update()`.
struct Dispatcher {
    gateway: Arc<dyn ChatGateway>,
    completions: mpsc::UnboundedSender<Completion>,
}

impl Dispatcher {
    fn dispatch(&self, command: Command) {
        match command {
            Command::None => {}
            Command::Spawn(request) => {
                let label = request.label();
                let gateway = Arc::clone(&self.gateway);
                let tx = self.completions.clone();
                debug!(request = label, "Request spawned");
                tokio::spawn(async move {
                    let completion = request.execute(gateway.as_ref()).await;
                    if tx.send(completion).is_err() {
                        debug!(request = label, "TUI closed before request finished");
                    }
                });
            }
            Command::PersistModel(model) => {
                let state = TuiState {
                    last_model: Some(model),
                };
                if let Err(e) = state.save() {
                    warn!(error = %e, "Failed to persist TUI state");
                }
            }
            Command::Batch(commands) => {
                for command in commands {
                    self.dispatch(command);
                }
            }
        }
    }
}

/// Run the full-screen TUI until the user quits.
pub async fn run_tui(mut session: SessionController) -> anyhow::Result<()> {
    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard; // Drop restores terminal

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (completion_tx, mut completion_rx) = mpsc::unbounded_channel::<Completion>();
    let dispatcher = Dispatcher {
        gateway: session.gateway(),
        completions: completion_tx,
    };

    debug!(model = %session.model(), chats = session.chats().len(), "TUI started");
    if let Some(request) = session.open_initial_chat() {
        dispatcher.dispatch(Command::Spawn(request));
    }
    let mut app = TuiApp::new(session);

    // Crossterm event stream (async)
    let mut crossterm_stream = EventStream::new();

    // Spinner tick interval (100ms)
    let mut spinner_interval = tokio::time::interval(std::time::Duration::from_millis(100));
    spinner_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut window_title = String::new();

    loop {
        let title = app.session.state().window_title();
        if title != window_title {
            execute!(std::io::stdout(), SetTitle(&title))?;
            window_title = title;
        }

        // Render
        terminal.draw(|frame| app.render(frame))?;

        // Event select
        let action = tokio::select! {
            maybe_event = crossterm_stream.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => app.key_action(key),
                Some(Ok(Event::Resize(_, _))) => Some(Action::Resize),
                Some(Ok(_)) => None,
                Some(Err(e)) => {
                    warn!(error = %e, "Terminal event error");
                    None
                }
                None => Some(Action::Quit),
            },

            Some(completion) = completion_rx.recv() => {
                if completion.is_error() {
                    debug!("Request finished with an error");
                }
                Some(Action::Completed(completion))
            }

            _ = spinner_interval.tick(), if app.session.state().is_typing() => Some(Action::Tick),
        };

        if let Some(action) = action {
            let command = app.update(action);
            dispatcher.dispatch(command);
        }

        if app.should_quit {
            break;
        }
    }

    debug!(in_flight = app.session.state().in_flight(), "TUI exiting");
    // TerminalGuard::drop handles cleanup
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::test_gateway::StubGateway;

    #[test]
    fn terminal_guard_drop_path_is_safe() {
        let guard = TerminalGuard;
        drop(guard);
    }

    #[tokio::test]
    async fn dispatched_request_feeds_completion_back() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher {
            gateway: Arc::new(StubGateway::default()),
            completions: tx,
        };
        let mut session = SessionController::new(dispatcher.gateway.clone());
        let request = session.begin_send("ping").expect("input enabled");
        dispatcher.dispatch(Command::Batch(vec![Command::None, Command::Spawn(request)]));

        let completion = rx.recv().await.expect("completion");
        assert!(!completion.is_error());
        session.apply(completion);
        assert_eq!(
            session.transcript().last().map(|n| n.text()),
            Some("echo: ping".to_string())
        );
    }
}
