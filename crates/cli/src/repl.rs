//! The interactive prompt loop.

use std::future::Future;
use std::io::{BufRead, Write};
use std::path::Path;

use calculus_agent::{ReplCommand, Session, TurnOutcome};
use calculus_core::event::AgentEvent;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::render::render;
use crate::ui::{self, BOLD, CLEAR_SCREEN, GREY, RESET};

/// Stdin lines, read on a plain thread.
///
/// A blocked read on this thread does not hold up runtime shutdown, so
/// leaving the prompt through Ctrl-C ends the process right away.
pub fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    });
    rx
}

fn write_lines<W: Write>(out: &mut W, lines: &[String]) -> std::io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

fn write_event<W: Write>(out: &mut W, event: &AgentEvent) -> std::io::Result<()> {
    write_lines(out, &render(event))
}

/// Take lines from `input` until `exit`, `quit`, a closed channel, or an
/// interrupt at the prompt.
///
/// `interrupt` is called once per wait; its future resolving means Ctrl-C.
pub async fn run<W, I, F>(
    session: &mut Session,
    mut input: mpsc::Receiver<String>,
    out: &mut W,
    cwd: &Path,
    mut interrupt: I,
) -> std::io::Result<()>
where
    W: Write,
    I: FnMut() -> F,
    F: Future<Output = ()>,
{
    loop {
        write!(out, "{BOLD}User:{RESET} ")?;
        out.flush()?;

        let line = tokio::select! {
            line = input.recv() => line,
            () = interrupt() => None,
        };
        let Some(line) = line else {
            writeln!(out)?;
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Exit => break,
            ReplCommand::Empty => continue,
            ReplCommand::Help => write_lines(out, &ui::help_text())?,
            ReplCommand::Clear => {
                session.reset().await;
                write!(out, "{CLEAR_SCREEN}")?;
                write_lines(out, &ui::welcome_box(cwd))?;
            }
            ReplCommand::Prompt(text) => {
                let mut events = session.event_bus().subscribe();
                let turn = session.turn_until(&text, interrupt());
                tokio::pin!(turn);

                let outcome = loop {
                    tokio::select! {
                        biased;
                        event = events.recv() => match event {
                            Ok(event) => write_event(out, &event)?,
                            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Renderer fell behind"),
                            Err(RecvError::Closed) => {}
                        },
                        outcome = &mut turn => break outcome,
                    }
                };

                loop {
                    match events.try_recv() {
                        Ok(event) => write_event(out, &event)?,
                        Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "Renderer fell behind"),
                        Err(_) => break,
                    }
                }

                match outcome {
                    TurnOutcome::Answered(summary) => {
                        debug!(rounds = summary.rounds, tool_calls = summary.tool_calls_made, "Turn answered");
                    }
                    TurnOutcome::Interrupted { closed } => {
                        debug!(closed, "Turn interrupted");
                        write_lines(out, &[format!("{GREY}Interrupted.{RESET}"), String::new()])?;
                    }
                    // Already shown through the error event.
                    TurnOutcome::Failed(_) => writeln!(out)?,
                }
            }
        }
    }

    Ok(())
}
