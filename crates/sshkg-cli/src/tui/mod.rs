//! Interactive full-screen front end.
//!
//! The loop draws the current session, polls the keyboard, drains events
//! posted by stage jobs and timers, and feeds everything through
//! [`Controller::handle`]. The commands it gets back are the only place
//! work is spawned.

pub mod controller;
mod input;
mod render;
mod terminal;
mod theme;
mod ticker;

use anyhow::Result;
use crossterm::event::{self as term_event, Event as TermEvent};
use sshkg_core::{FsProbe, GeneratedKeyPair, KeygenError, StageJob};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info};

pub use controller::{Command, Controller, ControllerSettings, Event, Lifecycle};
use terminal::{Term, TerminalGuard};
use theme::Theme;
use ticker::Ticker;

/// How an interactive session ended.
#[derive(Debug)]
pub struct Outcome {
    pub lifecycle: Lifecycle,
    pub result: Option<GeneratedKeyPair>,
}

/// Run one interactive session to its end.
pub async fn run(settings: ControllerSettings) -> Result<Outcome> {
    let mut controller = Controller::new(settings, FsProbe);
    let theme = Theme::default();

    let mut guard = TerminalGuard::enter()?;
    let result = run_loop(guard.terminal(), &mut controller, &theme).await;
    // Restore the screen before anything is printed.
    drop(guard);
    result?;

    let session = controller.session();
    info!(state = ?session.lifecycle, "interactive session finished");
    Ok(Outcome {
        lifecycle: session.lifecycle,
        result: session.result.clone(),
    })
}

async fn run_loop(
    terminal: &mut Term,
    controller: &mut Controller<FsProbe>,
    theme: &Theme,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ticker = Ticker::new(tx.clone());

    loop {
        terminal.draw(|frame| render::render_frame(frame, controller.session(), theme))?;

        let mut events = Vec::new();
        if term_event::poll(Duration::from_millis(10))? {
            if let TermEvent::Key(key) = term_event::read()? {
                events.extend(input::map_key(controller.lifecycle(), key));
            }
        }
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        for event in events {
            for command in controller.handle(event) {
                match command {
                    Command::Dispatch(job) => dispatch(job, tx.clone()),
                    Command::ArmTicker(delay) => ticker.after(delay, Event::Tick),
                    Command::ScheduleSettle(delay) => ticker.after(delay, Event::Settled),
                    Command::Exit => return Ok(()),
                }
            }
        }

        tokio::task::yield_now().await;
    }
}

/// Run a stage job on the blocking pool and post its result back.
fn dispatch(job: StageJob, tx: UnboundedSender<Event>) {
    let stage = job.stage();
    debug!(stage = stage.label(), "dispatching stage");

    tokio::spawn(async move {
        let result = match tokio::task::spawn_blocking(move || job.run()).await {
            Ok(result) => result,
            Err(e) => Err(KeygenError::Generation(format!(
                "{} task failed: {e}",
                stage.label()
            ))),
        };
        let _ = tx.send(Event::StageFinished(result));
    });
}
