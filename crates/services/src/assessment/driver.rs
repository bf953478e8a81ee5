use std::time::Duration;

use quiz_core::model::QuestionId;
use tokio::sync::{mpsc, watch};

use super::coordinator::{SubmissionCoordinator, SubmitReceipt};
use super::session::AssessmentSession;
use super::ticker::Ticker;
use super::view::SessionSnapshot;
use crate::error::SessionError;

/// Input accepted by a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Select {
        question_id: QuestionId,
        option_index: usize,
    },
    /// Selects an option on the question currently shown.
    SelectCurrent(usize),
    GoTo(usize),
    Next,
    Previous,
    /// Submit, already confirmed by the user.
    Submit,
    Leave,
}

/// How a driven session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    Completed(SubmitReceipt),
    Failed(SessionError),
    Abandoned,
}

/// Runs one session: merges user commands with countdown pulses and publishes a
/// snapshot after every change.
pub struct SessionDriver {
    session: AssessmentSession,
    coordinator: SubmissionCoordinator,
    tick_period: Duration,
    snapshots: watch::Sender<SessionSnapshot>,
    last_error: Option<String>,
}

impl SessionDriver {
    #[must_use]
    pub fn new(
        session: AssessmentSession,
        coordinator: SubmissionCoordinator,
        tick_period: Duration,
    ) -> (Self, watch::Receiver<SessionSnapshot>) {
        let (snapshots, rx) = watch::channel(session.snapshot());
        (
            Self {
                session,
                coordinator,
                tick_period,
                snapshots,
                last_error: None,
            },
            rx,
        )
    }

    /// Starts the session and runs until it completes, fails or is left.
    ///
    /// Closing the command channel counts as leaving.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) -> SessionOutcome {
        if let Err(err) = self.session.start() {
            return SessionOutcome::Failed(err);
        }
        let (mut ticker, mut pulses) = Ticker::spawn(self.tick_period);
        self.publish();

        let outcome = loop {
            tokio::select! {
                biased;
                cmd = commands.recv() => {
                    let Some(cmd) = cmd else {
                        break self.leave();
                    };
                    if let Some(outcome) = self.apply(cmd).await {
                        break outcome;
                    }
                }
                Some(()) = pulses.recv() => {
                    match self.coordinator.tick(&mut self.session).await {
                        Ok(Some(receipt)) => break SessionOutcome::Completed(receipt),
                        Ok(None) => {}
                        Err(err) => break SessionOutcome::Failed(err),
                    }
                }
            }
            self.publish();
        };

        ticker.stop();
        self.publish();
        outcome
    }

    async fn apply(&mut self, cmd: SessionCommand) -> Option<SessionOutcome> {
        self.last_error = None;
        let res = match cmd {
            SessionCommand::Select {
                question_id,
                option_index,
            } => self.session.select(&question_id, option_index).map(|_| ()),
            SessionCommand::SelectCurrent(option_index) => {
                self.session.select_current(option_index).map(|_| ())
            }
            SessionCommand::GoTo(index) => {
                self.session.go_to(index);
                Ok(())
            }
            SessionCommand::Next => {
                self.session.next();
                Ok(())
            }
            SessionCommand::Previous => {
                self.session.previous();
                Ok(())
            }
            SessionCommand::Submit => {
                return Some(match self.coordinator.submit_manual(&mut self.session).await {
                    Ok(receipt) => SessionOutcome::Completed(receipt),
                    Err(err) => SessionOutcome::Failed(err),
                });
            }
            SessionCommand::Leave => return Some(self.leave()),
        };

        if let Err(err) = res {
            if err.is_benign() {
                tracing::debug!(error = %err, "command ignored");
            } else {
                tracing::warn!(session_id = %self.session.id(), error = %err, "command rejected");
                self.last_error = Some(err.to_string());
            }
        }
        None
    }

    fn leave(&mut self) -> SessionOutcome {
        self.session.abandon();
        SessionOutcome::Abandoned
    }

    fn publish(&self) {
        let mut snap = self.session.snapshot();
        snap.last_error.clone_from(&self.last_error);
        self.snapshots.send_replace(snap);
    }
}
