//! Discord Rich Presence adapter.
//!
//! Runs a `DiscordIpcClient` on a dedicated OS thread (IPC is blocking)
//! and exposes an async `DiscordHandle` that sends commands over an MPSC
//! channel and awaits each answer on a oneshot.

use std::sync::mpsc;
use std::time::Duration;

use discord_rich_presence::{activity, DiscordIpc, DiscordIpcClient};
use thiserror::Error;
use tokio::sync::oneshot;

use encore_core::{Activity, PresenceService};

#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("discord IPC error: {0}")]
    Ipc(String),

    #[error("not logged in")]
    NotConnected,

    #[error("discord thread has stopped")]
    ActorGone,

    #[error("discord did not answer within {0:?}")]
    Timeout(Duration),
}

type Reply = oneshot::Sender<Result<(), DiscordError>>;

/// Commands sent to the Discord actor thread.
enum DiscordCommand {
    Login { application_id: String, reply: Reply },
    SetActivity { activity: Activity, reply: Reply },
    Logout { reply: Reply },
}

/// Cloneable handle to the Discord actor thread.
#[derive(Clone)]
pub struct DiscordHandle {
    tx: mpsc::Sender<DiscordCommand>,
    timeout: Duration,
}

impl DiscordHandle {
    /// Spawn the actor thread. Each command waits at most `timeout` for an answer.
    pub fn start(timeout: Duration) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();

        std::thread::Builder::new()
            .name("discord-rpc".into())
            .spawn(move || actor_loop(rx))?;

        Ok(Self { tx, timeout })
    }

    async fn request(&self, command: impl FnOnce(Reply) -> DiscordCommand) -> Result<(), DiscordError> {
        let (reply, answer) = oneshot::channel();
        self.tx
            .send(command(reply))
            .map_err(|_| DiscordError::ActorGone)?;

        match tokio::time::timeout(self.timeout, answer).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(DiscordError::ActorGone),
            Err(_) => Err(DiscordError::Timeout(self.timeout)),
        }
    }
}

impl PresenceService for DiscordHandle {
    type Error = DiscordError;

    async fn login(&self, application_id: &str) -> Result<(), DiscordError> {
        let application_id = application_id.to_string();
        self.request(|reply| DiscordCommand::Login {
            application_id,
            reply,
        })
        .await
    }

    async fn set_activity(&self, activity: Activity) -> Result<(), DiscordError> {
        self.request(|reply| DiscordCommand::SetActivity { activity, reply })
            .await
    }

    async fn logout(&self) -> Result<(), DiscordError> {
        self.request(|reply| DiscordCommand::Logout { reply }).await
    }
}

/// Connection owned by the actor. The application id outlives a dropped
/// client so a dead pipe can be reopened on the next update.
#[derive(Default)]
struct Connection {
    application_id: Option<String>,
    client: Option<DiscordIpcClient>,
}

impl Connection {
    fn connect(&mut self, application_id: &str) -> Result<(), DiscordError> {
        let mut client = DiscordIpcClient::new(application_id);
        client
            .connect()
            .map_err(|e| DiscordError::Ipc(e.to_string()))?;
        tracing::info!("connected to Discord IPC");
        self.application_id = Some(application_id.to_string());
        self.client = Some(client);
        Ok(())
    }

    fn set_activity(&mut self, activity: &Activity) -> Result<(), DiscordError> {
        if self.client.is_none() {
            let Some(application_id) = self.application_id.clone() else {
                return Err(DiscordError::NotConnected);
            };
            tracing::debug!("reconnecting to Discord IPC");
            self.connect(&application_id)?;
        }

        let Some(ipc) = self.client.as_mut() else {
            return Err(DiscordError::NotConnected);
        };
        if let Err(e) = ipc.set_activity(payload(activity)) {
            // Pipe probably died; reopen on the next update.
            self.client = None;
            return Err(DiscordError::Ipc(e.to_string()));
        }
        Ok(())
    }

    fn close(&mut self) {
        self.application_id = None;
        if let Some(mut ipc) = self.client.take() {
            if let Err(e) = ipc.clear_activity() {
                tracing::debug!(error = %e, "failed to clear Discord activity");
            }
            let _ = ipc.close();
        }
    }
}

/// The actor loop: owns the IPC client and processes commands until every
/// handle is dropped.
fn actor_loop(rx: mpsc::Receiver<DiscordCommand>) {
    let mut conn = Connection::default();

    for cmd in rx {
        match cmd {
            DiscordCommand::Login {
                application_id,
                reply,
            } => {
                conn.close();
                let _ = reply.send(conn.connect(&application_id));
            }
            DiscordCommand::SetActivity { activity, reply } => {
                let _ = reply.send(conn.set_activity(&activity));
            }
            DiscordCommand::Logout { reply } => {
                conn.close();
                let _ = reply.send(Ok(()));
            }
        }
    }

    conn.close();
}

/// Map the status payload onto the IPC activity builder.
fn payload(a: &Activity) -> activity::Activity<'_> {
    let mut payload = activity::Activity::new()
        .details(&a.details)
        .state(&a.state)
        .timestamps(activity::Timestamps::new().start(a.start_timestamp))
        .assets(
            activity::Assets::new()
                .large_image(&a.large_image)
                .large_text(&a.large_text)
                .small_image(&a.small_image)
                .small_text(&a.small_text),
        );

    if !a.buttons.is_empty() {
        payload = payload.buttons(
            a.buttons
                .iter()
                .map(|b| activity::Button::new(&b.label, &b.url))
                .collect(),
        );
    }
    payload
}
