//! Competition actor: an isolated Tokio task that owns one competition.
//!
//! Every mutation enters through the actor's channel and is handled to
//! completion, notifications included, before the next command is read.
//! Two joins never interleave, and a timer opening the registration
//! waits its turn behind a member who is leaving.

use std::sync::Arc;

use chrono::NaiveDateTime;
use gameday_core::{CompetitionId, Identity, UserId};
use tokio::sync::{mpsc, oneshot, watch};

use crate::{
    Competition, CompetitionError, CompetitionStatus, EventLog, Notifier, PollRef,
    RegistrationOutcome, Tier,
};

/// An admin change to where and when a game happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleChange {
    Location(String),
    Date(NaiveDateTime),
    DurationMinutes(u32),
}

/// Commands sent to a competition actor through its channel.
///
/// The `oneshot::Sender` in each variant is the reply channel: the caller
/// sends a command and waits for the response on it.
pub(crate) enum CompetitionCommand {
    Register {
        identity: Arc<Identity>,
        claimed: Option<u32>,
        tier: Tier,
        reply: oneshot::Sender<RegistrationOutcome>,
    },
    Deregister {
        user_id: UserId,
        claimed: Option<u32>,
        reply: oneshot::Sender<RegistrationOutcome>,
    },
    Open {
        capacity_max: Option<u32>,
        reply: oneshot::Sender<Result<CompetitionStatus, CompetitionError>>,
    },
    Confirm {
        reply: oneshot::Sender<Result<(), CompetitionError>>,
    },
    Cancel {
        reply: oneshot::Sender<CompetitionStatus>,
    },
    SetCapacityMax {
        capacity_max: u32,
        reply: oneshot::Sender<Vec<UserId>>,
    },
    AttachPoll {
        poll: PollRef,
        reply: oneshot::Sender<()>,
    },
    Reschedule {
        change: ScheduleChange,
        reply: oneshot::Sender<()>,
    },
    RefreshIdentity {
        identity: Arc<Identity>,
        reply: oneshot::Sender<bool>,
    },
    GetInfo {
        reply: oneshot::Sender<CompetitionInfo>,
    },
    Snapshot {
        reply: oneshot::Sender<Competition>,
    },
    Report {
        include_header: bool,
        include_players: bool,
        now: NaiveDateTime,
        reply: oneshot::Sender<String>,
    },
    Shutdown,
}

/// A snapshot of competition metadata (not the rosters themselves).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionInfo {
    pub id: CompetitionId,
    pub status: CompetitionStatus,
    pub capacity: u32,
    pub capacity_max: u32,
    pub location: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub poll_id: Option<String>,
    /// Key of the schedule slot the competition was created from.
    pub slot: Option<String>,
    pub place: String,
}

impl CompetitionInfo {
    fn of(competition: &Competition) -> Self {
        Self {
            id: competition.id().clone(),
            status: competition.status(),
            capacity: competition.capacity(),
            capacity_max: competition.capacity_max(),
            location: competition.location().map(str::to_owned),
            date: competition.date(),
            poll_id: competition.poll().map(|p| p.poll_id.clone()),
            slot: competition.description().map(|d| d.key()),
            place: competition.place(),
        }
    }

    /// Returns `true` if nothing was ever scheduled or nobody holds a place.
    pub fn is_deletable(&self) -> bool {
        (self.date.is_none() && self.location.is_none()) || self.capacity == 0
    }
}

/// Handle to a running competition actor.
///
/// Cheap to clone; it's just an `mpsc::Sender` wrapper.
#[derive(Clone)]
pub struct CompetitionHandle {
    id: CompetitionId,
    sender: mpsc::Sender<CompetitionCommand>,
    info: watch::Receiver<CompetitionInfo>,
}

impl CompetitionHandle {
    pub fn id(&self) -> &CompetitionId {
        &self.id
    }

    /// Info as of the last command the actor finished.
    ///
    /// Does not wait for the actor, so it may lag behind a command that
    /// is still running.
    pub fn info(&self) -> CompetitionInfo {
        self.info.borrow().clone()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> CompetitionCommand,
    ) -> Result<T, CompetitionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| CompetitionError::Unavailable(self.id.clone()))?;
        reply_rx
            .await
            .map_err(|_| CompetitionError::Unavailable(self.id.clone()))
    }

    /// Registers a member (see [`Competition::register`]).
    pub async fn register(
        &self,
        identity: Arc<Identity>,
        claimed: Option<u32>,
        tier: Tier,
    ) -> Result<RegistrationOutcome, CompetitionError> {
        self.request(|reply| CompetitionCommand::Register {
            identity,
            claimed,
            tier,
            reply,
        })
        .await
    }

    /// Deregisters attendees of a member (see [`Competition::deregister`]).
    pub async fn deregister(
        &self,
        user_id: UserId,
        claimed: Option<u32>,
    ) -> Result<RegistrationOutcome, CompetitionError> {
        self.request(|reply| CompetitionCommand::Deregister {
            user_id,
            claimed,
            reply,
        })
        .await
    }

    pub async fn open_registration(
        &self,
        capacity_max: Option<u32>,
    ) -> Result<CompetitionStatus, CompetitionError> {
        self.request(|reply| CompetitionCommand::Open {
            capacity_max,
            reply,
        })
        .await?
    }

    pub async fn confirm_and_close(&self) -> Result<(), CompetitionError> {
        self.request(|reply| CompetitionCommand::Confirm { reply })
            .await?
    }

    /// Cancels the game. Returns the status it had before.
    pub async fn cancel(&self) -> Result<CompetitionStatus, CompetitionError> {
        self.request(|reply| CompetitionCommand::Cancel { reply })
            .await
    }

    /// Changes the capacity. Returns the members demoted to the waitlist.
    pub async fn set_capacity_max(
        &self,
        capacity_max: u32,
    ) -> Result<Vec<UserId>, CompetitionError> {
        self.request(|reply| CompetitionCommand::SetCapacityMax {
            capacity_max,
            reply,
        })
        .await
    }

    pub async fn attach_poll(&self, poll: PollRef) -> Result<(), CompetitionError> {
        self.request(|reply| CompetitionCommand::AttachPoll { poll, reply })
            .await
    }

    pub async fn reschedule(&self, change: ScheduleChange) -> Result<(), CompetitionError> {
        self.request(|reply| CompetitionCommand::Reschedule { change, reply })
            .await
    }

    /// Replaces the roster copy of a member whose profile changed.
    /// Returns `true` if the member is registered here.
    pub async fn refresh_identity(
        &self,
        identity: Arc<Identity>,
    ) -> Result<bool, CompetitionError> {
        self.request(|reply| CompetitionCommand::RefreshIdentity { identity, reply })
            .await
    }

    /// Current info, after every command queued before this one.
    pub async fn get_info(&self) -> Result<CompetitionInfo, CompetitionError> {
        self.request(|reply| CompetitionCommand::GetInfo { reply })
            .await
    }

    /// A full copy of the competition, for persistence or inspection.
    pub async fn snapshot(&self) -> Result<Competition, CompetitionError> {
        self.request(|reply| CompetitionCommand::Snapshot { reply })
            .await
    }

    pub async fn report(
        &self,
        include_header: bool,
        include_players: bool,
        now: NaiveDateTime,
    ) -> Result<String, CompetitionError> {
        self.request(|reply| CompetitionCommand::Report {
            include_header,
            include_players,
            now,
            reply,
        })
        .await
    }

    /// Tells the actor to stop. Commands already queued are dropped.
    pub async fn shutdown(&self) -> Result<(), CompetitionError> {
        self.sender
            .send(CompetitionCommand::Shutdown)
            .await
            .map_err(|_| CompetitionError::Unavailable(self.id.clone()))
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct CompetitionActor<N: Notifier, L: EventLog> {
    competition: Competition,
    notifier: Arc<N>,
    history: Arc<L>,
    receiver: mpsc::Receiver<CompetitionCommand>,
    info: watch::Sender<CompetitionInfo>,
}

impl<N: Notifier, L: EventLog> CompetitionActor<N, L> {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        let id = self.competition.id().clone();
        tracing::debug!(competition_id = %id, "competition actor started");

        while let Some(cmd) = self.receiver.recv().await {
            let notifier = self.notifier.as_ref();
            let history = self.history.as_ref();
            match cmd {
                CompetitionCommand::Register {
                    identity,
                    claimed,
                    tier,
                    reply,
                } => {
                    let outcome = self
                        .competition
                        .register(identity, claimed, tier, notifier, history)
                        .await;
                    publish(&self.info, &self.competition);
                    let _ = reply.send(outcome);
                }
                CompetitionCommand::Deregister {
                    user_id,
                    claimed,
                    reply,
                } => {
                    let outcome = self
                        .competition
                        .deregister(user_id, claimed, notifier, history)
                        .await;
                    publish(&self.info, &self.competition);
                    let _ = reply.send(outcome);
                }
                CompetitionCommand::Open {
                    capacity_max,
                    reply,
                } => {
                    let result = self.competition.open_registration(capacity_max);
                    publish(&self.info, &self.competition);
                    let _ = reply.send(result);
                }
                CompetitionCommand::Confirm { reply } => {
                    let result = self.competition.confirm_and_close();
                    publish(&self.info, &self.competition);
                    let _ = reply.send(result);
                }
                CompetitionCommand::Cancel { reply } => {
                    let previous = self.competition.status();
                    self.competition.cancel();
                    publish(&self.info, &self.competition);
                    let _ = reply.send(previous);
                }
                CompetitionCommand::SetCapacityMax {
                    capacity_max,
                    reply,
                } => {
                    let demoted = self
                        .competition
                        .set_capacity_max(capacity_max, notifier, history)
                        .await;
                    publish(&self.info, &self.competition);
                    let _ = reply.send(demoted);
                }
                CompetitionCommand::AttachPoll { poll, reply } => {
                    self.competition.attach_poll(poll);
                    publish(&self.info, &self.competition);
                    let _ = reply.send(());
                }
                CompetitionCommand::Reschedule { change, reply } => {
                    match change {
                        ScheduleChange::Location(location) => {
                            self.competition.set_location(location)
                        }
                        ScheduleChange::Date(date) => self.competition.set_date(date),
                        ScheduleChange::DurationMinutes(minutes) => {
                            self.competition.set_duration(minutes)
                        }
                    }
                    publish(&self.info, &self.competition);
                    let _ = reply.send(());
                }
                CompetitionCommand::RefreshIdentity { identity, reply } => {
                    let _ = reply.send(self.competition.refresh_identity(&identity));
                }
                CompetitionCommand::GetInfo { reply } => {
                    let _ = reply.send(CompetitionInfo::of(&self.competition));
                }
                CompetitionCommand::Snapshot { reply } => {
                    let _ = reply.send(self.competition.clone());
                }
                CompetitionCommand::Report {
                    include_header,
                    include_players,
                    now,
                    reply,
                } => {
                    let _ = reply.send(self.competition.report(
                        include_header,
                        include_players,
                        now,
                    ));
                }
                CompetitionCommand::Shutdown => {
                    tracing::debug!(competition_id = %id, "competition shutting down");
                    break;
                }
            }
        }

        tracing::debug!(competition_id = %id, "competition actor stopped");
    }
}

fn publish(info: &watch::Sender<CompetitionInfo>, competition: &Competition) {
    info.send_replace(CompetitionInfo::of(competition));
}

/// Spawns a competition actor task and returns a handle to it.
///
/// `channel_size` controls backpressure: when the queue is full,
/// senders wait.
pub(crate) fn spawn_competition<N: Notifier, L: EventLog>(
    competition: Competition,
    notifier: Arc<N>,
    history: Arc<L>,
    channel_size: usize,
) -> CompetitionHandle {
    let (tx, rx) = mpsc::channel(channel_size.max(1));
    let (info_tx, info_rx) = watch::channel(CompetitionInfo::of(&competition));
    let id = competition.id().clone();

    let actor = CompetitionActor {
        competition,
        notifier,
        history,
        receiver: rx,
        info: info_tx,
    };

    tokio::spawn(actor.run());

    CompetitionHandle {
        id,
        sender: tx,
        info: info_rx,
    }
}
