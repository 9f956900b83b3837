//! `GamedayService`: the entry point for the chat layer.
//!
//! The service ties the layers together: it resolves chat members into
//! identities, finds the competition a request is about, forwards the
//! request to that competition's actor, and tells the chat what changed.

use std::sync::Arc;

use chrono::NaiveDateTime;
use gameday_competition::{
    Competition, CompetitionHandle, CompetitionInfo, CompetitionManager, CompetitionStatus,
    EventLog, MessageCode, Notifier, PollRef, RegistrationOutcome, ScheduleChange, Tier,
};
use gameday_core::{Codec, CompetitionId, GameEvent, Identity, TrustLevel, UserId};
use gameday_identity::{IdentityLookup, IdentityStore};
use gameday_schedule::RegistrationOpener;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{GamedayConfig, GamedayError};

/// Poll option that joins the main roster.
pub const POLL_OPTION_MAIN: u32 = 0;
/// Poll option that joins the waitlist.
pub const POLL_OPTION_SPARE: u32 = 1;

/// Everything a restart needs, in one document.
#[derive(Serialize, Deserialize)]
struct ServiceSnapshot {
    identities: IdentityStore,
    competitions: Vec<Competition>,
}

/// Builder for a [`GamedayService`].
///
/// # Example
///
/// ```rust,ignore
/// let service = GamedayServiceBuilder::new()
///     .config(GamedayConfig::load("gameday.toml")?)
///     .build(Arc::new(my_notifier), Arc::new(MemoryHistory::new()));
/// ```
pub struct GamedayServiceBuilder {
    config: GamedayConfig,
    identities: IdentityStore,
    clock: fn() -> NaiveDateTime,
}

impl GamedayServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: GamedayConfig::default(),
            identities: IdentityStore::new(),
            clock: gameday_core::local_now,
        }
    }

    pub fn config(mut self, config: GamedayConfig) -> Self {
        self.config = config;
        self
    }

    /// Starts from an existing member list.
    pub fn identities(mut self, identities: IdentityStore) -> Self {
        self.identities = identities;
        self
    }

    /// Replaces the wall clock, e.g. to pin "today" in tests.
    pub fn clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn build<N: Notifier, L: EventLog>(
        self,
        notifier: Arc<N>,
        history: Arc<L>,
    ) -> GamedayService<N, L> {
        let manager = CompetitionManager::new(
            Arc::clone(&notifier),
            Arc::clone(&history),
            self.config.competition.clone(),
        );
        GamedayService {
            identities: Mutex::new(self.identities),
            competitions: Mutex::new(manager),
            notifier,
            history,
            config: self.config,
            clock: self.clock,
        }
    }
}

impl Default for GamedayServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The registration service for one community.
///
/// Shared between the chat handlers and the auto-open loop behind an
/// `Arc`. The manager lock is only held to look competitions up, and
/// lookups read the info each actor publishes instead of asking it. The
/// actual work happens on cloned handles, so a slow notifier in one
/// competition does not block the others.
pub struct GamedayService<N: Notifier, L: EventLog> {
    identities: Mutex<IdentityStore>,
    competitions: Mutex<CompetitionManager<N, L>>,
    notifier: Arc<N>,
    history: Arc<L>,
    config: GamedayConfig,
    clock: fn() -> NaiveDateTime,
}

impl<N: Notifier, L: EventLog> GamedayService<N, L> {
    pub fn config(&self) -> &GamedayConfig {
        &self.config
    }

    pub fn history(&self) -> &Arc<L> {
        &self.history
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    /// Records a chat member as the platform reports them.
    ///
    /// A changed profile is pushed to every roster the member is on.
    pub async fn member(
        &self,
        user_id: UserId,
        name: &str,
        full_name: Option<&str>,
        language: Option<&str>,
    ) -> Arc<Identity> {
        let (identity, changed) = {
            let mut identities = self.identities.lock().await;
            let previous = identities.find(user_id).cloned();
            let identity = identities.find_or_add(user_id, name, full_name, language);
            let changed = previous.is_some_and(|previous| *previous != *identity);
            (identity, changed)
        };
        if changed {
            self.refresh_rosters(&identity).await;
        }
        identity
    }

    pub async fn set_trust(
        &self,
        user_id: UserId,
        trust: TrustLevel,
    ) -> Result<Arc<Identity>, GamedayError> {
        let identity = self.identities.lock().await.set_trust(user_id, trust)?;
        self.refresh_rosters(&identity).await;
        Ok(identity)
    }

    async fn refresh_rosters(&self, identity: &Arc<Identity>) {
        let handles = self.competitions.lock().await.handles();
        for handle in handles {
            if let Err(error) = handle.refresh_identity(Arc::clone(identity)).await {
                tracing::warn!(competition_id = %handle.id(), %error, "roster refresh failed");
            }
        }
    }

    pub async fn lookup(&self, user_id: UserId) -> Option<Arc<Identity>> {
        self.identities.lock().await.lookup(user_id)
    }

    // -----------------------------------------------------------------------
    // Competitions
    // -----------------------------------------------------------------------

    /// Creates a competition from a schedule slot, or an empty one.
    pub async fn create_competition(&self, event: Option<GameEvent>) -> CompetitionId {
        self.competitions.lock().await.create(event).id().clone()
    }

    pub async fn competition(&self, id: &CompetitionId) -> Result<CompetitionHandle, GamedayError> {
        Ok(self.competitions.lock().await.get(id)?)
    }

    /// Info about every competition, oldest first.
    pub async fn competitions(&self) -> Vec<CompetitionInfo> {
        self.competitions.lock().await.list()
    }

    async fn single_open(&self) -> Result<CompetitionHandle, GamedayError> {
        Ok(self.competitions.lock().await.single_open_or_full()?)
    }

    // -----------------------------------------------------------------------
    // Join and leave
    // -----------------------------------------------------------------------

    /// Joins the competition that currently takes registrations.
    ///
    /// # Errors
    /// - [`GamedayError::Identity`]: the member is unknown or not trusted
    /// - [`GamedayError::Competition`]: no single open competition
    pub async fn join(
        &self,
        user_id: UserId,
        claimed: Option<u32>,
        tier: Tier,
    ) -> Result<RegistrationOutcome, GamedayError> {
        let handle = self.single_open().await?;
        self.register(&handle, user_id, claimed, tier).await
    }

    /// Joins a specific competition.
    pub async fn join_competition(
        &self,
        id: &CompetitionId,
        user_id: UserId,
        claimed: Option<u32>,
        tier: Tier,
    ) -> Result<RegistrationOutcome, GamedayError> {
        let handle = self.competition(id).await?;
        self.register(&handle, user_id, claimed, tier).await
    }

    /// Leaves the competition that currently takes registrations.
    pub async fn leave(
        &self,
        user_id: UserId,
        claimed: Option<u32>,
    ) -> Result<RegistrationOutcome, GamedayError> {
        let handle = self.single_open().await?;
        self.deregister(&handle, user_id, claimed).await
    }

    pub async fn leave_competition(
        &self,
        id: &CompetitionId,
        user_id: UserId,
        claimed: Option<u32>,
    ) -> Result<RegistrationOutcome, GamedayError> {
        let handle = self.competition(id).await?;
        self.deregister(&handle, user_id, claimed).await
    }

    /// Handles a vote on a registration poll.
    ///
    /// Option 0 joins the main roster, option 1 the waitlist. An empty
    /// answer is a retracted vote and leaves the game. Other options are
    /// ignored and yield `None`.
    pub async fn poll_answer(
        &self,
        poll_id: &str,
        user_id: UserId,
        options: &[u32],
    ) -> Result<Option<RegistrationOutcome>, GamedayError> {
        let handle = self.competitions.lock().await.find_by_poll(poll_id)?;
        let outcome = match options.first().copied() {
            None => self.deregister(&handle, user_id, None).await?,
            Some(POLL_OPTION_MAIN) => self.register(&handle, user_id, None, Tier::Main).await?,
            Some(POLL_OPTION_SPARE) => self.register(&handle, user_id, None, Tier::Spare).await?,
            Some(option) => {
                tracing::debug!(poll_id, %user_id, option, "ignoring poll option");
                return Ok(None);
            }
        };
        Ok(Some(outcome))
    }

    async fn register(
        &self,
        handle: &CompetitionHandle,
        user_id: UserId,
        claimed: Option<u32>,
        tier: Tier,
    ) -> Result<RegistrationOutcome, GamedayError> {
        let identity = self.identities.lock().await.require_registrant(user_id)?;
        let outcome = handle.register(identity, claimed, tier).await?;
        if outcome.is_change() {
            self.broadcast_participants(handle).await?;
        }
        Ok(outcome)
    }

    async fn deregister(
        &self,
        handle: &CompetitionHandle,
        user_id: UserId,
        claimed: Option<u32>,
    ) -> Result<RegistrationOutcome, GamedayError> {
        let outcome = handle.deregister(user_id, claimed).await?;
        if outcome.main {
            self.warn_admins_on_game_day(handle, user_id).await?;
        }
        if outcome.is_change() {
            self.broadcast_participants(handle).await?;
        }
        Ok(outcome)
    }

    /// Admins want to know when someone drops out on the day of the game.
    async fn warn_admins_on_game_day(
        &self,
        handle: &CompetitionHandle,
        user_id: UserId,
    ) -> Result<(), GamedayError> {
        let info = handle.get_info().await?;
        let today = self.now().date();
        if !info.date.is_some_and(|date| date.date() == today) {
            return Ok(());
        }
        let text = {
            let identities = self.identities.lock().await;
            let who = identities
                .find(user_id)
                .map(|identity| identity.mention())
                .unwrap_or_else(|| user_id.to_string());
            format!("{}: {who} left {} today.", identities.admins_mention(), info.place)
        };
        tracing::info!(competition_id = %info.id, %user_id, "deregistration on game day");
        self.notifier
            .notify_chat(&text, MessageCode::Status, false)
            .await;
        Ok(())
    }

    async fn broadcast_participants(&self, handle: &CompetitionHandle) -> Result<(), GamedayError> {
        let report = handle.report(true, true, self.now()).await?;
        self.notifier
            .notify_chat(&report, MessageCode::Participants, true)
            .await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Admin actions
    // -----------------------------------------------------------------------

    /// Opens the registration and announces it.
    pub async fn open(
        &self,
        id: &CompetitionId,
        capacity_max: Option<u32>,
    ) -> Result<CompetitionStatus, GamedayError> {
        let handle = self.competition(id).await?;
        if let Some(capacity) = capacity_max {
            self.check_capacity(&handle.get_info().await?, capacity)?;
        }
        let status = handle.open_registration(capacity_max).await?;
        self.announce_open(&handle).await?;
        Ok(status)
    }

    async fn announce_open(&self, handle: &CompetitionHandle) -> Result<(), GamedayError> {
        let info = handle.get_info().await?;
        let text = format!(
            "Registration is open: {}, {} places.",
            info.place, info.capacity_max
        );
        self.notifier
            .notify_chat(&text, MessageCode::Status, true)
            .await;
        Ok(())
    }

    /// Attaches the chat poll that announces a competition.
    pub async fn attach_poll(&self, id: &CompetitionId, poll: PollRef) -> Result<(), GamedayError> {
        Ok(self.competition(id).await?.attach_poll(poll).await?)
    }

    /// Closes the registration: the game is on.
    pub async fn confirm(&self, id: &CompetitionId) -> Result<(), GamedayError> {
        let handle = self.competition(id).await?;
        handle.confirm_and_close().await?;
        let info = handle.get_info().await?;

        let mut text = format!("Game confirmed: {}, {} players.", info.place, info.capacity);
        if let Some(date) = info.date {
            if self.history.record_attendance(info.capacity, date) {
                text.push_str(" That's a new attendance record!");
            }
        }
        self.notifier
            .notify_chat(&text, MessageCode::Status, true)
            .await;
        Ok(())
    }

    /// Cancels a competition. Returns the status it had before.
    ///
    /// If registration was running, every player on the main roster is
    /// told privately and the chat gets an announcement.
    pub async fn cancel(&self, id: &CompetitionId) -> Result<CompetitionStatus, GamedayError> {
        let handle = self.competition(id).await?;
        let previous = handle.cancel().await?;
        if previous.is_open_or_full() {
            let competition = handle.snapshot().await?;
            let text = format!("The game at {} is cancelled.", competition.place());
            for participant in competition.confirmed() {
                self.notifier
                    .notify_user(&participant.identity, &text)
                    .await;
            }
            self.notifier
                .notify_chat(&text, MessageCode::Status, true)
                .await;
        }
        Ok(previous)
    }

    /// Changes the number of places. Returns the members moved to the waitlist.
    ///
    /// # Errors
    /// [`GamedayError::CapacityNotOffered`] if the competition's facility
    /// cannot be booked for `capacity_max`.
    pub async fn set_capacity_max(
        &self,
        id: &CompetitionId,
        capacity_max: u32,
    ) -> Result<Vec<UserId>, GamedayError> {
        let handle = self.competition(id).await?;
        let info = handle.get_info().await?;
        self.check_capacity(&info, capacity_max)?;

        let demoted = handle.set_capacity_max(capacity_max).await?;
        if info.status.is_open_or_full() {
            let text = format!("{} now has {capacity_max} places.", info.place);
            self.notifier
                .notify_chat(&text, MessageCode::Status, true)
                .await;
            self.broadcast_participants(&handle).await?;
        }
        Ok(demoted)
    }

    fn check_capacity(&self, info: &CompetitionInfo, capacity: u32) -> Result<(), GamedayError> {
        let Some(location) = info.location.as_deref() else {
            return Ok(());
        };
        match self.config.facility(location) {
            Some(facility) if !facility.offers(capacity) => Err(GamedayError::CapacityNotOffered {
                facility: location.to_owned(),
                capacity,
                options: facility.capacity_options.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Moves a competition to another facility. Returns the facility's
    /// address if it is configured.
    ///
    /// A competition without a capacity yet takes the facility's usual one.
    pub async fn set_location(
        &self,
        id: &CompetitionId,
        facility: &str,
    ) -> Result<Option<String>, GamedayError> {
        let handle = self.competition(id).await?;
        handle
            .reschedule(ScheduleChange::Location(facility.to_owned()))
            .await?;
        let Some(config) = self.config.facility(facility) else {
            return Ok(None);
        };
        if config.capacity > 0 && handle.info().capacity_max == 0 {
            handle.set_capacity_max(config.capacity).await?;
        }
        Ok(config.address.clone())
    }

    pub async fn reschedule(
        &self,
        id: &CompetitionId,
        change: ScheduleChange,
    ) -> Result<(), GamedayError> {
        Ok(self.competition(id).await?.reschedule(change).await?)
    }

    /// Deletes a competition nobody is registered for.
    pub async fn delete(&self, id: &CompetitionId) -> Result<(), GamedayError> {
        Ok(self.competitions.lock().await.delete(id).await?)
    }

    /// Forgets competitions whose date has passed.
    pub async fn evict_past(&self) -> Vec<CompetitionId> {
        let now = self.now();
        self.competitions.lock().await.evict_past(now).await
    }

    pub async fn report(
        &self,
        id: &CompetitionId,
        include_header: bool,
        include_players: bool,
    ) -> Result<String, GamedayError> {
        let handle = self.competition(id).await?;
        Ok(handle.report(include_header, include_players, self.now()).await?)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Encodes members and competitions into one document.
    pub async fn snapshot<C: Codec>(&self, codec: &C) -> Result<Vec<u8>, GamedayError> {
        let competitions = self.competitions.lock().await.competitions().await?;
        let identities = self.identities.lock().await.clone();
        Ok(codec.encode(&ServiceSnapshot {
            identities,
            competitions,
        })?)
    }

    /// Loads a document written by [`Self::snapshot`]. Members and
    /// running competitions are replaced; past competitions are dropped.
    /// Returns the number of competitions restored.
    ///
    /// Roster entries are relinked to the restored member records.
    pub async fn restore<C: Codec>(&self, codec: &C, bytes: &[u8]) -> Result<usize, GamedayError> {
        let ServiceSnapshot {
            identities,
            mut competitions,
        } = codec.decode(bytes)?;
        for competition in &mut competitions {
            for identity in identities.iter() {
                competition.refresh_identity(identity);
            }
        }
        let restored = self
            .competitions
            .lock()
            .await
            .replace_all(competitions, self.now())
            .await?;
        *self.identities.lock().await = identities;
        Ok(restored)
    }
}

impl<N: Notifier, L: EventLog> RegistrationOpener for GamedayService<N, L> {
    type Error = GamedayError;

    async fn open_registration(&self, event: &GameEvent) -> Result<bool, GamedayError> {
        let opened = self.competitions.lock().await.auto_open(event).await?;
        let Some(id) = opened else {
            return Ok(false);
        };
        let handle = self.competition(&id).await?;
        self.announce_open(&handle).await?;
        Ok(true)
    }
}
