//! Competition manager: creates, tracks, and looks up competitions.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use gameday_core::{Codec, CompetitionId, CoreError, GameEvent};

use crate::actor::spawn_competition;
use crate::{
    Competition, CompetitionConfig, CompetitionError, CompetitionHandle, CompetitionInfo,
    CompetitionStatus, EventLog, Notifier,
};

/// Registry of every known competition, each running as its own actor.
///
/// This is the entry point for competition operations from the service
/// layer. The manager itself is not shared between tasks; callers that
/// need it from several places wrap it in a `tokio::sync::Mutex` and
/// clone handles out before awaiting long operations.
///
/// Lookups (by poll, by slot, the single open competition) read the info
/// each actor publishes after every command. They never wait on an actor,
/// so a competition stuck on a slow notifier does not hold the others up.
pub struct CompetitionManager<N: Notifier, L: EventLog> {
    /// Active competitions, ordered by id (and thus by creation time).
    competitions: BTreeMap<CompetitionId, CompetitionHandle>,
    notifier: Arc<N>,
    history: Arc<L>,
    config: CompetitionConfig,
}

impl<N: Notifier, L: EventLog> CompetitionManager<N, L> {
    /// Creates a new, empty manager.
    pub fn new(notifier: Arc<N>, history: Arc<L>, config: CompetitionConfig) -> Self {
        Self {
            competitions: BTreeMap::new(),
            notifier,
            history,
            config,
        }
    }

    /// Creates a competition from a schedule slot, or an empty one.
    pub fn create(&mut self, event: Option<GameEvent>) -> CompetitionHandle {
        let competition = match event {
            Some(event) => Competition::from_event(event, &self.config),
            None => Competition::ad_hoc(&self.config),
        };
        tracing::info!(
            competition_id = %competition.id(),
            place = %competition.place(),
            "competition created"
        );
        self.insert(competition)
    }

    /// Starts an actor for an existing competition and tracks it.
    ///
    /// A competition with the same id is replaced; its actor is left to
    /// stop once its last handle is dropped.
    pub fn insert(&mut self, competition: Competition) -> CompetitionHandle {
        let handle = spawn_competition(
            competition,
            Arc::clone(&self.notifier),
            Arc::clone(&self.history),
            self.config.channel_size,
        );
        self.competitions.insert(handle.id().clone(), handle.clone());
        handle
    }

    pub fn get(&self, id: &CompetitionId) -> Result<CompetitionHandle, CompetitionError> {
        self.competitions
            .get(id)
            .cloned()
            .ok_or_else(|| CompetitionError::NotFound(id.clone()))
    }

    /// Finds the competition a chat poll belongs to.
    pub fn find_by_poll(&self, poll_id: &str) -> Result<CompetitionHandle, CompetitionError> {
        self.competitions
            .values()
            .find(|handle| handle.info().poll_id.as_deref() == Some(poll_id))
            .cloned()
            .ok_or_else(|| CompetitionError::PollNotFound(poll_id.to_owned()))
    }

    /// Finds the competition held at `location` on `date`.
    pub fn find_by_slot(&self, date: NaiveDateTime, location: &str) -> Option<CompetitionHandle> {
        self.competitions
            .values()
            .find(|handle| {
                let info = handle.info();
                info.date == Some(date) && info.location.as_deref() == Some(location)
            })
            .cloned()
    }

    /// Info about every competition as last published, oldest first.
    pub fn list(&self) -> Vec<CompetitionInfo> {
        self.competitions.values().map(CompetitionHandle::info).collect()
    }

    /// Number of competitions whose registration is open and not full.
    pub fn open_count(&self) -> usize {
        self.list()
            .iter()
            .filter(|info| info.status == CompetitionStatus::Open)
            .count()
    }

    pub fn open_or_full_count(&self) -> usize {
        self.list()
            .iter()
            .filter(|info| info.status.is_open_or_full())
            .count()
    }

    /// The one competition currently taking registrations.
    ///
    /// # Errors
    /// [`CompetitionError::NotSingleOpen`] when there is none or more than one.
    pub fn single_open_or_full(&self) -> Result<CompetitionHandle, CompetitionError> {
        let open: Vec<_> = self
            .list()
            .into_iter()
            .filter(|info| info.status.is_open_or_full())
            .collect();
        match open.as_slice() {
            [info] => self.get(&info.id),
            _ => Err(CompetitionError::NotSingleOpen(open.len())),
        }
    }

    /// Deletes a competition that was never scheduled or that nobody joined.
    pub async fn delete(&mut self, id: &CompetitionId) -> Result<(), CompetitionError> {
        let info = self.get(id)?.get_info().await?;
        if !info.is_deletable() {
            return Err(CompetitionError::NotDeletable(id.clone()));
        }
        self.remove(id).await;
        Ok(())
    }

    async fn remove(&mut self, id: &CompetitionId) {
        if let Some(handle) = self.competitions.remove(id) {
            let _ = handle.shutdown().await;
            tracing::info!(competition_id = %id, "competition removed");
        }
    }

    /// Drops competitions whose date is before `now`. Returns their ids.
    pub async fn evict_past(&mut self, now: NaiveDateTime) -> Vec<CompetitionId> {
        let past: Vec<_> = self
            .list()
            .into_iter()
            .filter(|info| info.date.is_some_and(|date| date < now))
            .map(|info| info.id)
            .collect();
        for id in &past {
            self.remove(id).await;
        }
        past
    }

    /// Copies of every competition, oldest first.
    pub async fn competitions(&self) -> Result<Vec<Competition>, CompetitionError> {
        let mut competitions = Vec::with_capacity(self.competitions.len());
        for handle in self.competitions.values() {
            competitions.push(handle.snapshot().await?);
        }
        Ok(competitions)
    }

    /// Encodes every competition, oldest first.
    pub async fn snapshot<C: Codec>(&self, codec: &C) -> Result<Vec<u8>, CompetitionError> {
        Ok(codec.encode(&self.competitions().await?)?)
    }

    /// Loads competitions from a snapshot (see [`Self::restore_all`]).
    pub fn restore<C: Codec>(
        &mut self,
        codec: &C,
        bytes: &[u8],
        now: NaiveDateTime,
    ) -> Result<usize, CompetitionError> {
        let competitions: Vec<Competition> = codec.decode(bytes)?;
        self.restore_all(competitions, now)
    }

    /// Starts actors for restored competitions, skipping those dated
    /// before `now`. Competitions already running are kept; one with the
    /// same id as a restored competition is replaced.
    ///
    /// Nothing is restored if any competition breaks the roster
    /// invariants. Returns the number of competitions restored.
    pub fn restore_all(
        &mut self,
        competitions: Vec<Competition>,
        now: NaiveDateTime,
    ) -> Result<usize, CompetitionError> {
        check_all(&competitions)?;

        let mut restored = 0;
        for competition in competitions {
            if competition.date().is_some_and(|date| date < now) {
                tracing::debug!(competition_id = %competition.id(), "skipping past competition");
                continue;
            }
            self.insert(competition);
            restored += 1;
        }
        tracing::info!(restored, "competitions restored");
        Ok(restored)
    }

    /// Like [`Self::restore_all`], but stops every running competition
    /// first, so afterwards only the restored ones exist.
    ///
    /// Nothing is stopped if any competition breaks the roster invariants.
    pub async fn replace_all(
        &mut self,
        competitions: Vec<Competition>,
        now: NaiveDateTime,
    ) -> Result<usize, CompetitionError> {
        check_all(&competitions)?;
        for id in self.ids() {
            self.remove(&id).await;
        }
        self.restore_all(competitions, now)
    }

    /// Opens the registration for a schedule slot.
    ///
    /// Creates the competition if the slot has none yet. Only a
    /// competition that is still Scheduled is opened: one an admin already
    /// opened, confirmed or cancelled is left alone. Returns the id of the
    /// competition that was opened, if any.
    pub async fn auto_open(
        &mut self,
        event: &GameEvent,
    ) -> Result<Option<CompetitionId>, CompetitionError> {
        let handle = match self.find_by_slot(event.date, &event.location) {
            Some(handle) => handle,
            None => self.create(Some(event.clone())),
        };
        let info = handle.get_info().await?;
        if info.status != CompetitionStatus::Scheduled {
            tracing::debug!(competition_id = %info.id, status = %info.status, "auto open skipped");
            return Ok(None);
        }
        handle.open_registration(Some(event.capacity)).await?;
        tracing::info!(competition_id = %info.id, slot = %event.key(), "registration opened automatically");
        Ok(Some(info.id))
    }

    pub fn len(&self) -> usize {
        self.competitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.competitions.is_empty()
    }

    pub fn ids(&self) -> Vec<CompetitionId> {
        self.competitions.keys().cloned().collect()
    }

    /// Cloned handles to every competition, oldest first.
    pub fn handles(&self) -> Vec<CompetitionHandle> {
        self.competitions.values().cloned().collect()
    }
}

fn check_all(competitions: &[Competition]) -> Result<(), CompetitionError> {
    for competition in competitions {
        competition
            .check_invariants()
            .map_err(CoreError::InvalidData)?;
    }
    Ok(())
}
