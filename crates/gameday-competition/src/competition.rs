//! The competition: one game session's rosters, capacity, and status.
//!
//! All roster rules live here. A `Competition` is plain data plus the
//! operations that change it; it does not spawn tasks or lock anything.
//! The actor in [`crate::actor`] owns one and feeds it commands one at a
//! time, which is what keeps every join and leave atomic.

use std::sync::Arc;

use chrono::NaiveDateTime;
use gameday_core::{CompetitionId, EventKind, GameEvent, Identity, RegistrationEvent, UserId};
use serde::{Deserialize, Serialize};

use crate::{
    CompetitionConfig, CompetitionError, CompetitionStatus, EventLog, Notifier, Participant,
    RegistrationOutcome, Reply, ReplyKind, Tier,
};

/// Correlates a competition with the chat poll announcing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollRef {
    pub poll_id: String,
    pub message_id: i64,
}

/// Date and duration being edited by an admin, not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEdit {
    pub date: Option<NaiveDateTime>,
    pub duration_minutes: u32,
}

/// One game session.
///
/// Invariants, checked by [`Competition::check_invariants`]:
/// - `capacity` is the sum of `claimed` over the main roster
/// - a member appears at most once across both rosters
/// - every participant claims at least one attendee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competition {
    id: CompetitionId,
    status: CompetitionStatus,
    description: Option<GameEvent>,
    poll: Option<PollRef>,
    confirmed: Vec<Participant>,
    spare: Vec<Participant>,
    capacity: u32,
    capacity_max: u32,
    location: Option<String>,
    date: Option<NaiveDateTime>,
    duration_minutes: u32,
    default_duration_minutes: u32,
    #[serde(skip)]
    pending_edit: Option<ScheduleEdit>,
}

impl Competition {
    /// Creates a competition from a schedule slot.
    pub fn from_event(event: GameEvent, config: &CompetitionConfig) -> Self {
        let mut competition = Self::ad_hoc(config);
        competition.capacity_max = event.capacity;
        competition.location = Some(event.location.clone());
        competition.date = Some(event.date);
        competition.duration_minutes = event.duration_minutes;
        competition.description = Some(event);
        competition
    }

    /// Creates an empty competition; an admin fills in date, place and capacity.
    pub fn ad_hoc(config: &CompetitionConfig) -> Self {
        Self {
            id: CompetitionId::generate(gameday_core::local_now()),
            status: CompetitionStatus::Scheduled,
            description: None,
            poll: None,
            confirmed: Vec::new(),
            spare: Vec::new(),
            capacity: 0,
            capacity_max: 0,
            location: None,
            date: None,
            duration_minutes: config.default_duration_minutes,
            default_duration_minutes: config.default_duration_minutes,
            pending_edit: None,
        }
    }

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    /// Opens the registration, optionally with a new capacity.
    ///
    /// # Errors
    /// [`CompetitionError::InvalidTransition`] unless the competition is
    /// Scheduled, Confirmed or Cancelled and has a date.
    pub fn open_registration(
        &mut self,
        capacity_max: Option<u32>,
    ) -> Result<CompetitionStatus, CompetitionError> {
        if !self.status.can_open() || self.date.is_none() {
            tracing::error!(
                competition_id = %self.id,
                status = %self.status,
                has_date = self.date.is_some(),
                "refusing to open registration"
            );
            return Err(self.invalid("open registration"));
        }
        if let Some(max) = capacity_max {
            self.capacity_max = max;
        }
        self.status = if self.capacity >= self.capacity_max {
            CompetitionStatus::Full
        } else {
            CompetitionStatus::Open
        };
        tracing::info!(
            competition_id = %self.id,
            status = %self.status,
            capacity = self.capacity,
            capacity_max = self.capacity_max,
            "registration opened"
        );
        Ok(self.status)
    }

    /// Closes the registration: the game is on. Forgets the poll.
    ///
    /// # Errors
    /// [`CompetitionError::InvalidTransition`] unless the competition is Open or Full.
    pub fn confirm_and_close(&mut self) -> Result<(), CompetitionError> {
        if !self.status.is_open_or_full() {
            tracing::error!(competition_id = %self.id, status = %self.status, "refusing to confirm");
            return Err(self.invalid("confirm"));
        }
        self.status = CompetitionStatus::Confirmed;
        self.poll = None;
        tracing::info!(competition_id = %self.id, capacity = self.capacity, "registration confirmed and closed");
        Ok(())
    }

    /// Cancels the game, whatever state it is in.
    pub fn cancel(&mut self) {
        tracing::info!(competition_id = %self.id, from = %self.status, "competition cancelled");
        self.status = CompetitionStatus::Cancelled;
    }

    /// Empties both rosters.
    pub fn reset(&mut self) {
        self.confirmed.clear();
        self.spare.clear();
        self.capacity = 0;
    }

    fn invalid(&self, operation: &'static str) -> CompetitionError {
        CompetitionError::InvalidTransition {
            id: self.id.clone(),
            from: self.status,
            operation,
        }
    }

    /// Flips between Open and Full to match the current capacity.
    pub(crate) async fn refresh_status<N: Notifier>(&mut self, notifier: &N) {
        if !self.status.is_open_or_full() {
            return;
        }
        let target = if self.capacity >= self.capacity_max {
            CompetitionStatus::Full
        } else {
            CompetitionStatus::Open
        };
        if target != self.status {
            self.status = target;
            tracing::info!(
                competition_id = %self.id,
                status = %target,
                capacity = self.capacity,
                capacity_max = self.capacity_max,
                "status changed"
            );
            notifier
                .competition_status_changed(&self.id, target, &self.place())
                .await;
        }
    }

    // -----------------------------------------------------------------------
    // Join
    // -----------------------------------------------------------------------

    /// Registers a member, or adds attendees to their existing registration.
    ///
    /// `claimed` is the number of attendees for a new registration
    /// (default 1), or the number to add for an existing one. Without it,
    /// an existing registration is reported as already joined.
    pub async fn register<N: Notifier, L: EventLog>(
        &mut self,
        identity: Arc<Identity>,
        claimed: Option<u32>,
        tier: Tier,
        notifier: &N,
        log: &L,
    ) -> RegistrationOutcome {
        let user_id = identity.user_id;
        if !self.status.is_open_or_full() {
            tracing::debug!(competition_id = %self.id, %user_id, status = %self.status, "join refused, not open");
            return RegistrationOutcome::rejected(self.reply(ReplyKind::NotOpen));
        }

        if let Some((found, index)) = self.position(user_id) {
            let Some(delta) = claimed else {
                return RegistrationOutcome::rejected(self.reply(ReplyKind::AlreadyJoined(found)));
            };
            return match found {
                Tier::Main => {
                    let Some(capacity) = self
                        .capacity
                        .checked_add(delta)
                        .filter(|&capacity| capacity <= self.capacity_max)
                    else {
                        tracing::debug!(competition_id = %self.id, %user_id, delta, "cannot extend registration");
                        return RegistrationOutcome::rejected(
                            self.reply(ReplyKind::CannotExtend(found)),
                        );
                    };
                    let participant = &mut self.confirmed[index];
                    participant.claimed += delta;
                    let total = participant.claimed;
                    self.capacity = capacity;
                    self.record(log, user_id, delta, total, EventKind::UpdateAttendees);
                    tracing::info!(competition_id = %self.id, %user_id, claimed = total, capacity = self.capacity, "registration extended");
                    self.refresh_status(notifier).await;
                    RegistrationOutcome::new(
                        true,
                        false,
                        self.reply(ReplyKind::Updated { tier: found, claimed: total }),
                    )
                }
                Tier::Spare => {
                    let Some(total) = self.spare[index].claimed.checked_add(delta) else {
                        tracing::debug!(competition_id = %self.id, %user_id, delta, "cannot extend waitlist registration");
                        return RegistrationOutcome::rejected(
                            self.reply(ReplyKind::CannotExtend(found)),
                        );
                    };
                    self.spare[index].claimed = total;
                    self.record(log, user_id, delta, total, EventKind::UpdateAttendeesSpare);
                    tracing::info!(competition_id = %self.id, %user_id, claimed = total, "waitlist registration extended");
                    RegistrationOutcome::new(
                        false,
                        true,
                        self.reply(ReplyKind::Updated { tier: found, claimed: total }),
                    )
                }
            };
        }

        let claimed = claimed.unwrap_or(1).max(1);
        match (self.status, tier) {
            (CompetitionStatus::Open, Tier::Main) => {
                if self.capacity.saturating_add(claimed) > self.capacity_max {
                    tracing::debug!(competition_id = %self.id, %user_id, claimed, "join refused, not enough room");
                    return RegistrationOutcome::rejected(self.reply(ReplyKind::NeedReduce(claimed)));
                }
                self.confirmed.push(Participant::new(identity, claimed));
                self.capacity += claimed;
                self.record(log, user_id, claimed, claimed, EventKind::Register);
                tracing::info!(competition_id = %self.id, %user_id, claimed, capacity = self.capacity, "player registered");
                self.refresh_status(notifier).await;
                RegistrationOutcome::new(true, false, self.reply(ReplyKind::Joined))
            }
            (_, Tier::Spare) => {
                self.spare.push(Participant::new(identity, claimed));
                self.record(log, user_id, claimed, claimed, EventKind::RegisterSpare);
                tracing::info!(competition_id = %self.id, %user_id, claimed, waitlist = self.spare.len(), "player joined waitlist");
                RegistrationOutcome::new(false, true, self.reply(ReplyKind::JoinedAsSpare))
            }
            _ => RegistrationOutcome::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Leave
    // -----------------------------------------------------------------------

    /// Removes `claimed` attendees from a member's registration (all of
    /// them by default). Freed places go to the waitlist.
    pub async fn deregister<N: Notifier, L: EventLog>(
        &mut self,
        user_id: UserId,
        claimed: Option<u32>,
        notifier: &N,
        log: &L,
    ) -> RegistrationOutcome {
        if !self.status.is_open_or_full() {
            tracing::debug!(competition_id = %self.id, %user_id, status = %self.status, "leave refused, not open");
            return RegistrationOutcome::rejected(self.reply(ReplyKind::NotOpen));
        }
        let Some((tier, index)) = self.position(user_id) else {
            return RegistrationOutcome::rejected(self.reply(ReplyKind::CannotDeregister));
        };

        let held = self.roster(tier)[index].claimed;
        let count = claimed.unwrap_or(held);
        if count > held {
            tracing::debug!(competition_id = %self.id, %user_id, count, held, "leave refused, over-claim");
            return RegistrationOutcome::rejected(self.reply(ReplyKind::CannotDeregisterMore));
        }
        let remaining = held - count;
        if tier == Tier::Main {
            self.capacity -= count;
        }

        if remaining == 0 {
            self.roster_mut(tier).remove(index);
            return match tier {
                Tier::Main => {
                    self.record(log, user_id, count, 0, EventKind::Unregister);
                    tracing::info!(competition_id = %self.id, %user_id, capacity = self.capacity, "player deregistered");
                    let promoted = self.promote(notifier, log).await;
                    self.refresh_status(notifier).await;
                    RegistrationOutcome::new(true, promoted > 0, self.reply(ReplyKind::Deregistered))
                }
                Tier::Spare => {
                    self.record(log, user_id, count, 0, EventKind::UnregisterSpare);
                    tracing::info!(competition_id = %self.id, %user_id, "player left waitlist");
                    RegistrationOutcome::new(false, true, self.reply(ReplyKind::DeregisteredSpare))
                }
            };
        }

        self.roster_mut(tier)[index].claimed = remaining;
        match tier {
            Tier::Main => {
                self.record(log, user_id, count, remaining, EventKind::UpdateAttendees);
                tracing::info!(competition_id = %self.id, %user_id, remaining, capacity = self.capacity, "registration reduced");
                let promoted = self.promote(notifier, log).await;
                self.refresh_status(notifier).await;
                RegistrationOutcome::new(
                    true,
                    promoted > 0,
                    self.reply(ReplyKind::DeregisteredUpdated(remaining)),
                )
            }
            Tier::Spare => {
                self.record(log, user_id, count, remaining, EventKind::UpdateAttendeesSpare);
                tracing::info!(competition_id = %self.id, %user_id, remaining, "waitlist registration reduced");
                RegistrationOutcome::new(
                    false,
                    true,
                    self.reply(ReplyKind::DeregisteredUpdated(remaining)),
                )
            }
        }
    }

    // -----------------------------------------------------------------------
    // Promotion
    // -----------------------------------------------------------------------

    /// Fills free places from the waitlist.
    ///
    /// Each round promotes the earliest waitlisted member whose party
    /// fits into the free places, then rescans from the front. Stops when
    /// the roster is full or nobody left fits. Returns the number of
    /// attendees promoted.
    pub(crate) async fn promote<N: Notifier, L: EventLog>(
        &mut self,
        notifier: &N,
        log: &L,
    ) -> u32 {
        let mut promoted = 0;
        while self.capacity < self.capacity_max {
            let free = self.capacity_max - self.capacity;
            let Some(index) = self.spare.iter().position(|p| p.claimed <= free) else {
                break;
            };
            let participant = self.spare.remove(index);
            let user_id = participant.user_id();
            self.capacity += participant.claimed;
            promoted += participant.claimed;
            self.record(
                log,
                user_id,
                participant.claimed,
                participant.claimed,
                EventKind::Promote,
            );
            tracing::info!(
                competition_id = %self.id,
                %user_id,
                claimed = participant.claimed,
                capacity = self.capacity,
                "promoted from waitlist"
            );
            let text = self.reply(ReplyKind::Promoted).to_string();
            notifier.notify_user(&participant.identity, &text).await;
            self.confirmed.push(participant);
        }
        promoted
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Finds a member's registration: which roster, the entry, and the roster itself.
    pub fn find(&self, user_id: UserId) -> Option<(Tier, &Participant, &[Participant])> {
        let (tier, index) = self.position(user_id)?;
        let roster = self.roster(tier);
        Some((tier, &roster[index], roster))
    }

    fn position(&self, user_id: UserId) -> Option<(Tier, usize)> {
        if let Some(index) = self.confirmed.iter().position(|p| p.user_id() == user_id) {
            return Some((Tier::Main, index));
        }
        self.spare
            .iter()
            .position(|p| p.user_id() == user_id)
            .map(|index| (Tier::Spare, index))
    }

    fn roster(&self, tier: Tier) -> &[Participant] {
        match tier {
            Tier::Main => &self.confirmed,
            Tier::Spare => &self.spare,
        }
    }

    fn roster_mut(&mut self, tier: Tier) -> &mut Vec<Participant> {
        match tier {
            Tier::Main => &mut self.confirmed,
            Tier::Spare => &mut self.spare,
        }
    }

    pub fn is_open_or_full(&self) -> bool {
        self.status.is_open_or_full()
    }

    /// Returns `true` if the game has a date and it is still ahead.
    pub fn is_in_future(&self) -> bool {
        self.is_in_future_at(gameday_core::local_now())
    }

    pub fn is_in_future_at(&self, now: NaiveDateTime) -> bool {
        self.date.is_some_and(|date| date > now)
    }

    pub fn id(&self) -> &CompetitionId {
        &self.id
    }

    pub fn status(&self) -> CompetitionStatus {
        self.status
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn capacity_max(&self) -> u32 {
        self.capacity_max
    }

    /// Attendees waiting on the waitlist. Saturates at `u32::MAX`.
    pub fn spare_claimed(&self) -> u32 {
        self.spare
            .iter()
            .fold(0u32, |sum, p| sum.saturating_add(p.claimed))
    }

    pub fn confirmed(&self) -> &[Participant] {
        &self.confirmed
    }

    pub fn spare(&self) -> &[Participant] {
        &self.spare
    }

    pub fn description(&self) -> Option<&GameEvent> {
        self.description.as_ref()
    }

    pub fn poll(&self) -> Option<&PollRef> {
        self.poll.as_ref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.date
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    // -----------------------------------------------------------------------
    // Admin edits
    // -----------------------------------------------------------------------

    pub fn attach_poll(&mut self, poll: PollRef) {
        self.poll = Some(poll);
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = Some(location.into());
    }

    pub fn set_date(&mut self, date: NaiveDateTime) {
        self.date = Some(date);
    }

    pub fn set_duration(&mut self, minutes: u32) {
        self.duration_minutes = minutes;
    }

    /// Points the member's roster entry at a newer identity record, so
    /// reports and messages use their current name and language.
    /// Returns `true` if the member is registered here.
    pub fn refresh_identity(&mut self, identity: &Arc<Identity>) -> bool {
        let Some((tier, index)) = self.position(identity.user_id) else {
            return false;
        };
        self.roster_mut(tier)[index].identity = Arc::clone(identity);
        true
    }

    pub(crate) fn set_capacity_max_raw(&mut self, capacity_max: u32) {
        self.capacity_max = capacity_max;
    }

    /// Starts editing date and duration; changes stay pending until applied.
    pub fn begin_edit(&mut self) -> &mut ScheduleEdit {
        self.pending_edit.insert(ScheduleEdit {
            date: self.date,
            duration_minutes: self.duration_minutes,
        })
    }

    pub fn edit_mut(&mut self) -> Option<&mut ScheduleEdit> {
        self.pending_edit.as_mut()
    }

    /// Applies the pending edit. Returns `false` if nothing was being edited.
    pub fn apply_edit(&mut self) -> bool {
        match self.pending_edit.take() {
            Some(edit) => {
                self.date = edit.date;
                self.duration_minutes = edit.duration_minutes;
                true
            }
            None => false,
        }
    }

    pub fn discard_edit(&mut self) {
        self.pending_edit = None;
    }

    // -----------------------------------------------------------------------
    // Reporting
    // -----------------------------------------------------------------------

    /// The location line: `Arena, Friday, 16.10.2026 19:00[, 120 minutes]`.
    pub fn place(&self) -> String {
        let location = self.location.as_deref().unwrap_or("Not set");
        let when = match self.date {
            Some(date) => date.format("%A, %d.%m.%Y %H:%M").to_string(),
            None => "not scheduled".to_owned(),
        };
        let mut place = format!("{location}, {when}");
        if self.duration_minutes != self.default_duration_minutes {
            place.push_str(&format!(", {} minutes", self.duration_minutes));
        }
        place
    }

    /// Status text as of `now`.
    pub fn status_text(&self, now: NaiveDateTime) -> &'static str {
        self.status.describe(self.is_in_future_at(now))
    }

    /// Renders the title line and/or both rosters.
    pub fn report(&self, include_header: bool, include_players: bool, now: NaiveDateTime) -> String {
        let mut out = String::new();
        if include_header {
            out.push_str(&format!(
                "{}: {}/{}, {}",
                self.place(),
                self.capacity,
                self.capacity_max,
                self.status_text(now)
            ));
        }
        if include_players {
            if self.confirmed.is_empty() && self.spare.is_empty() {
                out.push_str("\nNobody registered yet.");
            }
            if !self.confirmed.is_empty() {
                out.push_str(&format!("\nPlayers ({}):", self.capacity));
                for (i, p) in self.confirmed.iter().enumerate() {
                    out.push_str(&format!("\n\t{}: {}", i + 1, p));
                }
            }
            if !self.spare.is_empty() {
                out.push_str(&format!("\nWaitlist ({}):", self.spare_claimed()));
                for (i, p) in self.spare.iter().enumerate() {
                    out.push_str(&format!("\n\t{}: {}", i + 1, p));
                }
            }
        }
        out
    }

    /// Verifies the data model invariants; used after restoring snapshots.
    pub fn check_invariants(&self) -> Result<(), String> {
        let sum: u64 = self.confirmed.iter().map(|p| u64::from(p.claimed)).sum();
        if sum != u64::from(self.capacity) {
            return Err(format!(
                "{}: capacity {} but main roster claims {}",
                self.id, self.capacity, sum
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for p in self.confirmed.iter().chain(&self.spare) {
            if p.claimed == 0 {
                return Err(format!("{}: {} claims no attendees", self.id, p.user_id()));
            }
            if !seen.insert(p.user_id()) {
                return Err(format!("{}: {} registered twice", self.id, p.user_id()));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals shared with the truncation routine
    // -----------------------------------------------------------------------

    pub(crate) fn reply(&self, kind: ReplyKind) -> Reply {
        Reply::new(self.place(), kind)
    }

    pub(crate) fn record<L: EventLog>(
        &self,
        log: &L,
        user_id: UserId,
        claimed: u32,
        remaining: u32,
        kind: EventKind,
    ) {
        log.add_event(RegistrationEvent {
            time: gameday_core::local_now(),
            user_id,
            game_date: self.date,
            location: self.location.clone(),
            claimed,
            remaining,
            kind,
        });
    }

    pub(crate) fn confirmed_mut(&mut self) -> &mut Vec<Participant> {
        &mut self.confirmed
    }

    pub(crate) fn spare_mut(&mut self) -> &mut Vec<Participant> {
        &mut self.spare
    }

    pub(crate) fn reduce_capacity(&mut self, by: u32) {
        self.capacity -= by;
    }
}
