//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use gameday_competition::{
    Competition, CompetitionConfig, CompetitionStatus, MessageCode, Notifier,
};
use gameday_core::{CompetitionId, GameEvent, Identity, TrustLevel, UserId};

/// One call the engine made on the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    User { user_id: UserId, text: String },
    Chat { text: String, code: MessageCode, replace_older: bool },
    Status { id: CompetitionId, status: CompetitionStatus },
}

/// A [`Notifier`] that remembers every call.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Private messages sent to one member.
    pub fn to_user(&self, user_id: UserId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::User { user_id: to, text } if to == user_id => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<CompetitionStatus> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Status { status, .. } => Some(status),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify_user(&self, identity: &Identity, text: &str) {
        self.sent.lock().unwrap().push(Sent::User {
            user_id: identity.user_id,
            text: text.to_owned(),
        });
    }

    async fn notify_chat(&self, text: &str, code: MessageCode, replace_older: bool) {
        self.sent.lock().unwrap().push(Sent::Chat {
            text: text.to_owned(),
            code,
            replace_older,
        });
    }

    async fn competition_status_changed(
        &self,
        id: &CompetitionId,
        status: CompetitionStatus,
        _place: &str,
    ) {
        self.sent.lock().unwrap().push(Sent::Status {
            id: id.clone(),
            status,
        });
    }
}

pub fn game_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 16)
        .unwrap()
        .and_hms_opt(19, 0, 0)
        .unwrap()
}

/// A moment well before the game.
pub fn before_game() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub fn slot(capacity: u32) -> GameEvent {
    GameEvent {
        date: game_date(),
        duration_minutes: 90,
        location: "Arena".into(),
        auto_registration: true,
        registration_start: before_game(),
        capacity,
        valid: true,
        opened: false,
    }
}

/// A competition at the Arena with its registration open.
pub fn open_competition(capacity_max: u32) -> Competition {
    let mut competition = Competition::from_event(slot(capacity_max), &CompetitionConfig::default());
    competition.open_registration(None).unwrap();
    competition
}

pub fn member(id: i64) -> Arc<Identity> {
    Arc::new(Identity::new(UserId(id), format!("user{id}"), TrustLevel::Trusted))
}
