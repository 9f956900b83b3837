//! Integration tests for joining, leaving, promotion and truncation.

mod common;

use common::{before_game, member, open_competition, slot, RecordingNotifier};
use gameday_competition::{
    Competition, CompetitionConfig, CompetitionError, CompetitionStatus, MemoryHistory,
    ReplyKind, Tier,
};
use gameday_core::{EventKind, UserId};

fn uid(id: i64) -> UserId {
    UserId(id)
}

fn ids(roster: &[gameday_competition::Participant]) -> Vec<i64> {
    roster.iter().map(|p| p.user_id().0).collect()
}

fn kind(outcome: &gameday_competition::RegistrationOutcome) -> Option<ReplyKind> {
    outcome.reply.as_ref().map(|r| r.kind)
}

/// Asserts the roster invariants that must hold after every operation.
fn assert_consistent(competition: &Competition) {
    competition.check_invariants().unwrap();
    if competition.is_open_or_full() {
        assert!(competition.capacity() <= competition.capacity_max());
        let full = competition.capacity() == competition.capacity_max();
        assert_eq!(competition.status() == CompetitionStatus::Full, full);
    }
}

// =========================================================================
// Scenarios
// =========================================================================

#[tokio::test]
async fn test_scenarios_a_b_c_join_fill_waitlist_promote() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(2);

    // A: two players fill the game.
    let outcome = c.register(member(1), Some(1), Tier::Main, &notifier, &log).await;
    assert!(outcome.main && !outcome.spare);
    assert_eq!(kind(&outcome), Some(ReplyKind::Joined));
    assert_eq!(ids(c.confirmed()), vec![1]);
    assert_eq!(c.capacity(), 1);
    assert_eq!(c.status(), CompetitionStatus::Open);

    c.register(member(2), Some(1), Tier::Main, &notifier, &log).await;
    assert_eq!(c.capacity(), 2);
    assert_eq!(c.status(), CompetitionStatus::Full);
    assert_eq!(notifier.statuses(), vec![CompetitionStatus::Full]);
    assert_consistent(&c);

    // B: a third one waits.
    let outcome = c.register(member(3), Some(1), Tier::Spare, &notifier, &log).await;
    assert!(!outcome.main && outcome.spare);
    assert_eq!(kind(&outcome), Some(ReplyKind::JoinedAsSpare));
    assert_eq!(ids(c.spare()), vec![3]);
    assert_eq!(c.capacity(), 2);

    // C: the first leaves, the waiting one moves up.
    let outcome = c.deregister(uid(1), Some(1), &notifier, &log).await;
    assert!(outcome.main && outcome.spare);
    assert_eq!(kind(&outcome), Some(ReplyKind::Deregistered));
    assert_eq!(ids(c.confirmed()), vec![2, 3]);
    assert!(c.spare().is_empty());
    assert_eq!(c.capacity(), 2);
    assert_eq!(c.status(), CompetitionStatus::Full);
    assert_eq!(notifier.to_user(uid(3)).len(), 1);
    assert!(notifier.to_user(uid(3))[0].contains("moved from the waitlist"));
    assert_consistent(&c);

    let kinds: Vec<_> = log.events().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Register,
            EventKind::Register,
            EventKind::RegisterSpare,
            EventKind::Unregister,
            EventKind::Promote,
        ]
    );
}

#[tokio::test]
async fn test_scenario_d_extend_registration_to_full() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(3);

    c.register(member(1), Some(2), Tier::Main, &notifier, &log).await;
    assert_eq!(c.capacity(), 2);

    let outcome = c.register(member(1), Some(1), Tier::Main, &notifier, &log).await;
    assert!(outcome.main);
    assert_eq!(
        kind(&outcome),
        Some(ReplyKind::Updated { tier: Tier::Main, claimed: 3 })
    );
    assert_eq!(c.confirmed()[0].claimed, 3);
    assert_eq!(c.capacity(), 3);
    assert_eq!(c.status(), CompetitionStatus::Full);
    assert_eq!(log.events().last().unwrap().kind, EventKind::UpdateAttendees);
    assert_consistent(&c);
}

#[tokio::test]
async fn test_scenario_e_party_too_big_changes_nothing() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(2);
    c.register(member(1), None, Tier::Main, &notifier, &log).await;
    let events_before = log.len();

    let outcome = c.register(member(2), Some(5), Tier::Main, &notifier, &log).await;
    assert!(!outcome.is_change());
    assert_eq!(kind(&outcome), Some(ReplyKind::NeedReduce(5)));
    assert_eq!(c.capacity(), 1);
    assert_eq!(ids(c.confirmed()), vec![1]);
    assert_eq!(log.len(), events_before);
}

// =========================================================================
// Join rules
// =========================================================================

#[tokio::test]
async fn test_register_refused_when_not_open() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = Competition::from_event(slot(4), &CompetitionConfig::default());

    let outcome = c.register(member(1), None, Tier::Main, &notifier, &log).await;
    assert_eq!(kind(&outcome), Some(ReplyKind::NotOpen));
    assert!(c.confirmed().is_empty());
    assert!(log.is_empty());
}

#[tokio::test]
async fn test_register_twice_without_count_reports_already_joined() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(4);
    c.register(member(1), None, Tier::Main, &notifier, &log).await;

    let outcome = c.register(member(1), None, Tier::Spare, &notifier, &log).await;
    assert_eq!(kind(&outcome), Some(ReplyKind::AlreadyJoined(Tier::Main)));
    assert!(c.spare().is_empty());
    assert_eq!(c.capacity(), 1);
}

#[tokio::test]
async fn test_cannot_extend_beyond_capacity() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(3);
    c.register(member(1), Some(2), Tier::Main, &notifier, &log).await;

    let outcome = c.register(member(1), Some(2), Tier::Main, &notifier, &log).await;
    assert_eq!(kind(&outcome), Some(ReplyKind::CannotExtend(Tier::Main)));
    assert_eq!(c.confirmed()[0].claimed, 2);
    assert_eq!(c.capacity(), 2);
}

#[tokio::test]
async fn test_extend_waitlist_registration_leaves_capacity_alone() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(1);
    c.register(member(1), None, Tier::Main, &notifier, &log).await;
    c.register(member(2), None, Tier::Spare, &notifier, &log).await;

    let outcome = c.register(member(2), Some(2), Tier::Spare, &notifier, &log).await;
    assert!(outcome.spare && !outcome.main);
    assert_eq!(c.spare()[0].claimed, 3);
    assert_eq!(c.spare_claimed(), 3);
    assert_eq!(c.capacity(), 1);
    assert_eq!(log.events().last().unwrap().kind, EventKind::UpdateAttendeesSpare);
}

#[tokio::test]
async fn test_waitlist_extend_past_u32_max_is_refused() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(1);
    c.register(member(1), Some(u32::MAX), Tier::Spare, &notifier, &log).await;

    let outcome = c.register(member(1), Some(1), Tier::Spare, &notifier, &log).await;
    assert_eq!(kind(&outcome), Some(ReplyKind::CannotExtend(Tier::Spare)));
    assert!(!outcome.is_change());
    assert_eq!(c.spare()[0].claimed, u32::MAX);
    assert_eq!(log.len(), 1);
}

#[tokio::test]
async fn test_main_extend_past_u32_max_is_refused() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(u32::MAX);
    c.register(member(1), Some(2), Tier::Main, &notifier, &log).await;

    let outcome = c.register(member(1), Some(u32::MAX), Tier::Main, &notifier, &log).await;
    assert_eq!(kind(&outcome), Some(ReplyKind::CannotExtend(Tier::Main)));
    assert_eq!(c.capacity(), 2);
    assert_consistent(&c);
}

#[tokio::test]
async fn test_huge_waitlist_still_reports() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(1);
    c.register(member(1), Some(u32::MAX), Tier::Spare, &notifier, &log).await;
    c.register(member(2), Some(1), Tier::Spare, &notifier, &log).await;

    assert_eq!(c.spare_claimed(), u32::MAX);
    let report = c.report(true, true, before_game());
    assert!(report.contains(&format!("Waitlist ({}):", u32::MAX)));
    assert_consistent(&c);
}

#[tokio::test]
async fn test_main_join_on_full_game_is_silent_noop() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(1);
    c.register(member(1), None, Tier::Main, &notifier, &log).await;
    assert_eq!(c.status(), CompetitionStatus::Full);

    let outcome = c.register(member(2), None, Tier::Main, &notifier, &log).await;
    assert!(!outcome.is_change());
    assert!(outcome.reply.is_none());
    assert!(c.find(uid(2)).is_none());
}

#[tokio::test]
async fn test_zero_count_on_new_registration_counts_one() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(4);

    c.register(member(1), Some(0), Tier::Main, &notifier, &log).await;
    assert_eq!(c.confirmed()[0].claimed, 1);
    assert_eq!(c.capacity(), 1);
}

// =========================================================================
// Leave rules
// =========================================================================

#[tokio::test]
async fn test_full_leave_is_idempotent() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(4);
    c.register(member(1), Some(3), Tier::Main, &notifier, &log).await;

    let outcome = c.deregister(uid(1), None, &notifier, &log).await;
    assert_eq!(kind(&outcome), Some(ReplyKind::Deregistered));
    assert_eq!(c.capacity(), 0);

    let again = c.deregister(uid(1), None, &notifier, &log).await;
    assert!(!again.is_change());
    assert_eq!(kind(&again), Some(ReplyKind::CannotDeregister));
}

#[tokio::test]
async fn test_leave_more_than_registered_is_refused() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(4);
    c.register(member(1), Some(2), Tier::Main, &notifier, &log).await;

    let outcome = c.deregister(uid(1), Some(3), &notifier, &log).await;
    assert_eq!(kind(&outcome), Some(ReplyKind::CannotDeregisterMore));
    assert_eq!(c.capacity(), 2);
    assert_eq!(c.confirmed()[0].claimed, 2);
}

#[tokio::test]
async fn test_partial_leave_keeps_place_and_promotes() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(3);
    c.register(member(1), Some(3), Tier::Main, &notifier, &log).await;
    c.register(member(2), None, Tier::Spare, &notifier, &log).await;

    let outcome = c.deregister(uid(1), Some(1), &notifier, &log).await;
    assert_eq!(kind(&outcome), Some(ReplyKind::DeregisteredUpdated(2)));
    assert_eq!(c.confirmed()[0].claimed, 2);
    assert_eq!(ids(c.confirmed()), vec![1, 2]);
    assert_eq!(c.capacity(), 3);
    assert_eq!(c.status(), CompetitionStatus::Full);
    assert_consistent(&c);
}

#[tokio::test]
async fn test_leaving_waitlist_does_not_touch_capacity() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(1);
    c.register(member(1), None, Tier::Main, &notifier, &log).await;
    c.register(member(2), None, Tier::Spare, &notifier, &log).await;

    let outcome = c.deregister(uid(2), None, &notifier, &log).await;
    assert_eq!(kind(&outcome), Some(ReplyKind::DeregisteredSpare));
    assert!(outcome.spare && !outcome.main);
    assert_eq!(c.capacity(), 1);
    assert_eq!(log.events().last().unwrap().kind, EventKind::UnregisterSpare);
}

#[tokio::test]
async fn test_leave_from_full_reopens_and_notifies() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(2);
    c.register(member(1), None, Tier::Main, &notifier, &log).await;
    c.register(member(2), None, Tier::Main, &notifier, &log).await;

    c.deregister(uid(2), None, &notifier, &log).await;
    assert_eq!(c.status(), CompetitionStatus::Open);
    assert_eq!(
        notifier.statuses(),
        vec![CompetitionStatus::Full, CompetitionStatus::Open]
    );
}

// =========================================================================
// Promotion
// =========================================================================

#[tokio::test]
async fn test_promotion_skips_parties_that_do_not_fit() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(4);
    c.register(member(1), Some(2), Tier::Main, &notifier, &log).await;
    c.register(member(2), Some(2), Tier::Main, &notifier, &log).await;
    c.register(member(3), Some(3), Tier::Spare, &notifier, &log).await;
    c.register(member(4), Some(1), Tier::Spare, &notifier, &log).await;
    c.register(member(5), Some(1), Tier::Spare, &notifier, &log).await;

    // Two places free up: the party of three cannot fit, the next two singles can.
    c.deregister(uid(2), None, &notifier, &log).await;

    assert_eq!(ids(c.confirmed()), vec![1, 4, 5]);
    assert_eq!(ids(c.spare()), vec![3]);
    assert_eq!(c.capacity(), 4);
    assert_eq!(c.status(), CompetitionStatus::Full);
    assert_consistent(&c);
}

#[tokio::test]
async fn test_promotion_leaves_no_fitting_party_behind() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(5);
    c.register(member(1), Some(5), Tier::Main, &notifier, &log).await;
    c.register(member(2), Some(4), Tier::Spare, &notifier, &log).await;
    c.register(member(3), Some(2), Tier::Spare, &notifier, &log).await;
    c.register(member(4), Some(1), Tier::Spare, &notifier, &log).await;

    c.deregister(uid(1), Some(3), &notifier, &log).await;

    // Three free places: user3 (2) is first to fit, then user4 (1).
    assert_eq!(ids(c.confirmed()), vec![1, 3, 4]);
    let free = c.capacity_max() - c.capacity();
    assert!(c.spare().iter().all(|p| p.claimed > free));
    assert_consistent(&c);
}

#[tokio::test]
async fn test_promotion_fills_several_places() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(4);
    c.register(member(1), Some(4), Tier::Main, &notifier, &log).await;
    c.register(member(2), Some(3), Tier::Spare, &notifier, &log).await;
    c.register(member(3), Some(1), Tier::Spare, &notifier, &log).await;

    // Four places free: user2 fits first, then user3 takes the last one.
    c.deregister(uid(1), None, &notifier, &log).await;
    assert_eq!(ids(c.confirmed()), vec![2, 3]);
    assert_eq!(c.capacity(), 4);
}

// =========================================================================
// Capacity changes
// =========================================================================

#[tokio::test]
async fn test_truncate_prefers_exact_match_from_latest() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(6);
    c.register(member(1), Some(2), Tier::Main, &notifier, &log).await;
    c.register(member(2), Some(2), Tier::Main, &notifier, &log).await;
    c.register(member(3), Some(1), Tier::Main, &notifier, &log).await;
    c.register(member(9), None, Tier::Spare, &notifier, &log).await;

    let demoted = c.set_capacity_max(3, &notifier, &log).await;

    // Overflow 2: user2 matches exactly and is the latest such party.
    assert_eq!(demoted, vec![uid(2)]);
    assert_eq!(ids(c.confirmed()), vec![1, 3]);
    assert_eq!(ids(c.spare()), vec![2, 9]);
    assert_eq!(c.capacity(), 3);
    assert_eq!(c.status(), CompetitionStatus::Full);
    assert!(notifier.to_user(uid(2))[0].contains("front of the waitlist"));
    assert_eq!(log.events_for(uid(2)).last().unwrap().kind, EventKind::Demote);
    assert_consistent(&c);
}

#[tokio::test]
async fn test_truncate_falls_back_to_latest_joiner() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(6);
    c.register(member(1), Some(3), Tier::Main, &notifier, &log).await;
    c.register(member(2), Some(1), Tier::Main, &notifier, &log).await;
    c.register(member(3), Some(1), Tier::Main, &notifier, &log).await;

    // Overflow 3: user1 is the only exact match.
    let demoted = c.set_capacity_max(2, &notifier, &log).await;
    assert_eq!(demoted, vec![uid(1)]);
    assert_eq!(c.capacity(), 2);

    // Overflow 1: user2 and user3 match, the later one goes.
    let demoted = c.set_capacity_max(1, &notifier, &log).await;
    assert_eq!(demoted, vec![uid(3)]);
    assert_eq!(ids(c.confirmed()), vec![2]);
    assert_eq!(ids(c.spare()), vec![3, 1]);
    assert_consistent(&c);
}

#[tokio::test]
async fn test_truncate_lifo_when_no_party_matches() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(8);
    c.register(member(1), Some(3), Tier::Main, &notifier, &log).await;
    c.register(member(2), Some(3), Tier::Main, &notifier, &log).await;
    c.register(member(3), Some(2), Tier::Main, &notifier, &log).await;

    // Overflow 4: nobody claims exactly 4. user3 goes (overflow 2), then
    // nobody else claims 2 and user2 goes.
    let demoted = c.set_capacity_max(4, &notifier, &log).await;
    assert_eq!(demoted, vec![uid(3), uid(2)]);
    assert_eq!(ids(c.confirmed()), vec![1]);
    assert_eq!(ids(c.spare()), vec![2, 3]);
    assert_eq!(c.capacity(), 3);
    assert_eq!(c.status(), CompetitionStatus::Open);
    assert_consistent(&c);
}

#[tokio::test]
async fn test_raising_capacity_promotes() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(1);
    c.register(member(1), None, Tier::Main, &notifier, &log).await;
    c.register(member(2), Some(2), Tier::Spare, &notifier, &log).await;

    let demoted = c.set_capacity_max(3, &notifier, &log).await;
    assert!(demoted.is_empty());
    assert_eq!(ids(c.confirmed()), vec![1, 2]);
    assert_eq!(c.status(), CompetitionStatus::Full);
}

// =========================================================================
// State machine
// =========================================================================

#[tokio::test]
async fn test_open_requires_date() {
    let mut c = Competition::ad_hoc(&CompetitionConfig::default());
    let err = c.open_registration(Some(10)).unwrap_err();
    assert!(matches!(err, CompetitionError::InvalidTransition { .. }));
    assert_eq!(c.status(), CompetitionStatus::Scheduled);
}

#[tokio::test]
async fn test_open_twice_is_invalid() {
    let mut c = open_competition(4);
    assert!(c.open_registration(None).is_err());
}

#[tokio::test]
async fn test_open_with_zero_capacity_is_full() {
    let mut c = Competition::from_event(slot(4), &CompetitionConfig::default());
    assert_eq!(c.open_registration(Some(0)).unwrap(), CompetitionStatus::Full);
}

#[tokio::test]
async fn test_confirm_clears_poll_and_cancel_reopens() {
    let mut c = open_competition(4);
    c.attach_poll(gameday_competition::PollRef {
        poll_id: "p-1".into(),
        message_id: 7,
    });

    c.confirm_and_close().unwrap();
    assert_eq!(c.status(), CompetitionStatus::Confirmed);
    assert!(c.poll().is_none());
    assert!(c.confirm_and_close().is_err());

    c.cancel();
    assert_eq!(c.status(), CompetitionStatus::Cancelled);
    assert_eq!(c.open_registration(None).unwrap(), CompetitionStatus::Open);
}

// =========================================================================
// Reporting and edits
// =========================================================================

#[tokio::test]
async fn test_report_lists_both_rosters() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(3);
    c.register(member(1), Some(2), Tier::Main, &notifier, &log).await;
    c.register(member(2), None, Tier::Main, &notifier, &log).await;
    c.register(member(3), None, Tier::Spare, &notifier, &log).await;

    let report = c.report(true, true, before_game());
    assert_eq!(
        report,
        "Arena, Friday, 16.10.2026 19:00: 3/3, registration is full\n\
         Players (3):\n\t1: @user1 +1\n\t2: @user2\n\
         Waitlist (1):\n\t1: @user3"
    );
}

#[tokio::test]
async fn test_report_empty_and_past() {
    let c = open_competition(3);
    let after = common::game_date() + chrono::Duration::days(1);
    assert_eq!(
        c.report(true, true, after),
        "Arena, Friday, 16.10.2026 19:00: 0/3, past, was open\nNobody registered yet."
    );
}

#[tokio::test]
async fn test_place_mentions_unusual_duration() {
    let mut c = Competition::ad_hoc(&CompetitionConfig::default());
    assert_eq!(c.place(), "Not set, not scheduled");

    c.set_location("Gym");
    c.set_date(common::game_date());
    c.set_duration(120);
    assert_eq!(c.place(), "Gym, Friday, 16.10.2026 19:00, 120 minutes");
}

#[tokio::test]
async fn test_schedule_edit_applies_or_discards() {
    let mut c = Competition::ad_hoc(&CompetitionConfig::default());
    c.begin_edit().duration_minutes = 60;
    c.discard_edit();
    assert_eq!(c.duration_minutes(), 90);
    assert!(!c.apply_edit());

    let edit = c.begin_edit();
    edit.date = Some(common::game_date());
    c.edit_mut().unwrap().duration_minutes = 120;
    assert!(c.apply_edit());
    assert_eq!(c.date(), Some(common::game_date()));
    assert_eq!(c.duration_minutes(), 120);
}

#[tokio::test]
async fn test_reset_empties_rosters() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(3);
    c.register(member(1), Some(2), Tier::Main, &notifier, &log).await;
    c.register(member(2), None, Tier::Spare, &notifier, &log).await;

    c.reset();
    assert!(c.confirmed().is_empty());
    assert!(c.spare().is_empty());
    assert_eq!(c.capacity(), 0);
    assert_consistent(&c);
}

#[tokio::test]
async fn test_find_reports_tier() {
    let notifier = RecordingNotifier::new();
    let log = MemoryHistory::new();
    let mut c = open_competition(1);
    c.register(member(1), None, Tier::Main, &notifier, &log).await;
    c.register(member(2), Some(2), Tier::Spare, &notifier, &log).await;

    let (tier, participant, roster) = c.find(uid(2)).unwrap();
    assert_eq!(tier, Tier::Spare);
    assert_eq!(participant.claimed, 2);
    assert_eq!(roster.len(), 1);
    assert!(c.is_in_future_at(before_game()));
}
