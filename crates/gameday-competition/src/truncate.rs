//! Administrative capacity changes.
//!
//! Lowering the capacity below the number of registered attendees pushes
//! people back to the waitlist. The earliest joiners are protected: a
//! single party whose size matches the overflow exactly goes first (the
//! most recent such party), otherwise the most recent joiner goes, one
//! party at a time. Demoted parties go to the FRONT of the waitlist, so
//! they are first in line if places free up again.

use gameday_core::{EventKind, UserId};

use crate::{Competition, EventLog, Notifier, ReplyKind};

impl Competition {
    /// Changes the facility capacity and rebalances the rosters.
    ///
    /// Lowering it below the current capacity demotes parties as described
    /// in the module docs; raising it while registration is running fills
    /// the new places from the waitlist. Returns the demoted members in
    /// demotion order.
    pub async fn set_capacity_max<N: Notifier, L: EventLog>(
        &mut self,
        capacity_max: u32,
        notifier: &N,
        log: &L,
    ) -> Vec<UserId> {
        let previous = self.capacity_max();
        self.set_capacity_max_raw(capacity_max);
        tracing::info!(
            competition_id = %self.id(),
            from = previous,
            to = capacity_max,
            capacity = self.capacity(),
            "capacity changed"
        );

        let demoted = self.truncate(notifier, log).await;
        if capacity_max > previous && self.is_open_or_full() {
            self.promote(notifier, log).await;
        }
        self.refresh_status(notifier).await;
        demoted
    }

    async fn truncate<N: Notifier, L: EventLog>(&mut self, notifier: &N, log: &L) -> Vec<UserId> {
        let mut demoted = Vec::new();
        while self.capacity() > self.capacity_max() {
            let overflow = self.capacity() - self.capacity_max();
            let confirmed = self.confirmed_mut();
            let index = match confirmed.iter().rposition(|p| p.claimed == overflow) {
                Some(index) => index,
                None => match confirmed.len().checked_sub(1) {
                    Some(last) => last,
                    None => break,
                },
            };
            let participant = confirmed.remove(index);
            let user_id = participant.user_id();
            self.reduce_capacity(participant.claimed);
            self.record(log, user_id, participant.claimed, participant.claimed, EventKind::Demote);
            tracing::info!(
                competition_id = %self.id(),
                %user_id,
                claimed = participant.claimed,
                capacity = self.capacity(),
                "demoted to waitlist"
            );
            let text = self.reply(ReplyKind::Demoted).to_string();
            notifier.notify_user(&participant.identity, &text).await;
            self.spare_mut().insert(0, participant);
            demoted.push(user_id);
        }
        demoted
    }
}
