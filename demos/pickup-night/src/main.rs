use std::time::Duration;

use gameday::prelude::*;
use gameday::{POLL_OPTION_MAIN, POLL_OPTION_SPARE};
use tokio::sync::watch;

// ---------------------------------------------------------------------------
// Console chat
// ---------------------------------------------------------------------------

/// Prints what a chat bot would post.
struct ConsoleChat;

impl Notifier for ConsoleChat {
    async fn notify_user(&self, identity: &Identity, text: &str) {
        println!("[dm {}] {text}", identity.name);
    }

    async fn notify_chat(&self, text: &str, code: MessageCode, replace_older: bool) {
        let marker = if replace_older { " (replaces previous)" } else { "" };
        println!("[chat {code:?}{marker}]\n{text}\n");
    }

    async fn competition_status_changed(
        &self,
        id: &CompetitionId,
        status: CompetitionStatus,
        place: &str,
    ) {
        tracing::info!(competition_id = %id, %status, place, "status changed");
    }
}

// ---------------------------------------------------------------------------
// A scripted evening
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => GamedayConfig::load(path)?,
        None => GamedayConfig::default(),
    };
    init_tracing(&config.logging.level);
    let auto_config = config.schedule.auto_open();

    let service = Arc::new(
        GamedayServiceBuilder::new()
            .config(config)
            .build(Arc::new(ConsoleChat), Arc::new(MemoryHistory::new())),
    );

    // Friday game in two days, registration opens right away.
    let now = local_now();
    let mut schedule = Schedule::new();
    schedule.add(GameEvent {
        date: now + chrono::Duration::days(2),
        duration_minutes: 90,
        location: "Arena".into(),
        auto_registration: true,
        registration_start: now - chrono::Duration::hours(1),
        capacity: 4,
        valid: true,
        opened: false,
    });

    let auto = Arc::new(AutoOpener::new(schedule, Arc::clone(&service), auto_config));
    let (stop_tx, stop_rx) = watch::channel(false);
    let opener = tokio::spawn(Arc::clone(&auto).run(stop_rx));

    for (id, name) in [(1, "ann"), (2, "bob"), (3, "cat"), (4, "dan")] {
        service.member(UserId(id), name, None, Some("en")).await;
        service.set_trust(UserId(id), TrustLevel::Trusted).await?;
    }
    service.member(UserId(99), "admin", Some("Pat Admin"), None).await;
    service.set_trust(UserId(99), TrustLevel::Admin).await?;

    // Wait for the auto-open pass (initial jitter is at most a few seconds).
    while service.competitions().await.is_empty() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let id = service.competitions().await[0].id.clone();
    service
        .attach_poll(
            &id,
            PollRef {
                poll_id: "friday".into(),
                message_id: 1,
            },
        )
        .await?;

    let outcome = service.join(UserId(1), Some(2), Tier::Main).await?;
    print_reply(&outcome);
    for user in [2, 3] {
        if let Some(outcome) = service
            .poll_answer("friday", UserId(user), &[POLL_OPTION_MAIN])
            .await?
        {
            print_reply(&outcome);
        }
    }
    if let Some(outcome) = service
        .poll_answer("friday", UserId(4), &[POLL_OPTION_SPARE])
        .await?
    {
        print_reply(&outcome);
    }

    // Ann's friend can't make it; a place frees up for the waitlist.
    print_reply(&service.leave(UserId(1), Some(1)).await?);

    let demoted = service.set_capacity_max(&id, 3).await?;
    tracing::info!(?demoted, "capacity lowered");

    service.confirm(&id).await?;
    println!("{}", service.report(&id, true, true).await?);

    let snapshot = service.snapshot(&JsonCodec).await?;
    tracing::info!(bytes = snapshot.len(), "snapshot taken");

    stop_tx.send(true)?;
    opener.await?;
    Ok(())
}

fn print_reply(outcome: &RegistrationOutcome) {
    if let Some(reply) = &outcome.reply {
        println!("[reply] {reply}");
    }
}
