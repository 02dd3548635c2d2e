use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::highlight::HighlightTicket;
use super::notify::Notifier;
use crate::store::persistence::EntryPersistence;
use crate::tracker::Tracker;

pub type SharedTracker<P, N> = Rc<RefCell<Tracker<P, N>>>;

/// Handle to a running wake loop.
pub struct WakeHandle {
    task: JoinHandle<()>,
}

impl WakeHandle {
    /// Cancel the loop. A pass runs without yielding, so cancellation never
    /// lands in the middle of one.
    pub fn stop(self) {
        self.task.abort();
        log::info!("Wake scheduler stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Run a scheduler pass every `every`, starting one interval from now.
/// Must be called inside a `tokio::task::LocalSet`.
pub fn spawn_wake_loop<P, N>(
    tracker: SharedTracker<P, N>,
    every: Duration,
    highlight_for: Duration,
) -> WakeHandle
where
    P: EntryPersistence + 'static,
    N: Notifier + 'static,
{
    log::info!("Wake scheduler running every {:?}", every);
    let task = tokio::task::spawn_local(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let armed = {
                let mut tracker = tracker.borrow_mut();
                tracker.tick(Utc::now());
                tracker.take_armed_highlights()
            };
            for ticket in armed {
                spawn_highlight_expiry(Rc::clone(&tracker), ticket, highlight_for);
            }
        }
    });
    WakeHandle { task }
}

/// Clear one highlight after `after`, unless it was re-armed meanwhile.
pub fn spawn_highlight_expiry<P, N>(
    tracker: SharedTracker<P, N>,
    ticket: HighlightTicket,
    after: Duration,
) where
    P: EntryPersistence + 'static,
    N: Notifier + 'static,
{
    tokio::task::spawn_local(async move {
        tokio::time::sleep(after).await;
        if tracker.borrow_mut().expire_highlight(&ticket) {
            log::debug!("Highlight expired for {}", ticket.id);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::{Entry, EntryId, EntryKind};
    use crate::core::lifecycle;
    use crate::store::persistence::MemoryPersistence;
    use crate::store::EntryStore;
    use crate::wake::notify::MemoryNotifier;
    use tokio::task::LocalSet;

    fn shared_with_elapsed_snooze() -> SharedTracker<MemoryPersistence, MemoryNotifier> {
        let now = Utc::now();
        let entry = lifecycle::apply_snooze(
            &Entry::with_id(EntryId::new("a"), EntryKind::Task, "Wake me", now),
            now - chrono::Duration::seconds(1),
        );
        let store = EntryStore::open(MemoryPersistence::with_entries(vec![entry])).unwrap();
        Rc::new(RefCell::new(Tracker::new(store, MemoryNotifier::granted())))
    }

    #[tokio::test(start_paused = true)]
    async fn first_pass_waits_one_interval_then_highlight_expires() {
        let tracker = shared_with_elapsed_snooze();
        let id = EntryId::new("a");
        let local = LocalSet::new();
        local
            .run_until(async {
                let handle = spawn_wake_loop(
                    Rc::clone(&tracker),
                    Duration::from_secs(60),
                    Duration::from_secs(2),
                );

                tokio::time::sleep(Duration::from_secs(30)).await;
                assert!(tracker.borrow().store().get(&id).unwrap().snoozed_until.is_some());

                tokio::time::sleep(Duration::from_secs(31)).await;
                {
                    let tracker = tracker.borrow();
                    let entry = tracker.store().get(&id).unwrap();
                    assert!(entry.snoozed_until.is_none());
                    assert!(entry.woke_up_at.is_some());
                    assert!(tracker.highlights().contains(&id));
                    assert_eq!(tracker.notifier().sent().len(), 1);
                }

                tokio::time::sleep(Duration::from_secs(2)).await;
                assert!(!tracker.borrow().highlights().contains(&id));

                tokio::time::sleep(Duration::from_secs(120)).await;
                assert_eq!(tracker.borrow().notifier().sent().len(), 1);
                handle.stop();
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_loop_never_ticks() {
        let tracker = shared_with_elapsed_snooze();
        let local = LocalSet::new();
        local
            .run_until(async {
                let handle = spawn_wake_loop(
                    Rc::clone(&tracker),
                    Duration::from_secs(60),
                    Duration::from_secs(2),
                );
                handle.stop();
                tokio::time::sleep(Duration::from_secs(300)).await;
            })
            .await;
        let tracker = tracker.borrow();
        assert!(tracker.store().get(&EntryId::new("a")).unwrap().snoozed_until.is_some());
        assert_eq!(tracker.store().persistence().save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rearmed_highlight_outlives_first_expiry() {
        let tracker = shared_with_elapsed_snooze();
        let id = EntryId::new("a");
        let local = LocalSet::new();
        local
            .run_until(async {
                let first = tracker.borrow_mut().tick(Utc::now());
                assert_eq!(first.len(), 1);
                let ticket = tracker.borrow_mut().take_armed_highlights().remove(0);
                spawn_highlight_expiry(Rc::clone(&tracker), ticket, Duration::from_secs(2));

                tokio::time::sleep(Duration::from_secs(1)).await;
                let id_again = id.clone();
                let rearmed = {
                    let mut tracker = tracker.borrow_mut();
                    tracker.snooze(&id_again, Utc::now() + chrono::Duration::hours(1), Utc::now()).unwrap();
                    tracker.unsnooze(&id_again, Utc::now()).unwrap();
                    tracker.take_armed_highlights().remove(0)
                };
                spawn_highlight_expiry(Rc::clone(&tracker), rearmed, Duration::from_secs(2));

                tokio::time::sleep(Duration::from_millis(1500)).await;
                assert!(tracker.borrow().highlights().contains(&id));
                tokio::time::sleep(Duration::from_secs(1)).await;
                assert!(!tracker.borrow().highlights().contains(&id));
            })
            .await;
    }
}
