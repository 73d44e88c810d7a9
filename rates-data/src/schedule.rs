use crate::{
    client::FeedClient, config::BoardConfig, presentation::PresentationMode,
    refresh::RefreshOrchestrator, sink::PresentationSink,
};
use std::time::Duration;
use tokio::{
    sync::watch,
    task::{JoinError, JoinHandle},
    time::{Instant, Interval, MissedTickBehavior, interval_at},
};
use tracing::{debug, info};

/// Deadline used when an interval would overflow [`Instant`] (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Timing of a [`spawn_refresh_loop`] task.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RefreshSchedule {
    pub refresh_interval: Duration,
    /// Simulated chart tick interval, `None` disables chart simulation.
    pub chart_tick: Option<Duration>,
}

impl From<&BoardConfig> for RefreshSchedule {
    fn from(config: &BoardConfig) -> Self {
        Self {
            refresh_interval: config.refresh_interval(),
            chart_tick: (config.mode == PresentationMode::Chart).then(|| config.chart_tick()),
        }
    }
}

/// Handle to a running refresh loop.
///
/// Dropping the handle also stops the loop.
#[derive(Debug)]
pub struct RefreshHandle<C, S> {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<RefreshOrchestrator<C, S>>,
}

impl<C, S> RefreshHandle<C, S> {
    /// Signal the loop to stop and wait for it, returning the [`RefreshOrchestrator`].
    ///
    /// A cycle in progress runs to completion first.
    pub async fn stop(self) -> Result<RefreshOrchestrator<C, S>, JoinError> {
        let _ = self.stop_tx.send(true);
        self.task.await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn a single task owning `orchestrator` that seeds the charts, refreshes immediately,
/// then refreshes every `schedule.refresh_interval` and simulates chart ticks in between.
///
/// Cycles never overlap: ticks that elapse while a cycle is running are skipped rather than
/// queued, and the next cycle starts on the original `refresh_interval` grid.
pub fn spawn_refresh_loop<C, S>(
    mut orchestrator: RefreshOrchestrator<C, S>,
    schedule: RefreshSchedule,
) -> RefreshHandle<C, S>
where
    C: FeedClient + 'static,
    S: PresentationSink + Send + 'static,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let origin = Instant::now();
        let mut refresh = interval_at(origin, schedule.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut chart = schedule.chart_tick.map(|period| {
            let start = Instant::now();
            let first = start
                .checked_add(period)
                .or_else(|| start.checked_add(FAR_FUTURE))
                .unwrap_or(start);
            let mut chart = interval_at(first, period);
            chart.set_missed_tick_behavior(MissedTickBehavior::Skip);
            chart
        });

        orchestrator.seed_charts();
        info!(
            refresh_interval_ms = schedule.refresh_interval.as_millis() as u64,
            chart_tick_ms = schedule.chart_tick.map(|tick| tick.as_millis() as u64),
            "refresh loop started"
        );

        loop {
            tokio::select! {
                biased;

                // Stop requested or handle dropped
                _ = stop_rx.changed() => break,

                _ = refresh.tick() => {
                    orchestrator.refresh().await;

                    // Drop any tick that elapsed during the cycle instead of firing it late
                    refresh.reset_at(next_slot(origin, schedule.refresh_interval, Instant::now()));
                }

                _ = next_tick(&mut chart) => {
                    debug!("simulating chart tick");
                    orchestrator.simulate_chart_tick();
                }
            }
        }

        info!("refresh loop stopped");
        orchestrator
    });

    RefreshHandle { stop_tx, task }
}

/// First instant on the `origin + n × period` grid strictly after `now`.
///
/// A slot beyond the range of [`Instant`] falls back to `now + period`, then to
/// `now + FAR_FUTURE`.
fn next_slot(origin: Instant, period: Duration, now: Instant) -> Instant {
    let period_nanos = period.as_nanos().max(1);
    let slots = now.saturating_duration_since(origin).as_nanos() / period_nanos + 1;
    let slots = u32::try_from(slots).unwrap_or(u32::MAX);

    origin
        .checked_add(period.saturating_mul(slots))
        .or_else(|| now.checked_add(period))
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::tests::ScriptedClient,
        instrument::{FeedKind, Instrument},
        presentation::PresentationBook,
        refresh::tests::{live_body, live_client, updates},
        sink::BoardEvent,
    };
    use tokio::time::sleep;

    fn spawn(
        config: BoardConfig,
        client: ScriptedClient,
    ) -> RefreshHandle<ScriptedClient, Vec<BoardEvent>> {
        let schedule = RefreshSchedule::from(&config);
        let book = PresentationBook::with_seed(config.mode, config.chart_capacity, 5);
        let orchestrator = RefreshOrchestrator::with_book(config, client, Vec::new(), book);
        spawn_refresh_loop(orchestrator, schedule)
    }

    fn gold_updates(events: &[BoardEvent]) -> usize {
        updates(events)
            .into_iter()
            .filter(|(instrument, _)| *instrument == Instrument::Gold)
            .count()
    }

    #[test]
    fn test_schedule_from_config() {
        let chart = RefreshSchedule::from(&BoardConfig::default());
        assert_eq!(chart.refresh_interval, Duration::from_secs(300));
        assert_eq!(chart.chart_tick, Some(Duration::from_secs(30)));

        let trend =
            RefreshSchedule::from(&BoardConfig::default().with_mode(PresentationMode::Trend));
        assert_eq!(trend.chart_tick, None);
    }

    #[test]
    fn test_next_slot() {
        struct TestCase {
            now_secs: u64,
            expected_secs: u64,
        }

        let tests = vec![
            TestCase {
                // TC0: at the origin the next slot is one period later
                now_secs: 0,
                expected_secs: 300,
            },
            TestCase {
                // TC1: within the first period
                now_secs: 120,
                expected_secs: 300,
            },
            TestCase {
                // TC2: overran one tick
                now_secs: 400,
                expected_secs: 600,
            },
            TestCase {
                // TC3: exactly on a slot moves to the following one
                now_secs: 600,
                expected_secs: 900,
            },
        ];

        let origin = Instant::now();
        let period = Duration::from_secs(300);
        for (index, test) in tests.into_iter().enumerate() {
            let actual = next_slot(origin, period, origin + Duration::from_secs(test.now_secs));
            let expected = origin + Duration::from_secs(test.expected_secs);
            assert_eq!(actual, expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_next_slot_saturates_instead_of_overflowing() {
        let origin = Instant::now();
        let now = origin + Duration::from_secs(1);

        let actual = next_slot(origin, Duration::MAX, now);
        assert_eq!(actual, now + FAR_FUTURE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_loop_survives_oversized_intervals() {
        let mut config = BoardConfig::default();
        config.chart_seed_spacing_ms = 10_000_000_000_000_000;
        config.refresh_interval_ms = u64::MAX;
        config.chart_tick_ms = u64::MAX;
        let handle = spawn(config.clone(), live_client(&config));

        sleep(Duration::from_secs(1)).await;
        let orchestrator = handle.stop().await.unwrap();

        // Seeding skipped, first refresh still published
        assert_eq!(gold_updates(orchestrator.sink()), 1);
        assert_eq!(orchestrator.book().state(Instrument::Gold).unwrap().chart.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_loop_runs_immediately_then_every_interval() {
        let config = BoardConfig::default().with_mode(PresentationMode::Trend);
        let handle = spawn(config.clone(), live_client(&config));

        sleep(Duration::from_secs(601)).await;
        let orchestrator = handle.stop().await.unwrap();

        // t = 0, 300 and 600
        assert_eq!(gold_updates(orchestrator.sink()), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_loop_skips_ticks_while_cycle_running() {
        let config = BoardConfig::default().with_mode(PresentationMode::Trend);
        let slow = Duration::from_secs(400);
        let client = FeedKind::ALL.into_iter().fold(ScriptedClient::new(), |client, feed| {
            client.respond_after(config.urls.url(feed), slow, Ok(live_body(feed)))
        });

        let start = Instant::now();
        let handle = spawn(config, client);

        // Cycles run 0..400 and 600..1000, the ticks at 300 and 900 are skipped
        sleep(Duration::from_secs(700)).await;
        let orchestrator = handle.stop().await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(1000));
        assert!(start.elapsed() < Duration::from_secs(1200));
        assert_eq!(gold_updates(orchestrator.sink()), 2);
        assert_eq!(updates(orchestrator.sink()).len(), 2 * Instrument::ALL.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_loop_simulates_chart_ticks() {
        let config = BoardConfig::default();
        let handle = spawn(config.clone(), live_client(&config));

        sleep(Duration::from_secs(95)).await;
        let orchestrator = handle.stop().await.unwrap();

        let oil_points = orchestrator
            .sink()
            .iter()
            .filter(|event| {
                matches!(event, BoardEvent::ChartPoint { instrument: Instrument::Oil, .. })
            })
            .count();

        // 20 seeded, 1 live refresh, ticks at 30, 60 and 90
        assert_eq!(oil_points, 20 + 1 + 3);
        assert_eq!(orchestrator.book().state(Instrument::Oil).unwrap().chart.len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_loop() {
        let config = BoardConfig::default().with_mode(PresentationMode::Trend);
        let handle = spawn(config.clone(), live_client(&config));
        let RefreshHandle { stop_tx, task } = handle;

        drop(stop_tx);
        let orchestrator = task.await.unwrap();

        assert!(gold_updates(orchestrator.sink()) <= 1);
    }
}
