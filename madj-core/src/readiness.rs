// madj-core/src/readiness.rs
//! Readiness Waiter: `Probing -> {Ready, TimedOut}`, plus an early exit when the spawned
//! process dies before its port ever opens.
//!
//! Uses tokio's clock, so paused-time tests observe exact probe counts and elapsed times.

use std::time::Duration;

use madj_common::model::ServiceHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::probe::PortProbe;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready { probes: u32, elapsed: Duration },
    TimedOut { probes: u32, elapsed: Duration },
    /// The process exited before the port opened: a hard failure, not a slow start.
    Exited { status: String, probes: u32, elapsed: Duration },
}

#[derive(Debug, Clone, Copy)]
pub struct ReadinessWaiter {
    budget: Duration,
    poll_interval: Duration,
}

impl ReadinessWaiter {
    pub fn new(budget: Duration, poll_interval: Duration) -> Self {
        Self {
            budget,
            poll_interval,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub async fn wait<P>(&self, probe: &P, handle: &mut ServiceHandle) -> Readiness
    where
        P: PortProbe + ?Sized,
    {
        let start = Instant::now();
        let mut probes = 0u32;

        loop {
            probes += 1;
            if probe.is_open(handle.port).await {
                let elapsed = start.elapsed();
                info!(
                    "Port {} open after {} probe(s), {:?}",
                    handle.port, probes, elapsed
                );
                return Readiness::Ready { probes, elapsed };
            }

            if let Some(status) = handle.exit_status() {
                let elapsed = start.elapsed();
                warn!(
                    "Service process {} exited ({}) before port {} opened",
                    handle.pid, status, handle.port
                );
                return Readiness::Exited {
                    status,
                    probes,
                    elapsed,
                };
            }

            let elapsed = start.elapsed();
            if elapsed >= self.budget {
                warn!(
                    "Port {} still closed after {:?} ({} probes)",
                    handle.port, elapsed, probes
                );
                return Readiness::TimedOut { probes, elapsed };
            }

            // Never sleep past the budget: the last probe lands exactly on it.
            let pause = self.poll_interval.min(self.budget - elapsed);
            debug!("Port {} closed; retrying in {:?}", handle.port, pause);
            sleep(pause).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use madj_common::model::ServiceProcess;

    use super::*;

    /// Closed for the first `closed_for` probes, open afterwards.
    struct ScriptedProbe {
        closed_for: u32,
        calls: AtomicU32,
    }

    impl ScriptedProbe {
        fn new(closed_for: u32) -> Self {
            Self {
                closed_for,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PortProbe for ScriptedProbe {
        async fn is_open(&self, _port: u16) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst) >= self.closed_for
        }
    }

    #[derive(Debug)]
    struct DiesAfter {
        checks_left: u32,
    }

    impl ServiceProcess for DiesAfter {
        fn exit_status(&mut self) -> Option<String> {
            if self.checks_left == 0 {
                Some("exit status: 1".to_string())
            } else {
                self.checks_left -= 1;
                None
            }
        }
    }

    fn handle() -> ServiceHandle {
        ServiceHandle::new(4242, 8501, PathBuf::from("logs/test.log"))
    }

    #[tokio::test(start_paused = true)]
    async fn ready_after_n_closed_probes() {
        let waiter = ReadinessWaiter::new(Duration::from_secs(30), Duration::from_millis(500));
        for n in [0u32, 1, 5, 20] {
            let probe = ScriptedProbe::new(n);
            let outcome = waiter.wait(&probe, &mut handle()).await;
            assert_eq!(
                outcome,
                Readiness::Ready {
                    probes: n + 1,
                    elapsed: Duration::from_millis(500) * n,
                }
            );
            assert_eq!(probe.calls.load(Ordering::SeqCst), n + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_within_one_interval_of_budget() {
        let budget = Duration::from_secs(5);
        for interval in [Duration::from_millis(500), Duration::from_secs(1), Duration::from_secs(2)] {
            let waiter = ReadinessWaiter::new(budget, interval);
            let probe = ScriptedProbe::new(u32::MAX);
            match waiter.wait(&probe, &mut handle()).await {
                Readiness::TimedOut { elapsed, .. } => {
                    assert!(elapsed >= budget, "gave up early: {elapsed:?}");
                    assert!(elapsed < budget + interval, "overshot: {elapsed:?}");
                }
                other => panic!("expected timeout, got {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn probe_count_at_timeout_matches_schedule() {
        let waiter = ReadinessWaiter::new(Duration::from_secs(5), Duration::from_secs(2));
        let probe = ScriptedProbe::new(u32::MAX);
        let outcome = waiter.wait(&probe, &mut handle()).await;
        // t = 0, 2, 4, then the clamped final probe at 5.
        assert_eq!(
            outcome,
            Readiness::TimedOut {
                probes: 4,
                elapsed: Duration::from_secs(5),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exited_process_short_circuits_the_budget() {
        let waiter = ReadinessWaiter::new(Duration::from_secs(30), Duration::from_secs(1));
        let probe = ScriptedProbe::new(u32::MAX);
        let mut handle = handle().with_process(Box::new(DiesAfter { checks_left: 2 }));

        match waiter.wait(&probe, &mut handle).await {
            Readiness::Exited {
                status,
                probes,
                elapsed,
            } => {
                assert_eq!(status, "exit status: 1");
                assert_eq!(probes, 3);
                assert_eq!(elapsed, Duration::from_secs(2));
            }
            other => panic!("expected early exit, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn open_port_wins_over_exited_process() {
        // A launcher shim may exit after handing off to a server that is already listening.
        let waiter = ReadinessWaiter::new(Duration::from_secs(30), Duration::from_secs(1));
        let probe = ScriptedProbe::new(0);
        let mut handle = handle().with_process(Box::new(DiesAfter { checks_left: 0 }));
        assert!(matches!(
            waiter.wait(&probe, &mut handle).await,
            Readiness::Ready { probes: 1, .. }
        ));
    }
}
