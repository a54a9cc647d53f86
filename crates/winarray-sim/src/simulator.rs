//! Scroll simulator
//!
//! Drives a [`RemoteArray`] over a [`VirtualCollection`] with a seeded random
//! walk of user actions and checks after every settled step:
//! - the view is exactly the bounded slice of the backing store
//! - `len` and `get` agree with the bounds
//! - the store stays sorted with unique keys
//! - no fetch is issued past an edge already reached
//! - replaying change notifications reproduces the view

use crate::config::SimulatorConfig;
use crate::error::SimError;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::time::Duration;
use winarray_remote::{ArrayStatus, RemoteArray, WindowConfig};
use winarray_test_utils::{indices, ChangeMirror, FetchCall, Record, VirtualCollection};

/// One simulated user action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SimulatedAction {
    /// Scroll a short distance
    Scroll {
        /// New first visible row
        start: usize,
    },
    /// Jump anywhere in the collection
    Jump {
        /// New first visible row
        start: usize,
    },
    /// Explicit reload
    Reload,
    /// Change the prefetch margin
    SetMargin {
        /// New margin
        margin: usize,
    },
}

/// A violation detected during simulation
///
/// Every variant carries the `step` it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// View differs from the bounded store slice
    ViewMismatch {
        /// Step index
        step: u64,
        /// Keys of the bounded store slice
        expected: Vec<u64>,
        /// Keys of the view
        actual: Vec<u64>,
    },
    /// `len` differs from the bounds
    LengthMismatch {
        /// Step index
        step: u64,
        /// Length of the bounds
        expected: usize,
        /// Reported length
        actual: usize,
    },
    /// `get` returned the wrong item
    TranslationMismatch {
        /// Step index
        step: u64,
        /// Window-local index
        index: usize,
        /// Key at the translated store index
        expected: Option<u64>,
        /// Key returned by `get`
        actual: Option<u64>,
    },
    /// Store keys not strictly increasing
    StoreOutOfOrder {
        /// Step index
        step: u64,
        /// Key of the earlier item
        before: u64,
        /// Key of the item after it
        after: u64,
    },
    /// Fetch issued past an edge already reached
    FetchPastEdge {
        /// Step index
        step: u64,
        /// Anchor key of the call
        anchor: Option<u64>,
        /// Requested size
        size: usize,
        /// Requested offset
        offset: isize,
    },
    /// Notification replica differs from the view
    MirrorDiverged {
        /// Step index
        step: u64,
        /// Keys of the replica
        replica: Vec<u64>,
        /// Keys of the view
        view: Vec<u64>,
    },
}

/// Statistics for simulation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulatorStats {
    /// Steps completed
    pub steps: u64,
    /// Fetch calls seen by the collection, initial load included
    pub fetch_calls: u64,
    /// Failures armed; each fails the next fetch
    pub failures_injected: u64,
    /// Explicit reloads
    pub reloads: u64,
    /// Store length at the end of the run
    pub final_store_len: usize,
}

/// Final report from simulator
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorReport {
    /// Effective configuration
    pub config: SimulatorConfig,
    /// Counters
    pub stats: SimulatorStats,
    /// Violations in detection order
    pub violations: Vec<Violation>,
    /// Array status after the last step
    pub final_status: ArrayStatus,
}

impl SimulatorReport {
    /// Check if simulation passed all criteria
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== winarray Simulator Report ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!(
            "Collection: {} items, window {} (+/-{})\n",
            self.config.collection_size, self.config.window_len, self.config.index_margin
        ));
        report.push_str(&format!("Steps: {}\n", self.stats.steps));
        report.push_str(&format!("Fetch Calls: {}\n", self.stats.fetch_calls));
        report.push_str(&format!("Failures Injected: {}\n", self.stats.failures_injected));
        report.push_str(&format!("Reloads: {}\n", self.stats.reloads));
        report.push_str(&format!("Final Store Length: {}\n", self.stats.final_store_len));
        report.push_str(&format!(
            "Edges Reached: start={} end={}\n",
            self.final_status.start_reached, self.final_status.end_reached
        ));
        report.push_str(&format!("Violations: {}\n", self.violations.len()));

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                report.push_str(&format!("{}. {:?}\n", i + 1, v));
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }

    /// Render as pretty JSON
    ///
    /// # Errors
    /// - serialization failure
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Edges known to be reached before a step
#[derive(Debug, Clone, Copy)]
struct EdgeGuard {
    start: bool,
    end: bool,
}

/// Run the simulator
///
/// # Errors
/// - `SimError::InvalidConfig` for out-of-range settings
/// - `SimError::Array` if the array can't be created
pub async fn run_simulator(config: SimulatorConfig) -> Result<SimulatorReport, SimError> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let collection =
        VirtualCollection::new(config.collection_size).with_latency(Duration::from_millis(config.latency_ms));
    let window = WindowConfig::new(0, config.window_len).with_margin(config.index_margin);
    let array = RemoteArray::new(collection.clone(), window)?;

    tracing::info!(
        "Simulating {} steps over {} items (seed {})",
        config.steps,
        config.collection_size,
        config.seed
    );

    array.initial_load().await;
    array.settled().await;

    let mut mirror = ChangeMirror::new(array.to_vec(), array.subscribe());
    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();

    for step in 0..config.steps {
        let action = generate_action(&mut rng, &config, array.window());
        if rng.random_bool(config.failure_rate) {
            collection.fail_next(1);
            stats.failures_injected += 1;
        }

        let status = array.status();
        let guard = match action {
            SimulatedAction::Reload => EdgeGuard {
                start: false,
                end: false,
            },
            _ => EdgeGuard {
                start: status.start_reached,
                end: status.end_reached,
            },
        };
        let calls_before = collection.call_count();

        tracing::debug!("Step {}: {:?}", step, action);
        apply_action(&array, action).await?;
        array.settled().await;

        stats.steps += 1;
        if action == SimulatedAction::Reload {
            stats.reloads += 1;
        }

        let calls = collection.calls();
        let found = check_step(step, &array, &mut mirror, guard, &calls[calls_before..]);
        if !found.is_empty() {
            for violation in &found {
                tracing::warn!("Violation at step {}: {:?}", step, violation);
            }
            violations.extend(found);
            if config.stop_on_first_violation {
                break;
            }
        }
    }

    stats.fetch_calls = collection.call_count() as u64;
    stats.final_store_len = array.source_len();
    let final_status = array.status();
    array.dispose();

    tracing::info!(
        "Simulation finished: {} steps, {} fetches, {} violations",
        stats.steps,
        stats.fetch_calls,
        violations.len()
    );

    Ok(SimulatorReport {
        config,
        stats,
        violations,
        final_status,
    })
}

/// Generate a random user action
fn generate_action(rng: &mut StdRng, config: &SimulatorConfig, window: WindowConfig) -> SimulatedAction {
    let len = config.window_len;
    let total = usize::try_from(config.collection_size).unwrap_or(usize::MAX);
    let max_start = total.saturating_sub(len);

    match rng.random_range(0..100) {
        0..=69 => {
            let reach = isize::try_from(2 * len).unwrap_or(isize::MAX);
            let reach = i64::try_from(reach).unwrap_or(i64::MAX);
            let delta = isize::try_from(rng.random_range(-reach..=reach)).unwrap_or(0);
            SimulatedAction::Scroll {
                start: window.start_index.saturating_add_signed(delta).min(max_start),
            }
        }
        70..=79 => SimulatedAction::Jump {
            start: rng.random_range(0..=max_start),
        },
        80..=89 => SimulatedAction::Reload,
        _ => SimulatedAction::SetMargin {
            margin: rng.random_range(0..=config.index_margin),
        },
    }
}

async fn apply_action(array: &RemoteArray<Record>, action: SimulatedAction) -> Result<(), SimError> {
    match action {
        SimulatedAction::Scroll { start } | SimulatedAction::Jump { start } => {
            let len = array.window().end_index - array.window().start_index;
            array.set_window(start, start + len)?;
        }
        SimulatedAction::Reload => array.reload().await,
        SimulatedAction::SetMargin { margin } => array.set_index_margin(margin),
    }
    Ok(())
}

/// Check every invariant against the settled array
fn check_step(
    step: u64,
    array: &RemoteArray<Record>,
    mirror: &mut ChangeMirror<Record>,
    guard: EdgeGuard,
    calls: &[FetchCall],
) -> Vec<Violation> {
    let mut violations = Vec::new();

    let store = array.store_snapshot();
    let bounds = array.window().bounds(store.len());
    let expected = store.get(bounds.start..bounds.end).unwrap_or_default();
    let view = array.to_vec();

    if view != expected {
        violations.push(Violation::ViewMismatch {
            step,
            expected: indices(expected),
            actual: indices(&view),
        });
    }

    if array.len() != bounds.len() {
        violations.push(Violation::LengthMismatch {
            step,
            expected: bounds.len(),
            actual: array.len(),
        });
    }

    for index in 0..=bounds.len() {
        let expected = bounds
            .translate(index)
            .and_then(|source| store.get(source))
            .map(|record| record.index);
        let actual = array.get(index).map(|record| record.index);
        if expected != actual {
            violations.push(Violation::TranslationMismatch {
                step,
                index,
                expected,
                actual,
            });
            break;
        }
    }

    if let Some(pair) = store.windows(2).find(|pair| pair[0].index >= pair[1].index) {
        violations.push(Violation::StoreOutOfOrder {
            step,
            before: pair[0].index,
            after: pair[1].index,
        });
    }

    for call in calls {
        let past_end = guard.end && call.offset == 0 && call.anchor.is_some();
        let past_start = guard.start && call.offset < 0;
        if past_end || past_start {
            violations.push(Violation::FetchPastEdge {
                step,
                anchor: call.anchor,
                size: call.size,
                offset: call.offset,
            });
        }
    }

    mirror.sync(&view);
    if mirror.replica() != view.as_slice() {
        violations.push(Violation::MirrorDiverged {
            step,
            replica: indices(mirror.replica()),
            view: indices(&view),
        });
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_stay_inside_collection() {
        let config = SimulatorConfig::default().with_collection_size(50).with_window(10, 2);
        let mut rng = StdRng::seed_from_u64(3);
        let window = WindowConfig::new(35, 45);

        for _ in 0..500 {
            match generate_action(&mut rng, &config, window) {
                SimulatedAction::Scroll { start } | SimulatedAction::Jump { start } => assert!(start <= 40),
                SimulatedAction::SetMargin { margin } => assert!(margin <= 2),
                SimulatedAction::Reload => {}
            }
        }
    }

    #[test]
    fn same_seed_same_actions() {
        let config = SimulatorConfig::default();
        let window = WindowConfig::new(0, 10);
        let walk = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..50)
                .map(|_| generate_action(&mut rng, &config, window))
                .collect::<Vec<_>>()
        };
        assert_eq!(walk(11), walk(11));
    }

    #[tokio::test]
    async fn clean_run_passes() {
        let config = SimulatorConfig::default().with_steps(60).with_collection_size(300);
        let report = run_simulator(config).await.unwrap();

        assert!(report.passed(), "{}", report.generate_text());
        assert_eq!(report.stats.steps, 60);
        assert!(report.stats.fetch_calls > 0);
        assert!(report.generate_text().contains("Result: PASS"));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let config = SimulatorConfig::default().with_failure_rate(2.0);
        assert!(matches!(run_simulator(config).await, Err(SimError::InvalidConfig(_))));
    }
}
