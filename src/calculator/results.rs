//! Accumulates simulation runs and derives statistics from them.
//!
//! Every statistic is a mean over the recorded runs, so with no runs each
//! one comes out as NaN rather than zero.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

use crate::battle::SimulationRun;
use crate::game::{tuv, PlayerId, TuvCosts, Unit};

/// Thread-safe collection of the runs of one calculation.
#[derive(Debug)]
pub struct AggregateResults {
    runs: Mutex<Vec<SimulationRun>>,
    expected_count: usize,
    time: Duration,
}

/// Flat, serializable view of the headline statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsSummary {
    pub runs: usize,
    pub attacker_win_percent: f64,
    pub defender_win_percent: f64,
    pub draw_percent: f64,
    pub average_attacking_units_left: f64,
    pub average_defending_units_left: f64,
    pub average_attacking_units_left_when_attacker_won: f64,
    pub average_defending_units_left_when_defender_won: f64,
    pub average_battle_rounds_fought: f64,
    pub time_ms: u64,
}

fn mean(sum: f64, count: usize) -> f64 {
    sum / count as f64
}

impl AggregateResults {
    pub fn new(expected_count: usize) -> Self {
        AggregateResults {
            runs: Mutex::new(Vec::with_capacity(expected_count)),
            expected_count,
            time: Duration::ZERO,
        }
    }

    pub fn add_result(&self, run: SimulationRun) {
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(run);
    }

    pub fn add_results(&self, runs: impl IntoIterator<Item = SimulationRun>) {
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(runs);
    }

    pub fn expected_count(&self) -> usize {
        self.expected_count
    }

    pub fn len(&self) -> usize {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every recorded run.
    pub fn results(&self) -> Vec<SimulationRun> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Wall-clock time the calculation took.
    pub fn time(&self) -> Duration {
        self.time
    }

    pub fn set_time(&mut self, time: Duration) {
        self.time = time;
    }

    fn with_runs<T>(&self, f: impl FnOnce(&[SimulationRun]) -> T) -> T {
        let runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        f(&runs)
    }

    /// Mean of `value` over all runs.
    fn average(&self, value: impl Fn(&SimulationRun) -> f64) -> f64 {
        self.with_runs(|runs| mean(runs.iter().map(value).sum(), runs.len()))
    }

    /// Mean of `value` over the runs matching `keep`.
    fn average_where(
        &self,
        keep: impl Fn(&SimulationRun) -> bool,
        value: impl Fn(&SimulationRun) -> f64,
    ) -> f64 {
        self.with_runs(|runs| {
            let kept: Vec<&SimulationRun> = runs.iter().filter(|r| keep(r)).collect();
            mean(kept.iter().map(|r| value(r)).sum(), kept.len())
        })
    }

    pub fn attacker_win_percent(&self) -> f64 {
        self.average(|r| if r.attacker_won() { 1.0 } else { 0.0 })
    }

    pub fn defender_win_percent(&self) -> f64 {
        self.average(|r| if r.defender_won() { 1.0 } else { 0.0 })
    }

    pub fn draw_percent(&self) -> f64 {
        self.average(|r| if r.is_draw() { 1.0 } else { 0.0 })
    }

    pub fn average_attacking_units_left(&self) -> f64 {
        self.average(|r| r.attacker_units_remaining.len() as f64)
    }

    pub fn average_defending_units_left(&self) -> f64 {
        self.average(|r| r.defender_units_remaining.len() as f64)
    }

    pub fn average_attacking_units_left_when_attacker_won(&self) -> f64 {
        self.average_where(SimulationRun::attacker_won, |r| {
            r.attacker_units_remaining.len() as f64
        })
    }

    pub fn average_defending_units_left_when_defender_won(&self) -> f64 {
        self.average_where(SimulationRun::defender_won, |r| {
            r.defender_units_remaining.len() as f64
        })
    }

    pub fn average_battle_rounds_fought(&self) -> f64 {
        self.average(|r| r.rounds_fought as f64)
    }

    /// Mean TUV swing in the attacker's favour: what the defender lost minus
    /// what the attacker lost, measured against the starting forces.
    pub fn average_tuv_swing(
        &self,
        attacker: PlayerId,
        attacking_units: &[Unit],
        defender: PlayerId,
        defending_units: &[Unit],
        costs: &dyn TuvCosts,
    ) -> f64 {
        let attacker_costs = costs.costs_for_tuv(attacker);
        let defender_costs = costs.costs_for_tuv(defender);
        let attacker_start = tuv(attacking_units, &attacker_costs);
        let defender_start = tuv(defending_units, &defender_costs);
        self.average(|r| {
            let attacker_lost = attacker_start - tuv(&r.attacker_units_remaining, &attacker_costs);
            let defender_lost = defender_start - tuv(&r.defender_units_remaining, &defender_costs);
            (defender_lost - attacker_lost) as f64
        })
    }

    /// Mean TUV each side still has when the battle ends, as
    /// `(attacker, defender)`.
    pub fn average_tuv_of_units_left_over(
        &self,
        attacker_costs: &HashMap<String, i32>,
        defender_costs: &HashMap<String, i32>,
    ) -> (f64, f64) {
        let attacker = self.average(|r| tuv(&r.attacker_units_remaining, attacker_costs) as f64);
        let defender = self.average(|r| tuv(&r.defender_units_remaining, defender_costs) as f64);
        (attacker, defender)
    }

    pub fn summary(&self) -> ResultsSummary {
        ResultsSummary {
            runs: self.len(),
            attacker_win_percent: self.attacker_win_percent(),
            defender_win_percent: self.defender_win_percent(),
            draw_percent: self.draw_percent(),
            average_attacking_units_left: self.average_attacking_units_left(),
            average_defending_units_left: self.average_defending_units_left(),
            average_attacking_units_left_when_attacker_won: self
                .average_attacking_units_left_when_attacker_won(),
            average_defending_units_left_when_defender_won: self
                .average_defending_units_left_when_defender_won(),
            average_battle_rounds_fought: self.average_battle_rounds_fought(),
            time_ms: self.time.as_millis() as u64,
        }
    }
}
