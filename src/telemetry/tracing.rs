//! Wall-clock timing of the phases of a run.

use parking_lot::RwLock;
use std::time::{Duration, Instant};

/// One timed phase.
#[derive(Debug, Clone)]
pub struct Phase {
    /// Phase name.
    pub name: &'static str,
    /// When the phase was entered.
    pub start: Instant,
    /// When its guard dropped; `None` while running.
    pub end: Option<Instant>,
}

impl Phase {
    /// Duration of a finished phase.
    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end.duration_since(self.start))
    }
}

/// Records phases in the order they are entered.
#[derive(Debug, Default)]
pub struct PhaseTimer {
    phases: RwLock<Vec<Phase>>,
}

impl PhaseTimer {
    /// Timer with no phases.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a phase; it ends when the guard drops.
    pub fn enter(&self, name: &'static str) -> PhaseGuard<'_> {
        let mut phases = self.phases.write();
        phases.push(Phase {
            name,
            start: Instant::now(),
            end: None,
        });

        PhaseGuard {
            index: phases.len() - 1,
            timer: self,
        }
    }

    /// Total time of the finished phases called `name`.
    pub fn duration(&self, name: &str) -> Duration {
        self.phases
            .read()
            .iter()
            .filter(|p| p.name == name)
            .filter_map(Phase::duration)
            .sum()
    }

    /// Total time of the finished phases with any of `names`.
    pub fn total(&self, names: &[&str]) -> Duration {
        names.iter().map(|name| self.duration(name)).sum()
    }

    /// Copy of every recorded phase.
    pub fn phases_snapshot(&self) -> Vec<Phase> {
        self.phases.read().clone()
    }
}

/// Closes its phase when dropped.
#[derive(Debug)]
pub struct PhaseGuard<'a> {
    index: usize,
    timer: &'a PhaseTimer,
}

impl<'a> Drop for PhaseGuard<'a> {
    fn drop(&mut self) {
        if let Some(phase) = self.timer.phases.write().get_mut(self.index) {
            phase.end = Some(Instant::now());
            log::debug!("phase {} took {:?}", phase.name, phase.end.map(|e| e - phase.start));
        }
    }
}
