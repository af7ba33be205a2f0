use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::quality_gate::GateReport;

/// Whether model-backed generation may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ModelPhase {
    /// Quality gate has not run yet
    Untested = 0,
    Enabled = 1,
    /// Terminal
    Disabled = 2,
}

impl ModelPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ModelPhase::Untested,
            1 => ModelPhase::Enabled,
            _ => ModelPhase::Disabled,
        }
    }
}

impl fmt::Display for ModelPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelPhase::Untested => write!(f, "untested"),
            ModelPhase::Enabled => write!(f, "enabled"),
            ModelPhase::Disabled => write!(f, "disabled"),
        }
    }
}

/// Model phase plus the one-shot gate latch.
///
/// Transitions: `untested -> enabled`, `untested -> disabled`,
/// `enabled -> disabled`. Nothing leaves `disabled`.
#[derive(Debug)]
pub struct ModelState {
    phase: AtomicU8,
    gate: OnceCell<GateReport>,
}

impl Default for ModelState {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelState {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(ModelPhase::Untested as u8),
            gate: OnceCell::new(),
        }
    }

    /// State for a generator that has no model at all
    pub fn disabled() -> Self {
        Self {
            phase: AtomicU8::new(ModelPhase::Disabled as u8),
            gate: OnceCell::new(),
        }
    }

    pub fn phase(&self) -> ModelPhase {
        ModelPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// True once the gate has passed and nothing has disabled the model since
    pub fn is_active(&self) -> bool {
        self.phase() == ModelPhase::Enabled
    }

    /// Permanently switch to rule-engine-only generation
    pub fn disable(&self) {
        let previous = self.phase.swap(ModelPhase::Disabled as u8, Ordering::AcqRel);
        if previous != ModelPhase::Disabled as u8 {
            warn!(
                "Model generation disabled (was {})",
                ModelPhase::from_u8(previous)
            );
        }
    }

    fn enable(&self) -> bool {
        self.phase
            .compare_exchange(
                ModelPhase::Untested as u8,
                ModelPhase::Enabled as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Run `gate` unless it already ran, and apply its decision.
    ///
    /// Concurrent callers wait for the first run and share its report.
    pub async fn probe_once<F, Fut>(&self, gate: F) -> &GateReport
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = GateReport>,
    {
        self.gate
            .get_or_init(|| async {
                let report = gate().await;
                if report.passed() {
                    if self.enable() {
                        info!(
                            "Quality gate passed ({}/{}), model generation enabled",
                            report.passed_count(),
                            report.total()
                        );
                    }
                } else {
                    warn!(
                        "Quality gate failed ({}/{}), falling back to rule engine",
                        report.passed_count(),
                        report.total()
                    );
                    self.disable();
                }
                report
            })
            .await
    }

    /// Outcome of the gate, if it has run
    pub fn gate_report(&self) -> Option<&GateReport> {
        self.gate.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality_gate::ProbeOutcome;

    fn report(passes: &[bool]) -> GateReport {
        GateReport::new(
            passes
                .iter()
                .map(|&passed| ProbeOutcome {
                    prefix: "document.".to_string(),
                    completion: None,
                    passed,
                    failure: None,
                })
                .collect(),
            0.5,
        )
    }

    #[tokio::test]
    async fn test_passing_gate_enables() {
        let state = ModelState::new();
        assert_eq!(state.phase(), ModelPhase::Untested);
        assert!(!state.is_active());

        state.probe_once(|| async { report(&[true, true, false]) }).await;
        assert_eq!(state.phase(), ModelPhase::Enabled);
        assert!(state.is_active());
    }

    #[tokio::test]
    async fn test_failing_gate_disables_for_good() {
        let state = ModelState::new();
        state.probe_once(|| async { report(&[true, false]) }).await;
        assert_eq!(state.phase(), ModelPhase::Disabled);

        // Latch already set: a passing gate is never run
        state.probe_once(|| async { report(&[true, true]) }).await;
        assert_eq!(state.phase(), ModelPhase::Disabled);
        assert!(!state.gate_report().unwrap().passed());
    }

    #[tokio::test]
    async fn test_disable_is_terminal() {
        let state = ModelState::new();
        state.probe_once(|| async { report(&[true]) }).await;
        state.disable();
        assert_eq!(state.phase(), ModelPhase::Disabled);
        assert!(!state.enable());
    }

    #[tokio::test]
    async fn test_disabled_state_never_enables() {
        let state = ModelState::disabled();
        state.probe_once(|| async { report(&[true, true, true]) }).await;
        assert_eq!(state.phase(), ModelPhase::Disabled);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(ModelPhase::Untested.to_string(), "untested");
        assert_eq!(
            serde_json::to_string(&ModelPhase::Disabled).unwrap(),
            "\"disabled\""
        );
    }
}
