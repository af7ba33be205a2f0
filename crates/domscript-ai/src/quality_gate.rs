use domscript_core::ProbeRules;
use domscript_patterns::strip_prompt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::completion_provider::{CompletionOptions, CompletionProvider};

/// Result of one probe prefix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub prefix: String,
    /// Prompt-stripped completion, absent when the call failed
    pub completion: Option<String>,
    pub passed: bool,
    /// Why the probe failed
    pub failure: Option<String>,
}

/// Aggregate outcome of the battery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateReport {
    probes: Vec<ProbeOutcome>,
    passed: usize,
    total: usize,
    success_rate: f64,
    threshold: f64,
}

impl GateReport {
    pub fn new(probes: Vec<ProbeOutcome>, threshold: f64) -> Self {
        let total = probes.len();
        let passed = probes.iter().filter(|probe| probe.passed).count();
        let success_rate = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64
        };
        Self {
            probes,
            passed,
            total,
            success_rate,
            threshold,
        }
    }

    /// Gate decision: success rate strictly above the threshold
    pub fn passed(&self) -> bool {
        self.success_rate > self.threshold
    }

    pub fn passed_count(&self) -> usize {
        self.passed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }

    pub fn probes(&self) -> &[ProbeOutcome] {
        &self.probes
    }
}

/// Deterministic probe battery deciding whether a backend is trustworthy
#[derive(Debug, Clone)]
pub struct QualityGate {
    rules: ProbeRules,
    denylist: Vec<String>,
    max_new_tokens: usize,
    timeout: Duration,
}

impl QualityGate {
    pub fn new(rules: ProbeRules, max_new_tokens: usize, timeout: Duration) -> Self {
        let denylist = rules
            .denylist
            .iter()
            .map(|token| token.to_lowercase())
            .collect();
        Self {
            rules,
            denylist,
            max_new_tokens,
            timeout,
        }
    }

    pub fn rules(&self) -> &ProbeRules {
        &self.rules
    }

    /// Send every probe to `provider` and aggregate the results.
    ///
    /// Provider errors and timeouts count as failed probes.
    pub async fn run(&self, provider: &dyn CompletionProvider) -> GateReport {
        info!(
            "Running quality gate against {}/{} ({} probes)",
            provider.provider_name(),
            provider.model_name(),
            self.rules.battery.len()
        );

        let options = CompletionOptions::deterministic(self.max_new_tokens);
        let mut probes = Vec::with_capacity(self.rules.battery.len());

        for prefix in &self.rules.battery {
            let outcome = match timeout(self.timeout, provider.complete(prefix, &options)).await {
                Ok(Ok(raw)) => {
                    let completion = strip_prompt(&raw, prefix);
                    let failure = self.check_completion(&completion).err();
                    ProbeOutcome {
                        prefix: prefix.clone(),
                        passed: failure.is_none(),
                        completion: Some(completion),
                        failure,
                    }
                }
                Ok(Err(e)) => ProbeOutcome {
                    prefix: prefix.clone(),
                    completion: None,
                    passed: false,
                    failure: Some(e.to_string()),
                },
                Err(_) => ProbeOutcome {
                    prefix: prefix.clone(),
                    completion: None,
                    passed: false,
                    failure: Some(format!("timed out after {:?}", self.timeout)),
                },
            };
            debug!(prefix = %outcome.prefix, passed = outcome.passed, "probe finished");
            probes.push(outcome);
        }

        GateReport::new(probes, self.rules.pass_threshold)
    }

    /// Probe acceptance on the stripped completion, no repair applied
    pub fn check_completion(&self, completion: &str) -> Result<(), String> {
        let len = completion.chars().count();
        if len <= self.rules.min_len {
            return Err(format!("too short ({} chars)", len));
        }

        let lower = completion.to_lowercase();
        if let Some(token) = self.denylist.iter().find(|token| lower.contains(token.as_str())) {
            return Err(format!("contains {:?}", token));
        }

        if !self
            .rules
            .closing_tokens
            .iter()
            .any(|token| completion.contains(token.as_str()))
        {
            return Err("no closing token".to_string());
        }

        Ok(())
    }
}
