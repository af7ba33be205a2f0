use domscript_core::{DomScriptConfig, GenerationResult, ProbeRules, ValidationRules};
use domscript_patterns::{CompletionValidator, PromptEnhancer, RejectionReason, RuleEngine};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::completion_provider::{CompletionError, CompletionOptions, CompletionProvider};
use crate::model_state::{ModelPhase, ModelState};
use crate::provider_factory::CompletionProviderFactory;
use crate::quality_gate::{GateReport, QualityGate};

/// Why a request was answered by the rule engine
#[derive(Error, Debug)]
pub enum FallbackReason {
    #[error("model generation disabled")]
    Disabled,

    #[error(transparent)]
    Model(#[from] CompletionError),

    #[error("model did not answer within {0:?}")]
    Timeout(Duration),

    #[error("completion rejected: {0}")]
    Rejected(#[from] RejectionReason),
}

/// Tuning for the generation pipeline
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub validation: ValidationRules,
    pub probe: ProbeRules,
    /// Options for request-time completions
    pub options: CompletionOptions,
    pub probe_max_new_tokens: usize,
    /// Upper bound for a single model call
    pub timeout: Duration,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            validation: ValidationRules::default(),
            probe: ProbeRules::default(),
            options: CompletionOptions::default(),
            probe_max_new_tokens: 20,
            timeout: Duration::from_secs(30),
        }
    }
}

impl GeneratorSettings {
    pub fn from_config(config: &DomScriptConfig) -> Self {
        Self {
            validation: config.validation.clone(),
            probe: config.probe.clone(),
            options: CompletionOptions::sampled(
                config.model.max_new_tokens,
                config.model.top_p,
                config.model.repetition_penalty,
            ),
            probe_max_new_tokens: config.model.probe_max_new_tokens,
            timeout: Duration::from_secs(config.model.timeout_secs),
        }
    }
}

/// Dual-mode snippet generator.
///
/// Uses the model while the quality gate allows it and falls back to the
/// rule engine for every request the model cannot answer acceptably.
/// `generate` has no error path.
pub struct Generator {
    provider: Option<Arc<dyn CompletionProvider>>,
    state: Arc<ModelState>,
    enhancer: PromptEnhancer,
    validator: CompletionValidator,
    rules: RuleEngine,
    gate: QualityGate,
    options: CompletionOptions,
    timeout: Duration,
}

impl Generator {
    /// A generator without a provider starts disabled
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>, settings: GeneratorSettings) -> Self {
        let state = if provider.is_some() {
            ModelState::new()
        } else {
            ModelState::disabled()
        };
        Self::with_state(provider, settings, Arc::new(state))
    }

    /// Share an existing state object, e.g. between a server and its tests
    pub fn with_state(
        provider: Option<Arc<dyn CompletionProvider>>,
        settings: GeneratorSettings,
        state: Arc<ModelState>,
    ) -> Self {
        Self {
            provider,
            state,
            enhancer: PromptEnhancer::new(),
            rules: RuleEngine::new(&settings.validation),
            validator: CompletionValidator::new(settings.validation),
            gate: QualityGate::new(settings.probe, settings.probe_max_new_tokens, settings.timeout),
            options: settings.options,
            timeout: settings.timeout,
        }
    }

    /// Build the provider named in `config`; without one only the rule engine is used
    pub fn from_config(config: &DomScriptConfig) -> Self {
        let provider = if config.model.enabled {
            match CompletionProviderFactory::create_from_config(&config.model) {
                Ok(provider) => {
                    info!(
                        "Using {} completion provider ({})",
                        provider.provider_name(),
                        provider.model_name()
                    );
                    Some(provider)
                }
                Err(e) => {
                    warn!("Completion provider unavailable, rule engine only: {}", e);
                    None
                }
            }
        } else {
            info!("Model generation disabled in configuration, rule engine only");
            None
        };

        Self::new(provider, GeneratorSettings::from_config(config))
    }

    /// Translate `command` into a snippet
    pub async fn generate(&self, command: &str) -> GenerationResult {
        let start_time = Instant::now();

        let result = match self.model_snippet(command).await {
            Ok(code) => {
                info!("Generated AI snippet for {:?}", command);
                GenerationResult::ai(code, command)
            }
            Err(reason) => {
                match &reason {
                    FallbackReason::Disabled => debug!("Rule engine for {:?}", command),
                    other => warn!("Falling back to rule engine for {:?}: {}", command, other),
                }
                GenerationResult::fallback(self.rules.render(command), command)
            }
        };

        debug!(
            source = %result.source(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "generation finished"
        );
        result
    }

    async fn model_snippet(&self, command: &str) -> Result<String, FallbackReason> {
        let provider = self.active_provider().await.ok_or(FallbackReason::Disabled)?;

        let prefix = self.enhancer.enhance(command);
        debug!(prefix = %prefix, "enhanced prompt");

        let raw = timeout(self.timeout, provider.complete(&prefix, &self.options))
            .await
            .map_err(|_| FallbackReason::Timeout(self.timeout))??;

        Ok(self.validator.review(&raw, &prefix)?)
    }

    /// Provider to use for this request, running the gate first if needed
    async fn active_provider(&self) -> Option<&Arc<dyn CompletionProvider>> {
        let provider = self.provider.as_ref()?;
        if self.state.phase() == ModelPhase::Untested {
            self.state
                .probe_once(|| self.gate.run(provider.as_ref()))
                .await;
        }
        self.state.is_active().then_some(provider)
    }

    /// Run the gate now instead of on the first request.
    ///
    /// Returns `None` when there is no provider to test.
    pub async fn probe(&self) -> Option<GateReport> {
        let provider = self.provider.as_ref()?;
        if let Some(report) = self.state.gate_report() {
            return Some(report.clone());
        }
        if self.state.phase() == ModelPhase::Disabled {
            return None;
        }
        let report = self
            .state
            .probe_once(|| self.gate.run(provider.as_ref()))
            .await;
        Some(report.clone())
    }

    /// Switch to rule-engine-only generation for the rest of the process
    pub fn disable_model(&self) {
        self.state.disable();
    }

    pub fn model_phase(&self) -> ModelPhase {
        self.state.phase()
    }

    pub fn gate_report(&self) -> Option<&GateReport> {
        self.state.gate_report()
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_ref().map(|provider| provider.provider_name())
    }

    pub fn model_name(&self) -> Option<&str> {
        self.provider.as_ref().map(|provider| provider.model_name())
    }

    /// Whether the configured backend answers a health request right now.
    ///
    /// Does not touch the model phase; only the gate decides that.
    pub async fn provider_available(&self) -> bool {
        match &self.provider {
            Some(provider) => provider.is_available().await,
            None => false,
        }
    }

    pub fn rule_engine(&self) -> &RuleEngine {
        &self.rules
    }
}
