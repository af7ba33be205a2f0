pub mod completion_provider;
pub mod generator;
pub mod model_state;
pub mod ollama_client;
pub mod provider_factory;
pub mod quality_gate;

// Hosted and OpenAI-style backends
#[cfg(feature = "huggingface")]
pub mod huggingface_provider;
#[cfg(feature = "openai-compatible")]
pub mod openai_compatible_provider;

pub use completion_provider::*;
pub use generator::{FallbackReason, Generator, GeneratorSettings};
pub use model_state::{ModelPhase, ModelState};
pub use ollama_client::{OllamaClient, OllamaConfig};
pub use provider_factory::CompletionProviderFactory;
pub use quality_gate::{GateReport, ProbeOutcome, QualityGate};
