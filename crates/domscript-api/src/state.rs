use domscript_ai::Generator;
use domscript_core::DomScriptConfig;
use std::sync::Arc;

use crate::script_store::ScriptStore;

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<Generator>,
    pub scripts: Arc<ScriptStore>,
}

impl AppState {
    pub fn new(config: &DomScriptConfig) -> Self {
        Self::with_generator(
            Generator::from_config(config),
            ScriptStore::new(config.storage.scripts_path.clone()),
        )
    }

    pub fn with_generator(generator: Generator, scripts: ScriptStore) -> Self {
        Self {
            generator: Arc::new(generator),
            scripts: Arc::new(scripts),
        }
    }
}
