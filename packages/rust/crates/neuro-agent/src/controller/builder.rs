use std::sync::Arc;

use neuro_types::ToolDefinition;
use neuro_window::HistoryWindow;

use super::loop_guard::LoopGuard;
use super::state::LoopState;
use super::Orchestrator;
use crate::assembler::ContextAssembler;
use crate::backend::BackendFacade;
use crate::config::AgentConfig;
use crate::dispatch::Dispatcher;
use crate::llm::{InferenceWorker, ReasoningEngine};
use crate::metrics::SessionMetrics;
use crate::observability::SessionEvent;
use crate::retrieval::{ExampleRetriever, NoRetrieval};
use crate::session::SessionCounters;
use crate::tools::{HandlerRegistry, RegistryError, ToolCatalog, eeg_catalog, eeg_handlers};
use crate::verify::{ValidatorSet, Verifier};

/// Wires an [`Orchestrator`]. Defaults: the EEG catalog with typed handlers bound to
/// the backend, the built-in validators, the default instructions, no retrieval.
pub struct OrchestratorBuilder {
    config: AgentConfig,
    backend: Arc<dyn BackendFacade>,
    engine: Arc<dyn ReasoningEngine>,
    definitions: Option<Vec<ToolDefinition>>,
    handlers: Option<HandlerRegistry>,
    validators: Option<ValidatorSet>,
    retriever: Option<Arc<dyn ExampleRetriever>>,
    assembler: Option<ContextAssembler>,
    metrics: Option<Arc<SessionMetrics>>,
}

impl OrchestratorBuilder {
    pub fn new(
        config: AgentConfig,
        backend: Arc<dyn BackendFacade>,
        engine: Arc<dyn ReasoningEngine>,
    ) -> Self {
        Self {
            config,
            backend,
            engine,
            definitions: None,
            handlers: None,
            validators: None,
            retriever: None,
            assembler: None,
            metrics: None,
        }
    }

    #[must_use]
    pub fn tools(mut self, definitions: Vec<ToolDefinition>, handlers: HandlerRegistry) -> Self {
        self.definitions = Some(definitions);
        self.handlers = Some(handlers);
        self
    }

    #[must_use]
    pub fn validators(mut self, validators: ValidatorSet) -> Self {
        self.validators = Some(validators);
        self
    }

    #[must_use]
    pub fn retriever(mut self, retriever: Arc<dyn ExampleRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    #[must_use]
    pub fn assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = Some(assembler);
        self
    }

    #[must_use]
    pub fn metrics(mut self, metrics: Arc<SessionMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate the catalog and the registry's completeness against it.
    pub fn build(self) -> Result<Orchestrator, RegistryError> {
        let catalog = ToolCatalog::new(self.definitions.unwrap_or_else(eeg_catalog))?;
        let handlers = self
            .handlers
            .unwrap_or_else(|| eeg_handlers(&self.backend));
        handlers.validate_completeness(&catalog)?;
        tracing::info!(
            event = SessionEvent::RegistryValidated.as_str(),
            tools = catalog.len(),
            "tool registry validated against catalog"
        );

        let metrics = self.metrics.unwrap_or_default();
        let validators = self.validators.unwrap_or_else(ValidatorSet::eeg_defaults);
        let dispatcher = Dispatcher::new(handlers, &self.config, Arc::clone(&metrics));
        Ok(Orchestrator {
            verifier: Verifier::new(validators, self.config.confidence_threshold),
            history: HistoryWindow::new(self.config.window_limits()),
            catalog: Arc::new(catalog),
            backend: self.backend,
            worker: InferenceWorker::new(self.engine),
            retriever: self.retriever.unwrap_or_else(|| Arc::new(NoRetrieval)),
            assembler: self.assembler.unwrap_or_default(),
            dispatcher: Arc::new(dispatcher),
            metrics,
            counters: SessionCounters::default(),
            guard: LoopGuard::default(),
            state: LoopState::Idle,
            audit: Vec::new(),
            turn_records: Vec::new(),
            pending: None,
            last_problem: None,
            config: self.config,
        })
    }
}

impl Orchestrator {
    pub fn builder(
        config: AgentConfig,
        backend: Arc<dyn BackendFacade>,
        engine: Arc<dyn ReasoningEngine>,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder::new(config, backend, engine)
    }
}
