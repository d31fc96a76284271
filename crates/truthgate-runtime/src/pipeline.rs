//! The truthgate pipeline.
//!
//! `TruthPipeline` wires every stage together:
//!
//! ```text
//! query → classify → lookup requirement → cache → select sources → fetch
//!       → (cache store | graceful degradation)
//!       → [response generator] → doctrine gates → reasoning escalation
//! ```
//!
//! Nothing here returns an error once the pipeline is built. A failed lookup
//! becomes a degraded outcome and a failed generator becomes the degradation
//! text, so the outer request handler always has something safe to send.

use std::sync::Arc;

use tracing::{debug, info, warn};

use truthgate_cache::{FreshnessCache, InMemoryStore};
use truthgate_classify::{LookupRequirementPolicy, TruthClassifier};
use truthgate_contracts::{
    cache::SourceClass,
    config::TruthgateConfig,
    doctrine::{EnforcementOutcome, EscalationContext, OperatingMode, ResponseMetadata},
    error::TruthgateResult,
    lookup::{LookupResult, RequestId},
    truth::TruthType,
};
use truthgate_core::{
    traits::{Clock, Credentials, FallbackClassifier, Fetcher, GenerationContext, ResponseGenerator},
    config::validate_config,
    EnvCredentials, SystemClock,
};
use truthgate_doctrine::{DoctrineEnforcer, ReasoningEscalationEnforcer};
use truthgate_lookup::{
    clean_search_query, DegradationHandler, LookupExecutor, LookupRequest, ReqwestFetcher,
};
use truthgate_sources::{ExtractorRegistry, SourceCatalog, SourceSelector};

use crate::response::{FinalResponse, LookupOptions, LookupOutcome, PipelineResponse};

/// Below this confidence, high-stakes or ambiguous answers need bounded reasoning.
const BOUNDED_REASONING_CONFIDENCE: f64 = 0.7;

/// Assembles a `TruthPipeline`, defaulting every seam to its production implementation.
pub struct PipelineBuilder {
    config: TruthgateConfig,
    catalog: Option<SourceCatalog>,
    extractors: Option<ExtractorRegistry>,
    fetcher: Option<Arc<dyn Fetcher>>,
    credentials: Option<Arc<dyn Credentials>>,
    clock: Option<Arc<dyn Clock>>,
    fallback: Option<Box<dyn FallbackClassifier>>,
}

impl PipelineBuilder {
    pub fn catalog(mut self, catalog: SourceCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = Some(extractors);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn Credentials>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn fallback_classifier(mut self, fallback: Box<dyn FallbackClassifier>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Build the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the configuration fails validation (for
    /// example a volatile TTL above the doctrine ceiling), `CatalogError` when
    /// the catalog names an unknown extractor or pairs a source with an
    /// extractor for another parser kind, and `FetchError` when the default
    /// HTTP client cannot be built.
    pub fn build(self) -> TruthgateResult<TruthPipeline> {
        let config = self.config;
        validate_config(&config)?;
        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => SourceCatalog::builtin()?,
        };
        let extractors = self.extractors.unwrap_or_else(ExtractorRegistry::with_defaults);
        catalog.validate(&extractors)?;

        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(ReqwestFetcher::new(&config.lookup.user_agent, config.lookup.max_body_bytes)?),
        };
        let credentials = self.credentials.unwrap_or_else(|| Arc::new(EnvCredentials));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let cache = Arc::new(FreshnessCache::with_parts(
            config.cache.clone(),
            clock.clone(),
            Box::new(InMemoryStore::new()),
        ));
        let mut classifier = TruthClassifier::new(config.classifier.clone());
        if let Some(fallback) = self.fallback {
            classifier = classifier.with_fallback(fallback);
        }

        info!(
            sources = catalog.len(),
            extractors = extractors.names().len(),
            "truth pipeline ready"
        );

        Ok(TruthPipeline {
            classifier,
            requirement: LookupRequirementPolicy::new(config.requirement.clone(), config.lookup.max_sources),
            selector: SourceSelector::new(Arc::new(catalog), credentials.clone()),
            executor: LookupExecutor::new(
                fetcher,
                Arc::new(extractors),
                credentials,
                cache.clone(),
                clock,
                config.lookup.clone(),
            ),
            cache,
            degradation: DegradationHandler::new(config.degradation.clone()),
            doctrine: DoctrineEnforcer::new(&config.doctrine),
            escalation: ReasoningEscalationEnforcer::new(),
            config,
        })
    }
}

/// The assembled pipeline. One per process; every method takes `&self`.
pub struct TruthPipeline {
    config: TruthgateConfig,
    classifier: TruthClassifier,
    requirement: LookupRequirementPolicy,
    selector: SourceSelector,
    executor: LookupExecutor,
    cache: Arc<FreshnessCache>,
    degradation: DegradationHandler,
    doctrine: DoctrineEnforcer,
    escalation: ReasoningEscalationEnforcer,
}

impl TruthPipeline {
    pub fn builder(config: TruthgateConfig) -> PipelineBuilder {
        PipelineBuilder {
            config,
            catalog: None,
            extractors: None,
            fetcher: None,
            credentials: None,
            clock: None,
            fallback: None,
        }
    }

    /// A production pipeline: built-in catalog, live HTTP, environment credentials.
    pub fn new(config: TruthgateConfig) -> TruthgateResult<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &TruthgateConfig {
        &self.config
    }

    pub fn classifier(&self) -> &TruthClassifier {
        &self.classifier
    }

    pub fn selector(&self) -> &SourceSelector {
        &self.selector
    }

    /// The shared cache, for stats, invalidation and clearing.
    pub fn cache(&self) -> &FreshnessCache {
        &self.cache
    }

    /// Classify `query`, verify it if warranted, and degrade if verification fails.
    pub async fn lookup(&self, query: &str, options: &LookupOptions) -> PipelineResponse {
        let request_id = RequestId::new();

        // ── Step 1: Classify ─────────────────────────────────────────────────
        let classification = self.classifier.classify(query);
        let truth_ttl_ms = u64::try_from(self.cache.ttl_for(classification.truth_type).as_millis())
            .unwrap_or(u64::MAX);
        debug!(
            request_id = %request_id,
            truth_type = %classification.truth_type,
            confidence = classification.confidence,
            stage = u8::from(classification.stage),
            "query classified"
        );

        // ── Step 2: Decide whether to verify ─────────────────────────────────
        let requirement =
            self.requirement
                .is_lookup_required(query, &classification, options.internal_confidence);

        let response = |outcome| PipelineResponse {
            request_id: request_id.clone(),
            query: query.to_string(),
            classification: classification.clone(),
            requirement: requirement.clone(),
            truth_ttl_ms,
            internal_confidence: options.internal_confidence,
            outcome,
        };

        if !requirement.required {
            info!(request_id = %request_id, reasons = ?requirement.reasons, "lookup not required");
            return response(LookupOutcome::NotRequired);
        }

        // ── Step 3: Select sources ───────────────────────────────────────────
        let selection = self.selector.select_sources_for_query(
            query,
            classification.truth_type,
            &classification.high_stakes,
        );

        // ── Step 4: Cache check and bounded fetch ────────────────────────────
        //
        // The executor reads the cache first, so an empty selection can still
        // be answered from a previous lookup.
        let result = self
            .executor
            .perform_lookup(LookupRequest {
                query,
                selection: &selection,
                truth_type: classification.truth_type,
                high_stakes: &classification.high_stakes,
                max_sources: requirement.max_lookups,
                force_refresh: options.force_refresh,
            })
            .await;

        // ── Step 5: Degrade on total failure ─────────────────────────────────
        let outcome = match result {
            LookupResult::Verified(v) if v.from_cache => LookupOutcome::Cached(v),
            LookupResult::Verified(v) => LookupOutcome::Verified(v),
            LookupResult::Failed(failure) => {
                let failure = (!failure.sources_consulted.is_empty()).then_some(failure);
                let degraded = self.degradation.graceful_degradation(
                    query,
                    failure.as_ref(),
                    options.internal_answer.as_deref(),
                );
                LookupOutcome::Degraded {
                    response: degraded,
                    failure,
                }
            }
        };

        info!(
            request_id = %request_id,
            truth_type = %classification.truth_type,
            priority = ?requirement.priority,
            from_cache = matches!(outcome, LookupOutcome::Cached(_)),
            degraded = matches!(outcome, LookupOutcome::Degraded { .. }),
            "lookup complete"
        );
        response(outcome)
    }

    /// Doctrine metadata describing a lookup's provenance.
    pub fn metadata_for(&self, lookup: &PipelineResponse) -> ResponseMetadata {
        let verified = matches!(lookup.outcome, LookupOutcome::Cached(_) | LookupOutcome::Verified(_));
        let confidence = match &lookup.outcome {
            LookupOutcome::Cached(v) | LookupOutcome::Verified(v) => Some(v.confidence),
            LookupOutcome::NotRequired => lookup
                .internal_confidence
                .or(Some(lookup.classification.confidence)),
            LookupOutcome::Degraded { .. } => lookup.internal_confidence,
        };

        ResponseMetadata {
            truth_type: Some(lookup.classification.truth_type),
            confidence,
            source_class: Some(if verified {
                SourceClass::External
            } else {
                SourceClass::Internal
            }),
            verified_at: lookup.verified_at(),
            external_verification: verified,
            cache_ttl_ms: lookup.cache_ttl_ms(),
            lookup_attempted: lookup.lookup_performed(),
            lookup_failed: lookup.degraded(),
            degraded: lookup.degraded(),
            high_stakes: lookup.classification.high_stakes.clone(),
            ..ResponseMetadata::default()
        }
    }

    /// Run the doctrine gates over `text`.
    pub fn enforce(&self, text: &str, metadata: &ResponseMetadata, mode: &OperatingMode) -> EnforcementOutcome {
        self.doctrine.enforce_all(text, metadata, mode)
    }

    /// Whether a response built on `lookup` must show bounded reasoning.
    pub fn bounded_reasoning_required(&self, lookup: &PipelineResponse, metadata: &ResponseMetadata) -> bool {
        let confidence = metadata.confidence.unwrap_or(0.0);
        let uncertain = confidence < BOUNDED_REASONING_CONFIDENCE;
        let classification = &lookup.classification;

        lookup.degraded()
            || (classification.high_stakes.is_high_stakes && uncertain)
            || ((classification.truth_type == TruthType::Ambiguous || classification.conflict_detected)
                && uncertain)
    }

    /// The whole flow: lookup, generation, enforcement, escalation.
    pub async fn respond(
        &self,
        query: &str,
        options: &LookupOptions,
        mode: &OperatingMode,
        generator: &dyn ResponseGenerator,
    ) -> FinalResponse {
        let lookup = self.lookup(query, options).await;
        let mut metadata = self.metadata_for(&lookup);
        let bounded_reasoning_required = self.bounded_reasoning_required(&lookup, &metadata);

        let context = GenerationContext {
            query: query.to_string(),
            truth_type: Some(lookup.truth_type()),
            confidence: metadata.confidence,
            data: lookup.data().map(str::to_string),
            disclosure: lookup.disclosure(),
            verification_path: lookup.verification_path().cloned(),
            bounded_reasoning_required,
        };

        let (generated, generation_error) = match generator.generate(&context).await {
            Ok(text) => (text, None),
            Err(e) => {
                warn!(request_id = %lookup.request_id, error = %e, "generation failed, using degradation text");
                let text = match &lookup.outcome {
                    LookupOutcome::Degraded { response, .. } => response.response_text(),
                    _ => self
                        .degradation
                        .graceful_degradation(query, None, None)
                        .response_text(),
                };
                metadata.degraded = true;
                (text, Some(e.to_string()))
            }
        };

        let enforcement = self.enforce(&generated, &metadata, mode);
        let enforced = enforcement.final_text(&generated);

        let escalation = self.escalation.enforce(
            &enforced,
            bounded_reasoning_required,
            &EscalationContext {
                truth_type: Some(lookup.truth_type()),
                confidence: metadata.confidence,
                topic: Some(clean_search_query(query, self.config.lookup.max_search_query_chars)),
            },
        );
        let text = escalation.corrected_response.clone().unwrap_or(enforced);

        info!(
            request_id = %lookup.request_id,
            enforcement_passed = enforcement.enforcement_passed,
            violations = enforcement.violations.len(),
            escalation = ?escalation.verdict,
            "response finalised"
        );

        FinalResponse {
            request_id: lookup.request_id.clone(),
            text,
            lookup,
            metadata,
            enforcement,
            escalation,
            bounded_reasoning_required,
            generation_error,
        }
    }
}

impl std::fmt::Debug for TruthPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TruthPipeline")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("doctrine", &self.doctrine)
            .finish_non_exhaustive()
    }
}
