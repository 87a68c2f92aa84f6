use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use log::{debug, warn};

use crate::constants::DEFAULT_POOL_WIDTH;
use crate::sources::{
    AdapterCache, ResourceKind, SourceAdapter, SourceDescriptor, SourceError, SourceRegistry,
};

/// Per-task result inside the executor. Collapses at the batch boundary:
/// successes become list entries, failures become diagnostic reports and
/// nothing else.
#[derive(Debug)]
pub enum FetchOutcome<R> {
    Success(R),
    Failure {
        source_id: String,
        error: SourceError,
    },
}

/// Advisory channel for per-task failures. Reports never influence the
/// returned record list.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, source_id: &str, error: &SourceError);
}

/// Default sink: failures go to the log. Unsupported operations are
/// routine during batch checks, so they log at debug rather than warn.
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, source_id: &str, error: &SourceError) {
        match error {
            SourceError::Unsupported(..) => debug!("Skipping {}: {}", source_id, error),
            _ => warn!("Error checking {}: {}", source_id, error),
        }
    }
}

/// Bounded-concurrency fan-out over source adapters.
///
/// A batch dispatches one fetch per eligible descriptor with at most
/// `width` in flight, collects successes as tasks complete and isolates
/// every per-task failure. There is no pool-wide deadline: a stalled fetch
/// holds one slot until its own HTTP timeout fires, so worst-case batch
/// latency is roughly `ceil(sources / width) * per_call_timeout`.
pub struct FanOutExecutor {
    registry: Arc<SourceRegistry>,
    cache: AdapterCache,
    width: usize,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl FanOutExecutor {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        FanOutExecutor {
            registry,
            cache: AdapterCache::new(),
            width: DEFAULT_POOL_WIDTH,
            diagnostics: Arc::new(LogSink),
        }
    }

    pub fn with_pool_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    /// Fetch `op` from every enabled descriptor visible for `kind`.
    ///
    /// Descriptor ids are validated against the registry before any task is
    /// dispatched; an unknown id fails the whole call. Past that point the
    /// batch cannot fail, it can only come back shorter: each task failure
    /// is reported to the diagnostic sink and dropped. Records are in
    /// completion order; ordering is the sorter's job.
    pub async fn run_batch<R, Op, Fut>(
        &self,
        descriptors: &[SourceDescriptor],
        kind: ResourceKind,
        op: Op,
    ) -> Result<Vec<R>, SourceError>
    where
        Op: Fn(Arc<dyn SourceAdapter>) -> Fut,
        Fut: Future<Output = Result<R, SourceError>>,
    {
        for descriptor in descriptors {
            self.registry.resolve(&descriptor.id)?;
        }

        let eligible: Vec<&SourceDescriptor> = descriptors
            .iter()
            .filter(|d| d.enabled && d.participates_in(kind))
            .collect();

        let cache = &self.cache;
        let registry = &self.registry;
        let op = &op;

        let outcomes: Vec<FetchOutcome<R>> = stream::iter(eligible)
            .map(move |descriptor| async move {
                let adapter = match cache.get_or_build(descriptor, registry) {
                    Ok(adapter) => adapter,
                    Err(error) => {
                        return FetchOutcome::Failure {
                            source_id: descriptor.id.clone(),
                            error,
                        }
                    }
                };
                match op(adapter).await {
                    Ok(record) => FetchOutcome::Success(record),
                    Err(error) => FetchOutcome::Failure {
                        source_id: descriptor.id.clone(),
                        error,
                    },
                }
            })
            .buffer_unordered(self.width)
            .collect()
            .await;

        let mut records = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                FetchOutcome::Success(record) => records.push(record),
                FetchOutcome::Failure { source_id, error } => {
                    self.diagnostics.report(&source_id, &error)
                }
            }
        }
        Ok(records)
    }

    /// Fetch `op` from exactly one descriptor, propagating any failure.
    /// With no batch to absorb it, even an unsupported operation surfaces
    /// as a descriptive error.
    pub async fn run_single<R, Op, Fut>(
        &self,
        descriptor: &SourceDescriptor,
        op: Op,
    ) -> Result<R, SourceError>
    where
        Op: Fn(Arc<dyn SourceAdapter>) -> Fut,
        Fut: Future<Output = Result<R, SourceError>>,
    {
        self.registry.resolve(&descriptor.id)?;
        let adapter = self.cache.get_or_build(descriptor, &self.registry)?;
        op(adapter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{CostRecord, RegistryEntry};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Adapter scripted through descriptor params: `mode = ok | fail`.
    struct ScriptedAdapter {
        descriptor: SourceDescriptor,
    }

    #[async_trait]
    impl SourceAdapter for ScriptedAdapter {
        fn source_id(&self) -> &str {
            &self.descriptor.display_name
        }

        async fn fetch_balance(&self) -> Result<CostRecord, SourceError> {
            match self.descriptor.param("mode") {
                Some("fail") => Err(SourceError::Auth("token expired".to_string())),
                _ => Ok(CostRecord {
                    source_id: self.descriptor.display_name.clone(),
                    amount: Some(10.0),
                    currency: "CNY".to_string(),
                    spent: None,
                    spent_currency: None,
                    raw: json!({}),
                }),
            }
        }
    }

    #[derive(Default)]
    struct CollectingSink(Mutex<Vec<String>>);

    impl DiagnosticSink for CollectingSink {
        fn report(&self, source_id: &str, error: &SourceError) {
            if let Ok(mut entries) = self.0.lock() {
                entries.push(format!("{}: {}", source_id, error));
            }
        }
    }

    fn scripted_registry(ids: &[&str]) -> Arc<SourceRegistry> {
        let mut registry = SourceRegistry::new();
        for id in ids {
            registry.register(RegistryEntry {
                defaults: SourceDescriptor::new(id, id, "https://example.com"),
                factory: Box::new(|descriptor| {
                    Ok(Arc::new(ScriptedAdapter {
                        descriptor: descriptor.clone(),
                    }) as Arc<dyn SourceAdapter>)
                }),
            });
        }
        Arc::new(registry)
    }

    fn descriptor(id: &str, mode: &str) -> SourceDescriptor {
        let mut descriptor = SourceDescriptor::new(id, id, "https://example.com");
        descriptor
            .params
            .insert("mode".to_string(), mode.to_string());
        descriptor
    }

    #[tokio::test]
    async fn test_failures_are_isolated_and_reported() {
        let registry = scripted_registry(&["a", "b", "c", "d", "e"]);
        let sink = Arc::new(CollectingSink::default());
        let executor = FanOutExecutor::new(registry).with_diagnostics(sink.clone());

        let descriptors = vec![
            descriptor("a", "ok"),
            descriptor("b", "fail"),
            descriptor("c", "ok"),
            descriptor("d", "fail"),
            descriptor("e", "ok"),
        ];

        let records = executor
            .run_batch(&descriptors, ResourceKind::Balance, |adapter| async move {
                adapter.fetch_balance().await
            })
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        let diagnostics = sink.0.lock().unwrap();
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.contains("token expired")));
    }

    #[tokio::test]
    async fn test_diagnostics_carry_the_source_id_not_the_display_name() {
        let registry = scripted_registry(&["a"]);
        let sink = Arc::new(CollectingSink::default());
        let executor = FanOutExecutor::new(registry).with_diagnostics(sink.clone());

        let mut failing = descriptor("a", "fail");
        failing.display_name = "Alpha Cloud".to_string();

        let records: Vec<CostRecord> = executor
            .run_batch(&[failing], ResourceKind::Balance, |adapter| async move {
                adapter.fetch_balance().await
            })
            .await
            .unwrap();

        assert!(records.is_empty());
        let diagnostics = sink.0.lock().unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].starts_with("a:"));
        assert!(!diagnostics[0].contains("Alpha Cloud"));
    }

    #[tokio::test]
    async fn test_all_failures_yield_empty_list_not_error() {
        let registry = scripted_registry(&["a", "b"]);
        let executor = FanOutExecutor::new(registry);
        let descriptors = vec![descriptor("a", "fail"), descriptor("b", "fail")];

        let records: Vec<CostRecord> = executor
            .run_batch(&descriptors, ResourceKind::Balance, |adapter| async move {
                adapter.fetch_balance().await
            })
            .await
            .unwrap();

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_and_hidden_descriptors_are_skipped() {
        let registry = scripted_registry(&["a", "b", "c"]);
        let sink = Arc::new(CollectingSink::default());
        let executor = FanOutExecutor::new(registry).with_diagnostics(sink.clone());

        let mut disabled = descriptor("a", "ok");
        disabled.enabled = false;
        let mut hidden = descriptor("b", "ok");
        hidden.show_balance = false;
        let descriptors = vec![disabled, hidden, descriptor("c", "ok")];

        let records = executor
            .run_batch(&descriptors, ResourceKind::Balance, |adapter| async move {
                adapter.fetch_balance().await
            })
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_id, "c");
        // Skipping is not a failure
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id_fails_before_fan_out() {
        let registry = scripted_registry(&["a"]);
        let sink = Arc::new(CollectingSink::default());
        let executor = FanOutExecutor::new(registry).with_diagnostics(sink.clone());

        let descriptors = vec![descriptor("a", "ok"), descriptor("ghost", "ok")];
        let err = executor
            .run_batch(&descriptors, ResourceKind::Balance, |adapter| async move {
                adapter.fetch_balance().await
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::UnknownSource(ref id) if id == "ghost"));
        // Validation failed up front: nothing was dispatched or reported
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_single_propagates_failure() {
        let registry = scripted_registry(&["a"]);
        let executor = FanOutExecutor::new(registry);

        let err = executor
            .run_single(&descriptor("a", "fail"), |adapter| async move {
                adapter.fetch_balance().await
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Auth(_)));
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn test_run_single_surfaces_unsupported_operation() {
        let registry = scripted_registry(&["a"]);
        let executor = FanOutExecutor::new(registry);

        let err = executor
            .run_single(&descriptor("a", "ok"), |adapter| async move {
                adapter.fetch_quota().await
            })
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(matches!(err, SourceError::Unsupported(..)));
        assert!(message.contains("not supported"));
        assert!(message.contains("a"));
    }

    #[tokio::test]
    async fn test_unsupported_is_dropped_silently_from_batch() {
        let registry = scripted_registry(&["a", "b"]);
        let sink = Arc::new(CollectingSink::default());
        let executor = FanOutExecutor::new(registry).with_diagnostics(sink.clone());

        let mut descriptors = vec![descriptor("a", "ok"), descriptor("b", "ok")];
        for d in &mut descriptors {
            d.show_quota = true;
        }

        let records: Vec<crate::sources::QuotaReport> = executor
            .run_batch(&descriptors, ResourceKind::Quota, |adapter| async move {
                adapter.fetch_quota().await
            })
            .await
            .unwrap();

        assert!(records.is_empty());
        // Still visible on the advisory channel
        assert_eq!(sink.0.lock().unwrap().len(), 2);
    }
}
