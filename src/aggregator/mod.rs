pub(crate) mod aggregator_service;
pub(crate) mod fan_out;
pub(crate) mod sorter;

pub use aggregator_service::AggregationService;
pub use fan_out::{DiagnosticSink, FanOutExecutor, FetchOutcome, LogSink};
pub use sorter::{sort_records, Ranked, SortMode};
