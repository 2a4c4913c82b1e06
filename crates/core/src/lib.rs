pub mod config;
pub mod lifecycle;
pub mod mirror;
pub mod origin;
pub mod source;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_env_file, validate_config, Config, ConfigError,
    DatabaseConfig, MirrorConfig,
};
pub use lifecycle::ShutdownController;
pub use mirror::{
    DedupRegistry, FetchOutcome, Fetcher, Job, JobSubmitter, MirrorPipeline, OutcomeSnapshot,
    PipelineReport, QueueError,
};
pub use origin::{HttpOrigin, Origin, OriginError, OriginResponse};
pub use source::{
    scan_all, scan_collection, Collection, DestinationLayout, RecordSource, ScanStats,
    SourceError, SqliteRecordSource,
};
