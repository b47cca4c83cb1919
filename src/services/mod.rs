pub mod classifier;
pub mod http_probe;
pub mod notifier;
pub mod probe;
pub mod result_logger;
pub mod run_store;

pub use classifier::{Classifier, Matcher, Rule, RuleConfig};
pub use http_probe::HttpProbe;
pub use notifier::{LogNotifier, NoopNotifier, Notifier};
pub use probe::{BlockingProbe, Probe, RawResult};
pub use result_logger::ResultLogger;
pub use run_store::{JsonFileRunStore, MemoryRunStore, RunStore};
