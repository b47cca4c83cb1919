pub mod loaders;
pub mod outcome;
pub mod proxy;
pub mod run_stats;
pub mod work_item;

pub use loaders::{load_proxies, load_work_items};
pub use outcome::{Category, Outcome};
pub use proxy::ProxyHandle;
pub use run_stats::RunStats;
pub use work_item::WorkItem;
