pub mod text_loader;

pub use text_loader::{load_proxies, load_work_items};
