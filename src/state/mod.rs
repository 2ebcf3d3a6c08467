pub mod app;
pub mod kv;

pub use app::AppState;
pub use kv::KvStore;
