pub mod kv_service;
pub mod record_service;
