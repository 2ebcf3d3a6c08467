pub mod kv_routes;
pub mod record_routes;
pub mod system_routes;
