pub mod server;

pub use server::{router, HealthResponse, HealthStatus, HttpServer};
