//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request id, tracing, timeout, panics)
//!     → handlers.rs (parse input, run store call inside the operation wrapper)
//!     → response.rs (map operation errors to status codes)
//!     → Send to client
//! ```

pub mod handlers;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};
