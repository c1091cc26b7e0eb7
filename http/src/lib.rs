#[macro_use]
extern crate tracing;

pub mod error;
mod handlers;
pub mod router;

pub use handlers::{
    MetricsQuery,
    MetricsResponse,
};
pub use router::{
    create_router,
    AppState,
};
