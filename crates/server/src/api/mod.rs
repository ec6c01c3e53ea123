pub mod handlers;
pub mod metadata;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
