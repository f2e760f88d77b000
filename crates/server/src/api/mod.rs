pub mod handlers;
pub mod middleware;
pub mod renditions;
pub mod routes;

pub use routes::create_router;
