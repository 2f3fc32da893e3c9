pub mod driver;
pub mod engine;
pub mod normalizer;
pub mod protocol;
pub mod routes;
pub mod session;
pub mod transport;
