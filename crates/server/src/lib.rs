pub mod routes;
pub mod startup;
pub mod errors;
pub mod openapi;
pub mod templates;

pub use startup::run;
