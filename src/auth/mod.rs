pub mod jwt;
pub mod login;
pub mod middleware;
pub mod setup;
