pub mod jwt;
pub mod ranking;
