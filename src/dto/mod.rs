pub mod adpack;
pub mod admin;
pub mod game;
pub mod health;
pub mod sse;
