pub mod health;
pub mod map;
pub mod progress;
pub mod route;
pub mod sessions;
