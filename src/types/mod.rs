pub mod route;
pub mod session;
pub mod style;
pub mod viz;
