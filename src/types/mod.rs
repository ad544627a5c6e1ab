mod family;
mod user_agent;

pub use family::*;
pub use user_agent::*;
