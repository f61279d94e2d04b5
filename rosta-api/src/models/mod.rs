pub mod activity_log;
pub mod availability;
pub mod roster;
pub mod session;
pub mod shift;
pub mod team;
pub mod team_member;
pub mod user;

// Re-export models for easier access
pub use activity_log::*;
pub use availability::*;
pub use roster::*;
pub use session::*;
pub use shift::*;
pub use team::*;
pub use team_member::*;
pub use user::*;
