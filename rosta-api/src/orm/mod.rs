pub mod activity_log;
pub mod availability;
mod db;
pub mod login;
pub mod logout;
pub mod roster;
pub mod shift;
pub mod team;
pub mod team_member;
pub mod testing;
pub mod user;

pub use db::*;
