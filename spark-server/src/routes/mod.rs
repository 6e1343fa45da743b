pub mod discovery;
pub mod health;
pub mod login;
pub mod logout;
pub mod matches;
pub mod messages;
pub mod profile;
pub mod refresh;
pub mod register;
