pub mod content;
pub mod cv;
pub mod profile;
pub mod user;
