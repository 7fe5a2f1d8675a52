pub mod attendance;
pub mod gender;
pub mod models;
pub mod similarity;
pub mod tasks;
