pub mod answer;
pub mod auth;
pub mod director;
pub mod event;
pub mod school;
pub mod teacher;
