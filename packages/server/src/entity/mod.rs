pub mod answer;
pub mod director_school;
pub mod event;
pub mod event_submission;
pub mod question;
pub mod school;
pub mod teacher_school;
pub mod user;
