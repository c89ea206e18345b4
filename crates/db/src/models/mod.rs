pub mod activity_log;
pub mod comment;
pub mod credential;
pub mod deliverable;
pub mod deliverable_file;
pub mod meeting;
pub mod milestone;
pub mod notification;
pub mod project;
pub mod user;
