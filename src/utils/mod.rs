pub mod app_error;
pub mod post;
pub mod register;
