pub mod events;
pub mod prompt;
pub mod providers;
pub mod request;
pub mod snippet;
