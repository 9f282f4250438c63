pub mod account;
pub mod groups;
pub mod media;
pub mod post;
pub mod search;
pub mod statuses;
pub mod trends;
