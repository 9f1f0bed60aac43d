pub mod time;

pub use time::{current_human_timestamp, status_timestamp};
