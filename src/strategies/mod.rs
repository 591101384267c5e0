pub mod daily;
pub mod next_day;
pub mod seasonal;
pub mod types;
