mod perf;
mod time_utils;

pub use time_utils::{AppInstant, TimeUtils};
