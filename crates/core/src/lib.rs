//! Ballot core utilities shared by the UI layers

pub mod time;

pub use time::{
    Countdown, countdown_to, countdown_to_now, format_date_time, format_duration,
    format_duration_f64, format_millis, to_millis,
};
