pub mod types;
pub mod bucketer;

pub use types::{Period, PeriodScope, PeriodWindow};
pub use bucketer::{month_window, previous_period, window_for, year_window};
