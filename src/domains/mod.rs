pub mod analytics;
pub mod church;
pub mod donation;
pub mod period;
pub mod view;
