pub mod date;
pub mod units;
