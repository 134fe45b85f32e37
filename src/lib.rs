pub mod align;
pub mod duration;
pub mod error;
pub mod fetch;
pub mod interval;
pub mod location;
pub mod logging;
pub mod series;
pub mod table;
pub mod units;
