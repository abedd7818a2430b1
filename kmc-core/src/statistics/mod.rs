pub mod results;
pub mod time_average;

pub use results::RunResult;
pub use time_average::TimeAverage;
