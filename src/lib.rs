pub mod aggregate;
pub mod dashboard;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod stats;

pub use aggregate::types::{ChartData, ChartPoint, Granularity, RawData, Variation};
pub use aggregate::{build_chart_data, build_chart_data_in};
