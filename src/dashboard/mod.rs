pub mod chart;
mod svg;

pub use chart::{
    render, ChartConfig, ChartDataPoint, ChartModule, ChartProps, ChartSeries, DateRange,
};
