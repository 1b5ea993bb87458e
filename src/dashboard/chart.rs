//! Stacked bar chart of study time per module per day.
//!
//! `render` is a pure function from the chart inputs to a view tree. The host
//! re-invokes it whenever the inputs change; the only state is the date range,
//! which the caller owns and mutates through [`DateRangeSetters`].

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

const SECS_PER_DAY: i64 = 24 * 60 * 60;
const STACK_ID: &str = "a";
const BAR_RADIUS: [u8; 4] = [4, 4, 0, 0];
const TICK_STEPS: [i64; 9] = [300, 600, 900, 1800, 3600, 7200, 10800, 14400, 21600];
const MAX_TICK_INTERVALS: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartModule {
    pub name: String,
}

/// Display settings for one series, keyed by data key in [`ChartConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub color: String,
}

pub type ChartConfig = BTreeMap<String, ChartSeries>;

/// One day of data: `{ "day": ..., "<module key>": seconds, ... }` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    pub day: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub initial_date: String,
    pub final_date: String,
}

/// Caller-owned mutation of the date range.
pub trait DateRangeSetters {
    fn set_initial_date(&mut self, value: String);
    fn set_final_date(&mut self, value: String);
}

impl DateRangeSetters for DateRange {
    fn set_initial_date(&mut self, value: String) {
        self.initial_date = value;
    }

    fn set_final_date(&mut self, value: String) {
        self.final_date = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateField {
    Initial,
    Final,
}

/// A change coming from one of the two date inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateInputEvent {
    pub field: DateField,
    pub value: String,
}

impl DateInputEvent {
    pub fn dispatch(self, setters: &mut impl DateRangeSetters) {
        match self.field {
            DateField::Initial => setters.set_initial_date(self.value),
            DateField::Final => setters.set_final_date(self.value),
        }
    }
}

pub struct ChartProps<'a> {
    pub chart_data: &'a [ChartDataPoint],
    pub chart_config: &'a ChartConfig,
    pub modules: &'a [ChartModule],
    pub range: &'a DateRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub title: String,
    pub description: String,
    pub date_inputs: [DateInput; 2],
    pub x_axis: XAxis,
    pub y_axis: YAxis,
    pub series: Vec<BarSeries>,
    pub columns: Vec<BarColumn>,
    pub legend: Vec<LegendItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateInput {
    pub field: DateField,
    pub value: String,
}

impl DateInput {
    pub fn change(&self, value: impl Into<String>) -> DateInputEvent {
        DateInputEvent {
            field: self.field,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XAxis {
    pub data_key: &'static str,
    pub ticks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YAxis {
    pub max: i64,
    pub ticks: Vec<AxisTick>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisTick {
    pub value: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarSeries {
    pub data_key: String,
    pub stack_id: &'static str,
    pub fill: String,
    pub radius: [u8; 4],
}

/// One stacked bar; segments bottom to top in module order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarColumn {
    pub day: String,
    pub total: i64,
    pub segments: Vec<BarSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarSegment {
    pub module: String,
    pub data_key: String,
    pub value: i64,
    pub tooltip: String,
    pub fill: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendItem {
    pub data_key: String,
    pub label: String,
    pub color: Option<String>,
}

/// Data key of a module: every whitespace run in the name becomes `-`.
pub fn data_key(module_name: &str) -> String {
    lazy_static! {
        static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    }
    WHITESPACE_RE.replace_all(module_name, "-").into_owned()
}

/// Whether `value` is safe to use as a CSS colour: a hex literal or a
/// `var(--name)` reference.
pub fn is_css_color(value: &str) -> bool {
    lazy_static! {
        static ref CSS_COLOR_RE: Regex = Regex::new(
            r"^(#([0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})|var\(--[A-Za-z0-9_-]+\))$"
        )
        .unwrap();
    }
    CSS_COLOR_RE.is_match(value)
}

/// Seconds since midnight as `HH:mm`, wrapping at 24h.
pub fn format_hhmm(secs: i64) -> String {
    let secs = secs.rem_euclid(SECS_PER_DAY);
    format!("{:02}:{:02}", secs / 3600, (secs % 3600) / 60)
}

pub fn render(props: &ChartProps<'_>) -> ChartView {
    let series: Vec<BarSeries> = props
        .modules
        .iter()
        .map(|m| {
            let key = data_key(&m.name);
            BarSeries {
                fill: format!("var(--color-{key})"),
                data_key: key,
                stack_id: STACK_ID,
                radius: BAR_RADIUS,
            }
        })
        .collect();

    let columns: Vec<BarColumn> = props
        .chart_data
        .iter()
        .map(|point| {
            let segments: Vec<BarSegment> = props
                .modules
                .iter()
                .zip(&series)
                .filter_map(|(module, s)| {
                    let value = *point.values.get(&s.data_key)?;
                    Some(BarSegment {
                        module: module.name.clone(),
                        data_key: s.data_key.clone(),
                        value,
                        tooltip: format!("{}: {}", s.data_key, format_hhmm(value)),
                        fill: s.fill.clone(),
                    })
                })
                .collect();
            BarColumn {
                day: point.day.clone(),
                total: segments.iter().fold(0i64, |acc, s| acc.saturating_add(s.value)),
                segments,
            }
        })
        .collect();

    let legend = series
        .iter()
        .zip(props.modules)
        .map(|(s, module)| {
            let cfg = props.chart_config.get(&s.data_key);
            LegendItem {
                data_key: s.data_key.clone(),
                label: cfg
                    .map(|c| c.label.clone())
                    .unwrap_or_else(|| module.name.clone()),
                color: cfg.map(|c| c.color.clone()),
            }
        })
        .collect();

    let max_total = columns.iter().map(|c| c.total).max().unwrap_or(0);

    ChartView {
        title: "Study".into(),
        description: "This Week".into(),
        date_inputs: [
            DateInput {
                field: DateField::Initial,
                value: props.range.initial_date.clone(),
            },
            DateInput {
                field: DateField::Final,
                value: props.range.final_date.clone(),
            },
        ],
        x_axis: XAxis {
            data_key: "day",
            ticks: columns.iter().map(|c| c.day.clone()).collect(),
        },
        y_axis: y_axis(max_total),
        series,
        columns,
        legend,
    }
}

fn y_axis(max_total: i64) -> YAxis {
    let max_total = max_total.max(0);
    let step = TICK_STEPS
        .iter()
        .copied()
        .find(|step| max_total <= step * MAX_TICK_INTERVALS)
        .unwrap_or_else(|| {
            let hours = ceil_div(max_total, MAX_TICK_INTERVALS * 3600);
            hours.max(1).saturating_mul(3600)
        });
    let intervals = ceil_div(max_total, step).max(1);
    let ticks = (0..=intervals)
        .map(|i| {
            let value = i.saturating_mul(step);
            AxisTick {
                value,
                label: format_hhmm(value),
            }
        })
        .collect();
    YAxis {
        max: intervals.saturating_mul(step),
        ticks,
    }
}

fn ceil_div(n: i64, d: i64) -> i64 {
    n / d + i64::from(n % d != 0)
}
