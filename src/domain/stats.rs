use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::ticket::{Category, Priority};

const MIN_BAR_WIDTH: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatsSnapshot {
    pub total_tickets: u64,
    pub open_tickets: u64,
    pub avg_tickets_per_day: f64,
    #[serde(default)]
    pub priority_breakdown: BTreeMap<Priority, u64>,
    #[serde(default)]
    pub category_breakdown: BTreeMap<Category, u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownBar {
    pub label: &'static str,
    pub count: u64,
    /// Percentage of the total, floored at 2%.
    pub width: f64,
}

/// Bar width in percent for `count` out of `total`.
///
/// Never below 2%, so every key keeps a visible bar even with no tickets.
pub fn bar_width(count: u64, total: u64) -> f64 {
    if total == 0 {
        return MIN_BAR_WIDTH;
    }
    (count as f64 / total as f64 * 100.0).max(MIN_BAR_WIDTH)
}

impl StatsSnapshot {
    pub fn priority_bars(&self) -> Vec<BreakdownBar> {
        Priority::ALL
            .iter()
            .map(|priority| {
                let count = self.priority_breakdown.get(priority).copied().unwrap_or(0);
                BreakdownBar {
                    label: priority.as_str(),
                    count,
                    width: bar_width(count, self.total_tickets),
                }
            })
            .collect()
    }

    pub fn category_bars(&self) -> Vec<BreakdownBar> {
        Category::ALL
            .iter()
            .map(|category| {
                let count = self.category_breakdown.get(category).copied().unwrap_or(0);
                BreakdownBar {
                    label: category.as_str(),
                    count,
                    width: bar_width(count, self.total_tickets),
                }
            })
            .collect()
    }
}
