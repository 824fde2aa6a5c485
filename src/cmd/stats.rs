use crate::context::AppContext;
use crate::domain::stats::{BreakdownBar, StatsSnapshot};
use crate::error::{AppError, AppResult};
use crate::workflow::stats::StatsView;

const BAR_COLUMNS: f64 = 40.0;

pub async fn run(ctx: &AppContext) -> AppResult<()> {
    let aggregator = ctx.stats();
    aggregator.refresh().await;

    match aggregator.view() {
        StatsView::Ready(snapshot) => {
            print!("{}", render(&snapshot));
            Ok(())
        }
        StatsView::Loading | StatsView::Unavailable => {
            Err(AppError::Fetch("unable to load stats".to_string()))
        }
    }
}

pub fn render(snapshot: &StatsSnapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total tickets: {}\n", snapshot.total_tickets));
    out.push_str(&format!("Open tickets:  {}\n", snapshot.open_tickets));
    out.push_str(&format!("Avg / day:     {}\n", snapshot.avg_tickets_per_day));

    out.push_str("\nPriority breakdown\n");
    for bar in snapshot.priority_bars() {
        out.push_str(&render_bar(&bar));
    }
    out.push_str("\nCategory breakdown\n");
    for bar in snapshot.category_bars() {
        out.push_str(&render_bar(&bar));
    }
    out
}

fn render_bar(bar: &BreakdownBar) -> String {
    let cells = ((bar.width / 100.0 * BAR_COLUMNS).round() as usize).max(1);
    format!("  {:<10} {:<40} {}\n", bar.label, "#".repeat(cells), bar.count)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::ticket::{Category, Priority};

    #[test]
    fn empty_snapshot_still_draws_every_bar() {
        let snapshot = StatsSnapshot {
            total_tickets: 0,
            open_tickets: 0,
            avg_tickets_per_day: 0.0,
            priority_breakdown: BTreeMap::new(),
            category_breakdown: BTreeMap::new(),
        };
        let rendered = render(&snapshot);
        assert_eq!(rendered.lines().filter(|l| l.contains(" # ")).count(), 8);
    }

    #[test]
    fn bar_length_tracks_share() {
        let snapshot = StatsSnapshot {
            total_tickets: 4,
            open_tickets: 1,
            avg_tickets_per_day: 2.0,
            priority_breakdown: BTreeMap::from([(Priority::High, 2)]),
            category_breakdown: BTreeMap::from([(Category::General, 4)]),
        };
        let rendered = render(&snapshot);
        assert!(rendered.contains(&format!("  high       {:<40} 2", "#".repeat(20))));
        assert!(rendered.contains(&format!("  general    {}", "#".repeat(40))));
    }
}
