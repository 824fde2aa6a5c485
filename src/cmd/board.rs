use clap::Args;

use crate::cmd::ticket::{parse_category, parse_priority};
use crate::context::AppContext;
use crate::domain::filter::FilterUpdate;
use crate::domain::ticket::{Category, Priority, Status, Ticket};
use crate::error::{AppError, AppResult};
use crate::workflow::fence::FetchOutcome;
use crate::workflow::listing::{ListView, StatusChange};

const DESCRIPTION_PREVIEW: usize = 120;

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(short, long, value_parser = parse_category)]
    pub category: Option<Category>,
    #[arg(short, long, value_parser = parse_priority)]
    pub priority: Option<Priority>,
    #[arg(short, long, value_parser = parse_status)]
    pub status: Option<Status>,
    /// Substring match against title and description.
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    pub id: u64,
    #[arg(value_parser = parse_status)]
    pub status: Status,
}

pub fn parse_status(value: &str) -> Result<Status, String> {
    Status::from_str(value)
        .ok_or_else(|| format!("unknown status '{value}' (open, in_progress, resolved, closed)"))
}

impl ListArgs {
    fn filter_update(&self) -> FilterUpdate {
        let mut update = FilterUpdate::default()
            .category(self.category)
            .priority(self.priority)
            .status(self.status);
        if let Some(search) = &self.search {
            update = update.search(search.trim());
        }
        update
    }
}

pub async fn run_list(ctx: &AppContext, args: ListArgs) -> AppResult<()> {
    let controller = ctx.ticket_list();
    let outcome = match controller.set_filter(args.filter_update()).await {
        Some(outcome) => outcome,
        None => controller.refetch().await,
    };
    if outcome == FetchOutcome::Failed {
        return Err(AppError::Fetch("unable to load tickets".to_string()));
    }

    print!("{}", render_list(&controller.view()));
    Ok(())
}

pub fn render_list(view: &ListView) -> String {
    match view {
        ListView::Loading => "Loading tickets...\n".to_string(),
        ListView::Empty => "No tickets found. Try adjusting your filters.\n".to_string(),
        ListView::Populated(tickets) => {
            let count = tickets.len();
            let mut out = format!("{count} ticket{} found\n", if count == 1 { "" } else { "s" });
            for ticket in tickets {
                out.push_str(&render_ticket(ticket));
                out.push('\n');
            }
            out
        }
    }
}

pub async fn run_status(ctx: &AppContext, args: StatusArgs) -> AppResult<()> {
    let controller = ctx.ticket_list();
    if controller.refetch().await != FetchOutcome::Applied {
        tracing::warn!("could not load current ticket state before status change");
    }

    match controller.change_status(args.id, args.status).await {
        StatusChange::Unchanged => {
            println!("Ticket #{} is already {}.", args.id, args.status);
            Ok(())
        }
        StatusChange::Rejected { from, to } => Err(AppError::StatusUpdate(format!(
            "moving ticket #{} from {from} to {to} is not allowed",
            args.id
        ))),
        StatusChange::Applied(ticket) => {
            println!("Ticket #{} is now {}.", ticket.id, ticket.status);
            Ok(())
        }
        StatusChange::Failed(err) => Err(err),
    }
}

fn render_ticket(ticket: &Ticket) -> String {
    format!(
        "#{id:<5} [{status}] {title}\n       {category} / {priority} / {created}\n       {preview}",
        id = ticket.id,
        status = ticket.status.as_str().replace('_', " "),
        title = ticket.title,
        category = ticket.category,
        priority = ticket.priority,
        created = ticket.created_at.format("%b %e, %Y %H:%M"),
        preview = truncate(&ticket.description, DESCRIPTION_PREVIEW),
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}
