use crate::cmd::board::{parse_status, render_list};
use crate::cmd::prompt;
use crate::cmd::stats::render;
use crate::cmd::ticket::{self, parse_category, parse_priority};
use crate::context::AppContext;
use crate::domain::filter::FilterUpdate;
use crate::domain::ticket::{Category, Priority, Status};
use crate::error::{AppError, AppResult};
use crate::workflow::fence::FetchOutcome;
use crate::workflow::listing::StatusChange;
use crate::workflow::stats::StatsView;

const HELP: &str = "\
Commands:
  list                         show tickets with the current filters
  filter <field>=<value>       field: category, priority, status, search (empty value clears)
  clear                        remove all filters
  status <id> <status>         move a ticket to another status
  stats                        show the dashboard
  new                          draft and submit a ticket
  help                         show this help
  quit                         leave the console";

#[derive(Debug, PartialEq)]
enum ConsoleCommand {
    List,
    Filter(FilterUpdate),
    Clear,
    Status(u64, Status),
    Stats,
    New,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(ConsoleCommand::List);
    };

    match verb.to_lowercase().as_str() {
        "list" | "ls" => Ok(ConsoleCommand::List),
        "clear" => Ok(ConsoleCommand::Clear),
        "stats" => Ok(ConsoleCommand::Stats),
        "new" => Ok(ConsoleCommand::New),
        "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "exit" | "q" => Ok(ConsoleCommand::Quit),
        "status" => {
            let id = parts
                .next()
                .and_then(|raw| raw.trim_start_matches('#').parse::<u64>().ok())
                .ok_or_else(|| "usage: status <id> <status>".to_string())?;
            let status = parse_status(&parts.collect::<Vec<_>>().join(" "))?;
            Ok(ConsoleCommand::Status(id, status))
        }
        "filter" => {
            let rest = line.trim_start()[verb.len()..].trim();
            let (field, value) = rest
                .split_once('=')
                .ok_or_else(|| "usage: filter <field>=<value>".to_string())?;
            let value = value.trim();
            let update = FilterUpdate::default();
            let update = match field.trim().to_lowercase().as_str() {
                "category" if value.is_empty() => update.category(None),
                "category" => update.category(Some(parse_category(value)?)),
                "priority" if value.is_empty() => update.priority(None),
                "priority" => update.priority(Some(parse_priority(value)?)),
                "status" if value.is_empty() => update.status(None),
                "status" => update.status(Some(parse_status(value)?)),
                "search" => update.search(value),
                other => return Err(format!("unknown filter field '{other}'")),
            };
            Ok(ConsoleCommand::Filter(update))
        }
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

/// Long-lived session over the list, dashboard and drafting workflows.
pub async fn run(ctx: &AppContext) -> AppResult<()> {
    let list = ctx.ticket_list();
    let stats = ctx.stats();
    let list_listener = list.watch_refresh();
    let stats_listener = stats.watch_refresh();

    list.refetch().await;
    stats.refresh().await;
    println!("{HELP}\n");
    print!("{}", render_list(&list.view()));

    loop {
        print!("deskflow> ");
        std::io::Write::flush(&mut std::io::stdout())?;
        let line = prompt::blocking(prompt::read_line).await?;

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };

        match command {
            ConsoleCommand::List => print!("{}", render_list(&list.view())),
            ConsoleCommand::Filter(update) => {
                match list.set_filter(update).await {
                    Some(FetchOutcome::Failed) => eprintln!("Could not load tickets."),
                    Some(_) => print!("{}", render_list(&list.view())),
                    None => println!("Filters unchanged."),
                }
            }
            ConsoleCommand::Clear => match list.clear_filters().await {
                Some(FetchOutcome::Failed) => eprintln!("Could not load tickets."),
                _ => print!("{}", render_list(&list.view())),
            },
            ConsoleCommand::Status(id, status) => match list.change_status(id, status).await {
                StatusChange::Unchanged => println!("Ticket #{id} is already {status}."),
                StatusChange::Rejected { from, to } => {
                    eprintln!("Moving ticket #{id} from {from} to {to} is not allowed.")
                }
                StatusChange::Applied(ticket) => {
                    println!("Ticket #{} is now {}.", ticket.id, ticket.status)
                }
                StatusChange::Failed(err) => eprintln!("{err}"),
            },
            ConsoleCommand::Stats => match stats.view() {
                StatsView::Ready(snapshot) => print!("{}", render(&snapshot)),
                StatsView::Loading => println!("Loading dashboard..."),
                StatsView::Unavailable => eprintln!("Unable to load stats."),
            },
            ConsoleCommand::New => match ticket::run_draft(ctx).await {
                Ok(receipt) => {
                    println!("Ticket #{} created.", receipt.ticket.id);
                    println!("Response: {}", receipt.acknowledgment);
                    tracing::debug!(
                        generation = ctx.refresh.current().generation,
                        "listeners notified"
                    );
                }
                Err(err @ (AppError::Validation(_) | AppError::Submission(_))) => {
                    eprintln!("{err}")
                }
                Err(err) => return Err(err),
            },
            ConsoleCommand::Help => {
                println!("{HELP}");
                println!(
                    "Values: categories {}; priorities {}; statuses {}",
                    join(Category::ALL.iter().map(|c| c.as_str())),
                    join(Priority::ALL.iter().map(|p| p.as_str())),
                    join(Status::ALL.iter().map(|s| s.as_str())),
                );
            }
            ConsoleCommand::Quit => break,
        }
    }

    list_listener.abort();
    stats_listener.abort();
    Ok(())
}

fn join<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_filter_commands() {
        assert_eq!(
            parse_command("filter category=technical"),
            Ok(ConsoleCommand::Filter(
                FilterUpdate::default().category(Some(Category::Technical))
            ))
        );
        assert_eq!(
            parse_command("filter search = printer jam"),
            Ok(ConsoleCommand::Filter(FilterUpdate::default().search("printer jam")))
        );
        assert_eq!(
            parse_command("filter priority="),
            Ok(ConsoleCommand::Filter(FilterUpdate::default().priority(None)))
        );
        assert!(parse_command("filter owner=me").is_err());
        assert!(parse_command("filter category").is_err());
    }

    #[test]
    fn parses_status_commands() {
        assert_eq!(
            parse_command("status #12 in progress"),
            Ok(ConsoleCommand::Status(12, Status::InProgress))
        );
        assert!(parse_command("status twelve closed").is_err());
        assert!(parse_command("status 12 archived").is_err());
    }

    #[test]
    fn blank_line_lists_and_unknown_verbs_fail() {
        assert_eq!(parse_command("   "), Ok(ConsoleCommand::List));
        assert_eq!(parse_command("Q"), Ok(ConsoleCommand::Quit));
        assert!(parse_command("delete 4").is_err());
    }
}
