use clap::Args;

use crate::cmd::prompt::{self, PromptAction};
use crate::context::AppContext;
use crate::domain::ticket::{Category, Priority};
use crate::error::{AppError, AppResult};
use crate::workflow::classification::{
    ClassificationCoordinator, SuggestionOutcome, should_schedule,
};
use crate::workflow::draft::DraftSession;
use crate::workflow::submission::SubmissionReceipt;

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    /// Brief summary of the issue.
    #[arg(short, long)]
    pub title: String,
    /// Full description of the problem.
    #[arg(short, long)]
    pub description: String,
    /// Category; suggested from the description when omitted.
    #[arg(short, long, value_parser = parse_category)]
    pub category: Option<Category>,
    /// Priority; suggested from the description when omitted.
    #[arg(short, long, value_parser = parse_priority)]
    pub priority: Option<Priority>,
}

pub fn parse_category(value: &str) -> Result<Category, String> {
    Category::from_str(value)
        .ok_or_else(|| format!("unknown category '{value}' (billing, technical, account, general)"))
}

pub fn parse_priority(value: &str) -> Result<Priority, String> {
    Priority::from_str(value)
        .ok_or_else(|| format!("unknown priority '{value}' (low, medium, high, critical)"))
}

/// Walks the user through a draft, suggesting a classification as they type.
pub async fn run_draft(ctx: &AppContext) -> AppResult<SubmissionReceipt> {
    let coordinator = ctx.coordinator(DraftSession::new());
    let draft = coordinator.draft().clone();
    let pipeline = ctx.submission(draft.clone());

    println!("Submit a new ticket. Finish the description with an empty line.");

    loop {
        print_inline("Title: ")?;
        let title = prompt::blocking(prompt::read_line).await?;
        draft.set_title(title);

        println!("Description:");
        read_description(&coordinator).await?;

        if coordinator.is_classifying() {
            println!("Analyzing your description...");
        }
        coordinator.settle().await;

        choose_classification(&draft).await?;

        match pipeline.submit().await {
            Ok(receipt) => return Ok(receipt),
            Err(err @ (AppError::Validation(_) | AppError::Submission(_))) => {
                eprintln!("{err}");
                let retry = prompt::blocking(|| {
                    prompt::prompt("Edit and resubmit? (y/N)", None, false)
                })
                .await?;
                if !matches!(retry, PromptAction::Set(answer) if answer.eq_ignore_ascii_case("y")) {
                    return Err(err);
                }
            }
            Err(err) => return Err(err),
        }
    }
}

async fn read_description(coordinator: &ClassificationCoordinator) -> AppResult<()> {
    let mut text = String::new();
    loop {
        let line = prompt::blocking(prompt::read_line).await?;
        if line.trim().is_empty() {
            return Ok(());
        }
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&line);
        coordinator.on_description_edited(&text);
    }
}

async fn choose_classification(draft: &DraftSession) -> AppResult<()> {
    let current = draft.snapshot();
    if draft.ai_suggested() {
        println!(
            "Suggested category: {}, priority: {}. Override below if needed.",
            current.category, current.priority
        );
    }

    let category_label = current.category.as_str();
    let choice = prompt::blocking(move || {
        prompt::prompt("Category (billing/technical/account/general)", Some(category_label), false)
    })
    .await?;
    if let PromptAction::Set(value) = choice {
        match Category::from_str(&value) {
            Some(category) => draft.set_category(category),
            None => eprintln!("Unknown category '{value}', keeping {}", current.category),
        }
    }

    let priority_label = current.priority.as_str();
    let choice = prompt::blocking(move || {
        prompt::prompt("Priority (low/medium/high/critical)", Some(priority_label), false)
    })
    .await?;
    if let PromptAction::Set(value) = choice {
        match Priority::from_str(&value) {
            Some(priority) => draft.set_priority(priority),
            None => eprintln!("Unknown priority '{value}', keeping {}", current.priority),
        }
    }
    Ok(())
}

/// Submits in one shot, asking the classifier only for fields left unset.
pub async fn run_submit(ctx: &AppContext, args: SubmitArgs) -> AppResult<SubmissionReceipt> {
    let draft = DraftSession::new();
    draft.set_title(args.title);
    draft.set_description(args.description.clone());

    let unset = args.category.is_none() || args.priority.is_none();
    if unset && should_schedule(&args.description) {
        let coordinator = ctx.coordinator(draft.clone());
        match coordinator.request_suggestion(&args.description).await {
            SuggestionOutcome::Applied(suggestion) => tracing::info!(
                category = %suggestion.category,
                priority = %suggestion.priority,
                "using suggested classification"
            ),
            SuggestionOutcome::Failed(err) => {
                eprintln!("Could not suggest a classification ({err}); using defaults.")
            }
            SuggestionOutcome::Skipped | SuggestionOutcome::Stale => {}
        }
    }
    if let Some(category) = args.category {
        draft.set_category(category);
    }
    if let Some(priority) = args.priority {
        draft.set_priority(priority);
    }

    ctx.submission(draft).submit().await
}

fn print_inline(text: &str) -> AppResult<()> {
    use std::io::Write;

    let mut stdout = std::io::stdout();
    write!(stdout, "{text}")?;
    stdout.flush()?;
    Ok(())
}
