//! Line-driven moderation console (`APP_MODE=review`).

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::domain::moderation::FlagStatus;
use crate::review::detail;
use crate::review::{FlagReviewController, Notice, NoticeKind, Notifier, ReviewView, StatusFilter};

const HELP: &str = "\
commands:
  list                     show the current view
  filter <all|pending|reviewed|dismissed|actioned>
  search [term]            search text, domain, difficulty and reasons (no term clears)
  show <id>                open a question and its history
  close                    close the open question
  status <id> <status>     set a flag status
  delete <id>              ask to delete an actioned question
  confirm <id>             confirm the pending delete
  cancel                   drop the pending delete
  refresh                  reload from the store
  stats                    aggregate statistics as JSON
  quit";

/// Prints notices to the terminal.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let label = match notice.kind {
            NoticeKind::Success => "ok",
            NoticeKind::Error => "error",
            NoticeKind::Info => "info",
        };
        tracing::debug!(kind = label, title = %notice.title, "notice");
        println!("[{}] {}: {}", label, notice.title, notice.message);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Filter(StatusFilter),
    Search(String),
    Show(String),
    Close,
    Status(String, FlagStatus),
    Delete(String),
    Confirm(String),
    Cancel,
    Refresh,
    Stats,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let require_id = |name: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("usage: {} <id>", name))
        } else {
            Ok(rest.to_string())
        }
    };

    match verb.to_ascii_lowercase().as_str() {
        "list" | "ls" => Ok(Command::List),
        "filter" => rest
            .parse::<StatusFilter>()
            .map(Command::Filter)
            .map_err(|err| err.to_string()),
        "search" => Ok(Command::Search(rest.to_string())),
        "show" => require_id("show").map(Command::Show),
        "close" => Ok(Command::Close),
        "status" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(id), Some(status), None) => status
                    .parse::<FlagStatus>()
                    .map(|status| Command::Status(id.to_string(), status))
                    .map_err(|err| err.to_string()),
                _ => Err("usage: status <id> <status>".to_string()),
            }
        }
        "delete" => require_id("delete").map(Command::Delete),
        "confirm" => require_id("confirm").map(Command::Confirm),
        "cancel" => Ok(Command::Cancel),
        "refresh" => Ok(Command::Refresh),
        "stats" => Ok(Command::Stats),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "" => Err(String::new()),
        other => Err(format!("unknown command: {} (try help)", other)),
    }
}

pub async fn run(controller: FlagReviewController) -> Result<()> {
    // A failed initial load is already reported; the console stays usable.
    let _ = controller.refresh().await;
    print_view(&controller.view().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                if !message.is_empty() {
                    println!("{}", message);
                }
                continue;
            }
        };

        // Errors surface through the notifier.
        match command {
            Command::List => {}
            Command::Filter(filter) => controller.set_filter(filter).await,
            Command::Search(term) => controller.set_search(term).await,
            Command::Show(id) => controller.select(&id).await,
            Command::Close => controller.deselect().await,
            Command::Status(id, status) => {
                let _ = controller.update_status(&id, status).await;
            }
            Command::Delete(id) => {
                if controller.request_delete(&id).await.is_ok() {
                    println!("type `confirm {}` to delete it permanently, or `cancel`", id);
                    continue;
                }
            }
            Command::Confirm(id) => {
                let _ = controller.confirm_delete(&id).await;
            }
            Command::Cancel => controller.cancel_delete().await,
            Command::Refresh => {
                let _ = controller.refresh().await;
            }
            Command::Stats => {
                let view = controller.view().await;
                println!("{}", serde_json::to_string_pretty(&view.stats)?);
                continue;
            }
            Command::Help => {
                println!("{}", HELP);
                continue;
            }
            Command::Quit => break,
        }

        print_view(&controller.view().await);
    }

    Ok(())
}

fn print_view(view: &ReviewView) {
    println!(
        "all {} | pending {} | reviewed {} | dismissed {} | actioned {}   (filter: {}, avg flags {:.1})",
        view.counts.all,
        view.counts.pending,
        view.counts.reviewed,
        view.counts.dismissed,
        view.counts.actioned,
        view.filter,
        view.stats.average_flags,
    );
    if !view.search.trim().is_empty() {
        println!("search: {}", view.search.trim());
    }

    if view.visible.is_empty() {
        println!("  (no flagged questions match)");
    }
    for question in &view.visible {
        let marker = if view.busy.contains(&question.id) {
            '~'
        } else if view.pending_delete.as_deref() == Some(question.id.as_str()) {
            '!'
        } else {
            ' '
        };
        println!(
            "{} {:<12} {:<10} {:<6} flags={:<3} {}",
            marker,
            question.id,
            question.flag_status.as_str(),
            question.difficulty.as_str(),
            question.flag_count,
            summary(&question.question, 60),
        );
    }

    if let Some(question) = &view.selected {
        println!();
        print!("{}", detail::render(question));
        if view.history.is_empty() {
            println!("History: none");
        } else {
            println!("History:");
            for entry in &view.history {
                println!(
                    "  {} {}{}",
                    entry.created_at,
                    entry.action.as_str(),
                    entry
                        .reason
                        .as_deref()
                        .map(|reason| format!(" ({})", reason))
                        .unwrap_or_default()
                );
            }
        }
    }
}

fn summary(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    short.push_str("...");
    short
}
