//! Task command handlers.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use taskdeck_core::api::tasks::{self, NewTask, TaskPatch};
use taskdeck_core::config::Config;

use super::auth::build_client;
use crate::render;

/// Edit flags collected from the command line.
pub struct EditArgs {
    pub title: Option<String>,
    pub content: Option<String>,
    pub deadline: Option<String>,
    pub done: bool,
    pub not_done: bool,
}

pub async fn list(config: &Config) -> Result<()> {
    let client = build_client(config)?;
    let all = tasks::list_tasks(&client).await.context("list tasks")?;
    if all.is_empty() {
        println!("No tasks found.");
    } else {
        println!("{}", render::task_table(&all));
    }
    Ok(())
}

pub async fn show(config: &Config, id: i64) -> Result<()> {
    let client = build_client(config)?;
    let task = tasks::get_task(&client, id)
        .await
        .with_context(|| format!("show task {id}"))?;
    println!("{}", render::task_table(std::slice::from_ref(&task)));
    Ok(())
}

pub async fn add(
    config: &Config,
    title: String,
    content: String,
    deadline: &str,
    done: bool,
) -> Result<()> {
    let deadline = parse_deadline(deadline)?;
    let client = build_client(config)?;

    let task = tasks::create_task(
        &client,
        &NewTask {
            title,
            content,
            deadline,
            is_done: done,
        },
    )
    .await
    .context("create task")?;

    println!(
        "Created task {}: {} (due {})",
        task.id,
        task.title,
        task.deadline.format("%Y-%m-%d %H:%M")
    );
    Ok(())
}

pub async fn edit(config: &Config, id: i64, args: EditArgs) -> Result<()> {
    let patch = TaskPatch {
        title: args.title,
        content: args.content,
        deadline: args.deadline.as_deref().map(parse_deadline).transpose()?,
        is_done: match (args.done, args.not_done) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
    };

    if patch.is_empty() {
        bail!(
            "Nothing to change; pass at least one of --title, --content, --deadline, --done, --not-done"
        );
    }

    let client = build_client(config)?;
    let task = tasks::update_task(&client, id, &patch)
        .await
        .with_context(|| format!("update task {id}"))?;

    println!("Updated task {}.", task.id);
    Ok(())
}

pub async fn delete(config: &Config, id: i64) -> Result<()> {
    let client = build_client(config)?;
    let receipt = tasks::delete_task(&client, id)
        .await
        .with_context(|| format!("delete task {id}"))?;
    println!("{}", receipt.message);
    Ok(())
}

const DEADLINE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Parses a deadline from user input. A bare date means midnight.
fn parse_deadline(input: &str) -> Result<NaiveDateTime> {
    let value = input.trim();
    for format in DEADLINE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    bail!("Could not parse deadline '{value}'. Use a form like 2024-01-01T10:00 or 2024-01-01.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deadline_formats() {
        assert_eq!(
            parse_deadline("2024-01-01T10:00").unwrap().to_string(),
            "2024-01-01 10:00:00"
        );
        assert_eq!(
            parse_deadline("2024-01-01T10:00:30").unwrap().to_string(),
            "2024-01-01 10:00:30"
        );
        assert_eq!(
            parse_deadline("2024-01-01 10:00").unwrap().to_string(),
            "2024-01-01 10:00:00"
        );
        assert_eq!(
            parse_deadline("2024-01-01").unwrap().to_string(),
            "2024-01-01 00:00:00"
        );
    }

    #[test]
    fn test_parse_deadline_rejects_garbage() {
        assert!(parse_deadline("soon").is_err());
        assert!(parse_deadline("01/02/2024").is_err());
    }
}
