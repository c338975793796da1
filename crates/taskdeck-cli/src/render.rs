//! Terminal rendering of task lists.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use taskdeck_core::api::tasks::Task;

/// Renders tasks as a table, one row per task.
pub fn task_table(tasks: &[Task]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Title", "Content", "Deadline", "Done"]);

    for task in tasks {
        table.add_row(vec![
            Cell::new(task.id),
            Cell::new(&task.title),
            Cell::new(&task.content),
            Cell::new(task.deadline.format("%Y-%m-%d %H:%M")),
            Cell::new(if task.is_done { "yes" } else { "no" }),
        ]);
    }

    table
}
