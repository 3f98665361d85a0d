//! Plain-text tables for listed entities.

use console::{Alignment, pad_str, style};

use crate::filters::format_memory;
use crate::list::PaginationInfo;
use crate::models::{Factory, Workspace};

const MARK_SELECTED: &str = "[x]";
const MARK_UNSELECTED: &str = "[ ]";

fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(console::measure_text_width(cell));
        }
    }

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| pad_str(cell, *w, Alignment::Left, None).into_owned())
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers.iter().map(|h| h.to_string()).collect())];
    out.extend(rows.iter().map(|row| line(row.clone())));
    out.join("\n")
}

fn mark(selected: bool) -> String {
    let mark = if selected { MARK_SELECTED } else { MARK_UNSELECTED };
    mark.to_string()
}

pub fn factories_table(factories: &[Factory], is_selected: impl Fn(&str) -> bool) -> String {
    let rows: Vec<Vec<String>> = factories
        .iter()
        .map(|f| {
            vec![
                mark(is_selected(&f.id)),
                f.id.clone(),
                f.name.clone(),
                f.creator
                    .as_ref()
                    .map(|c| c.user_id.clone())
                    .unwrap_or_default(),
            ]
        })
        .collect();
    render(&["", "ID", "NAME", "CREATOR"], &rows)
}

pub fn workspaces_table(workspaces: &[Workspace], is_selected: impl Fn(&str) -> bool) -> String {
    let rows: Vec<Vec<String>> = workspaces
        .iter()
        .map(|w| {
            vec![
                mark(is_selected(&w.id)),
                w.id.clone(),
                format!("{}/{}", w.namespace, w.config.name),
                w.status.as_str().to_string(),
                w.dev_machine_memory()
                    .map(format_memory)
                    .unwrap_or_else(|| "-".to_string()),
                w.config.projects.len().to_string(),
            ]
        })
        .collect();
    render(&["", "ID", "NAME", "STATUS", "RAM", "PROJECTS"], &rows)
}

/// One-line summary of where the current page sits.
pub fn pagination_footer(info: PaginationInfo) -> String {
    let page = match info {
        PaginationInfo::Known { current, total } => format!("Page {} of {}", current, total),
        PaginationInfo::Unknown { current, .. } => format!("Page {}", current),
    };
    let mut keys = Vec::new();
    if info.has_previous_page() {
        keys.push("first");
        keys.push("prev");
    }
    if info.has_next_page() {
        keys.push("next");
    }
    if info.has_last_page() {
        keys.push("last");
    }
    if keys.is_empty() {
        page
    } else {
        format!("{} {}", page, style(format!("(--page {})", keys.join("|"))).dim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::build_workspaces_data;

    #[test]
    fn test_factories_table() {
        let factories = vec![
            Factory::new("f1", "alpha").with_creator("user1"),
            Factory::new("factory-2", "b"),
        ];
        let table = factories_table(&factories, |id| id == "f1");
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("ID"));
        assert!(lines[1].starts_with("[x]  f1"));
        assert!(lines[1].ends_with("user1"));
        assert!(lines[2].starts_with("[ ]  factory-2"));
    }

    #[test]
    fn test_workspaces_table_shows_memory() {
        let workspaces = build_workspaces_data();
        let table = workspaces_table(&workspaces[..1], |_| false);
        let row = table.lines().nth(1).unwrap();
        assert!(row.contains("workspaceId0"));
        assert!(row.contains("che/workspaceName0"));
        assert!(row.contains("STOPPED"));
        assert!(row.contains("2 GB"));
    }

    #[test]
    fn test_pagination_footer() {
        console::set_colors_enabled(false);
        let single = PaginationInfo::Known { current: 1, total: 1 };
        assert_eq!(pagination_footer(single), "Page 1 of 1");

        let middle = PaginationInfo::Known { current: 2, total: 3 };
        assert_eq!(
            pagination_footer(middle),
            "Page 2 of 3 (--page first|prev|next|last)"
        );

        let open = PaginationInfo::Unknown {
            current: 1,
            last_page_was_full: true,
        };
        assert_eq!(pagination_footer(open), "Page 1 (--page next)");
    }
}
