use crate::content::{resolve_history_item, ContentLookup};
use crate::item::{CanvasItem, ItemKind, TableItem};
use pulldown_cmark::{html, Parser};
use std::fmt::Write;

/// Flattens the canvas into markdown, one section per item, bottom to top.
/// Connectors and dangling content references produce nothing.
pub fn to_markdown(items: &[CanvasItem], lookup: &dyn ContentLookup) -> String {
    let mut ordered: Vec<&CanvasItem> = items.iter().collect();
    ordered.sort_by_key(|i| i.z_index);

    ordered
        .into_iter()
        .filter_map(|item| item_markdown(item, lookup))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_html(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

fn item_markdown(item: &CanvasItem, lookup: &dyn ContentLookup) -> Option<String> {
    let label = item.item_type().label();
    let section = match &item.kind {
        ItemKind::Text(t) | ItemKind::StickyNote(t) | ItemKind::Comment(t) => {
            format!("## {}\n\n{}", label, t.content.trim())
        }
        ItemKind::Shape(s) => format!("## {}\n\n{}", label, s.shape_variant.name()),
        ItemKind::Image(img) => match img.prompt.as_deref() {
            Some(prompt) => format!("## {}\n\n_{}_", label, prompt),
            None => format!("## {}", label),
        },
        ItemKind::MindMapNode(m) => {
            let depth = m.level.clamp(1, 4) as usize;
            format!("{} {}", "#".repeat(depth + 1), m.content.trim())
        }
        ItemKind::KanbanCard(card) => {
            let mut out = format!(
                "## {}\n\n**Status:** {} | **Priority:** {}",
                card.title,
                card.status.label(),
                card.priority.label()
            );
            if let Some(assignee) = &card.assignee {
                let _ = write!(out, " | **Assignee:** {}", assignee);
            }
            if let Some(due) = &card.due_date {
                let _ = write!(out, " | **Due:** {}", due);
            }
            if !card.description.is_empty() {
                let _ = write!(out, "\n\n{}", card.description.trim());
            }
            if !card.checklist.is_empty() {
                out.push('\n');
                for entry in &card.checklist {
                    let mark = if entry.done { 'x' } else { ' ' };
                    let _ = write!(out, "\n- [{}] {}", mark, entry.text);
                }
            }
            out
        }
        ItemKind::Table(table) => format!("## {}\n\n{}", label, table_markdown(table)),
        ItemKind::Chart(chart) => {
            let mut out = format!("## {} ({} chart)\n\n| |", chart.title, chart.chart_type.name());
            for label in &chart.labels {
                let _ = write!(out, " {} |", label);
            }
            out.push_str("\n|---|");
            out.push_str(&"---|".repeat(chart.labels.len()));
            for series in &chart.series {
                let _ = write!(out, "\n| {} |", series.name);
                for value in &series.values {
                    let _ = write!(out, " {} |", value);
                }
            }
            out
        }
        ItemKind::Connector(_) => return None,
        ItemKind::Frame(f) => format!("## {}", f.title),
        ItemKind::HistoryItem(_) => {
            let entry = resolve_history_item(item, lookup)?;
            format!("## {}\n\n{}", entry.title, entry.body.trim())
        }
    };
    Some(section)
}

fn table_markdown(table: &TableItem) -> String {
    let columns = table.columns();
    if columns == 0 {
        return String::new();
    }
    let row_line = |row: &[String]| {
        let mut line = String::from("|");
        for col in 0..columns {
            let cell = row.get(col).map(String::as_str).unwrap_or("");
            let _ = write!(line, " {} |", cell.replace('|', "\\|"));
        }
        line
    };

    let mut rows = table.cells.iter();
    let blank = vec![String::new(); columns];
    let header: &[String] = if table.header_row {
        rows.next().map(Vec::as_slice).unwrap_or(&blank)
    } else {
        &blank
    };

    let mut lines = vec![row_line(header), format!("|{}", "---|".repeat(columns))];
    lines.extend(rows.map(|row| row_line(row)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentEntry, ContentHistory};
    use crate::item::{HistoryReference, ItemType, TextItem};

    fn item(z: i64, kind: ItemKind) -> CanvasItem {
        CanvasItem::new(format!("i{}", z), 0.0, 0.0, z, kind)
    }

    fn note(z: i64, content: &str) -> CanvasItem {
        item(
            z,
            ItemKind::StickyNote(TextItem {
                content: content.to_string(),
                ..TextItem::default()
            }),
        )
    }

    #[test]
    fn sections_follow_z_order() {
        let items = vec![note(5, "top"), note(1, "bottom")];
        let md = to_markdown(&items, &ContentHistory::default());
        assert_eq!(md, "## Sticky note\n\nbottom\n\n## Sticky note\n\ntop");
    }

    #[test]
    fn dangling_reference_and_connectors_are_skipped() {
        let history = ContentHistory::new(vec![ContentEntry {
            id: "p1".to_string(),
            title: "Launch post".to_string(),
            body: "We shipped.".to_string(),
            ..ContentEntry::default()
        }]);
        let reference = |z, id: &str| {
            item(
                z,
                ItemKind::HistoryItem(HistoryReference {
                    history_item_id: id.to_string(),
                }),
            )
        };
        let items = vec![
            reference(1, "p1"),
            reference(2, "deleted"),
            item(3, ItemKind::defaults(ItemType::Connector)),
        ];
        assert_eq!(to_markdown(&items, &history), "## Launch post\n\nWe shipped.");
    }

    #[test]
    fn kanban_lists_checklist() {
        let mut card = item(1, ItemKind::defaults(ItemType::KanbanCard));
        card.apply(crate::item::ItemPatch::ChecklistAdd("Draft".to_string())).unwrap();
        card.apply(crate::item::ItemPatch::ChecklistAdd("Review".to_string())).unwrap();
        card.apply(crate::item::ItemPatch::ChecklistToggle(0)).unwrap();
        let md = to_markdown(&[card], &ContentHistory::default());
        assert!(md.starts_with("## New task\n\n**Status:** To do | **Priority:** medium"));
        assert!(md.ends_with("- [x] Draft\n- [ ] Review"));
    }

    #[test]
    fn table_renders_header_and_rows() {
        let mut table = TableItem::with_size(2, 2);
        table.cells[0] = vec!["Name".to_string(), "Reach".to_string()];
        table.cells[1] = vec!["a|b".to_string(), "10".to_string()];
        assert_eq!(table_markdown(&table), "| Name | Reach |\n|---|---|\n| a\\|b | 10 |");
    }

    #[test]
    fn chart_renders_series_table() {
        let chart = item(1, ItemKind::defaults(ItemType::Chart));
        let md = to_markdown(&[chart], &ContentHistory::default());
        assert!(md.contains("## Chart (bar chart)"));
        assert!(md.contains("| Series 1 | 10 | 20 | 15 | 25 |"));
    }

    #[test]
    fn markdown_renders_to_html() {
        let html = render_html("## Title\n\nBody");
        assert!(html.contains("<h2>Title</h2>"));
        assert!(html.contains("<p>Body</p>"));
    }
}
