use crate::app::{CanvasCtx, ImageModalState};
use crate::content::resolve_history_item;
use crate::item::{
    CanvasItem, ChartSeries, ChartType, FontStyle, FontWeight, ItemKind, ItemPatch, ItemType, KanbanStatus,
    Priority, ShapeVariant, TextDecoration,
};
use leptos::prelude::*;

const LABEL: &str = "display: flex; justify-content: space-between; align-items: center; gap: 8px; \
                     margin: 6px 0; font-size: 12px; color: #374151;";
const INPUT: &str = "border: 1px solid #d1d5db; border-radius: 4px; padding: 3px 6px; font-family: inherit; \
                     font-size: 12px; max-width: 140px;";
const MIND_MAP_THEMES: [&str; 4] = ["ocean", "forest", "sunset", "mono"];

/// Parses chart data typed as CSV: the first line holds the labels, every
/// following line is `series name, value, value, ...`.
pub fn parse_chart_csv(text: &str) -> Option<(Vec<String>, Vec<ChartSeries>)> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let labels: Vec<String> = lines.next()?.split(',').map(|s| s.trim().to_string()).collect();
    let series = lines
        .map(|line| {
            let mut cells = line.split(',').map(str::trim);
            let name = cells.next().unwrap_or_default().to_string();
            let values = cells.map(|c| c.parse::<f64>().ok()).collect::<Option<Vec<_>>>()?;
            Some(ChartSeries { name, values })
        })
        .collect::<Option<Vec<_>>>()?;
    Some((labels, series))
}

fn chart_csv(labels: &[String], series: &[ChartSeries]) -> String {
    let mut lines = vec![labels.join(", ")];
    for s in series {
        let values: Vec<String> = s.values.iter().map(|v| v.to_string()).collect();
        lines.push(format!("{}, {}", s.name, values.join(", ")));
    }
    lines.join("\n")
}

fn text_field(label: &'static str, value: String, on_set: impl Fn(String) + 'static) -> AnyView {
    view! {
        <label style=LABEL>
            {label}
            <input type="text" style=INPUT value=value on:change=move |ev| on_set(event_target_value(&ev)) />
        </label>
    }
    .into_any()
}

fn color_field(label: &'static str, value: String, on_set: impl Fn(String) + 'static) -> AnyView {
    view! {
        <label style=LABEL>
            {label}
            <input type="color" value=value on:change=move |ev| on_set(event_target_value(&ev)) />
        </label>
    }
    .into_any()
}

fn number_field(label: &'static str, value: f64, min: f64, on_set: impl Fn(f64) + 'static) -> AnyView {
    view! {
        <label style=LABEL>
            {label}
            <input
                type="number"
                style=INPUT
                min=min.to_string()
                value=value.to_string()
                on:change=move |ev| {
                    if let Ok(v) = event_target_value(&ev).parse::<f64>() {
                        on_set(v);
                    }
                }
            />
        </label>
    }
    .into_any()
}

fn select_field(
    label: &'static str,
    options: Vec<String>,
    selected: usize,
    on_select: impl Fn(usize) + 'static,
) -> AnyView {
    let options = options
        .into_iter()
        .enumerate()
        .map(|(i, name)| view! { <option value=i.to_string() selected=i == selected>{name}</option> })
        .collect_view();
    view! {
        <label style=LABEL>
            {label}
            <select
                style=INPUT
                on:change=move |ev| {
                    if let Ok(i) = event_target_value(&ev).parse::<usize>() {
                        on_select(i);
                    }
                }
            >
                {options}
            </select>
        </label>
    }
    .into_any()
}

fn check_field(label: impl Into<String>, checked: bool, on_set: impl Fn(bool) + 'static) -> AnyView {
    let label: String = label.into();
    view! {
        <label style=LABEL>
            {label}
            <input type="checkbox" prop:checked=checked on:change=move |ev| on_set(event_target_checked(&ev)) />
        </label>
    }
    .into_any()
}

fn index_of<T: PartialEq>(all: &[T], value: &T) -> usize {
    all.iter().position(|v| v == value).unwrap_or(0)
}

/// Editor for the selected item's typed properties.
#[component]
pub fn PropertyPanel() -> impl IntoView {
    let ctx = expect_context::<CanvasCtx>();
    let store = ctx.store;

    let apply = move |patch: ItemPatch| {
        let Some(id) = store.with_untracked(|s| s.selected().map(str::to_string)) else {
            return;
        };
        store.update(|s| {
            if let Err(e) = s.update_item(&id, patch) {
                log::warn!("properties: {}", e);
            }
        });
    };

    let selected = Memo::new(move |_| store.with(|s| s.selected_item().cloned()));

    move || {
        let item = selected.get()?;
        let body = item_fields(ctx, &item, apply);
        let (w, h) = item.size();

        Some(view! {
            <div
                style="position: fixed; top: 80px; right: 12px; width: 260px; max-height: calc(100vh - 120px); \
                       overflow-y: auto; padding: 12px; background: rgba(255,255,255,0.97); \
                       border: 1px solid #e5e7eb; border-radius: 10px; box-shadow: 0 4px 16px rgba(15,23,42,0.08); \
                       z-index: 90;"
                on:mousedown=move |ev: web_sys::MouseEvent| ev.stop_propagation()
            >
                <div style="font-weight: 600; font-size: 13px; margin-bottom: 4px;">{item.item_type().label()}</div>
                <div style="font-size: 11px; color: #6b7280; margin-bottom: 8px;">
                    {format!("{:.0}, {:.0}  ·  {:.0} × {:.0}  ·  z {}", item.x, item.y, w, h, item.z_index)}
                </div>
                {body}
            </div>
        })
    }
}

fn item_fields(ctx: CanvasCtx, item: &CanvasItem, apply: impl Fn(ItemPatch) + Copy + 'static) -> AnyView {
    match &item.kind {
        ItemKind::Text(t) | ItemKind::StickyNote(t) | ItemKind::Comment(t) => {
            let style = &t.style;
            let decorations = [TextDecoration::None, TextDecoration::Underline, TextDecoration::LineThrough];
            view! {
                {number_field("Font size", style.font_size, 6.0, move |v| apply(ItemPatch::FontSize(v)))}
                {text_field("Font", style.font_family.clone(), move |v| apply(ItemPatch::FontFamily(v)))}
                {check_field("Bold", style.font_weight == FontWeight::Bold, move |on| {
                    apply(ItemPatch::FontWeight(if on { FontWeight::Bold } else { FontWeight::Normal }))
                })}
                {check_field("Italic", style.font_style == FontStyle::Italic, move |on| {
                    apply(ItemPatch::FontStyle(if on { FontStyle::Italic } else { FontStyle::Normal }))
                })}
                {select_field(
                    "Decoration",
                    ["none", "underline", "line-through"].map(String::from).to_vec(),
                    index_of(&decorations, &style.text_decoration),
                    move |i| apply(ItemPatch::TextDecoration(decorations[i.min(2)])),
                )}
                {color_field("Text", style.text_color.clone(), move |v| apply(ItemPatch::TextColor(v)))}
                {color_field("Background", style.background_color.clone(), move |v| apply(ItemPatch::BackgroundColor(v)))}
            }
            .into_any()
        }
        ItemKind::Shape(shape) => view! {
            {select_field(
                "Shape",
                ShapeVariant::ALL.iter().map(|v| v.name().to_string()).collect(),
                index_of(&ShapeVariant::ALL, &shape.shape_variant),
                move |i| {
                    if let Some(v) = ShapeVariant::ALL.get(i) {
                        apply(ItemPatch::ShapeVariant(*v));
                    }
                },
            )}
            {color_field("Fill", shape.fill_color.clone(), move |v| apply(ItemPatch::FillColor(v)))}
            {color_field("Border", shape.border_color.clone(), move |v| apply(ItemPatch::BorderColor(v)))}
            {number_field("Border width", shape.border_width, 0.0, move |v| apply(ItemPatch::BorderWidth(v)))}
        }
        .into_any(),
        ItemKind::Image(img) => {
            let target = item.id.clone();
            let prompt = img.prompt.clone().unwrap_or_else(|| "No prompt yet".to_string());
            view! {
                <div style="font-size: 12px; color: #4b5563; margin: 6px 0;">{prompt}</div>
                <button
                    style=INPUT
                    on:click=move |_| ctx.image_modal.set(Some(ImageModalState { target: Some(target.clone()) }))
                >
                    "Generate…"
                </button>
            }
            .into_any()
        }
        ItemKind::MindMapNode(node) => {
            let others: Vec<(String, String)> = ctx.store.with_untracked(|s| {
                s.items()
                    .iter()
                    .filter(|i| i.id != item.id && i.item_type() == ItemType::MindMapNode)
                    .filter(|i| !node.connections.contains(&i.id))
                    .map(|i| (i.id.clone(), i.kind.editable_text().unwrap_or_default().to_string()))
                    .collect()
            });
            let connect = (!others.is_empty()).then(|| {
                let names: Vec<String> = std::iter::once("Connect to…".to_string())
                    .chain(others.iter().map(|(_, name)| name.clone()))
                    .collect();
                select_field("Link", names, 0, move |i| {
                    if let Some((id, _)) = i.checked_sub(1).and_then(|i| others.get(i)) {
                        apply(ItemPatch::MindMapConnect(id.clone()));
                    }
                })
            });
            view! {
                {select_field(
                    "Theme",
                    MIND_MAP_THEMES.map(String::from).to_vec(),
                    MIND_MAP_THEMES.iter().position(|t| *t == node.theme).unwrap_or(0),
                    move |i| apply(ItemPatch::MindMapTheme(MIND_MAP_THEMES[i.min(3)].to_string())),
                )}
                {color_field("Text", node.text_color.clone(), move |v| apply(ItemPatch::TextColor(v)))}
                {color_field("Background", node.background_color.clone(), move |v| apply(ItemPatch::BackgroundColor(v)))}
                <div style="font-size: 11px; color: #6b7280;">{format!("{} link(s)", node.connections.len())}</div>
                {connect}
            }
            .into_any()
        }
        ItemKind::KanbanCard(card) => {
            let checklist = card
                .checklist
                .iter()
                .enumerate()
                .map(|(i, entry)| check_field(entry.text.clone(), entry.done, move |_| apply(ItemPatch::ChecklistToggle(i))))
                .collect_view();
            let optional = |v: String| if v.trim().is_empty() { None } else { Some(v) };
            view! {
                {text_field("Title", card.title.clone(), move |v| apply(ItemPatch::Title(v)))}
                {select_field(
                    "Status",
                    KanbanStatus::ALL.iter().map(|s| s.label().to_string()).collect(),
                    index_of(&KanbanStatus::ALL, &card.status),
                    move |i| {
                        if let Some(s) = KanbanStatus::ALL.get(i) {
                            apply(ItemPatch::KanbanStatus(*s));
                        }
                    },
                )}
                {select_field(
                    "Priority",
                    Priority::ALL.iter().map(|p| p.label().to_string()).collect(),
                    index_of(&Priority::ALL, &card.priority),
                    move |i| {
                        if let Some(p) = Priority::ALL.get(i) {
                            apply(ItemPatch::Priority(*p));
                        }
                    },
                )}
                {text_field("Assignee", card.assignee.clone().unwrap_or_default(), move |v| {
                    apply(ItemPatch::Assignee(optional(v)))
                })}
                {text_field("Due", card.due_date.clone().unwrap_or_default(), move |v| {
                    apply(ItemPatch::DueDate(optional(v)))
                })}
                {checklist}
                {text_field("Add step", String::new(), move |v| {
                    if !v.trim().is_empty() {
                        apply(ItemPatch::ChecklistAdd(v.trim().to_string()));
                    }
                })}
            }
            .into_any()
        }
        ItemKind::Table(table) => {
            let (rows, cols) = (table.rows(), table.columns());
            let grid = table
                .cells
                .iter()
                .enumerate()
                .map(|(row, cells)| {
                    let inputs = cells
                        .iter()
                        .enumerate()
                        .map(|(col, value)| {
                            view! {
                                <input
                                    type="text"
                                    style="width: 100%; min-width: 0; border: 1px solid #e5e7eb; font-size: 11px; padding: 2px;"
                                    value=value.clone()
                                    on:change=move |ev| apply(ItemPatch::TableCell { row, col, value: event_target_value(&ev) })
                                />
                            }
                        })
                        .collect_view();
                    view! { <div style="display: flex; gap: 2px; margin-bottom: 2px;">{inputs}</div> }
                })
                .collect_view();
            view! {
                {number_field("Rows", rows as f64, 1.0, move |v| {
                    apply(ItemPatch::TableResize { rows: v.max(1.0) as usize, cols })
                })}
                {number_field("Columns", cols as f64, 1.0, move |v| {
                    apply(ItemPatch::TableResize { rows, cols: v.max(1.0) as usize })
                })}
                {grid}
            }
            .into_any()
        }
        ItemKind::Chart(chart) => view! {
            {text_field("Title", chart.title.clone(), move |v| apply(ItemPatch::Title(v)))}
            {select_field(
                "Type",
                ChartType::ALL.iter().map(|t| t.name().to_string()).collect(),
                index_of(&ChartType::ALL, &chart.chart_type),
                move |i| {
                    if let Some(t) = ChartType::ALL.get(i) {
                        apply(ItemPatch::ChartType(*t));
                    }
                },
            )}
            <textarea
                style="width: 100%; height: 90px; box-sizing: border-box; font-family: monospace; font-size: 11px;"
                on:change=move |ev| match parse_chart_csv(&event_target_value(&ev)) {
                    Some((labels, series)) => apply(ItemPatch::ChartData { labels, series }),
                    None => log::warn!("properties: chart data must be numeric CSV"),
                }
            >
                {chart_csv(&chart.labels, &chart.series)}
            </textarea>
        }
        .into_any(),
        ItemKind::Connector(connector) => view! {
            {color_field("Color", connector.color.clone(), move |v| apply(ItemPatch::BorderColor(v)))}
            {number_field("Width", connector.stroke_width, 0.0, move |v| apply(ItemPatch::BorderWidth(v)))}
        }
        .into_any(),
        ItemKind::Frame(frame) => view! {
            {text_field("Title", frame.title.clone(), move |v| apply(ItemPatch::Title(v)))}
            {color_field("Background", frame.background_color.clone(), move |v| apply(ItemPatch::BackgroundColor(v)))}
            {color_field("Border", frame.border_color.clone(), move |v| apply(ItemPatch::BorderColor(v)))}
        }
        .into_any(),
        ItemKind::HistoryItem(_) => {
            let title = ctx.content.with(|c| resolve_history_item(item, c).map(|e| e.title.clone()));
            let text = title.unwrap_or_else(|| "This content was deleted".to_string());
            view! { <div style="font-size: 12px; color: #4b5563;">{text}</div> }.into_any()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn chart_csv_round_trips_through_parser() {
        let labels = vec!["Jan".to_string(), "Feb".to_string()];
        let series = vec![ChartSeries {
            name: "Reach".to_string(),
            values: vec![3.0, 4.5],
        }];
        let text = chart_csv(&labels, &series);
        assert_eq!(text, "Jan, Feb\nReach, 3, 4.5");
        assert_eq!(parse_chart_csv(&text), Some((labels, series)));
    }

    #[test]
    fn non_numeric_chart_values_are_rejected() {
        assert_eq!(parse_chart_csv("A, B\nS, 1, x"), None);
        assert_eq!(parse_chart_csv(""), None);
    }
}
