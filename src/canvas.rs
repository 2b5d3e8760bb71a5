use crate::content::{resolve_history_item, ContentLookup};
use crate::item::{
    CanvasItem, ChartItem, ChartType, FontStyle, FontWeight, ImageItem, ItemKind, KanbanItem, ResizeHandle,
    ShapeItem, ShapeVariant, TableItem, TextDecoration, TextItem,
};
use crate::store::CanvasStore;
use crate::viewport::{Point, Rect, Viewport};
use std::cell::RefCell;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

const BG_COLOR: &str = "#f8fafc";
const GRID_COLOR: &str = "#e2e8f0";
const SELECTION_COLOR: &str = "#2563eb";
const HANDLE_FILL: &str = "#ffffff";
const MUTED_TEXT: &str = "#6b7280";
const CARD_BG: &str = "#ffffff";
const CARD_BORDER: &str = "#d1d5db";
const CHART_PALETTE: [&str; 5] = ["#6366f1", "#22c55e", "#f59e0b", "#ef4444", "#06b6d4"];
const FONT: &str = "Inter, system-ui, sans-serif";

/// Decoded image elements keyed by item id. An entry is replaced when the
/// item's data URL changes.
#[derive(Clone, Default)]
pub struct ImageCache {
    images: Rc<RefCell<HashMap<String, (String, HtmlImageElement)>>>,
}

impl ImageCache {
    /// Returns the decoded element once it has loaded. A first call starts
    /// the load and `on_load` fires when it completes.
    pub fn get_or_load(&self, id: &str, data_url: &str, on_load: impl Fn() + 'static) -> Option<HtmlImageElement> {
        let mut images = self.images.borrow_mut();
        if let Some((src, img)) = images.get(id) {
            if src == data_url {
                return (img.complete() && img.natural_width() > 0).then(|| img.clone());
            }
        }

        let img = HtmlImageElement::new().ok()?;
        let callback = Closure::<dyn FnMut()>::new(move || on_load());
        img.set_onload(Some(callback.as_ref().unchecked_ref()));
        callback.forget();
        img.set_src(data_url);
        images.insert(id.to_string(), (data_url.to_string(), img));
        None
    }

    /// Drops elements for items no longer on the canvas.
    pub fn retain_ids(&self, live: &[CanvasItem]) {
        self.images
            .borrow_mut()
            .retain(|id, _| live.iter().any(|item| &item.id == id));
    }
}

pub fn render_canvas(
    ctx: &CanvasRenderingContext2d,
    canvas: &HtmlCanvasElement,
    store: &CanvasStore,
    content: &dyn ContentLookup,
    editing_item: Option<&str>,
    images: &ImageCache,
    request_redraw: impl Fn() + Clone + 'static,
) {
    let width = canvas.width() as f64;
    let height = canvas.height() as f64;
    let viewport = store.viewport();

    ctx.set_fill_style_str(BG_COLOR);
    ctx.fill_rect(0.0, 0.0, width, height);

    draw_grid(ctx, viewport, width, height);

    for item in store.items_in_draw_order() {
        let bounds = screen_bounds(viewport, item);
        let is_editing = editing_item == Some(item.id.as_str());
        match &item.kind {
            ItemKind::Text(t) => draw_text_item(ctx, t, bounds, viewport.zoom, !is_editing),
            ItemKind::StickyNote(t) => {
                ctx.set_shadow_color("rgba(0, 0, 0, 0.15)");
                ctx.set_shadow_blur(6.0 * viewport.zoom);
                draw_text_item(ctx, t, bounds, viewport.zoom, !is_editing);
                ctx.set_shadow_blur(0.0);
            }
            ItemKind::Comment(t) => {
                draw_comment_tail(ctx, t, bounds, viewport.zoom);
                draw_text_item(ctx, t, bounds, viewport.zoom, !is_editing);
            }
            ItemKind::Shape(s) => draw_shape(ctx, s, bounds, viewport.zoom),
            ItemKind::Image(img) => {
                let redraw = request_redraw.clone();
                draw_image(ctx, &item.id, img, bounds, images, redraw);
            }
            ItemKind::MindMapNode(m) => {
                draw_mind_map_links(ctx, store, viewport, item, &m.connections);
                fill_rounded(ctx, bounds, 12.0 * viewport.zoom, &m.background_color);
                if !is_editing {
                    draw_centered_label(ctx, &m.content, bounds, 14.0 * viewport.zoom, &m.text_color);
                }
            }
            ItemKind::KanbanCard(card) => draw_kanban(ctx, card, bounds, viewport.zoom),
            ItemKind::Table(table) => draw_table(ctx, table, bounds, viewport.zoom),
            ItemKind::Chart(chart) => draw_chart(ctx, chart, bounds, viewport.zoom),
            ItemKind::Connector(c) => {
                let from = Point::new(bounds.x, bounds.y + bounds.height / 2.0);
                let to = Point::new(bounds.x + bounds.width, bounds.y + bounds.height / 2.0);
                draw_arrow(ctx, from, to, &c.color, c.stroke_width * viewport.zoom, c.arrow_head);
            }
            ItemKind::Frame(f) => {
                ctx.set_fill_style_str(&f.background_color);
                ctx.fill_rect(bounds.x, bounds.y, bounds.width, bounds.height);
                ctx.set_stroke_style_str(&f.border_color);
                ctx.set_line_width(1.0);
                let _ = ctx.set_line_dash(&dash(&[6.0, 4.0]));
                ctx.stroke_rect(bounds.x, bounds.y, bounds.width, bounds.height);
                let _ = ctx.set_line_dash(&dash(&[]));
                set_font(ctx, 12.0 * viewport.zoom, FontWeight::Bold, FontStyle::Normal);
                ctx.set_fill_style_str(MUTED_TEXT);
                ctx.set_text_align("left");
                ctx.set_text_baseline("bottom");
                let _ = ctx.fill_text(&f.title, bounds.x, bounds.y - 4.0 * viewport.zoom);
            }
            ItemKind::HistoryItem(_) => {
                // Dangling references draw nothing.
                if let Some(entry) = resolve_history_item(item, content) {
                    draw_card(ctx, bounds);
                    draw_wrapped(
                        ctx,
                        &format!("{}\n\n{}", entry.title, entry.body),
                        bounds,
                        13.0 * viewport.zoom,
                        "#111827",
                        10.0 * viewport.zoom,
                    );
                }
            }
        }
    }

    if let Some(item) = store.selected_item() {
        draw_selection(ctx, screen_bounds(viewport, item), store.config().resize_handle_size);
    }
}

fn screen_bounds(viewport: &Viewport, item: &CanvasItem) -> Rect {
    let origin = viewport.to_screen(item.position());
    let (width, height) = item.size();
    Rect::new(origin.x, origin.y, width * viewport.zoom, height * viewport.zoom)
}

fn draw_grid(ctx: &CanvasRenderingContext2d, viewport: &Viewport, width: f64, height: f64) {
    let grid_size = 40.0 * viewport.zoom;
    if grid_size < 10.0 {
        return;
    }

    ctx.set_stroke_style_str(GRID_COLOR);
    ctx.set_line_width(1.0);

    let mut x = viewport.offset.x.rem_euclid(grid_size);
    while x < width {
        ctx.begin_path();
        ctx.move_to(x, 0.0);
        ctx.line_to(x, height);
        ctx.stroke();
        x += grid_size;
    }

    let mut y = viewport.offset.y.rem_euclid(grid_size);
    while y < height {
        ctx.begin_path();
        ctx.move_to(0.0, y);
        ctx.line_to(width, y);
        ctx.stroke();
        y += grid_size;
    }
}

fn dash(segments: &[f64]) -> JsValue {
    let array = js_sys::Array::new();
    for segment in segments {
        array.push(&JsValue::from_f64(*segment));
    }
    array.into()
}

fn set_font(ctx: &CanvasRenderingContext2d, size: f64, weight: FontWeight, style: FontStyle) {
    let weight = match weight {
        FontWeight::Normal => "normal",
        FontWeight::Bold => "bold",
    };
    let style = match style {
        FontStyle::Normal => "normal",
        FontStyle::Italic => "italic",
    };
    ctx.set_font(&format!("{} {} {}px {}", style, weight, size.max(4.0), FONT));
}

fn is_visible_color(color: &str) -> bool {
    !color.is_empty() && color != "transparent"
}

fn draw_text_item(ctx: &CanvasRenderingContext2d, text: &TextItem, bounds: Rect, zoom: f64, show_text: bool) {
    let style = &text.style;
    if is_visible_color(&style.background_color) {
        fill_rounded(ctx, bounds, 4.0 * zoom, &style.background_color);
    }
    if !show_text {
        return;
    }

    let size = style.font_size * zoom;
    ctx.set_fill_style_str(&style.text_color);
    ctx.set_text_align("left");
    ctx.set_text_baseline("top");
    ctx.set_font(&format!(
        "{} {} {}px {}",
        if style.font_style == FontStyle::Italic { "italic" } else { "normal" },
        if style.font_weight == FontWeight::Bold { "bold" } else { "normal" },
        size.max(4.0),
        style.font_family
    ));

    let padding = 8.0 * zoom;
    let line_height = size * 1.3;
    let mut y = bounds.y + padding;
    for line in wrap_lines(ctx, &text.content, bounds.width - padding * 2.0) {
        if y + line_height > bounds.y + bounds.height + 1.0 {
            break;
        }
        let _ = ctx.fill_text(&line, bounds.x + padding, y);
        if style.text_decoration != TextDecoration::None {
            let line_width = ctx.measure_text(&line).map(|m| m.width()).unwrap_or(0.0);
            let offset = match style.text_decoration {
                TextDecoration::Underline => size * 1.05,
                _ => size * 0.55,
            };
            ctx.set_stroke_style_str(&style.text_color);
            ctx.set_line_width((size / 14.0).max(1.0));
            ctx.begin_path();
            ctx.move_to(bounds.x + padding, y + offset);
            ctx.line_to(bounds.x + padding + line_width, y + offset);
            ctx.stroke();
        }
        y += line_height;
    }
}

/// Greedy word wrap against the context's current font.
fn wrap_lines(ctx: &CanvasRenderingContext2d, text: &str, max_width: f64) -> Vec<String> {
    let measure = |s: &str| ctx.measure_text(s).map(|m| m.width()).unwrap_or(0.0);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if !current.is_empty() && measure(&candidate) > max_width {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    lines
}

fn draw_wrapped(ctx: &CanvasRenderingContext2d, text: &str, bounds: Rect, size: f64, color: &str, padding: f64) {
    set_font(ctx, size, FontWeight::Normal, FontStyle::Normal);
    ctx.set_fill_style_str(color);
    ctx.set_text_align("left");
    ctx.set_text_baseline("top");
    let line_height = size * 1.35;
    let mut y = bounds.y + padding;
    for line in wrap_lines(ctx, text, bounds.width - padding * 2.0) {
        if y + line_height > bounds.y + bounds.height {
            break;
        }
        let _ = ctx.fill_text(&line, bounds.x + padding, y);
        y += line_height;
    }
}

fn draw_centered_label(ctx: &CanvasRenderingContext2d, text: &str, bounds: Rect, size: f64, color: &str) {
    set_font(ctx, size, FontWeight::Normal, FontStyle::Normal);
    ctx.set_fill_style_str(color);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text_with_max_width(
        text,
        bounds.x + bounds.width / 2.0,
        bounds.y + bounds.height / 2.0,
        (bounds.width - 8.0).max(1.0),
    );
}

fn rounded_path(ctx: &CanvasRenderingContext2d, b: Rect, radius: f64) {
    let r = radius.min(b.width / 2.0).min(b.height / 2.0).max(0.0);
    ctx.begin_path();
    ctx.move_to(b.x + r, b.y);
    ctx.line_to(b.x + b.width - r, b.y);
    let _ = ctx.arc_to(b.x + b.width, b.y, b.x + b.width, b.y + r, r);
    ctx.line_to(b.x + b.width, b.y + b.height - r);
    let _ = ctx.arc_to(b.x + b.width, b.y + b.height, b.x + b.width - r, b.y + b.height, r);
    ctx.line_to(b.x + r, b.y + b.height);
    let _ = ctx.arc_to(b.x, b.y + b.height, b.x, b.y + b.height - r, r);
    ctx.line_to(b.x, b.y + r);
    let _ = ctx.arc_to(b.x, b.y, b.x + r, b.y, r);
    ctx.close_path();
}

fn fill_rounded(ctx: &CanvasRenderingContext2d, bounds: Rect, radius: f64, color: &str) {
    rounded_path(ctx, bounds, radius);
    ctx.set_fill_style_str(color);
    ctx.fill();
}

fn draw_card(ctx: &CanvasRenderingContext2d, bounds: Rect) {
    fill_rounded(ctx, bounds, 6.0, CARD_BG);
    ctx.set_stroke_style_str(CARD_BORDER);
    ctx.set_line_width(1.0);
    ctx.stroke();
}

fn draw_comment_tail(ctx: &CanvasRenderingContext2d, text: &TextItem, bounds: Rect, zoom: f64) {
    let tail = 12.0 * zoom;
    ctx.begin_path();
    ctx.move_to(bounds.x + tail, bounds.y + bounds.height);
    ctx.line_to(bounds.x + tail, bounds.y + bounds.height + tail);
    ctx.line_to(bounds.x + tail * 2.0, bounds.y + bounds.height);
    ctx.close_path();
    ctx.set_fill_style_str(&text.style.background_color);
    ctx.fill();
}

fn polygon_points(bounds: Rect, sides: usize, rotation: f64) -> Vec<Point> {
    let cx = bounds.x + bounds.width / 2.0;
    let cy = bounds.y + bounds.height / 2.0;
    (0..sides)
        .map(|i| {
            let angle = rotation + 2.0 * PI * i as f64 / sides as f64;
            Point::new(cx + bounds.width / 2.0 * angle.cos(), cy + bounds.height / 2.0 * angle.sin())
        })
        .collect()
}

fn star_points(bounds: Rect) -> Vec<Point> {
    let cx = bounds.x + bounds.width / 2.0;
    let cy = bounds.y + bounds.height / 2.0;
    (0..10)
        .map(|i| {
            let angle = -PI / 2.0 + PI * i as f64 / 5.0;
            let scale = if i % 2 == 0 { 0.5 } else { 0.2 };
            Point::new(cx + bounds.width * scale * angle.cos(), cy + bounds.height * scale * angle.sin())
        })
        .collect()
}

/// Block arrow pointing right inside a unit square, then mapped onto `bounds`.
fn arrow_points(bounds: Rect, variant: ShapeVariant) -> Vec<Point> {
    let unit: &[(f64, f64)] = match variant {
        ShapeVariant::DoubleArrow => &[
            (0.0, 0.5),
            (0.25, 0.0),
            (0.25, 0.3),
            (0.75, 0.3),
            (0.75, 0.0),
            (1.0, 0.5),
            (0.75, 1.0),
            (0.75, 0.7),
            (0.25, 0.7),
            (0.25, 1.0),
        ],
        _ => &[
            (0.0, 0.3),
            (0.65, 0.3),
            (0.65, 0.0),
            (1.0, 0.5),
            (0.65, 1.0),
            (0.65, 0.7),
            (0.0, 0.7),
        ],
    };
    unit.iter()
        .map(|&(u, v)| {
            let (u, v) = match variant {
                ShapeVariant::ArrowLeft => (1.0 - u, v),
                ShapeVariant::ArrowDown => (v, u),
                ShapeVariant::ArrowUp => (v, 1.0 - u),
                _ => (u, v),
            };
            Point::new(bounds.x + u * bounds.width, bounds.y + v * bounds.height)
        })
        .collect()
}

fn trace(ctx: &CanvasRenderingContext2d, points: &[Point]) {
    ctx.begin_path();
    if let Some((first, rest)) = points.split_first() {
        ctx.move_to(first.x, first.y);
        for p in rest {
            ctx.line_to(p.x, p.y);
        }
    }
    ctx.close_path();
}

fn draw_shape(ctx: &CanvasRenderingContext2d, shape: &ShapeItem, bounds: Rect, zoom: f64) {
    let border = shape.border_width * zoom;
    match shape.shape_variant {
        ShapeVariant::Line => {
            let mid = bounds.y + bounds.height / 2.0;
            ctx.set_stroke_style_str(&shape.border_color);
            ctx.set_line_width(bounds.height.max(border).max(1.0));
            ctx.begin_path();
            ctx.move_to(bounds.x, mid);
            ctx.line_to(bounds.x + bounds.width, mid);
            ctx.stroke();
            return;
        }
        ShapeVariant::Rectangle => {
            ctx.begin_path();
            ctx.rect(bounds.x, bounds.y, bounds.width, bounds.height);
        }
        ShapeVariant::Circle => {
            ctx.begin_path();
            let _ = ctx.ellipse(
                bounds.x + bounds.width / 2.0,
                bounds.y + bounds.height / 2.0,
                bounds.width / 2.0,
                bounds.height / 2.0,
                0.0,
                0.0,
                2.0 * PI,
            );
        }
        ShapeVariant::Triangle => trace(
            ctx,
            &[
                Point::new(bounds.x + bounds.width / 2.0, bounds.y),
                Point::new(bounds.x + bounds.width, bounds.y + bounds.height),
                Point::new(bounds.x, bounds.y + bounds.height),
            ],
        ),
        ShapeVariant::Diamond => trace(ctx, &polygon_points(bounds, 4, -PI / 2.0)),
        ShapeVariant::Star => trace(ctx, &star_points(bounds)),
        ShapeVariant::Pentagon => trace(ctx, &polygon_points(bounds, 5, -PI / 2.0)),
        ShapeVariant::Hexagon => trace(ctx, &polygon_points(bounds, 6, 0.0)),
        ShapeVariant::Octagon => trace(ctx, &polygon_points(bounds, 8, PI / 8.0)),
        variant @ (ShapeVariant::ArrowRight
        | ShapeVariant::ArrowLeft
        | ShapeVariant::ArrowUp
        | ShapeVariant::ArrowDown
        | ShapeVariant::DoubleArrow) => trace(ctx, &arrow_points(bounds, variant)),
    }

    ctx.set_fill_style_str(&shape.fill_color);
    ctx.fill();
    if border > 0.0 {
        ctx.set_stroke_style_str(&shape.border_color);
        ctx.set_line_width(border);
        ctx.stroke();
    }
}

fn draw_image(
    ctx: &CanvasRenderingContext2d,
    id: &str,
    image: &ImageItem,
    bounds: Rect,
    images: &ImageCache,
    request_redraw: impl Fn() + 'static,
) {
    let loaded = image
        .data_url()
        .and_then(|url| images.get_or_load(id, &url, request_redraw));
    match loaded {
        Some(img) => {
            let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
                &img,
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height,
            );
        }
        None => {
            ctx.set_fill_style_str("#e5e7eb");
            ctx.fill_rect(bounds.x, bounds.y, bounds.width, bounds.height);
            let label = if image.base64_data.is_empty() { "No image" } else { "Loading…" };
            draw_centered_label(ctx, label, bounds, 13.0, MUTED_TEXT);
        }
    }
}

fn draw_mind_map_links(
    ctx: &CanvasRenderingContext2d,
    store: &CanvasStore,
    viewport: &Viewport,
    from: &CanvasItem,
    connections: &[String],
) {
    let center = |item: &CanvasItem| {
        let b = item.bounds();
        viewport.to_screen(Point::new(b.x + b.width / 2.0, b.y + b.height / 2.0))
    };
    let start = center(from);
    ctx.set_stroke_style_str("#93c5fd");
    ctx.set_line_width((2.0 * viewport.zoom).max(1.0));
    for target in connections.iter().filter_map(|id| store.item(id)) {
        let end = center(target);
        ctx.begin_path();
        ctx.move_to(start.x, start.y);
        ctx.line_to(end.x, end.y);
        ctx.stroke();
    }
}

fn draw_arrow(ctx: &CanvasRenderingContext2d, from: Point, to: Point, color: &str, width: f64, head: bool) {
    ctx.set_stroke_style_str(color);
    ctx.set_fill_style_str(color);
    ctx.set_line_width(width.max(1.0));
    ctx.begin_path();
    ctx.move_to(from.x, from.y);
    ctx.line_to(to.x, to.y);
    ctx.stroke();
    if head {
        let angle = (to.y - from.y).atan2(to.x - from.x);
        let size = (width * 4.0).max(6.0);
        ctx.begin_path();
        ctx.move_to(to.x, to.y);
        ctx.line_to(to.x - size * (angle - PI / 6.0).cos(), to.y - size * (angle - PI / 6.0).sin());
        ctx.line_to(to.x - size * (angle + PI / 6.0).cos(), to.y - size * (angle + PI / 6.0).sin());
        ctx.close_path();
        ctx.fill();
    }
}

fn draw_kanban(ctx: &CanvasRenderingContext2d, card: &KanbanItem, bounds: Rect, zoom: f64) {
    draw_card(ctx, bounds);
    let pad = 10.0 * zoom;

    let accent = match card.priority {
        crate::item::Priority::Low => "#22c55e",
        crate::item::Priority::Medium => "#f59e0b",
        crate::item::Priority::High => "#f97316",
        crate::item::Priority::Urgent => "#ef4444",
    };
    ctx.set_fill_style_str(accent);
    ctx.fill_rect(bounds.x, bounds.y, 4.0 * zoom, bounds.height);

    set_font(ctx, 14.0 * zoom, FontWeight::Bold, FontStyle::Normal);
    ctx.set_fill_style_str("#111827");
    ctx.set_text_align("left");
    ctx.set_text_baseline("top");
    let _ = ctx.fill_text_with_max_width(&card.title, bounds.x + pad, bounds.y + pad, bounds.width - pad * 2.0);

    set_font(ctx, 11.0 * zoom, FontWeight::Normal, FontStyle::Normal);
    ctx.set_fill_style_str(MUTED_TEXT);
    let done = card.checklist.iter().filter(|e| e.done).count();
    let mut meta = format!("{} · {}", card.status.label(), card.priority.label());
    if !card.checklist.is_empty() {
        meta.push_str(&format!(" · {}/{}", done, card.checklist.len()));
    }
    if let Some(assignee) = &card.assignee {
        meta.push_str(&format!(" · {}", assignee));
    }
    let _ = ctx.fill_text(&meta, bounds.x + pad, bounds.y + pad + 20.0 * zoom);

    if !card.description.is_empty() {
        let body = Rect::new(bounds.x, bounds.y + 38.0 * zoom, bounds.width, bounds.height - 38.0 * zoom);
        draw_wrapped(ctx, &card.description, body, 12.0 * zoom, "#374151", pad);
    }
}

fn draw_table(ctx: &CanvasRenderingContext2d, table: &TableItem, bounds: Rect, zoom: f64) {
    let rows = table.rows().max(1);
    let cols = table.columns().max(1);
    let cell_w = bounds.width / cols as f64;
    let cell_h = bounds.height / rows as f64;

    ctx.set_fill_style_str(CARD_BG);
    ctx.fill_rect(bounds.x, bounds.y, bounds.width, bounds.height);
    if table.header_row {
        for col in 0..cols {
            let color = table
                .column_styles
                .get(col)
                .map(|s| s.header_color.as_str())
                .unwrap_or("#e5e7eb");
            ctx.set_fill_style_str(color);
            ctx.fill_rect(bounds.x + col as f64 * cell_w, bounds.y, cell_w, cell_h);
        }
    }

    ctx.set_stroke_style_str(CARD_BORDER);
    ctx.set_line_width(1.0);
    for row in 0..=rows {
        let y = bounds.y + row as f64 * cell_h;
        ctx.begin_path();
        ctx.move_to(bounds.x, y);
        ctx.line_to(bounds.x + bounds.width, y);
        ctx.stroke();
    }
    for col in 0..=cols {
        let x = bounds.x + col as f64 * cell_w;
        ctx.begin_path();
        ctx.move_to(x, bounds.y);
        ctx.line_to(x, bounds.y + bounds.height);
        ctx.stroke();
    }

    ctx.set_fill_style_str("#111827");
    ctx.set_text_baseline("middle");
    for (r, row) in table.cells.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let style = table.column_styles.get(c).cloned().unwrap_or_default();
            let bold = style.bold || (table.header_row && r == 0);
            set_font(
                ctx,
                12.0 * zoom,
                if bold { FontWeight::Bold } else { FontWeight::Normal },
                FontStyle::Normal,
            );
            let (align, x) = match style.align {
                crate::item::ColumnAlign::Left => ("left", bounds.x + c as f64 * cell_w + 6.0 * zoom),
                crate::item::ColumnAlign::Center => ("center", bounds.x + (c as f64 + 0.5) * cell_w),
                crate::item::ColumnAlign::Right => ("right", bounds.x + (c as f64 + 1.0) * cell_w - 6.0 * zoom),
            };
            ctx.set_text_align(align);
            let _ = ctx.fill_text_with_max_width(
                cell,
                x,
                bounds.y + (r as f64 + 0.5) * cell_h,
                (cell_w - 12.0 * zoom).max(1.0),
            );
        }
    }
}

fn draw_chart(ctx: &CanvasRenderingContext2d, chart: &ChartItem, bounds: Rect, zoom: f64) {
    draw_card(ctx, bounds);
    set_font(ctx, 13.0 * zoom, FontWeight::Bold, FontStyle::Normal);
    ctx.set_fill_style_str("#111827");
    ctx.set_text_align("left");
    ctx.set_text_baseline("top");
    let pad = 10.0 * zoom;
    let _ = ctx.fill_text(&chart.title, bounds.x + pad, bounds.y + pad);

    let plot = Rect::new(
        bounds.x + pad,
        bounds.y + 32.0 * zoom,
        bounds.width - pad * 2.0,
        bounds.height - 42.0 * zoom,
    );
    let max = chart
        .series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .fold(0.0_f64, f64::max);
    if chart.labels.is_empty() || max <= 0.0 || plot.width <= 0.0 || plot.height <= 0.0 {
        return;
    }

    match chart.chart_type {
        ChartType::Bar => {
            let groups = chart.labels.len() as f64;
            let per_group = chart.series.len().max(1) as f64;
            let group_w = plot.width / groups;
            let bar_w = group_w * 0.8 / per_group;
            for (s, series) in chart.series.iter().enumerate() {
                ctx.set_fill_style_str(CHART_PALETTE[s % CHART_PALETTE.len()]);
                for (i, value) in series.values.iter().enumerate() {
                    let h = plot.height * value / max;
                    let x = plot.x + i as f64 * group_w + group_w * 0.1 + s as f64 * bar_w;
                    ctx.fill_rect(x, plot.y + plot.height - h, bar_w, h);
                }
            }
        }
        ChartType::Line | ChartType::Area => {
            let step = plot.width / (chart.labels.len().saturating_sub(1).max(1)) as f64;
            for (s, series) in chart.series.iter().enumerate() {
                let color = CHART_PALETTE[s % CHART_PALETTE.len()];
                let points: Vec<Point> = series
                    .values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Point::new(plot.x + i as f64 * step, plot.y + plot.height * (1.0 - v / max)))
                    .collect();
                let Some(first) = points.first() else { continue };
                ctx.begin_path();
                ctx.move_to(first.x, first.y);
                for p in &points[1..] {
                    ctx.line_to(p.x, p.y);
                }
                ctx.set_stroke_style_str(color);
                ctx.set_line_width((2.0 * zoom).max(1.0));
                ctx.stroke();
                if chart.chart_type == ChartType::Area {
                    if let Some(last) = points.last() {
                        ctx.line_to(last.x, plot.y + plot.height);
                        ctx.line_to(first.x, plot.y + plot.height);
                        ctx.close_path();
                        ctx.set_global_alpha(0.25);
                        ctx.set_fill_style_str(color);
                        ctx.fill();
                        ctx.set_global_alpha(1.0);
                    }
                }
            }
        }
        ChartType::Pie | ChartType::Donut => {
            let Some(series) = chart.series.first() else { return };
            let total: f64 = series.values.iter().filter(|v| **v > 0.0).sum();
            let cx = plot.x + plot.width / 2.0;
            let cy = plot.y + plot.height / 2.0;
            let radius = plot.width.min(plot.height) / 2.0;
            let mut start = -PI / 2.0;
            for (i, value) in series.values.iter().enumerate().filter(|(_, v)| **v > 0.0) {
                let sweep = 2.0 * PI * value / total;
                ctx.begin_path();
                ctx.move_to(cx, cy);
                let _ = ctx.arc(cx, cy, radius, start, start + sweep);
                ctx.close_path();
                ctx.set_fill_style_str(CHART_PALETTE[i % CHART_PALETTE.len()]);
                ctx.fill();
                start += sweep;
            }
            if chart.chart_type == ChartType::Donut {
                ctx.begin_path();
                let _ = ctx.arc(cx, cy, radius * 0.55, 0.0, 2.0 * PI);
                ctx.set_fill_style_str(CARD_BG);
                ctx.fill();
            }
        }
    }
}

/// Selection outline plus corner handles, which keep a fixed screen size.
fn draw_selection(ctx: &CanvasRenderingContext2d, bounds: Rect, handle_size: f64) {
    ctx.set_stroke_style_str(SELECTION_COLOR);
    ctx.set_line_width(1.5);
    ctx.stroke_rect(bounds.x, bounds.y, bounds.width, bounds.height);

    ctx.set_fill_style_str(HANDLE_FILL);
    for handle in ResizeHandle::ALL {
        let p = handle.position(bounds);
        let half = handle_size / 2.0;
        ctx.fill_rect(p.x - half, p.y - half, handle_size, handle_size);
        ctx.stroke_rect(p.x - half, p.y - half, handle_size, handle_size);
    }
}

pub fn get_canvas_context(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Failed to get 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}
