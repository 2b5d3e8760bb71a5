use crate::error::CanvasError;
use crate::viewport::{Point, Rect};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ITEM_X: f64 = 100.0;
pub const DEFAULT_ITEM_Y: f64 = 100.0;

/// Variant tag of a canvas item, without payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemType {
    Shape,
    Text,
    StickyNote,
    Image,
    MindMapNode,
    KanbanCard,
    Table,
    Chart,
    Connector,
    Frame,
    Comment,
    HistoryItem,
}

impl ItemType {
    pub const ALL: [ItemType; 12] = [
        ItemType::Shape,
        ItemType::Text,
        ItemType::StickyNote,
        ItemType::Image,
        ItemType::MindMapNode,
        ItemType::KanbanCard,
        ItemType::Table,
        ItemType::Chart,
        ItemType::Connector,
        ItemType::Frame,
        ItemType::Comment,
        ItemType::HistoryItem,
    ];

    /// The `type` value used in persisted JSON.
    pub fn tag(self) -> &'static str {
        match self {
            ItemType::Shape => "shape",
            ItemType::Text => "text",
            ItemType::StickyNote => "stickyNote",
            ItemType::Image => "imageElement",
            ItemType::MindMapNode => "mindMapNode",
            ItemType::KanbanCard => "kanbanCard",
            ItemType::Table => "table",
            ItemType::Chart => "chart",
            ItemType::Connector => "connector",
            ItemType::Frame => "frame",
            ItemType::Comment => "comment",
            ItemType::HistoryItem => "historyItem",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        ItemType::ALL.into_iter().find(|t| t.tag() == tag)
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemType::Shape => "Shape",
            ItemType::Text => "Text",
            ItemType::StickyNote => "Sticky note",
            ItemType::Image => "Image",
            ItemType::MindMapNode => "Mind map node",
            ItemType::KanbanCard => "Kanban card",
            ItemType::Table => "Table",
            ItemType::Chart => "Chart",
            ItemType::Connector => "Connector",
            ItemType::Frame => "Frame",
            ItemType::Comment => "Comment",
            ItemType::HistoryItem => "History item",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ShapeVariant {
    #[default]
    Rectangle,
    Circle,
    Triangle,
    Star,
    Diamond,
    Line,
    ArrowRight,
    ArrowLeft,
    ArrowUp,
    ArrowDown,
    DoubleArrow,
    Pentagon,
    Hexagon,
    Octagon,
}

impl ShapeVariant {
    pub const ALL: [ShapeVariant; 14] = [
        ShapeVariant::Rectangle,
        ShapeVariant::Circle,
        ShapeVariant::Triangle,
        ShapeVariant::Star,
        ShapeVariant::Diamond,
        ShapeVariant::Line,
        ShapeVariant::ArrowRight,
        ShapeVariant::ArrowLeft,
        ShapeVariant::ArrowUp,
        ShapeVariant::ArrowDown,
        ShapeVariant::DoubleArrow,
        ShapeVariant::Pentagon,
        ShapeVariant::Hexagon,
        ShapeVariant::Octagon,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeVariant::Rectangle => "rectangle",
            ShapeVariant::Circle => "circle",
            ShapeVariant::Triangle => "triangle",
            ShapeVariant::Star => "star",
            ShapeVariant::Diamond => "diamond",
            ShapeVariant::Line => "line",
            ShapeVariant::ArrowRight => "arrow right",
            ShapeVariant::ArrowLeft => "arrow left",
            ShapeVariant::ArrowUp => "arrow up",
            ShapeVariant::ArrowDown => "arrow down",
            ShapeVariant::DoubleArrow => "double arrow",
            ShapeVariant::Pentagon => "pentagon",
            ShapeVariant::Hexagon => "hexagon",
            ShapeVariant::Octagon => "octagon",
        }
    }

    /// Default geometry for a freshly added shape.
    pub fn default_size(self) -> (f64, f64) {
        match self {
            ShapeVariant::Rectangle => (150.0, 100.0),
            ShapeVariant::Line => (200.0, 4.0),
            ShapeVariant::ArrowRight | ShapeVariant::ArrowLeft | ShapeVariant::DoubleArrow => (150.0, 60.0),
            ShapeVariant::ArrowUp | ShapeVariant::ArrowDown => (60.0, 150.0),
            _ => (100.0, 100.0),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    LineThrough,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub text_decoration: TextDecoration,
    pub text_color: String,
    pub background_color: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Inter".to_string(),
            font_size: 16.0,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            text_decoration: TextDecoration::None,
            text_color: "#111827".to_string(),
            background_color: "transparent".to_string(),
        }
    }
}

/// Payload shared by text, sticky note and comment items.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TextItem {
    pub content: String,
    #[serde(flatten)]
    pub style: TextStyle,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeItem {
    pub shape_variant: ShapeVariant,
    pub fill_color: String,
    pub border_color: String,
    pub border_width: f64,
}

impl Default for ShapeItem {
    fn default() -> Self {
        Self {
            shape_variant: ShapeVariant::Rectangle,
            fill_color: "#6366f1".to_string(),
            border_color: "#312e81".to_string(),
            border_width: 2.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageItem {
    pub base64_data: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl Default for ImageItem {
    fn default() -> Self {
        Self {
            base64_data: String::new(),
            mime_type: "image/png".to_string(),
            prompt: None,
        }
    }
}

impl ImageItem {
    pub fn data_url(&self) -> Option<String> {
        if self.base64_data.is_empty() {
            None
        } else {
            Some(format!("data:{};base64,{}", self.mime_type, self.base64_data))
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MindMapNodeType {
    Root,
    #[default]
    Main,
    Sub,
    Leaf,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct MindMapItem {
    pub content: String,
    pub node_type: MindMapNodeType,
    pub level: u32,
    /// Ids of other items this node links to.
    pub connections: Vec<String>,
    pub theme: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<String>,
    pub background_color: String,
    pub text_color: String,
}

impl Default for MindMapItem {
    fn default() -> Self {
        Self {
            content: "Idea".to_string(),
            node_type: MindMapNodeType::Main,
            level: 1,
            connections: Vec::new(),
            theme: "ocean".to_string(),
            animation: None,
            background_color: "#dbeafe".to_string(),
            text_color: "#1e3a8a".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum KanbanStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

impl KanbanStatus {
    pub const ALL: [KanbanStatus; 4] = [
        KanbanStatus::Todo,
        KanbanStatus::InProgress,
        KanbanStatus::Review,
        KanbanStatus::Done,
    ];

    pub fn label(self) -> &'static str {
        match self {
            KanbanStatus::Todo => "To do",
            KanbanStatus::InProgress => "In progress",
            KanbanStatus::Review => "Review",
            KanbanStatus::Done => "Done",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ChecklistEntry {
    pub text: String,
    pub done: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct KanbanItem {
    pub title: String,
    pub description: String,
    pub status: KanbanStatus,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    pub checklist: Vec<ChecklistEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl Default for KanbanItem {
    fn default() -> Self {
        Self {
            title: "New task".to_string(),
            description: String::new(),
            status: KanbanStatus::Todo,
            priority: Priority::Medium,
            assignee: None,
            checklist: Vec::new(),
            due_date: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ColumnAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnStyle {
    pub align: ColumnAlign,
    pub header_color: String,
    pub bold: bool,
}

impl Default for ColumnStyle {
    fn default() -> Self {
        Self {
            align: ColumnAlign::Left,
            header_color: "#e5e7eb".to_string(),
            bold: false,
        }
    }
}

/// Largest row or column count a table can be resized to.
pub const MAX_TABLE_DIM: usize = 100;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TableItem {
    pub cells: Vec<Vec<String>>,
    pub column_styles: Vec<ColumnStyle>,
    pub header_row: bool,
}

impl Default for TableItem {
    fn default() -> Self {
        Self::with_size(3, 3)
    }
}

impl TableItem {
    pub fn with_size(rows: usize, cols: usize) -> Self {
        Self {
            cells: vec![vec![String::new(); cols]; rows],
            column_styles: vec![ColumnStyle::default(); cols],
            header_row: true,
        }
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn columns(&self) -> usize {
        self.cells.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn resize(&mut self, rows: usize, cols: usize) {
        self.cells.resize_with(rows, Vec::new);
        for row in &mut self.cells {
            row.resize(cols, String::new());
        }
        self.column_styles.resize(cols, ColumnStyle::default());
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Pie,
    Area,
    Donut,
}

impl ChartType {
    pub const ALL: [ChartType; 5] = [
        ChartType::Bar,
        ChartType::Line,
        ChartType::Pie,
        ChartType::Area,
        ChartType::Donut,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Area => "area",
            ChartType::Donut => "donut",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartItem {
    pub chart_type: ChartType,
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
    pub color_scheme: String,
}

impl Default for ChartItem {
    fn default() -> Self {
        Self {
            chart_type: ChartType::Bar,
            title: "Chart".to_string(),
            labels: ["Q1", "Q2", "Q3", "Q4"].iter().map(|s| s.to_string()).collect(),
            series: vec![ChartSeries {
                name: "Series 1".to_string(),
                values: vec![10.0, 20.0, 15.0, 25.0],
            }],
            color_scheme: "default".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectorItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_item: Option<String>,
    pub color: String,
    pub stroke_width: f64,
    pub line_style: LineStyle,
    pub arrow_head: bool,
}

impl Default for ConnectorItem {
    fn default() -> Self {
        Self {
            from_item: None,
            to_item: None,
            color: "#6b7280".to_string(),
            stroke_width: 2.0,
            line_style: LineStyle::Solid,
            arrow_head: true,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FrameItem {
    pub title: String,
    pub background_color: String,
    pub border_color: String,
}

impl Default for FrameItem {
    fn default() -> Self {
        Self {
            title: "Frame".to_string(),
            background_color: "rgba(243, 244, 246, 0.5)".to_string(),
            border_color: "#9ca3af".to_string(),
        }
    }
}

/// Reference into the separately owned content-history list.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoryReference {
    pub history_item_id: String,
}

/// Variant-specific payload. Serialized inline with the common item fields,
/// discriminated by `type`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ItemKind {
    Shape(ShapeItem),
    Text(TextItem),
    StickyNote(TextItem),
    #[serde(rename = "imageElement")]
    Image(ImageItem),
    MindMapNode(MindMapItem),
    KanbanCard(KanbanItem),
    Table(TableItem),
    Chart(ChartItem),
    Connector(ConnectorItem),
    Frame(FrameItem),
    Comment(TextItem),
    HistoryItem(HistoryReference),
}

impl ItemKind {
    /// Default payload for a freshly added item of the given type.
    pub fn defaults(item_type: ItemType) -> Self {
        match item_type {
            ItemType::Shape => ItemKind::Shape(ShapeItem::default()),
            ItemType::Text => ItemKind::Text(TextItem {
                content: "Text".to_string(),
                style: TextStyle::default(),
            }),
            ItemType::StickyNote => ItemKind::StickyNote(TextItem {
                content: String::new(),
                style: TextStyle {
                    font_size: 14.0,
                    background_color: "#fef08a".to_string(),
                    ..TextStyle::default()
                },
            }),
            ItemType::Image => ItemKind::Image(ImageItem::default()),
            ItemType::MindMapNode => ItemKind::MindMapNode(MindMapItem::default()),
            ItemType::KanbanCard => ItemKind::KanbanCard(KanbanItem::default()),
            ItemType::Table => ItemKind::Table(TableItem::default()),
            ItemType::Chart => ItemKind::Chart(ChartItem::default()),
            ItemType::Connector => ItemKind::Connector(ConnectorItem::default()),
            ItemType::Frame => ItemKind::Frame(FrameItem::default()),
            ItemType::Comment => ItemKind::Comment(TextItem {
                content: String::new(),
                style: TextStyle {
                    font_size: 13.0,
                    background_color: "#e0f2fe".to_string(),
                    ..TextStyle::default()
                },
            }),
            ItemType::HistoryItem => ItemKind::HistoryItem(HistoryReference::default()),
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            ItemKind::Shape(_) => ItemType::Shape,
            ItemKind::Text(_) => ItemType::Text,
            ItemKind::StickyNote(_) => ItemType::StickyNote,
            ItemKind::Image(_) => ItemType::Image,
            ItemKind::MindMapNode(_) => ItemType::MindMapNode,
            ItemKind::KanbanCard(_) => ItemType::KanbanCard,
            ItemKind::Table(_) => ItemType::Table,
            ItemKind::Chart(_) => ItemType::Chart,
            ItemKind::Connector(_) => ItemType::Connector,
            ItemKind::Frame(_) => ItemType::Frame,
            ItemKind::Comment(_) => ItemType::Comment,
            ItemKind::HistoryItem(_) => ItemType::HistoryItem,
        }
    }

    pub fn default_size(&self) -> (f64, f64) {
        match self {
            ItemKind::Shape(shape) => shape.shape_variant.default_size(),
            ItemKind::Text(_) => (200.0, 50.0),
            ItemKind::StickyNote(_) => (150.0, 100.0),
            ItemKind::Image(_) => (300.0, 300.0),
            ItemKind::MindMapNode(_) => (160.0, 60.0),
            ItemKind::KanbanCard(_) => (220.0, 140.0),
            ItemKind::Table(_) => (300.0, 150.0),
            ItemKind::Chart(_) => (320.0, 220.0),
            ItemKind::Connector(_) => (150.0, 4.0),
            ItemKind::Frame(_) => (400.0, 300.0),
            ItemKind::Comment(_) => (180.0, 80.0),
            ItemKind::HistoryItem(_) => (300.0, 200.0),
        }
    }

    pub fn text(&self) -> Option<&TextItem> {
        match self {
            ItemKind::Text(t) | ItemKind::StickyNote(t) | ItemKind::Comment(t) => Some(t),
            _ => None,
        }
    }

    /// The primary editable string of the item, if it has one.
    pub fn editable_text(&self) -> Option<&str> {
        match self {
            ItemKind::Text(t) | ItemKind::StickyNote(t) | ItemKind::Comment(t) => Some(&t.content),
            ItemKind::MindMapNode(m) => Some(&m.content),
            ItemKind::KanbanCard(k) => Some(&k.description),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 4] = [
        ResizeHandle::TopLeft,
        ResizeHandle::TopRight,
        ResizeHandle::BottomLeft,
        ResizeHandle::BottomRight,
    ];

    pub fn position(self, bounds: Rect) -> Point {
        match self {
            ResizeHandle::TopLeft => Point::new(bounds.x, bounds.y),
            ResizeHandle::TopRight => Point::new(bounds.x + bounds.width, bounds.y),
            ResizeHandle::BottomLeft => Point::new(bounds.x, bounds.y + bounds.height),
            ResizeHandle::BottomRight => Point::new(bounds.x + bounds.width, bounds.y + bounds.height),
        }
    }

    pub fn cursor(self) -> &'static str {
        match self {
            ResizeHandle::TopLeft | ResizeHandle::BottomRight => "nwse-resize",
            ResizeHandle::TopRight | ResizeHandle::BottomLeft => "nesw-resize",
        }
    }
}

/// One placeable element on the canvas.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanvasItem {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default)]
    pub z_index: i64,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl CanvasItem {
    pub fn new(id: String, x: f64, y: f64, z_index: i64, kind: ItemKind) -> Self {
        let (width, height) = kind.default_size();
        Self {
            id,
            x,
            y,
            width: Some(width),
            height: Some(height),
            z_index,
            kind,
        }
    }

    pub fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }

    /// Width and height, falling back to the variant default when absent.
    pub fn size(&self) -> (f64, f64) {
        let (dw, dh) = self.kind.default_size();
        (self.width.unwrap_or(dw), self.height.unwrap_or(dh))
    }

    pub fn bounds(&self) -> Rect {
        let (width, height) = self.size();
        Rect::new(self.x, self.y, width, height)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn contains_point(&self, p: Point) -> bool {
        self.bounds().contains(p)
    }

    /// A shape flattened to a near-zero height is drawn and resized as a line.
    pub fn is_line(&self, threshold: f64) -> bool {
        matches!(self.kind, ItemKind::Shape(_)) && self.size().1 <= threshold
    }

    pub fn resize_handle_at(&self, p: Point, handle_size: f64) -> Option<ResizeHandle> {
        let half = handle_size / 2.0;
        let bounds = self.bounds();
        ResizeHandle::ALL.into_iter().find(|handle| {
            let corner = handle.position(bounds);
            (p.x - corner.x).abs() <= half && (p.y - corner.y).abs() <= half
        })
    }

    pub fn history_item_id(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::HistoryItem(r) => Some(&r.history_item_id),
            _ => None,
        }
    }

    /// Applies a typed patch. The item is left untouched on error.
    pub fn apply(&mut self, patch: ItemPatch) -> Result<(), CanvasError> {
        let item_type = self.item_type().tag();
        let mismatch = |patch: &ItemPatch| CanvasError::PatchMismatch {
            patch: patch.name(),
            item_type,
        };

        match patch {
            ItemPatch::Move { x, y } => {
                if !x.is_finite() || !y.is_finite() {
                    return Err(CanvasError::InvalidPatch("position must be finite".to_string()));
                }
                self.x = x;
                self.y = y;
            }
            ItemPatch::Resize { width, height } => {
                if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
                    return Err(CanvasError::InvalidPatch(format!(
                        "size must be positive, got {}x{}",
                        width, height
                    )));
                }
                self.width = Some(width);
                self.height = Some(height);
            }
            ItemPatch::Content(content) => match &mut self.kind {
                ItemKind::Text(t) | ItemKind::StickyNote(t) | ItemKind::Comment(t) => t.content = content,
                ItemKind::MindMapNode(m) => m.content = content,
                ItemKind::KanbanCard(k) => k.description = content,
                _ => return Err(mismatch(&ItemPatch::Content(content))),
            },
            ItemPatch::Title(title) => match &mut self.kind {
                ItemKind::KanbanCard(k) => k.title = title,
                ItemKind::Chart(c) => c.title = title,
                ItemKind::Frame(f) => f.title = title,
                _ => return Err(mismatch(&ItemPatch::Title(title))),
            },
            ItemPatch::FontFamily(_)
            | ItemPatch::FontSize(_)
            | ItemPatch::FontWeight(_)
            | ItemPatch::FontStyle(_)
            | ItemPatch::TextDecoration(_) => {
                let (ItemKind::Text(t) | ItemKind::StickyNote(t) | ItemKind::Comment(t)) = &mut self.kind else {
                    return Err(mismatch(&patch));
                };
                match patch {
                    ItemPatch::FontFamily(family) => t.style.font_family = family,
                    ItemPatch::FontSize(size) => {
                        if !(size > 0.0) {
                            return Err(CanvasError::InvalidPatch(format!("font size {} must be positive", size)));
                        }
                        t.style.font_size = size;
                    }
                    ItemPatch::FontWeight(weight) => t.style.font_weight = weight,
                    ItemPatch::FontStyle(style) => t.style.font_style = style,
                    ItemPatch::TextDecoration(decoration) => t.style.text_decoration = decoration,
                    _ => unreachable!("outer match only admits text style patches"),
                }
            }
            ItemPatch::TextColor(color) => match &mut self.kind {
                ItemKind::Text(t) | ItemKind::StickyNote(t) | ItemKind::Comment(t) => t.style.text_color = color,
                ItemKind::MindMapNode(m) => m.text_color = color,
                _ => return Err(mismatch(&ItemPatch::TextColor(color))),
            },
            ItemPatch::BackgroundColor(color) => match &mut self.kind {
                ItemKind::Text(t) | ItemKind::StickyNote(t) | ItemKind::Comment(t) => {
                    t.style.background_color = color
                }
                ItemKind::MindMapNode(m) => m.background_color = color,
                ItemKind::Frame(f) => f.background_color = color,
                _ => return Err(mismatch(&ItemPatch::BackgroundColor(color))),
            },
            ItemPatch::FillColor(color) => match &mut self.kind {
                ItemKind::Shape(s) => s.fill_color = color,
                _ => return Err(mismatch(&ItemPatch::FillColor(color))),
            },
            ItemPatch::BorderColor(color) => match &mut self.kind {
                ItemKind::Shape(s) => s.border_color = color,
                ItemKind::Frame(f) => f.border_color = color,
                ItemKind::Connector(c) => c.color = color,
                _ => return Err(mismatch(&ItemPatch::BorderColor(color))),
            },
            ItemPatch::BorderWidth(width) => {
                if !(width >= 0.0) {
                    return Err(CanvasError::InvalidPatch(format!("border width {} must not be negative", width)));
                }
                match &mut self.kind {
                    ItemKind::Shape(s) => s.border_width = width,
                    ItemKind::Connector(c) => c.stroke_width = width,
                    _ => return Err(mismatch(&patch)),
                }
            }
            ItemPatch::ShapeVariant(variant) => match &mut self.kind {
                ItemKind::Shape(s) => s.shape_variant = variant,
                _ => return Err(mismatch(&patch)),
            },
            ItemPatch::ImageData { base64_data, mime_type } => match &mut self.kind {
                ItemKind::Image(img) => {
                    img.base64_data = base64_data;
                    img.mime_type = mime_type;
                }
                _ => return Err(mismatch(&ItemPatch::ImageData { base64_data, mime_type })),
            },
            ItemPatch::KanbanStatus(_)
            | ItemPatch::Priority(_)
            | ItemPatch::Assignee(_)
            | ItemPatch::DueDate(_)
            | ItemPatch::ChecklistAdd(_)
            | ItemPatch::ChecklistToggle(_) => {
                let ItemKind::KanbanCard(card) = &mut self.kind else {
                    return Err(mismatch(&patch));
                };
                match patch {
                    ItemPatch::KanbanStatus(status) => card.status = status,
                    ItemPatch::Priority(priority) => card.priority = priority,
                    ItemPatch::Assignee(assignee) => card.assignee = assignee,
                    ItemPatch::DueDate(due) => card.due_date = due,
                    ItemPatch::ChecklistAdd(text) => card.checklist.push(ChecklistEntry { text, done: false }),
                    ItemPatch::ChecklistToggle(index) => {
                        let entry = card.checklist.get_mut(index).ok_or_else(|| {
                            CanvasError::InvalidPatch(format!("checklist entry {} out of range", index))
                        })?;
                        entry.done = !entry.done;
                    }
                    _ => unreachable!("outer match only admits kanban patches"),
                }
            }
            ItemPatch::TableCell { row, col, value } => {
                let ItemKind::Table(table) = &mut self.kind else {
                    return Err(mismatch(&ItemPatch::TableCell { row, col, value }));
                };
                let cell = table
                    .cells
                    .get_mut(row)
                    .and_then(|r| r.get_mut(col))
                    .ok_or_else(|| CanvasError::InvalidPatch(format!("cell ({}, {}) out of range", row, col)))?;
                *cell = value;
            }
            ItemPatch::TableResize { rows, cols } => {
                let ItemKind::Table(table) = &mut self.kind else {
                    return Err(mismatch(&patch));
                };
                if rows == 0 || cols == 0 {
                    return Err(CanvasError::InvalidPatch("table needs at least one row and column".to_string()));
                }
                if rows > MAX_TABLE_DIM || cols > MAX_TABLE_DIM {
                    return Err(CanvasError::InvalidPatch(format!(
                        "table of {}x{} exceeds {} rows or columns",
                        rows, cols, MAX_TABLE_DIM
                    )));
                }
                table.resize(rows, cols);
            }
            ItemPatch::ChartType(_) | ItemPatch::ChartData { .. } | ItemPatch::ColorScheme(_) => {
                let ItemKind::Chart(chart) = &mut self.kind else {
                    return Err(mismatch(&patch));
                };
                match patch {
                    ItemPatch::ChartType(chart_type) => chart.chart_type = chart_type,
                    ItemPatch::ChartData { labels, series } => {
                        if let Some(bad) = series.iter().find(|s| s.values.len() != labels.len()) {
                            return Err(CanvasError::InvalidPatch(format!(
                                "series `{}` has {} values for {} labels",
                                bad.name,
                                bad.values.len(),
                                labels.len()
                            )));
                        }
                        chart.labels = labels;
                        chart.series = series;
                    }
                    ItemPatch::ColorScheme(scheme) => chart.color_scheme = scheme,
                    _ => unreachable!("outer match only admits chart patches"),
                }
            }
            ItemPatch::MindMapConnect(target) => {
                if target == self.id {
                    return Err(CanvasError::InvalidPatch("a node cannot connect to itself".to_string()));
                }
                match &mut self.kind {
                    ItemKind::MindMapNode(m) => {
                        if !m.connections.contains(&target) {
                            m.connections.push(target);
                        }
                    }
                    _ => return Err(mismatch(&ItemPatch::MindMapConnect(target))),
                }
            }
            ItemPatch::MindMapTheme(theme) => match &mut self.kind {
                ItemKind::MindMapNode(m) => m.theme = theme,
                _ => return Err(mismatch(&ItemPatch::MindMapTheme(theme))),
            },
            ItemPatch::HistoryReference(history_item_id) => match &mut self.kind {
                ItemKind::HistoryItem(r) => r.history_item_id = history_item_id,
                _ => return Err(mismatch(&ItemPatch::HistoryReference(history_item_id))),
            },
        }
        Ok(())
    }
}

/// A single typed property change, the closed replacement for a
/// stringly-keyed setter.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemPatch {
    Move { x: f64, y: f64 },
    Resize { width: f64, height: f64 },
    Content(String),
    Title(String),
    FontFamily(String),
    FontSize(f64),
    FontWeight(FontWeight),
    FontStyle(FontStyle),
    TextDecoration(TextDecoration),
    TextColor(String),
    BackgroundColor(String),
    FillColor(String),
    BorderColor(String),
    BorderWidth(f64),
    ShapeVariant(ShapeVariant),
    ImageData { base64_data: String, mime_type: String },
    KanbanStatus(KanbanStatus),
    Priority(Priority),
    Assignee(Option<String>),
    DueDate(Option<String>),
    ChecklistAdd(String),
    ChecklistToggle(usize),
    TableCell { row: usize, col: usize, value: String },
    TableResize { rows: usize, cols: usize },
    ChartType(ChartType),
    ChartData { labels: Vec<String>, series: Vec<ChartSeries> },
    ColorScheme(String),
    MindMapConnect(String),
    MindMapTheme(String),
    HistoryReference(String),
}

impl ItemPatch {
    pub fn name(&self) -> &'static str {
        match self {
            ItemPatch::Move { .. } => "move",
            ItemPatch::Resize { .. } => "resize",
            ItemPatch::Content(_) => "content",
            ItemPatch::Title(_) => "title",
            ItemPatch::FontFamily(_) => "fontFamily",
            ItemPatch::FontSize(_) => "fontSize",
            ItemPatch::FontWeight(_) => "fontWeight",
            ItemPatch::FontStyle(_) => "fontStyle",
            ItemPatch::TextDecoration(_) => "textDecoration",
            ItemPatch::TextColor(_) => "textColor",
            ItemPatch::BackgroundColor(_) => "backgroundColor",
            ItemPatch::FillColor(_) => "fillColor",
            ItemPatch::BorderColor(_) => "borderColor",
            ItemPatch::BorderWidth(_) => "borderWidth",
            ItemPatch::ShapeVariant(_) => "shapeVariant",
            ItemPatch::ImageData { .. } => "imageData",
            ItemPatch::KanbanStatus(_) => "status",
            ItemPatch::Priority(_) => "priority",
            ItemPatch::Assignee(_) => "assignee",
            ItemPatch::DueDate(_) => "dueDate",
            ItemPatch::ChecklistAdd(_) => "checklistAdd",
            ItemPatch::ChecklistToggle(_) => "checklistToggle",
            ItemPatch::TableCell { .. } => "tableCell",
            ItemPatch::TableResize { .. } => "tableResize",
            ItemPatch::ChartType(_) => "chartType",
            ItemPatch::ChartData { .. } => "chartData",
            ItemPatch::ColorScheme(_) => "colorScheme",
            ItemPatch::MindMapConnect(_) => "connect",
            ItemPatch::MindMapTheme(_) => "theme",
            ItemPatch::HistoryReference(_) => "historyItemId",
        }
    }
}
