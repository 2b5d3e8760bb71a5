mod content_panel;
mod export_modal;
mod image_modal;
mod item_editor;
mod property_panel;
mod toolbar;

pub use content_panel::ContentPanel;
pub use export_modal::ExportModal;
pub use image_modal::ImageModal;
pub use item_editor::ItemEditor;
pub use property_panel::PropertyPanel;
pub use toolbar::Toolbar;
