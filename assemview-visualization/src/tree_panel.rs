//! egui side panel that draws a [`TreeView`] and reports clicks

use assemview_core::{LabelStyle, TreeClick, TreeRow, TreeView};
use egui::{Color32, RichText, Sense};

/// Horizontal indent per tree level
const INDENT: f32 = 14.0;
/// Space reserved for the expander glyph on rows without one
const GLYPH_SPACE: f32 = 16.0;

/// What the user did in the panel this frame
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PanelOutput {
    /// Clicks in the order they happened
    pub clicks: Vec<TreeClick>,
    pub open_requested: bool,
}

fn label_text(row: &TreeRow<'_>) -> RichText {
    let text = RichText::new(row.label);
    match row.label_style {
        LabelStyle::Normal => text,
        LabelStyle::Hidden => text.strikethrough().color(Color32::GRAY),
    }
}

fn show_row(ui: &mut egui::Ui, row: &TreeRow<'_>, out: &mut PanelOutput) {
    ui.horizontal(|ui| {
        ui.add_space(row.depth as f32 * INDENT);
        match row.glyph {
            Some(glyph) => {
                let expander = ui.add(
                    egui::Label::new(RichText::new(glyph).monospace())
                        .selectable(false)
                        .sense(Sense::click()),
                );
                if expander.clicked() {
                    out.clicks.push(TreeClick::expander(row.id));
                }
            }
            None => ui.add_space(GLYPH_SPACE),
        }

        let label = ui.add(
            egui::Label::new(label_text(row))
                .selectable(false)
                .sense(Sense::click()),
        );
        if label.clicked() {
            out.clicks.push(TreeClick::label(row.id));
        }
    });
}

/// Draw the part tree in a left side panel
pub fn show(ctx: &egui::Context, tree: &TreeView, width: f32) -> PanelOutput {
    let mut out = PanelOutput::default();

    egui::SidePanel::left("assembly_tree")
        .resizable(true)
        .default_width(width)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Assembly");
                if ui.button("Open…").clicked() {
                    out.open_requested = true;
                }
            });
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                for row in tree.visible_rows() {
                    show_row(ui, &row, &mut out);
                }
            });
        });

    out
}
