use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use govcon_dashboard::data::loader::Source;
use govcon_dashboard::data::model::Facet;
use govcon_dashboard::state::DashboardState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut DashboardState) {
    ui.heading("Filter Options");
    ui.separator();

    if state.table.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Responses due on or after");
        let mut as_of = state.as_of;
        if ui
            .add(DatePickerButton::new(&mut as_of).id_salt("as_of"))
            .changed()
        {
            state.set_as_of(as_of);
        }
    });
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for facet in Facet::ALL {
                facet_filter(ui, state, facet);
            }
        });
}

/// One collapsible multi-select: All/None buttons plus a checkbox per option.
fn facet_filter(ui: &mut Ui, state: &mut DashboardState, facet: Facet) {
    // Clone so state can be mutated while the list is drawn.
    let options = state.options.get(facet).to_vec();
    let n_selected = state.selection.selected_count(facet);
    let header_text = format!("Select {}  ({n_selected}/{})", facet.label(), options.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(facet.label())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(facet);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(facet);
                }
            });

            if options.is_empty() {
                ui.weak("No values after fixed filters.");
            }

            for value in &options {
                let mut checked = state.selection.is_selected(facet, value);
                if ui.checkbox(&mut checked, value.as_str()).changed() {
                    state.toggle(facet, value);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut DashboardState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_save = state.table.is_some();
            if ui
                .add_enabled(can_save, egui::Button::new("Download CSV…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{}: {} records loaded, {} after business rules, {} visible",
                table.origin,
                table.len(),
                state.fixed_rows.len(),
                state.visible_rows.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut DashboardState) {
    let file = rfd::FileDialog::new()
        .set_title("Open contract opportunities")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        // Errors are already logged and placed in `status_message`.
        let _ = state.open(&Source::from(path.as_path()));
    }
}

pub fn save_file_dialog(state: &mut DashboardState) {
    let file = rfd::FileDialog::new()
        .set_title("Download filtered data")
        .set_file_name(state.config.download_file_name.as_str())
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.save_csv(&path) {
            log::error!("Failed to save {}: {e}", path.display());
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}
