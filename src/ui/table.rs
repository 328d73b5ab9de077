use eframe::egui::{self, Align, Layout, Ui};
use egui_extras::{Column, TableBuilder};

use govcon_dashboard::data::model::{Field, Opportunity};
use govcon_dashboard::state::DashboardState;

use super::panels;

const ROW_HEIGHT: f32 = 18.0;

// ---------------------------------------------------------------------------
// Results view (central panel)
// ---------------------------------------------------------------------------

/// Render the filtered table, the download button and the raw preview.
pub fn results(ui: &mut Ui, state: &mut DashboardState) {
    ui.heading("Contract Opportunities Dashboard");

    if state.table.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Open a contract opportunities CSV  (File → Open…)");
        });
        return;
    }

    ui.separator();
    ui.horizontal(|ui: &mut Ui| {
        ui.strong(format!(
            "Filtered Contract Opportunities ({} results)",
            state.visible_rows.len()
        ));
        ui.with_layout(Layout::right_to_left(Align::Center), |ui: &mut Ui| {
            if ui.button("Download Filtered Data as CSV").clicked() {
                panels::save_file_dialog(state);
            }
        });
    });

    let visible: Vec<&Opportunity> = state.visible_records().collect();
    let preview = state.preview_records();
    let preview_height = (preview.len() as f32 + 1.5) * ROW_HEIGHT + 40.0;
    let results_height = (ui.available_height() - preview_height).max(120.0);

    ui.push_id("results", |ui: &mut Ui| {
        record_table(ui, &visible, results_height);
    });

    ui.separator();
    ui.label("Preview of the dataset:");
    let preview_refs: Vec<&Opportunity> = preview.iter().collect();
    ui.push_id("preview", |ui: &mut Ui| {
        let height = ui.available_height();
        record_table(ui, &preview_refs, height);
    });
}

/// A striped, resizable table with one column per extracted field.
fn record_table(ui: &mut Ui, records: &[&Opportunity], max_height: f32) {
    let mut builder = TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(max_height)
        .cell_layout(Layout::left_to_right(Align::Center));
    for field in Field::ALL {
        builder = builder.column(match field {
            Field::Title => Column::initial(320.0).at_least(80.0).clip(true),
            _ => Column::auto().at_least(60.0).clip(true),
        });
    }

    builder
        .header(ROW_HEIGHT + 2.0, |mut header| {
            for field in Field::ALL {
                header.col(|ui: &mut Ui| {
                    ui.strong(field.header());
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, records.len(), |mut row| {
                let record = records[row.index()];
                for field in Field::ALL {
                    row.col(|ui: &mut Ui| {
                        // Unparseable dates show their source text.
                        let text = match field {
                            Field::ResponseDate if record.response_date.is_none() => {
                                record.response_date_raw.clone()
                            }
                            _ => record.display(field),
                        };
                        ui.add(egui::Label::new(text).truncate());
                    });
                }
            });
        });
}
