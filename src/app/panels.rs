use eframe::egui::{self, Align, Align2, Context, Layout, RichText, Ui, vec2};

use seedgraph::filter::search_nodes;
use seedgraph::{NodePatch, NodeType};

use super::SeedGraphApp;
use super::render_utils::toast_color;

const SEARCH_RESULTS: usize = 12;

fn node_type_combo(ui: &mut Ui, id_salt: &str, value: &mut NodeType) {
    egui::ComboBox::from_id_salt(id_salt)
        .selected_text(value.label())
        .show_ui(ui, |ui| {
            for node_type in NodeType::ALL {
                ui.selectable_value(value, node_type, node_type.label());
            }
        });
}

impl SeedGraphApp {
    pub(super) fn draw_top_bar(&mut self, ui: &mut Ui) {
        let mut target = None;

        ui.horizontal(|ui| {
            ui.heading("seedgraph");
            ui.separator();

            let crumbs = self.explorer.breadcrumbs();
            let last = crumbs.len().saturating_sub(1);
            for (position, crumb) in crumbs.into_iter().enumerate() {
                match crumb.target {
                    Some(index) => {
                        if ui.link(crumb.label.as_str()).clicked() {
                            target = Some(index);
                        }
                    }
                    None => {
                        ui.label(RichText::new(crumb.label).strong());
                    }
                }
                if position < last {
                    ui.label("›");
                }
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.button("Save").clicked() {
                    self.save();
                }
                let visible = self.explorer.visible();
                ui.label(format!(
                    "nodes: {}  links: {}",
                    visible.nodes.len(),
                    visible.links.len()
                ));
                if self.explorer.has_pending_work() {
                    ui.spinner();
                }
            });
        });

        match target {
            Some(0) => {
                self.explorer.navigate_to_root();
            }
            Some(index) => {
                self.explorer.navigate_to(index);
            }
            None => {}
        }
        if target.is_some() {
            self.pan = egui::Vec2::ZERO;
        }
    }

    pub(super) fn draw_controls(&mut self, ui: &mut Ui) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::CollapsingHeader::new("Node types")
                .default_open(true)
                .show(ui, |ui| {
                    for node_type in NodeType::ALL {
                        let mut visible = !self.explorer.hidden_types().is_hidden(node_type);
                        if ui.checkbox(&mut visible, node_type.label()).changed() {
                            self.explorer.toggle_type_visibility(node_type);
                        }
                    }
                });

            egui::CollapsingHeader::new("Search")
                .default_open(true)
                .show(ui, |ui| self.draw_search(ui));

            egui::CollapsingHeader::new("Add node")
                .default_open(true)
                .show(ui, |ui| self.draw_add_node(ui));

            egui::CollapsingHeader::new("Suggestions")
                .default_open(true)
                .show(ui, |ui| self.draw_suggestion_controls(ui));

            egui::CollapsingHeader::new("Physics")
                .default_open(false)
                .show(ui, |ui| self.draw_physics_controls(ui));
        });
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.text_edit_singleline(&mut self.search);
        let hits = search_nodes(&self.explorer.visible().nodes, &self.search, SEARCH_RESULTS);
        let mut clicked = None;
        for hit in &hits {
            let Some(node) = self.explorer.visible().node(&hit.id) else {
                continue;
            };
            let selected = self.explorer.selection().contains(&hit.id);
            if ui.selectable_label(selected, node.label.as_str()).clicked() {
                clicked = Some(hit.id.clone());
            }
        }
        if let Some(id) = clicked {
            self.explorer.click_node(&id, false);
        }
        if !self.search.trim().is_empty() && hits.is_empty() {
            ui.small("No matches.");
        }
    }

    fn draw_add_node(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label("Label");
            ui.text_edit_singleline(&mut self.new_node_label);
        });
        node_type_combo(ui, "new_node_type", &mut self.new_node_type);

        let label = self.new_node_label.trim().to_owned();
        let anchor = self.explorer.selection().primary().map(str::to_owned);
        ui.horizontal(|ui| {
            if ui.add_enabled(!label.is_empty(), egui::Button::new("Add")).clicked()
                && self.explorer.create_node(&label, self.new_node_type).is_ok()
            {
                self.new_node_label.clear();
            }

            let linked = ui.add_enabled(
                !label.is_empty() && anchor.is_some(),
                egui::Button::new("Add linked to selection"),
            );
            if linked.clicked()
                && let Some(anchor) = &anchor
                && let Ok(id) = self.explorer.create_node(&label, self.new_node_type)
            {
                let relation = self.relation.clone();
                let _ = self.explorer.add_link(anchor, &id, &relation);
                self.new_node_label.clear();
            }
        });
    }

    fn draw_suggestion_controls(&mut self, ui: &mut Ui) {
        if self.explorer.is_discovering() {
            if ui.button("Stop discovery").clicked() {
                self.explorer.stop_discovery();
            }
        } else if ui
            .button("Start discovery")
            .on_hover_text("Periodically propose ghost nodes around the selection.")
            .clicked()
        {
            let _ = self.explorer.start_discovery();
        }

        if ui.button("Discard all ghosts").clicked() {
            self.explorer.discard_ghosts();
        }
    }

    fn draw_physics_controls(&mut self, ui: &mut Ui) {
        ui.checkbox(&mut self.live_physics, "Live physics");
        if ui.button("Recenter").clicked() {
            self.pan = egui::Vec2::ZERO;
            self.zoom = 1.0;
            self.explorer.reset_view();
        }

        let mut physics = self.explorer.config().physics;
        let mut changed = false;
        changed |= ui
            .add(
                egui::Slider::new(&mut physics.semantic_link_distance, 30.0..=400.0)
                    .text("Link distance")
                    .clamping(egui::SliderClamping::Always),
            )
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut physics.repulsion_strength, 0.0..=100_000.0)
                    .text("Repulsion")
                    .clamping(egui::SliderClamping::Always),
            )
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut physics.center_strength, 0.0..=0.2)
                    .text("Centering")
                    .clamping(egui::SliderClamping::Always),
            )
            .changed();
        if changed {
            self.explorer.set_physics_config(physics);
        }
    }

    pub(super) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection");
        ui.add_space(6.0);

        match self.explorer.selection().len() {
            0 => {
                ui.label("Click a node to select it. Ctrl-click adds to the selection.");
            }
            1 => self.draw_node_editor(ui),
            _ => self.draw_multi_selection(ui),
        }
    }

    fn draw_node_editor(&mut self, ui: &mut Ui) {
        let Some(editor) = self.editor.as_mut() else {
            ui.label("Selected node no longer exists.");
            return;
        };
        let id = editor.id.clone();
        let Some(node) = self.explorer.store().node(&id) else {
            ui.label("Selected node no longer exists.");
            return;
        };
        let is_ghost = node.is_ghost;
        let has_sub_graph = node.has_sub_graph();

        ui.horizontal(|ui| {
            ui.label("Label");
            ui.text_edit_singleline(&mut editor.label);
        });
        node_type_combo(ui, "edit_node_type", &mut editor.node_type);
        ui.label("Description");
        ui.text_edit_multiline(&mut editor.description);

        let patch = NodePatch {
            label: Some(editor.label.trim().to_owned()),
            node_type: Some(editor.node_type),
            description: Some(editor.description.clone()),
            ..NodePatch::default()
        };

        ui.add_space(6.0);
        ui.horizontal_wrapped(|ui| {
            if ui.button("Apply").clicked() {
                let _ = self.explorer.update_node(&id, patch);
            }
            let enter_label = if has_sub_graph { "Enter" } else { "Start nested" };
            if ui.button(enter_label).clicked() {
                let _ = self.explorer.enter_sub_graph(&id);
                self.pan = egui::Vec2::ZERO;
            }
            if ui.button("Expand").clicked() {
                let _ = self.explorer.expand_node(&id);
            }
            if is_ghost && ui.button("Confirm").clicked() {
                let _ = self.explorer.confirm_ghost(&id);
            }
            if ui.button("Delete").clicked() {
                self.explorer.delete_node(&id);
            }
        });

        ui.separator();
        ui.label(RichText::new("Neighbors").strong());
        let neighbors = self.explorer.store().neighbors(&id);
        if neighbors.is_empty() {
            ui.small("No links.");
        }
        let mut clicked = None;
        for neighbor_id in neighbors {
            let Some(neighbor) = self.explorer.store().node(&neighbor_id) else {
                continue;
            };
            if ui.link(neighbor.label.as_str()).clicked() {
                clicked = Some(neighbor_id.clone());
            }
        }
        if let Some(neighbor_id) = clicked {
            self.explorer.click_node(&neighbor_id, false);
        }
    }

    fn draw_multi_selection(&mut self, ui: &mut Ui) {
        for id in self.explorer.selection().ids() {
            if let Some(node) = self.explorer.store().node(id) {
                ui.label(format!("{} ({})", node.label, node.node_type.label()));
            }
        }

        ui.separator();
        ui.horizontal(|ui| {
            ui.label("Relation");
            ui.text_edit_singleline(&mut self.relation);
        });
        ui.horizontal(|ui| {
            if ui
                .button("Link first to others")
                .on_hover_text("Links the first selected node to every other selected node.")
                .clicked()
            {
                let relation = self.relation.trim().to_owned();
                let _ = self.explorer.link_selection(&relation);
            }
            if ui.button("Delete selected").clicked() {
                self.explorer.delete_selection();
            }
        });
    }

    pub(super) fn draw_toasts(&mut self, ctx: &Context) {
        if self.explorer.toasts().is_empty() {
            return;
        }

        let mut dismissed = None;
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(Align2::RIGHT_BOTTOM, vec2(-12.0, -12.0))
            .show(ctx, |ui| {
                for toast in self.explorer.toasts().active() {
                    egui::Frame::popup(ui.style())
                        .fill(toast_color(toast.kind))
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.label(RichText::new(toast.message.as_str()).color(egui::Color32::WHITE));
                                if ui.small_button("✕").clicked() {
                                    dismissed = Some(toast.id);
                                }
                            });
                        });
                    ui.add_space(4.0);
                }
            });

        if let Some(id) = dismissed {
            self.explorer.dismiss_toast(id);
        }
    }
}
