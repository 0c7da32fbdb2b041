use std::path::PathBuf;
use std::time::Duration;

use eframe::egui::{self, Context, Key, Modifiers, Vec2};
use tracing::warn;

use seedgraph::notify::ToastKind;
use seedgraph::{Explorer, NodeType};

mod canvas;
mod panels;
mod render_utils;

pub struct SeedGraphApp {
    explorer: Explorer,
    seed_path: Option<PathBuf>,
    pan: Vec2,
    zoom: f32,
    live_physics: bool,
    search: String,
    new_node_label: String,
    new_node_type: NodeType,
    relation: String,
    editor: Option<NodeEditor>,
    dragging: Option<String>,
}

/// Edit buffer for the single selected node.
struct NodeEditor {
    id: String,
    label: String,
    node_type: NodeType,
    description: String,
}

impl SeedGraphApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        explorer: Explorer,
        seed_path: Option<PathBuf>,
    ) -> Self {
        Self {
            explorer,
            seed_path,
            pan: Vec2::ZERO,
            zoom: 1.0,
            live_physics: true,
            search: String::new(),
            new_node_label: String::new(),
            new_node_type: NodeType::Concept,
            relation: "relates to".to_owned(),
            editor: None,
            dragging: None,
        }
    }

    fn file_name(&self) -> String {
        self.seed_path
            .as_ref()
            .and_then(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_owned())
    }

    fn save(&mut self) {
        let Some(path) = self.seed_path.clone() else {
            self.explorer
                .notify(ToastKind::Error, "No --seed-file given; nothing to save to");
            return;
        };

        let file = self.explorer.to_seed_file(&self.file_name());
        match file.save_to_path(&path) {
            Ok(()) => self
                .explorer
                .notify(ToastKind::Info, format!("Saved {}", path.display())),
            Err(error) => {
                warn!(%error, "save failed");
                self.explorer.notify(ToastKind::Error, error.to_string());
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &Context) {
        if ctx.input_mut(|input| input.consume_key(Modifiers::COMMAND, Key::S)) {
            self.save();
        }
        if ctx.wants_keyboard_input() {
            return;
        }
        if ctx.input(|input| input.key_pressed(Key::Delete)) {
            self.explorer.delete_selection();
        }
        if ctx.input(|input| input.key_pressed(Key::Escape)) {
            self.explorer.click_background();
        }
    }

    fn sync_editor(&mut self) {
        let selected = if self.explorer.selection().len() == 1 {
            self.explorer.selection().primary()
        } else {
            None
        };
        let stale = match (&self.editor, selected) {
            (Some(editor), Some(id)) => editor.id != id,
            (None, None) => false,
            _ => true,
        };
        if !stale {
            return;
        }

        self.editor = selected
            .and_then(|id| self.explorer.store().node(id))
            .map(|node| NodeEditor {
                id: node.id.clone(),
                label: node.label.clone(),
                node_type: node.node_type,
                description: node.description.clone(),
            });
    }
}

impl eframe::App for SeedGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.explorer.set_time(ctx.input(|input| input.time));
        self.explorer.poll_background();
        self.handle_shortcuts(ctx);
        self.sync_editor();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| self.draw_top_bar(ui));

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));

        self.draw_toasts(ctx);

        if self.explorer.has_pending_work() || !self.explorer.toasts().is_empty() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
