use std::collections::BTreeSet;
use std::time::Duration;

use eframe::{egui, Frame};
use egui::Context;

use reqwest::blocking::Client;
use reqwest::Result;

const API: &str = "http://127.0.0.1:5000";

/// REST context holding a reusable blocking HTTP client.
struct RESTContext {
    client: Client,
}

impl RESTContext {
    /// Creates a new REST context with a timeout.
    fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::new(5, 0))
            .build()?;
        Ok(Self { client })
    }

    /// Sends a GET request to `/v1/generate` with query parameters.
    ///
    /// Error statuses still carry a readable message in their body.
    fn get_generated(&self, params: &[(String, String)]) -> Result<String> {
        let response = self.client
            .get(format!("{API}/v1/generate"))
            .query(params)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if status.is_success() {
            Ok(body)
        } else {
            Ok(format!("Error ({status}): {body}"))
        }
    }

    /// Sends a GET request to `/v1/corpora`.
    fn get_corpora(&self) -> Result<String> {
        let response = self.client
            .get(format!("{API}/v1/corpora"))
            .send()?
            .error_for_status()?;
        response.text()
    }

    /// Sends a GET request to `/v1/loaded_corpora`.
    fn get_loaded_corpora(&self) -> Result<String> {
        let response = self.client
            .get(format!("{API}/v1/loaded_corpora"))
            .send()?
            .error_for_status()?;
        response.text()
    }

    /// Sends a PUT request to `/v1/load_corpora`.
    fn put_load_corpora(&self, names: &str) -> Result<String> {
        let response = self.client
            .put(format!("{API}/v1/load_corpora"))
            .query(&[("names", names)])
            .send()?
            .error_for_status()?;
        response.text()
    }
}

/// Splits a newline-separated server listing.
fn lines(body: &str) -> BTreeSet<String> {
    body.lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Global UI state (MUST persist between frames in egui).
struct GeneratorUI {
    rest: RESTContext,
    last_sentence: Option<String>,

    available_corpora: BTreeSet<String>,
    loaded_corpora: BTreeSet<String>,
    /// Empty means "any loaded corpus".
    selected_corpus: String,

    use_min_length: bool,
    min_length: usize,
}

impl GeneratorUI {
    /// Initializes the UI with sane defaults.
    fn new() -> Result<Self> {
        let mut generator = Self {
            rest: RESTContext::new()?,
            last_sentence: None,

            available_corpora: BTreeSet::new(),
            loaded_corpora: BTreeSet::new(),
            selected_corpus: String::new(),

            use_min_length: false,
            min_length: 10,
        };
        generator.get_corpora();
        generator.get_loaded_corpora();
        Ok(generator)
    }

    /// Builds the query parameters for the API.
    ///
    /// Parameters left to the server default are not sent.
    fn build_query(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if !self.selected_corpus.is_empty() {
            params.push(("corpus".into(), self.selected_corpus.clone()));
        }
        if self.use_min_length {
            params.push(("min_length".into(), self.min_length.to_string()));
        }

        params
    }

    /// Performs the generation request.
    fn get_generated(&mut self) {
        let params = self.build_query();
        self.last_sentence = Some(match self.rest.get_generated(&params) {
            Ok(sentence) => sentence,
            Err(e) => format!("Error: {e}"),
        });
    }

    fn get_corpora(&mut self) {
        match self.rest.get_corpora() {
            Ok(body) => self.available_corpora = lines(&body),
            Err(e) => self.last_sentence = Some(format!("Error: {e}")),
        }
    }

    fn get_loaded_corpora(&mut self) {
        match self.rest.get_loaded_corpora() {
            Ok(body) => self.loaded_corpora = lines(&body),
            Err(e) => self.last_sentence = Some(format!("Error: {e}")),
        }
    }

    /// Sends the current selection, then resyncs with what the server loaded.
    fn put_load_corpora(&mut self) {
        let names = self.loaded_corpora.iter().cloned().collect::<Vec<_>>().join(",");
        match self.rest.put_load_corpora(&names) {
            Ok(message) => self.last_sentence = Some(message),
            Err(e) => self.last_sentence = Some(format!("Error: {e}")),
        }
        self.get_loaded_corpora();
        if !self.loaded_corpora.contains(&self.selected_corpus) {
            self.selected_corpus.clear();
        }
    }
}

impl eframe::App for GeneratorUI {
    /// UI update loop (called every frame).
    fn update(&mut self, ctx: &Context, _: &mut Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {

            egui::Grid::new("generator_grid")
                .num_columns(2)
                .spacing([20.0, 6.0])
                .striped(true)
                .show(ui, |ui| {

                    // min_length checkbox + value
                    ui.checkbox(&mut self.use_min_length, "Minimum sentence length");
                    if self.use_min_length {
                        ui.add(
                            egui::DragValue::new(&mut self.min_length)
                                .range(1..=200)
                                .speed(1),
                        );
                    } else {
                        ui.label("Server default");
                    }
                    ui.end_row();

                    // corpus used for generation
                    ui.label("Corpus");
                    egui::ComboBox::from_id_salt("corpus")
                        .selected_text(if self.selected_corpus.is_empty() { "Any" } else { self.selected_corpus.as_str() })
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut self.selected_corpus, String::new(), "Any");
                            for name in &self.loaded_corpora {
                                ui.selectable_value(&mut self.selected_corpus, name.clone(), name);
                            }
                        });
                    ui.end_row();

                    ui.separator();
                    ui.end_row();

                    // Generate button
                    if ui
                        .add_sized([200.0, 40.0], egui::Button::new("Generate"))
                        .clicked()
                    {
                        self.get_generated();
                    }

                    // Output
                    if let Some(sentence) = &self.last_sentence {
                        ui.label(sentence);
                    } else {
                        ui.label("Click Generate to start");
                    }
                    ui.end_row();
                });

            ui.separator();
            ui.label("Loaded corpora");

            let mut selection_changed = false;
            for name in &self.available_corpora {
                let mut checked = self.loaded_corpora.contains(name);

                if ui.checkbox(&mut checked, name).changed() {
                    // Keep at least one corpus loaded
                    if checked {
                        selection_changed = true;
                        self.loaded_corpora.insert(name.clone());
                    } else if self.loaded_corpora.len() > 1 {
                        selection_changed = true;
                        self.loaded_corpora.remove(name);
                    }
                }
            }

            if selection_changed {
                self.put_load_corpora();
            }
        });
    }
}

/// Application entry point.
fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 380.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "rs-markov",
        options,
        Box::new(|_| Ok(Box::new(GeneratorUI::new()?))),
    )
}
