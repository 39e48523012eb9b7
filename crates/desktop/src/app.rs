use std::path::PathBuf;
use std::time::Duration;

use iced::widget::{button, column, container, row, text};
use iced::{Element, Length, Subscription, Task};

use lenslab_core::detection::domain::face_record::FaceRecord;
use lenslab_core::detection::infrastructure::model_set::ModelArtifact;
use lenslab_core::overlay::renderer::DisplayMode;
use lenslab_core::shared::constants::IMAGE_EXTENSIONS;

use crate::settings::Settings;
use crate::tabs;
use crate::workers::analysis_worker::{self, ControlMsg, WorkerEvent, WorkerHandle, WorkerParams};

// ---------------------------------------------------------------------------
// Tab enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Motion,
    Faces,
}

impl Tab {
    const ALL: &[Tab] = &[Tab::Motion, Tab::Faces];

    fn label(self) -> &'static str {
        match self {
            Tab::Motion => "Motion",
            Tab::Faces => "Faces",
        }
    }
}

// ---------------------------------------------------------------------------
// Model readiness as the UI sees it
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    Loading,
    Downloading {
        artifact: ModelArtifact,
        downloaded: u64,
        total: u64,
    },
    Ready,
    Failed(String),
}

impl Readiness {
    pub fn status_line(&self) -> String {
        match self {
            Readiness::Loading => "Loading models\u{2026}".to_string(),
            Readiness::Downloading {
                artifact,
                downloaded,
                total,
            } => {
                if *total > 0 {
                    let pct = (*downloaded as f64 / *total as f64 * 100.0) as u32;
                    format!("Downloading {artifact} model\u{2026} {pct}%")
                } else {
                    format!("Downloading {artifact} model\u{2026} {downloaded} bytes")
                }
            }
            Readiness::Ready => "Models ready".to_string(),
            Readiness::Failed(e) => format!("Models unavailable: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    TabSelected(Tab),
    SelectSource,
    SourceSelected(Option<PathBuf>),
    UseSyntheticSource,
    DetectionToggled(bool),
    ModeSelected(DisplayMode),
    DetailsToggled(bool),
    Poll,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    active_tab: Tab,
    pub settings: Settings,
    worker: Option<WorkerHandle>,
    input_path: Option<PathBuf>,
    readiness: Readiness,
    face_count: usize,
    records: Vec<FaceRecord>,
    motion_level: f32,
    motion_triggered: bool,
    motion_events: usize,
    preview: Option<iced::widget::image::Handle>,
    source_error: Option<String>,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let mut app = Self {
            active_tab: Tab::Motion,
            settings: Settings::default(),
            worker: None,
            input_path: None,
            readiness: Readiness::Loading,
            face_count: 0,
            records: Vec::new(),
            motion_level: 0.0,
            motion_triggered: false,
            motion_events: 0,
            preview: None,
            source_error: None,
        };
        app.restart_worker();
        (app, Task::none())
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TabSelected(tab) => {
                self.active_tab = tab;
            }
            Message::SelectSource => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Select an image")
                            .add_filter("Images", IMAGE_EXTENSIONS)
                            .pick_file()
                            .await
                            .map(|h| h.path().to_path_buf())
                    },
                    Message::SourceSelected,
                );
            }
            Message::SourceSelected(Some(path)) => {
                self.input_path = Some(path);
                self.restart_worker();
            }
            Message::SourceSelected(None) => {}
            Message::UseSyntheticSource => {
                if self.input_path.is_some() {
                    self.input_path = None;
                    self.restart_worker();
                }
            }
            Message::DetectionToggled(enabled) => {
                self.settings.detection_enabled = enabled;
                self.push_settings();
            }
            Message::ModeSelected(mode) => {
                self.settings.display_mode = mode;
                self.push_settings();
            }
            Message::DetailsToggled(visible) => {
                self.settings.show_details = visible;
                self.push_settings();
            }
            Message::Poll => {
                self.pump_worker();
            }
        }
        Task::none()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let tab_bar = row(Tab::ALL
            .iter()
            .map(|&tab| {
                let label = text(tab.label()).size(13);
                let btn = button(label)
                    .on_press(Message::TabSelected(tab))
                    .padding([6, 14]);
                if tab == self.active_tab {
                    btn.style(button::primary).into()
                } else {
                    btn.style(button::text).into()
                }
            })
            .collect::<Vec<_>>())
        .spacing(2);

        let content: Element<'_, Message> = match self.active_tab {
            Tab::Motion => tabs::motion_tab::view(
                self.preview.as_ref(),
                self.motion_level,
                self.motion_triggered,
                self.motion_events,
            ),
            Tab::Faces => tabs::faces_tab::view(
                &self.settings,
                &self.readiness,
                self.preview.as_ref(),
                &self.records,
                self.face_count,
            ),
        };

        let tab_content = container(content).padding(16).height(Length::Fill);

        column![tab_bar, self.source_row(), tab_content, self.footer()]
            .spacing(0)
            .height(Length::Fill)
            .into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        if self.worker.is_some() {
            iced::time::every(Duration::from_millis(80)).map(|_| Message::Poll)
        } else {
            Subscription::none()
        }
    }

    // -----------------------------------------------------------------------

    fn source_row(&self) -> Element<'_, Message> {
        let source_name = match &self.input_path {
            Some(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            None => "Synthetic feed".to_string(),
        };

        let mut controls = row![
            text(format!("Source: {source_name}")).size(13).width(Length::Fill),
            button(text("Open Image\u{2026}").size(13))
                .on_press(Message::SelectSource)
                .padding([6, 14])
                .style(button::secondary),
        ]
        .spacing(8)
        .align_y(iced::Alignment::Center);

        if self.input_path.is_some() {
            controls = controls.push(
                button(text("Synthetic").size(13))
                    .on_press(Message::UseSyntheticSource)
                    .padding([6, 14])
                    .style(button::secondary),
            );
        }

        container(controls)
            .padding([10, 16])
            .width(Length::Fill)
            .into()
    }

    fn footer(&self) -> Element<'_, Message> {
        let status = match &self.source_error {
            Some(e) => format!("Source error: {e}"),
            None => self.readiness.status_line(),
        };
        container(text(status).size(11))
            .width(Length::Fill)
            .center_x(Length::Fill)
            .padding([4, 0])
            .into()
    }

    fn restart_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop();
        }
        self.readiness = Readiness::Loading;
        self.face_count = 0;
        self.records.clear();
        self.motion_level = 0.0;
        self.motion_triggered = false;
        self.motion_events = 0;
        self.preview = None;
        self.source_error = None;
        self.worker = Some(analysis_worker::spawn(WorkerParams {
            input: self.input_path.clone(),
            settings: self.settings,
            models_dir: None,
        }));
    }

    fn push_settings(&mut self) {
        if let Some(worker) = &self.worker {
            let _ = worker.control.send(ControlMsg::Settings(self.settings));
        }
    }

    fn pump_worker(&mut self) {
        let Some(worker) = &self.worker else {
            return;
        };
        while let Ok(event) = worker.events.try_recv() {
            match event {
                WorkerEvent::DownloadProgress {
                    artifact,
                    downloaded,
                    total,
                } => {
                    self.readiness = Readiness::Downloading {
                        artifact,
                        downloaded,
                        total,
                    };
                }
                WorkerEvent::Ready => {
                    self.readiness = Readiness::Ready;
                }
                WorkerEvent::LoadFailed(e) => {
                    self.readiness = Readiness::Failed(e);
                }
                WorkerEvent::SourceFailed(e) => {
                    self.source_error = Some(e);
                }
                WorkerEvent::Cycle { faces, records } => {
                    self.face_count = faces;
                    self.records = records;
                }
                WorkerEvent::Motion { level, triggered } => {
                    if triggered && !self.motion_triggered {
                        self.motion_events += 1;
                    }
                    self.motion_level = level;
                    self.motion_triggered = triggered;
                }
            }
        }

        let mut latest = None;
        while let Ok(frame) = worker.frames.try_recv() {
            latest = Some(frame);
        }
        if let Some(frame) = latest {
            self.preview = Some(iced::widget::image::Handle::from_rgba(
                frame.width,
                frame.height,
                frame.pixels,
            ));
        }
    }
}
