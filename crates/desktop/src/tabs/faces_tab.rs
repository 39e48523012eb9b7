use iced::widget::{checkbox, column, container, pick_list, row, text, Space};
use iced::{Element, Length};

use lenslab_core::detection::domain::face_record::FaceRecord;
use lenslab_core::overlay::renderer::DisplayMode;

use crate::app::{Message, Readiness};
use crate::settings::Settings;
use crate::tabs::motion_tab::feed;

pub fn view<'a>(
    settings: &Settings,
    readiness: &Readiness,
    preview: Option<&'a iced::widget::image::Handle>,
    records: &'a [FaceRecord],
    face_count: usize,
) -> Element<'a, Message> {
    let controls = row![
        checkbox(settings.detection_enabled)
            .label("Detection")
            .on_toggle(Message::DetectionToggled)
            .text_size(13),
        pick_list(DisplayMode::ALL, Some(settings.display_mode), Message::ModeSelected)
            .text_size(13),
        checkbox(settings.show_details)
            .label("Details panel")
            .on_toggle(Message::DetailsToggled)
            .text_size(13),
    ]
    .spacing(16)
    .align_y(iced::Alignment::Center);

    let status = match readiness {
        Readiness::Ready => format!("{face_count} face(s)"),
        other => other.status_line(),
    };

    let mut details = column![].spacing(6);
    for (index, record) in records.iter().enumerate() {
        let [profile, expression] = record.panel_lines();
        details = details.push(
            container(
                row![
                    text(format!("Face {}", index + 1)).size(13).width(70),
                    column![text(profile).size(13), text(expression).size(13)].spacing(2),
                ]
                .spacing(8)
                .align_y(iced::Alignment::Center),
            )
            .padding([8, 12])
            .style(container::rounded_box)
            .width(Length::Fill),
        );
    }

    column![
        feed(preview),
        Space::new().height(12),
        controls,
        Space::new().height(8),
        text(status).size(13),
        Space::new().height(8),
        details,
    ]
    .spacing(0)
    .into()
}
