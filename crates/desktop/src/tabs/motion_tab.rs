use iced::widget::{column, container, progress_bar, row, text, Space};
use iced::{Color, Element, Length};

use crate::app::Message;

pub fn view<'a>(
    preview: Option<&'a iced::widget::image::Handle>,
    level: f32,
    triggered: bool,
    events: usize,
) -> Element<'a, Message> {
    let status_color = if triggered {
        Color::from_rgb(0.86, 0.32, 0.25)
    } else {
        Color::from_rgb(0.55, 0.55, 0.55)
    };
    let status_label = if triggered { "Motion detected" } else { "No motion" };

    column![
        feed(preview),
        Space::new().height(12),
        row![
            text(status_label).size(15).color(status_color),
            text(format!("{events} event(s) this session")).size(13),
        ]
        .spacing(16)
        .align_y(iced::Alignment::Center),
        Space::new().height(8),
        row![
            text("Activity").size(13),
            progress_bar(0.0..=100.0, (level * 100.0).min(100.0)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
    ]
    .spacing(0)
    .into()
}

pub fn feed<'a>(preview: Option<&'a iced::widget::image::Handle>) -> Element<'a, Message> {
    let inner: Element<'a, Message> = match preview {
        Some(handle) => iced::widget::image(handle.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        None => text("Waiting for frames\u{2026}").size(14).into(),
    };

    container(inner)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .style(container::rounded_box)
        .into()
}
