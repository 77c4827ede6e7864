//! Placement of the payload on the panel.
//!
//! [`plan`] is pure: it turns a payload into draw operations using only font
//! metrics, so every position can be checked without touching pixels.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use shared::models::{CalendarRecord, DayPart, DepartureRecord, DisplayPayload, WeatherRecord};
use std::str::FromStr;

use crate::canvas::WIDTH;
use crate::fonts::{self, EmojiFace, FontKind, FontSet};

pub const MARGIN: i32 = 20;

pub const MAX_ROWS: usize = 3;
pub const ROWS_TOP: i32 = 20;
pub const ROW_PITCH: i32 = 90;
pub const BADGE_SIZE: Size = Size::new(115, 70);
const DESTINATION_GAP: i32 = 15;

pub const SEPARATOR_Y: i32 = 305;
pub const SEPARATOR_WIDTH: u32 = 2;

pub const BOTTOM_Y: i32 = 322;
pub const CALENDAR_X: i32 = WIDTH as i32 / 2 + 10;
const LINE_PITCH: i32 = 40;
const ICON_GAP: i32 = 10;
const WIND_GAP: i32 = 15;
const WIND_OFFSET: i32 = 11;

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    FillRect {
        area: Rectangle,
        color: BinaryColor,
    },
    Line {
        start: Point,
        end: Point,
        width: u32,
    },
    Text {
        origin: Point,
        text: String,
        font: FontKind,
        color: BinaryColor,
    },
}

pub fn plan(payload: &DisplayPayload, fonts: &FontSet) -> Vec<DrawOp> {
    let mut ops = Vec::new();

    for (row, departure) in payload.buses.iter().take(MAX_ROWS).enumerate() {
        departure_row(&mut ops, fonts, ROWS_TOP + row as i32 * ROW_PITCH, departure);
    }
    ops.push(DrawOp::Line {
        start: Point::new(MARGIN, SEPARATOR_Y),
        end: Point::new(WIDTH as i32 - MARGIN, SEPARATOR_Y),
        width: SEPARATOR_WIDTH,
    });
    weather_block(&mut ops, fonts, &payload.weather);
    calendar_block(&mut ops, fonts, &payload.calendar);

    ops
}

fn text(origin: Point, text: &str, font: FontKind) -> DrawOp {
    DrawOp::Text {
        origin,
        text: text.to_string(),
        font,
        color: BinaryColor::On,
    }
}

/// Origin placing the ink of `ink` vertically centred in `height` from `top`.
fn centred_y(top: i32, height: u32, ink: &Rectangle) -> i32 {
    top + (height as i32 - ink.size.height as i32) / 2 - ink.top_left.y
}

fn departure_row(ops: &mut Vec<DrawOp>, fonts: &FontSet, top: i32, departure: &DepartureRecord) {
    let badge = Rectangle::new(Point::new(MARGIN, top), BADGE_SIZE);
    ops.push(DrawOp::FillRect {
        area: badge,
        color: BinaryColor::On,
    });

    let number = fonts.ink_box(FontKind::BoldLarge, &departure.number);
    let number_x = MARGIN + (BADGE_SIZE.width as i32 - number.size.width as i32) / 2 - number.top_left.x;
    ops.push(DrawOp::Text {
        origin: Point::new(number_x, centred_y(top, BADGE_SIZE.height, &number)),
        text: departure.number.clone(),
        font: FontKind::BoldLarge,
        color: BinaryColor::Off,
    });

    let destination = fonts.ink_box(FontKind::Medium, &departure.destination);
    let destination_x = MARGIN + BADGE_SIZE.width as i32 + DESTINATION_GAP;
    ops.push(text(
        Point::new(destination_x, centred_y(top, BADGE_SIZE.height, &destination)),
        &departure.destination,
        FontKind::Medium,
    ));

    let label = departure.label();
    let ink = fonts.ink_box(FontKind::BoldLarge, label);
    let label_x = WIDTH as i32 - MARGIN - ink.size.width as i32 - ink.top_left.x;
    ops.push(text(
        Point::new(label_x, centred_y(top, BADGE_SIZE.height, &ink)),
        label,
        FontKind::BoldLarge,
    ));
}

/// An icon followed by a label, both centred on the label's ink.
fn icon_label(
    ops: &mut Vec<DrawOp>,
    fonts: &FontSet,
    origin: Point,
    icon: (FontKind, char),
    label: &str,
    font: FontKind,
) {
    let (icon_font, glyph) = icon;
    let glyph = glyph.to_string();
    let icon_ink = fonts.ink_box(icon_font, &glyph);
    let label_ink = fonts.ink_box(font, label);

    let band = label_ink.size.height.max(icon_ink.size.height);
    let band_top = origin.y + label_ink.top_left.y;
    ops.push(text(
        Point::new(origin.x - icon_ink.top_left.x, centred_y(band_top, band, &icon_ink)),
        &glyph,
        icon_font,
    ));

    let label_x = origin.x + icon_ink.size.width as i32 + ICON_GAP;
    ops.push(text(Point::new(label_x, origin.y), label, font));
}

fn day_part_icon(later_temp_time: &str) -> char {
    match DayPart::from_str(later_temp_time) {
        Ok(DayPart::Noon) => fonts::ICON_SUN,
        Ok(DayPart::Afternoon) => fonts::ICON_SUN_CLOUD,
        Ok(DayPart::Night) | Err(_) => fonts::ICON_MOON,
    }
}

fn weather_block(ops: &mut Vec<DrawOp>, fonts: &FontSet, weather: &WeatherRecord) {
    ops.push(text(Point::new(MARGIN, BOTTOM_Y), &weather.current_temp, FontKind::BoldLarge));

    if !weather.wind_condition.is_empty() {
        let temp_width = fonts.advance(FontKind::BoldLarge, &weather.current_temp);
        ops.push(text(
            Point::new(MARGIN + temp_width + WIND_GAP, BOTTOM_Y + WIND_OFFSET),
            &weather.wind_condition,
            FontKind::Small,
        ));
    }

    let later_y = BOTTOM_Y + 50;
    icon_label(
        ops,
        fonts,
        Point::new(MARGIN, later_y),
        (FontKind::WeatherIcon, day_part_icon(&weather.later_temp_time)),
        &weather.later_temp,
        FontKind::Medium,
    );

    if !weather.precipitation.is_empty() {
        icon_label(
            ops,
            fonts,
            Point::new(MARGIN, later_y + LINE_PITCH),
            (FontKind::WeatherIcon, fonts::ICON_RAIN),
            &weather.precipitation,
            FontKind::Small,
        );
    }
}

fn calendar_block(ops: &mut Vec<DrawOp>, fonts: &FontSet, calendar: &CalendarRecord) {
    if !calendar.event_date.is_empty() {
        icon_label(
            ops,
            fonts,
            Point::new(CALENDAR_X, BOTTOM_Y + 3),
            (FontKind::CalendarIcon, fonts::ICON_CALENDAR),
            &calendar.event_date.to_uppercase(),
            FontKind::BoldMedium,
        );
    }

    let lines = [&calendar.event_desc_1, &calendar.event_desc_2];
    for (i, line) in lines.iter().enumerate() {
        if !line.is_empty() {
            let y = BOTTOM_Y + 50 + i as i32 * LINE_PITCH;
            mixed_text(ops, fonts, Point::new(CALENDAR_X, y), line);
        }
    }
}

pub fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F600..=0x1F64F
            | 0x1F300..=0x1F5FF
            | 0x1F680..=0x1F6FF
            | 0x1F700..=0x1F77F
            | 0x1F780..=0x1F7FF
            | 0x1F800..=0x1F8FF
            | 0x1F900..=0x1F9FF
            | 0x1FA00..=0x1FA6F
            | 0x1FA70..=0x1FAFF
            | 0x2600..=0x26FF
            | 0x2700..=0x27BF
            | 0xFE00..=0xFE0F
            | 0x1F1E6..=0x1F1FF
    )
}

fn is_variation_selector(c: char) -> bool {
    matches!(c as u32, 0xFE00..=0xFE0F)
}

#[derive(Debug, PartialEq, Eq)]
pub struct Span {
    pub font: FontKind,
    pub text: String,
}

/// Split `line` into runs drawn with one font each: text in the medium font,
/// emoji in the face covering their block. Variation selectors only pick a
/// presentation and are dropped.
pub fn segment(line: &str) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();

    for c in line.chars().filter(|c| !is_variation_selector(*c)) {
        let font = if is_emoji(c) {
            FontKind::Emoji(EmojiFace::of(c))
        } else {
            FontKind::Medium
        };
        if let Some(span) = spans.last_mut().filter(|span| span.font == font) {
            span.text.push(c);
        } else {
            spans.push(Span {
                font,
                text: c.to_string(),
            });
        }
    }
    spans
}

fn mixed_text(ops: &mut Vec<DrawOp>, fonts: &FontSet, origin: Point, line: &str) {
    let mut pen = origin;
    for span in segment(line) {
        ops.push(text(pen, &span.text, span.font));
        pen.x += fonts.advance(span.font, &span.text);
    }
}
