use anyhow::{anyhow, Result};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use std::borrow::Cow;
use u8g2_fonts::types::VerticalPosition;
use u8g2_fonts::{fonts, FontRenderer};

// Glyphs of the open iconic sets.
pub const ICON_SUN: char = 'E';
pub const ICON_SUN_CLOUD: char = 'A';
pub const ICON_MOON: char = 'B';
pub const ICON_RAIN: char = 'C';
pub const ICON_CALENDAR: char = 'k';

/// Drawn in place of an emoji none of the faces carries.
pub const MISSING_EMOJI: char = '\u{2610}';

// Unifont glyphs are 16 px, doubled to sit next to the 25 px text.
const EMOJI_SCALE: u32 = 2;

/// Unifont blocks backing emoji. The emoticon and animal fonts store their
/// glyphs from 0x20 on, so those faces remap code points before lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmojiFace {
    Emoticons,
    Animals,
    Symbols,
    MoreSymbols,
    Dingbats,
}

impl EmojiFace {
    /// Face drawing `c`. Anything outside the covered blocks goes to
    /// `Symbols`, which draws [`MISSING_EMOJI`] for it.
    pub fn of(c: char) -> Self {
        match c as u32 {
            0x1F600..=0x1F64F => EmojiFace::Emoticons,
            0x1F400..=0x1F43F => EmojiFace::Animals,
            0x2680..=0x26FF => EmojiFace::MoreSymbols,
            0x2700..=0x27BF => EmojiFace::Dingbats,
            _ => EmojiFace::Symbols,
        }
    }

    fn glyph(self, c: char) -> char {
        let code = c as u32;
        let mapped = match self {
            EmojiFace::Emoticons => code.checked_sub(0x1F600).filter(|offset| *offset < 0x50).map(|offset| 0x20 + offset),
            EmojiFace::Animals => code.checked_sub(0x1F400).filter(|offset| *offset < 0x40).map(|offset| 0x20 + offset),
            EmojiFace::Symbols => Some(code).filter(|code| (0x2600..=0x267F).contains(code)),
            EmojiFace::MoreSymbols => Some(code).filter(|code| (0x2680..=0x26FF).contains(code)),
            EmojiFace::Dingbats => Some(code).filter(|code| (0x2700..=0x27BF).contains(code)),
        };
        mapped.and_then(char::from_u32).unwrap_or(MISSING_EMOJI)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontKind {
    BoldLarge,
    BoldMedium,
    Medium,
    Small,
    WeatherIcon,
    CalendarIcon,
    Emoji(EmojiFace),
}

impl FontKind {
    pub const ALL: [FontKind; 11] = [
        FontKind::BoldLarge,
        FontKind::BoldMedium,
        FontKind::Medium,
        FontKind::Small,
        FontKind::WeatherIcon,
        FontKind::CalendarIcon,
        FontKind::Emoji(EmojiFace::Emoticons),
        FontKind::Emoji(EmojiFace::Animals),
        FontKind::Emoji(EmojiFace::Symbols),
        FontKind::Emoji(EmojiFace::MoreSymbols),
        FontKind::Emoji(EmojiFace::Dingbats),
    ];

    /// Glyphs the font must carry for the dashboard to render.
    fn required_glyphs(self) -> &'static str {
        match self {
            FontKind::BoldLarge | FontKind::BoldMedium => "0123456789:ABCDEFGHIJKLMNOPQRSTUVWXYZ min",
            FontKind::Medium | FontKind::Small => "Aa0123456789°C/h% åäöÅÄÖéü",
            FontKind::WeatherIcon => "EABC",
            FontKind::CalendarIcon => "k",
            FontKind::Emoji(EmojiFace::Emoticons) => "\u{1F600}\u{1F60A}\u{1F64F}",
            FontKind::Emoji(EmojiFace::Animals) => "\u{1F408}\u{1F415}\u{1F43F}",
            FontKind::Emoji(EmojiFace::Symbols) => "☀☁☂☕\u{2610}",
            FontKind::Emoji(EmojiFace::MoreSymbols) => "⚡⛄⛴⛵",
            FontKind::Emoji(EmojiFace::Dingbats) => "✂✈✉❤",
        }
    }
}

/// Where a text op lands for the renderer: the point handed to it, the
/// vertical anchor of that point and the pixel scale around it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub anchor: Point,
    pub position: VerticalPosition,
    pub scale: u32,
}

/// Fonts resolved once at startup. Rendering never falls back: either every
/// font carries its required glyphs or resolution fails.
pub struct FontSet {
    bold_large: FontRenderer,
    bold_medium: FontRenderer,
    medium: FontRenderer,
    small: FontRenderer,
    weather_icon: FontRenderer,
    calendar_icon: FontRenderer,
    emoticons: FontRenderer,
    animals: FontRenderer,
    symbols: FontRenderer,
    more_symbols: FontRenderer,
    dingbats: FontRenderer,
}

impl FontSet {
    pub fn resolve() -> Result<Self> {
        let set = Self {
            bold_large: FontRenderer::new::<fonts::u8g2_font_fub30_tf>(),
            bold_medium: FontRenderer::new::<fonts::u8g2_font_fub25_tf>(),
            medium: FontRenderer::new::<fonts::u8g2_font_fur25_tf>(),
            small: FontRenderer::new::<fonts::u8g2_font_fur20_tf>(),
            weather_icon: FontRenderer::new::<fonts::u8g2_font_open_iconic_weather_4x_t>(),
            calendar_icon: FontRenderer::new::<fonts::u8g2_font_open_iconic_all_4x_t>(),
            emoticons: FontRenderer::new::<fonts::u8g2_font_unifont_t_emoticons>(),
            animals: FontRenderer::new::<fonts::u8g2_font_unifont_t_animals>(),
            symbols: FontRenderer::new::<fonts::u8g2_font_unifont_t_76>(),
            more_symbols: FontRenderer::new::<fonts::u8g2_font_unifont_t_77>(),
            dingbats: FontRenderer::new::<fonts::u8g2_font_unifont_t_78_79>(),
        };

        for kind in FontKind::ALL {
            let glyphs = kind.required_glyphs();
            set.renderer(kind)
                .get_rendered_dimensions(&*set.glyphs(kind, glyphs), Point::zero(), VerticalPosition::Top)
                .map_err(|err| anyhow!("{:?} font cannot render {:?}: {:?}", kind, glyphs, err))?;
        }

        log::debug!("Resolved {} fonts", FontKind::ALL.len());
        Ok(set.lenient())
    }

    // Payload text is arbitrary, glyphs missing from a font are skipped.
    fn lenient(self) -> Self {
        Self {
            bold_large: self.bold_large.with_ignore_unknown_chars(true),
            bold_medium: self.bold_medium.with_ignore_unknown_chars(true),
            medium: self.medium.with_ignore_unknown_chars(true),
            small: self.small.with_ignore_unknown_chars(true),
            weather_icon: self.weather_icon.with_ignore_unknown_chars(true),
            calendar_icon: self.calendar_icon.with_ignore_unknown_chars(true),
            emoticons: self.emoticons.with_ignore_unknown_chars(true),
            animals: self.animals.with_ignore_unknown_chars(true),
            symbols: self.symbols.with_ignore_unknown_chars(true),
            more_symbols: self.more_symbols.with_ignore_unknown_chars(true),
            dingbats: self.dingbats.with_ignore_unknown_chars(true),
        }
    }

    pub fn renderer(&self, kind: FontKind) -> &FontRenderer {
        match kind {
            FontKind::BoldLarge => &self.bold_large,
            FontKind::BoldMedium => &self.bold_medium,
            FontKind::Medium => &self.medium,
            FontKind::Small => &self.small,
            FontKind::WeatherIcon => &self.weather_icon,
            FontKind::CalendarIcon => &self.calendar_icon,
            FontKind::Emoji(EmojiFace::Emoticons) => &self.emoticons,
            FontKind::Emoji(EmojiFace::Animals) => &self.animals,
            FontKind::Emoji(EmojiFace::Symbols) => &self.symbols,
            FontKind::Emoji(EmojiFace::MoreSymbols) => &self.more_symbols,
            FontKind::Emoji(EmojiFace::Dingbats) => &self.dingbats,
        }
    }

    /// `text` as codes of the font behind `kind`.
    pub fn glyphs<'a>(&self, kind: FontKind, text: &'a str) -> Cow<'a, str> {
        match kind {
            FontKind::Emoji(face) => Cow::Owned(text.chars().map(|c| face.glyph(c)).collect()),
            _ => Cow::Borrowed(text),
        }
    }

    /// Placement of a text op whose top-left origin is `origin`. Emoji sit
    /// on the baseline of the medium text they are mixed with.
    pub fn placement(&self, kind: FontKind, origin: Point) -> Placement {
        match kind {
            FontKind::Emoji(_) => Placement {
                anchor: origin + Point::new(0, self.medium.get_ascent() as i32 + 1),
                position: VerticalPosition::Baseline,
                scale: EMOJI_SCALE,
            },
            _ => Placement {
                anchor: origin,
                position: VerticalPosition::Top,
                scale: 1,
            },
        }
    }

    /// Ink box of `text` drawn with its top-left origin at zero.
    pub fn ink_box(&self, kind: FontKind, text: &str) -> Rectangle {
        let placement = self.placement(kind, Point::zero());
        let scale = placement.scale as i32;
        self.renderer(kind)
            .get_rendered_dimensions(&*self.glyphs(kind, text), placement.anchor, placement.position)
            .ok()
            .and_then(|dimensions| dimensions.bounding_box)
            .map(|ink| {
                Rectangle::new(
                    placement.anchor + (ink.top_left - placement.anchor) * scale,
                    ink.size * placement.scale,
                )
            })
            .unwrap_or(Rectangle::zero())
    }

    /// Horizontal pen advance after drawing `text`.
    pub fn advance(&self, kind: FontKind, text: &str) -> i32 {
        let placement = self.placement(kind, Point::zero());
        self.renderer(kind)
            .get_rendered_dimensions(&*self.glyphs(kind, text), placement.anchor, placement.position)
            .map(|dimensions| dimensions.advance.x * placement.scale as i32)
            .unwrap_or(0)
    }
}
