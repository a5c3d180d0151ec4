//! Palettes for the form, cards, history list and status bar.
//!
//! The card panel layers three backgrounds over proposal text: annotated
//! ranges, the selection being dragged or extended, and the caret cell. Each
//! palette keeps those three apart so an annotation never hides a selection.
//!
//! `dark` sticks to the named ANSI colors and follows the terminal's own
//! scheme. `catppuccin-mocha` is RGB and looks washed out without truecolor.

use ratatui::style::Color;

/// Names accepted by `--theme` and the `theme` key in `config.toml`.
pub const THEME_NAMES: [&str; 2] = ["dark", "catppuccin-mocha"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub border_active: Color,
    pub border_inactive: Color,

    /// Proposal body and form values.
    pub text: Color,
    /// Labels, scores, timestamps, key hints.
    pub muted: Color,
    /// Annotated ranges.
    pub highlight_bg: Color,
    /// Selection in progress, before it becomes a pending suggestion.
    pub selection_bg: Color,
    pub caret_bg: Color,
    /// Title of the card under the cursor.
    pub card_selected: Color,

    /// Inline edit preview.
    pub diff_added: Color,
    pub diff_removed: Color,

    /// Generation progress and notices.
    pub banner_info: Color,
    pub banner_error: Color,

    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    /// Mode badge while navigating or annotating.
    pub status_mode_normal: Color,
    /// Mode badge while typing into the form, an edit or a suggestion.
    pub status_mode_insert: Color,

    /// Fill for cleared areas such as the help overlay.
    pub background: Color,
}

impl Theme {
    /// The default. Annotations show on yellow, the selection on blue.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            text: Color::Reset,
            muted: Color::DarkGray,
            highlight_bg: Color::Yellow,
            selection_bg: Color::Blue,
            caret_bg: Color::White,
            card_selected: Color::Cyan,

            diff_added: Color::Green,
            diff_removed: Color::Red,

            banner_info: Color::Cyan,
            banner_error: Color::Red,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,

            background: Color::Reset,
        }
    }

    /// Catppuccin Mocha, <https://github.com/catppuccin/catppuccin>.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let blue = Color::Rgb(137, 180, 250); // #89b4fa
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let surface2 = Color::Rgb(88, 91, 112); // #585b70
        let base = Color::Rgb(30, 30, 46); // #1e1e2e
        let text = Color::Rgb(205, 214, 244); // #cdd6f4
        let rosewater = Color::Rgb(245, 224, 220); // #f5e0dc

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            text,
            // Yellow dimmed towards base so light text stays readable on it.
            highlight_bg: Color::Rgb(94, 84, 60),
            muted: overlay1,
            selection_bg: surface2,
            caret_bg: rosewater,
            card_selected: lavender,

            diff_added: green,
            diff_removed: red,

            banner_info: blue,
            banner_error: red,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: yellow,

            background: base,
        }
    }

    /// Looks up one of [`THEME_NAMES`]. `catppuccin_mocha` is accepted too.
    ///
    /// An unknown name logs a warning and yields `dark()`, so a bad config
    /// value never blocks startup.
    ///
    /// # Arguments
    ///
    /// * `name` — value of `--theme` or the config file's `theme` key.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, known = ?THEME_NAMES, "unknown theme, using dark");
                Self::dark()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_and_unknown_falls_back_to_dark() {
        assert_eq!(Theme::from_name("catppuccin-mocha"), Theme::catppuccin_mocha());
        assert_eq!(Theme::from_name("catppuccin_mocha"), Theme::catppuccin_mocha());
        assert_eq!(Theme::from_name("dark"), Theme::dark());
        assert_eq!(Theme::from_name("solarized"), Theme::dark());
    }

    #[test]
    fn card_backgrounds_stay_distinct() {
        for name in THEME_NAMES {
            let theme = Theme::from_name(name);
            assert_ne!(theme.highlight_bg, theme.selection_bg, "{name}");
            assert_ne!(theme.highlight_bg, theme.caret_bg, "{name}");
            assert_ne!(theme.selection_bg, theme.caret_bg, "{name}");
        }
    }
}
