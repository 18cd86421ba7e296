use crate::core::preferences::Preferences;
use crate::ui::builtin_themes::{find_builtin_theme, ThemeSpec};
use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    pub id: String,
    // Overall background color to paint the full frame
    pub background_color: Color,
    // Background for the input box and picker panels
    pub surface_color: Color,

    pub text_style: Style,
    pub muted_style: Style,
    pub accent_style: Style,
    pub user_bubble_style: Style,
    pub model_bubble_style: Style,

    pub input_border_style: Style,
    pub selection_style: Style,
    pub input_cursor_style: Style,
}

impl Theme {
    /// Resolve the theme named in the preferences and apply the custom
    /// background override on top, if one is set.
    pub fn for_preferences(prefs: &Preferences) -> Self {
        let mut theme = find_builtin_theme(&prefs.theme)
            .or_else(|| find_builtin_theme("light"))
            .map(|spec| Self::from_spec(&spec))
            .unwrap_or_else(Self::fallback);

        if let Some(spec) = prefs.custom_background.as_deref() {
            if let Some(color) = parse_color(spec) {
                theme.background_color = color;
            }
        }
        theme
    }

    pub fn from_spec(spec: &ThemeSpec) -> Self {
        let background = parse_color(&spec.background).unwrap_or(Color::Reset);
        let surface = parse_color(&spec.surface).unwrap_or(background);
        let text = parse_color(&spec.text).unwrap_or(Color::Reset);
        let muted = parse_color(&spec.muted).unwrap_or(text);
        let accent = parse_color(&spec.accent).unwrap_or(text);
        let user_bubble = parse_color(&spec.user_bubble).unwrap_or(surface);
        let model_bubble = parse_color(&spec.model_bubble).unwrap_or(surface);

        Theme {
            id: spec.id.clone(),
            background_color: background,
            surface_color: surface,
            text_style: Style::default().fg(text),
            muted_style: Style::default().fg(muted),
            accent_style: Style::default().fg(accent).add_modifier(Modifier::BOLD),
            user_bubble_style: Style::default().bg(user_bubble).fg(text),
            model_bubble_style: Style::default().bg(model_bubble).fg(text),
            input_border_style: Style::default().fg(muted),
            selection_style: Style::default().bg(accent).fg(background),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }

    fn fallback() -> Self {
        Theme {
            id: "light".to_string(),
            background_color: Color::White,
            surface_color: Color::Gray,
            text_style: Style::default().fg(Color::Black),
            muted_style: Style::default().fg(Color::DarkGray),
            accent_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            user_bubble_style: Style::default().bg(Color::LightBlue).fg(Color::Black),
            model_bubble_style: Style::default().bg(Color::Gray).fg(Color::Black),
            input_border_style: Style::default().fg(Color::DarkGray),
            selection_style: Style::default().bg(Color::Blue).fg(Color::White),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }
}

/// Parse a color spec: `#rgb`/`#rrggbb` hex, `rgb(r,g,b)`, or a named color.
pub fn parse_color(s: &str) -> Option<Color> {
    let lower = s.trim().to_ascii_lowercase();
    if let Some(c) = parse_hex_color(&lower) {
        return Some(c);
    }
    if let Some(c) = parse_rgb_func(&lower) {
        return Some(c);
    }
    match lower.as_str() {
        "black" => Some(Color::Black),
        "white" => Some(Color::White),
        "gray" | "grey" => Some(Color::Gray),
        "dark_gray" | "dark-grey" | "darkgray" => Some(Color::DarkGray),
        "red" => Some(Color::Red),
        "light_red" | "light-red" => Some(Color::LightRed),
        "green" => Some(Color::Green),
        "light_green" | "light-green" => Some(Color::LightGreen),
        "blue" => Some(Color::Blue),
        "light_blue" | "light-blue" => Some(Color::LightBlue),
        "cyan" => Some(Color::Cyan),
        "light_cyan" | "light-cyan" => Some(Color::LightCyan),
        "magenta" => Some(Color::Magenta),
        "light_magenta" | "light-magenta" => Some(Color::LightMagenta),
        "yellow" => Some(Color::Yellow),
        "light_yellow" | "light-yellow" => Some(Color::LightYellow),
        "reset" => Some(Color::Reset),
        _ => None,
    }
}

fn parse_hex_color(s: &str) -> Option<Color> {
    if !s.starts_with('#') {
        return None;
    }
    let hex = &s[1..];
    if hex.len() == 3 {
        let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
        let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
        let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
        Some(Color::Rgb(r, g, b))
    } else if hex.len() == 6 {
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Color::Rgb(r, g, b))
    } else {
        None
    }
}

fn parse_rgb_func(s: &str) -> Option<Color> {
    // Format: rgb(r,g,b)
    if !s.starts_with("rgb(") || !s.ends_with(')') {
        return None;
    }
    let content = &s[4..s.len() - 1];
    let parts: Vec<_> = content
        .split([',', ' '])
        .filter(|t| !t.is_empty())
        .collect();
    if parts.len() != 3 {
        return None;
    }
    let r = parts[0].parse::<u16>().ok()?;
    let g = parts[1].parse::<u16>().ok()?;
    let b = parts[2].parse::<u16>().ok()?;
    Some(Color::Rgb(
        r.min(255) as u8,
        g.min(255) as u8,
        b.min(255) as u8,
    ))
}
