use ratatui::style::Color;

/// A full UI palette. Cycled with Ctrl+T and persisted by name.
pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub status: Color,
  pub error: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: &[Theme] = &[
  Theme {
    name: "marquee",
    bg: Color::Rgb(24, 24, 30),
    fg: Color::Rgb(224, 222, 216),
    accent: Color::Rgb(52, 211, 153),
    muted: Color::Rgb(120, 120, 130),
    border: Color::Rgb(60, 60, 72),
    status: Color::Rgb(125, 196, 228),
    error: Color::Rgb(235, 111, 111),
    highlight_fg: Color::Rgb(18, 18, 22),
    highlight_bg: Color::Rgb(52, 211, 153),
    stripe_bg: Color::Rgb(30, 30, 38),
    key_fg: Color::Rgb(18, 18, 22),
    key_bg: Color::Rgb(120, 120, 130),
  },
  Theme {
    name: "matinee",
    bg: Color::Rgb(250, 247, 240),
    fg: Color::Rgb(56, 52, 46),
    accent: Color::Rgb(16, 122, 87),
    muted: Color::Rgb(148, 140, 128),
    border: Color::Rgb(214, 206, 194),
    status: Color::Rgb(36, 99, 167),
    error: Color::Rgb(186, 54, 54),
    highlight_fg: Color::Rgb(250, 247, 240),
    highlight_bg: Color::Rgb(16, 122, 87),
    stripe_bg: Color::Rgb(242, 238, 229),
    key_fg: Color::Rgb(250, 247, 240),
    key_bg: Color::Rgb(148, 140, 128),
  },
  Theme {
    name: "noir",
    bg: Color::Rgb(12, 12, 14),
    fg: Color::Rgb(200, 200, 200),
    accent: Color::Rgb(212, 175, 55),
    muted: Color::Rgb(100, 100, 104),
    border: Color::Rgb(44, 44, 48),
    status: Color::Rgb(160, 160, 170),
    error: Color::Rgb(220, 90, 90),
    highlight_fg: Color::Rgb(12, 12, 14),
    highlight_bg: Color::Rgb(212, 175, 55),
    stripe_bg: Color::Rgb(20, 20, 23),
    key_fg: Color::Rgb(12, 12, 14),
    key_bg: Color::Rgb(100, 100, 104),
  },
  Theme {
    name: "midnight",
    bg: Color::Rgb(16, 22, 36),
    fg: Color::Rgb(205, 214, 230),
    accent: Color::Rgb(122, 162, 247),
    muted: Color::Rgb(96, 108, 134),
    border: Color::Rgb(48, 58, 82),
    status: Color::Rgb(158, 206, 106),
    error: Color::Rgb(247, 118, 142),
    highlight_fg: Color::Rgb(16, 22, 36),
    highlight_bg: Color::Rgb(122, 162, 247),
    stripe_bg: Color::Rgb(22, 29, 46),
    key_fg: Color::Rgb(16, 22, 36),
    key_bg: Color::Rgb(96, 108, 134),
  },
];
