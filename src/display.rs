use clap::ValueEnum;

/// CLI-facing poster rendering choice; `Auto` probes the terminal.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliPosterMode {
  Auto,
  Kitty,
  Sixel,
  Halfblock,
  Ascii,
}

/// How poster images get onto the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosterMode {
  /// Grayscale character art — works everywhere.
  Ascii,
  /// True-color half-block cells.
  HalfBlock,
  /// Sixel escape stream (pixel resolution, 256-color palette).
  Sixel,
  /// Kitty graphics protocol (pixel resolution, full color).
  Kitty,
}

impl PosterMode {
  pub fn label(self) -> &'static str {
    match self {
      PosterMode::Ascii => "ASCII",
      PosterMode::HalfBlock => "Half-block",
      PosterMode::Sixel => "Sixel",
      PosterMode::Kitty => "Kitty",
    }
  }

  /// Kitty and Sixel bypass the ratatui buffer and write escape sequences
  /// straight to stdout after each draw.
  pub fn uses_escape_protocol(self) -> bool {
    matches!(self, PosterMode::Kitty | PosterMode::Sixel)
  }
}

/// Probe the terminal for the richest supported poster mode.
///
/// Order: Kitty graphics > Sixel > true-color half-block > ASCII.
/// Same environment heuristics as every terminal image tool: `TERM`,
/// `TERM_PROGRAM`, and `COLORTERM`.
pub fn detect_poster_mode() -> PosterMode {
  let term = std::env::var("TERM").unwrap_or_default();
  let term_program = std::env::var("TERM_PROGRAM").unwrap_or_default().to_lowercase();

  if term == "xterm-kitty" || matches!(term_program.as_str(), "kitty" | "wezterm" | "ghostty") {
    return PosterMode::Kitty;
  }

  if matches!(term_program.as_str(), "foot" | "mlterm" | "contour") || term.contains("sixel") {
    return PosterMode::Sixel;
  }

  let colorterm = std::env::var("COLORTERM").unwrap_or_default().to_lowercase();
  if colorterm == "truecolor" || colorterm == "24bit" {
    return PosterMode::HalfBlock;
  }

  PosterMode::Ascii
}

pub fn resolve_poster_mode(cli: CliPosterMode) -> PosterMode {
  match cli {
    CliPosterMode::Auto => detect_poster_mode(),
    CliPosterMode::Kitty => PosterMode::Kitty,
    CliPosterMode::Sixel => PosterMode::Sixel,
    CliPosterMode::Halfblock => PosterMode::HalfBlock,
    CliPosterMode::Ascii => PosterMode::Ascii,
  }
}
