//! Poster rendering backends.
//!
//! The half-block and ASCII backends draw into the ratatui buffer like any
//! other widget. Kitty and Sixel write escape sequences directly to stdout
//! after the frame is drawn (the main loop owns that sequencing, keyed off
//! `PosterMode::uses_escape_protocol`).

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use color_quant::NeuQuant;
use image::{DynamicImage, ImageFormat, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};
use std::io::{Cursor, Write};

use crate::display::PosterMode;

/// Assumed terminal cell size in pixels, used to give the pixel-protocol
/// backends a sensible target resolution for a character-cell area.
const CELL_PX_W: u32 = 8;
const CELL_PX_H: u32 = 16;

// --- Buffer-drawn backends ---

/// Renders a pre-resized poster into the cell grid. Pixel-protocol modes
/// draw nothing here; their escape output happens outside the buffer.
pub struct PosterWidget<'a> {
  pub image: &'a DynamicImage,
  pub mode: PosterMode,
}

const SHADE_RAMP: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

impl Widget for PosterWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.mode {
      PosterMode::HalfBlock => half_block_into(self.image, area, buf),
      PosterMode::Ascii => shade_into(self.image, area, buf),
      PosterMode::Kitty | PosterMode::Sixel => {}
    }
  }
}

/// Centered offset of `inner` within `outer`, clamped to the cell grid.
fn centered(outer: u16, inner: u32) -> u16 {
  ((outer as u32).saturating_sub(inner) / 2).min(u16::MAX as u32) as u16
}

/// Two vertical pixels per cell via the upper-half-block glyph: the upper
/// pixel colors the foreground, the lower the background.
fn half_block_into(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let cols = rgb.width().min(area.width as u32);
  let rows = rgb.height().div_ceil(2).min(area.height as u32);
  let x0 = area.x.saturating_add(centered(area.width, cols));
  let y0 = area.y.saturating_add(centered(area.height, rgb.height().div_ceil(2)));

  for row in 0..rows {
    for col in 0..cols {
      let top = rgb.get_pixel(col, row * 2);
      let below = row * 2 + 1;
      let fg = Color::Rgb(top[0], top[1], top[2]);
      let bg = if below < rgb.height() {
        let px = rgb.get_pixel(col, below);
        Color::Rgb(px[0], px[1], px[2])
      } else {
        Color::Reset
      };
      buf.set_string(
        x0.saturating_add(col.min(u16::MAX as u32) as u16),
        y0.saturating_add(row.min(u16::MAX as u32) as u16),
        "▀",
        Style::default().fg(fg).bg(bg),
      );
    }
  }
}

/// Luma-to-character fallback for terminals with no color support.
fn shade_into(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let luma = image.to_luma8();
  let cols = luma.width().min(area.width as u32);
  let rows = luma.height().min(area.height as u32);
  let x0 = area.x.saturating_add(centered(area.width, cols));
  let y0 = area.y.saturating_add(centered(area.height, rows));

  for row in 0..rows {
    for col in 0..cols {
      let level = luma.get_pixel(col, row)[0] as usize;
      let idx = (level * (SHADE_RAMP.len() - 1)) / 255;
      buf.set_string(
        x0.saturating_add(col.min(u16::MAX as u32) as u16),
        y0.saturating_add(row.min(u16::MAX as u32) as u16),
        SHADE_RAMP[idx],
        Style::default(),
      );
    }
  }
}

// --- Kitty graphics protocol ---
//
// APC framing, PNG payload, base64 in <=4096-byte chunks:
//
//   first chunk: \x1B_G a=T,f=100,t=d,i=1,p=1,c=<cols>,r=<rows>,q=2,m=1;<data>\x1B\\
//   middle:      \x1B_G m=1;<data>\x1B\\
//   last:        \x1B_G m=0;<data>\x1B\\
//   delete all:  \x1B_G a=d,d=a,q=2\x1B\\
//
// A fixed image id (i=1) and placement id (p=1) make each send an atomic
// replacement of the previous poster — no flicker between movies. c/r let
// the terminal scale the full-resolution PNG itself, so the poster stays
// sharp at native pixel density.

const KITTY_CHUNK: usize = 4096;

/// Remove every Kitty image we have placed (poster area cleared, app exit).
pub fn kitty_clear() -> Result<()> {
  let mut stdout = std::io::stdout();
  write!(stdout, "\x1B_Ga=d,d=a,q=2\x1B\\").context("Failed to write kitty clear")?;
  stdout.flush().context("Failed to flush kitty clear")?;
  Ok(())
}

/// Place the poster over `area` via the Kitty protocol.
pub fn kitty_draw(image: &DynamicImage, area: Rect) -> Result<()> {
  if area.is_empty() {
    return Ok(());
  }

  let mut png = Vec::new();
  image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).context("Failed to encode poster as PNG")?;
  let payload = BASE64.encode(&png);
  let chunks: Vec<&[u8]> = payload.as_bytes().chunks(KITTY_CHUNK).collect();
  let last = chunks.len().saturating_sub(1);

  let mut stdout = std::io::stdout();
  write!(stdout, "\x1B[{};{}H", area.y.saturating_add(1), area.x.saturating_add(1))
    .context("Failed to position cursor for poster")?;

  for (i, chunk) in chunks.iter().enumerate() {
    let data = std::str::from_utf8(chunk).context("base64 chunk was not valid UTF-8")?;
    let more = if i < last { 1 } else { 0 };
    if i == 0 {
      write!(stdout, "\x1B_Ga=T,f=100,t=d,i=1,p=1,c={},r={},q=2,m={};{}\x1B\\", area.width, area.height, more, data)
        .context("Failed to write kitty poster header chunk")?;
    } else {
      write!(stdout, "\x1B_Gm={};{}\x1B\\", more, data).context("Failed to write kitty poster chunk")?;
    }
  }

  stdout.flush().context("Failed to flush kitty poster")?;
  Ok(())
}

// --- Sixel ---
//
// DCS q <data> ST, where each data row covers 6 vertical pixels per color
// register. Registers are declared as #<n>;2;<r%>;<g%>;<b%>; pixel columns
// become chars 0x3F..0x7E; `$` rewinds the row, `-` advances it; `!<n><ch>`
// run-length-encodes repeats. Palette comes from NeuQuant quantization.

const SIXEL_COLORS: usize = 256;

/// Draw the poster over `area` as a Sixel stream.
pub fn sixel_draw(image: &DynamicImage, area: Rect) -> Result<()> {
  if area.is_empty() {
    return Ok(());
  }

  // Fit the poster inside the pane at cell pixel density, preserving the
  // portrait aspect instead of cropping faces off one-sheet artwork.
  let max_w = area.width as u32 * CELL_PX_W;
  let max_h = area.height as u32 * CELL_PX_H;
  let fitted = image.resize(max_w, max_h, FilterType::Lanczos3).into_rgb8();
  let (w, h) = (fitted.width() as usize, fitted.height() as usize);

  let rgba: Vec<u8> = fitted.pixels().flat_map(|p| [p[0], p[1], p[2], 255]).collect();
  let quant = NeuQuant::new(3, SIXEL_COLORS, &rgba);
  let map = quant.color_map_rgb();
  let palette: Vec<[u8; 3]> = (0..SIXEL_COLORS)
    .map(|i| map.get(i * 3..i * 3 + 3).and_then(|s| s.try_into().ok()).unwrap_or([0, 0, 0]))
    .collect();
  // NeuQuant was built with SIXEL_COLORS registers, so indices fit a u8.
  let indexed: Vec<u8> = fitted.pixels().map(|p| quant.index_of(&[p[0], p[1], p[2], 255]).min(255) as u8).collect();

  let mut out = String::with_capacity(w * h);
  out.push_str("\x1BPq");
  out.push_str(&format!("\"1;1;{};{}", w, h));
  for (i, [r, g, b]) in palette.iter().enumerate() {
    out.push_str(&format!("#{};2;{};{};{}", i, *r as u32 * 100 / 255, *g as u32 * 100 / 255, *b as u32 * 100 / 255));
  }

  for band in 0..h.div_ceil(6) {
    let y_base = band * 6;
    for register in 0..palette.len() {
      let register = register.min(255) as u8;
      let mut used = false;
      let mut row: Vec<u8> = Vec::with_capacity(w);

      for x in 0..w {
        let mut bits: u8 = 0;
        for bit in 0..6 {
          let y = y_base + bit;
          if y < h
            && let Some(&idx) = indexed.get(y * w + x)
            && idx == register
          {
            bits |= 1 << bit;
            used = true;
          }
        }
        row.push(bits);
      }

      if !used {
        continue;
      }
      out.push_str(&format!("#{}", register));

      let mut x = 0;
      while x < row.len() {
        let bits = row[x];
        let glyph = (bits + 0x3F) as char;
        let mut run = 1usize;
        while x + run < row.len() && row[x + run] == bits {
          run += 1;
        }
        if run > 3 {
          out.push_str(&format!("!{}{}", run, glyph));
        } else {
          for _ in 0..run {
            out.push(glyph);
          }
        }
        x += run;
      }
      out.push('$');
    }
    out.push('-');
  }
  out.push_str("\x1B\\");

  let mut stdout = std::io::stdout();
  write!(stdout, "\x1B[{};{}H{}", area.y.saturating_add(1), area.x.saturating_add(1), out)
    .context("Failed to write sixel poster")?;
  stdout.flush().context("Failed to flush sixel poster")?;
  Ok(())
}
