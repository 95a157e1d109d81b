//! Startup banner: "ORGNET" in figlet's standard font with a vertical gradient.

use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

/// Deep teal (#006d77).
const TEAL: (u8, u8, u8) = (0x00, 0x6d, 0x77);
/// Warm amber (#ffb703).
const AMBER: (u8, u8, u8) = (0xff, 0xb7, 0x03);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let r = (f64::from(a.0) * (1.0 - t) + f64::from(b.0) * t).round() as u8;
    let g = (f64::from(a.1) * (1.0 - t) + f64::from(b.1) * t).round() as u8;
    let bl = (f64::from(a.2) * (1.0 - t) + f64::from(b.2) * t).round() as u8;
    (r, g, bl)
}

/// Banner text. Falls back to the plain title when the font cannot render.
fn render_title() -> String {
    FIGfont::standard()
        .ok()
        .and_then(|font| font.convert("ORGNET").map(|fig| fig.to_string()))
        .unwrap_or_else(|| "ORGNET".to_string())
}

/// Prints the banner with a gradient from teal to amber, then version and tagline.
pub fn print_welcome() {
    let mut out = stdout();
    let art = render_title();
    let lines: Vec<&str> = art.lines().collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        let t = if total <= 1 {
            1.0
        } else {
            i as f64 / (total - 1) as f64
        };
        let (r, g, b) = lerp_rgb(TEAL, AMBER, t);
        let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let version = env!("CARGO_PKG_VERSION");
    let _ = out.execute(SetForegroundColor(Color::Rgb {
        r: AMBER.0,
        g: AMBER.1,
        b: AMBER.2,
    }));
    let _ = out.execute(Print(format!("v{}\r\n", version)));
    let _ = out.execute(Print("Energy | Engagement | Exploration\r\n"));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_endpoints() {
        assert_eq!(lerp_rgb(TEAL, AMBER, 0.0), TEAL);
        assert_eq!(lerp_rgb(TEAL, AMBER, 1.0), AMBER);
    }

    #[test]
    fn test_title_is_rendered() {
        assert!(!render_title().trim().is_empty());
    }
}
