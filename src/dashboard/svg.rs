use std::fmt::Write;

use super::chart::{is_css_color, ChartView};

const MARGIN_LEFT: f64 = 48.0;
const MARGIN_RIGHT: f64 = 12.0;
const MARGIN_TOP: f64 = 12.0;
const MARGIN_BOTTOM: f64 = 56.0;
const BAR_GAP_RATIO: f64 = 0.2;

impl ChartView {
    /// Serialise the view as a standalone SVG document.
    ///
    /// Segment fills stay `var(--color-<key>)`; the root element defines those
    /// properties from the legend colours. Colours that are not hex or `var()`
    /// references are left out.
    pub fn to_svg(&self, width: u32, height: u32) -> String {
        let (w, h) = (f64::from(width), f64::from(height));
        let plot_w = (w - MARGIN_LEFT - MARGIN_RIGHT).max(1.0);
        let plot_h = (h - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);
        let y_max = self.y_axis.max.max(1) as f64;
        let y_of = |v: i64| MARGIN_TOP + plot_h - (v as f64 / y_max) * plot_h;

        let vars: String = self
            .legend
            .iter()
            .filter_map(|l| {
                let color = l.color.as_deref().filter(|c| is_css_color(c))?;
                Some(format!("--color-{}: {};", l.data_key, color))
            })
            .collect::<Vec<_>>()
            .join(" ");

        let mut out = String::new();
        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" style="{}" font-family="sans-serif" font-size="11">"#,
            escape(&vars)
        );
        let _ = write!(
            out,
            r#"<title>{} ({} - {})</title>"#,
            escape(&self.title),
            escape(&self.date_inputs[0].value),
            escape(&self.date_inputs[1].value)
        );

        // horizontal grid + y ticks
        for tick in &self.y_axis.ticks {
            let y = y_of(tick.value);
            let _ = write!(
                out,
                r##"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#e5e7eb"/><text x="{:.1}" y="{:.1}" text-anchor="end">{}</text>"##,
                MARGIN_LEFT + plot_w,
                MARGIN_LEFT - 6.0,
                y + 4.0,
                escape(&tick.label)
            );
        }

        let n = self.columns.len().max(1) as f64;
        let slot = plot_w / n;
        let bar_w = slot * (1.0 - BAR_GAP_RATIO);
        for (i, column) in self.columns.iter().enumerate() {
            let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_w) / 2.0;
            let mut base: i64 = 0;
            for seg in &column.segments {
                let top = y_of(base.saturating_add(seg.value));
                let bottom = y_of(base);
                let _ = write!(
                    out,
                    r#"<rect x="{x:.1}" y="{top:.1}" width="{bar_w:.1}" height="{:.1}" rx="4" style="fill: {}"><title>{}</title></rect>"#,
                    (bottom - top).max(0.0),
                    escape(&seg.fill),
                    escape(&seg.tooltip)
                );
                base = base.saturating_add(seg.value);
            }
            let _ = write!(
                out,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
                x + bar_w / 2.0,
                MARGIN_TOP + plot_h + 16.0,
                escape(&column.day)
            );
        }

        // legend
        let legend_y = h - 12.0;
        let mut lx = MARGIN_LEFT;
        for item in &self.legend {
            let _ = write!(
                out,
                r#"<rect x="{lx:.1}" y="{:.1}" width="10" height="10" rx="2" style="fill: var(--color-{})"/><text x="{:.1}" y="{legend_y:.1}">{}</text>"#,
                legend_y - 9.0,
                escape(&item.data_key),
                lx + 14.0,
                escape(&item.label)
            );
            lx += 24.0 + 7.0 * item.label.chars().count() as f64;
        }

        out.push_str("</svg>");
        out
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
