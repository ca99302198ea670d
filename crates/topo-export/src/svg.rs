//! SVG preview markup.
//!
//! The sheet is one millimeter per user unit. Everything except the frame
//! sits in a group clipped to the outline; each layer is its own `<g>`
//! carrying the shared style attributes.

use topo_core::config::unit_opacity;
use topo_core::enums::{BlendMode, LayerKind, OutlineKind};
use topo_core::types::{Point, Rgb};
use topo_terrain::ShapeMask;

use crate::scene::{
    Scene, SceneItem, LABEL_HALO_WIDTH, PLACEHOLDER_COLOR, PLACEHOLDER_SIZE,
};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const PLACEHOLDER_FONT: &str = "SF Pro Text, Segoe UI, Roboto, sans-serif";
const FRAME_COLOR: Rgb = Rgb::new(36, 48, 65);

/// `M x y L x y ...` with two decimals, closed with `Z` for polygons.
pub fn path_data(points: &[Point], close: bool) -> String {
    let mut d = String::with_capacity(points.len() * 16);
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            d.push(' ');
        }
        let cmd = if i == 0 { 'M' } else { 'L' };
        d.push_str(&format!("{cmd} {:.2} {:.2}", p.x, p.y));
    }
    if close && !d.is_empty() {
        d.push_str(" Z");
    }
    d
}

/// Outline path used for the clip region. The circle is a true circle.
pub fn outline_path(outline: &ShapeMask) -> String {
    let w = outline.width();
    let h = outline.height();
    match outline.kind() {
        OutlineKind::Circle => {
            let r = w / 2.0;
            format!(
                "M {},{} m -{r},0 a {r},{r} 0 1,0 {w},0 a {r},{r} 0 1,0 -{w},0",
                w / 2.0,
                h / 2.0
            )
        }
        OutlineKind::Hexagon => {
            let pts = outline.boundary_polygon();
            let mut d = String::new();
            for (i, p) in pts.iter().enumerate() {
                let cmd = if i == 0 { "M" } else { " L" };
                d.push_str(&format!("{cmd} {},{}", p.x, p.y));
            }
            d.push_str(" Z");
            d
        }
        _ => format!("M 0,0 H {w} V {h} H 0 Z"),
    }
}

/// Escape text for element content and attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize a composed scene as a standalone SVG document.
pub fn render_svg(scene: &Scene) -> String {
    let w = scene.width();
    let h = scene.height();
    let mut out = format!(
        r#"<svg width="{w}mm" height="{h}mm" viewBox="0 0 {w} {h}" preserveAspectRatio="xMidYMid meet" xmlns="{SVG_NS}">"#
    );
    out.push_str(&format!(
        r#"<defs><clipPath id="shapeClip"><path d="{}"/></clipPath></defs>"#,
        outline_path(&scene.outline)
    ));
    out.push_str(r#"<g clip-path="url(#shapeClip)">"#);

    for item in &scene.items {
        write_item(&mut out, item, w, h);
    }

    out.push_str("</g>");
    if scene.frame {
        out.push_str(&format!(
            r#"<rect x="0.5" y="0.5" width="{}" height="{}" fill="none" stroke="{}" stroke-width="0.5" />"#,
            w - 1.0,
            h - 1.0,
            FRAME_COLOR.css_rgba(0.6)
        ));
    }
    out.push_str("</svg>");
    out
}

fn write_item(out: &mut String, item: &SceneItem, w: f64, h: f64) {
    match item {
        SceneItem::Background(color) => {
            out.push_str(&format!(r#"<rect width="100%" height="100%" fill="{color}"/>"#));
        }
        SceneItem::Gradient(image) => {
            let style = match image.blend {
                BlendMode::Normal => String::new(),
                other => format!(r#" style="mix-blend-mode:{};""#, other.css_name()),
            };
            out.push_str(&format!(
                r#"<image href="{}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="none"{style} />"#,
                image.href
            ));
        }
        SceneItem::Areas {
            layer,
            color,
            opacity,
            polygons,
        } => {
            out.push_str(&format!(
                r#"<g id="{}" fill="{color}" fill-opacity="{opacity}">"#,
                layer.group_id()
            ));
            for poly in polygons.iter().filter(|p| !p.is_empty()) {
                out.push_str(&format!(r#"<path d="{}"/>"#, path_data(poly, true)));
            }
            out.push_str("</g>");
        }
        SceneItem::Lines {
            layer,
            color,
            width,
            opacity,
            lines,
        } => {
            out.push_str(&format!(
                r#"<g id="{}" stroke="{color}" stroke-width="{width}px" stroke-opacity="{opacity}" fill="none" stroke-linecap="round" stroke-linejoin="round">"#,
                layer.group_id()
            ));
            for line in lines.iter().filter(|l| !l.is_empty()) {
                out.push_str(&format!(r#"<path d="{}"/>"#, path_data(line, false)));
            }
            out.push_str("</g>");
        }
        SceneItem::Contours {
            color,
            opacity,
            paths,
        } => {
            out.push_str(&format!(
                r#"<g id="{}" stroke="{color}" stroke-opacity="{opacity}" fill="none" stroke-linecap="round" stroke-linejoin="round">"#,
                LayerKind::Contours.group_id()
            ));
            for (width, path) in paths {
                out.push_str(&format!(
                    r#"<path d="{}" stroke-width="{width}px" />"#,
                    path_data(path, false)
                ));
            }
            out.push_str("</g>");
        }
        SceneItem::Placeholder { position, text } => out.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="middle" font-family="{PLACEHOLDER_FONT}" font-size="{PLACEHOLDER_SIZE}" fill="{PLACEHOLDER_COLOR}">{}</text>"#,
            position.x,
            position.y,
            escape_xml(text)
        )),
        SceneItem::Labels { style, labels } => {
            let weight = if style.bold { "bold" } else { "normal" };
            let font_style = if style.italic { "italic" } else { "normal" };
            out.push_str(&format!(
                r#"<g id="{}" font-family="{}" text-anchor="middle" fill="{}" fill-opacity="{}" paint-order="stroke" font-weight="{weight}" font-style="{font_style}">"#,
                LayerKind::Labels.group_id(),
                escape_xml(style.font.family()),
                style.color,
                unit_opacity(style.opacity)
            ));
            let stroke = if style.halo {
                format!(
                    r#" stroke="{}" stroke-width="{LABEL_HALO_WIDTH}""#,
                    style.halo_color
                )
            } else {
                r#" stroke="none" stroke-width="0""#.to_string()
            };
            for label in labels {
                out.push_str(&format!(
                    r#"<text x="{:.2}" y="{:.2}" font-size="{:.2}mm"{stroke}>{}</text>"#,
                    label.position.x,
                    label.position.y,
                    label.size,
                    escape_xml(&label.name)
                ));
            }
            out.push_str("</g>");
        }
    }
}
