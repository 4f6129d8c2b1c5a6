//! Preview renderer: pure composition of the sign-in screen.
//!
//! DESIGN
//! ======
//! `render` resolves the draft's asset ids against the given lists (linear
//! search; lists are small) and builds a fixed layout. Missing or dangling
//! references fall back to themed colors and the fallback font family; they
//! are never errors. No I/O happens here.

use serde::Serialize;
use uuid::Uuid;

use crate::model::{FontItem, ImageItem, ScreenDraft};
use crate::services::fonts::{FALLBACK_FONT_FAMILY, css_string, font_face_css};

pub const BACKDROP_COLOR: &str = "#1B3B1B";
pub const FALLBACK_BACKGROUND_COLOR: &str = "#85BD38";
pub const FALLBACK_BUTTON_COLOR: &str = "#D3EDB0";
const INPUT_COLOR: &str = "#8BC34A";
const LINK_COLOR: &str = "#CCE8A6";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Background {
    Image { url: String },
    Fallback { color: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ButtonSkin {
    Image { url: String },
    Fallback { color: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum FontFamily {
    Custom(String),
    Fallback,
}

impl FontFamily {
    /// The family name text is rendered in.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Custom(name) => name,
            Self::Fallback => FALLBACK_FONT_FAMILY,
        }
    }

    /// CSS `font-family` value, always ending in the fallback family.
    #[must_use]
    pub fn css(&self) -> String {
        match self {
            Self::Custom(name) => format!("{}, {FALLBACK_FONT_FAMILY}", css_string(name)),
            Self::Fallback => FALLBACK_FONT_FAMILY.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PreviewNode {
    Title { text: &'static str },
    Field { label: &'static str, placeholder: &'static str, secret: bool },
    Toggle { label: &'static str },
    Links { prompt: &'static str, create: &'static str, forgot: &'static str },
    PrimaryAction { label: &'static str },
}

/// The composed screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewTree {
    pub backdrop: &'static str,
    pub background: Background,
    pub button: ButtonSkin,
    pub font_family: FontFamily,
    pub children: Vec<PreviewNode>,
}

fn find_image(images: &[ImageItem], id: Option<Uuid>) -> Option<&ImageItem> {
    let id = id?;
    images.iter().find(|image| image.id == id)
}

/// Compose the preview for `draft` against the current asset lists.
#[must_use]
pub fn render(draft: &ScreenDraft, images: &[ImageItem], fonts: &[FontItem]) -> PreviewTree {
    let background = match find_image(images, draft.background_image_id()) {
        Some(image) => Background::Image { url: image.url.clone() },
        None => Background::Fallback { color: FALLBACK_BACKGROUND_COLOR },
    };
    let button = match find_image(images, draft.button_image_id()) {
        Some(image) => ButtonSkin::Image { url: image.url.clone() },
        None => ButtonSkin::Fallback { color: FALLBACK_BUTTON_COLOR },
    };
    let font_family = draft
        .font_id()
        .and_then(|id| fonts.iter().find(|font| font.id == id))
        .map_or(FontFamily::Fallback, |font| FontFamily::Custom(font.name.clone()));

    PreviewTree { backdrop: BACKDROP_COLOR, background, button, font_family, children: layout() }
}

fn layout() -> Vec<PreviewNode> {
    vec![
        PreviewNode::Title { text: "Sign In" },
        PreviewNode::Field { label: "Email", placeholder: "Enter your email.", secret: false },
        PreviewNode::Field { label: "Password", placeholder: "Enter your password.", secret: true },
        PreviewNode::Toggle { label: "Remember Me" },
        PreviewNode::Links { prompt: "No account?", create: "Create One!", forgot: "Forget Password" },
        PreviewNode::PrimaryAction { label: "Login" },
    ]
}

// =============================================================================
// HTML
// =============================================================================

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

impl PreviewTree {
    /// Standalone HTML document for the preview pane.
    ///
    /// `fonts` contributes `@font-face` rules so the selected family resolves
    /// in the viewing browser.
    #[must_use]
    pub fn to_html(&self, fonts: &[FontItem]) -> String {
        // css_string strips markup, so values are safe inside <style>.
        let family = self.font_family.css();
        let card_background = match &self.background {
            Background::Image { url } => {
                format!("background-image: url({}); background-size: cover; background-position: center;", css_string(url))
            }
            Background::Fallback { color } => format!("background-color: {color};"),
        };
        let (button_style, button_image) = match &self.button {
            ButtonSkin::Image { url } => (
                "background-color: transparent;".to_owned(),
                format!("<img class=\"button-image\" src=\"{}\" alt=\"\">", escape_html(url)),
            ),
            ButtonSkin::Fallback { color } => (format!("background-color: {color};"), String::new()),
        };

        let mut header = String::new();
        let mut body = String::new();
        for node in &self.children {
            let html = render_node(node, &button_style, &button_image);
            if matches!(node, PreviewNode::Title { .. }) {
                header.push_str(&html);
            } else {
                body.push_str(&html);
            }
        }

        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Preview</title>\n<style>\n{fonts_css}\
             * {{ font-family: {family} !important; }}\n\
             body {{ margin: 0; background-color: {backdrop}; }}\n\
             .card {{ position: absolute; top: 50%; left: 50%; transform: translate(-50%, -50%); width: 90%; max-width: 600px; \
             border-radius: 80px; padding: 1.5rem; display: flex; flex-direction: column; align-items: center; {card_background} }}\n\
             .form {{ width: 100%; background-color: rgba(255, 255, 255, 0.3); border-radius: 50px; padding: 2rem; box-sizing: border-box; }}\n\
             .title {{ color: white; font-weight: bold; text-align: center; }}\n\
             label, .links {{ color: white; }}\n\
             input {{ width: 100%; background-color: {INPUT_COLOR}; border: 1px solid white; border-radius: 25px; color: white; }}\n\
             a {{ color: {LINK_COLOR}; text-decoration: underline; }}\n\
             button {{ position: relative; overflow: hidden; width: 30%; border: none; border-radius: 25px; color: white; font-weight: bold; }}\n\
             .button-image {{ position: absolute; inset: 0; width: 100%; height: 100%; object-fit: cover; }}\n\
             button span {{ position: relative; z-index: 1; }}\n\
             </style>\n</head>\n<body>\n<div class=\"card\">\n{header}<div class=\"form\">\n{body}</div>\n</div>\n</body>\n</html>\n",
            fonts_css = font_face_css(fonts),
            backdrop = self.backdrop,
        )
    }
}

fn render_node(node: &PreviewNode, button_style: &str, button_image: &str) -> String {
    match node {
        PreviewNode::Title { text } => format!("<h1 class=\"title\">{}</h1>\n", escape_html(text)),
        PreviewNode::Field { label, placeholder, secret } => {
            let input_type = if *secret { "password" } else { "email" };
            format!(
                "<div class=\"field\"><label>{}</label><input type=\"{input_type}\" placeholder=\"{}\"></div>\n",
                escape_html(label),
                escape_html(placeholder)
            )
        }
        PreviewNode::Toggle { label } => {
            format!("<div class=\"toggle\"><label>{} <input type=\"checkbox\"></label></div>\n", escape_html(label))
        }
        PreviewNode::Links { prompt, create, forgot } => format!(
            "<div class=\"links\">{} <a href=\"#\">{}</a> <a href=\"#\">{}</a></div>\n",
            escape_html(prompt),
            escape_html(create),
            escape_html(forgot)
        ),
        PreviewNode::PrimaryAction { label } => format!(
            "<div class=\"action\"><button style=\"{button_style}\">{button_image}<span>{}</span></button></div>\n",
            escape_html(label)
        ),
    }
}

#[cfg(test)]
#[path = "preview_test.rs"]
mod tests;
