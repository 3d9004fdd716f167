/// Block layout for the built-in surface.
///
/// Children of `<body>` are stacked vertically. Inline `style` attributes
/// are honoured for width, height, margin, padding and colours; text is laid
/// out on a fixed character grid.

use scraper::{ElementRef, Html, Selector};

/// Advance of one character, in layout units, at scale 1
pub const CHAR_WIDTH: f64 = 8.0;
/// Height of one text line, in layout units, at scale 1
pub const LINE_HEIGHT: f64 = 16.0;

const DEFAULT_BODY_MARGIN: f64 = 8.0;
const DEFAULT_TEXT_COLOR: [u8; 4] = [0, 0, 0, 255];

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxModel {
    pub margin: f64,
    pub padding: f64,
}

/// Subset of CSS declarations read from a `style` attribute
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub margin: Option<f64>,
    pub padding: Option<f64>,
    pub background: Option<[u8; 4]>,
    pub color: Option<[u8; 4]>,
}

impl InlineStyle {
    pub fn parse(declarations: &str) -> Self {
        let mut style = InlineStyle::default();
        for decl in declarations.split(';') {
            let Some((name, value)) = decl.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match name.trim().to_ascii_lowercase().as_str() {
                "width" => style.width = parse_length(value),
                "height" => style.height = parse_length(value),
                "margin" => style.margin = first_token(value).and_then(parse_length),
                "padding" => style.padding = first_token(value).and_then(parse_length),
                "background-color" => style.background = parse_color(value),
                "background" => style.background = value.split_whitespace().find_map(parse_color),
                "color" => style.color = parse_color(value),
                _ => {}
            }
        }
        style
    }
}

fn first_token(value: &str) -> Option<&str> {
    value.split_whitespace().next()
}

/// `12`, `12px` or `12.5px`; other units are unsupported
pub fn parse_length(value: &str) -> Option<f64> {
    let v = value.trim().to_ascii_lowercase();
    let number = v.strip_suffix("px").unwrap_or(&v).trim();
    number.parse::<f64>().ok().filter(|n| n.is_finite() && *n >= 0.0)
}

/// `#rgb`, `#rrggbb`, `#rrggbbaa` or a handful of named colours
pub fn parse_color(value: &str) -> Option<[u8; 4]> {
    let v = value.trim().to_ascii_lowercase();
    if let Some(hex) = v.strip_prefix('#') {
        // channels are sliced by byte offset below
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        return match hex.len() {
            3 => {
                let mut out = [0u8, 0, 0, 255];
                for (i, c) in hex.chars().enumerate() {
                    let n = c.to_digit(16)? as u8;
                    out[i] = n * 17;
                }
                Some(out)
            }
            6 => Some([
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            ]),
            8 => Some([
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            ]),
            _ => None,
        };
    }
    let named = match v.as_str() {
        "black" => [0, 0, 0, 255],
        "white" => [255, 255, 255, 255],
        "red" => [255, 0, 0, 255],
        "green" => [0, 128, 0, 255],
        "blue" => [0, 0, 255, 255],
        "yellow" => [255, 255, 0, 255],
        "gray" | "grey" => [128, 128, 128, 255],
        "transparent" => [0, 0, 0, 0],
        _ => return None,
    };
    Some(named)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    Title,
    Paragraph,
    Block,
    /// Text sitting directly inside `<body>`
    Text,
}

/// A laid-out block: border box, text and colours
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub rect: Rect,
    pub box_model: BoxModel,
    /// Wrapped text, one line per `\n`
    pub text: String,
    pub elem_type: ElementType,
    pub scale: f64,
    pub background: Option<[u8; 4]>,
    pub color: [u8; 4],
}

impl LayoutNode {
    pub fn content_origin(&self) -> (f64, f64) {
        (
            self.rect.x + self.box_model.padding,
            self.rect.y + self.box_model.padding,
        )
    }
}

/// Result of laying out a document
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub title: String,
    /// Border box of `<body>`; its size is what `offsetWidth`/`offsetHeight` report
    pub body: Rect,
    pub body_margin: f64,
    pub body_background: Option<[u8; 4]>,
    pub nodes: Vec<LayoutNode>,
}

impl PageLayout {
    pub fn offset_width(&self) -> f64 {
        self.body.width
    }

    pub fn offset_height(&self) -> f64 {
        self.body.height
    }

    /// Full document width including the body margin
    pub fn scroll_width(&self) -> f64 {
        let widest = self
            .nodes
            .iter()
            .map(|n| n.rect.right() + n.box_model.margin)
            .fold(self.body.right(), f64::max);
        widest + self.body_margin
    }

    pub fn scroll_height(&self) -> f64 {
        self.body.bottom() + self.body_margin
    }
}

/// Lay out `document` for a viewport `available_width` layout units wide.
pub fn layout_document(document: &Html, available_width: f64) -> PageLayout {
    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|n| normalize_whitespace(&n.text().collect::<Vec<_>>().join(" ")))
        .unwrap_or_default();

    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next());

    let style = body
        .and_then(|b| b.value().attr("style"))
        .map(InlineStyle::parse)
        .unwrap_or_default();

    let margin = style.margin.unwrap_or(DEFAULT_BODY_MARGIN);
    let padding = style.padding.unwrap_or(0.0);
    let border_width = style
        .width
        .map(|w| w + 2.0 * padding)
        .unwrap_or_else(|| (available_width - 2.0 * margin).max(0.0));
    let content_width = (border_width - 2.0 * padding).max(0.0);
    let content_x = margin + padding;
    let content_top = margin + padding;
    let text_color = style.color.unwrap_or(DEFAULT_TEXT_COLOR);

    let mut nodes = Vec::new();
    let mut y = content_top;
    if let Some(body) = body {
        for child in body.children() {
            let node = if let Some(el) = ElementRef::wrap(child) {
                layout_element(el, content_x, y, content_width, text_color)
            } else if let Some(text) = child.value().as_text() {
                layout_text(&text[..], content_x, y, content_width, text_color)
            } else {
                None
            };
            if let Some(node) = node {
                y = node.rect.bottom() + node.box_model.margin;
                nodes.push(node);
            }
        }
    }

    let content_height = y - content_top;
    let border_height = style
        .height
        .map(|h| h + 2.0 * padding)
        .unwrap_or(content_height + 2.0 * padding);

    PageLayout {
        title,
        body: Rect {
            x: margin,
            y: margin,
            width: border_width,
            height: border_height,
        },
        body_margin: margin,
        body_background: style.background,
        nodes,
    }
}

fn layout_element(
    el: ElementRef,
    x: f64,
    y: f64,
    container_width: f64,
    inherited_color: [u8; 4],
) -> Option<LayoutNode> {
    let name = el.value().name().to_ascii_lowercase();
    let elem_type = match name.as_str() {
        "script" | "style" | "head" | "template" | "noscript" => return None,
        "h1" => ElementType::Title,
        "p" => ElementType::Paragraph,
        _ => ElementType::Block,
    };
    let style = el
        .value()
        .attr("style")
        .map(InlineStyle::parse)
        .unwrap_or_default();
    let scale = if elem_type == ElementType::Title { 2.0 } else { 1.0 };
    let margin = style.margin.unwrap_or(0.0);
    let padding = style.padding.unwrap_or(0.0);

    let width = style
        .width
        .map(|w| w + 2.0 * padding)
        .unwrap_or_else(|| (container_width - 2.0 * margin).max(0.0));
    let text = normalize_whitespace(&el.text().collect::<Vec<_>>().join(" "));
    let lines = wrap_text(&text, chars_per_line(width - 2.0 * padding, scale));
    let height = style
        .height
        .map(|h| h + 2.0 * padding)
        .unwrap_or(lines.len() as f64 * LINE_HEIGHT * scale + 2.0 * padding);

    Some(LayoutNode {
        rect: Rect {
            x: x + margin,
            y: y + margin,
            width,
            height,
        },
        box_model: BoxModel { margin, padding },
        text: lines.join("\n"),
        elem_type,
        scale,
        background: style.background,
        color: style.color.unwrap_or(inherited_color),
    })
}

fn layout_text(raw: &str, x: f64, y: f64, width: f64, color: [u8; 4]) -> Option<LayoutNode> {
    let text = normalize_whitespace(raw);
    if text.is_empty() {
        return None;
    }
    let lines = wrap_text(&text, chars_per_line(width, 1.0));
    Some(LayoutNode {
        rect: Rect {
            x,
            y,
            width,
            height: lines.len() as f64 * LINE_HEIGHT,
        },
        box_model: BoxModel::default(),
        text: lines.join("\n"),
        elem_type: ElementType::Text,
        scale: 1.0,
        background: None,
        color,
    })
}

fn chars_per_line(width: f64, scale: f64) -> usize {
    let n = (width / (CHAR_WIDTH * scale)).floor();
    if n >= 1.0 {
        n as usize
    } else {
        1
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greedy word wrap; empty text yields no lines
pub fn wrap_text(text: &str, chars_per_line: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        if !cur.is_empty() && cur.chars().count() + word.chars().count() + 1 > chars_per_line {
            lines.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push(' ');
        }
        cur.push_str(word);
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}
