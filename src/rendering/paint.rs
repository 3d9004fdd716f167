/// Paint command list built from a page layout

use super::layout::PageLayout;

/// Opaque white canvas behind every document
pub const CANVAS_COLOR: [u8; 4] = [255, 255, 255, 255];

/// Coordinates are in layout units; the rasterizer scales them.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rgba: [u8; 4],
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        scale: f64,
        rgba: [u8; 4],
    },
}

/// Backgrounds first, then text, in document order.
pub fn build_display_list(page: &PageLayout) -> Vec<PaintCommand> {
    let mut cmds = Vec::new();

    if let Some(rgba) = page.body_background {
        cmds.push(PaintCommand::SolidRect {
            x: page.body.x,
            y: page.body.y,
            width: page.body.width,
            height: page.body.height,
            rgba,
        });
    }

    for node in &page.nodes {
        if let Some(rgba) = node.background {
            cmds.push(PaintCommand::SolidRect {
                x: node.rect.x,
                y: node.rect.y,
                width: node.rect.width,
                height: node.rect.height,
                rgba,
            });
        }
        if !node.text.is_empty() {
            let (x, y) = node.content_origin();
            cmds.push(PaintCommand::Text {
                x,
                y,
                text: node.text.clone(),
                scale: node.scale,
                rgba: node.color,
            });
        }
    }

    cmds
}
