//! Built-in rendering surface.
//!
//! `BlockSurface` parses markup with `scraper`, stacks the children of
//! `<body>` as blocks and paints them into the capture buffer. It answers a
//! fixed set of layout queries through its script channel; it is not a
//! general-purpose browser engine.

pub mod layout;
pub mod paint;
pub mod raster;

use crate::capture::RasterImage;
use crate::platform::HostEnvironment;
use crate::surface::{RenderingSurface, ScriptFuture, SurfaceFactory, SurfaceSettings};
use crate::{Error, Result, Viewport};
use layout::PageLayout;
use scraper::Html;
use std::sync::Arc;
use tokio::sync::oneshot;

const TARGET: &str = "printraster::rendering";

/// Minimal block-layout surface
pub struct BlockSurface {
    viewport: Viewport,
    density: f64,
    settings: SurfaceSettings,
    markup: Option<String>,
    page: Option<PageLayout>,
    load_listeners: Vec<oneshot::Sender<()>>,
    measure_passes: u32,
}

impl BlockSurface {
    pub fn new(density: f64) -> Self {
        Self {
            viewport: Viewport::default(),
            density: if density.is_finite() && density > 0.0 {
                density
            } else {
                1.0
            },
            settings: SurfaceSettings::default(),
            markup: None,
            page: None,
            load_listeners: Vec::new(),
            measure_passes: 0,
        }
    }

    /// Factory creating surfaces at the environment's density
    pub fn factory(env: Arc<dyn HostEnvironment>) -> impl SurfaceFactory + Send + 'static {
        move || -> Result<Box<dyn RenderingSurface>> { Ok(Box::new(BlockSurface::new(env.density()))) }
    }

    pub fn page(&self) -> Option<&PageLayout> {
        self.page.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.page.is_some()
    }

    pub fn measure_passes(&self) -> u32 {
        self.measure_passes
    }

    /// Layout width in layout units
    fn layout_width(&self) -> f64 {
        f64::from(self.viewport.width) / self.density
    }

    fn relayout(&mut self) {
        if let Some(markup) = &self.markup {
            let document = Html::parse_document(markup);
            self.page = Some(layout::layout_document(&document, self.layout_width()));
        }
    }

    fn query(&self, expression: &str) -> Result<Option<String>> {
        if !self.settings.javascript_enabled {
            return Err(Error::Script("JavaScript is disabled on this surface".into()));
        }
        let Some(page) = &self.page else {
            return Ok(None);
        };
        let expr = expression.trim().trim_end_matches(';').trim();
        let value = match expr {
            "document.body.offsetWidth" => integer(page.offset_width()),
            "document.body.offsetHeight" => integer(page.offset_height()),
            "document.body.scrollWidth" | "document.documentElement.scrollWidth" => {
                integer(page.scroll_width())
            }
            "document.body.scrollHeight" | "document.documentElement.scrollHeight" => {
                integer(page.scroll_height())
            }
            "document.title" => serde_json::to_string(&page.title)
                .map_err(|e| Error::Script(format!("Failed to serialize title: {}", e)))?,
            other => {
                return Err(Error::Script(format!("Unsupported expression: {}", other)));
            }
        };
        Ok(Some(value))
    }
}

// Layout metrics are reported as whole units
fn integer(v: f64) -> String {
    format!("{}", v.round() as i64)
}

impl RenderingSurface for BlockSurface {
    fn layout(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.relayout();
    }

    fn apply_settings(&mut self, settings: &SurfaceSettings) {
        self.settings = settings.clone();
    }

    fn on_load_complete(&mut self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        if self.is_loaded() {
            let _ = tx.send(());
        } else {
            self.load_listeners.push(tx);
        }
        rx
    }

    fn load_markup(&mut self, markup: &str, document_type: &str, encoding: &str) -> Result<()> {
        if !document_type.eq_ignore_ascii_case("text/html") {
            return Err(Error::Surface(format!(
                "Unsupported document type: {}",
                document_type
            )));
        }
        if !encoding.eq_ignore_ascii_case("utf-8") {
            return Err(Error::Surface(format!("Unsupported encoding: {}", encoding)));
        }

        self.markup = Some(markup.to_string());
        self.relayout();
        log::debug!(
            target: TARGET,
            "loaded {} bytes of markup at {}x{}",
            markup.len(),
            self.viewport.width,
            self.viewport.height
        );

        for tx in self.load_listeners.drain(..) {
            let _ = tx.send(());
        }
        Ok(())
    }

    fn evaluate_script(&mut self, expression: &str) -> ScriptFuture {
        let result = self.query(expression);
        Box::pin(futures::future::ready(result))
    }

    fn measure_unconstrained(&mut self) {
        self.relayout();
        self.measure_passes += 1;
    }

    fn draw(&mut self, target: &mut RasterImage) -> Result<()> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| Error::Render("No document loaded".into()))?;
        let commands = paint::build_display_list(page);
        raster::paint(&commands, target, self.density);
        Ok(())
    }

    fn destroy(&mut self) {
        self.load_listeners.clear();
        self.page = None;
        self.markup = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PixelDimensions;

    #[tokio::test]
    async fn answers_layout_queries_after_load() {
        let mut s = BlockSurface::new(2.0);
        s.layout(Viewport { width: 400, height: 300 });
        let loaded = s.on_load_complete();
        assert_eq!(s.evaluate_script("document.body.offsetWidth").await.unwrap(), None);

        s.load_markup("<title>T</title><body style='width:100px;height:50px'>x</body>", "text/HTML", "UTF-8")
            .unwrap();
        loaded.await.unwrap();

        let w = s.evaluate_script("document.body.offsetWidth").await.unwrap();
        let h = s.evaluate_script("document.body.offsetHeight;").await.unwrap();
        assert_eq!(w.as_deref(), Some("100"));
        assert_eq!(h.as_deref(), Some("50"));
        let t = s.evaluate_script("document.title").await.unwrap();
        assert_eq!(t.as_deref(), Some("\"T\""));
        assert!(s.evaluate_script("alert(1)").await.is_err());
    }

    #[tokio::test]
    async fn scripting_can_be_disabled() {
        let mut s = BlockSurface::new(1.0);
        s.apply_settings(&SurfaceSettings {
            javascript_enabled: false,
            ..SurfaceSettings::preview()
        });
        s.load_markup("<p>x</p>", "text/html", "utf-8").unwrap();
        assert!(matches!(
            s.evaluate_script("document.body.offsetWidth").await,
            Err(Error::Script(_))
        ));
    }

    #[test]
    fn auto_width_follows_viewport_in_layout_units() {
        let mut s = BlockSurface::new(2.0);
        s.layout(Viewport { width: 400, height: 300 });
        s.load_markup("<p>x</p>", "text/HTML", "UTF-8").unwrap();
        // 400px / 2.0 density minus the default 8 unit margins
        assert_eq!(s.page().unwrap().offset_width(), 184.0);
    }

    #[test]
    fn rejects_unknown_document_types() {
        let mut s = BlockSurface::new(1.0);
        assert!(s.load_markup("{}", "application/json", "UTF-8").is_err());
        assert!(s.load_markup("<p/>", "text/html", "latin1").is_err());
        assert!(!s.is_loaded());
    }

    #[test]
    fn draw_requires_a_document() {
        let mut s = BlockSurface::new(1.0);
        let mut img = RasterImage::new(PixelDimensions::new(4, 4));
        assert!(matches!(s.draw(&mut img), Err(Error::Render(_))));

        s.load_markup("<body style='background:#00f'></body>", "text/html", "utf-8")
            .unwrap();
        s.measure_unconstrained();
        s.draw(&mut img).unwrap();
        assert_eq!(s.measure_passes(), 1);
        // body starts after the 8 unit margin, so the corner is canvas
        assert_eq!(img.pixel(0, 0), Some(paint::CANVAS_COLOR));
    }

    #[test]
    fn huge_offsets_do_not_overflow_painting() {
        let mut s = BlockSurface::new(1.0);
        s.load_markup(
            "<body style='width:100px;height:50px'><div style='margin:1e19px;width:1e16px;height:1e16px;background:red'></div></body>",
            "text/HTML",
            "UTF-8",
        )
        .unwrap();
        let mut img = RasterImage::new(PixelDimensions::new(100, 50));
        s.draw(&mut img).unwrap();
        assert_eq!(img.pixel(99, 49), Some(paint::CANVAS_COLOR));
    }
}
