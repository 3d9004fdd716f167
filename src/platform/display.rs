/// Display metrics read from the host: pixel density and usable window bounds

use crate::Viewport;

/// System UI insets (status bar, navigation bar, ...) in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Insets {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

/// Window size as reported by the host.
///
/// Modern hosts report full bounds plus system-bar insets; older ones only
/// report the raw display size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMetrics {
    InsetAware {
        width: u32,
        height: u32,
        insets: Insets,
    },
    Legacy {
        width: u32,
        height: u32,
    },
}

impl WindowMetrics {
    /// Bounds minus system UI insets
    pub fn usable_viewport(&self) -> Viewport {
        match *self {
            WindowMetrics::InsetAware {
                width,
                height,
                insets,
            } => Viewport {
                width: width.saturating_sub(insets.left).saturating_sub(insets.right),
                height: height.saturating_sub(insets.top).saturating_sub(insets.bottom),
            },
            WindowMetrics::Legacy { width, height } => Viewport { width, height },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayMetrics {
    pub density: f64,
    pub window: WindowMetrics,
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        DisplayMetrics {
            density: 1.0,
            window: WindowMetrics::Legacy {
                width: 1280,
                height: 720,
            },
        }
    }
}

/// Read-only view of the execution environment's display
pub trait HostEnvironment: Send + Sync {
    /// Device pixels per layout unit; always > 0
    fn density(&self) -> f64;

    fn window_metrics(&self) -> WindowMetrics;

    fn viewport(&self) -> Viewport {
        self.window_metrics().usable_viewport()
    }
}

/// Fixed display metrics, replaceable at runtime for tests and the CLI
pub struct StaticEnvironment {
    metrics: std::sync::Mutex<DisplayMetrics>,
}

impl StaticEnvironment {
    pub fn new(metrics: DisplayMetrics) -> Self {
        StaticEnvironment {
            metrics: std::sync::Mutex::new(metrics),
        }
    }

    pub fn with_density(density: f64) -> Self {
        Self::new(DisplayMetrics {
            density,
            ..Default::default()
        })
    }

    pub fn set_metrics(&self, m: DisplayMetrics) {
        let mut g = self.metrics.lock().unwrap_or_else(|e| e.into_inner());
        *g = m;
    }

    pub fn metrics(&self) -> DisplayMetrics {
        self.metrics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for StaticEnvironment {
    fn default() -> Self {
        Self::new(DisplayMetrics::default())
    }
}

impl HostEnvironment for StaticEnvironment {
    fn density(&self) -> f64 {
        let d = self.metrics().density;
        if d.is_finite() && d > 0.0 {
            d
        } else {
            log::warn!(target: "printraster::platform", "ignoring invalid display density {}", d);
            1.0
        }
    }

    fn window_metrics(&self) -> WindowMetrics {
        self.metrics().window
    }
}
