// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Snapshot export: DOM subtree to paginated A4 document.
//!
//! The pipeline is host-agnostic; the browser side lives behind
//! [`SnapshotHost`].
//!
//! ```text
//!   find element ─► StyleOverride::apply ─► settle ─► rasterize
//!                          │                               │
//!                          └──────── restore on drop ◄─────┘
//!   ─► PagePlan::for_image ─► write_document("<filename>.pdf")
//! ```
//!
//! Some live colors are written with color functions the rasterizer cannot
//! parse, so the subtree is forced to literal hex colors first. The original
//! inline style and the injected stylesheet are restored by the
//! [`StyleOverride`] guard, which runs on every exit path including a failed
//! or abandoned rasterization.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::future::Future;

use crate::error::ConfigError;
use crate::time::Duration;
use crate::trace::{DiagnosticEvent, DiagnosticLevel, ExportEvent, ExportStage, Tracer};

/// Physical page size in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageLayout {
    /// Page width.
    pub width_mm: f64,
    /// Page height.
    pub height_mm: f64,
}

impl PageLayout {
    /// ISO A4, portrait.
    #[must_use]
    pub const fn a4() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
        }
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::a4()
    }
}

/// Placement of one tall image across pages.
///
/// The image is scaled to the page width and drawn once per page, shifted up
/// by one page height each time.
#[derive(Clone, Debug, PartialEq)]
pub struct PagePlan {
    /// Page size.
    pub layout: PageLayout,
    /// Drawn image width.
    pub image_width_mm: f64,
    /// Drawn image height.
    pub image_height_mm: f64,
    /// Vertical image offset on each page; the first is always zero.
    pub offsets_mm: Vec<f64>,
}

impl PagePlan {
    /// Plans pages for an image of `width_px` by `height_px`.
    ///
    /// Returns `None` for an empty image. Content that ends exactly on a page
    /// boundary does not produce a trailing blank page.
    #[must_use]
    pub fn for_image(layout: PageLayout, width_px: u32, height_px: u32) -> Option<Self> {
        if width_px == 0 || height_px == 0 {
            return None;
        }
        let image_width_mm = layout.width_mm;
        let image_height_mm = f64::from(height_px) * image_width_mm / f64::from(width_px);

        let mut offsets_mm = Vec::from([0.0]);
        let mut height_left = image_height_mm - layout.height_mm;
        while height_left > 0.0 {
            offsets_mm.push(height_left - image_height_mm);
            height_left -= layout.height_mm;
        }
        Some(Self {
            layout,
            image_width_mm,
            image_height_mm,
            offsets_mm,
        })
    }

    /// Number of pages.
    #[must_use]
    pub fn pages(&self) -> usize {
        self.offsets_mm.len()
    }
}

/// Inline style forced onto the exported element while it is captured.
pub const PRINT_ELEMENT_STYLE: &str = "width: 210mm; min-height: 297mm; padding: 20mm; \
margin: 0; background: #ffffff !important; color: #000000 !important; \
font-family: Arial, sans-serif; box-shadow: none; transform: scale(1);";

/// Stylesheet forcing the subtree rooted at `#element_id` to literal colors.
#[must_use]
pub fn print_stylesheet(element_id: &str) -> String {
    let root = format!("#{element_id}");
    format!(
        "{root}, {root} * {{ color: #000000 !important; background-color: #ffffff !important; \
border-color: #333333 !important; outline-color: #333333 !important; \
text-decoration-color: #000000 !important; fill: #000000 !important; \
stroke: #000000 !important; }}\n\
{root} .text-gray-900, {root} .text-gray-700, {root} .text-gray-600 {{ color: #000000 !important; }}\n\
{root} .border-gray-900, {root} .border-gray-300 {{ border-color: #333333 !important; }}\n\
{root} .bg-white {{ background-color: #ffffff !important; }}\n"
    )
}

/// Capture and layout options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapshotOptions {
    /// Output page size.
    pub layout: PageLayout,
    /// Rasterizer device-pixel scale.
    pub scale: f64,
    /// Wait after overriding styles, before capturing.
    pub settle: Duration,
    /// Canvas background.
    pub background: &'static str,
}

impl SnapshotOptions {
    /// A4, 2x scale, 100ms settle, white background.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            layout: PageLayout::a4(),
            scale: 2.0,
            settle: Duration::from_millis_u64(100),
            background: "#ffffff",
        }
    }

    /// Checks that the scale and page size are positive and finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("scale", self.scale),
            ("layout.width_mm", self.layout.width_mm),
            ("layout.height_mm", self.layout.height_mm),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
            if value <= 0.0 {
                return Err(ConfigError::Zero { field });
            }
        }
        Ok(())
    }
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Why an export failed.
#[derive(Debug, thiserror::Error)]
pub enum ExportError<E> {
    /// The capture options are out of range.
    #[error("invalid export options: {0}")]
    Options(ConfigError),
    /// No element carries the requested id.
    #[error("element with id `{0}` not found")]
    ElementNotFound(String),
    /// The print stylesheet could not be injected.
    #[error("failed to apply print styles: {0}")]
    Style(E),
    /// The rasterizer failed.
    #[error("rasterization failed: {0}")]
    Rasterize(E),
    /// The capture has no pixels.
    #[error("captured image is empty")]
    EmptyCapture,
    /// The document could not be written.
    #[error("failed to write document: {0}")]
    Write(E),
}

/// The environment an export runs in.
pub trait SnapshotHost {
    /// Handle to a DOM element.
    type Element;
    /// Handle to an injected stylesheet.
    type Stylesheet;
    /// A captured image.
    type Raster;
    /// Host failure.
    type Error: core::fmt::Display;

    /// Looks up an element by id.
    fn find_element(&mut self, id: &str) -> Option<Self::Element>;

    /// Reads the element's inline `style` attribute text.
    fn inline_style(&self, element: &Self::Element) -> String;

    /// Replaces the element's inline `style` attribute text.
    fn set_inline_style(&mut self, element: &Self::Element, css: &str);

    /// Adds a stylesheet to the document head.
    fn inject_stylesheet(&mut self, css: &str) -> Result<Self::Stylesheet, Self::Error>;

    /// Removes a stylesheet added by [`inject_stylesheet`](Self::inject_stylesheet).
    fn remove_stylesheet(&mut self, sheet: Self::Stylesheet);

    /// Waits for restyling to take effect.
    fn settle(&mut self, delay: Duration) -> impl Future<Output = ()>;

    /// Captures the element.
    fn rasterize(
        &mut self,
        element: &Self::Element,
        options: &SnapshotOptions,
    ) -> impl Future<Output = Result<Self::Raster, Self::Error>>;

    /// Pixel size of a capture.
    fn raster_size(&self, raster: &Self::Raster) -> (u32, u32);

    /// Writes and downloads the paginated document.
    fn write_document(
        &mut self,
        raster: &Self::Raster,
        plan: &PagePlan,
        file_name: &str,
    ) -> Result<(), Self::Error>;
}

/// Scoped print styling with guaranteed rollback.
///
/// While alive, the element carries [`PRINT_ELEMENT_STYLE`] and the document
/// carries [`print_stylesheet`]. Dropping the guard restores the original
/// inline style and removes the stylesheet.
pub struct StyleOverride<'h, H: SnapshotHost> {
    host: &'h mut H,
    element: H::Element,
    original: String,
    sheet: Option<H::Stylesheet>,
}

impl<H: SnapshotHost> core::fmt::Debug for StyleOverride<'_, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StyleOverride")
            .field("original", &self.original)
            .field("sheet", &self.sheet.is_some())
            .finish_non_exhaustive()
    }
}

impl<'h, H: SnapshotHost> StyleOverride<'h, H> {
    /// Applies print styling to `element`, whose id is `element_id`.
    ///
    /// If the stylesheet cannot be injected nothing has been changed.
    pub fn apply(host: &'h mut H, element: H::Element, element_id: &str) -> Result<Self, H::Error> {
        let original = host.inline_style(&element);
        let sheet = host.inject_stylesheet(&print_stylesheet(element_id))?;
        host.set_inline_style(&element, PRINT_ELEMENT_STYLE);
        Ok(Self {
            host,
            element,
            original,
            sheet: Some(sheet),
        })
    }

    /// The inline style that will be restored.
    #[must_use]
    pub fn original_style(&self) -> &str {
        &self.original
    }

    /// See [`SnapshotHost::settle`].
    pub fn settle(&mut self, delay: Duration) -> impl Future<Output = ()> {
        self.host.settle(delay)
    }

    /// Captures the styled element.
    pub fn rasterize(
        &mut self,
        options: &SnapshotOptions,
    ) -> impl Future<Output = Result<H::Raster, H::Error>> {
        self.host.rasterize(&self.element, options)
    }
}

impl<H: SnapshotHost> Drop for StyleOverride<'_, H> {
    fn drop(&mut self) {
        self.host.set_inline_style(&self.element, &self.original);
        if let Some(sheet) = self.sheet.take() {
            self.host.remove_stylesheet(sheet);
        }
    }
}

/// Exports `#element_id` as `<filename>.pdf` and returns the page count.
///
/// Failures are traced at error level and returned.
pub async fn export_snapshot<H: SnapshotHost>(
    host: &mut H,
    element_id: &str,
    filename: &str,
    options: &SnapshotOptions,
    tracer: &mut Tracer<'_>,
) -> Result<usize, ExportError<H::Error>> {
    tracer.export(&ExportEvent {
        element_id,
        filename,
        stage: ExportStage::Started,
    });
    let result = run_export(host, element_id, filename, options).await;
    match &result {
        Ok(pages) => tracer.export(&ExportEvent {
            element_id,
            filename,
            stage: ExportStage::Completed { pages: *pages },
        }),
        Err(err) => {
            let reason = err.to_string();
            tracer.diagnostic(&DiagnosticEvent {
                level: DiagnosticLevel::Error,
                source: "snapshot",
                message: &reason,
            });
            tracer.export(&ExportEvent {
                element_id,
                filename,
                stage: ExportStage::Failed { reason: &reason },
            });
        }
    }
    result
}

async fn run_export<H: SnapshotHost>(
    host: &mut H,
    element_id: &str,
    filename: &str,
    options: &SnapshotOptions,
) -> Result<usize, ExportError<H::Error>> {
    options.validate().map_err(ExportError::Options)?;
    let element = host
        .find_element(element_id)
        .ok_or_else(|| ExportError::ElementNotFound(element_id.to_string()))?;

    let raster = {
        let mut guard =
            StyleOverride::apply(host, element, element_id).map_err(ExportError::Style)?;
        guard.settle(options.settle).await;
        guard.rasterize(options).await.map_err(ExportError::Rasterize)?
    };

    let (width, height) = host.raster_size(&raster);
    let plan =
        PagePlan::for_image(options.layout, width, height).ok_or(ExportError::EmptyCapture)?;
    host.write_document(&raster, &plan, &format!("{filename}.pdf"))
        .map_err(ExportError::Write)?;
    Ok(plan.pages())
}
