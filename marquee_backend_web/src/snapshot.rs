// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Snapshot host over `html2canvas` and `jspdf`.
//!
//! Both libraries are expected as page globals (`html2canvas` and
//! `jspdf.jsPDF`, as their UMD bundles install them).

use std::future::Future;

use js_sys::{Object, Promise, Reflect};
use marquee_core::snapshot::{
    ExportError, PagePlan, SnapshotHost, SnapshotOptions, export_snapshot,
};
use marquee_core::time::Duration;
use marquee_core::trace::Tracer;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlCanvasElement, HtmlElement, HtmlStyleElement, Window};

use crate::{ConsoleSink, JsFailure};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "html2canvas", catch)]
    fn html2canvas(element: &HtmlElement, options: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(js_namespace = jspdf, js_name = "jsPDF")]
    type JsPdf;

    #[wasm_bindgen(constructor, js_namespace = jspdf, js_class = "jsPDF", catch)]
    fn new(orientation: &str, unit: &str, format: &str) -> Result<JsPdf, JsValue>;

    #[wasm_bindgen(method, js_name = "addImage", catch)]
    fn add_image(
        this: &JsPdf,
        data: &str,
        format: &str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = "addPage")]
    fn add_page(this: &JsPdf);

    #[wasm_bindgen(method, catch)]
    fn save(this: &JsPdf, file_name: &str) -> Result<(), JsValue>;
}

/// [`SnapshotHost`] backed by the live document.
#[derive(Debug)]
pub struct DomSnapshotHost {
    window: Window,
    document: Document,
}

impl DomSnapshotHost {
    /// Binds to the global window and document.
    pub fn new() -> Result<Self, JsFailure> {
        let window = crate::window()?;
        let document = crate::document(&window)?;
        Ok(Self { window, document })
    }
}

fn rasterize_options(element: &HtmlElement, options: &SnapshotOptions) -> Result<Object, JsFailure> {
    let init = Object::new();
    let entries: [(&str, JsValue); 7] = [
        ("scale", options.scale.into()),
        ("useCORS", true.into()),
        ("allowTaint", true.into()),
        ("backgroundColor", options.background.into()),
        ("width", element.scroll_width().into()),
        ("height", element.scroll_height().into()),
        ("logging", false.into()),
    ];
    for (key, value) in entries {
        Reflect::set(&init, &key.into(), &value)?;
    }
    Ok(init)
}

impl SnapshotHost for DomSnapshotHost {
    type Element = HtmlElement;
    type Stylesheet = HtmlStyleElement;
    type Raster = HtmlCanvasElement;
    type Error = JsFailure;

    fn find_element(&mut self, id: &str) -> Option<HtmlElement> {
        self.document.get_element_by_id(id)?.dyn_into().ok()
    }

    fn inline_style(&self, element: &HtmlElement) -> String {
        element.style().css_text()
    }

    fn set_inline_style(&mut self, element: &HtmlElement, css: &str) {
        element.style().set_css_text(css);
    }

    fn inject_stylesheet(&mut self, css: &str) -> Result<HtmlStyleElement, JsFailure> {
        let head = self
            .document
            .head()
            .ok_or_else(|| JsFailure::msg("document has no head"))?;
        let sheet: HtmlStyleElement = self.document.create_element("style")?.unchecked_into();
        sheet.set_text_content(Some(css));
        head.append_child(&sheet)?;
        Ok(sheet)
    }

    fn remove_stylesheet(&mut self, sheet: HtmlStyleElement) {
        sheet.remove();
    }

    fn settle(&mut self, delay: Duration) -> impl Future<Output = ()> {
        let window = self.window.clone();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "settle delays are a few hundred milliseconds"
        )]
        let timeout = delay.as_millis() as i32;
        async move {
            let promise = Promise::new(&mut |resolve, _reject| {
                let _ = window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout);
            });
            let _ = JsFuture::from(promise).await;
        }
    }

    fn rasterize(
        &mut self,
        element: &HtmlElement,
        options: &SnapshotOptions,
    ) -> impl Future<Output = Result<HtmlCanvasElement, JsFailure>> {
        let started = rasterize_options(element, options)
            .and_then(|init| html2canvas(element, &init).map_err(JsFailure::from));
        async move {
            let canvas = JsFuture::from(started?).await?;
            Ok(canvas.dyn_into::<HtmlCanvasElement>()?)
        }
    }

    fn raster_size(&self, raster: &HtmlCanvasElement) -> (u32, u32) {
        (raster.width(), raster.height())
    }

    fn write_document(
        &mut self,
        raster: &HtmlCanvasElement,
        plan: &PagePlan,
        file_name: &str,
    ) -> Result<(), JsFailure> {
        let data = raster.to_data_url_with_type("image/png")?;
        let pdf = JsPdf::new("p", "mm", "a4")?;
        for (page, &offset) in plan.offsets_mm.iter().enumerate() {
            if page > 0 {
                pdf.add_page();
            }
            pdf.add_image(
                &data,
                "PNG",
                0.0,
                offset,
                plan.image_width_mm,
                plan.image_height_mm,
            )?;
        }
        pdf.save(file_name)?;
        Ok(())
    }
}

/// Exports `#element_id` as `<filename>.pdf` with standard options.
///
/// Progress and failures are logged to the console; the page count or the
/// error is returned.
pub async fn generate_pdf(
    element_id: &str,
    filename: &str,
) -> Result<usize, ExportError<JsFailure>> {
    let mut host = DomSnapshotHost::new().map_err(ExportError::Style)?;
    let mut sink = ConsoleSink::new();
    export_snapshot(
        &mut host,
        element_id,
        filename,
        &SnapshotOptions::standard(),
        &mut Tracer::new(&mut sink),
    )
    .await
}

