//! Bridge WASM <-> JavaScript trung lập framework.

use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use timeline_core::{Event, EventLog, TimelineConfig, TimelineDocument, TimelineError};
use wasm_bindgen::prelude::*;

#[derive(Deserialize, Default)]
struct JsTimelineConfig {
    #[serde(default)]
    width_px: Option<u32>,
    #[serde(default)]
    row_height: Option<f64>,
    #[serde(default)]
    track_gap: Option<f64>,
    #[serde(default)]
    lab_band_height: Option<f64>,
    #[serde(default)]
    micro_offset_px: Option<f64>,
    #[serde(default)]
    tick_spacing_px: Option<u32>,
}

impl From<JsTimelineConfig> for TimelineConfig {
    fn from(cfg: JsTimelineConfig) -> Self {
        let mut base = TimelineConfig::default();
        if let Some(width) = cfg.width_px {
            base.width_px = width;
        }
        if let Some(height) = cfg.row_height {
            base.row_height = height;
        }
        if let Some(gap) = cfg.track_gap {
            base.track_gap = gap;
        }
        if let Some(height) = cfg.lab_band_height {
            base.lab_band_height = height;
        }
        if let Some(offset) = cfg.micro_offset_px {
            base.micro_offset_px = offset;
        }
        if let Some(spacing) = cfg.tick_spacing_px {
            base.tick_spacing_px = spacing;
        }
        base
    }
}

/// Tính hình học timeline từ danh sách sự kiện (mảng JS).
#[wasm_bindgen]
pub fn layout_events(events: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let events = read_events(events)?;
    let cfg = read_config(config)?;

    let view = timeline_layout::layout_timeline(&events, &cfg);
    to_value(&view).map_err(|err| JsValue::from_str(&format!("Không serialize layout: {err}")))
}

/// Danh sách OP, vi sinh và các đợt kháng sinh đã ghép.
#[wasm_bindgen]
pub fn summarize_events(events: JsValue) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let events = read_events(events)?;
    let summaries = timeline_layout::summarize(&events);
    to_value(&summaries)
        .map_err(|err| JsValue::from_str(&format!("Không serialize tóm tắt: {err}")))
}

/// Đọc tài liệu đã lưu (chuỗi JSON) và trả về danh sách sự kiện đã sắp xếp.
#[wasm_bindgen]
pub fn load_document(json: &str) -> Result<JsValue, JsValue> {
    let document =
        normalize_document(json).map_err(|err| JsValue::from_str(&format_timeline_error(err)))?;

    to_value(&document)
        .map_err(|err| JsValue::from_str(&format!("Không serialize tài liệu: {err}")))
}

fn normalize_document(json: &str) -> Result<TimelineDocument, TimelineError> {
    let (patient, log) = EventLog::from_document(TimelineDocument::from_json(json)?)?;
    Ok(log.to_document(patient))
}

fn read_events(events: JsValue) -> Result<Vec<Event>, JsValue> {
    from_value::<Vec<Event>>(events)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được danh sách sự kiện: {err}")))
}

fn read_config(config: Option<JsValue>) -> Result<TimelineConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsTimelineConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            Ok(TimelineConfig::from(cfg))
        }
        _ => Ok(TimelineConfig::default()),
    }
}

fn format_timeline_error(err: TimelineError) -> String {
    format!("Timeline error: {err}")
}
