//! Kiểu dữ liệu lõi cho timeline điều trị: sự kiện, đợt kháng sinh, cấu hình bố cục.

mod event;
mod store;

pub use event::{
    parse_lab_value, Event, EventDate, EventId, EventKind, EventPayload, Germ, LabAnalyte,
};
pub use store::{EventLog, PatientInfo, TimelineDocument};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cấu hình hình học của timeline và các ngưỡng của bộ chia vạch trục.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineConfig {
    /// Chiều rộng vùng vẽ (pixel), không gồm lề.
    pub width_px: u32,
    /// Chiều cao một hàng trong dải kháng sinh và các dải điểm.
    pub row_height: f64,
    /// Khoảng cách giữa hai dải liên tiếp.
    pub track_gap: f64,
    /// Chiều cao mỗi dải xét nghiệm (Lc, CRP).
    pub lab_band_height: f64,
    /// Độ lệch dọc cho mỗi sự kiện trùng (dải, ngày).
    pub micro_offset_px: f64,
    /// Tỉ lệ đệm hai đầu trục thời gian so với độ dài khoảng.
    pub padding_ratio: f64,
    /// Đệm tối thiểu (ngày) mỗi bên.
    pub min_padding_days: u32,
    /// Mật độ vạch mong muốn: một vạch mỗi bấy nhiêu pixel.
    pub tick_spacing_px: u32,
    /// Số vạch tối thiểu khi tính bước.
    pub min_ticks: u32,
    /// Giới hạn số vòng lặp khi liệt kê vạch.
    pub tick_iteration_cap: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            width_px: 680,
            row_height: 20.0,
            track_gap: 10.0,
            lab_band_height: 60.0,
            micro_offset_px: 4.0,
            padding_ratio: 0.02,
            min_padding_days: 2,
            tick_spacing_px: 80,
            min_ticks: 5,
            tick_iteration_cap: 200,
        }
    }
}

/// Một đợt điều trị kháng sinh được ghép từ sự kiện bắt đầu và kết thúc.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interval {
    pub start_date: NaiveDate,
    /// `None` nghĩa là đợt điều trị còn đang tiếp diễn.
    pub end_date: Option<NaiveDate>,
    pub label: String,
    pub source_start_id: EventId,
    pub source_end_id: Option<EventId>,
}

impl Interval {
    pub fn is_open(&self) -> bool {
        self.end_date.is_none()
    }
}

/// Đợt điều trị kèm chỉ số hàng hiển thị.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowAssignment {
    pub interval: Interval,
    pub row: usize,
}

/// Vạch chia trên trục thời gian.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tick {
    pub date: NaiveDate,
    pub label: String,
}

/// Lỗi khi tạo hoặc đọc sự kiện.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("Ngày không hợp lệ: {0}")]
    InvalidDate(String),
    #[error("Thiếu chi tiết cho sự kiện {kind}")]
    MissingDetails { kind: EventKind },
    #[error("Giá trị xét nghiệm không phải số: {0}")]
    NonNumericLab(String),
    #[error("Không tìm thấy sự kiện {0}")]
    UnknownEvent(EventId),
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Lỗi khác: {0}")]
    Other(String),
}

impl From<serde_json::Error> for TimelineError {
    fn from(err: serde_json::Error) -> Self {
        TimelineError::Parse(err.to_string())
    }
}
