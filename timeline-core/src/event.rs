use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::TimelineError;

/// Định danh sự kiện, tăng dần theo thứ tự tạo.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ngày của sự kiện dạng `YYYY-MM-DD`, giữ nguyên chuỗi người dùng nhập.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct EventDate(String);

impl EventDate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn from_calendar(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m-%d").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ngày lịch (năm, tháng, ngày); `None` nếu chuỗi sai định dạng hoặc không tồn tại trên lịch.
    pub fn calendar(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.0.trim(), "%Y-%m-%d").ok()
    }
}

impl From<NaiveDate> for EventDate {
    fn from(date: NaiveDate) -> Self {
        Self::from_calendar(date)
    }
}

/// Chỉ số xét nghiệm được vẽ thành chuỗi riêng.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LabAnalyte {
    /// CRP (mg/l).
    Crp,
    /// Bạch cầu (G/l).
    Lc,
}

impl LabAnalyte {
    pub fn unit(self) -> &'static str {
        match self {
            LabAnalyte::Crp => "mg/l",
            LabAnalyte::Lc => "G/l",
        }
    }
}

/// Kết quả vi sinh của mẫu bệnh phẩm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Germ {
    Negative,
    Identified(String),
}

/// Nội dung sự kiện theo từng loại; mỗi loại mang đúng các trường nó cần.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    Procedure {
        details: String,
    },
    AntibioticStart {
        details: String,
    },
    /// `details` rỗng nghĩa là ngừng kháng sinh nói chung.
    AntibioticEnd {
        #[serde(default)]
        details: String,
    },
    MicrobiologySample {
        details: String,
        #[serde(default)]
        sample_type: Option<String>,
        germ: Germ,
    },
    LabValue {
        analyte: LabAnalyte,
        details: String,
    },
    ClinicalEvent {
        details: String,
    },
    ClinicalNote {
        details: String,
    },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Procedure { .. } => EventKind::Procedure,
            EventPayload::AntibioticStart { .. } => EventKind::AntibioticStart,
            EventPayload::AntibioticEnd { .. } => EventKind::AntibioticEnd,
            EventPayload::MicrobiologySample { .. } => EventKind::MicrobiologySample,
            EventPayload::LabValue {
                analyte: LabAnalyte::Crp,
                ..
            } => EventKind::LabCrp,
            EventPayload::LabValue {
                analyte: LabAnalyte::Lc,
                ..
            } => EventKind::LabLc,
            EventPayload::ClinicalEvent { .. } => EventKind::ClinicalEvent,
            EventPayload::ClinicalNote { .. } => EventKind::ClinicalNote,
        }
    }

    pub fn details(&self) -> &str {
        match self {
            EventPayload::Procedure { details }
            | EventPayload::AntibioticStart { details }
            | EventPayload::AntibioticEnd { details }
            | EventPayload::MicrobiologySample { details, .. }
            | EventPayload::LabValue { details, .. }
            | EventPayload::ClinicalEvent { details }
            | EventPayload::ClinicalNote { details } => details,
        }
    }
}

/// Nhãn phân loại phẳng, dùng để lọc và hiển thị.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Procedure,
    AntibioticStart,
    AntibioticEnd,
    MicrobiologySample,
    LabCrp,
    LabLc,
    ClinicalEvent,
    ClinicalNote,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventKind::Procedure => "Procedure",
            EventKind::AntibioticStart => "Antibiotic start",
            EventKind::AntibioticEnd => "Antibiotic end",
            EventKind::MicrobiologySample => "Microbiology",
            EventKind::LabCrp => "Lab: CRP (mg/l)",
            EventKind::LabLc => "Lab: Lc (G/l)",
            EventKind::ClinicalEvent => "Clinical event",
            EventKind::ClinicalNote => "Note",
        };
        f.write_str(label)
    }
}

/// Một sự kiện trong nhật ký bệnh nhân.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub date: EventDate,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    /// Tạo sự kiện và kiểm tra các trường bắt buộc của từng loại.
    pub fn new(id: EventId, date: EventDate, payload: EventPayload) -> Result<Self, TimelineError> {
        if date.calendar().is_none() {
            return Err(TimelineError::InvalidDate(date.as_str().to_string()));
        }

        let kind = payload.kind();
        let details = payload.details().trim();
        if details.is_empty() && kind != EventKind::AntibioticEnd {
            return Err(TimelineError::MissingDetails { kind });
        }

        if let EventPayload::LabValue { details, .. } = &payload {
            if parse_lab_value(details).is_none() {
                return Err(TimelineError::NonNumericLab(details.clone()));
            }
        }

        Ok(Self { id, date, payload })
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    pub fn details(&self) -> &str {
        self.payload.details()
    }

    pub fn calendar_date(&self) -> Option<NaiveDate> {
        self.date.calendar()
    }

    /// Giá trị số của sự kiện xét nghiệm, nếu đọc được.
    pub fn lab_value(&self) -> Option<(LabAnalyte, f64)> {
        match &self.payload {
            EventPayload::LabValue { analyte, details } => {
                parse_lab_value(details).map(|value| (*analyte, value))
            }
            _ => None,
        }
    }
}

/// Đọc phần số ở đầu chuỗi xét nghiệm ("12,5 mg/l" -> 12.5).
pub fn parse_lab_value(text: &str) -> Option<f64> {
    let normalized = text.trim().replace(',', ".");
    let prefix: String = normalized
        .chars()
        .enumerate()
        .take_while(|(idx, c)| c.is_ascii_digit() || *c == '.' || (*idx == 0 && *c == '-'))
        .map(|(_, c)| c)
        .collect();
    prefix.parse::<f64>().ok().filter(|value| value.is_finite())
}
