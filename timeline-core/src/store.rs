use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{Event, EventDate, EventId, EventPayload, TimelineError};

/// Thông tin hành chính của bệnh nhân đi kèm nhật ký.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<EventDate>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub external_team: Option<String>,
    #[serde(default)]
    pub ortho_team: Option<String>,
    #[serde(default)]
    pub infectiology_involved: bool,
    #[serde(default)]
    pub plwc_involved: bool,
}

/// Tài liệu được lưu giữa các phiên làm việc.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TimelineDocument {
    #[serde(default)]
    pub patient: PatientInfo,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl TimelineDocument {
    pub fn to_json(&self) -> Result<String, TimelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(data: &str) -> Result<Self, TimelineError> {
        Ok(serde_json::from_str(data)?)
    }
}

/// Nhật ký sự kiện của một bệnh nhân, luôn giữ thứ tự theo ngày.
///
/// Sự kiện có ngày hỏng vẫn được giữ (để còn hiển thị và xóa) và nằm cuối danh sách.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<Event>,
    last_id: Option<EventId>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dựng lại nhật ký từ dữ liệu đã lưu; id trùng bị coi là dữ liệu hỏng.
    pub fn from_events(events: Vec<Event>) -> Result<Self, TimelineError> {
        let mut log = Self::new();
        for event in events {
            log.insert(event)?;
        }
        Ok(log)
    }

    pub fn from_document(document: TimelineDocument) -> Result<(PatientInfo, Self), TimelineError> {
        let log = Self::from_events(document.events)?;
        Ok((document.patient, log))
    }

    pub fn to_document(&self, patient: PatientInfo) -> TimelineDocument {
        TimelineDocument {
            patient,
            events: self.events.clone(),
        }
    }

    /// Thêm sự kiện mới với id lấy từ đồng hồ UTC (mili giây).
    pub fn add(&mut self, date: EventDate, payload: EventPayload) -> Result<EventId, TimelineError> {
        let now_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        self.add_at(now_ms, date, payload)
    }

    /// Như [`EventLog::add`] nhưng với đồng hồ do người gọi cung cấp.
    pub fn add_at(
        &mut self,
        now_ms: u64,
        date: EventDate,
        payload: EventPayload,
    ) -> Result<EventId, TimelineError> {
        let id = self.next_id(now_ms);
        let event = Event::new(id, date, payload)?;
        self.last_id = Some(id);
        self.push_sorted(event);
        Ok(id)
    }

    /// Chèn sự kiện đã có id (ví dụ khi khôi phục từ bộ nhớ).
    pub fn insert(&mut self, event: Event) -> Result<(), TimelineError> {
        if self.get(event.id).is_some() {
            return Err(TimelineError::Other(format!("Trùng id sự kiện {}", event.id)));
        }
        if self.last_id.map_or(true, |last| event.id > last) {
            self.last_id = Some(event.id);
        }
        self.push_sorted(event);
        Ok(())
    }

    pub fn remove(&mut self, id: EventId) -> Result<Event, TimelineError> {
        let position = self
            .events
            .iter()
            .position(|event| event.id == id)
            .ok_or(TimelineError::UnknownEvent(id))?;
        Ok(self.events.remove(position))
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    /// Danh sách sự kiện theo ngày tăng dần, cùng ngày thì theo thứ tự tạo.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn next_id(&self, now_ms: u64) -> EventId {
        match self.last_id {
            Some(last) if last.0 >= now_ms => EventId(last.0 + 1),
            _ => EventId(now_ms),
        }
    }

    fn push_sorted(&mut self, event: Event) {
        self.events.push(event);
        self.events.sort_by_key(|event| {
            let date = event.calendar_date();
            (date.is_none(), date, event.id)
        });
    }
}
