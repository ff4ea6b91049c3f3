use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;

use crate::timezone::{deserialize_patch_instant, OffsetStripped};

/// A persisted task row.
///
/// Parent tasks created by recurrence expansion carry `is_main_task = true`
/// and a null `parent_task_id`; generated children point at their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub task_id: i64,
    /// `TASK-000042`, assigned right after insert once the id is known
    pub code: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub priority_level: Option<String>,
    pub status: String,
    pub assigned_to: Option<i64>,
    pub manager_id: Option<i64>,
    pub due_date: Option<NaiveDateTime>,
    pub related_vendor: Option<i64>,
    pub completion_notes: Option<String>,
    pub completion_date: Option<NaiveDateTime>,
    pub project_id: Option<i64>,
    pub event_id: Option<i64>,
    pub tenant_id: Option<i64>,
    pub event_phase: Option<String>,
    pub recurrence_rule: Option<String>,
    pub recurrence_end_date: Option<NaiveDateTime>,
    pub parent_task_id: Option<i64>,
    pub is_main_task: bool,
    pub user_group_id: Option<i64>,
    pub space_id: Option<i64>,
    pub asset_id: Option<i64>,
    pub is_archived: bool,
    pub archived_at: Option<NaiveDateTime>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Task-creation payload, before parent/child materialization.
///
/// Instant fields accept offset-aware input; the offset is stripped on
/// deserialization.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTaskData {
    pub title: String,
    pub description: Option<String>,
    pub priority_level: Option<String>,
    pub status: String,
    pub assigned_to: Option<i64>,
    pub manager_id: Option<i64>,
    #[serde_as(as = "Option<OffsetStripped>")]
    pub due_date: Option<NaiveDateTime>,
    pub related_vendor: Option<i64>,
    pub completion_notes: Option<String>,
    #[serde_as(as = "Option<OffsetStripped>")]
    pub completion_date: Option<NaiveDateTime>,
    pub project_id: Option<i64>,
    pub event_id: Option<i64>,
    pub tenant_id: Option<i64>,
    pub event_phase: Option<String>,
    pub recurrence_rule: Option<String>,
    #[serde_as(as = "Option<OffsetStripped>")]
    pub recurrence_end_date: Option<NaiveDateTime>,
    pub parent_task_id: Option<i64>,
    pub is_main_task: Option<bool>,
    pub user_group_id: Option<i64>,
    pub space_id: Option<i64>,
    pub asset_id: Option<i64>,
    pub is_archived: Option<bool>,
    #[serde_as(as = "Option<OffsetStripped>")]
    pub archived_at: Option<NaiveDateTime>,
    pub created_by: Option<i64>,
}

impl NewTaskData {
    /// The recurrence rule, with blank strings treated as absent.
    pub fn effective_rule(&self) -> Option<&str> {
        self.recurrence_rule
            .as_deref()
            .map(str::trim)
            .filter(|rule| !rule.is_empty())
    }

    /// The rule and end date, when this template asks for recurrence expansion.
    pub fn recurrence(&self) -> Option<(&str, NaiveDateTime)> {
        Some((self.effective_rule()?, self.recurrence_end_date?))
    }
}

/// The full insertable field set of a task row (everything but id and code).
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority_level: Option<String>,
    pub status: String,
    pub assigned_to: Option<i64>,
    pub manager_id: Option<i64>,
    pub due_date: Option<NaiveDateTime>,
    pub related_vendor: Option<i64>,
    pub completion_notes: Option<String>,
    pub completion_date: Option<NaiveDateTime>,
    pub project_id: Option<i64>,
    pub event_id: Option<i64>,
    pub tenant_id: Option<i64>,
    pub event_phase: Option<String>,
    pub recurrence_rule: Option<String>,
    pub recurrence_end_date: Option<NaiveDateTime>,
    pub parent_task_id: Option<i64>,
    pub is_main_task: bool,
    pub user_group_id: Option<i64>,
    pub space_id: Option<i64>,
    pub asset_id: Option<i64>,
    pub is_archived: bool,
    pub archived_at: Option<NaiveDateTime>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TaskDraft {
    /// Builds a draft carrying every template field verbatim, stamped with `now`.
    pub fn from_template(template: &NewTaskData, now: NaiveDateTime) -> Self {
        Self {
            title: template.title.clone(),
            description: template.description.clone(),
            priority_level: template.priority_level.clone(),
            status: template.status.clone(),
            assigned_to: template.assigned_to,
            manager_id: template.manager_id,
            due_date: template.due_date,
            related_vendor: template.related_vendor,
            completion_notes: template.completion_notes.clone(),
            completion_date: template.completion_date,
            project_id: template.project_id,
            event_id: template.event_id,
            tenant_id: template.tenant_id,
            event_phase: template.event_phase.clone(),
            recurrence_rule: template.effective_rule().map(str::to_string),
            recurrence_end_date: template.recurrence_end_date,
            parent_task_id: template.parent_task_id,
            is_main_task: template.is_main_task.unwrap_or(false),
            user_group_id: template.user_group_id,
            space_id: template.space_id,
            asset_id: template.asset_id,
            is_archived: template.is_archived.unwrap_or(false),
            archived_at: template.archived_at,
            created_by: template.created_by,
            updated_by: template.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derives a generated occurrence from a parent draft.
    ///
    /// Children start fresh: no recurrence, no completion, not archived.
    pub fn child_of(&self, parent_task_id: i64, due_date: NaiveDateTime) -> Self {
        Self {
            due_date: Some(due_date),
            completion_notes: None,
            completion_date: None,
            recurrence_rule: None,
            recurrence_end_date: None,
            parent_task_id: Some(parent_task_id),
            is_main_task: false,
            is_archived: false,
            archived_at: None,
            ..self.clone()
        }
    }
}

/// Partial update payload. Only fields present in the request are written.
///
/// Nullable columns use `Option<Option<T>>`: the outer `None` means "leave
/// unchanged", `Some(None)` means "set to null".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskData {
    pub title: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub priority_level: Option<Option<String>>,
    pub status: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub assigned_to: Option<Option<i64>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub manager_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_patch_instant")]
    pub due_date: Option<Option<NaiveDateTime>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub related_vendor: Option<Option<i64>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub completion_notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_patch_instant")]
    pub completion_date: Option<Option<NaiveDateTime>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub project_id: Option<Option<i64>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub event_id: Option<Option<i64>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub tenant_id: Option<Option<i64>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub event_phase: Option<Option<String>>,
    /// Stored as-is. Editing the rule never re-runs expansion.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub recurrence_rule: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_patch_instant")]
    pub recurrence_end_date: Option<Option<NaiveDateTime>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub user_group_id: Option<Option<i64>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub space_id: Option<Option<i64>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub asset_id: Option<Option<i64>>,
    pub is_archived: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_patch_instant")]
    pub archived_at: Option<Option<NaiveDateTime>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub updated_by: Option<Option<i64>>,
}

/// Which side of the parent/child hierarchy a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MainTaskSelector {
    /// Generated and standalone rows (`is_main_task = false`)
    #[default]
    ChildrenOnly,
    /// Recurrence parents (`is_main_task = true`)
    MainOnly,
    /// No filter on `is_main_task`
    Both,
}

impl FromStr for MainTaskSelector {
    type Err = std::convert::Infallible;

    /// `"true"` and `"false"` select one side; any other value disables the filter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "true" => Ok(MainTaskSelector::MainOnly),
            "false" => Ok(MainTaskSelector::ChildrenOnly),
            _ => Ok(MainTaskSelector::Both),
        }
    }
}

/// Maximum rows a single page may hold.
pub const MAX_PAGE_SIZE: i64 = 100;
/// Page size used when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Error, Debug, PartialEq)]
#[error("Invalid page size: {0} (expected 1..={})", MAX_PAGE_SIZE)]
pub struct InvalidPageSize(i64);

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl PageRequest {
    /// Pages below 1 clamp to 1; page sizes outside `1..=100` are rejected.
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Result<Self, InvalidPageSize> {
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(InvalidPageSize(page_size));
        }
        Ok(Self {
            page: page.unwrap_or(1).max(1),
            page_size,
        })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Rows to skip; saturates for page numbers past the addressable range.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the total row count across all pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub items: Vec<T>,
}

/// Tenant-scoped listing filters.
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    pub tenant_id: i64,
    pub status: Option<String>,
    pub priority_level: Option<String>,
    pub event_phase: Option<String>,
    pub assigned_to: Option<i64>,
    pub manager_id: Option<i64>,
    pub project_id: Option<i64>,
    pub event_id: Option<i64>,
    pub related_vendor: Option<i64>,
    pub space_id: Option<i64>,
    pub asset_id: Option<i64>,
    pub is_archived: Option<bool>,
    pub user_group_id: Option<i64>,
    pub main_task: MainTaskSelector,
    pub page: PageRequest,
}

/// Configuration for recurrence materialization
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializationConfig {
    /// Upper bound on occurrences produced by one expansion
    pub max_occurrences: u16,
    /// Keep creating children after one of them fails to persist
    pub continue_on_child_failure: bool,
}

impl Default for MaterializationConfig {
    fn default() -> Self {
        Self {
            max_occurrences: 1000,
            continue_on_child_failure: true,
        }
    }
}

/// An occurrence whose child row could not be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedOccurrence {
    pub due_date: NaiveDateTime,
    pub error: String,
}

/// Everything one recurrence materialization produced.
#[derive(Debug, Clone)]
pub struct RecurrenceOutcome {
    /// The persisted parent, re-fetched after its code was assigned
    pub parent: Task,
    /// Children in chronological order
    pub children: Vec<Task>,
    pub failed: Vec<FailedOccurrence>,
    /// True when the expansion yielded the parent's own anchor instant
    pub skipped_parent_occurrence: bool,
    /// Set when the rule could not be parsed and children were skipped
    pub expansion_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_template_strips_offsets() {
        let template: NewTaskData = serde_json::from_value(serde_json::json!({
            "title": "Weekly Sync",
            "status": "pending",
            "due_date": "2024-01-01T09:00:00+02:00",
            "recurrence_end_date": "2024-01-22T00:00:00Z",
            "archived_at": null
        }))
        .unwrap();

        assert_eq!(template.due_date, Some(at(2024, 1, 1, 9, 0, 0)));
        assert_eq!(template.recurrence_end_date, Some(at(2024, 1, 22, 0, 0, 0)));
        assert_eq!(template.completion_date, None);
        assert_eq!(template.archived_at, None);
    }

    #[test]
    fn test_blank_rule_is_not_recurring() {
        let template = NewTaskData {
            title: "Walkthrough".into(),
            status: "pending".into(),
            recurrence_rule: Some("   ".into()),
            recurrence_end_date: Some(at(2024, 2, 1, 0, 0, 0)),
            ..Default::default()
        };
        assert_eq!(template.effective_rule(), None);
        assert_eq!(template.recurrence(), None);
    }

    #[test]
    fn test_child_draft_resets_lifecycle_fields() {
        let now = at(2024, 1, 1, 12, 0, 0);
        let template = NewTaskData {
            title: "Inspect HVAC".into(),
            status: "pending".into(),
            completion_notes: Some("done early".into()),
            completion_date: Some(at(2023, 12, 31, 0, 0, 0)),
            recurrence_rule: Some("FREQ=DAILY".into()),
            recurrence_end_date: Some(at(2024, 1, 5, 0, 0, 0)),
            is_archived: Some(true),
            archived_at: Some(at(2023, 12, 30, 0, 0, 0)),
            space_id: Some(7),
            tenant_id: Some(3),
            ..Default::default()
        };
        let parent = TaskDraft::from_template(&template, now);
        let child = parent.child_of(11, at(2024, 1, 2, 0, 0, 0));

        assert_eq!(child.parent_task_id, Some(11));
        assert_eq!(child.due_date, Some(at(2024, 1, 2, 0, 0, 0)));
        assert!(!child.is_main_task);
        assert!(!child.is_archived);
        assert_eq!(child.recurrence_rule, None);
        assert_eq!(child.recurrence_end_date, None);
        assert_eq!(child.completion_notes, None);
        assert_eq!(child.completion_date, None);
        assert_eq!(child.archived_at, None);
        assert_eq!(child.space_id, Some(7));
        assert_eq!(child.tenant_id, Some(3));
        assert_eq!(child.created_at, now);
    }

    #[test]
    fn test_update_distinguishes_absent_from_null() {
        let patch: UpdateTaskData = serde_json::from_value(serde_json::json!({
            "description": null,
            "due_date": "",
            "space_id": 4
        }))
        .unwrap();

        assert_eq!(patch.title, None);
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.due_date, Some(None));
        assert_eq!(patch.space_id, Some(Some(4)));
        assert_eq!(patch.asset_id, None);
        assert_eq!(patch.completion_date, None);
    }

    #[test]
    fn test_main_task_selector_from_str() {
        assert_eq!("true".parse::<MainTaskSelector>(), Ok(MainTaskSelector::MainOnly));
        assert_eq!("False".parse::<MainTaskSelector>(), Ok(MainTaskSelector::ChildrenOnly));
        assert_eq!("both".parse::<MainTaskSelector>(), Ok(MainTaskSelector::Both));
        assert_eq!(MainTaskSelector::default(), MainTaskSelector::ChildrenOnly);
    }

    #[test]
    fn test_page_request_bounds() {
        let page = PageRequest::new(Some(0), None).unwrap();
        assert_eq!(page.page(), 1);
        assert_eq!(page.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(page.offset(), 0);

        let page = PageRequest::new(Some(3), Some(25)).unwrap();
        assert_eq!(page.offset(), 50);

        assert!(PageRequest::new(Some(1), Some(101)).is_err());
        assert!(PageRequest::new(Some(1), Some(0)).is_err());
    }

    #[test]
    fn test_page_request_offset_saturates() {
        let page = PageRequest::new(Some(i64::MAX), Some(MAX_PAGE_SIZE)).unwrap();
        assert_eq!(page.page(), i64::MAX);
        assert_eq!(page.offset(), i64::MAX);

        let page = PageRequest::new(Some(i64::MAX / 10 + 2), Some(10)).unwrap();
        assert_eq!(page.offset(), i64::MAX);
    }
}
