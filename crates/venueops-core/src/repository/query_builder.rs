use crate::models::{MainTaskSelector, TaskListQuery, UpdateTaskData};
use chrono::NaiveDateTime;
use sqlx::{Encode, QueryBuilder, Sqlite, Type};

/// Helpers for the dynamic parts of task SQL: listing filters and partial updates.
pub struct SqlQueryBuilder;

impl SqlQueryBuilder {
    /// Pushes ` WHERE ...` for a tenant-scoped listing.
    pub fn push_list_filters(query: &TaskListQuery, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE tenant_id = ");
        qb.push_bind(query.tenant_id);

        Self::push_eq(qb, "status", query.status.clone());
        Self::push_eq(qb, "priority_level", query.priority_level.clone());
        Self::push_eq(qb, "event_phase", query.event_phase.clone());
        Self::push_eq(qb, "assigned_to", query.assigned_to);
        Self::push_eq(qb, "manager_id", query.manager_id);
        Self::push_eq(qb, "project_id", query.project_id);
        Self::push_eq(qb, "event_id", query.event_id);
        Self::push_eq(qb, "related_vendor", query.related_vendor);
        Self::push_eq(qb, "space_id", query.space_id);
        Self::push_eq(qb, "asset_id", query.asset_id);
        Self::push_eq(qb, "is_archived", query.is_archived);
        Self::push_eq(qb, "user_group_id", query.user_group_id);

        match query.main_task {
            MainTaskSelector::ChildrenOnly => {
                qb.push(" AND is_main_task = ");
                qb.push_bind(false);
            }
            MainTaskSelector::MainOnly => {
                qb.push(" AND is_main_task = ");
                qb.push_bind(true);
            }
            MainTaskSelector::Both => {}
        }
    }

    fn push_eq<'a, T>(qb: &mut QueryBuilder<'a, Sqlite>, column: &str, value: Option<T>)
    where
        T: 'a + Encode<'a, Sqlite> + Type<Sqlite> + Send,
    {
        if let Some(value) = value {
            qb.push(" AND ");
            qb.push(column);
            qb.push(" = ");
            qb.push_bind(value);
        }
    }

    /// Pushes `col = ?, ...` for every field present in `data`, followed by
    /// `updated_at`, which is always written.
    pub fn push_update_assignments(
        data: &UpdateTaskData,
        updated_at: NaiveDateTime,
        qb: &mut QueryBuilder<'_, Sqlite>,
    ) {
        let mut set = Assignments { qb };

        set.push("title", data.title.clone());
        set.push("description", data.description.clone());
        set.push("priority_level", data.priority_level.clone());
        set.push("status", data.status.clone());
        set.push("assigned_to", data.assigned_to);
        set.push("manager_id", data.manager_id);
        set.push("due_date", data.due_date);
        set.push("related_vendor", data.related_vendor);
        set.push("completion_notes", data.completion_notes.clone());
        set.push("completion_date", data.completion_date);
        set.push("project_id", data.project_id);
        set.push("event_id", data.event_id);
        set.push("tenant_id", data.tenant_id);
        set.push("event_phase", data.event_phase.clone());
        set.push("recurrence_rule", data.recurrence_rule.clone());
        set.push("recurrence_end_date", data.recurrence_end_date);
        set.push("user_group_id", data.user_group_id);
        set.push("space_id", data.space_id);
        set.push("asset_id", data.asset_id);
        set.push("is_archived", data.is_archived);
        set.push("archived_at", data.archived_at);
        set.push("updated_by", data.updated_by);

        set.qb.push("updated_at = ");
        set.qb.push_bind(updated_at);
    }
}

struct Assignments<'q, 'a> {
    qb: &'q mut QueryBuilder<'a, Sqlite>,
}

impl<'q, 'a> Assignments<'q, 'a> {
    fn push<T>(&mut self, column: &str, value: Option<T>)
    where
        T: 'a + Encode<'a, Sqlite> + Type<Sqlite> + Send,
    {
        if let Some(value) = value {
            self.qb.push(column);
            self.qb.push(" = ");
            self.qb.push_bind(value);
            self.qb.push(", ");
        }
    }
}
