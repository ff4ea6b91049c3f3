//! # Venueops Core Library
//!
//! Task persistence and recurring task materialization for the venueops
//! facility-operations backend.
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Task rows, templates, partial updates and listing queries
//! - [`repository`]: Data access layer with Repository pattern
//! - [`recurrence`]: RRULE cleanup and occurrence expansion
//! - [`materializer`]: Parent/child task creation from a template
//! - [`timezone`]: Offset stripping and wire datetime parsing
//! - [`code`]: Human-readable `TASK-000042` codes
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use venueops_core::{
//!     db, materializer::TaskMaterializer, models::NewTaskData,
//!     repository::SqliteRepository,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("tasks.db").await?;
//!     let materializer = TaskMaterializer::with_defaults(Arc::new(SqliteRepository::new(pool)));
//!
//!     let template = NewTaskData {
//!         title: "Weekly Sync".to_string(),
//!         status: "pending".to_string(),
//!         recurrence_rule: Some("FREQ=WEEKLY;BYDAY=MO".to_string()),
//!         recurrence_end_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 22)
//!             .and_then(|d| d.and_hms_opt(0, 0, 0)),
//!         ..Default::default()
//!     };
//!
//!     let outcome = materializer.materialize(template).await?;
//!     println!("{} children", outcome.children.len());
//!     Ok(())
//! }
//! ```

pub mod code;
pub mod db;
pub mod error;
pub mod materializer;
pub mod models;
pub mod recurrence;
pub mod repository;
pub mod timezone;
