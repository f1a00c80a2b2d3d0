//! Client for the task API: HTTP data layer, the derived list view, the
//! view-state controller with its HTML rendering, and the browser front end.
pub mod api;
pub mod app;
pub mod config;
pub mod dates;
pub mod render;
pub mod view;
pub mod web;

pub use api::{ClientError, TaskGateway, TodoApi};
pub use app::{Banner, TaskForm, TodoApp, ViewState};
pub use view::{SortKey, StatusFilter, TaskStats, TitleOrder, ViewQuery};
pub use web::create_web_router;
