use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    /// Comma-separated, e.g. `booked,paid`. Empty keeps every status.
    pub status: Option<String>,
    pub sort_order: Option<SortOrder>,
}
