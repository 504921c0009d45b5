use chrono::{DateTime, Utc};
use common::UserId;
use domain::{Money, OrderStatus};

/// Field an order listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Creation instant (the default).
    #[default]
    CreatedAt,

    /// Last-modified instant.
    UpdatedAt,

    /// Final payable amount.
    NetAmount,

    /// Lifecycle status (by wire string).
    Status,
}

impl SortField {
    /// Returns the backing column name.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::NetAmount => "net_amount_cents",
            SortField::Status => "status",
        }
    }
}

/// Sort direction for an order listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,

    /// Newest/largest first (the default).
    #[default]
    Desc,
}

impl SortDirection {
    /// Returns the SQL keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Filter criteria for order listings and counts.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Filter by lifecycle status.
    pub status: Option<OrderStatus>,

    /// Filter by owning user.
    pub user: Option<UserId>,

    /// Filter by orders created at or after this instant.
    pub created_from: Option<DateTime<Utc>>,

    /// Filter by orders created at or before this instant.
    pub created_to: Option<DateTime<Utc>>,
}

impl OrderFilter {
    /// Creates an empty filter matching every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `status`, `user`, and the creation window all match.
    pub fn matches(
        &self,
        status: OrderStatus,
        user: UserId,
        created_at: DateTime<Utc>,
    ) -> bool {
        if let Some(want) = self.status
            && status != want
        {
            return false;
        }
        if let Some(want) = self.user
            && user != want
        {
            return false;
        }
        if let Some(from) = self.created_from
            && created_at < from
        {
            return false;
        }
        if let Some(to) = self.created_to
            && created_at > to
        {
            return false;
        }
        true
    }
}

/// Builder for order listing queries.
///
/// Combines a filter with a sort order and a skip/limit window. The
/// default sort is creation time, newest first.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    /// Filter criteria.
    pub filter: OrderFilter,

    /// Field to sort by.
    pub sort_by: SortField,

    /// Sort direction.
    pub sort_dir: SortDirection,

    /// Number of orders to skip.
    pub skip: Option<usize>,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,
}

impl OrderQuery {
    /// Creates a new query with the default sort and no window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for a specific user's orders.
    pub fn for_user(user: UserId) -> Self {
        Self {
            filter: OrderFilter {
                user: Some(user),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Filters by status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.filter.status = Some(status);
        self
    }

    /// Filters by owning user.
    pub fn user(mut self, user: UserId) -> Self {
        self.filter.user = Some(user);
        self
    }

    /// Filters to orders created at or after this instant.
    pub fn created_from(mut self, instant: DateTime<Utc>) -> Self {
        self.filter.created_from = Some(instant);
        self
    }

    /// Filters to orders created at or before this instant.
    pub fn created_to(mut self, instant: DateTime<Utc>) -> Self {
        self.filter.created_to = Some(instant);
        self
    }

    /// Sorts by the given field.
    pub fn sort_by(mut self, field: SortField) -> Self {
        self.sort_by = field;
        self
    }

    /// Sets the sort direction.
    pub fn sort_dir(mut self, dir: SortDirection) -> Self {
        self.sort_dir = dir;
        self
    }

    /// Skips this many orders before returning results.
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Limits the number of orders returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Aggregated sales over a period.
///
/// Zero-valued when no completed orders fall inside the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SalesSummary {
    /// Sum of the net amounts of completed orders.
    pub total_sales: Money,

    /// Number of completed orders.
    pub total_orders: u64,
}
