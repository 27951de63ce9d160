// Domain models (wire types from the channel backend, plus view projections)

mod channel;
mod envelope;
mod stats;
mod view;

pub use channel::{ChannelId, ChannelRecord, ChannelStatus};
pub use envelope::Envelope;
pub use stats::{AggregateStats, CategoryCounts};
pub use view::{
    ALL, CategoryFilter, CategoryUptime, DashboardView, HealthGrade, ProjectedView, StatsSummary,
    StatusFilter, UnknownStatusFilter, ViewState,
};
