//! Output surface: chart lines and the recent-periods table.

pub mod chart;
pub mod table;

pub use chart::{ChartData, ChartLine};
pub use table::{RecentTable, TableRow, RECENT_PERIODS};
