mod query;

pub use query::{QueryContext, QueryStage, ZonalSettings, ZonalStrategy};
