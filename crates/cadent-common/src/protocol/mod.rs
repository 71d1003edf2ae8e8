pub mod error;
pub mod requests;
pub mod responses;


pub use error::{CadentError, Result};
pub use requests::{MaxPoints, MetricsRequest, PathsRequest, QueryParams, MAX_POINTS};
pub use responses::{
    CacheState, DataPoint, PathEntry, RenderEnvelope, RenderSeries, SeriesPoint, TimeInfo,
};
