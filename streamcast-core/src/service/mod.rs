pub mod dispatcher;
pub mod guide_sweeper;
pub mod resolver;
pub mod stream_paths;
pub mod targets;

pub use dispatcher::{CastDispatcher, CastState, DispatchOutcome, MEDIA_CONTENT_TYPE};
pub use guide_sweeper::{GuideSweeper, SweepReport};
pub use resolver::StreamResolver;
pub use stream_paths::{PathChange, StreamPathRegistry};
pub use targets::CastTargetService;
