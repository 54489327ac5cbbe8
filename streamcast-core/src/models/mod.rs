pub mod camera;
pub mod guide;
pub mod id;
pub mod kiosk;
pub mod server;
pub mod target;

pub use camera::{
    camera_path_name, Camera, CameraCredentials, RegisteredStream, StreamReadiness, StreamUrls,
    TranscodePath,
};
pub use guide::{normalize_epg, Category, Channel, EpgEntry, GuideSnapshot};
pub use id::{CameraId, ChannelId, KioskId, ServerId, UserId};
pub use kiosk::{Kiosk, KioskCommand, KioskCommandType, KioskFeatures};
pub use server::{HubConnection, LiveTvServer};
pub use target::{
    ensure_castable, kind_supports, CameraRef, Capability, CastRequest, CastTarget, ContentType,
    MultiviewItem, TargetKind,
};
