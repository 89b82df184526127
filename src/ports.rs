pub mod platform;
pub mod push;
pub mod time;

pub use platform::{
    GatewayClient, GatewayError, Permission, PermissionRequester, PushManager, Registration,
    SubscribeOptions,
};
pub use push::{DeliveryError, PushSender};
pub use time::{TimeProvider, with_deadline};
