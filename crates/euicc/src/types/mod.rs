//! Data types exchanged with the card and the SM-DP+

mod identifier;
mod notification;
mod profile;

pub use identifier::{
    Eid, Iccid, Identifier, Imei, IsdpAid, TransactionId, decode_bcd, encode_bcd,
};
pub use notification::{NotificationEvent, NotificationMetadata, PendingNotification};
pub use profile::{
    IconType, NotificationConfiguration, OperatorId, ProfileClass, ProfileInfo, ProfileState,
};
