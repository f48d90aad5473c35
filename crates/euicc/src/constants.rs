//! Identifiers, defaults and tags used by SGP.22 functions

/// AID of the GSMA ISD-R application
pub const ISD_R_AID: [u8; 16] = [
    0xA0, 0x00, 0x00, 0x05, 0x59, 0x10, 0x10, 0xFF, 0xFF, 0xFF, 0xFF, 0x89, 0x00, 0x00, 0x01, 0x00,
];

/// Default maximum segment size for STORE DATA
pub const DEFAULT_MSS: usize = 254;

/// Largest accepted maximum segment size
pub const MAX_MSS: usize = 254;

/// Default RSP admin protocol version
pub const DEFAULT_ADMIN_PROTOCOL_VERSION: &str = "2.2.2";

/// ES9+ function paths on the SM-DP+
pub mod es9 {
    /// ES9+.InitiateAuthentication
    pub const INITIATE_AUTHENTICATION: &str = "/gsma/rsp2/es9plus/initiateAuthentication";
    /// ES9+.AuthenticateClient
    pub const AUTHENTICATE_CLIENT: &str = "/gsma/rsp2/es9plus/authenticateClient";
    /// ES9+.GetBoundProfilePackage
    pub const GET_BOUND_PROFILE_PACKAGE: &str = "/gsma/rsp2/es9plus/getBoundProfilePackage";
    /// ES9+.HandleNotification
    pub const HANDLE_NOTIFICATION: &str = "/gsma/rsp2/es9plus/handleNotification";
    /// ES9+.CancelSession
    pub const CANCEL_SESSION: &str = "/gsma/rsp2/es9plus/cancelSession";
}

/// ES11 function paths on the SM-DS
pub mod es11 {
    /// ES11.AuthenticateClient
    pub const AUTHENTICATE_CLIENT: &str = "/gsma/rsp2/es11/authenticateClient";
}

/// BER-TLV tags of SGP.22 data objects
pub mod tags {
    use nexum_bertlv::{Class, Tag};

    //
    // ES10a functions
    //
    /// GetEuiccConfiguredAddresses (`BF3C`)
    pub const EUICC_CONFIGURED_ADDRESSES: Tag = Class::ContextSpecific.constructed(60);
    /// SetDefaultDpAddress (`BF3F`)
    pub const SET_DEFAULT_DP_ADDRESS: Tag = Class::ContextSpecific.constructed(63);

    //
    // ES10b functions
    //
    /// GetEuiccChallenge (`BF2E`)
    pub const GET_EUICC_CHALLENGE: Tag = Class::ContextSpecific.constructed(46);
    /// GetEuiccInfo1 (`BF20`)
    pub const GET_EUICC_INFO1: Tag = Class::ContextSpecific.constructed(32);
    /// GetEuiccInfo2 (`BF22`)
    pub const GET_EUICC_INFO2: Tag = Class::ContextSpecific.constructed(34);
    /// AuthenticateServer (`BF38`)
    pub const AUTHENTICATE_SERVER: Tag = Class::ContextSpecific.constructed(56);
    /// PrepareDownload (`BF21`)
    pub const PREPARE_DOWNLOAD: Tag = Class::ContextSpecific.constructed(33);
    /// CancelSession (`BF41`)
    pub const CANCEL_SESSION: Tag = Class::ContextSpecific.constructed(65);
    /// ListNotification (`BF28`)
    pub const LIST_NOTIFICATION: Tag = Class::ContextSpecific.constructed(40);
    /// RetrieveNotificationsList (`BF2B`)
    pub const RETRIEVE_NOTIFICATIONS_LIST: Tag = Class::ContextSpecific.constructed(43);
    /// NotificationSent, removing a notification from the list (`BF30`)
    pub const REMOVE_NOTIFICATION: Tag = Class::ContextSpecific.constructed(48);

    //
    // Bound profile package
    //
    /// BoundProfilePackage (`BF36`)
    pub const BOUND_PROFILE_PACKAGE: Tag = Class::ContextSpecific.constructed(54);
    /// InitialiseSecureChannelRequest (`BF23`)
    pub const INITIALISE_SECURE_CHANNEL: Tag = Class::ContextSpecific.constructed(35);
    /// firstSequenceOf87 (`A0`)
    pub const FIRST_SEQUENCE_OF_87: Tag = Class::ContextSpecific.constructed(0);
    /// sequenceOf88 (`A1`)
    pub const SEQUENCE_OF_88: Tag = Class::ContextSpecific.constructed(1);
    /// secondSequenceOf87 (`A2`)
    pub const SECOND_SEQUENCE_OF_87: Tag = Class::ContextSpecific.constructed(2);
    /// sequenceOf86 (`A3`)
    pub const SEQUENCE_OF_86: Tag = Class::ContextSpecific.constructed(3);
    /// ProfileInstallationResult (`BF37`)
    pub const PROFILE_INSTALLATION_RESULT: Tag = Class::ContextSpecific.constructed(55);
    /// ProfileInstallationResultData (`BF27`)
    pub const PROFILE_INSTALLATION_RESULT_DATA: Tag = Class::ContextSpecific.constructed(39);
    /// NotificationMetadata (`BF2F`)
    pub const NOTIFICATION_METADATA: Tag = Class::ContextSpecific.constructed(47);

    //
    // ES10c functions
    //
    /// ProfileInfoListRequest (`BF2D`)
    pub const PROFILE_INFO_LIST: Tag = Class::ContextSpecific.constructed(45);
    /// EnableProfile (`BF31`)
    pub const ENABLE_PROFILE: Tag = Class::ContextSpecific.constructed(49);
    /// DisableProfile (`BF32`)
    pub const DISABLE_PROFILE: Tag = Class::ContextSpecific.constructed(50);
    /// DeleteProfile (`BF33`)
    pub const DELETE_PROFILE: Tag = Class::ContextSpecific.constructed(51);
    /// EuiccMemoryReset (`BF34`)
    pub const EUICC_MEMORY_RESET: Tag = Class::ContextSpecific.constructed(52);
    /// GetEuiccData (`BF3E`)
    pub const GET_EUICC_DATA: Tag = Class::ContextSpecific.constructed(62);
    /// SetNickname (`BF29`)
    pub const SET_NICKNAME: Tag = Class::ContextSpecific.constructed(41);

    //
    // Profile information
    //
    /// ProfileInfo (`E3`)
    pub const PROFILE_INFO: Tag = Class::Private.constructed(3);
    /// StoreMetadataRequest, the profile metadata offered by the SM-DP+ (`BF25`)
    pub const STORE_METADATA: Tag = Class::ContextSpecific.constructed(37);
    /// ICCID, also used for the EID (`5A`)
    pub const ICCID: Tag = Class::Application.primitive(26);
    /// ISD-P AID (`4F`)
    pub const ISDP_AID: Tag = Class::Application.primitive(15);
    /// Tag list (`5C`)
    pub const TAG_LIST: Tag = Class::Application.primitive(28);
    /// Profile state (`9F70`)
    pub const PROFILE_STATE: Tag = Class::ContextSpecific.primitive(112);
    /// Profile nickname (`90`)
    pub const PROFILE_NICKNAME: Tag = Class::ContextSpecific.primitive(16);
    /// Service provider name (`91`)
    pub const SERVICE_PROVIDER_NAME: Tag = Class::ContextSpecific.primitive(17);
    /// Profile name (`92`)
    pub const PROFILE_NAME: Tag = Class::ContextSpecific.primitive(18);
    /// Icon type (`93`)
    pub const ICON_TYPE: Tag = Class::ContextSpecific.primitive(19);
    /// Icon (`94`)
    pub const ICON: Tag = Class::ContextSpecific.primitive(20);
    /// Profile class (`95`)
    pub const PROFILE_CLASS: Tag = Class::ContextSpecific.primitive(21);
    /// Notification configuration info (`B6`)
    pub const NOTIFICATION_CONFIGURATION_INFO: Tag = Class::ContextSpecific.constructed(22);
    /// Profile owner (`B7`)
    pub const PROFILE_OWNER: Tag = Class::ContextSpecific.constructed(23);

    //
    // Universal types
    //
    /// BOOLEAN (`01`), carries `ccRequiredFlag` inside `smdpSigned2`
    pub const BOOLEAN: Tag = Class::Universal.primitive(1);
    /// INTEGER (`02`)
    pub const INTEGER: Tag = Class::Universal.primitive(2);
    /// OCTET STRING (`04`), carries the hashed confirmation code
    pub const OCTET_STRING: Tag = Class::Universal.primitive(4);
    /// UTF8String (`0C`)
    pub const UTF8_STRING: Tag = Class::Universal.primitive(12);
    /// SEQUENCE (`30`)
    pub const SEQUENCE: Tag = Class::Universal.constructed(16);

    //
    // Context-specific fields
    //
    /// `[0]` primitive (`80`)
    pub const CTX_0: Tag = Class::ContextSpecific.primitive(0);
    /// `[1]` primitive (`81`)
    pub const CTX_1: Tag = Class::ContextSpecific.primitive(1);
    /// `[2]` primitive (`82`)
    pub const CTX_2: Tag = Class::ContextSpecific.primitive(2);
    /// `[0]` constructed (`A0`)
    pub const CTX_CONSTRUCTED_0: Tag = Class::ContextSpecific.constructed(0);
    /// `[1]` constructed (`A1`)
    pub const CTX_CONSTRUCTED_1: Tag = Class::ContextSpecific.constructed(1);
    /// `[2]` constructed (`A2`)
    pub const CTX_CONSTRUCTED_2: Tag = Class::ContextSpecific.constructed(2);
}
