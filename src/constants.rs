/// Application constants

pub const API_VERSION: &str = "v1";

// Contracts (Base mainnet)
pub const DEFAULT_BASENAME_L2_RESOLVER: &str = "0xC6d566A56A1aFf6508b41f6c90ff131615583BCD";
pub const BASENAME_SUFFIX: &str = ".base.eth";
pub const ENS_SUFFIX: &str = ".eth";

// External services
pub const DEFAULT_FARCASTER_API_URL: &str = "https://api.neynar.com";
pub const DEFAULT_PINATA_API_URL: &str = "https://api.pinata.cloud";
pub const DEFAULT_IPFS_GATEWAY_URL: &str = "https://gateway.pinata.cloud";

// Recipient resolution
pub const RESOLVER_CACHE_TTL_SECS: u64 = 300; // 5 minutes
pub const RESOLVER_CACHE_MAX_ENTRIES: usize = 10_000;
pub const RESOLVER_DEBOUNCE_MS: u64 = 500;
pub const L2_RESOLVER_TIMEOUT_SECS: u64 = 30;
pub const L2_RESOLVER_RETRY_COUNT: u32 = 3;
pub const L2_RESOLVER_RETRY_BASE_MS: u64 = 150;

// Minting
pub const MINT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Card activity
pub const PLACEHOLDER_CARD_IMAGE: &str = "/images/card-placeholder.png";
pub const DEFAULT_CARD_TITLE: &str = "Greeting Card";
pub const METADATA_FETCH_TIMEOUT_SECS: u64 = 8;

// Uploads
pub const MAX_CARD_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

// Notifications
pub const NOTIFICATION_KEY_PREFIX: &str = "cardcast:notification";
pub const NOTIFICATION_TITLE_MAX_CHARS: usize = 32;
pub const NOTIFICATION_BODY_MAX_CHARS: usize = 128;

// WebSocket
pub const WS_HEARTBEAT_INTERVAL_SECS: u64 = 30;
pub const WS_CLIENT_TIMEOUT_SECS: u64 = 120;
