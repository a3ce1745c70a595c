pub mod basename;
pub mod farcaster;
pub mod mint;
pub mod pinata;

pub use basename::BasenameApiClient;
pub use farcaster::FarcasterClient;
pub use mint::MintClient;
pub use pinata::PinataClient;
