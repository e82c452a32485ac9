pub mod rpc;
pub mod wallet;
pub mod program;

pub use rpc::SolanaClient;
pub use wallet::{WalletConnection, WalletManager};
pub use program::ProgramAddresses;
