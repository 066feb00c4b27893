pub mod fake_directory;
pub mod mock_peer;

pub use fake_directory::FakeDirectoryClient;
pub use mock_peer::MockPeerServer;
