/// Re-export `Config` from `stagelytics-core` for use within this crate.
///
/// Environment parsing lives in the core crate so integration tests can build
/// a configuration without going through the server.
pub use stagelytics_core::config::Config;
