//! CLI command integration tests, one module per subcommand.

pub mod analyze_tests;
pub mod baseline_tests;
pub mod init_tests;
pub mod instrument_tests;
pub mod select_tests;
