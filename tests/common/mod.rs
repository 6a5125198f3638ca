pub mod comparison;
pub mod detection;
pub mod script_gen;

// Re-export commonly used items
pub use comparison::{assert_matches_core, read_sequence};
pub use detection::check_datamosh_available;
pub use script_gen::{ClipContentType, FilterParams, TestClipConfig, generate_script};

/// Macro to require the Datamosh plugin and fail the test if it is not loaded
/// Use this at the start of each e2e test
#[macro_export]
macro_rules! require_datamosh {
    () => {
        if let Err(e) = $crate::common::check_datamosh_available() {
            panic!("Test failed: {:#}", e);
        }
    };
}
