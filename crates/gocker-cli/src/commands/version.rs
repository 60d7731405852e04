//! `gocker version`: print version information.

use gocker_common::constants;

/// Executes the `version` command.
pub fn execute() {
    println!("{} v{}", constants::APP_NAME, constants::VERSION);
    if !constants::BUILD_DATE.is_empty() {
        println!("built {}", constants::BUILD_DATE);
    }
}
