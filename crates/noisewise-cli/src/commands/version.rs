//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - noise-aware error mitigation and qubit layout",
        style("noisewise").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  noisewise-zne     Zero-noise extrapolation fits");
    println!("  noisewise-layout  Zigzag layout selection on coupling graphs");
    println!("  noisewise-cli     Command-line interface");
    println!();
    println!("License: {}", style("Apache-2.0").dim());
}
