//! Version command - show version information

use anyhow::Result;

use crate::cli::args::VersionArgs;

/// Execute the version command
pub async fn execute(args: VersionArgs) -> Result<()> {
    print_version(args.verbose);
    Ok(())
}

/// Print version information
///
/// If verbose is false, prints a single line with name and version.
/// If verbose is true, prints build and platform details.
pub fn print_version(verbose: bool) {
    println!("{} {}", crate::NAME, crate::VERSION);

    if verbose {
        println!();
        println!("Service host:");
        if cfg!(windows) {
            println!("  Mode:      Windows Service Control Manager");
        } else {
            println!("  Mode:      foreground (no service manager integration)");
        }
        println!();
        println!("Build info:");
        println!("  Target:    {}", env!("BUILD_TARGET"));
        println!("  OS:        {}", std::env::consts::OS);
        println!("  Rust:      {}", env!("RUSTC_VERSION"));
        if let Ok(exe) = std::env::current_exe() {
            println!("  Executable: {}", exe.display());
        }
        println!();
        println!("License:    MIT");
    }
}
