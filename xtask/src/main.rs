use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for fbscene")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Run cargo deny check
    Deny,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// List render nodes, framebuffers and keyboards on this machine
    Devices,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            cargo("fmt check", &["fmt", "--all", "--", "--check"])?;
            run_clippy()?;
            cargo("test", &["test", "--workspace"])?;
            cargo("doc", &["doc", "--workspace", "--no-deps"])?;
        }
        Commands::Fmt => cargo("fmt check", &["fmt", "--all", "--", "--check"])?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => cargo("test", &["test", "--workspace"])?,
        Commands::Deny => cargo("deny check", &["deny", "check", "licenses", "bans", "sources"])?,
        Commands::Doc => cargo("doc", &["doc", "--workspace", "--no-deps"])?,
        Commands::Build => cargo("build", &["build", "--workspace"])?,
        Commands::Devices => list_devices()?,
    }

    Ok(())
}

fn cargo(what: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {what} failed");
    }
    Ok(())
}

fn run_clippy() -> Result<()> {
    cargo(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn list_devices() -> Result<()> {
    println!("Render nodes (--dri-dir):");
    for path in matching_entries(Path::new("/dev/dri"), "renderD") {
        println!("  {path}");
    }

    println!("Framebuffers (--framebuffer):");
    for path in matching_entries(Path::new("/dev"), "fb") {
        let name = path.trim_start_matches("/dev/");
        let id = std::fs::read_to_string(format!("/sys/class/graphics/{name}/name"))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        println!("  {path}  {id}");
    }

    println!("Keyboards (INPUT_DEVICE):");
    let devices = std::fs::read_to_string("/proc/bus/input/devices")
        .context("reading /proc/bus/input/devices")?;
    for kb in keyboards(&devices) {
        println!("  /dev/input/{}  {}", kb.event, kb.name);
    }
    Ok(())
}

/// Sorted `dir/<prefix>*` paths; an unreadable directory yields nothing.
fn matching_entries(dir: &Path, prefix: &str) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            name.starts_with(prefix) && name[prefix.len()..].chars().all(|c| c.is_ascii_digit())
        })
        .map(|e| e.path().display().to_string())
        .collect();
    paths.sort();
    paths
}

#[derive(Debug, PartialEq)]
struct KeyboardEntry {
    name: String,
    event: String,
}

/// Devices from `/proc/bus/input/devices` that have a `kbd` handler and
/// report key repeat (`EV_REP`), which filters out power buttons and the like.
fn keyboards(devices: &str) -> Vec<KeyboardEntry> {
    const EV_REP: u64 = 1 << 0x14;

    devices
        .split("\n\n")
        .filter_map(|block| {
            let mut name = None;
            let mut handlers = "";
            let mut ev = 0u64;
            for line in block.lines() {
                if let Some(n) = line.strip_prefix("N: Name=") {
                    name = Some(n.trim_matches('"').to_string());
                } else if let Some(h) = line.strip_prefix("H: Handlers=") {
                    handlers = h;
                } else if let Some(bits) = line.strip_prefix("B: EV=") {
                    ev = u64::from_str_radix(bits.trim(), 16).unwrap_or(0);
                }
            }
            let mut words = handlers.split_whitespace();
            if !words.clone().any(|w| w == "kbd") || ev & EV_REP == 0 {
                return None;
            }
            let event = words.find(|w| w.starts_with("event"))?.to_string();
            Some(KeyboardEntry {
                name: name.unwrap_or_default(),
                event,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICES: &str = r#"I: Bus=0019 Vendor=0000 Product=0001 Version=0000
N: Name="Power Button"
P: Phys=LNXPWRBN/button/input0
H: Handlers=kbd event0
B: PROP=0
B: EV=3
B: KEY=10000000000000 0

I: Bus=0011 Vendor=0001 Product=0001 Version=ab41
N: Name="AT Translated Set 2 keyboard"
P: Phys=isa0060/serio0/input0
H: Handlers=sysrq kbd event3 leds
B: PROP=0
B: EV=120013
B: KEY=402000000 3803078f800d001 feffffdfffefffff fffffffffffffffe

I: Bus=0011 Vendor=0002 Product=0001 Version=0000
N: Name="PS/2 Generic Mouse"
H: Handlers=mouse0 event4
B: EV=7
"#;

    #[test]
    fn finds_repeating_keyboards_only() {
        assert_eq!(
            keyboards(DEVICES),
            vec![KeyboardEntry {
                name: "AT Translated Set 2 keyboard".into(),
                event: "event3".into(),
            }]
        );
    }

    #[test]
    fn empty_listing() {
        assert!(keyboards("").is_empty());
    }
}
