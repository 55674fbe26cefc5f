//! pathcache CLI - inspect multipath forwarding paths.

use clap::Parser;
use colored::Colorize;

use pathcache::cli::*;
use pathcache::config::{init_logging, Config};
use pathcache::error::Result;
use pathcache::path::{ForwardingPath, Path};
use pathcache::types::IsdAsn;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if let Some(ref path) = cli.config {
        Config::load(path)?
    } else if Config::default_path().exists() {
        Config::load(Config::default_path())?
    } else {
        Config::default()
    };

    init_logging(&cli.logging(&config.logging))?;

    if cli.no_color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Decode(args) => run_decode(&args, cli.format),
        Commands::Reverse(args) => run_reverse(&args, cli.format),
        Commands::Config(args) => run_config(&args),
    }
}

/// Decode a raw path and print its hops, interfaces and fingerprint.
fn run_decode(args: &DecodeArgs, format: OutputFormat) -> Result<()> {
    let raw = parse_hex(&args.raw)?;
    let forwarding = ForwardingPath::from_raw(args.path_type, &raw)?;
    let path = Path::new(IsdAsn::UNSPECIFIED, IsdAsn::UNSPECIFIED, forwarding, None)?;
    let interfaces = path.interfaces()?;

    match format {
        OutputFormat::Json => {
            let hops: Vec<_> = path
                .forwarding
                .decoded()
                .map(|d| {
                    d.hop_interfaces()
                        .iter()
                        .map(|h| serde_json::json!({ "ingress": h.ingress.0, "egress": h.egress.0 }))
                        .collect()
                })
                .unwrap_or_default();
            let out = serde_json::json!({
                "path_type": path.forwarding.path_type(),
                "interfaces": interfaces.iter().map(|i| i.0).collect::<Vec<_>>(),
                "hops": hops,
                "fingerprint": path.fingerprint().as_str(),
                "expiry": path.expiry().map(|e| humantime::format_rfc3339_seconds(e).to_string()),
            });
            println!("{out:#}");
        }
        OutputFormat::Text => {
            println!("{} {}", "Path:".bold(), path.forwarding);
            if let Ok(decoded) = path.forwarding.decoded() {
                for (i, (info, hops)) in decoded.segments().enumerate() {
                    println!(
                        "  {} {} ({} hops, seg id {:#06x}{})",
                        "segment".cyan(),
                        i,
                        hops.len(),
                        info.seg_id,
                        if info.cons_dir { ", cons dir" } else { "" }
                    );
                    for hop in hops {
                        let ifaces = hop.interfaces(info.cons_dir);
                        println!("    {} -> {}", ifaces.ingress, ifaces.egress);
                    }
                }
            }
            let rendered: Vec<String> = interfaces.iter().map(ToString::to_string).collect();
            println!("{} [{}]", "Interfaces:".bold(), rendered.join(", "));
            println!("{} {}", "Fingerprint:".bold(), path.fingerprint().as_str().green());
            if let Some(expiry) = path.expiry() {
                println!("{} {}", "Expiry:".bold(), humantime::format_rfc3339_seconds(expiry));
            }
        }
    }

    Ok(())
}

/// Reverse a raw path and print the result as hex.
fn run_reverse(args: &ReverseArgs, format: OutputFormat) -> Result<()> {
    let raw = parse_hex(&args.raw)?;
    let reversed = ForwardingPath::from_raw(1, &raw)?.reverse()?;

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "raw": hex::encode(reversed.raw()),
                "path": reversed.to_string(),
            });
            println!("{out:#}");
        }
        OutputFormat::Text => {
            println!("{}", hex::encode(reversed.raw()));
            println!("{} {}", "Path:".bold(), reversed);
        }
    }

    Ok(())
}

/// Print or write the example configuration.
fn run_config(args: &ConfigArgs) -> Result<()> {
    let example = Config::example();
    if let Some(ref output) = args.output {
        example.save(output)?;
        println!("{} {}", "Wrote".green(), output.display());
    } else {
        let content = toml::to_string_pretty(&example)
            .map_err(|e| pathcache::Error::Config(format!("Failed to serialize config: {e}")))?;
        println!("{content}");
    }
    Ok(())
}
