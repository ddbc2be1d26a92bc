use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use khomp_lora::util::hex::decode_hex;
use khomp_lora::{
    decode_uplink, init_logger_with_default, log_info, DeviceManager, Family, UplinkInput,
    UplinkOutput,
};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "khomp-lora")]
#[command(about = "Decode Khomp LoRaWAN uplink payloads")]
struct Cli {
    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a hex payload
    Decode {
        /// Payload bytes as hex, e.g. "01 00 01"
        hex: String,
        /// Device family or model, e.g. nit2xli or "ITC 201"
        #[arg(short, long, required_unless_present_all = ["registry", "device"])]
        family: Option<String>,
        #[arg(short, long)]
        port: u8,
        /// Receive time in epoch milliseconds
        #[arg(long)]
        recv_time: Option<i64>,
        /// Device registry JSON file
        #[arg(long, requires = "device")]
        registry: Option<PathBuf>,
        /// Device identifier looked up in the registry
        #[arg(long, requires = "registry")]
        device: Option<String>,
    },
    /// Decode a host input document `{bytes, fPort, recvTime?}` from a file or stdin
    DecodeJson {
        #[arg(short, long)]
        family: String,
        /// Input file; stdin when omitted
        input: Option<PathBuf>,
    },
    /// List supported families and their fPorts
    Families,
}

fn print_output(output: &UplinkOutput) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

fn read_input(path: Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut json = String::new();
            std::io::stdin()
                .read_to_string(&mut json)
                .context("reading stdin")?;
            Ok(json)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger_with_default(&cli.log_level);

    match cli.command {
        Commands::Decode {
            hex,
            family,
            port,
            recv_time,
            registry,
            device,
        } => {
            let bytes = decode_hex(&hex)?;
            let input = UplinkInput {
                bytes,
                f_port: port,
                recv_time,
            };
            let output = match (registry, device, family) {
                (Some(registry), Some(device), _) => {
                    let manager = DeviceManager::load_registry(&registry)?;
                    log_info(&format!(
                        "Loaded {} device(s) from {}",
                        manager.device_count(),
                        registry.display()
                    ));
                    manager.decode_uplink(&device, &input)
                }
                (_, _, Some(family)) => decode_uplink(Family::from_name(&family)?, &input),
                _ => bail!("either --family or --registry with --device is required"),
            };
            print_output(&output)?;
        }
        Commands::DecodeJson { family, input } => {
            let json = read_input(input)?;
            let input: UplinkInput =
                serde_json::from_str(&json).context("parsing uplink input")?;
            let output = decode_uplink(Family::from_name(&family)?, &input);
            print_output(&output)?;
        }
        Commands::Families => {
            for family in Family::ALL {
                let ports: Vec<String> = family
                    .decoder()
                    .ports()
                    .iter()
                    .map(|p| p.to_string())
                    .collect();
                println!("{:<8} fPorts {}", family.name(), ports.join(", "));
            }
        }
    }

    Ok(())
}
