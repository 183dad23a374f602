use clap::Parser;

use gdsp_config::{ModelConfig, toml_config};
use gdsp_core::debug;
use gdsp_model::GoldenModel;
use gdsp_vectors::DirSink;

/// Load configuration file
fn load_config_from_toml(cfg_path: &str) -> ModelConfig {
    match toml_config::from_file(cfg_path) {
        Ok(c) => c,
        Err(e) => {
            println!("Failed to load configuration from {}: {}", cfg_path, e);
            std::process::exit(1);
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "G-DSP 16-QAM golden model",
    long_about = "Runs the bit-true 16-QAM transmit/receive model and writes hardware test vectors"
)]
struct Args {
    /// Config file (required)
    #[arg(help = "TOML config with model, fixed-point, channel and receiver parameters")]
    config: String,

    /// Override output.vector_dir
    #[arg(long)]
    out_dir: Option<String>,

    /// Run the model without writing any vectors
    #[arg(long)]
    no_export: bool,
}

fn main() {
    eprintln!("G-DSP golden model {}", env!("CARGO_PKG_VERSION"));
    eprintln!(" -> 16-QAM, RRC pulse shaping, Costas carrier recovery\n");

    let args = Args::parse();
    let mut cfg = load_config_from_toml(&args.config);
    let _log_guard = debug::setup_logging_default(cfg.debug_log.clone());

    if let Some(dir) = args.out_dir {
        cfg.output.vector_dir = dir;
    }
    if args.no_export {
        cfg.output.export = false;
    }

    let model = match GoldenModel::new(cfg) {
        Ok(m) => m,
        Err(e) => {
            println!("{}", e);
            std::process::exit(1);
        }
    };

    let vector_dir = model.config().output.vector_dir.clone();
    let result = if model.config().output.export {
        DirSink::new(&vector_dir).map_err(Into::into).and_then(|sink| model.run(sink))
    } else {
        model.evaluate()
    };

    match result {
        Ok(report) => {
            if !report.exported.is_empty() {
                eprintln!(" -> {} records written to {}", report.exported.len(), vector_dir);
            }
            println!("{}", report);
        }
        Err(e) => {
            tracing::error!("golden model run failed: {}", e);
            println!("Golden model run failed: {}", e);
            std::process::exit(1);
        }
    }
}
