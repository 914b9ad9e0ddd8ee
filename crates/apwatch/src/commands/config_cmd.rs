//! `config path | show | init`.

use apwatch_config::{config_path, load_config, save_config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config_path().display().to_string());
            Ok(())
        }

        ConfigCommand::Show => {
            let config = load_config()?;
            let out = match global.output {
                OutputFormat::Table => toml::to_string_pretty(&config)?,
                format => output::render_single(format, &config, |_| String::new())?,
            };
            output::print_output(out.trim_end());
            Ok(())
        }

        ConfigCommand::Init => {
            let config = load_config()?;
            let path = save_config(&config)?;
            eprintln!("Configuration written to {}", path.display());
            Ok(())
        }
    }
}
