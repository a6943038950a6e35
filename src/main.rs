use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use tracing::info;

use bean_decorator::config::{DecoratorConfig, YamlConfig};
use bean_decorator::decorator::{ResolveOptions, TextureTree, resolve_method_texture};
use bean_decorator::plugin::{DefaultNameResolver, GadgetType, NameRef, NameResolver};

/// Bean decorator - inspect interception textures
#[derive(Parser, Debug)]
#[command(name = "bean-decorator")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a YAML configuration file
    Check {
        /// Path to configuration file (YAML)
        file: PathBuf,
    },

    /// Print the effective texture of one method
    Inspect {
        /// Path to configuration file (YAML)
        file: PathBuf,

        /// Plugin package name or code
        #[arg(long)]
        plugin: String,

        /// Bridge package name or code (inspects a dialect)
        #[arg(long, conflicts_with = "gadget_type")]
        bridge: Option<String>,

        /// Gadget type: services, triggers or routines (inspects a gadget)
        #[arg(long = "type", value_name = "GADGET_TYPE")]
        gadget_type: Option<GadgetType>,

        /// Gadget or dialect name
        #[arg(long)]
        name: String,

        /// Method path, dotted for nested members (e.g. "db.query")
        #[arg(long)]
        method: String,
    },
}

fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { file } => check(&file),
        Commands::Inspect {
            file,
            plugin,
            bridge,
            gadget_type,
            name,
            method,
        } => inspect(&file, &plugin, bridge.as_deref(), gadget_type, &name, &method),
    }
}

fn load(file: &PathBuf) -> anyhow::Result<(DecoratorConfig, TextureTree)> {
    info!("Loading configuration from {}", file.display());
    let yaml = YamlConfig::from_file(file).map_err(|e| anyhow!(e.to_string()))?;
    let textures = yaml.textures.clone().unwrap_or_default();
    let config = DecoratorConfig::from_yaml(yaml).map_err(|e| anyhow!(e.to_string()))?;
    Ok((config, textures))
}

fn check(file: &PathBuf) -> anyhow::Result<()> {
    let (config, textures) = load(file)?;

    println!("Configuration OK: {}", file.display());
    println!("  bridge decoration:   {}", config.bridge_enabled);
    println!("  gadget decoration:   {}", config.gadget_enabled);
    println!("  precise threshold:   {}", config.precise_threshold);
    println!("  use default texture: {}", config.use_default_texture);
    println!("  support all methods: {}", config.support_all_methods);
    if let Some(stream_id) = &config.app.stream_id {
        println!("  stream id:           {}", stream_id);
    }
    println!("  bean textures:       {}", textures.len());
    Ok(())
}

fn inspect(
    file: &PathBuf,
    plugin: &str,
    bridge: Option<&str>,
    gadget_type: Option<GadgetType>,
    name: &str,
    method: &str,
) -> anyhow::Result<()> {
    let (config, textures) = load(file)?;
    let names = DefaultNameResolver;
    let plugin_code = names.plugin_code(&NameRef::name(plugin));

    let (object_name, bean) = match (bridge, gadget_type) {
        (Some(bridge), _) => {
            let bridge_code = names.bridge_code(&NameRef::name(bridge));
            (
                format!("{}/{}/{}", bridge_code, plugin_code, name),
                textures.dialect(&bridge_code, &plugin_code, name),
            )
        }
        (None, Some(gadget_type)) => (
            format!("{}/{}/{}", plugin_code, gadget_type, name),
            textures.gadget(&plugin_code, gadget_type, name),
        ),
        (None, None) => anyhow::bail!("Either --bridge or --type must be given"),
    };

    let bean = bean.with_context(|| format!("No texture configured for {}", object_name))?;

    let mut path: Vec<String> = method.split('.').map(str::to_string).collect();
    let method_name = path.pop().unwrap_or_default();
    let options = ResolveOptions {
        use_default_texture: config.use_default_texture,
        stream_aware: config.app.stream_id.is_some(),
    };

    match resolve_method_texture(bean, &path, &method_name, &options) {
        Some(texture) => {
            println!("{}.{}:", object_name, method);
            println!("{}", serde_json::to_string_pretty(&texture)?);
        }
        None => println!("{}.{}: not intercepted", object_name, method),
    }
    Ok(())
}
