use clap::Parser;

pub const DEFAULT_CLIENT_NAME: &str = "silentjack";

/// Silence/dead air detector.
///
/// Watches a single audio input and runs COMMAND when the signal stays
/// silent, or stays flat, for long enough. A COMMAND of `exit` makes the
/// detector itself exit successfully instead.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// Connect to this input (repeatable)
    #[arg(short = 'c', long = "connect", value_name = "PORT")]
    pub connect: Vec<String>,

    /// Name of this client
    #[arg(short = 'n', long = "name", default_value = DEFAULT_CLIENT_NAME)]
    pub name: String,

    /// Silence trigger level in decibels, 0 disables
    #[arg(
        short = 'l',
        long = "level",
        value_name = "DB",
        default_value_t = -40.0,
        allow_negative_numbers = true
    )]
    pub level: f32,

    /// Period of silence required, in whole seconds
    ///
    /// Must be at least 1 while silence detection is enabled. Negative
    /// values are rejected.
    #[arg(short = 'p', long = "period", value_name = "SECS", default_value_t = 1)]
    pub period: u32,

    /// No-dynamic trigger level in decibels, 0 disables
    #[arg(
        short = 'd',
        long = "dynamic",
        value_name = "DB",
        default_value_t = 0.0,
        allow_negative_numbers = true
    )]
    pub dynamic: f32,

    /// No-dynamic period, in whole seconds
    ///
    /// Must be at least 1 while no-dynamic detection is enabled. Negative
    /// values are rejected.
    #[arg(
        short = 'P',
        long = "dynamic-period",
        value_name = "SECS",
        default_value_t = 10
    )]
    pub dynamic_period: u32,

    /// Grace period after a trigger, in whole seconds (not negative)
    #[arg(short = 'g', long = "grace", value_name = "SECS", default_value_t = 0)]
    pub grace: u32,

    /// Enable verbose mode
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Enable quiet mode
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Enable reverse behaviour mode
    #[arg(short = 'r', long = "reverse")]
    pub reverse: bool,

    /// Play a WAV file into the detector instead of a live input
    #[arg(long = "replay", value_name = "WAV", conflicts_with = "connect")]
    pub replay: Option<String>,

    /// Print trigger events as JSON lines
    #[arg(long = "json")]
    pub json: bool,

    /// Show a live peak meter
    #[arg(long = "meter")]
    pub meter: bool,

    /// List source ports that --connect accepts and exit
    #[arg(long = "list-devices")]
    pub list_devices: bool,

    /// Command to run when triggered
    #[arg(value_name = "COMMAND", trailing_var_arg = true)]
    pub command: Vec<String>,
}
