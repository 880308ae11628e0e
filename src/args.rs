use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "geo-sim")]
#[command(about = "Publish a random user location to AWS IoT topic 'aws-iot-location' every second")]
#[command(version)]
pub struct Args {
    /// Generate and print events without publishing them.
    #[arg(long)]
    pub dry_run: bool,

    /// AWS region; defaults to the provider chain.
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// AWS IoT data endpoint URL.
    #[arg(long, env = "GEO_SIM_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Stop after this many events instead of running until interrupted.
    #[arg(long)]
    pub count: Option<u64>,

    /// Seed the random source for a reproducible event sequence.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Retries per event for transient publish failures.
    #[arg(long, default_value = "0")]
    pub retries: u32,

    /// Do not echo payloads to stdout.
    #[arg(long)]
    pub quiet: bool,

    #[arg(long)]
    pub verbose: bool,
}
