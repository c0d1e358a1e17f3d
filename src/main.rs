mod metrics;
mod output;

use certexpiry::config::{Config, PrometheusConfig, SourceConfig};
use certexpiry::{
    parse_hostnames, DirectorySource, ExpiryEvaluator, HostListProvider, NowCapture,
    OpenSslFetcher, RemoteSource, SourceError,
};
use clap::{ArgAction, Parser};
use log::{debug, error, LevelFilter};
use output::OutputFormat;
use std::io::Read;
use std::path::Path;
use std::process::exit;
use std::str::FromStr;

const DEFAULT_CONFIG_FILE: &str = "certexpiry.toml";

/// Experimental TLS certificate expiry checker from the command line
#[derive(Parser, Debug)]
#[command(name = "certexpiry", version, author, about, long_about = None)]
struct Args {
    /// Hostnames to check (port 443 is implied)
    #[arg(short = 'H', long = "host", num_args = 1.., value_name = "HOST")]
    hosts: Option<Vec<String>>,

    /// Read newline-separated hostnames from standard input
    #[arg(long)]
    stdin: bool,

    /// Load the named host list (e.g. pod1) from the hosts directory or remote
    #[arg(long, value_name = "ID")]
    pod: Option<String>,

    /// Directory holding <ID>.txt host lists
    #[arg(long, value_name = "DIR")]
    hosts_dir: Option<String>,

    /// Base URL serving <ID>.txt host lists
    #[arg(long, value_name = "URL")]
    remote: Option<String>,

    /// Output format: text, json or summary
    #[arg(short, long)]
    output: Option<String>,

    /// Maximum number of hosts checked at the same time
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Per-host timeout in seconds (DNS + connect + handshake)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Stop dialing new hosts after this many seconds
    #[arg(long, value_name = "SECONDS")]
    batch_timeout: Option<u64>,

    /// Measure days left from each host's own check time instead of batch start
    #[arg(long)]
    now_per_host: bool,

    /// Extra PEM trust anchors
    #[arg(long, value_name = "FILE")]
    ca_file: Option<String>,

    #[arg(long, hide = true, default_value_t = certexpiry::fetcher::DEFAULT_PORT)]
    port: u16,

    /// Exit code when any host is expiring soon or failed
    #[arg(short, long)]
    exit_code: Option<i32>,

    /// Push results to a Prometheus push gateway
    #[arg(long)]
    prometheus: bool,

    #[arg(long, value_name = "URL")]
    prometheus_address: Option<String>,

    /// Configuration file (defaults to ./certexpiry.toml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Print an example configuration file and exit
    #[arg(long)]
    generate_config: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let mut logger = env_logger::builder();
    logger.format_timestamp(None);
    logger.filter_level(LevelFilter::Warn);
    logger.filter_module("certexpiry", level);
    logger.parse_default_env();
    logger.init();
}

/// Converts the flags that were actually given into a mergeable config.
fn cli_config(args: &Args) -> Config {
    let source = if args.hosts_dir.is_some() || args.remote.is_some() {
        Some(SourceConfig {
            hosts_dir: args.hosts_dir.clone(),
            remote_url: args.remote.clone(),
        })
    } else {
        None
    };
    Config {
        hosts: args.hosts.clone(),
        output: args.output.clone(),
        concurrency: args.concurrency,
        timeout: args.timeout,
        batch_timeout: args.batch_timeout,
        now_capture: args.now_per_host.then_some(NowCapture::PerHost),
        ca_file: args.ca_file.clone(),
        exit_code: args.exit_code,
        source,
        prometheus: Some(PrometheusConfig {
            enabled: args.prometheus.then_some(true),
            address: args.prometheus_address.clone(),
        }),
    }
}

fn load_config(args: &Args) -> Config {
    let defaults = Config::with_defaults();
    let file = match &args.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                error!("Failed to load config {}: {}", path, e);
                exit(2);
            }
        },
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            debug!("using {}", DEFAULT_CONFIG_FILE);
            match Config::from_file(DEFAULT_CONFIG_FILE) {
                Ok(config) => Some(config),
                Err(e) => {
                    error!("Failed to load config {}: {}", DEFAULT_CONFIG_FILE, e);
                    exit(2);
                }
            }
        }
        None => None,
    };

    let merged = match file {
        Some(file) => defaults.merge_with(file),
        None => defaults,
    };
    let merged = merged.merge_with(cli_config(args));
    if let Err(e) = merged.validate() {
        error!("{}", e);
        exit(2);
    }
    merged
}

/// Picks the host list: stdin, then a named list, then configured hosts.
fn hostnames(args: &Args, config: &Config) -> Result<Vec<String>, SourceError> {
    if args.stdin {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| SourceError::Read {
                path: "<stdin>".to_string(),
                source: e,
            })?;
        return Ok(parse_hostnames(&text));
    }

    if let Some(pod) = &args.pod {
        let source = config.source.clone().unwrap_or_default();
        let provider: Box<dyn HostListProvider> = match source.remote_url {
            Some(url) => Box::new(RemoteSource::new(&url)?),
            None => Box::new(DirectorySource::new(
                source.hosts_dir.unwrap_or_else(|| "hosts".to_string()),
            )),
        };
        return provider.load(pod);
    }

    Ok(config.hosts.clone().unwrap_or_default())
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);

    if args.generate_config {
        println!("{}", Config::example_toml());
        exit(0);
    }

    let config = load_config(&args);
    let format = config
        .output
        .as_deref()
        .map(OutputFormat::from_str)
        .unwrap_or(Ok(OutputFormat::Text))
        .unwrap_or_else(|_| {
            error!("Unknown output format, expected text, json or summary");
            exit(2);
        });

    let hosts = match hostnames(&args, &config) {
        Ok(hosts) if hosts.is_empty() => {
            error!("No hosts to check. Use --host, --stdin, --pod or a config file.");
            exit(2);
        }
        Ok(hosts) => hosts,
        Err(e) => {
            error!("{}", e);
            exit(2);
        }
    };

    let mut builder = OpenSslFetcher::builder()
        .port(args.port)
        .timeout(config.timeout_duration());
    if let Some(ca_file) = &config.ca_file {
        builder = builder.ca_file(ca_file);
    }
    let fetcher = match builder.build() {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("{}", e);
            exit(2);
        }
    };

    let evaluator = ExpiryEvaluator::new(fetcher)
        .with_concurrency(config.concurrency.unwrap_or(certexpiry::evaluator::DEFAULT_CONCURRENCY))
        .with_now_capture(config.now_capture.unwrap_or_default())
        .with_batch_timeout(config.batch_timeout_duration());
    let results = evaluator.evaluate(&hosts);

    match output::render(&results, format) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => {
            error!("Failed to render results: {}", e);
            exit(1);
        }
    }

    if let Some(prometheus) = &config.prometheus {
        if prometheus.enabled == Some(true) {
            let address = prometheus
                .address
                .clone()
                .unwrap_or_else(|| "http://localhost:9091".to_string());
            metrics::prom::prometheus_metrics(&results, &address);
        }
    }

    let all_valid = results
        .iter()
        .all(|result| result.status() == Some(certexpiry::Status::Valid));
    if all_valid {
        exit(0);
    }
    exit(config.exit_code.unwrap_or(0));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_hosts_and_flags() {
        let args = Args::try_parse_from([
            "certexpiry",
            "-H",
            "a.test",
            "b.test",
            "-o",
            "json",
            "--now-per-host",
            "-c",
            "4",
        ])
        .unwrap();
        let config = Config::with_defaults().merge_with(cli_config(&args));

        assert_eq!(
            config.hosts,
            Some(vec!["a.test".to_string(), "b.test".to_string()])
        );
        assert_eq!(config.output, Some("json".to_string()));
        assert_eq!(config.concurrency, Some(4));
        assert_eq!(config.now_capture, Some(NowCapture::PerHost));
        assert_eq!(config.prometheus.unwrap().enabled, Some(false));
    }

    #[test]
    fn test_pod_loads_from_hosts_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pod1.txt"), "alpha.test\nbeta.test\n").unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let args =
            Args::try_parse_from(["certexpiry", "--pod", "pod1", "--hosts-dir", dir_arg]).unwrap();
        let config = Config::with_defaults().merge_with(cli_config(&args));

        let hosts = hostnames(&args, &config).unwrap();
        assert_eq!(hosts, vec!["alpha.test", "beta.test"]);
    }

    #[test]
    fn test_missing_pod_is_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let args =
            Args::try_parse_from(["certexpiry", "--pod", "pod4", "--hosts-dir", dir_arg]).unwrap();
        let config = Config::with_defaults().merge_with(cli_config(&args));

        assert!(matches!(
            hostnames(&args, &config),
            Err(SourceError::Read { .. })
        ));
    }
}
