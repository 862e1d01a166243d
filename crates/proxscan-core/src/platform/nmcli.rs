//! NetworkManager adapter that shells out to `nmcli`.
//!
//! All commands run in terse mode (`-t`), where fields are separated by `:`
//! and literal `:` or `\` inside a value are escaped with a backslash. BSSIDs
//! therefore come back as `AA\:BB\:CC\:DD\:EE\:FF`.
//!
//! `nmcli device wifi rescan` only requests a scan. Results are read back with
//! `--rescan no` on a background thread after a settle delay and delivered to
//! the attached sink, whether or not the rescan request itself succeeded:
//! NetworkManager refuses a rescan while one is already running but still
//! has fresh results to hand out.

use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;

use tracing::{debug, warn};

use super::WifiPlatform;
use crate::config::PlatformConfig;
use crate::error::{ProxscanError, Result};
use crate::sink::ScanSink;
use crate::types::{Association, RawScanResult};

const NMCLI: &str = "nmcli";

/// [`WifiPlatform`] backed by NetworkManager.
#[derive(Debug)]
pub struct NmcliPlatform {
    interface: Option<String>,
    settle: Duration,
    sink: OnceLock<ScanSink>,
}

impl NmcliPlatform {
    /// Create an adapter for the configured interface (all interfaces if unset).
    pub fn new(config: &PlatformConfig) -> Self {
        Self {
            interface: config.interface.clone(),
            settle: config.settle(),
            sink: OnceLock::new(),
        }
    }

    /// Attach the sink that receives scan completions. Later calls are ignored.
    pub fn attach(&self, sink: ScanSink) {
        if self.sink.set(sink).is_err() {
            warn!("nmcli platform already has a sink attached");
        }
    }

    fn with_interface<'a>(&'a self, mut args: Vec<&'a str>) -> Vec<&'a str> {
        if let Some(interface) = &self.interface {
            args.extend(["ifname", interface.as_str()]);
        }
        args
    }

    fn spawn_delivery(&self) {
        let Some(sink) = self.sink.get().cloned() else {
            warn!("Scan requested but no sink is attached, results will be dropped");
            return;
        };
        let interface = self.interface.clone();
        let settle = self.settle;

        let spawned = std::thread::Builder::new()
            .name("nmcli-scan".to_string())
            .spawn(move || {
                std::thread::sleep(settle);
                let results = list_networks(interface.as_deref()).unwrap_or_else(|e| {
                    log_degraded(&e, "Failed to read scan results, delivering none");
                    Vec::new()
                });
                debug!(count = results.len(), "nmcli scan results read");
                sink.on_scan_complete(results);
            });

        if let Err(e) = spawned {
            warn!(error = %e, "Failed to spawn scan delivery thread");
        }
    }
}

impl WifiPlatform for NmcliPlatform {
    fn radio_enabled(&self) -> bool {
        match run(&["-t", "-f", "WIFI", "radio"]) {
            Ok(output) => output.trim() == "enabled",
            Err(e) => {
                log_degraded(&e, "Cannot query Wi-Fi radio state");
                false
            }
        }
    }

    fn start_scan(&self) -> bool {
        let args = self.with_interface(vec!["device", "wifi", "rescan"]);
        let accepted = match run(&args) {
            Ok(_) => true,
            Err(e) => {
                log_degraded(&e, "Rescan request refused");
                false
            }
        };
        self.spawn_delivery();
        accepted
    }

    fn current_association(&self) -> Option<Association> {
        let args = self.with_interface(vec![
            "-t",
            "-f",
            "ACTIVE,BSSID,SSID",
            "device",
            "wifi",
            "list",
            "--rescan",
            "no",
        ]);
        match run(&args) {
            Ok(output) => parse_active(&output),
            Err(e) => {
                log_degraded(&e, "Cannot query current association");
                None
            }
        }
    }
}

/// A refusal is routine for NetworkManager; missing tooling is not.
fn log_degraded(err: &ProxscanError, message: &str) {
    if err.is_recoverable() {
        debug!(code = err.error_code(), error = %err, "{message}");
    } else {
        warn!(code = err.error_code(), error = %err, "{message}");
    }
}

fn run(args: &[&str]) -> Result<String> {
    run_program(NMCLI, args)
}

fn run_program(program: &str, args: &[&str]) -> Result<String> {
    let command = format!("{program} {}", args.join(" "));
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| ProxscanError::PlatformUnavailable(format!("failed to run `{command}`: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProxscanError::PlatformCommand {
            command,
            reason: format!("exited with {}: {}", output.status, stderr.trim()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn list_networks(interface: Option<&str>) -> Result<Vec<RawScanResult>> {
    let mut args = vec![
        "-t", "-f", "BSSID,SSID", "device", "wifi", "list", "--rescan", "no",
    ];
    if let Some(interface) = interface {
        args.extend(["ifname", interface]);
    }
    Ok(parse_scan_list(&run(&args)?))
}

/// Split one line of `nmcli -t` output into its unescaped fields.
pub fn parse_terse_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Parse `BSSID,SSID` rows. Rows without a BSSID are skipped.
fn parse_scan_list(output: &str) -> Vec<RawScanResult> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut fields = parse_terse_fields(line).into_iter();
            let bssid = fields.next().filter(|b| !b.is_empty())?;
            let ssid = fields.next().unwrap_or_default();
            Some(RawScanResult::new(bssid.to_lowercase(), ssid))
        })
        .collect()
}

/// Find the `ACTIVE=yes` row of `ACTIVE,BSSID,SSID` output.
fn parse_active(output: &str) -> Option<Association> {
    output.lines().find_map(|line| {
        let mut fields = parse_terse_fields(line).into_iter();
        if fields.next()? != "yes" {
            return None;
        }
        let bssid = fields.next().unwrap_or_default();
        let ssid = fields.next().unwrap_or_default();
        Some(Association::new(bssid.to_lowercase(), ssid))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_terse_fields_unescapes_colons() {
        let fields = parse_terse_fields(r"AA\:BB\:CC\:DD\:EE\:FF:home");
        assert_eq!(fields, ["AA:BB:CC:DD:EE:FF", "home"]);
    }

    #[test]
    fn test_parse_terse_fields_keeps_empty_fields() {
        assert_eq!(parse_terse_fields(r"AA\:BB:"), ["AA:BB", ""]);
        assert_eq!(parse_terse_fields(""), [""]);
    }

    #[test]
    fn test_parse_terse_fields_unescapes_backslash() {
        assert_eq!(parse_terse_fields(r"x:back\\slash\:net"), ["x", r"back\slash:net"]);
    }

    #[test]
    fn test_parse_scan_list() {
        let output = "AA\\:BB\\:CC\\:00\\:00\\:01:home\n\
                      AA\\:BB\\:CC\\:00\\:00\\:02:\n\
                      \n\
                      :orphan\n";
        let results = parse_scan_list(output);
        assert_eq!(
            results,
            vec![
                RawScanResult::new("aa:bb:cc:00:00:01", "home"),
                RawScanResult::new("aa:bb:cc:00:00:02", ""),
            ]
        );
    }

    #[test]
    fn test_parse_active() {
        let output = "no:AA\\:BB\\:CC\\:00\\:00\\:01:cafe\n\
                      yes:AA\\:BB\\:CC\\:00\\:00\\:02:home\n";
        assert_eq!(
            parse_active(output),
            Some(Association::new("aa:bb:cc:00:00:02", "home"))
        );
    }

    #[test]
    fn test_parse_active_without_association() {
        assert_eq!(parse_active("no:AA\\:BB\\:CC\\:00\\:00\\:01:cafe\n"), None);
        assert_eq!(parse_active(""), None);
    }

    #[test]
    fn test_missing_tool_is_unavailable() {
        let err = run_program("proxscan-test-no-such-tool", &["radio"]).unwrap_err();
        assert!(matches!(err, ProxscanError::PlatformUnavailable(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_failing_command_is_recoverable() {
        let err = run_program("false", &[]).unwrap_err();
        assert!(matches!(err, ProxscanError::PlatformCommand { .. }));
        assert!(err.is_recoverable());
        assert_eq!(err.error_code(), "PLATFORM_COMMAND_FAILED");
    }

    #[test]
    fn test_interface_is_appended() {
        let platform = NmcliPlatform::new(&PlatformConfig {
            interface: Some("wlan0".to_string()),
            ..PlatformConfig::default()
        });
        assert_eq!(
            platform.with_interface(vec!["device", "wifi", "rescan"]),
            ["device", "wifi", "rescan", "ifname", "wlan0"]
        );
    }
}
