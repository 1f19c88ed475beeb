// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps a worker's base platform to the agent binary name, its remote
//! install path, and the shell command used to checksum it (§4.3 step 1,
//! §6.3 persisted artifact paths).

use behemoth_core::WorkerPlatform;

/// Everything the driver needs to ensure the agent binary is present and
/// current on a worker of a given platform.
#[derive(Debug, Clone, Copy)]
pub struct PlatformProfile {
    pub binary_name: &'static str,
    pub remote_dir: &'static str,
}

impl PlatformProfile {
    pub fn remote_binary_path(&self) -> String {
        format!("{}/{}", self.remote_dir, self.binary_name)
    }

    /// Shell command run on the worker to checksum the already-uploaded
    /// binary, if any.
    pub fn remote_checksum_command(&self) -> String {
        let path = self.remote_binary_path();
        match self.binary_name {
            "jms_cli_windows.exe" => format!("certutil -hashfile \"{path}\" SHA256"),
            "jms_cli_darwin" => format!("shasum -a 256 \"{path}\""),
            _ => format!("sha256sum \"{path}\""),
        }
    }
}

pub fn profile_for(platform: WorkerPlatform) -> PlatformProfile {
    match platform {
        WorkerPlatform::Linux => PlatformProfile {
            binary_name: "jms_cli_linux",
            remote_dir: "/tmp/behemoth",
        },
        WorkerPlatform::Mac => PlatformProfile {
            binary_name: "jms_cli_darwin",
            remote_dir: "/tmp/behemoth",
        },
        WorkerPlatform::Windows => PlatformProfile {
            binary_name: "jms_cli_windows.exe",
            remote_dir: r"C:\Windows\Temp",
        },
    }
}

/// Extract the hash token from a checksum command's stdout. `sha256sum`/
/// `shasum` print `<hash>  <path>` as their only line; `certutil` prints a
/// header line, the hash alone on the next, then a trailer. Scan every
/// line for the first whitespace-split token that looks like a hex digest
/// rather than assuming a fixed line position.
pub fn parse_remote_checksum(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let token = line.trim().split_whitespace().next()?;
        (token.len() >= 32 && token.bytes().all(|b| b.is_ascii_hexdigit()))
            .then(|| token.to_lowercase())
    })
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod tests;
