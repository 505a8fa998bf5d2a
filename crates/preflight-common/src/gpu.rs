use tokio::process::Command;

/// One device as reported by nvidia-smi.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuInfo {
    pub index: u32,
    pub name: String,
    pub driver_version: String,
}

/// Query local devices via nvidia-smi. An empty list means the tool is
/// missing, failed, or reported no devices; callers decide whether that is
/// fatal.
pub async fn read_gpu_info() -> Vec<GpuInfo> {
    let output = Command::new("nvidia-smi")
        .arg("--query-gpu=name,driver_version")
        .arg("--format=csv,noheader")
        .output()
        .await;

    let Ok(output) = output else {
        tracing::debug!("nvidia-smi not runnable");
        return Vec::new();
    };
    if !output.status.success() {
        tracing::debug!(code = ?output.status.code(), "nvidia-smi exited with failure");
        return Vec::new();
    }

    parse_gpu_query(&String::from_utf8_lossy(&output.stdout))
}

fn parse_gpu_query(stdout: &str) -> Vec<GpuInfo> {
    let mut out = Vec::new();
    for (idx, line) in stdout.lines().enumerate() {
        let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
        if parts.len() < 2 || parts[0].is_empty() {
            continue;
        }
        out.push(GpuInfo {
            index: idx as u32,
            name: parts[0].to_string(),
            driver_version: parts[1].to_string(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gpu_query() {
        let gpus = parse_gpu_query("NVIDIA H200, 550.54.15\nNVIDIA H200, 550.54.15\n");
        assert_eq!(gpus.len(), 2);
        assert_eq!(gpus[0].index, 0);
        assert_eq!(gpus[0].name, "NVIDIA H200");
        assert_eq!(gpus[1].driver_version, "550.54.15");
    }

    #[test]
    fn test_parse_gpu_query_skips_blank_lines() {
        assert!(parse_gpu_query("\n\n").is_empty());
        assert!(parse_gpu_query("").is_empty());
    }
}
