use tokio::process::Command;

/// CUDA toolkit version from `nvcc --version`, e.g. "12.4".
pub async fn cuda_version() -> Option<String> {
    let output = Command::new("nvcc").arg("--version").output().await.ok()?;
    if !output.status.success() {
        return None;
    }
    parse_nvcc_release(&String::from_utf8_lossy(&output.stdout))
}

/// Interpreter version from `python3 --version`, e.g. "3.10.12".
pub async fn python_version(python_bin: &str) -> Option<String> {
    let output = Command::new(python_bin)
        .arg("--version")
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    // Old interpreters printed the version on stderr.
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        String::from_utf8_lossy(&output.stdout).into_owned()
    };
    parse_python_version(&text)
}

/// Torch version and CUDA availability as torch itself reports them.
/// `None` when torch is missing or the interpreter fails.
pub async fn torch_details(python_bin: &str) -> Option<(String, bool)> {
    let output = Command::new(python_bin)
        .arg("-c")
        .arg("import torch; print(torch.__version__); print(torch.cuda.is_available())")
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        tracing::debug!("torch probe failed");
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    let version = lines.next()?.trim().to_string();
    let cuda_available = lines.next().map(|l| l.trim() == "True").unwrap_or(false);
    Some((version, cuda_available))
}

/// Whether `import sglang` succeeds under the given interpreter.
pub async fn sglang_importable(python_bin: &str) -> bool {
    match Command::new(python_bin)
        .arg("-c")
        .arg("import sglang")
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(e) => {
            tracing::debug!(error = %e, "sglang probe not runnable");
            false
        }
    }
}

fn parse_nvcc_release(stdout: &str) -> Option<String> {
    // nvcc banner ends with e.g. "Cuda compilation tools, release 12.4, V12.4.131"
    for line in stdout.lines() {
        if let Some(rest) = line.split("release ").nth(1) {
            let version: String = rest
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            if !version.is_empty() {
                return Some(version);
            }
        }
    }
    None
}

fn parse_python_version(text: &str) -> Option<String> {
    let version = text.trim().strip_prefix("Python ")?.to_string();
    if version.is_empty() {
        None
    } else {
        Some(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nvcc_release() {
        let banner = "nvcc: NVIDIA (R) Cuda compiler driver\n\
                      Copyright (c) 2005-2024 NVIDIA Corporation\n\
                      Built on Thu_Mar_28_02:18:24_PDT_2024\n\
                      Cuda compilation tools, release 12.4, V12.4.131\n\
                      Build cuda_12.4.r12.4/compiler.34097967_0\n";
        assert_eq!(parse_nvcc_release(banner), Some("12.4".to_string()));
        assert_eq!(parse_nvcc_release("no version here"), None);
    }

    #[test]
    fn test_parse_python_version() {
        assert_eq!(
            parse_python_version("Python 3.10.12\n"),
            Some("3.10.12".to_string())
        );
        assert_eq!(parse_python_version("not python"), None);
        assert_eq!(parse_python_version("Python "), None);
    }
}
