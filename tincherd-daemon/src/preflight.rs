//! Environment checks before the agent touches the system.

use std::path::Path;

use crate::error::SupervisorError;

const TUN_DEVICE: &str = "/dev/net/tun";

/// The agent writes under /etc and signals system daemons; refuse to run
/// unprivileged rather than fail halfway through.
pub fn ensure_root() -> Result<(), SupervisorError> {
    if nix::unistd::Uid::effective().is_root() {
        Ok(())
    } else {
        Err(SupervisorError::NotRoot)
    }
}

/// Check that the TUN device node exists before launching tincd.
pub fn ensure_tun_device() -> Result<(), SupervisorError> {
    ensure_tun_device_at(Path::new(TUN_DEVICE))
}

pub fn ensure_tun_device_at(path: &Path) -> Result<(), SupervisorError> {
    if path.exists() {
        Ok(())
    } else {
        Err(SupervisorError::TunDeviceMissing {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn existing_device_node_passes() {
        let dir = TempDir::new().expect("tempdir");
        let dev = dir.path().join("tun");
        fs::write(&dev, b"").expect("touch");
        ensure_tun_device_at(&dev).expect("device present");
    }

    #[test]
    fn missing_device_node_fails_with_path() {
        let dir = TempDir::new().expect("tempdir");
        let dev = dir.path().join("tun");
        let err = ensure_tun_device_at(&dev).unwrap_err();
        match err {
            SupervisorError::TunDeviceMissing { path } => assert_eq!(path, dev),
            other => panic!("expected TunDeviceMissing, got {other:?}"),
        }
    }
}
