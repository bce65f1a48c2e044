use std::io;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use evdev::{Device, EventType};

use crate::keys::KeyState;

/// Errors from the keyboard device.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to open input device {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to set {path} non-blocking: {source}")]
    NonBlocking {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read input events: {0}")]
    Read(#[from] io::Error),
}

/// An evdev keyboard opened in non-blocking mode.
pub struct Keyboard {
    device: Device,
    path: PathBuf,
}

impl Keyboard {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref().to_path_buf();
        let device = Device::open(&path).map_err(|source| InputError::Open {
            path: path.clone(),
            source,
        })?;
        set_nonblocking(&device).map_err(|source| InputError::NonBlocking {
            path: path.clone(),
            source,
        })?;

        tracing::info!(
            path = %path.display(),
            name = device.name().unwrap_or("<unnamed>"),
            "opened input device"
        );
        Ok(Self { device, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Drain every queued event into `keys`. Returns the number of key
    /// events that changed a tracked flag.
    pub fn poll(&mut self, keys: &mut KeyState) -> Result<usize, InputError> {
        let mut applied = 0;
        loop {
            let events = match self.device.fetch_events() {
                Ok(events) => events,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(InputError::Read(e)),
            };
            for event in events {
                if event.event_type() == EventType::KEY && keys.apply(event.code(), event.value()) {
                    applied += 1;
                }
            }
        }
        Ok(applied)
    }
}

fn set_nonblocking(device: &Device) -> io::Result<()> {
    let fd = device.as_raw_fd();
    // SAFETY: `fd` is owned by `device` and stays open for the duration of both calls.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above; only the O_NONBLOCK bit is added.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_device_names_the_path() {
        let err = Keyboard::open("/nonexistent/input/event99")
            .err()
            .expect("open should fail");
        assert!(matches!(err, InputError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/input/event99"));
    }
}
