//! HID transport for locally attached adapters

use std::{
    ops::Deref,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use async_trait::async_trait;
use atomic_refcell::AtomicRefCell;
use bytes::Bytes;
pub use hidapi::HidError;
use hidapi::{HidApi, HidDevice, HidResult};
use uridiag_protocol::{report::REPORT_LEN, ProtocolError, VENDOR_ID};

use super::{ControlTransport, DiagError};

/// Guard before every control transfer; the HID engine inside the part needs
/// a moment between back-to-back reports
const TRANSFER_GUARD: Duration = Duration::from_micros(1500);

const READ_TIMEOUT_MS: i32 = 5000;

static HIDAPI_INSTANCE: AtomicRefCell<Option<Arc<Mutex<HidApi>>>> = AtomicRefCell::new(None);

/// Initializes a global instance of HidApi
pub fn initialize_api() -> HidResult<Arc<Mutex<HidApi>>> {
    if let Some(x) = HIDAPI_INSTANCE.borrow().deref() {
        return Ok(x.clone());
    }

    let api = Arc::new(Mutex::new(HidApi::new()?));
    HIDAPI_INSTANCE.borrow_mut().replace(api.clone());
    Ok(api)
}

// hidapi's libusb backend does its own locking, so the handle can be shared
// between the blocking send and receive closures.
struct SharedHidDevice {
    inner: HidDevice,
}

impl Deref for SharedHidDevice {
    type Target = HidDevice;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

unsafe impl Sync for SharedHidDevice {}
unsafe impl Send for SharedHidDevice {}

/// Control-transfer channel over the adapter's HID interface
pub struct HidControl {
    device: Arc<SharedHidDevice>,
}

impl HidControl {
    pub fn new(device: HidDevice) -> Self {
        Self {
            device: Arc::new(SharedHidDevice { inner: device }),
        }
    }

    pub fn with_path(hid: &HidApi, path: String) -> Result<Self, HidError> {
        let path =
            std::ffi::CString::new(path.into_bytes()).map_err(|_| HidError::OpenHidDeviceError)?;
        Ok(Self::new(hid.open_path(&path)?))
    }

    pub fn with_product_id(hid: &HidApi, pid: u16) -> Result<Self, HidError> {
        Ok(Self::new(hid.open(VENDOR_ID, pid)?))
    }
}

#[async_trait]
impl ControlTransport for HidControl {
    async fn send_report(&self, report: Bytes) -> Result<(), DiagError> {
        if report.len() != REPORT_LEN {
            return Err(ProtocolError::ShortReport {
                expected: REPORT_LEN,
                actual: report.len(),
            }
            .into());
        }

        let device = self.device.clone();
        tokio::task::spawn_blocking(move || {
            thread::sleep(TRANSFER_GUARD);
            // report id 0, then the 4 payload bytes
            let mut buf = [0u8; REPORT_LEN + 1];
            buf[1..].copy_from_slice(&report);
            log::trace!("send: {:02x?}", report.as_ref());
            device.write(&buf)?;
            Ok(())
        })
        .await
        .map_err(|e| DiagError::Internal(anyhow::anyhow!(e)))?
    }

    async fn recv_report(&self) -> Result<Bytes, DiagError> {
        let device = self.device.clone();
        tokio::task::spawn_blocking(move || {
            thread::sleep(TRANSFER_GUARD);
            let mut buf = [0u8; REPORT_LEN];
            let size = device.read_timeout(&mut buf, READ_TIMEOUT_MS)?;
            log::trace!("recv: {:02x?}", &buf[..size]);
            Ok(Bytes::copy_from_slice(&buf[..size]))
        })
        .await
        .map_err(|e| DiagError::Internal(anyhow::anyhow!(e)))?
    }
}
