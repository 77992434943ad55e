//! Serial port handling
//!
//! Provides the `serialport`-backed transport used against real hardware.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use std::fs;
use std::io::{Read, Write};
use std::time::Duration;

use super::{Transport, TransportError, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS};

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyS0" or "COM5")
    pub name: String,

    /// USB vendor ID (if this is a USB-serial adapter)
    pub vid: Option<u16>,

    /// USB product ID (if this is a USB-serial adapter)
    pub pid: Option<u16>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (vid, pid, product) = match info.port_type {
            SerialPortType::UsbPort(usb_info) => {
                (Some(usb_info.vid), Some(usb_info.pid), usb_info.product)
            }
            _ => (None, None, None),
        };

        Self {
            name: info.port_name,
            vid,
            pid,
            product,
        }
    }
}

/// Sort key for port names.
///
/// UPS-Link cables are plain RS-232, so on-board ttyS* ports come first,
/// then USB-serial adapters (ttyUSB*, then ttyACM*), then everything else.
/// Within a family ports are ordered numerically by suffix.
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    for (rank, prefix) in ["ttyS", "ttyUSB", "ttyACM"].iter().enumerate() {
        if let Some(rest) = basename.strip_prefix(*prefix) {
            let num = rest.parse::<usize>().unwrap_or(usize::MAX);
            return (rank as u8, num, basename.to_string());
        }
    }
    (3, 0, basename.to_string())
}

/// List candidate serial ports with deterministic ordering
pub fn list_ports() -> Vec<PortInfo> {
    let mut map: HashMap<String, PortInfo> = HashMap::new();
    for info in serialport::available_ports().unwrap_or_default() {
        let p = PortInfo::from(info);
        map.entry(p.name.clone()).or_insert(p);
    }

    // Linux-only: USB adapters sometimes don't show up through the API
    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname.starts_with("ttyUSB") || fname.starts_with("ttyACM") {
                    let full = format!("/dev/{}", fname);
                    map.entry(full.clone()).or_insert_with(|| PortInfo {
                        name: full,
                        vid: None,
                        pid: None,
                        product: None,
                    });
                }
            }
        }
    }

    let mut v: Vec<PortInfo> = map.into_values().collect();
    v.sort_by_key(|p| port_sort_key(&p.name));
    v
}

/// UPS-Link transport over a real serial port
pub struct SerialTransport {
    port_name: String,
    baud_rate: u32,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Create a closed transport for `port_name` with the standard UPS-Link settings
    pub fn new(port_name: impl Into<String>) -> Self {
        Self::with_settings(
            port_name,
            DEFAULT_BAUD_RATE,
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
        )
    }

    /// Create a closed transport with explicit line speed and read timeout
    pub fn with_settings(port_name: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            timeout,
            port: None,
        }
    }

    /// Name of the device this transport opens
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::NotOpen)
    }
}

impl Transport for SerialTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            return Ok(());
        }

        // 8N1, no flow control
        let port = serialport::new(&self.port_name, self.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(self.timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => {
                    TransportError::PortNotFound(self.port_name.clone())
                }
                _ => TransportError::Open(e.to_string()),
            })?;

        // Drop anything the UPS sent before we were listening
        port.clear(serialport::ClearBuffer::All)?;

        tracing::info!(
            port = %self.port_name,
            baud = self.baud_rate,
            timeout_ms = self.timeout.as_millis() as u64,
            "serial port opened"
        );
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        // The handle is released on drop
        if self.port.take().is_some() {
            tracing::info!(port = %self.port_name, "serial port closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        // No flush here; tcdrain blocks on some USB adapters
        let port = self.port_mut()?;
        Ok(Write::write(port.as_mut(), data)?)
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        let port = self.port_mut()?;
        Ok(port.bytes_to_read()? as usize)
    }

    fn read_exact(&mut self, count: usize) -> Result<Vec<u8>, TransportError> {
        let port = self.port_mut()?;
        let mut buf = vec![0u8; count];
        Read::read_exact(port.as_mut(), &mut buf)?;
        Ok(buf)
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
