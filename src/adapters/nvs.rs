//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] for the device configuration record.
//!
//! Record layout: 4-byte magic `MLCF` followed by the postcard encoding of
//! [`DeviceConfig`].  The magic lets `load` tell "never written" and
//! "garbage" apart from a real record.
//!
//! - **`target_os = "espidf"`**: one blob in the `motionlink` namespace,
//!   written with `nvs_set_blob` + `nvs_commit` (atomic per commit).
//! - **all other targets**: in-memory simulation for host tests.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::{DeviceConfig, MAX_RANGE_CODE};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
const CONFIG_NAMESPACE: &[u8] = b"motionlink\0";
#[cfg(target_os = "espidf")]
const CONFIG_KEY: &[u8] = b"devcfg\0";

const RECORD_MAGIC: [u8; 4] = *b"MLCF";

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 1024;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    record: Option<Vec<u8>>,
    #[cfg(not(target_os = "espidf"))]
    saves: usize,
}

impl NvsAdapter {
    /// Create the adapter and initialise NVS flash.
    ///
    /// On a full or version-mismatched partition the partition is erased
    /// and re-initialised.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS use.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as i32 || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32 {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK as i32 || unsafe { nvs_flash_init() } != ESP_OK as i32 {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK as i32 {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            record: None,
            #[cfg(not(target_os = "espidf"))]
            saves: 0,
        })
    }

    /// Simulation: start with raw record bytes already in storage.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_record(bytes: &[u8]) -> Self {
        Self {
            record: Some(bytes.to_vec()),
            saves: 0,
        }
    }

    /// Simulation: raw bytes currently stored.
    #[cfg(not(target_os = "espidf"))]
    pub fn raw_record(&self) -> Option<&[u8]> {
        self.record.as_deref()
    }

    /// Simulation: number of successful saves.
    #[cfg(not(target_os = "espidf"))]
    pub fn save_count(&self) -> usize {
        self.saves
    }

    /// Open the config namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(CONFIG_NAMESPACE.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

pub(crate) fn encode_record(cfg: &DeviceConfig) -> Result<Vec<u8>, ConfigError> {
    let mut bytes = RECORD_MAGIC.to_vec();
    let body = postcard::to_allocvec(cfg).map_err(|_| ConfigError::IoError)?;
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

pub(crate) fn decode_record(bytes: &[u8]) -> Result<DeviceConfig, ConfigError> {
    let body = bytes
        .strip_prefix(&RECORD_MAGIC)
        .ok_or(ConfigError::Corrupted)?;
    let cfg: DeviceConfig = postcard::from_bytes(body).map_err(|_| ConfigError::Corrupted)?;
    validate_config(&cfg).map_err(|_| ConfigError::Corrupted)?;
    Ok(cfg)
}

fn validate_config(cfg: &DeviceConfig) -> Result<(), ConfigError> {
    if cfg.device_id.is_empty() {
        return Err(ConfigError::ValidationFailed("device_id must not be empty"));
    }
    if cfg.accel_range > MAX_RANGE_CODE {
        return Err(ConfigError::ValidationFailed("accel_range must be 0–3"));
    }
    if cfg.gyro_range > MAX_RANGE_CODE {
        return Err(ConfigError::ValidationFailed("gyro_range must be 0–3"));
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<DeviceConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            if let Some(bytes) = &self.record {
                let cfg = decode_record(bytes)?;
                info!("NvsAdapter: loaded config from store");
                Ok(cfg)
            } else {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(DeviceConfig::default())
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(false, |handle| {
                let mut size: usize = 0;

                // First call: get size
                let ret = unsafe {
                    nvs_get_blob(handle, CONFIG_KEY.as_ptr().cast(), core::ptr::null_mut(), &mut size)
                };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                if size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ESP_ERR_NVS_INVALID_LENGTH as i32);
                }

                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(handle, CONFIG_KEY.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
                };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                Ok(buf)
            });

            match result {
                Ok(bytes) => {
                    let cfg = decode_record(&bytes)?;
                    info!("NvsAdapter: loaded config from NVS ({} bytes)", bytes.len());
                    Ok(cfg)
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND as i32 => {
                    info!("NvsAdapter: no stored config, using defaults");
                    Ok(DeviceConfig::default())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS read error {}, using defaults", e);
                    Ok(DeviceConfig::default())
                }
            }
        }
    }

    fn save(&mut self, config: &DeviceConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = encode_record(config)?;

        #[cfg(not(target_os = "espidf"))]
        {
            // Whole-record replacement: readers see old or new, never a mix.
            self.record = Some(bytes);
            self.saves += 1;
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(handle, CONFIG_KEY.as_ptr().cast(), bytes.as_ptr().cast(), bytes.len())
                };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("NvsAdapter: config saved to NVS ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 => Err(ConfigError::StorageFull),
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }

    fn erase(&mut self) -> Result<(), ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.record = None;
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(true, |handle| {
                let ret = unsafe { nvs_erase_key(handle, CONFIG_KEY.as_ptr().cast()) };
                if ret != ESP_OK as i32 && ret != ESP_ERR_NVS_NOT_FOUND as i32 {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|_| ConfigError::IoError)
        }
    }
}

impl Default for NvsAdapter {
    fn default() -> Self {
        // Last-resort fallback when NVS init fails: run without persistence.
        Self::new().unwrap_or(Self {
            #[cfg(not(target_os = "espidf"))]
            record: None,
            #[cfg(not(target_os = "espidf"))]
            saves: 0,
        })
    }
}
