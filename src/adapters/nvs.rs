//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ProvisioningSource`] (the `enabled` / `duty` startup values)
//! and [`ConfigPort`] (the postcard-encoded [`HarnessConfig`] blob).
//!
//! - Config validation: [`HarnessConfig::validate`] runs before persistence.
//! - Atomic writes: ESP-IDF NVS commits are atomic per nvs_commit().
//! - The simulation backend keeps everything in a `HashMap` (dev/test only).

use crate::app::ports::{ConfigError, ConfigPort, ProvisioningError, ProvisioningSource};
use crate::config::HarnessConfig;
use log::info;

#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Namespace holding both the provisioning keys and the config blob.
const NAMESPACE: &str = "pwm_test";
const CONFIG_KEY: &str = "harnesscfg";

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 512;

#[derive(Default)]
pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any other NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as i32 || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32 {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK as i32 {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK as i32 {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK as i32 {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self::default())
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(key: &str) -> String {
        format!("{}::{}", NAMESPACE, key)
    }

    /// Seed a provisioning value (simulation backend only).
    #[cfg(not(target_os = "espidf"))]
    pub fn set_u32(&self, key: &str, value: u32) {
        self.store
            .borrow_mut()
            .insert(Self::composite_key(key), value.to_le_bytes().to_vec());
    }

    /// NUL-terminated copy of `s`, truncated to NVS's 15-character limit.
    #[cfg(target_os = "espidf")]
    fn c_name(s: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = s.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open the namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = Self::c_name(NAMESPACE);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
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

impl ProvisioningSource for NvsAdapter {
    fn read_u32(&self, key: &str) -> Result<u32, ProvisioningError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let store = self.store.borrow();
            let bytes = store
                .get(&Self::composite_key(key))
                .ok_or(ProvisioningError::NotFound)?;
            let raw: [u8; 4] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| ProvisioningError::Corrupted)?;
            Ok(u32::from_le_bytes(raw))
        }

        #[cfg(target_os = "espidf")]
        {
            let name = Self::c_name(key);
            let result = Self::with_nvs_handle(false, |handle| {
                let mut value: u32 = 0;
                let ret = unsafe { nvs_get_u32(handle, name.as_ptr() as *const _, &mut value) };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                Ok(value)
            });
            match result {
                Ok(value) => Ok(value),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND as i32 => Err(ProvisioningError::NotFound),
                Err(e) if e == ESP_ERR_NVS_TYPE_MISMATCH as i32 => Err(ProvisioningError::Corrupted),
                Err(e) => {
                    warn!("NvsAdapter: read of '{}' failed ({})", key, e);
                    Err(ProvisioningError::IoError)
                }
            }
        }
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<HarnessConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            if let Some(bytes) = self.store.borrow().get(&Self::composite_key(CONFIG_KEY)) {
                let cfg: HarnessConfig =
                    postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
                info!("NvsAdapter: loaded config from store");
                Ok(cfg)
            } else {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(HarnessConfig::default())
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let name = Self::c_name(CONFIG_KEY);
            let result = Self::with_nvs_handle(false, |handle| {
                let mut size: usize = 0;

                // First call: get size
                let ret = unsafe {
                    nvs_get_blob(handle, name.as_ptr() as *const _, core::ptr::null_mut(), &mut size)
                };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                if size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ESP_ERR_NVS_INVALID_LENGTH as i32);
                }

                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(handle, name.as_ptr() as *const _, buf.as_mut_ptr() as *mut _, &mut size)
                };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                Ok(buf)
            });

            match result {
                Ok(bytes) => {
                    let cfg: HarnessConfig =
                        postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                    info!("NvsAdapter: loaded config from NVS ({} bytes)", bytes.len());
                    Ok(cfg)
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND as i32 => {
                    info!("NvsAdapter: no stored config, using defaults");
                    Ok(HarnessConfig::default())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS read error {}, using defaults", e);
                    Ok(HarnessConfig::default())
                }
            }
        }
    }

    fn save(&self, config: &HarnessConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow_mut()
                .insert(Self::composite_key(CONFIG_KEY), bytes);
            info!("NvsAdapter: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let name = Self::c_name(CONFIG_KEY);
            let result = Self::with_nvs_handle(true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(handle, name.as_ptr() as *const _, bytes.as_ptr() as *const _, bytes.len())
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
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}
