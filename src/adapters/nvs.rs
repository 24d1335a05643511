//! Non-volatile storage adapter.
//!
//! On target this wraps the ESP-IDF NVS flash API with open-use-close
//! handle discipline per operation.  The host build substitutes an
//! in-memory map with the same namespace/key semantics.

use crate::error::{Error, StorageError};
use crate::ports::StoragePort;

// ---------------------------------------------------------------------------
// ESP-IDF implementation
// ---------------------------------------------------------------------------

#[cfg(target_os = "espidf")]
mod imp {
    use std::ffi::CString;

    use esp_idf_svc::sys::{self as sys, esp};

    use super::{Error, StorageError};

    pub struct NvsStore(());

    impl NvsStore {
        /// Initialise the NVS flash partition.  A partition left in a
        /// truncated or version-mismatched state is erased and retried,
        /// matching the stock ESP-IDF bring-up sequence.
        pub fn new() -> Result<Self, Error> {
            // SAFETY: plain FFI calls, no pointers involved.
            unsafe {
                let mut err = sys::nvs_flash_init();
                if err == sys::ESP_ERR_NVS_NO_FREE_PAGES as i32
                    || err == sys::ESP_ERR_NVS_NEW_VERSION_FOUND as i32
                {
                    esp!(sys::nvs_flash_erase())
                        .map_err(|_| Error::Init("NVS flash erase failed"))?;
                    err = sys::nvs_flash_init();
                }
                esp!(err).map_err(|_| Error::Init("NVS flash init failed"))?;
            }
            Ok(Self(()))
        }

        /// Run `op` against an open handle for `namespace`, closing the
        /// handle afterwards regardless of the outcome.
        fn with_handle<T>(
            namespace: &str,
            mode: sys::nvs_open_mode_t,
            op: impl FnOnce(sys::nvs_handle_t) -> Result<T, StorageError>,
        ) -> Result<T, StorageError> {
            let ns = CString::new(namespace).map_err(|_| StorageError::IoError)?;
            let mut handle: sys::nvs_handle_t = 0;
            // SAFETY: ns and handle are valid for the duration of the call.
            let err = unsafe { sys::nvs_open(ns.as_ptr(), mode, &raw mut handle) };
            if err == sys::ESP_ERR_NVS_NOT_FOUND as i32 {
                // Read-only open of a namespace nothing ever wrote to.
                return Err(StorageError::NotFound);
            }
            esp!(err).map_err(|_| StorageError::IoError)?;
            let result = op(handle);
            // SAFETY: handle came from a successful nvs_open.
            unsafe { sys::nvs_close(handle) };
            result
        }
    }

    impl super::StoragePort for NvsStore {
        fn read(
            &self,
            namespace: &str,
            key: &str,
            buf: &mut [u8],
        ) -> Result<usize, StorageError> {
            let key = CString::new(key).map_err(|_| StorageError::IoError)?;
            Self::with_handle(namespace, sys::nvs_open_mode_t_NVS_READONLY, |handle| {
                let mut len = buf.len();
                // SAFETY: buf/len describe a valid writable region.
                let err = unsafe {
                    sys::nvs_get_blob(handle, key.as_ptr(), buf.as_mut_ptr().cast(), &raw mut len)
                };
                if err == sys::ESP_ERR_NVS_NOT_FOUND as i32 {
                    return Err(StorageError::NotFound);
                }
                esp!(err).map_err(|_| StorageError::IoError)?;
                Ok(len)
            })
        }

        fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
            let key = CString::new(key).map_err(|_| StorageError::IoError)?;
            Self::with_handle(namespace, sys::nvs_open_mode_t_NVS_READWRITE, |handle| {
                // SAFETY: data describes a valid readable region.
                let err = unsafe {
                    sys::nvs_set_blob(handle, key.as_ptr(), data.as_ptr().cast(), data.len())
                };
                if err == sys::ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
                    return Err(StorageError::Full);
                }
                esp!(err).map_err(|_| StorageError::IoError)?;
                // SAFETY: handle is open read-write.
                esp!(unsafe { sys::nvs_commit(handle) }).map_err(|_| StorageError::IoError)
            })
        }

        fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
            let key = CString::new(key).map_err(|_| StorageError::IoError)?;
            match Self::with_handle(namespace, sys::nvs_open_mode_t_NVS_READWRITE, |handle| {
                // SAFETY: key is a valid C string for the call.
                let err = unsafe { sys::nvs_erase_key(handle, key.as_ptr()) };
                if err == sys::ESP_ERR_NVS_NOT_FOUND as i32 {
                    return Err(StorageError::NotFound);
                }
                esp!(err).map_err(|_| StorageError::IoError)?;
                // SAFETY: handle is open read-write.
                esp!(unsafe { sys::nvs_commit(handle) }).map_err(|_| StorageError::IoError)
            }) {
                // Deleting what is not there is a no-op.
                Ok(()) | Err(StorageError::NotFound) => Ok(()),
                Err(e) => Err(e),
            }
        }

        fn exists(&self, namespace: &str, key: &str) -> bool {
            let Ok(key) = CString::new(key) else {
                return false;
            };
            Self::with_handle(namespace, sys::nvs_open_mode_t_NVS_READONLY, |handle| {
                let mut len: usize = 0;
                // Length query: a null destination asks only for the size.
                // SAFETY: key is a valid C string, len a valid out pointer.
                let err = unsafe {
                    sys::nvs_get_blob(
                        handle,
                        key.as_ptr(),
                        core::ptr::null_mut(),
                        &raw mut len,
                    )
                };
                if err == sys::ESP_ERR_NVS_NOT_FOUND as i32 {
                    return Err(StorageError::NotFound);
                }
                esp!(err).map_err(|_| StorageError::IoError)
            })
            .is_ok()
        }
    }
}

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "espidf"))]
mod imp {
    use std::collections::HashMap;

    use super::{Error, StorageError};

    /// In-memory stand-in with the same namespace/key semantics.
    pub struct NvsStore {
        map: HashMap<(String, String), Vec<u8>>,
    }

    impl NvsStore {
        pub fn new() -> Result<Self, Error> {
            Ok(Self {
                map: HashMap::new(),
            })
        }
    }

    impl super::StoragePort for NvsStore {
        fn read(
            &self,
            namespace: &str,
            key: &str,
            buf: &mut [u8],
        ) -> Result<usize, StorageError> {
            let value = self
                .map
                .get(&(namespace.to_owned(), key.to_owned()))
                .ok_or(StorageError::NotFound)?;
            if value.len() > buf.len() {
                return Err(StorageError::IoError);
            }
            buf[..value.len()].copy_from_slice(value);
            Ok(value.len())
        }

        fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
            self.map
                .insert((namespace.to_owned(), key.to_owned()), data.to_vec());
            Ok(())
        }

        fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
            self.map.remove(&(namespace.to_owned(), key.to_owned()));
            Ok(())
        }

        fn exists(&self, namespace: &str, key: &str) -> bool {
            self.map
                .contains_key(&(namespace.to_owned(), key.to_owned()))
        }
    }
}

pub use imp::NvsStore;
