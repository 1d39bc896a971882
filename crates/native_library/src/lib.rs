//! `native_library` opens system shared libraries at runtime and hands out typed function pointers.
//!
//! Nothing here is linked at build time. Every native entry point used by the window backends and
//! the gl binding goes through [`Library`], which keeps one handle per library name for the whole
//! process. Libraries are never unloaded, so function pointers resolved from them stay valid
//! forever and can be stored in plain `Copy` tables (see [`function_table!`]).

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::{Mutex, OnceLock, PoisonError};

pub use libloading;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open native library {name}: {source}")]
    Open {
        name: String,
        #[source]
        source: libloading::Error,
    },
    #[error("none of the native libraries {candidates:?} could be opened")]
    NoCandidate { candidates: Vec<String> },
    #[error("symbol {symbol} is missing from {library}: {source}")]
    Symbol {
        library: String,
        symbol: String,
        #[source]
        source: libloading::Error,
    },
}

/// A shared library mapped for the lifetime of the process.
pub struct Library {
    name: String,
    inner: libloading::Library,
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library").field("name", &self.name).finish()
    }
}

static OPEN_LIBRARIES: OnceLock<Mutex<HashMap<String, &'static Library>>> = OnceLock::new();

impl Library {
    /// Opens `name`, or returns the handle opened by an earlier call with the same name.
    pub fn open(name: &str) -> Result<&'static Library, Error> {
        let mut open = OPEN_LIBRARIES
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(library) = open.get(name) {
            return Ok(library);
        }
        // SAFETY: system libraries only. their initializers are expected to be sound.
        let inner = unsafe { libloading::Library::new(name) }.map_err(|source| Error::Open {
            name: name.to_owned(),
            source,
        })?;
        let library: &'static Library = Box::leak(Box::new(Library {
            name: name.to_owned(),
            inner,
        }));
        open.insert(name.to_owned(), library);
        tracing::debug!(library = name, "opened native library");
        Ok(library)
    }

    /// Opens the first library in `candidates` that exists on this system.
    pub fn open_any(candidates: &[&str]) -> Result<&'static Library, Error> {
        for candidate in candidates {
            match Self::open(candidate) {
                Ok(library) => return Ok(library),
                Err(err) => tracing::trace!(%err, "skipping library candidate"),
            }
        }
        Err(Error::NoCandidate {
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves a required symbol as a value of type `F`, usually an `unsafe extern "system" fn`.
    ///
    /// # Safety
    /// `F` must match the real signature (or data type) of the symbol.
    pub unsafe fn function<F: Copy>(&self, symbol: &str) -> Result<F, Error> {
        self.inner
            .get::<F>(symbol.as_bytes())
            .map(|resolved| *resolved)
            .map_err(|source| Error::Symbol {
                library: self.name.clone(),
                symbol: symbol.to_owned(),
                source,
            })
    }

    /// Like [`Library::function`], but a missing symbol is simply `None`.
    ///
    /// # Safety
    /// same as [`Library::function`].
    pub unsafe fn optional<F: Copy>(&self, symbol: &str) -> Option<F> {
        match self.inner.get::<F>(symbol.as_bytes()) {
            Ok(resolved) => Some(*resolved),
            Err(_) => {
                tracing::trace!(library = %self.name, symbol, "optional symbol not available");
                None
            }
        }
    }

    /// Raw address of a symbol. used for exported variables and for generic gl loaders.
    pub fn address(&self, symbol: &str) -> Option<*const c_void> {
        // SAFETY: a raw pointer is valid for any symbol kind, nothing is called or read here.
        unsafe { self.optional::<*const c_void>(symbol) }.filter(|ptr| !ptr.is_null())
    }
}

/// Declares a `Copy` table of required native functions resolved from a [`Library`].
///
/// ```ignore
/// function_table! {
///     pub struct LibC {
///         strlen: "strlen" => fn(*const c_char) -> usize,
///     }
/// }
/// let libc = LibC::load(Library::open("libc.so.6")?)?;
/// ```
#[macro_export]
macro_rules! function_table {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $symbol:literal => fn($($arg:ty),* $(,)?) $(-> $ret:ty)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: unsafe extern "system" fn($($arg),*) $(-> $ret)?,
            )*
        }

        impl $name {
            /// Resolves every entry point, failing on the first missing one.
            pub fn load(library: &$crate::Library) -> ::std::result::Result<Self, $crate::Error> {
                // SAFETY: the signatures above are transcribed from the native headers.
                unsafe {
                    Ok(Self {
                        $( $field: library.function($symbol)?, )*
                    })
                }
            }
        }
    };
}

/// Declares a table of optional native functions. missing entries stay `None`.
#[macro_export]
macro_rules! optional_function_table {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $symbol:literal => fn($($arg:ty),* $(,)?) $(-> $ret:ty)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: Option<unsafe extern "system" fn($($arg),*) $(-> $ret)?>,
            )*
        }

        impl $name {
            pub fn load(library: &$crate::Library) -> Self {
                // SAFETY: the signatures above are transcribed from the native headers.
                unsafe {
                    Self {
                        $( $field: library.optional($symbol), )*
                    }
                }
            }
        }
    };
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;
    use std::ffi::c_char;

    const LIBC: &str = "libc.so.6";

    function_table! {
        struct LibC {
            strlen: "strlen" => fn(*const c_char) -> usize,
            abs: "abs" => fn(i32) -> i32,
        }
    }

    optional_function_table! {
        struct Missing {
            not_here: "definitely_not_a_libc_symbol" => fn(),
            strlen: "strlen" => fn(*const c_char) -> usize,
        }
    }

    #[test]
    fn reopening_reuses_the_handle() {
        let first = Library::open(LIBC).unwrap();
        let second = Library::open(LIBC).unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.name(), LIBC);
    }

    #[test]
    fn missing_library_is_an_error() {
        let err = Library::open("libdoes-not-exist-anywhere.so.42").unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
        let err = Library::open_any(&["libnope-1.so", "libnope-2.so"]).unwrap_err();
        match err {
            Error::NoCandidate { candidates } => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn open_any_falls_through_to_a_present_library() {
        let library = Library::open_any(&["libnope-1.so", LIBC]).unwrap();
        assert_eq!(library.name(), LIBC);
    }

    #[test]
    fn required_table_resolves_and_calls() {
        let libc = LibC::load(Library::open(LIBC).unwrap()).unwrap();
        let text = b"window\0";
        unsafe {
            assert_eq!((libc.strlen)(text.as_ptr().cast()), 6);
            assert_eq!((libc.abs)(-7), 7);
        }
    }

    #[test]
    fn missing_required_symbol_names_library_and_symbol() {
        let library = Library::open(LIBC).unwrap();
        let err = unsafe {
            library.function::<unsafe extern "system" fn()>("definitely_not_a_libc_symbol")
        }
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("definitely_not_a_libc_symbol"));
        assert!(message.contains(LIBC));
    }

    #[test]
    fn optional_table_tolerates_missing_symbols() {
        let table = Missing::load(Library::open(LIBC).unwrap());
        assert!(table.not_here.is_none());
        assert!(table.strlen.is_some());
        assert!(Library::open(LIBC).unwrap().address("strlen").is_some());
        assert!(Library::open(LIBC).unwrap().address("definitely_not_a_libc_symbol").is_none());
    }
}
