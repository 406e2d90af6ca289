//! Shipped host backends.
//!
//! - [`NoAudio`] - a host without audio support; every sound stays silent.
//! - `RodioBackend` - native output through rodio (feature `rodio_backend`).

mod null;
#[cfg(feature = "rodio_backend")]
mod rodio;

pub use null::{NoAudio, NoBuffer, NoContext, NoDecoder, NoNode};
#[cfg(feature = "rodio_backend")]
pub use self::rodio::{RodioBackend, RodioBuffer, RodioContext, RodioDecoder, RodioNode};
