//! Watched resource model.
//!
//! A [`ResourceObject`] is the snapshot a watch source hands over with every
//! event. Classification into a [`ResourceKind`] is a closed match with an
//! explicit [`ResourceObject::Unknown`] arm, so an unexpected object can be
//! dropped by the router without failing dispatch.

mod key;
mod object;

pub use key::*;
pub use object::*;
