//! Local process supervisor access
//!
//! The bridge talks to the supervisor only through [`SupervisorClient`];
//! [`SupervisordClient`] is the XML-RPC implementation for supervisord.

mod traits;
mod xmlrpc;

pub use traits::{SupervisorClient, SupervisorError};
pub use xmlrpc::{SupervisorConfig, SupervisordClient};
