//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                          | Connects to         |
//! |-------------|-------------------------------------|---------------------|
//! | `log_ports` | every collaborator port             | log output only     |
//! | `log_sink`  | EventSink                           | log output          |

pub mod log_ports;
pub mod log_sink;
