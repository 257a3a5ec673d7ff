pub mod chord;
pub mod config;
pub mod constraints;
pub mod corpus;
pub mod error;
pub mod layout;
pub mod layout_file;
pub mod optimizer;
pub mod oracle;
pub mod profile;

pub use crate::chord::{Chord, ChordSpace, FingerProfile};
pub use crate::error::{CfResult, ChordError};
pub use crate::layout::Layout;
// cmd and reports belong to the binary (main.rs).
