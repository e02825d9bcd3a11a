//! Core data model: message/status enums, group rows, and event rows.

pub mod event;
pub mod group;

pub use event::{EventAttributes, EventRecord};
pub use group::{Group, LogLevel, MessageType, ParseEnumError, ParseTextError, Status, TestResult};
