//! SAX (Simple API for XML) Module
//!
//! The application-facing half of ingestion.
//!
//! ## Architecture
//!
//! ```text
//! Source ---> Dispatcher ---> Tokenizer ---> Visitor
//!                                |
//!                                v
//!                         AttributeView (borrowed, per callback)
//! ```
//!
//! ## Types
//!
//! - `Visitor` - callbacks for element start/end, data, PIs and comments
//! - `Attributes` - read access shared by both attribute list strategies
//! - `AttributeView` - zero-copy attributes of the tag being reported
//! - `AttributeSnapshot` - owned, editable copy
//! - `SaxEvent` / `EventCollector` - recorded events for batch use

pub mod attributes;
pub mod collector;
pub mod events;
pub mod visitor;

pub use attributes::{AttributeSnapshot, AttributeView, Attributes};
pub use collector::{parse_sax, EventCollector};
pub use events::SaxEvent;
pub use visitor::Visitor;
