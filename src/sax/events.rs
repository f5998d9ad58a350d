//! SAX Event Types
//!
//! Owned copies of the events a [`Visitor`](super::Visitor) receives, for
//! callers that want a recorded event list rather than callbacks.

use std::fmt;

use super::attributes::{AttributeSnapshot, Attributes};

/// A recorded parse event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaxEvent {
    /// Parsing started
    StartXml,

    /// Start of an element
    StartElement {
        name: String,
        /// Attributes in document order
        attributes: AttributeSnapshot,
    },

    /// End of an element
    EndElement { name: String },

    /// Character data (text and CDATA)
    Data(String),

    /// Processing instruction
    ProcessingInstruction { target: String, data: String },

    /// Comment
    Comment(String),

    /// Parsing finished successfully
    EndXml,
}

impl SaxEvent {
    /// Check if this is a start element event
    #[inline]
    pub fn is_start_element(&self) -> bool {
        matches!(self, SaxEvent::StartElement { .. })
    }

    /// Check if this is an end element event
    #[inline]
    pub fn is_end_element(&self) -> bool {
        matches!(self, SaxEvent::EndElement { .. })
    }

    /// Check if this is a data event
    #[inline]
    pub fn is_data(&self) -> bool {
        matches!(self, SaxEvent::Data(_))
    }

    /// Get the element name if this is a start or end element
    pub fn element_name(&self) -> Option<&str> {
        match self {
            SaxEvent::StartElement { name, .. } | SaxEvent::EndElement { name } => Some(name),
            _ => None,
        }
    }
}

/// One line per event, as printed by `xmlfeed --events`
impl fmt::Display for SaxEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaxEvent::StartXml => f.write_str("start_xml"),
            SaxEvent::StartElement { name, attributes } => {
                write!(f, "start_element {}", name)?;
                for (attr, value) in attributes.iter() {
                    write!(f, " {}={:?}", attr, value)?;
                }
                Ok(())
            }
            SaxEvent::EndElement { name } => write!(f, "end_element {}", name),
            SaxEvent::Data(text) => write!(f, "data {:?}", text),
            SaxEvent::ProcessingInstruction { target, data } => write!(f, "pi {} {:?}", target, data),
            SaxEvent::Comment(text) => write!(f, "comment {:?}", text),
            SaxEvent::EndXml => f.write_str("end_xml"),
        }
    }
}
